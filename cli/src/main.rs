//! pdfstamp CLI - stamp text or images onto PDF pages

use std::fs;
use std::path::{Path, PathBuf};

use clap::{value_parser, Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfstamp::{
    compute_position_letter, detect_image_format, preview_bytes, stamp_document, Anchor,
    ImageStamp, LopdfBackend, PageScope, PageSize, RasterImage, RgbColor, StampConfig,
    StampDescriptor, TextStamp,
};

const DEFAULT_OUTPUT: &str = "stamped_document.pdf";

#[derive(Parser)]
#[command(name = "pdfstamp")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Stamp text or images onto PDF pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stamp a line of text
    Text {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Stamp text
        #[arg(value_name = "TEXT", default_value = "CONFIDENTIAL")]
        text: String,

        /// Output file
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        #[command(flatten)]
        style: TextStyleArgs,

        #[command(flatten)]
        placement: PlacementArgs,

        #[command(flatten)]
        pages: PageArgs,
    },

    /// Stamp a PNG or JPEG image
    Image {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Stamp image (PNG or JPEG)
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Image scale factor (0.1-5.0)
        #[arg(long, default_value_t = 1.0, value_parser = parse_scale)]
        scale: f64,

        #[command(flatten)]
        placement: PlacementArgs,

        #[command(flatten)]
        pages: PageArgs,
    },

    /// Show an image's original and scaled stamp dimensions
    Inspect {
        /// Stamp image (PNG or JPEG)
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Image scale factor (0.1-5.0)
        #[arg(long, default_value_t = 1.0, value_parser = parse_scale)]
        scale: f64,
    },

    /// Write a one-page PDF showing only the stamp
    Preview {
        /// Stamp image; a text stamp is previewed when omitted
        #[arg(long, value_name = "IMAGE")]
        image: Option<PathBuf>,

        /// Stamp text
        #[arg(long, default_value = "CONFIDENTIAL")]
        text: String,

        /// Image scale factor (0.1-5.0)
        #[arg(long, default_value_t = 1.0, value_parser = parse_scale)]
        scale: f64,

        /// Page size of the preview
        #[arg(long, value_enum, default_value = "letter")]
        page_size: PaperSize,

        /// Output file
        #[arg(short, long, value_name = "FILE", default_value = "stamp_preview.pdf")]
        output: PathBuf,

        #[command(flatten)]
        style: TextStyleArgs,

        #[command(flatten)]
        placement: PlacementArgs,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct TextStyleArgs {
    /// Text color as r,g,b (0-255 each)
    #[arg(long, default_value = "255,0,0", value_parser = parse_color)]
    color: RgbColor,

    /// Font size in points (10-72)
    #[arg(long, default_value_t = 20, value_parser = value_parser!(u32).range(10..=72))]
    font_size: u32,
}

#[derive(Args)]
struct PlacementArgs {
    /// Anchor the offsets are measured from
    #[arg(short, long, value_enum, default_value = "top-left", env = "PDFSTAMP_POSITION")]
    position: Position,

    /// Horizontal offset in points, toward the page interior (-100..100)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true,
          value_parser = value_parser!(i32).range(-100..=100))]
    x_offset: i32,

    /// Vertical offset in points, toward the page interior (-100..100)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true,
          value_parser = value_parser!(i32).range(-100..=100))]
    y_offset: i32,

    /// Opacity (0.1-1.0)
    #[arg(long, default_value_t = 1.0, value_parser = parse_opacity, env = "PDFSTAMP_OPACITY")]
    opacity: f64,

    /// Rotation in degrees, counterclockwise (-180..180)
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true, value_parser = parse_rotation)]
    rotation: f64,
}

#[derive(Args)]
struct PageArgs {
    /// Stamp only the first page
    #[arg(long, conflicts_with = "pages")]
    first_page_only: bool,

    /// Pages to stamp (e.g., "1-3", "1,3,5")
    #[arg(long)]
    pages: Option<String>,

    /// Position against a fixed 612x792 page instead of each page's MediaBox
    #[arg(long)]
    fixed_letter: bool,

    /// Print the placement report as JSON
    #[arg(long)]
    report: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

impl From<Position> for Anchor {
    fn from(position: Position) -> Self {
        match position {
            Position::TopLeft => Anchor::TopLeft,
            Position::TopRight => Anchor::TopRight,
            Position::BottomLeft => Anchor::BottomLeft,
            Position::BottomRight => Anchor::BottomRight,
            Position::Center => Anchor::Center,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PaperSize {
    /// US Letter, 612x792 pt
    Letter,
    /// ISO A4, 595x842 pt
    A4,
}

impl From<PaperSize> for PageSize {
    fn from(size: PaperSize) -> Self {
        match size {
            PaperSize::Letter => PageSize::LETTER,
            PaperSize::A4 => PageSize::A4,
        }
    }
}

fn parse_bounded(s: &str, min: f64, max: f64) -> Result<f64, String> {
    let value: f64 = s.trim().parse().map_err(|_| format!("`{}` is not a number", s))?;
    if !(min..=max).contains(&value) {
        return Err(format!("{} is not in {}..={}", value, min, max));
    }
    Ok(value)
}

fn parse_opacity(s: &str) -> Result<f64, String> {
    parse_bounded(s, 0.1, 1.0)
}

fn parse_rotation(s: &str) -> Result<f64, String> {
    parse_bounded(s, -180.0, 180.0)
}

fn parse_scale(s: &str) -> Result<f64, String> {
    parse_bounded(s, 0.1, 5.0)
}

fn parse_color(s: &str) -> Result<RgbColor, String> {
    let channels: Vec<u8> = s
        .split(',')
        .map(|c| c.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("`{}` is not an r,g,b color", s))?;
    match channels[..] {
        [r, g, b] => Ok(RgbColor::from_rgb8(r, g, b)),
        _ => Err(format!("`{}` needs exactly three channels", s)),
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Text {
            input,
            text,
            output,
            style,
            placement,
            pages,
        } => cmd_text(&input, text, &output, &style, &placement, &pages),
        Commands::Image {
            input,
            image,
            output,
            scale,
            placement,
            pages,
        } => cmd_image(&input, &image, &output, scale, &placement, &pages),
        Commands::Inspect { image, scale } => cmd_inspect(&image, scale),
        Commands::Preview {
            image,
            text,
            scale,
            page_size,
            output,
            style,
            placement,
        } => cmd_preview(
            image.as_deref(),
            text,
            scale,
            page_size.into(),
            &output,
            &style,
            &placement,
        ),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn text_stamp(text: String, style: &TextStyleArgs) -> TextStamp {
    TextStamp::new(text)
        .with_color(style.color)
        .with_font_size(f64::from(style.font_size))
}

fn image_stamp(path: &Path, scale: f64) -> Result<ImageStamp, Box<dyn std::error::Error>> {
    Ok(ImageStamp::new(RasterImage::open(path)?).with_scale(scale))
}

fn build_config(
    stamp: StampDescriptor,
    placement: &PlacementArgs,
    pages: Option<&PageArgs>,
) -> Result<StampConfig, Box<dyn std::error::Error>> {
    let mut config = StampConfig::new(stamp)
        .with_anchor(placement.position.into())
        .with_offset(placement.x_offset, placement.y_offset)
        .with_opacity(placement.opacity)
        .with_rotation(placement.rotation);

    if let Some(pages) = pages {
        let scope = if pages.first_page_only {
            PageScope::FirstPage
        } else if let Some(p) = pages.pages.as_deref() {
            PageScope::parse(p).map_err(|e| format!("Invalid page range: {}", e))?
        } else {
            PageScope::AllPages
        };
        config = config.with_scope(scope);
        if pages.fixed_letter {
            config = config.fixed_letter();
        }
    }

    config.stamp.validate()?;
    log::debug!("Stamp config: {:?}", config);
    Ok(config)
}

fn cmd_text(
    input: &Path,
    text: String,
    output: &Path,
    style: &TextStyleArgs,
    placement: &PlacementArgs,
    pages: &PageArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(text_stamp(text, style).into(), placement, Some(pages))?;
    run_stamp(input, output, &config, pages.report)
}

fn cmd_image(
    input: &Path,
    image: &Path,
    output: &Path,
    scale: f64,
    placement: &PlacementArgs,
    pages: &PageArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(image_stamp(image, scale)?.into(), placement, Some(pages))?;
    run_stamp(input, output, &config, pages.report)
}

fn run_stamp(
    input: &Path,
    output: &Path,
    config: &StampConfig,
    print_report: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(3);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Loading PDF...");
    let mut backend = LopdfBackend::load_file(input)?;
    pb.inc(1);

    pb.set_message(format!(
        "Stamping {} pages (PDF {})...",
        backend.page_count(),
        backend.version()
    ));
    let report = stamp_document(&mut backend, config)?;
    pb.inc(1);

    pb.set_message("Saving...");
    if config.update_metadata {
        backend.touch_metadata()?;
    }
    backend.save_file(output)?;
    pb.inc(1);

    pb.finish_with_message("Done!");

    println!(
        "\n{} {} of {} pages",
        "Stamped".green().bold(),
        report.pages.len(),
        report.page_count
    );
    for page in report.pages.iter().filter(|p| p.clipped) {
        println!(
            "  {} stamp extends past the edge of page {}",
            "warning:".yellow(),
            page.page
        );
    }
    println!("{} {}", "Saved to".green(), output.display());

    if print_report {
        println!("{}", report.to_json()?);
    }

    Ok(())
}

fn cmd_inspect(image: &Path, scale: f64) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(image)?;
    let format = detect_image_format(&data)?;
    let stamp = ImageStamp::from_bytes(&data)?.with_scale(scale);
    let (width, height) = stamp.rendered_size();

    println!("{}", "Stamp Image".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), image.display());
    println!("{}: {}", "Format".bold(), format.name());
    println!(
        "{}: {} x {} pixels",
        "Original".bold(),
        stamp.intrinsic_width,
        stamp.intrinsic_height
    );
    println!("{}: {}", "Scale".bold(), scale);
    println!("{}: {:.1} x {:.1} points", "Stamped".bold(), width, height);
    println!(
        "{}: {}",
        "Transparency".bold(),
        if stamp.raster.has_transparency() { "Yes" } else { "No" }
    );

    println!();
    println!("{}", "Placement on Letter".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for anchor in Anchor::ALL {
        let origin = compute_position_letter(anchor, width, height, 0, 0);
        println!("{}: ({:.1}, {:.1})", anchor.label().bold(), origin.x, origin.y);
    }

    Ok(())
}

fn cmd_preview(
    image: Option<&Path>,
    text: String,
    scale: f64,
    page_size: PageSize,
    output: &Path,
    style: &TextStyleArgs,
    placement: &PlacementArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let stamp: StampDescriptor = match image {
        Some(path) => image_stamp(path, scale)?.into(),
        None => text_stamp(text, style).into(),
    };
    let config = build_config(stamp, placement, None)?;

    let bytes = preview_bytes(&config, page_size)?;
    fs::write(output, bytes)?;
    println!("{} {}", "Saved to".green(), output.display());

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfstamp".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF text and image stamping tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/pdfstamp".dimmed());
    println!("License: MIT");
}
