//! End-to-end stamping tests over synthetic PDF documents.

mod common;

use common::*;
use lopdf::{dictionary, Document, Object, ObjectId};
use pdfstamp::{
    compute_position_letter, detect_pdf_from_bytes, stamp_bytes, stamp_bytes_with_report,
    stamp_file, Anchor, Error,
    ImageStamp, PageScope, PageSize, Point, RgbColor, StampConfig, Stamper, TextStamp,
};

fn load(bytes: &[u8]) -> Document {
    Document::load_mem(bytes).unwrap()
}

fn page_ref(doc: &Document, page: ObjectId, key: &[u8]) -> ObjectId {
    doc.get_dictionary(page)
        .unwrap()
        .get(key)
        .and_then(Object::as_reference)
        .unwrap()
}

/// The page's own `/Resources` dictionary `key` entry, resolved.
fn resource_names(doc: &Document, page: ObjectId, key: &[u8]) -> Vec<String> {
    let resources = doc
        .get_dictionary(page)
        .unwrap()
        .get(b"Resources")
        .and_then(Object::as_dict)
        .unwrap();
    let sub = match resources.get(key).unwrap() {
        Object::Reference(id) => doc.get_dictionary(*id).unwrap(),
        other => other.as_dict().unwrap(),
    };
    sub.iter()
        .map(|(k, _)| String::from_utf8_lossy(k).to_string())
        .collect()
}

fn xobject_id(doc: &Document, page: ObjectId, name: &str) -> ObjectId {
    let resources = doc
        .get_dictionary(page)
        .unwrap()
        .get(b"Resources")
        .and_then(Object::as_dict)
        .unwrap();
    resources
        .get(b"XObject")
        .and_then(Object::as_dict)
        .and_then(|x| x.get(name.as_bytes()))
        .and_then(Object::as_reference)
        .unwrap()
}

fn floats(op: &lopdf::content::Operation) -> Vec<f32> {
    op.operands.iter().map(|o| o.as_float().unwrap()).collect()
}

#[test]
fn test_first_page_only_leaves_other_pages_untouched() {
    let input = letter_pdf_bytes(3);
    let before = load(&input);
    let config = StampConfig::new(TextStamp::new("CONFIDENTIAL")).every_page(false);

    let output = stamp_bytes(&input, &config).unwrap();
    let after = load(&output);

    let pages = page_ids(&after);
    assert_eq!(pages, page_ids(&before));

    let first = page_operations(&after, pages[0]);
    assert_eq!(shown_text(&first), vec!["Page 1", "CONFIDENTIAL"]);

    for &page in &pages[1..] {
        assert_eq!(
            after.get_page_content(page).unwrap(),
            before.get_page_content(page).unwrap()
        );
        assert_eq!(
            page_ref(&after, page, b"Contents"),
            page_ref(&before, page, b"Contents")
        );
        assert_eq!(
            page_ref(&after, page, b"Resources"),
            page_ref(&before, page, b"Resources")
        );
    }
}

#[test]
fn test_all_pages_keep_original_content() {
    let input = letter_pdf_bytes(4);
    let config = StampConfig::new(TextStamp::new("DRAFT"));

    let (output, report) = stamp_bytes_with_report(&input, &config).unwrap();
    assert_eq!(report.stamped_pages(), vec![1, 2, 3, 4]);

    let doc = load(&output);
    for (i, page) in page_ids(&doc).into_iter().enumerate() {
        let ops = page_operations(&doc, page);
        assert_eq!(
            shown_text(&ops),
            vec![format!("Page {}", i + 1), "DRAFT".to_string()]
        );
        // original content is isolated before the overlay
        assert_eq!(ops[0].operator, "q");
        assert_eq!(ops.last().unwrap().operator, "Q");
        assert!(resource_names(&doc, page, b"Font").contains(&"F1".to_string()));
        assert!(resource_names(&doc, page, b"Font").contains(&"StampF1".to_string()));
    }
}

#[test]
fn test_stamping_twice_adds_two_overlays() {
    let config = StampConfig::new(TextStamp::new("COPY"));
    let once = stamp_bytes(&letter_pdf_bytes(1), &config).unwrap();
    let twice = stamp_bytes(&once, &config).unwrap();

    let doc = load(&twice);
    let page = page_ids(&doc)[0];
    let ops = page_operations(&doc, page);
    assert_eq!(shown_text(&ops), vec!["Page 1", "COPY", "COPY"]);
    assert_eq!(count_operator(&ops, "BT"), 3);

    let mut fonts = resource_names(&doc, page, b"Font");
    fonts.sort();
    assert_eq!(fonts, vec!["F1", "StampF1", "StampF2"]);
}

#[test]
fn test_empty_document() {
    let input = to_bytes(create_test_pdf(0, LETTER_BOX));
    let config = StampConfig::new(TextStamp::new("NOTHING"));

    let (output, report) = stamp_bytes_with_report(&input, &config).unwrap();
    assert_eq!(report.page_count, 0);
    assert!(report.pages.is_empty());
    assert_eq!(load(&output).get_pages().len(), 0);
}

#[test]
fn test_identity_transform_text_position() {
    let text = TextStamp::new("HELLO").with_font_size(20.0);
    let (width, height) = (text.metrics().width, text.metrics().height);
    let descent = text.metrics().descent;
    let config = StampConfig::new(text).with_anchor(Anchor::Center);

    let (output, report) = stamp_bytes_with_report(&letter_pdf_bytes(1), &config).unwrap();
    let expected = compute_position_letter(Anchor::Center, width, height, 0, 0);
    assert_eq!(report.pages[0].bounds.origin(), expected);
    assert_eq!(report.pages[0].visible_bounds, report.pages[0].bounds);

    let doc = load(&output);
    let ops = page_operations(&doc, page_ids(&doc)[0]);
    assert_eq!(count_operator(&ops, "cm"), 0);
    assert_eq!(count_operator(&ops, "gs"), 0);

    let td = ops.iter().filter(|op| op.operator == "Td").last().unwrap();
    let xy = floats(td);
    assert!((xy[0] - expected.x as f32).abs() < 0.01);
    assert!((xy[1] - (expected.y + descent) as f32).abs() < 0.01);
}

#[test]
fn test_opacity_and_rotation_emit_state() {
    let config = StampConfig::new(TextStamp::new("TILT"))
        .with_opacity(0.5)
        .with_rotation(45.0);

    let doc = load(&stamp_bytes(&letter_pdf_bytes(1), &config).unwrap());
    let page = page_ids(&doc)[0];
    let ops = page_operations(&doc, page);
    assert_eq!(count_operator(&ops, "gs"), 1);
    assert_eq!(count_operator(&ops, "cm"), 3);
    assert_eq!(resource_names(&doc, page, b"ExtGState"), vec!["StampGS1"]);
}

#[test]
fn test_text_color_and_size_are_honored() {
    let text = TextStamp::new("BLUE")
        .with_color(RgbColor::new(0.0, 0.0, 1.0))
        .with_font_size(36.0);
    let doc = load(&stamp_bytes(&letter_pdf_bytes(1), &StampConfig::new(text)).unwrap());
    let ops = page_operations(&doc, page_ids(&doc)[0]);

    let rg = ops.iter().find(|op| op.operator == "rg").unwrap();
    assert_eq!(floats(rg), vec![0.0, 0.0, 1.0]);
    let tf = ops.iter().filter(|op| op.operator == "Tf").last().unwrap();
    assert_eq!(tf.operands[1].as_float().unwrap(), 36.0);
}

#[test]
fn test_image_stamp_is_shared_and_masked() {
    let stamp = ImageStamp::from_bytes(&half_transparent_png(20, 10))
        .unwrap()
        .with_scale(2.0);
    let config = StampConfig::new(stamp).with_anchor(Anchor::BottomLeft);

    let (output, report) = stamp_bytes_with_report(&letter_pdf_bytes(3), &config).unwrap();
    assert_eq!(report.pages[0].bounds.origin(), Point::new(10.0, 10.0));
    assert_eq!(report.pages[0].bounds.width, 40.0);
    assert_eq!(report.pages[0].bounds.height, 20.0);

    let doc = load(&output);
    let pages = page_ids(&doc);
    let image_id = xobject_id(&doc, pages[0], "StampIm1");
    for &page in &pages[1..] {
        assert_eq!(xobject_id(&doc, page, "StampIm1"), image_id);
    }

    let image = doc.get_object(image_id).and_then(Object::as_stream).unwrap();
    assert_eq!(image.dict.get(b"Width").unwrap().as_i64().unwrap(), 20);
    let mask_id = image
        .dict
        .get(b"SMask")
        .and_then(Object::as_reference)
        .unwrap();
    let mask = doc.get_object(mask_id).and_then(Object::as_stream).unwrap();
    let alpha = mask.decompressed_content().unwrap();
    assert_eq!(alpha.len(), 200);
    assert_eq!(alpha[0], 0);
    assert_eq!(alpha[19], 255);

    let ops = page_operations(&doc, pages[0]);
    let cm = ops.iter().find(|op| op.operator == "cm").unwrap();
    assert_eq!(floats(cm), vec![40.0, 0.0, 0.0, 20.0, 10.0, 10.0]);
    assert_eq!(count_operator(&ops, "Do"), 1);
}

#[test]
fn test_opaque_jpeg_has_no_mask() {
    let stamp = ImageStamp::from_bytes(&gray_jpeg(8, 8)).unwrap();
    let doc = load(&stamp_bytes(&letter_pdf_bytes(1), &StampConfig::new(stamp)).unwrap());
    let page = page_ids(&doc)[0];

    let image = doc
        .get_object(xobject_id(&doc, page, "StampIm1"))
        .and_then(Object::as_stream)
        .unwrap();
    assert!(image.dict.get(b"SMask").is_err());
}

#[test]
fn test_inherited_a4_media_box() {
    let input = to_bytes(create_test_pdf(1, A4_BOX));
    let stamp = ImageStamp::from_bytes(&gray_jpeg(100, 100)).unwrap();
    let config = StampConfig::new(stamp).with_anchor(Anchor::TopRight);

    let (_, report) = stamp_bytes_with_report(&input, &config).unwrap();
    assert_eq!(report.pages[0].page_size, PageSize::A4);
    assert_eq!(report.pages[0].bounds.origin(), Point::new(485.0, 732.0));

    let (_, fixed) = stamp_bytes_with_report(&input, &config.fixed_letter()).unwrap();
    assert_eq!(fixed.pages[0].bounds.origin(), Point::new(502.0, 682.0));
}

#[test]
fn test_selected_pages() {
    let config = StampConfig::new(TextStamp::new("X")).with_scope(PageScope::parse("2-3").unwrap());
    let (output, report) = stamp_bytes_with_report(&letter_pdf_bytes(4), &config).unwrap();
    assert_eq!(report.stamped_pages(), vec![2, 3]);

    let doc = load(&output);
    let stamped: Vec<usize> = page_ids(&doc)
        .into_iter()
        .map(|p| shown_text(&page_operations(&doc, p)).len())
        .collect();
    assert_eq!(stamped, vec![1, 2, 2, 1]);
}

#[test]
fn test_producer_metadata() {
    let config = StampConfig::new(TextStamp::new("META"));
    let doc = load(&stamp_bytes(&letter_pdf_bytes(1), &config).unwrap());

    let info_id = doc
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .unwrap();
    let info = doc.get_dictionary(info_id).unwrap();
    match info.get(b"Producer").unwrap() {
        Object::String(bytes, _) => assert!(bytes.starts_with(b"pdfstamp ")),
        other => panic!("unexpected Producer {:?}", other),
    }
    assert!(info.has(b"ModDate"));

    let untouched = load(
        &stamp_bytes(&letter_pdf_bytes(1), &config.with_metadata_update(false)).unwrap(),
    );
    assert!(untouched.trailer.get(b"Info").is_err());
}

#[test]
fn test_direct_info_dictionary_keeps_title() {
    let mut doc = create_test_pdf(1, LETTER_BOX);
    doc.trailer.set(
        "Info",
        lopdf::dictionary! {
            "Title" => Object::string_literal("Quarterly Report"),
            "Author" => Object::string_literal("Ann"),
        },
    );
    let config = StampConfig::new(TextStamp::new("META"));
    let stamped = load(&stamp_bytes(&to_bytes(doc), &config).unwrap());

    let info = match stamped.trailer.get(b"Info").unwrap() {
        Object::Reference(id) => stamped.get_dictionary(*id).unwrap(),
        other => other.as_dict().unwrap(),
    };
    assert!(info.has(b"Title"));
    assert!(info.has(b"Author"));
    assert!(info.has(b"Producer"));
}

#[test]
fn test_transparency_raises_old_header_version() {
    let mut doc = create_test_pdf(1, LETTER_BOX);
    doc.version = "1.3".to_string();
    let input = to_bytes(doc);

    let opaque = StampConfig::new(TextStamp::new("SOLID"));
    let output = stamp_bytes(&input, &opaque).unwrap();
    assert_eq!(detect_pdf_from_bytes(&output).unwrap().version, "1.3");

    let translucent = StampConfig::new(TextStamp::new("GHOST")).with_opacity(0.4);
    let output = stamp_bytes(&input, &translucent).unwrap();
    assert_eq!(detect_pdf_from_bytes(&output).unwrap().version, "1.4");

    let masked = StampConfig::new(ImageStamp::from_bytes(&half_transparent_png(4, 4)).unwrap());
    let output = stamp_bytes(&input, &masked).unwrap();
    assert_eq!(detect_pdf_from_bytes(&output).unwrap().version, "1.4");
}

#[test]
fn test_stamp_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("stamped.pdf");
    std::fs::write(&input, letter_pdf_bytes(2)).unwrap();

    let report = Stamper::new()
        .text(TextStamp::new("FILED"))
        .anchor(Anchor::BottomRight)
        .first_page_only()
        .stamp_file(&input, &output)
        .unwrap();
    assert_eq!(report.stamped_pages(), vec![1]);

    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}

#[test]
fn test_failed_stamp_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("stamped.pdf");
    std::fs::write(&input, b"not a pdf").unwrap();

    let config = StampConfig::new(TextStamp::new("X"));
    assert!(matches!(
        stamp_file(&input, &output, &config),
        Err(Error::UnknownFormat)
    ));
    assert!(!output.exists());
}

#[test]
fn test_missing_image_rejected() {
    assert!(matches!(
        ImageStamp::from_bytes(&[]),
        Err(Error::MissingInput("stamp image"))
    ));
    assert!(matches!(
        ImageStamp::from_bytes(b"GIF89a...."),
        Err(Error::ImageDecode(_))
    ));
}

#[cfg(feature = "async")]
#[tokio::test]
async fn test_stamp_file_async() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.pdf");
    let output = dir.path().join("stamped.pdf");
    std::fs::write(&input, letter_pdf_bytes(1)).unwrap();

    let config = StampConfig::new(TextStamp::new("ASYNC"));
    let report = pdfstamp::stamp_file_async(&input, &output, &config)
        .await
        .unwrap();
    assert_eq!(report.page_count, 1);
    assert!(output.exists());
}
