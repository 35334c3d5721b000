//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for the document operations stamping
//! needs, isolating the concrete PDF library (lopdf) from the compositor.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::detect::detect_pdf_from_bytes;
use crate::error::{Error, Result};
use crate::model::{PageSize, RasterImage};
use crate::render::overlay::{self, Overlay, ResourceNames};

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Abstract interface for the document being stamped.
pub trait PdfBackend {
    /// All pages in document order.
    fn pages(&self) -> Vec<PageId>;

    /// Effective page size, or `None` when the page has no usable MediaBox.
    fn page_size(&self, page: PageId) -> Option<PageSize>;

    /// Composite `overlay` on top of the page's existing content.
    fn merge_overlay(&mut self, page: PageId, overlay: &Overlay) -> Result<()>;
}

/// Value written to `/Producer` on save.
const PRODUCER: &str = concat!("pdfstamp ", env!("CARGO_PKG_VERSION"));

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
    font: Option<ObjectId>,
    graphics_states: HashMap<u32, ObjectId>,
    // Holding the Arc keeps its address from being reused by another raster.
    images: Vec<(Arc<RasterImage>, ObjectId)>,
}

impl LopdfBackend {
    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }
        Ok(Self {
            doc,
            font: None,
            graphics_states: HashMap::new(),
            images: Vec::new(),
        })
    }

    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::load_bytes(&data)
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::MissingInput("source document"));
        }
        detect_pdf_from_bytes(data)?;
        let doc = LopdfDocument::load_mem(data)?;
        Self::from_document(doc)
    }

    /// Load from a reader.
    pub fn load_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::load_bytes(&data)
    }

    /// Get PDF version string.
    pub fn version(&self) -> &str {
        &self.doc.version
    }

    /// Raise the header version to at least `major.minor`.
    fn require_version(&mut self, major: u8, minor: u8) {
        let mut parts = self.doc.version.split('.').map(|p| p.trim().parse::<u8>().ok());
        let current = match (parts.next().flatten(), parts.next().flatten()) {
            (Some(ma), Some(mi)) => (ma, mi),
            _ => (0, 0),
        };
        if current < (major, minor) {
            log::debug!("Raising PDF version {} to {}.{}", self.doc.version, major, minor);
            self.doc.version = format!("{}.{}", major, minor);
        }
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Set `/Producer` and `/ModDate` in the document information dictionary.
    pub fn touch_metadata(&mut self) -> Result<()> {
        let mod_date = chrono::Utc::now()
            .format("D:%Y%m%d%H%M%S+00'00'")
            .to_string();
        let stamp_info = |info: &mut Dictionary| {
            info.set("Producer", Object::string_literal(PRODUCER));
            info.set("ModDate", Object::string_literal(mod_date.as_str()));
        };

        match self.doc.trailer.get(b"Info") {
            Ok(Object::Reference(id)) => {
                let id = *id;
                let info = self
                    .doc
                    .get_object_mut(id)
                    .and_then(Object::as_dict_mut)
                    .map_err(|e| Error::Corrupted(format!("Info dictionary: {}", e)))?;
                stamp_info(info);
            }
            Ok(Object::Dictionary(direct)) => {
                let mut info = direct.clone();
                stamp_info(&mut info);
                self.doc.trailer.set("Info", info);
            }
            _ => {
                let mut info = Dictionary::new();
                stamp_info(&mut info);
                let id = self.doc.add_object(info);
                self.doc.trailer.set("Info", id);
            }
        }
        Ok(())
    }

    /// Serialize the document.
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.doc.save_to(&mut out)?;
        Ok(out)
    }

    /// Write the document to a file.
    pub fn save_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let bytes = self.save_to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Resolve a reference one level; direct objects are returned as is.
    fn resolve<'a>(&'a self, obj: &'a Object) -> Result<&'a Object> {
        match obj {
            Object::Reference(id) => Ok(self.doc.get_object(*id)?),
            other => Ok(other),
        }
    }

    /// Owned copy of a dictionary that may be stored directly or by reference.
    fn owned_dict(&self, obj: &Object) -> Result<Dictionary> {
        self.resolve(obj)?
            .as_dict()
            .cloned()
            .map_err(|_| Error::Corrupted("expected a dictionary".to_string()))
    }

    /// Owned copy of `resources[key]`, or an empty dictionary.
    fn sub_dict(&self, resources: &Dictionary, key: &[u8]) -> Result<Dictionary> {
        match resources.get(key) {
            Ok(obj) => self.owned_dict(obj),
            Err(_) => Ok(Dictionary::new()),
        }
    }

    /// Look up a page attribute, following `/Parent` for inheritable keys.
    fn inherited(&self, page: PageId, key: &[u8]) -> Option<&Object> {
        let mut current = Some(page);
        let mut depth = 0;
        while let Some(id) = current {
            let dict = self.doc.get_dictionary(id).ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
            depth += 1;
            if depth > 64 {
                log::warn!("Page tree deeper than 64 levels at {:?}", page);
                return None;
            }
        }
        None
    }

    fn font_id(&mut self) -> ObjectId {
        if let Some(id) = self.font {
            return id;
        }
        let id = self.doc.add_object(overlay::font_dictionary());
        self.font = Some(id);
        id
    }

    fn graphics_state_id(&mut self, opacity: f64) -> ObjectId {
        let key = (opacity as f32).to_bits();
        if let Some(id) = self.graphics_states.get(&key) {
            return *id;
        }
        let id = self.doc.add_object(overlay::graphics_state(opacity));
        self.graphics_states.insert(key, id);
        id
    }

    fn image_id(&mut self, raster: &Arc<RasterImage>) -> Result<ObjectId> {
        if let Some((_, id)) = self.images.iter().find(|(r, _)| Arc::ptr_eq(r, raster)) {
            return Ok(*id);
        }
        let id = overlay::embed_image(&mut self.doc, raster)?;
        self.images.push((Arc::clone(raster), id));
        Ok(id)
    }

    /// References of the page's current content streams, flattened.
    fn content_refs(&self, page: PageId) -> Result<Vec<Object>> {
        let page_dict = self.doc.get_dictionary(page)?;
        let contents = match page_dict.get(b"Contents") {
            Ok(obj) => obj,
            Err(_) => return Ok(Vec::new()),
        };
        match contents {
            Object::Reference(id) => match self.doc.get_object(*id)? {
                Object::Stream(_) => Ok(vec![Object::Reference(*id)]),
                Object::Array(items) => Ok(items.clone()),
                _ => Err(Error::Corrupted(format!(
                    "page {:?} /Contents is not a stream",
                    page
                ))),
            },
            Object::Array(items) => Ok(items.clone()),
            _ => Err(Error::Corrupted(format!(
                "page {:?} has a direct /Contents object",
                page
            ))),
        }
    }
}

/// First `prefix<n>` not already used as a key in `dict`.
fn unique_name(dict: &Dictionary, prefix: &str) -> String {
    (1u32..)
        .map(|n| format!("{}{}", prefix, n))
        .find(|candidate| !dict.has(candidate.as_bytes()))
        .unwrap_or_else(|| prefix.to_string())
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> Vec<PageId> {
        self.doc.get_pages().into_values().collect()
    }

    fn page_size(&self, page: PageId) -> Option<PageSize> {
        let media_box = self.resolve(self.inherited(page, b"MediaBox")?).ok()?;
        let values: Vec<f64> = media_box
            .as_array()
            .ok()?
            .iter()
            .filter_map(|v| v.as_float().ok().map(f64::from))
            .collect();
        match values[..] {
            [llx, lly, urx, ury] => Some(PageSize::from_media_box(llx, lly, urx, ury)),
            _ => None,
        }
    }

    fn merge_overlay(&mut self, page: PageId, overlay: &Overlay) -> Result<()> {
        let mut resources = match self.inherited(page, b"Resources") {
            Some(obj) => self.owned_dict(obj)?,
            None => Dictionary::new(),
        };
        let mut fonts = self.sub_dict(&resources, b"Font")?;
        let mut states = self.sub_dict(&resources, b"ExtGState")?;
        let mut xobjects = self.sub_dict(&resources, b"XObject")?;

        let names = ResourceNames {
            font: unique_name(&fonts, "StampF"),
            graphics_state: unique_name(&states, "StampGS"),
            image: unique_name(&xobjects, "StampIm"),
        };

        if overlay.uses_font() {
            fonts.set(names.font.as_str(), self.font_id());
            resources.set("Font", fonts);
        }
        if overlay.uses_graphics_state() {
            states.set(
                names.graphics_state.as_str(),
                self.graphics_state_id(overlay.opacity()),
            );
            resources.set("ExtGState", states);
        }
        if let Some(raster) = overlay.image() {
            xobjects.set(names.image.as_str(), self.image_id(raster)?);
            resources.set("XObject", xobjects);
            if raster.has_transparency() {
                self.require_version(1, 4);
            }
        }
        // ExtGState alpha and SMask are PDF 1.4 features
        if overlay.uses_graphics_state() {
            self.require_version(1, 4);
        }
        log::debug!("Page {:?}: overlay resources {:?}", page, names);

        let existing = self.content_refs(page)?;
        let mut tail = if existing.is_empty() {
            Vec::new()
        } else {
            b"Q\n".to_vec()
        };
        tail.extend(overlay.encode_content(&names)?);

        let mut contents = Vec::with_capacity(existing.len() + 2);
        if !existing.is_empty() {
            let head_id = self.doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            contents.push(Object::Reference(head_id));
            contents.extend(existing);
        }
        let tail_id = self.doc.add_object(Stream::new(Dictionary::new(), tail));
        contents.push(Object::Reference(tail_id));

        let page_dict = self
            .doc
            .get_object_mut(page)
            .and_then(Object::as_dict_mut)
            .map_err(|e| Error::Corrupted(format!("page {:?}: {}", page, e)))?;
        page_dict.set("Resources", resources);
        page_dict.set("Contents", contents);
        Ok(())
    }
}
