//! PDF document under construction.
//!
//! [`PdfDocument`] owns the pages and the font table of one output file and
//! assembles the final bytes (header, body, xref table, trailer). It is
//! `Sync`: several renderers may draw into one document, and each font name
//! has a once-cell so the first load of a font happens exactly once even when
//! requested concurrently.

use super::content_stream::ContentStreamBuilder;
use super::font_manager::{EmbeddedFont, EncodedText, PdfFont, StandardFont};
use super::object_serializer::ObjectSerializer;
use crate::error::{Error, Result};
use crate::fonts::registry::StandardFontKind;
use crate::object::{Dictionary, Object, ObjectRef};
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

/// Configuration for PDF generation.
#[derive(Debug, Clone)]
pub struct PdfWriterConfig {
    /// PDF version (e.g., "1.7")
    pub version: String,
    /// Document title
    pub title: Option<String>,
    /// Document author
    pub author: Option<String>,
    /// Document subject
    pub subject: Option<String>,
    /// Creator application
    pub creator: Option<String>,
    /// Whether to Flate-compress streams
    pub compress: bool,
}

impl Default for PdfWriterConfig {
    fn default() -> Self {
        Self {
            version: "1.7".to_string(),
            title: None,
            author: None,
            subject: None,
            creator: Some(format!("{} {}", crate::NAME, crate::VERSION)),
            compress: true,
        }
    }
}

impl PdfWriterConfig {
    /// Set document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set document author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set document subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Enable or disable stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

/// Compress data for a FlateDecode stream.
fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Whether a font handle points at a built-in or an embedded font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    /// Built-in Type1 font
    Standard,
    /// Embedded Type0 font
    Embedded,
}

/// Reference to a font registered in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedFontHandle {
    /// Page resource name (`F1`, `F2`, ...)
    pub resource_id: String,
    /// Registry name of the font actually used
    pub font_name: String,
    /// Built-in or embedded
    pub kind: FontKind,
    /// Set when this handle stands in for a font that failed to load
    pub substituted_for: Option<String>,
}

impl EmbeddedFontHandle {
    /// Same font, recorded as a substitute for `original`.
    pub fn substitute_for(&self, original: &str) -> Self {
        Self {
            substituted_for: Some(original.to_string()),
            ..self.clone()
        }
    }

    /// Whether this handle is a fallback substitution.
    pub fn is_substitute(&self) -> bool {
        self.substituted_for.is_some()
    }
}

struct FontEntry {
    resource_id: String,
    font: PdfFont,
}

#[derive(Default)]
struct FontTable {
    entries: Vec<FontEntry>,
    /// Font identity -> index into `entries`
    by_key: HashMap<String, usize>,
}

impl FontTable {
    fn insert(&mut self, key: String, font_name: &str, font: PdfFont) -> EmbeddedFontHandle {
        let kind = match font {
            PdfFont::Standard(_) => FontKind::Standard,
            PdfFont::Embedded(_) => FontKind::Embedded,
        };
        let index = match self.by_key.get(&key) {
            Some(&index) => index,
            None => {
                let index = self.entries.len();
                self.entries.push(FontEntry {
                    resource_id: format!("F{}", index + 1),
                    font,
                });
                self.by_key.insert(key, index);
                index
            },
        };
        EmbeddedFontHandle {
            resource_id: self.entries[index].resource_id.clone(),
            font_name: font_name.to_string(),
            kind,
            substituted_for: None,
        }
    }

    fn get_mut(&mut self, handle: &EmbeddedFontHandle) -> Result<&mut PdfFont> {
        self.entries
            .iter_mut()
            .find(|e| e.resource_id == handle.resource_id)
            .map(|e| &mut e.font)
            .ok_or_else(|| Error::Render(format!("font resource {} not in document", handle.resource_id)))
    }
}

struct PageData {
    width: f32,
    height: f32,
    content: ContentStreamBuilder,
}

/// A PDF document being built.
pub struct PdfDocument {
    config: PdfWriterConfig,
    pages: Mutex<Vec<PageData>>,
    fonts: Mutex<FontTable>,
    /// Font name -> first-load cell
    font_cells: Mutex<HashMap<String, Arc<OnceLock<EmbeddedFontHandle>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PdfDocument {
    /// Create an empty document.
    pub fn new(config: PdfWriterConfig) -> Self {
        Self {
            config,
            pages: Mutex::new(Vec::new()),
            fonts: Mutex::new(FontTable::default()),
            font_cells: Mutex::new(HashMap::new()),
        }
    }

    /// Writer configuration.
    pub fn config(&self) -> &PdfWriterConfig {
        &self.config
    }

    /// Add a page of the given size in points and return its index.
    pub fn add_page(&self, width: f32, height: f32) -> usize {
        let mut pages = lock(&self.pages);
        pages.push(PageData {
            width,
            height,
            content: ContentStreamBuilder::new(),
        });
        pages.len() - 1
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        lock(&self.pages).len()
    }

    /// Append drawn content to a page.
    pub fn append_to_page(&self, page: usize, content: ContentStreamBuilder) -> Result<()> {
        let mut pages = lock(&self.pages);
        let data = pages
            .get_mut(page)
            .ok_or_else(|| Error::Render(format!("page {} does not exist", page)))?;
        data.content.append(content);
        Ok(())
    }

    /// The first-load cell for a font name.
    ///
    /// All callers asking for the same name get the same cell, so
    /// `get_or_init` on it runs one initializer per document.
    pub fn font_cell(&self, font_name: &str) -> Arc<OnceLock<EmbeddedFontHandle>> {
        let mut cells = lock(&self.font_cells);
        Arc::clone(cells.entry(font_name.to_string()).or_default())
    }

    /// Register a built-in font. Each kind is added to the document once.
    pub fn add_standard_font(&self, font_name: &str, kind: StandardFontKind) -> EmbeddedFontHandle {
        let key = format!("standard:{}", kind.base_font());
        lock(&self.fonts).insert(key, font_name, PdfFont::Standard(StandardFont::new(kind)))
    }

    /// Register an embedded font under its registry name.
    pub fn add_embedded_font(&self, font: EmbeddedFont) -> EmbeddedFontHandle {
        let name = font.label().to_string();
        let key = format!("embedded:{}", name);
        lock(&self.fonts).insert(key, &name, PdfFont::Embedded(font))
    }

    /// Number of fonts in the font table.
    pub fn font_count(&self) -> usize {
        lock(&self.fonts).entries.len()
    }

    /// Number of embedded (non built-in) fonts.
    pub fn embedded_font_count(&self) -> usize {
        lock(&self.fonts)
            .entries
            .iter()
            .filter(|e| matches!(e.font, PdfFont::Embedded(_)))
            .count()
    }

    /// Per-character widths of `text` in points.
    pub fn char_widths(&self, handle: &EmbeddedFontHandle, text: &str, font_size: f32) -> Result<Vec<f32>> {
        lock(&self.fonts).get_mut(handle)?.char_widths(text, font_size)
    }

    /// Width of `text` in points: the sum of its character widths.
    pub fn text_width(&self, handle: &EmbeddedFontHandle, text: &str, font_size: f32) -> Result<f32> {
        Ok(self.char_widths(handle, text, font_size)?.iter().sum())
    }

    /// Whether the font behind `handle` has a glyph for every character.
    pub fn covers(&self, handle: &EmbeddedFontHandle, text: &str) -> Result<bool> {
        Ok(lock(&self.fonts).get_mut(handle)?.covers(text))
    }

    /// Encode text for drawing with `handle`, recording used glyphs.
    pub fn encode_text(&self, handle: &EmbeddedFontHandle, text: &str) -> Result<EncodedText> {
        lock(&self.fonts).get_mut(handle)?.encode(text)
    }

    /// Assemble the complete PDF file.
    pub fn finish(&self) -> Result<Vec<u8>> {
        let serializer = ObjectSerializer::compact();
        let pages = lock(&self.pages);
        let fonts = lock(&self.fonts);

        let mut next_id = 1u32;
        let mut alloc = || {
            let id = ObjectRef::new(next_id, 0);
            next_id += 1;
            id
        };

        let catalog_id = alloc();
        let pages_id = alloc();
        let mut objects: Vec<(ObjectRef, Object)> = Vec::new();

        // Fonts
        let mut font_resources = Dictionary::new();
        for entry in &fonts.entries {
            let font_id = alloc();
            font_resources.insert(entry.resource_id.clone(), Object::Reference(font_id));
            match &entry.font {
                PdfFont::Standard(font) => {
                    objects.push((
                        font_id,
                        ObjectSerializer::dict(vec![
                            ("Type", ObjectSerializer::name("Font")),
                            ("Subtype", ObjectSerializer::name("Type1")),
                            ("BaseFont", ObjectSerializer::name(font.base_font())),
                            ("Encoding", ObjectSerializer::name("WinAnsiEncoding")),
                        ]),
                    ));
                },
                PdfFont::Embedded(font) => {
                    let ids = [alloc(), alloc(), alloc(), alloc()];
                    objects.extend(self.embedded_font_objects(font_id, ids, font)?);
                },
            }
        }

        // Pages
        let resources = ObjectSerializer::dict(vec![("Font", Object::Dictionary(font_resources))]);
        let mut kids = Vec::with_capacity(pages.len());
        for page in pages.iter() {
            let page_id = alloc();
            let content_id = alloc();
            kids.push(Object::Reference(page_id));

            objects.push((
                page_id,
                ObjectSerializer::dict(vec![
                    ("Type", ObjectSerializer::name("Page")),
                    ("Parent", ObjectSerializer::reference(pages_id)),
                    (
                        "MediaBox",
                        ObjectSerializer::rect(0.0, 0.0, f64::from(page.width), f64::from(page.height)),
                    ),
                    ("Contents", ObjectSerializer::reference(content_id)),
                    ("Resources", resources.clone()),
                ]),
            ));
            objects.push((content_id, self.stream_object(Dictionary::new(), page.content.build()?)?));
        }

        objects.push((
            pages_id,
            ObjectSerializer::dict(vec![
                ("Type", ObjectSerializer::name("Pages")),
                ("Kids", Object::Array(kids)),
                ("Count", Object::Integer(pages.len() as i64)),
            ]),
        ));
        objects.push((
            catalog_id,
            ObjectSerializer::dict(vec![
                ("Type", ObjectSerializer::name("Catalog")),
                ("Pages", ObjectSerializer::reference(pages_id)),
            ]),
        ));

        let info_id = alloc();
        let mut info = Vec::new();
        if let Some(title) = &self.config.title {
            info.push(("Title", ObjectSerializer::text_string(title)));
        }
        if let Some(author) = &self.config.author {
            info.push(("Author", ObjectSerializer::text_string(author)));
        }
        if let Some(subject) = &self.config.subject {
            info.push(("Subject", ObjectSerializer::text_string(subject)));
        }
        if let Some(creator) = &self.config.creator {
            info.push(("Creator", ObjectSerializer::text_string(creator)));
        }
        objects.push((info_id, ObjectSerializer::dict(info)));
        let size = next_id;

        // Body
        let mut output = Vec::new();
        writeln!(output, "%PDF-{}", self.config.version)?;
        output.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        objects.sort_by_key(|(id, _)| id.id);
        let mut offsets = Vec::with_capacity(objects.len());
        for (id, obj) in &objects {
            offsets.push(output.len());
            serializer.write_indirect(&mut output, *id, obj)?;
        }

        // Cross-reference table and trailer
        let xref_start = output.len();
        writeln!(output, "xref")?;
        writeln!(output, "0 {}", size)?;
        writeln!(output, "0000000000 65535 f ")?;
        for offset in &offsets {
            writeln!(output, "{:010} 00000 n ", offset)?;
        }

        let trailer = ObjectSerializer::dict(vec![
            ("Size", Object::Integer(i64::from(size))),
            ("Root", ObjectSerializer::reference(catalog_id)),
            ("Info", ObjectSerializer::reference(info_id)),
        ]);
        writeln!(output, "trailer")?;
        serializer.write_object(&mut output, &trailer)?;
        writeln!(output)?;
        writeln!(output, "startxref")?;
        writeln!(output, "{}", xref_start)?;
        write!(output, "%%EOF")?;

        log::debug!(
            "Assembled PDF: {} pages, {} fonts, {} bytes",
            pages.len(),
            fonts.entries.len(),
            output.len()
        );
        Ok(output)
    }

    /// Write the PDF to a file.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let bytes = self.finish()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn stream_object(&self, mut dict: Dictionary, data: Vec<u8>) -> Result<Object> {
        let data = if self.config.compress {
            dict.insert("Filter".to_string(), ObjectSerializer::name("FlateDecode"));
            compress_data(&data)?
        } else {
            data
        };
        dict.insert("Length".to_string(), Object::Integer(data.len() as i64));
        Ok(Object::Stream {
            dict,
            data: bytes::Bytes::from(data),
        })
    }

    /// Type0 font, CIDFontType2 descendant, descriptor, FontFile2 and ToUnicode.
    fn embedded_font_objects(
        &self,
        type0_id: ObjectRef,
        [cid_id, descriptor_id, file_id, tounicode_id]: [ObjectRef; 4],
        font: &EmbeddedFont,
    ) -> Result<Vec<(ObjectRef, Object)>> {
        // the whole program is embedded, so no subset tag
        let base_font = font.base_name();
        let metrics = font.metrics();
        let (llx, lly, urx, ury) = metrics.pdf_bbox();

        let type0 = ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Font")),
            ("Subtype", ObjectSerializer::name("Type0")),
            ("BaseFont", ObjectSerializer::name(base_font)),
            ("Encoding", ObjectSerializer::name("Identity-H")),
            ("DescendantFonts", Object::Array(vec![Object::Reference(cid_id)])),
            ("ToUnicode", ObjectSerializer::reference(tounicode_id)),
        ]);

        let cid_font = ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("Font")),
            ("Subtype", ObjectSerializer::name("CIDFontType2")),
            ("BaseFont", ObjectSerializer::name(base_font)),
            (
                "CIDSystemInfo",
                ObjectSerializer::dict(vec![
                    ("Registry", Object::String(b"Adobe".to_vec())),
                    ("Ordering", Object::String(b"Identity".to_vec())),
                    ("Supplement", Object::Integer(0)),
                ]),
            ),
            ("FontDescriptor", ObjectSerializer::reference(descriptor_id)),
            ("CIDToGIDMap", ObjectSerializer::name("Identity")),
            ("DW", Object::Integer(1000)),
            ("W", font.widths_array()),
        ]);

        let descriptor = ObjectSerializer::dict(vec![
            ("Type", ObjectSerializer::name("FontDescriptor")),
            ("FontName", ObjectSerializer::name(base_font)),
            ("Flags", Object::Integer(i64::from(metrics.flags))),
            (
                "FontBBox",
                Object::Array(vec![
                    Object::Integer(i64::from(llx)),
                    Object::Integer(i64::from(lly)),
                    Object::Integer(i64::from(urx)),
                    Object::Integer(i64::from(ury)),
                ]),
            ),
            ("ItalicAngle", Object::Real(f64::from(metrics.italic_angle))),
            ("Ascent", Object::Integer(i64::from(metrics.pdf_ascender()))),
            ("Descent", Object::Integer(i64::from(metrics.pdf_descender()))),
            ("CapHeight", Object::Integer(i64::from(metrics.pdf_cap_height()))),
            ("StemV", Object::Integer(i64::from(metrics.stem_v))),
            ("FontFile2", ObjectSerializer::reference(file_id)),
        ]);

        let mut file_dict = Dictionary::new();
        file_dict.insert("Length1".to_string(), Object::Integer(font.font_data().len() as i64));
        let font_file = self.stream_object(file_dict, font.font_data().to_vec())?;
        let tounicode =
            self.stream_object(Dictionary::new(), font.subsetter().tounicode_cmap().into_bytes())?;

        Ok(vec![
            (type0_id, type0),
            (cid_id, cid_font),
            (descriptor_id, descriptor),
            (file_id, font_file),
            (tounicode_id, tounicode),
        ])
    }
}
