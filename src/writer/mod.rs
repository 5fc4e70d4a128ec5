//! PDF writing module.
//!
//! ## Architecture
//!
//! ```text
//! render::TemplateRenderer / render::render_text
//!     ↓
//! [ContentStreamBuilder] (text and frame operators per page)
//!     ↓
//! [PdfDocument] (pages + font table, Type1 and Type0 fonts)
//!     ↓
//! [ObjectSerializer] (serializes PDF objects)
//!     ↓
//! PDF bytes
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use template_oxide::writer::{PdfDocument, PdfWriterConfig, ContentStreamBuilder};
//! use template_oxide::fonts::StandardFontKind;
//!
//! let doc = PdfDocument::new(PdfWriterConfig::default().with_title("Quiz"));
//! let page = doc.add_page(595.0, 842.0);
//! let font = doc.add_standard_font("helvetica", StandardFontKind::Helvetica);
//! let mut content = ContentStreamBuilder::new();
//! content.set_font(&font.resource_id, 12.0).text("Hello", 72.0, 770.0);
//! doc.append_to_page(page, content)?;
//! let bytes = doc.finish()?;
//! ```

mod content_stream;
mod document;
mod font_manager;
mod object_serializer;

pub use content_stream::{Color, ContentStreamBuilder, ContentStreamOp};
pub use document::{EmbeddedFontHandle, FontKind, PdfDocument, PdfWriterConfig};
pub use font_manager::{EmbeddedFont, EncodedText, PdfFont, StandardFont};
pub use object_serializer::ObjectSerializer;
