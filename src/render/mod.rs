//! Rendering: font embedding, text layout and template pages.
//!
//! ```text
//! Template + data
//!     ↓
//! [TemplateRenderer] (per item, failures isolated)
//!     ↓
//! [TextRenderer] (wrap, truncate, align)
//!     ↓
//! [FontEmbedder] (resolve, load once, fall back)
//!     ↓
//! PdfDocument → PDF bytes
//! ```

mod embedder;
mod page;
mod text;

pub use embedder::FontEmbedder;
pub use page::{ItemFailure, RenderOutput, TemplateRenderer};
pub use text::{DrawnText, TextAlign, TextOptions, TextRenderer};
