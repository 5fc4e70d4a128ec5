//! Font catalog, glyph coverage and font program parsing.
//!
//! - [`glyphs`]: detects text that needs extended (Vietnamese) glyphs
//! - [`registry`]: named font descriptors and their loaders
//! - [`source`]: where loadable font bytes come from
//! - [`truetype_parser`] / [`font_subsetter`]: embedding support

pub mod font_subsetter;
pub mod glyphs;
pub mod registry;
pub mod source;
pub mod truetype_parser;

pub use font_subsetter::FontSubsetter;
pub use glyphs::{is_extended_char, requires_extended_glyphs, to_ascii_transliteration};
pub use registry::{FontDescriptor, FontLoader, FontProgram, FontRegistry, StandardFontKind};
pub use source::{
    default_source, ChainedFontSource, DirectoryFontSource, FontSource, MemoryFontSource,
    SourceLoader,
};
pub use truetype_parser::{FontMetrics, TrueTypeError, TrueTypeFont};

#[cfg(feature = "remote-fonts")]
pub use source::RemoteFontSource;
