//! Core entry point for the mdpdf crate.
//!
//! Markdown text is split into sections and blocks by [`parser`], laid out page
//! by page by [`layout`] on a [`canvas::Canvas`], and assembled into a complete
//! document (cover, table of contents, body, resources) by [`builder`].

pub mod builder;
pub mod canvas;
pub mod error;
pub mod fonts;
pub mod inline;
pub mod layout;
pub mod model;
pub mod parser;
pub mod sanitize;
pub mod theme;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use builder::{PdfBuilder, RenderedPdf, TocStyle};
pub use error::{Error, Result};
pub use inline::strip_inline;
pub use parser::parse;
pub use sanitize::sanitize;
