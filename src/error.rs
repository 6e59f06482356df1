//! Error types shared by the conversion pipeline.

use std::io;
use std::path::PathBuf;

/// Errors surfaced while converting a Markdown document into a PDF.
///
/// Unrepresentable characters and malformed Markdown never show up here: the
/// sanitizer and the parser absorb them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The Markdown input could not be read.
    #[error("failed to read {}", path.display())]
    Read {
        /// Path of the input file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The rendered PDF could not be written.
    #[error("failed to write {}", path.display())]
    Write {
        /// Path of the output file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// No usable font family for text metrics was found.
    #[error("failed to load fonts")]
    Fonts(#[source] genpdf::error::Error),

    /// The PDF backend rejected a font or serialization request.
    #[error("PDF rendering failed")]
    Render(#[from] printpdf::Error),

    /// The written PDF could not be reparsed to pin its dates and identifier.
    #[error("failed to finalize PDF bytes")]
    Finalize(#[from] lopdf::Error),

    /// A drawing request referred to a page that was never opened.
    #[error("page {page} has not been created")]
    MissingPage {
        /// The requested (1-based) page number.
        page: usize,
    },

    /// Section bookmarks could not be embedded into the rendered bytes.
    #[cfg(feature = "bookmarks")]
    #[error("failed to embed section bookmarks")]
    Bookmarks(#[from] crate::bookmarks::BookmarkError),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
