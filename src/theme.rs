//! Colour palette shared by the cover, contents page and body layout.

use crate::canvas::Rgb;

/// Colours used when drawing a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    /// Titles, rules and table headers.
    pub accent: Rgb,
    /// Subsection headings.
    pub subheading: Rgb,
    /// Body text.
    pub body: Rgb,
    /// Subtitles, quotes and resource descriptions.
    pub muted: Rgb,
    /// Running header and footer text.
    pub faint: Rgb,
    /// Running header rule.
    pub rule: Rgb,
    /// Code block background.
    pub code_background: Rgb,
    /// Code block border colour.
    pub code_border: Rgb,
    /// Code block text.
    pub code_text: Rgb,
    /// Table header text.
    pub table_header_text: Rgb,
    /// Table data row background.
    pub table_row_background: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Rgb::new(41, 128, 185),
            subheading: Rgb::new(52, 73, 94),
            body: Rgb::new(50, 50, 50),
            muted: Rgb::new(100, 100, 100),
            faint: Rgb::new(128, 128, 128),
            rule: Rgb::new(200, 200, 200),
            code_background: Rgb::new(240, 240, 240),
            code_border: Rgb::new(200, 200, 200),
            code_text: Rgb::new(30, 30, 30),
            table_header_text: Rgb::new(255, 255, 255),
            table_row_background: Rgb::new(245, 245, 245),
        }
    }
}
