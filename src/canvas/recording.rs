//! In-memory backend that records every drawing request.
//!
//! Useful for inspecting a layout without loading fonts or producing PDF
//! bytes. Text width is estimated from the character count.

use super::{Font, FontFamily, Point, Rect, Rgb, Surface, TextRun};
use crate::error::Result;

/// Average glyph advance of the proportional face, as a fraction of the font size.
const SANS_ADVANCE: f64 = 0.5;
/// Glyph advance of the monospaced face, as a fraction of the font size.
const MONO_ADVANCE: f64 = 0.6;

/// A recorded drawing request.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// A page was appended.
    Page {
        /// Page width.
        width: f64,
        /// Page height.
        height: f64,
    },
    /// A run of text.
    Text {
        /// Zero-based page index.
        page: usize,
        /// Left edge of the text.
        x: f64,
        /// Top edge of the enclosing cell.
        y: f64,
        /// Height of the enclosing cell.
        height: f64,
        /// Estimated text width.
        width: f64,
        /// Font used.
        font: Font,
        /// Text colour.
        color: Rgb,
        /// The text itself.
        text: String,
    },
    /// A stroked line.
    Line {
        /// Zero-based page index.
        page: usize,
        /// Start point.
        from: Point,
        /// End point.
        to: Point,
        /// Stroke width.
        width: f64,
        /// Stroke colour.
        color: Rgb,
    },
    /// A filled rectangle.
    Fill {
        /// Zero-based page index.
        page: usize,
        /// Filled area.
        rect: Rect,
        /// Fill colour.
        color: Rgb,
    },
}

impl DrawOp {
    /// Page the operation targets; `None` for page creation.
    pub fn page(&self) -> Option<usize> {
        match self {
            DrawOp::Page { .. } => None,
            DrawOp::Text { page, .. } | DrawOp::Line { page, .. } | DrawOp::Fill { page, .. } => {
                Some(*page)
            }
        }
    }

    /// Lowest `y` touched by the operation; `None` for page creation.
    pub fn bottom(&self) -> Option<f64> {
        match self {
            DrawOp::Page { .. } => None,
            DrawOp::Text { y, height, .. } => Some(y + height),
            DrawOp::Line { from, to, .. } => Some(from.y.max(to.y)),
            DrawOp::Fill { rect, .. } => Some(rect.y + rect.height),
        }
    }
}

/// Backend that keeps a log of [`DrawOp`]s.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Operations recorded so far.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Estimated width of `text` in `font`.
    pub fn estimate_width(font: Font, text: &str) -> f64 {
        let advance = match font.family {
            FontFamily::Sans => SANS_ADVANCE,
            FontFamily::Mono => MONO_ADVANCE,
        };
        text.chars().count() as f64 * font.size_mm() * advance
    }
}

impl Surface for RecordingSurface {
    type Output = Vec<DrawOp>;

    fn begin_page(&mut self, width: f64, height: f64) -> Result<()> {
        self.ops.push(DrawOp::Page { width, height });
        Ok(())
    }

    fn text_width(&self, font: Font, text: &str) -> f64 {
        Self::estimate_width(font, text)
    }

    fn draw_text(&mut self, run: TextRun<'_>) -> Result<()> {
        self.ops.push(DrawOp::Text {
            page: run.page,
            x: run.x,
            y: run.y,
            height: run.height,
            width: Self::estimate_width(run.font, run.text),
            font: run.font,
            color: run.color,
            text: run.text.to_owned(),
        });
        Ok(())
    }

    fn draw_line(
        &mut self,
        page: usize,
        from: Point,
        to: Point,
        width: f64,
        color: Rgb,
    ) -> Result<()> {
        self.ops.push(DrawOp::Line {
            page,
            from,
            to,
            width,
            color,
        });
        Ok(())
    }

    fn fill_rect(&mut self, page: usize, rect: Rect, color: Rgb) -> Result<()> {
        self.ops.push(DrawOp::Fill { page, rect, color });
        Ok(())
    }

    fn finish(self) -> Result<Self::Output> {
        Ok(self.ops)
    }
}
