//! Block layout and pagination.
//!
//! [`Layout`] draws the blocks of a [`Section`] onto a [`Canvas`]. Flowing
//! text (paragraphs, bold lines, bullets, quotes) relies on the canvas'
//! automatic page break. Tables and code are drawn row by row and line by
//! line, and force a page break early when the cursor gets close to the
//! bottom of the page so that a row never ends up clipped or orphaned.

use log::debug;

use crate::canvas::{Canvas, Cell, FontFamily, FontStyle, Surface};
use crate::error::Result;
use crate::model::{Block, Section, TableBlock};
use crate::theme::Theme;

const SUBSECTION_SIZE: u8 = 14;
const BODY_SIZE: u8 = 10;
const BODY_LINE_HEIGHT: f64 = 6.0;
const CODE_SIZE: u8 = 9;
const CODE_LINE_HEIGHT: f64 = 5.5;
const CODE_INDENT: &str = "  ";
const TABLE_SIZE: u8 = 9;
const TABLE_ROW_HEIGHT: f64 = 7.0;
const TABLE_GAP: f64 = 3.0;
const BULLET_INDENT: f64 = 5.0;
const BULLET_MARKER_WIDTH: f64 = 5.0;
const QUOTE_INDENT: f64 = 10.0;
const INDENTED_TEXT_WIDTH: f64 = 175.0;

/// Column widths of the reference 190 mm content area, by column count.
const FIXED_COLUMN_WIDTHS: &[&[f64]] = &[
    &[45.0, 145.0],
    &[35.0, 55.0, 100.0],
    &[30.0, 45.0, 50.0, 65.0],
];
const REFERENCE_CONTENT_WIDTH: f64 = 190.0;

/// Space that must remain below the cursor, measured from the bottom edge of
/// the page, before a block part is drawn on the current page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pagination {
    /// Reserve required before a table header row.
    pub table_header_reserve: f64,
    /// Reserve required before a table data row.
    pub table_row_reserve: f64,
    /// Reserve required before each code line.
    pub code_line_reserve: f64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            table_header_reserve: 47.0,
            table_row_reserve: 27.0,
            code_line_reserve: 32.0,
        }
    }
}

/// Returns column widths for a table with `columns` columns spanning `content_width`.
///
/// Two to four columns use hand-tuned proportions; any other count splits the
/// width evenly and gives the rounding remainder to the last column.
pub fn column_widths(columns: usize, content_width: f64) -> Vec<f64> {
    if columns == 0 {
        return Vec::new();
    }

    let scale = content_width / REFERENCE_CONTENT_WIDTH;
    if let Some(widths) = FIXED_COLUMN_WIDTHS
        .iter()
        .find(|widths| widths.len() == columns)
    {
        return widths.iter().map(|width| width * scale).collect();
    }

    let even = (REFERENCE_CONTENT_WIDTH / columns as f64).floor();
    let mut widths = vec![even; columns];
    if let Some(last) = widths.last_mut() {
        *last += REFERENCE_CONTENT_WIDTH - even * columns as f64;
    }
    widths.iter().map(|width| width * scale).collect()
}

/// Page of a subsection heading inside a rendered section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubsectionMark {
    /// Heading text as drawn.
    pub title: String,
    /// One-based page the heading was drawn on.
    pub page: usize,
}

/// Where a section ended up in the paginated document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectionPlacement {
    /// One-based page carrying the section title.
    pub start_page: usize,
    /// Subsection headings in document order.
    pub subsections: Vec<SubsectionMark>,
}

/// Draws sections and blocks.
#[derive(Clone, Debug, Default)]
pub struct Layout {
    theme: Theme,
    pagination: Pagination,
}

impl Layout {
    /// Creates a layout with the given palette and break reserves.
    pub fn new(theme: Theme, pagination: Pagination) -> Self {
        Self { theme, pagination }
    }

    /// Returns the palette.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Draws a section: its title on a fresh page, then every block.
    ///
    /// Returns the page the section starts on and the page of each of its
    /// subsection headings.
    pub fn render_section<S: Surface>(
        &self,
        canvas: &mut Canvas<S>,
        section: &Section,
    ) -> Result<SectionPlacement> {
        self.section_title(canvas, section.title())?;
        let mut placement = SectionPlacement {
            start_page: canvas.page_no(),
            subsections: Vec::new(),
        };

        for block in section.blocks() {
            self.render_block(canvas, block)?;
            if let Block::Heading { text, .. } = block {
                placement.subsections.push(SubsectionMark {
                    title: text.clone(),
                    page: canvas.page_no(),
                });
            }
        }
        debug!(
            "section '{}' ends on page {} at y={:.1}",
            section.title(),
            canvas.page_no(),
            canvas.cursor_y()
        );
        Ok(placement)
    }

    /// Opens a new page and draws a large section title with an accent rule.
    pub fn section_title<S: Surface>(&self, canvas: &mut Canvas<S>, title: &str) -> Result<()> {
        canvas.new_page()?;
        canvas.set_font(FontFamily::Sans, FontStyle::BOLD, 20);
        canvas.set_text_color(self.theme.accent);
        canvas.draw_cell(0.0, 12.0, title, Cell::new().next_line())?;

        let geometry = *canvas.geometry();
        let y = canvas.cursor_y() + 2.0;
        canvas.set_draw_color(self.theme.accent);
        canvas.set_line_width(0.5);
        canvas.draw_line(
            geometry.margins.left,
            y,
            geometry.width - geometry.margins.right,
            y,
        )?;
        canvas.move_cursor_down(8.0);
        Ok(())
    }

    /// Draws a single block at the cursor.
    pub fn render_block<S: Surface>(&self, canvas: &mut Canvas<S>, block: &Block) -> Result<()> {
        match block {
            Block::Heading { text, .. } => self.subsection_title(canvas, text),
            Block::Paragraph(text) => {
                self.flowing_text(canvas, FontStyle::REGULAR, text)?;
                canvas.move_cursor_down(2.0);
                Ok(())
            }
            Block::BoldLine(text) => {
                self.flowing_text(canvas, FontStyle::BOLD, text)?;
                canvas.move_cursor_down(2.0);
                Ok(())
            }
            Block::BulletItem(text) => self.bullet(canvas, text),
            Block::Quote(text) => self.quote(canvas, text),
            Block::CodeBlock { lines } => self.code_block(canvas, lines),
            Block::Table(table) => self.table(canvas, table),
        }
    }

    fn subsection_title<S: Surface>(&self, canvas: &mut Canvas<S>, text: &str) -> Result<()> {
        canvas.move_cursor_down(4.0);
        canvas.set_font(FontFamily::Sans, FontStyle::BOLD, SUBSECTION_SIZE);
        canvas.set_text_color(self.theme.subheading);
        canvas.draw_cell(0.0, 10.0, text, Cell::new().next_line())?;
        canvas.move_cursor_down(2.0);
        Ok(())
    }

    fn flowing_text<S: Surface>(
        &self,
        canvas: &mut Canvas<S>,
        style: FontStyle,
        text: &str,
    ) -> Result<()> {
        canvas.set_font(FontFamily::Sans, style, BODY_SIZE);
        canvas.set_text_color(self.theme.body);
        canvas.draw_multiline(0.0, BODY_LINE_HEIGHT, text)
    }

    fn bullet<S: Surface>(&self, canvas: &mut Canvas<S>, text: &str) -> Result<()> {
        canvas.set_font(FontFamily::Sans, FontStyle::REGULAR, BODY_SIZE);
        canvas.set_text_color(self.theme.body);
        canvas.set_cursor_x(canvas.cursor_x() + BULLET_INDENT);
        canvas.draw_cell(BULLET_MARKER_WIDTH, BODY_LINE_HEIGHT, "-", Cell::new())?;
        canvas.draw_multiline(INDENTED_TEXT_WIDTH, BODY_LINE_HEIGHT, text)?;
        canvas.move_cursor_down(1.0);
        Ok(())
    }

    fn quote<S: Surface>(&self, canvas: &mut Canvas<S>, text: &str) -> Result<()> {
        canvas.set_font(FontFamily::Sans, FontStyle::ITALIC, BODY_SIZE);
        canvas.set_text_color(self.theme.muted);
        canvas.set_cursor_x(canvas.cursor_x() + QUOTE_INDENT);
        canvas.draw_multiline(INDENTED_TEXT_WIDTH, BODY_LINE_HEIGHT, text)?;
        canvas.move_cursor_down(2.0);
        Ok(())
    }

    fn code_block<S: Surface>(&self, canvas: &mut Canvas<S>, lines: &[String]) -> Result<()> {
        canvas.set_fill_color(self.theme.code_background);
        canvas.set_draw_color(self.theme.code_border);
        canvas.set_font(FontFamily::Mono, FontStyle::REGULAR, CODE_SIZE);
        canvas.set_text_color(self.theme.code_text);

        let threshold = canvas.geometry().height - self.pagination.code_line_reserve;
        let x = canvas.cursor_x();
        let width = canvas.geometry().content_width();
        for line in lines {
            if canvas.cursor_y() > threshold {
                debug!("code block continues on a new page");
                canvas.new_page()?;
            }
            canvas.set_cursor_x(x);
            let text = format!("{CODE_INDENT}{line}");
            canvas.draw_cell(width, CODE_LINE_HEIGHT, &text, Cell::new().fill().next_line())?;
        }
        canvas.move_cursor_down(4.0);
        Ok(())
    }

    fn table<S: Surface>(&self, canvas: &mut Canvas<S>, table: &TableBlock) -> Result<()> {
        let Some(header) = table.header() else {
            return Ok(());
        };
        let geometry = *canvas.geometry();
        let widths = column_widths(header.len(), geometry.content_width());

        if canvas.cursor_y() > geometry.height - self.pagination.table_header_reserve {
            debug!("moving table header to a new page");
            canvas.new_page()?;
        }
        self.table_row(canvas, header, &widths, true)?;

        let row_threshold = geometry.height - self.pagination.table_row_reserve;
        for row in table.data_rows() {
            if canvas.cursor_y() > row_threshold {
                debug!("table continues on a new page");
                canvas.new_page()?;
            }
            self.table_row(canvas, row, &widths, false)?;
        }

        canvas.move_cursor_down(TABLE_GAP);
        Ok(())
    }

    /// Draws one row. Cells beyond the provisioned columns are dropped.
    fn table_row<S: Surface>(
        &self,
        canvas: &mut Canvas<S>,
        cells: &[String],
        widths: &[f64],
        header: bool,
    ) -> Result<()> {
        if header {
            canvas.set_font(FontFamily::Sans, FontStyle::BOLD, TABLE_SIZE);
            canvas.set_fill_color(self.theme.accent);
            canvas.set_text_color(self.theme.table_header_text);
        } else {
            canvas.set_font(FontFamily::Sans, FontStyle::REGULAR, TABLE_SIZE);
            canvas.set_fill_color(self.theme.table_row_background);
            canvas.set_text_color(self.theme.body);
        }
        canvas.set_draw_color(self.theme.rule);

        if cells.len() > widths.len() {
            debug!(
                "table row has {} cells but only {} columns; extra cells dropped",
                cells.len(),
                widths.len()
            );
        }
        for (cell, width) in cells.iter().zip(widths) {
            canvas.draw_cell(*width, TABLE_ROW_HEIGHT, cell, Cell::new().border().fill())?;
        }
        canvas.move_cursor_down(TABLE_ROW_HEIGHT);
        Ok(())
    }
}
