//! Stateful page-drawing surface.
//!
//! [`Canvas`] keeps the drawing state a layout routine works against: the
//! current page, the cursor position, the selected font and colours, and the
//! automatic page-break margin. The actual marks are delegated to a
//! [`Surface`] backend, which only needs to place text, lines and filled
//! rectangles at absolute positions.
//!
//! All coordinates are millimetres measured from the top-left corner of the
//! page, with `y` growing downwards.

mod pdf;
pub mod recording;

use std::path::Path;

use log::debug;

use crate::error::{Error, Result};
use crate::sanitize::sanitize;

pub use pdf::PdfSurface;

/// Horizontal padding applied inside cells, as in classic cell-based PDF writers.
pub const CELL_MARGIN: f64 = 1.0;

const PT_TO_MM: f64 = 25.4 / 72.0;

/// An RGB colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Creates a colour from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Black.
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
}

/// Font families available to the layout code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FontFamily {
    /// Proportional sans-serif face (Helvetica metrics).
    #[default]
    Sans,
    /// Monospaced face (Courier metrics).
    Mono,
}

/// Weight and slant of a font.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FontStyle {
    /// Bold weight.
    pub bold: bool,
    /// Italic slant.
    pub italic: bool,
}

impl FontStyle {
    /// Upright regular weight.
    pub const REGULAR: FontStyle = FontStyle {
        bold: false,
        italic: false,
    };
    /// Upright bold weight.
    pub const BOLD: FontStyle = FontStyle {
        bold: true,
        italic: false,
    };
    /// Italic regular weight.
    pub const ITALIC: FontStyle = FontStyle {
        bold: false,
        italic: true,
    };
}

/// A fully specified font selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Font {
    /// Font family.
    pub family: FontFamily,
    /// Weight and slant.
    pub style: FontStyle,
    /// Size in points.
    pub size: u8,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: FontFamily::Sans,
            style: FontStyle::REGULAR,
            size: 12,
        }
    }
}

impl Font {
    /// Font size converted to millimetres.
    pub fn size_mm(&self) -> f64 {
        f64::from(self.size) * PT_TO_MM
    }
}

/// Horizontal alignment of text inside a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    /// Flush with the left cell padding.
    #[default]
    Left,
    /// Centred in the cell.
    Center,
    /// Flush with the right cell padding.
    Right,
}

/// Cursor movement after a cell has been drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Flow {
    /// Continue to the right of the cell on the same line.
    #[default]
    Right,
    /// Move to the left margin of the next line.
    NextLine,
}

/// Options for [`Canvas::draw_cell`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    border: bool,
    fill: bool,
    align: Align,
    flow: Flow,
}

impl Cell {
    /// Borderless, unfilled, left aligned cell that keeps the cursor on the line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Outlines the cell with the draw colour.
    pub fn border(mut self) -> Self {
        self.border = true;
        self
    }

    /// Paints the cell background with the fill colour.
    pub fn fill(mut self) -> Self {
        self.fill = true;
        self
    }

    /// Sets the text alignment.
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Moves the cursor to the start of the next line afterwards.
    pub fn next_line(mut self) -> Self {
        self.flow = Flow::NextLine;
        self
    }
}

/// A point on a page.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    /// Horizontal offset from the left page edge.
    pub x: f64,
    /// Vertical offset from the top page edge.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle on a page.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// Page margins in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margins {
    /// Top margin; the cursor starts here on a new page.
    pub top: f64,
    /// Left margin.
    pub left: f64,
    /// Right margin.
    pub right: f64,
    /// Bottom margin; content below `height - bottom` triggers a page break.
    pub bottom: f64,
}

/// Page size and margins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    /// Page width.
    pub width: f64,
    /// Page height.
    pub height: f64,
    /// Page margins.
    pub margins: Margins,
}

impl Default for PageGeometry {
    /// A4 portrait with 10 mm margins and a 20 mm bottom margin.
    fn default() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            margins: Margins {
                top: 10.0,
                left: 10.0,
                right: 10.0,
                bottom: 20.0,
            },
        }
    }
}

impl PageGeometry {
    /// Width between the left and right margins.
    pub fn content_width(&self) -> f64 {
        self.width - self.margins.left - self.margins.right
    }

    /// Lowest `y` that content may reach.
    pub fn content_bottom(&self) -> f64 {
        self.height - self.margins.bottom
    }
}

/// A run of text placed by the canvas.
#[derive(Clone, Copy, Debug)]
pub struct TextRun<'a> {
    /// Zero-based page index.
    pub page: usize,
    /// Left edge of the text.
    pub x: f64,
    /// Top edge of the cell the text is centred in.
    pub y: f64,
    /// Height of that cell.
    pub height: f64,
    /// Font to draw with.
    pub font: Font,
    /// Text colour.
    pub color: Rgb,
    /// Latin-1 text.
    pub text: &'a str,
}

/// Backend that turns canvas drawing requests into output.
pub trait Surface {
    /// Result of [`Surface::finish`].
    type Output;

    /// Appends a new page with the given size.
    fn begin_page(&mut self, width: f64, height: f64) -> Result<()>;

    /// Width of `text` when set in `font`.
    fn text_width(&self, font: Font, text: &str) -> f64;

    /// Places a run of text.
    fn draw_text(&mut self, run: TextRun<'_>) -> Result<()>;

    /// Strokes a straight line.
    fn draw_line(
        &mut self,
        page: usize,
        from: Point,
        to: Point,
        width: f64,
        color: Rgb,
    ) -> Result<()>;

    /// Paints a filled rectangle.
    fn fill_rect(&mut self, page: usize, rect: Rect, color: Rgb) -> Result<()>;

    /// Completes the output.
    fn finish(self) -> Result<Self::Output>;
}

/// Hooks invoked when a page is opened and when the document is closed.
pub trait PageDecorator<S: Surface> {
    /// Draws the running header; called right after every new page.
    fn header(&mut self, _canvas: &mut Canvas<S>) -> Result<()> {
        Ok(())
    }

    /// Draws the running footer; called for every page once the page count is final.
    fn footer(&mut self, _canvas: &mut Canvas<S>) -> Result<()> {
        Ok(())
    }
}

#[derive(Clone, Copy)]
struct DrawState {
    font: Font,
    text_color: Rgb,
    draw_color: Rgb,
    fill_color: Rgb,
    line_width: f64,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            font: Font::default(),
            text_color: Rgb::BLACK,
            draw_color: Rgb::BLACK,
            fill_color: Rgb::BLACK,
            line_width: 0.2,
        }
    }
}

/// Cursor-based drawing capability owned by one document render.
pub struct Canvas<S: Surface> {
    surface: S,
    geometry: PageGeometry,
    page_count: usize,
    page: usize,
    x: f64,
    y: f64,
    state: DrawState,
    auto_page_break: bool,
    page_number_alias: Option<String>,
    decorator: Option<Box<dyn PageDecorator<S>>>,
    decorating: bool,
}

impl<S: Surface> Canvas<S> {
    /// Creates a canvas without any pages.
    pub fn new(surface: S, geometry: PageGeometry) -> Self {
        Self {
            surface,
            geometry,
            page_count: 0,
            page: 0,
            x: geometry.margins.left,
            y: geometry.margins.top,
            state: DrawState::default(),
            auto_page_break: true,
            page_number_alias: None,
            decorator: None,
            decorating: false,
        }
    }

    /// Installs the header/footer decorator.
    pub fn set_decorator(&mut self, decorator: impl PageDecorator<S> + 'static) {
        self.decorator = Some(Box::new(decorator));
    }

    /// Returns the page geometry.
    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Returns the backend.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// One-based number of the page being drawn on (0 before the first page).
    pub fn page_no(&self) -> usize {
        if self.page_count == 0 {
            0
        } else {
            self.page + 1
        }
    }

    /// Number of pages created so far.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Opens a new page, resets the cursor to the top-left margin and runs the header hook.
    pub fn new_page(&mut self) -> Result<()> {
        self.surface
            .begin_page(self.geometry.width, self.geometry.height)?;
        self.page_count += 1;
        self.page = self.page_count - 1;
        self.x = self.geometry.margins.left;
        self.y = self.geometry.margins.top;
        debug!("opened page {}", self.page_count);

        if let Some(mut decorator) = self.decorator.take() {
            let saved = self.state;
            self.decorating = true;
            let result = decorator.header(self);
            self.decorating = false;
            self.state = saved;
            self.decorator = Some(decorator);
            result?;
        }
        Ok(())
    }

    /// Moves drawing back to an existing page with the cursor at its top-left margin.
    ///
    /// Returns `false` if `page_no` does not exist. The next [`Canvas::new_page`]
    /// still appends after the last page.
    pub fn select_page(&mut self, page_no: usize) -> bool {
        if page_no == 0 || page_no > self.page_count {
            return false;
        }
        self.page = page_no - 1;
        self.x = self.geometry.margins.left;
        self.y = self.geometry.margins.top;
        true
    }

    /// Selects the font used for subsequent text.
    pub fn set_font(&mut self, family: FontFamily, style: FontStyle, size: u8) {
        self.state.font = Font {
            family,
            style,
            size,
        };
    }

    /// Returns the current font.
    pub fn font(&self) -> Font {
        self.state.font
    }

    /// Sets the colour used for text.
    pub fn set_text_color(&mut self, color: Rgb) {
        self.state.text_color = color;
    }

    /// Sets the colour used for lines and cell borders.
    pub fn set_draw_color(&mut self, color: Rgb) {
        self.state.draw_color = color;
    }

    /// Sets the colour used for filled cells.
    pub fn set_fill_color(&mut self, color: Rgb) {
        self.state.fill_color = color;
    }

    /// Sets the stroke width for lines and borders.
    pub fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
    }

    /// Registers a placeholder that is replaced by the total page count in drawn text.
    ///
    /// The count is exact for text drawn by [`PageDecorator::footer`], which
    /// runs after the last page has been created.
    pub fn register_page_number_alias(&mut self, alias: impl Into<String>) {
        self.page_number_alias = Some(alias.into());
    }

    /// Enables or disables automatic page breaks and sets the bottom margin that triggers them.
    pub fn set_auto_page_break(&mut self, enabled: bool, margin: f64) {
        self.auto_page_break = enabled;
        self.geometry.margins.bottom = margin;
    }

    /// Returns the `y` beyond which a cell no longer fits, if automatic breaks are active.
    pub fn page_break_trigger(&self) -> Option<f64> {
        (self.auto_page_break && !self.decorating).then(|| self.geometry.content_bottom())
    }

    /// Horizontal cursor position.
    pub fn cursor_x(&self) -> f64 {
        self.x
    }

    /// Vertical cursor position.
    pub fn cursor_y(&self) -> f64 {
        self.y
    }

    /// Moves the cursor horizontally.
    pub fn set_cursor_x(&mut self, x: f64) {
        self.x = x;
    }

    /// Moves the cursor to `y` and back to the left margin.
    pub fn set_cursor_y(&mut self, y: f64) {
        self.x = self.geometry.margins.left;
        self.y = y;
    }

    /// Line feed: moves to the left margin, `height` further down.
    pub fn move_cursor_down(&mut self, height: f64) {
        self.x = self.geometry.margins.left;
        self.y += height;
    }

    /// Width of `text` in the current font.
    pub fn text_width(&self, text: &str) -> f64 {
        self.surface.text_width(self.state.font, text)
    }

    /// Draws a single-line cell at the cursor.
    ///
    /// A width of `0` extends the cell to the right margin. If the cell would
    /// cross the page-break trigger a new page is opened first, keeping the
    /// horizontal cursor position.
    pub fn draw_cell(&mut self, width: f64, height: f64, text: &str, cell: Cell) -> Result<()> {
        if let Some(trigger) = self.page_break_trigger() {
            if self.y + height > trigger {
                let x = self.x;
                self.new_page()?;
                self.x = x;
            }
        }

        let width = if width == 0.0 {
            self.geometry.width - self.geometry.margins.right - self.x
        } else {
            width
        };
        let rect = Rect {
            x: self.x,
            y: self.y,
            width,
            height,
        };

        if cell.fill {
            self.surface
                .fill_rect(self.page, rect, self.state.fill_color)?;
        }
        if cell.border {
            self.stroke_rect(rect)?;
        }
        if !text.is_empty() {
            self.place_text(rect, text, cell.align)?;
        }

        match cell.flow {
            Flow::Right => self.x += width,
            Flow::NextLine => {
                self.x = self.geometry.margins.left;
                self.y += height;
            }
        }
        Ok(())
    }

    /// Draws `text` word-wrapped to `width`, one cell of `height` per line.
    ///
    /// Every line starts at the current horizontal position and may trigger an
    /// automatic page break. Afterwards the cursor sits at the left margin
    /// below the last line.
    pub fn draw_multiline(&mut self, width: f64, height: f64, text: &str) -> Result<()> {
        let start_x = self.x;
        let width = if width == 0.0 {
            self.geometry.width - self.geometry.margins.right - start_x
        } else {
            width
        };

        let text = sanitize(text);
        let lines = self.wrap(&text, width - 2.0 * CELL_MARGIN);
        for line in &lines {
            self.x = start_x;
            self.draw_cell(width, height, line, Cell::new().next_line())?;
        }
        self.x = self.geometry.margins.left;
        Ok(())
    }

    /// Draws a line between two absolute points with the draw colour.
    pub fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<()> {
        self.surface.draw_line(
            self.page,
            Point::new(x1, y1),
            Point::new(x2, y2),
            self.state.line_width,
            self.state.draw_color,
        )
    }

    /// Runs the footer hook on every page and completes the output.
    pub fn finish(mut self) -> Result<S::Output> {
        if let Some(mut decorator) = self.decorator.take() {
            self.decorating = true;
            for page_no in 1..=self.page_count {
                self.select_page(page_no);
                let saved = self.state;
                decorator.footer(&mut self)?;
                self.state = saved;
            }
            self.decorating = false;
        }
        self.surface.finish()
    }

    fn stroke_rect(&mut self, rect: Rect) -> Result<()> {
        let Rect {
            x,
            y,
            width,
            height,
        } = rect;
        let corners = [
            Point::new(x, y),
            Point::new(x + width, y),
            Point::new(x + width, y + height),
            Point::new(x, y + height),
        ];
        for index in 0..corners.len() {
            let from = corners[index];
            let to = corners[(index + 1) % corners.len()];
            self.surface.draw_line(
                self.page,
                from,
                to,
                self.state.line_width,
                self.state.draw_color,
            )?;
        }
        Ok(())
    }

    fn place_text(&mut self, rect: Rect, text: &str, align: Align) -> Result<()> {
        let text = match &self.page_number_alias {
            Some(alias) if text.contains(alias.as_str()) => {
                text.replace(alias.as_str(), &self.page_count.to_string())
            }
            _ => text.to_owned(),
        };
        let text = sanitize(&text);
        let text_width = self.text_width(&text);
        let offset = match align {
            Align::Left => CELL_MARGIN,
            Align::Center => (rect.width - text_width) / 2.0,
            Align::Right => rect.width - CELL_MARGIN - text_width,
        };

        self.surface.draw_text(TextRun {
            page: self.page,
            x: rect.x + offset,
            y: rect.y,
            height: rect.height,
            font: self.state.font,
            color: self.state.text_color,
            text: &text,
        })
    }

    /// Greedy word wrap. Explicit newlines start a new line; words wider than
    /// `max_width` are broken between characters.
    fn wrap(&self, text: &str, max_width: f64) -> Vec<String> {
        let mut lines = Vec::new();

        for paragraph in text.split('\n') {
            let mut current = String::new();
            for word in paragraph.split_whitespace() {
                let candidate = if current.is_empty() {
                    word.to_owned()
                } else {
                    format!("{current} {word}")
                };
                if self.text_width(&candidate) <= max_width {
                    current = candidate;
                    continue;
                }

                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                if self.text_width(word) <= max_width {
                    current = word.to_owned();
                } else {
                    for piece in self.break_word(word, max_width) {
                        if !current.is_empty() {
                            lines.push(std::mem::take(&mut current));
                        }
                        current = piece;
                    }
                }
            }
            lines.push(current);
        }

        lines
    }

    fn break_word(&self, word: &str, max_width: f64) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut current = String::new();
        for c in word.chars() {
            current.push(c);
            if current.chars().count() > 1 && self.text_width(&current) > max_width {
                current.pop();
                pieces.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
        if !current.is_empty() {
            pieces.push(current);
        }
        pieces
    }

    /// Writes the finished output to `path`.
    pub fn serialize(self, path: impl AsRef<Path>) -> Result<()>
    where
        S: Surface<Output = Vec<u8>>,
    {
        let path = path.as_ref();
        let bytes = self.finish()?;
        std::fs::write(path, bytes).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
