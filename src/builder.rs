//! Document assembly: cover, contents page, body sections and resources.

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::canvas::{
    Align, Canvas, Cell, FontFamily, FontStyle, PageDecorator, PageGeometry, PdfSurface, Surface,
};
use crate::error::{Error, Result};
use crate::layout::{Layout, Pagination, SubsectionMark};
use crate::model::{Document, DocumentMeta, Resource, Section};
use crate::parser;
use crate::theme::Theme;

/// Placeholder replaced by the total page count in footers.
pub const PAGE_COUNT_ALIAS: &str = "{nb}";

const COVER_TOP_GAP: f64 = 60.0;
const COVER_TITLE_WORDS_PER_LINE: usize = 3;
const CONTENTS_TITLE: &str = "Table of Contents";
const RESOURCES_TITLE: &str = "Additional Resources";
const CONTENTS_INDENT: f64 = 10.0;
const CONTENTS_ROW_HEIGHT: f64 = 8.0;
const FOOTER_OFFSET: f64 = 15.0;

/// How the generated contents page lists sections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TocStyle {
    /// Numbered section titles only.
    #[default]
    TitlesOnly,
    /// Numbered titles with the first page of each section right-aligned.
    WithPageNumbers,
}

/// Output of a render on an arbitrary [`Surface`].
#[derive(Debug)]
pub struct Rendered<T> {
    /// Whatever the surface produced.
    pub output: T,
    /// 1-based start page of each entry of [`Document::sections`]; `None` for
    /// sections that are not rendered.
    pub section_pages: Vec<Option<usize>>,
    /// Subsection headings of each entry of [`Document::sections`], with the
    /// page each one landed on.
    pub subsections: Vec<Vec<SubsectionMark>>,
}

/// A rendered PDF document.
#[derive(Debug)]
pub struct RenderedPdf {
    /// Serialized PDF bytes.
    pub bytes: Vec<u8>,
    /// 1-based start page of each parsed section; `None` for a hand-written
    /// contents section.
    pub section_pages: Vec<Option<usize>>,
    /// Subsection headings of each parsed section and their pages.
    pub subsections: Vec<Vec<SubsectionMark>>,
}

/// Builder that turns parsed Markdown into a styled, paginated PDF.
#[derive(Clone, Debug, Default)]
pub struct PdfBuilder {
    meta: DocumentMeta,
    sections: Vec<Section>,
    resources: Vec<Resource>,
    theme: Theme,
    pagination: Pagination,
    geometry: PageGeometry,
    toc_style: TocStyle,
    #[cfg(feature = "bookmarks")]
    bookmarks: bool,
}

impl PdfBuilder {
    /// Creates a builder with default metadata and no sections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cover and header metadata.
    pub fn with_meta(mut self, meta: DocumentMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Parses `markdown` and appends its sections.
    pub fn with_markdown(self, markdown: &str) -> Self {
        self.with_document(parser::parse(markdown))
    }

    /// Appends the sections of an already parsed document.
    pub fn with_document(mut self, document: Document) -> Self {
        self.sections.extend(document.sections().iter().cloned());
        self
    }

    /// Appends a single section.
    pub fn add_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Appends entries to the trailing "Additional Resources" page.
    pub fn with_resources<I>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = Resource>,
    {
        self.resources.extend(resources);
        self
    }

    /// Replaces the colour palette.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Replaces the table and code break reserves.
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Replaces the page size and margins.
    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Selects how the contents page lists sections.
    pub fn with_toc_style(mut self, toc_style: TocStyle) -> Self {
        self.toc_style = toc_style;
        self
    }

    /// Embeds a PDF outline with one bookmark per section and nested
    /// bookmarks for its subsections.
    #[cfg(feature = "bookmarks")]
    pub fn with_bookmarks(mut self, enabled: bool) -> Self {
        self.bookmarks = enabled;
        self
    }

    /// Returns the document assembled from every added section.
    pub fn document(&self) -> Document {
        Document::new(self.sections.clone())
    }

    /// Renders the document to PDF bytes.
    pub fn render(&self) -> Result<RenderedPdf> {
        let surface = PdfSurface::new(
            self.meta.title(),
            self.geometry.width,
            self.geometry.height,
        )?;
        let Rendered {
            output,
            section_pages,
            subsections,
        } = self.render_on(surface)?;

        #[cfg(feature = "bookmarks")]
        let output = if self.bookmarks {
            crate::bookmarks::apply_section_bookmarks(
                &output,
                &self.sections,
                &section_pages,
                &subsections,
            )?
        } else {
            output
        };

        Ok(RenderedPdf {
            bytes: output,
            section_pages,
            subsections,
        })
    }

    /// Reads Markdown from `input`, renders it and writes the PDF to `output`.
    pub fn convert_file(
        self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<RenderedPdf> {
        let input = input.as_ref();
        let output = output.as_ref();

        let markdown = fs::read_to_string(input).map_err(|source| Error::Read {
            path: input.to_path_buf(),
            source,
        })?;
        let rendered = self.with_markdown(&markdown).render()?;

        fs::write(output, &rendered.bytes).map_err(|source| Error::Write {
            path: output.to_path_buf(),
            source,
        })?;
        info!("wrote {} bytes to {}", rendered.bytes.len(), output.display());
        Ok(rendered)
    }

    /// Lays the document out on `surface`.
    pub fn render_on<S: Surface>(&self, surface: S) -> Result<Rendered<S::Output>> {
        let document = self.document();
        let layout = Layout::new(self.theme, self.pagination);

        let mut canvas = Canvas::new(surface, self.geometry);
        canvas.set_decorator(ConfiguredPageDecorator::new(self.meta.title(), self.theme));
        canvas.register_page_number_alias(PAGE_COUNT_ALIAS);
        canvas.set_auto_page_break(true, self.geometry.margins.bottom);

        self.cover(&mut canvas)?;

        let entries = document.toc_entries();
        info!("rendering {} sections", entries.len());
        let contents_rows = self.contents(&mut canvas, &document)?;

        let mut section_pages = Vec::with_capacity(document.sections().len());
        let mut subsections = Vec::with_capacity(document.sections().len());
        for section in document.sections() {
            if section.is_table_of_contents() {
                debug!("skipping hand-written contents section '{}'", section.title());
                section_pages.push(None);
                subsections.push(Vec::new());
                continue;
            }
            let placement = layout.render_section(&mut canvas, section)?;
            section_pages.push(Some(placement.start_page));
            subsections.push(placement.subsections);
        }

        if !self.resources.is_empty() {
            self.resources_page(&mut canvas, &layout)?;
        }

        if self.toc_style == TocStyle::WithPageNumbers {
            let body_pages = section_pages.iter().flatten().copied();
            self.number_contents(&mut canvas, &contents_rows, body_pages)?;
        }

        info!("laid out {} pages", canvas.page_count());
        let output = canvas.finish()?;
        Ok(Rendered {
            output,
            section_pages,
            subsections,
        })
    }

    fn cover<S: Surface>(&self, canvas: &mut Canvas<S>) -> Result<()> {
        let theme = &self.theme;
        let centered = Cell::new().align(Align::Center).next_line();

        canvas.new_page()?;
        canvas.move_cursor_down(COVER_TOP_GAP);

        canvas.set_font(FontFamily::Sans, FontStyle::BOLD, 32);
        canvas.set_text_color(theme.accent);
        let words: Vec<&str> = self.meta.title().split_whitespace().collect();
        for line in words.chunks(COVER_TITLE_WORDS_PER_LINE) {
            canvas.draw_cell(0.0, 15.0, &line.join(" "), centered)?;
        }

        canvas.move_cursor_down(10.0);
        let y = canvas.cursor_y();
        let center = self.geometry.width / 2.0;
        canvas.set_draw_color(theme.accent);
        canvas.set_line_width(1.0);
        canvas.draw_line(center - 45.0, y, center + 45.0, y)?;
        canvas.move_cursor_down(10.0);

        canvas.set_font(FontFamily::Sans, FontStyle::REGULAR, 14);
        canvas.set_text_color(theme.muted);
        canvas.draw_cell(0.0, 10.0, self.meta.subtitle(), centered)?;
        canvas.move_cursor_down(20.0);

        canvas.set_font(FontFamily::Sans, FontStyle::REGULAR, 11);
        let author = format!("Author: {}", self.meta.author());
        canvas.draw_cell(0.0, 8.0, &author, centered)?;
        let version = match self.meta.year() {
            "" => format!("Version: {}", self.meta.version()),
            year => format!("Version: {}  |  {}", self.meta.version(), year),
        };
        canvas.draw_cell(0.0, 8.0, &version, centered)?;
        Ok(())
    }

    /// Draws the contents page and returns where each row was placed.
    fn contents<S: Surface>(
        &self,
        canvas: &mut Canvas<S>,
        document: &Document,
    ) -> Result<Vec<ContentsRow>> {
        canvas.new_page()?;
        canvas.set_font(FontFamily::Sans, FontStyle::BOLD, 22);
        canvas.set_text_color(self.theme.accent);
        canvas.draw_cell(0.0, 12.0, CONTENTS_TITLE, Cell::new().next_line())?;
        canvas.move_cursor_down(5.0);

        canvas.set_font(FontFamily::Sans, FontStyle::REGULAR, 12);
        canvas.set_text_color(self.theme.body);
        let mut rows = Vec::new();
        for entry in document.toc_entries() {
            canvas.draw_cell(CONTENTS_INDENT, CONTENTS_ROW_HEIGHT, "", Cell::new())?;
            rows.push(ContentsRow {
                page_no: canvas.page_no(),
                y: canvas.cursor_y(),
            });
            canvas.draw_cell(0.0, CONTENTS_ROW_HEIGHT, &entry.label(), Cell::new().next_line())?;
        }
        Ok(rows)
    }

    fn number_contents<S: Surface>(
        &self,
        canvas: &mut Canvas<S>,
        rows: &[ContentsRow],
        pages: impl Iterator<Item = usize>,
    ) -> Result<()> {
        canvas.set_font(FontFamily::Sans, FontStyle::REGULAR, 12);
        canvas.set_text_color(self.theme.body);
        let right = Cell::new().align(Align::Right);

        for (row, page) in rows.iter().zip(pages) {
            if !canvas.select_page(row.page_no) {
                continue;
            }
            canvas.set_cursor_y(row.y);
            canvas.draw_cell(0.0, CONTENTS_ROW_HEIGHT, &page.to_string(), right)?;
        }
        debug!("numbered {} contents rows", rows.len());
        Ok(())
    }

    fn resources_page<S: Surface>(&self, canvas: &mut Canvas<S>, layout: &Layout) -> Result<()> {
        layout.section_title(canvas, RESOURCES_TITLE)?;
        for resource in &self.resources {
            canvas.set_font(FontFamily::Sans, FontStyle::BOLD, 11);
            canvas.set_text_color(self.theme.accent);
            canvas.draw_cell(0.0, 8.0, resource.name(), Cell::new().next_line())?;

            canvas.set_font(FontFamily::Sans, FontStyle::REGULAR, 10);
            canvas.set_text_color(self.theme.muted);
            canvas.draw_cell(0.0, 6.0, resource.description(), Cell::new().next_line())?;
            canvas.move_cursor_down(3.0);
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
struct ContentsRow {
    page_no: usize,
    y: f64,
}

/// Running header (every page after the cover) and page-number footer.
pub struct ConfiguredPageDecorator {
    title: String,
    theme: Theme,
}

impl ConfiguredPageDecorator {
    /// Creates a decorator that repeats `title` at the top of each page.
    pub fn new(title: impl Into<String>, theme: Theme) -> Self {
        Self {
            title: title.into(),
            theme,
        }
    }
}

impl<S: Surface> PageDecorator<S> for ConfiguredPageDecorator {
    fn header(&mut self, canvas: &mut Canvas<S>) -> Result<()> {
        if canvas.page_no() <= 1 {
            return Ok(());
        }

        canvas.set_font(FontFamily::Sans, FontStyle::ITALIC, 8);
        canvas.set_text_color(self.theme.faint);
        canvas.draw_cell(0.0, 10.0, &self.title, Cell::new().align(Align::Center))?;
        canvas.move_cursor_down(5.0);

        let geometry = *canvas.geometry();
        let y = canvas.cursor_y();
        canvas.set_draw_color(self.theme.rule);
        canvas.set_line_width(0.2);
        canvas.draw_line(
            geometry.margins.left,
            y,
            geometry.width - geometry.margins.right,
            y,
        )?;
        canvas.move_cursor_down(5.0);
        Ok(())
    }

    fn footer(&mut self, canvas: &mut Canvas<S>) -> Result<()> {
        let y = canvas.geometry().height - FOOTER_OFFSET;
        canvas.set_cursor_y(y);
        canvas.set_font(FontFamily::Sans, FontStyle::ITALIC, 8);
        canvas.set_text_color(self.theme.faint);
        let label = format!("Page {}/{}", canvas.page_no(), PAGE_COUNT_ALIAS);
        canvas.draw_cell(0.0, 10.0, &label, Cell::new().align(Align::Center))
    }
}
