//! Data structures describing the logical content of a converted document.
//!
//! The parser produces these values and the layout engine consumes them. They
//! never reference the drawing backend, so a parsed [`Document`] can be
//! inspected or tested without any fonts installed.

/// Title that marks a hand-written table of contents in the Markdown source.
pub const TABLE_OF_CONTENTS_TITLE: &str = "table of contents";

/// Individual content blocks that make up a section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    /// Subsection heading (`###` and deeper).
    Heading {
        /// Outline level; the parser emits 3 for every subsection.
        level: u8,
        /// Heading text.
        text: String,
    },
    /// Plain body text.
    Paragraph(String),
    /// A line wrapped entirely in `**`.
    BoldLine(String),
    /// A `- ` bullet point.
    BulletItem(String),
    /// A `> ` quotation.
    Quote(String),
    /// Fenced code, one entry per source line.
    CodeBlock {
        /// Lines between the fences with trailing whitespace removed.
        lines: Vec<String>,
    },
    /// A pipe table.
    Table(TableBlock),
}

impl Block {
    /// Convenience helper for building a heading block.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::Heading {
            level,
            text: text.into(),
        }
    }

    /// Convenience helper for building a paragraph block.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph(text.into())
    }

    /// Convenience helper for building a code block.
    pub fn code<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::CodeBlock {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

/// Rows of a pipe table. The first row is the header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableBlock {
    rows: Vec<Vec<String>>,
}

impl TableBlock {
    /// Creates a table whose header row is `header`.
    pub fn new(header: Vec<String>) -> Self {
        Self { rows: vec![header] }
    }

    /// Appends a data row.
    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Appends a data row and returns the updated table.
    pub fn with_row(mut self, row: Vec<String>) -> Self {
        self.push_row(row);
        self
    }

    /// Returns all rows, header first.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Returns the header row.
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Returns the rows following the header.
    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or_default()
    }
}

/// Logical representation of a document section (one `## ` heading).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Section {
    title: String,
    blocks: Vec<Block>,
}

impl Section {
    /// Creates a new section with the provided title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    /// Returns the title of the section.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the blocks contained in the section.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Appends a block and returns the updated section.
    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// Extends the section with additional blocks and returns the updated instance.
    pub fn with_blocks<I>(mut self, blocks: I) -> Self
    where
        I: IntoIterator<Item = Block>,
    {
        self.blocks.extend(blocks);
        self
    }

    pub(crate) fn push_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Returns whether this section is a hand-written table of contents.
    ///
    /// Such sections are replaced by the generated contents page and never
    /// rendered as body content.
    pub fn is_table_of_contents(&self) -> bool {
        self.title.trim().eq_ignore_ascii_case(TABLE_OF_CONTENTS_TITLE)
    }
}

/// A parsed Markdown document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    sections: Vec<Section>,
}

impl Document {
    /// Creates a document from already built sections.
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// Returns every parsed section, including a hand-written contents section.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Returns the sections that make up the body of the rendered document.
    pub fn body_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections
            .iter()
            .filter(|section| !section.is_table_of_contents())
    }

    /// Builds the generated table of contents.
    pub fn toc_entries(&self) -> Vec<TocEntry> {
        self.body_sections()
            .enumerate()
            .map(|(index, section)| TocEntry::new(index + 1, section.title()))
            .collect()
    }
}

/// One line of the generated table of contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    number: usize,
    title: String,
}

impl TocEntry {
    /// Creates an entry with a 1-based sequence number.
    pub fn new(number: usize, title: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
        }
    }

    /// Returns the 1-based position of the section.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Returns the section title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Text printed on the contents page.
    pub fn label(&self) -> String {
        format!("{}. {}", self.number, self.title)
    }
}

/// Metadata printed on the cover page and in the running header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentMeta {
    title: String,
    subtitle: String,
    author: String,
    version: String,
    year: String,
}

impl Default for DocumentMeta {
    fn default() -> Self {
        Self {
            title: "Document".to_owned(),
            subtitle: String::new(),
            author: "Author".to_owned(),
            version: "1.0".to_owned(),
            year: String::new(),
        }
    }
}

impl DocumentMeta {
    /// Creates metadata with the given title and defaults elsewhere.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Returns the document title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the subtitle; empty when none was given.
    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    /// Returns the author.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Returns the version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the year shown on the cover; empty unless set with [`DocumentMeta::with_year`].
    pub fn year(&self) -> &str {
        &self.year
    }

    /// Sets the subtitle and returns the updated metadata.
    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    /// Sets the author and returns the updated metadata.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Sets the version and returns the updated metadata.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the year and returns the updated metadata.
    ///
    /// The library never reads the clock. Without a year the cover prints
    /// only the version, with no trailing separator.
    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = year.into();
        self
    }
}

/// An entry of the trailing "Additional Resources" page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource {
    name: String,
    description: String,
}

impl Resource {
    /// Creates a resource entry.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Returns the resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the resource description.
    pub fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::{Block, Document, Section, TableBlock};

    #[test]
    fn contents_section_is_recognised_case_insensitively() {
        assert!(Section::new("Table of Contents").is_table_of_contents());
        assert!(Section::new("  TABLE OF CONTENTS ").is_table_of_contents());
        assert!(!Section::new("Contents of the table").is_table_of_contents());
    }

    #[test]
    fn toc_entries_skip_contents_section_and_number_from_one() {
        let document = Document::new(vec![
            Section::new("Table of Contents"),
            Section::new("Intro"),
            Section::new("Usage").with_block(Block::paragraph("text")),
        ]);

        let labels: Vec<_> = document.toc_entries().iter().map(|e| e.label()).collect();
        assert_eq!(labels, vec!["1. Intro", "2. Usage"]);
    }

    #[test]
    fn table_splits_header_from_data_rows() {
        let table = TableBlock::new(vec!["a".into(), "b".into()])
            .with_row(vec!["1".into(), "2".into()]);
        assert_eq!(table.header(), Some(&["a".to_owned(), "b".to_owned()][..]));
        assert_eq!(table.data_rows().len(), 1);
    }
}
