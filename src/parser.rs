//! Line-oriented Markdown parser.
//!
//! The input is split into sections on `## ` lines. Inside a section every
//! line is classified once by [`classify_line`] and fed to a small state
//! machine that accumulates fenced code and pipe tables. Nothing here can
//! fail: unterminated fences, ragged tables and stray markers all degrade to
//! best-effort blocks.

use log::debug;

use crate::inline::strip_inline;
use crate::model::{Block, Document, Section, TableBlock};
use crate::sanitize::sanitize;

const SECTION_MARKER: &str = "## ";
const FENCE: &str = "```";
const SUBSECTION_LEVEL: u8 = 3;

/// Classification of a single (non-fenced) source line.
///
/// The variants are listed in precedence order: when a line could match
/// several rules the first one wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Line<'a> {
    /// Opening or closing code fence.
    Fence,
    /// A pipe-table row with its trimmed cells.
    TableRow(Vec<&'a str>),
    /// A `|---|---|` alignment row.
    TableSeparator,
    /// `###` heading; deeper prefixes such as `####` fold into the same level.
    Heading(&'a str),
    /// Line wrapped in `**`; the text has the asterisks removed.
    BoldLine(&'a str),
    /// `- ` bullet with the marker removed.
    Bullet(&'a str),
    /// `> ` quote with the marker and wrapping asterisks removed.
    Quote(&'a str),
    /// A `---` horizontal rule.
    Rule,
    /// Any other line starting with `#`.
    Ignored,
    /// Whitespace only.
    Blank,
    /// Plain paragraph text.
    Text(&'a str),
}

/// Classifies a line outside of a code fence.
pub fn classify_line(line: &str) -> Line<'_> {
    let stripped = line.trim();

    if stripped.starts_with(FENCE) {
        return Line::Fence;
    }

    if stripped.starts_with('|') {
        if is_separator_row(stripped) {
            return Line::TableSeparator;
        }
        return Line::TableRow(split_cells(stripped));
    }

    if stripped.starts_with("###") {
        return match heading(stripped) {
            Some(text) => Line::Heading(text),
            None => Line::Ignored,
        };
    }

    if stripped.len() >= 2 && stripped.starts_with("**") && stripped.ends_with("**") {
        return Line::BoldLine(stripped.trim_matches('*').trim());
    }

    if let Some(rest) = stripped.strip_prefix("- ") {
        return Line::Bullet(rest);
    }

    if let Some(rest) = stripped.strip_prefix("> ") {
        return Line::Quote(rest.trim_matches('*').trim());
    }

    if stripped == "---" {
        return Line::Rule;
    }

    if stripped.is_empty() {
        Line::Blank
    } else if stripped.starts_with('#') {
        Line::Ignored
    } else {
        Line::Text(stripped)
    }
}

fn heading(stripped: &str) -> Option<&str> {
    let text = stripped.trim_start_matches('#');
    if !text.starts_with(char::is_whitespace) {
        return None;
    }
    let text = text.trim();
    (!text.is_empty()).then_some(text)
}

/// A row made only of pipes, dashes, colons and spaces, containing at least one dash.
fn is_separator_row(stripped: &str) -> bool {
    stripped.contains('-')
        && stripped
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':' | ' ' | '\t'))
}

fn split_cells(stripped: &str) -> Vec<&str> {
    let inner = stripped.strip_prefix('|').unwrap_or(stripped);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    if inner.trim().is_empty() {
        return Vec::new();
    }
    inner.split('|').map(str::trim).collect()
}

fn section_title(line: &str) -> Option<String> {
    line.strip_prefix(SECTION_MARKER)
        .map(|rest| sanitize(rest.trim().trim_start_matches('#').trim()))
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Normal,
    InCodeFence(Vec<String>),
    InTable(TableBlock),
}

/// Accumulates the blocks of one section.
struct SectionParser {
    section: Section,
    state: State,
}

impl SectionParser {
    fn new(title: String) -> Self {
        Self {
            section: Section::new(title),
            state: State::Normal,
        }
    }

    fn feed(&mut self, raw: &str) {
        if let State::InCodeFence(lines) = &mut self.state {
            if raw.trim().starts_with(FENCE) {
                self.flush();
            } else {
                lines.push(sanitize(raw.trim_end()));
            }
            return;
        }

        let line = classify_line(raw);

        if matches!(self.state, State::InTable(_))
            && !matches!(line, Line::TableRow(_) | Line::TableSeparator)
        {
            self.flush();
        }

        match line {
            Line::Fence => self.state = State::InCodeFence(Vec::new()),
            Line::TableRow(cells) => {
                let row: Vec<String> = cells.into_iter().map(sanitize).collect();
                match &mut self.state {
                    State::InTable(table) => table.push_row(row),
                    _ => self.state = State::InTable(TableBlock::new(row)),
                }
            }
            Line::TableSeparator | Line::Rule | Line::Ignored | Line::Blank => {}
            Line::Heading(text) => self.push(Block::heading(SUBSECTION_LEVEL, sanitize(text))),
            Line::BoldLine(text) => {
                if !text.is_empty() {
                    self.push(Block::BoldLine(sanitize(text)));
                }
            }
            Line::Bullet(text) => self.push(Block::BulletItem(inline_text(text))),
            Line::Quote(text) => self.push(Block::Quote(inline_text(text))),
            Line::Text(text) => self.push(Block::Paragraph(inline_text(text))),
        }
    }

    fn push(&mut self, block: Block) {
        self.section.push_block(block);
    }

    /// Emits the construct that is currently open, if any.
    fn flush(&mut self) {
        match std::mem::take(&mut self.state) {
            State::Normal => {}
            State::InCodeFence(lines) => self.push(Block::CodeBlock { lines }),
            State::InTable(table) => self.push(Block::Table(table)),
        }
    }

    fn finish(mut self) -> Section {
        if matches!(self.state, State::InCodeFence(_)) {
            debug!(
                "closing unterminated code fence at end of section '{}'",
                self.section.title()
            );
        }
        self.flush();
        self.section
    }
}

fn inline_text(text: &str) -> String {
    sanitize(&strip_inline(text))
}

/// Parses Markdown text into a [`Document`].
///
/// Everything before the first `## ` line is treated as preamble and dropped.
pub fn parse(text: &str) -> Document {
    let mut sections = Vec::new();
    let mut current: Option<SectionParser> = None;

    for line in text.lines() {
        if let Some(title) = section_title(line) {
            if let Some(parser) = current.take() {
                sections.push(parser.finish());
            }
            current = Some(SectionParser::new(title));
            continue;
        }

        if let Some(parser) = current.as_mut() {
            parser.feed(line);
        }
    }

    if let Some(parser) = current {
        sections.push(parser.finish());
    }

    for section in &sections {
        debug!(
            "parsed section '{}' with {} blocks",
            section.title(),
            section.blocks().len()
        );
    }

    Document::new(sections)
}
