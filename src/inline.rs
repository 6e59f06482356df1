//! Removal of inline Markdown markup.
//!
//! Only three constructs are recognised: inline code, bold emphasis and links.
//! Each is reduced to its inner (display) text. Markers without a matching
//! partner are left untouched.

use std::sync::OnceLock;

use regex::Regex;

struct InlinePatterns {
    code: Regex,
    bold: Regex,
    link: Regex,
}

fn patterns() -> &'static InlinePatterns {
    static PATTERNS: OnceLock<InlinePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| InlinePatterns {
        code: Regex::new(r"`([^`]+)`").expect("inline code pattern is valid"),
        bold: Regex::new(r"\*\*([^*]+)\*\*").expect("bold pattern is valid"),
        link: Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("link pattern is valid"),
    })
}

/// Strips inline code, bold and link markup from `text`.
///
/// ```
/// assert_eq!(
///     mdpdf::strip_inline("Run `make` for a **fast** [build](https://example.com)"),
///     "Run make for a fast build"
/// );
/// ```
pub fn strip_inline(text: &str) -> String {
    let patterns = patterns();
    let text = patterns.code.replace_all(text, "$1");
    let text = patterns.bold.replace_all(&text, "$1");
    patterns.link.replace_all(&text, "$1").into_owned()
}
