use mdpdf::canvas::recording::{DrawOp, RecordingSurface};
use mdpdf::canvas::{FontFamily, Rgb};
use mdpdf::model::{Block, DocumentMeta};
use mdpdf::{parse, PdfBuilder, TocStyle};

const GUIDE: &str = "\
Preamble that never shows up.

## Table of Contents
- [Files](#files)
- [Network](#network)

## Files
Use `ls` to list **files** in a [directory](https://example.com/ls).

### Options
- `-l` \u{2192} long listing
- `-a` shows hidden files

> **Tip:** combine flags

```
ls -la

```

| Flag | Meaning | Example |
|:-----|:-------:|--------:|
| -l | long | ls -l |
| -h | human | ls -lh | extra |

---
## Network
**Connectivity checks**
Run ping \u{2014} it reports \u{201c}latency\u{201d} \u{4e2d}.
";

fn texts(ops: &[DrawOp]) -> Vec<&str> {
    ops.iter()
        .filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn render(builder: &PdfBuilder) -> (Vec<DrawOp>, Vec<Option<usize>>) {
    let rendered = builder
        .render_on(RecordingSurface::new())
        .expect("recording render never fails");
    (rendered.output, rendered.section_pages)
}

#[test]
fn parsed_guide_has_expected_structure() {
    let document = parse(GUIDE);
    let titles: Vec<_> = document.sections().iter().map(|s| s.title()).collect();
    assert_eq!(titles, vec!["Table of Contents", "Files", "Network"]);

    let files = &document.sections()[1];
    assert_eq!(
        files.blocks()[0],
        Block::paragraph("Use ls to list files in a directory.")
    );
    assert_eq!(files.blocks()[1], Block::heading(3, "Options"));
    assert_eq!(
        files.blocks()[2],
        Block::BulletItem("-l Right long listing".to_owned())
    );
    assert_eq!(files.blocks()[5], Block::code(["ls -la", ""]));
    let Block::Table(table) = &files.blocks()[6] else {
        panic!("expected a table, got {:?}", files.blocks()[6]);
    };
    assert_eq!(table.rows().len(), 3);
    assert_eq!(table.data_rows()[1].len(), 4);
    assert_eq!(files.blocks().len(), 7);

    let entries: Vec<_> = document.toc_entries().iter().map(|e| e.label()).collect();
    assert_eq!(entries, vec!["1. Files", "2. Network"]);
}

#[test]
fn rendering_is_deterministic() {
    let builder = PdfBuilder::new()
        .with_meta(DocumentMeta::new("Linux Command Guide").with_year("2025"))
        .with_markdown(GUIDE)
        .with_toc_style(TocStyle::WithPageNumbers);
    assert_eq!(render(&builder), render(&builder));
}

#[test]
fn guide_renders_all_parts_in_order() {
    let builder = PdfBuilder::new()
        .with_meta(DocumentMeta::new("Linux Command Guide").with_year("2025"))
        .with_markdown(GUIDE);
    let (ops, section_pages) = render(&builder);

    assert_eq!(section_pages, vec![None, Some(3), Some(4)]);
    let page_count = ops
        .iter()
        .filter(|op| matches!(op, DrawOp::Page { .. }))
        .count();
    assert_eq!(page_count, 4);

    let all = texts(&ops);
    let position = |needle: &str| {
        all.iter()
            .position(|text| *text == needle)
            .unwrap_or_else(|| panic!("'{needle}' was not drawn"))
    };
    assert!(position("Linux Command Guide") < position("Table of Contents"));
    assert!(position("Table of Contents") < position("1. Files"));
    assert!(position("1. Files") < position("Files"));
    assert!(position("Files") < position("Network"));
    assert!(all.contains(&"Run ping -- it reports \"latency\" ?."));
    assert!(all.contains(&"  ls -la"));
    assert!(!all.contains(&"extra"), "cells beyond the header are dropped");
    assert!(!all.iter().any(|text| text.contains("Preamble")));
    assert!(all.iter().all(|text| text.chars().all(|c| c as u32 <= 0xff)));
}

#[test]
fn code_lines_use_the_monospaced_face_on_a_grey_fill() {
    let (ops, _) = render(&PdfBuilder::new().with_markdown(GUIDE));
    let code = ops.iter().find_map(|op| match op {
        DrawOp::Text { text, font, .. } if text == "  ls -la" => Some(*font),
        _ => None,
    });
    assert_eq!(code.map(|font| font.family), Some(FontFamily::Mono));

    let grey = Rgb::new(240, 240, 240);
    let fills = ops
        .iter()
        .filter(|op| matches!(op, DrawOp::Fill { color, .. } if *color == grey))
        .count();
    assert_eq!(fills, 2, "one filled strip per code line, blank ones included");
}
