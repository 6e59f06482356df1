use lopdf::content::{Content, Operation};
use mdpdf::fonts;
use mdpdf::model::DocumentMeta;
use mdpdf::PdfBuilder;

const SAMPLE: &str = "\
# Ignored preamble

## Getting Started
Install the **package** with `apt` and read the [manual](https://example.com).

### Requirements
- A terminal \u{2192} any shell
- Network access

> *Note: commands need sudo*

```bash
sudo apt update
sudo apt install tree
```

| Command | Purpose |
|---------|---------|
| ls | list files |
| cd | change directory |

## Reference
**All commands**
Plain text \u{2014} with typographic \u{201c}quotes\u{201d}.
";

fn render_sample_pdf() -> Option<Vec<u8>> {
    if !fonts::default_fonts_available() {
        return None;
    }

    let bytes = PdfBuilder::new()
        .with_meta(DocumentMeta::new("Sample Guide").with_year("2024"))
        .with_markdown(SAMPLE)
        .render()
        .expect("render sample pdf")
        .bytes;

    Some(bytes)
}

fn page_operations(bytes: &[u8], page_number: u32) -> Vec<Operation> {
    let document = lopdf::Document::load_mem(bytes).expect("reload pdf");
    let page_id = document.get_pages()[&page_number];
    let content = document.get_page_content(page_id).expect("page content");
    Content::decode(&content).expect("decode content").operations
}

#[test]
fn renders_non_empty_output() {
    let Some(bytes) = render_sample_pdf() else {
        eprintln!(
            "Skipping renders_non_empty_output: fonts missing. Set MDPDF_FONTS_DIR or copy assets/fonts next to the binary."
        );
        return;
    };
    assert!(bytes.starts_with(b"%PDF-"), "output should carry a PDF header");
}

#[test]
fn rendering_is_deterministic() {
    let Some(bytes_a) = render_sample_pdf() else {
        eprintln!(
            "Skipping rendering_is_deterministic: fonts missing. Set MDPDF_FONTS_DIR or copy assets/fonts next to the binary."
        );
        return;
    };
    let Some(bytes_b) = render_sample_pdf() else {
        eprintln!(
            "Skipping rendering_is_deterministic: fonts missing. Set MDPDF_FONTS_DIR or copy assets/fonts next to the binary."
        );
        return;
    };

    assert!(bytes_a == bytes_b, "PDF renders must be byte-identical");
}

#[test]
fn code_lines_are_painted_on_a_filled_strip() {
    let Some(bytes) = render_sample_pdf() else {
        eprintln!("Skipping code_lines_are_painted_on_a_filled_strip: fonts missing.");
        return;
    };

    // Page 3 holds "Getting Started" and its two-line code block.
    let operations = page_operations(&bytes, 3);
    let grey = 240.0 / 255.0;
    let mut fill_color = Vec::new();
    let mut grey_fills = 0;
    for operation in &operations {
        match operation.operator.as_str() {
            "rg" => {
                fill_color = operation
                    .operands
                    .iter()
                    .map(|operand| operand.as_float().expect("numeric colour"))
                    .collect();
            }
            "f" => {
                let is_grey = fill_color.len() == 3
                    && fill_color.iter().all(|c| (f64::from(*c) - grey).abs() < 1e-3);
                if is_grey {
                    grey_fills += 1;
                }
            }
            _ => {}
        }
    }
    assert_eq!(grey_fills, 2, "one grey strip per code line");

    let widths: Vec<f32> = operations
        .iter()
        .filter(|operation| operation.operator == "w")
        .map(|operation| operation.operands[0].as_float().expect("line width"))
        .collect();
    assert!(
        widths.iter().any(|w| (f64::from(*w) - 0.5 * 72.0 / 25.4).abs() < 1e-2),
        "the section rule is stroked 0.5 mm wide: {widths:?}"
    );
}

#[test]
fn convert_file_writes_the_pdf() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping convert_file_writes_the_pdf: fonts missing.");
        return;
    }

    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("guide.md");
    let output = dir.path().join("guide.pdf");
    std::fs::write(&input, SAMPLE).expect("write markdown");

    let rendered = PdfBuilder::new()
        .convert_file(&input, &output)
        .expect("convert file");

    let written = std::fs::read(&output).expect("read pdf");
    assert_eq!(written, rendered.bytes);
    assert_eq!(rendered.section_pages, vec![Some(3), Some(4)]);
}

#[cfg(feature = "bookmarks")]
#[test]
fn bookmarks_survive_a_real_render() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping bookmarks_survive_a_real_render: fonts missing.");
        return;
    }

    let rendered = PdfBuilder::new()
        .with_markdown(SAMPLE)
        .with_bookmarks(true)
        .render()
        .expect("render with bookmarks");
    assert_eq!(rendered.subsections[0].len(), 1);
    assert_eq!(rendered.subsections[0][0].title, "Requirements");

    let document = lopdf::Document::load_mem(&rendered.bytes).expect("reload pdf");
    assert_eq!(document.get_pages().len(), 4);
    let root = document
        .trailer
        .get(b"Root")
        .and_then(lopdf::Object::as_reference)
        .expect("catalog reference");
    let outlines = document
        .get_dictionary(root)
        .and_then(|catalog| catalog.get(b"Outlines"))
        .and_then(lopdf::Object::as_reference)
        .and_then(|id| document.get_dictionary(id))
        .expect("outline root");
    // Two sections plus the "Requirements" subsection.
    assert_eq!(outlines.get(b"Count").and_then(lopdf::Object::as_i64).ok(), Some(3));
}
