//! PDF backend drawing through `printpdf`, with text metrics from `genpdf`.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::BufWriter;

use genpdf::fonts::{Font as MetricFont, FontCache, FontFamily as MetricFamily};
use genpdf::style::{Color, Style};
use log::{debug, warn};
use lopdf::{Object, StringFormat};
use printpdf::{
    BuiltinFont, CustomPdfConformance, IndirectFontRef, Line, Mm, PdfConformance, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Pt,
};

use super::{Font, FontFamily, FontStyle, Point, Rect, Rgb, Surface, TextRun};
use crate::error::{Error, Result};
use crate::fonts::{self, FontSet};

/// Timestamp written to `/CreationDate` and `/ModDate`.
pub const FIXED_TIMESTAMP: &str = "D:20000101000000+00'00'";

fn mm_to_f64(value: genpdf::Mm) -> f64 {
    let mm: Mm = value.into();
    mm.0
}

fn pdf_color(rgb: Rgb) -> printpdf::Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b).into()
}

/// The four built-in faces of one family.
struct Faces {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
    bold_italic: IndirectFontRef,
}

impl Faces {
    fn load(doc: &PdfDocumentReference, faces: [BuiltinFont; 4]) -> Result<Self> {
        let [regular, bold, italic, bold_italic] = faces;
        Ok(Self {
            regular: doc.add_builtin_font(regular)?,
            bold: doc.add_builtin_font(bold)?,
            italic: doc.add_builtin_font(italic)?,
            bold_italic: doc.add_builtin_font(bold_italic)?,
        })
    }

    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match (style.bold, style.italic) {
            (false, false) => &self.regular,
            (true, false) => &self.bold,
            (false, true) => &self.italic,
            (true, true) => &self.bold_italic,
        }
    }
}

struct Page {
    layer: PdfLayerReference,
    height: f64,
}

/// Surface that writes a PDF document using the built-in Helvetica and Courier faces.
///
/// Marks go straight to `printpdf` layers so that strokes can carry a width
/// and rectangles can be filled. Widths are measured against the
/// metric-compatible TrueType families held in a `genpdf` font cache.
pub struct PdfSurface {
    doc: PdfDocumentReference,
    title: String,
    pages: Vec<Page>,
    opened: usize,
    helvetica: Faces,
    courier: Faces,
    font_cache: FontCache,
    sans: MetricFamily<MetricFont>,
    mono: MetricFamily<MetricFont>,
}

impl PdfSurface {
    /// Creates a surface using the fonts located by [`fonts::default_fonts`].
    pub fn new(title: &str, width: f64, height: f64) -> Result<Self> {
        let fonts = fonts::default_fonts().map_err(Error::Fonts)?;
        Self::with_fonts(title, width, height, fonts)
    }

    /// Creates a surface using explicitly loaded metric fonts.
    pub fn with_fonts(title: &str, width: f64, height: f64, fonts: FontSet) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(width), Mm(height), "Layer 1");
        // XMP metadata carries its own random identifiers.
        let doc = doc.with_conformance(PdfConformance::Custom(CustomPdfConformance {
            requires_icc_profile: false,
            requires_xmp_metadata: false,
            ..Default::default()
        }));
        let first = Page {
            layer: doc.get_page(page).get_layer(layer),
            height,
        };

        let helvetica = Faces::load(
            &doc,
            [
                BuiltinFont::Helvetica,
                BuiltinFont::HelveticaBold,
                BuiltinFont::HelveticaOblique,
                BuiltinFont::HelveticaBoldOblique,
            ],
        )?;
        let courier = Faces::load(
            &doc,
            [
                BuiltinFont::Courier,
                BuiltinFont::CourierBold,
                BuiltinFont::CourierOblique,
                BuiltinFont::CourierBoldOblique,
            ],
        )?;

        let mut font_cache = FontCache::new(fonts.sans);
        let sans = font_cache.default_font_family();
        let mono = font_cache.add_font_family(fonts.mono);

        Ok(Self {
            doc,
            title: title.to_owned(),
            pages: vec![first],
            opened: 0,
            helvetica,
            courier,
            font_cache,
            sans,
            mono,
        })
    }

    fn metric_style(&self, font: Font) -> Style {
        let family = match font.family {
            FontFamily::Sans => self.sans,
            FontFamily::Mono => self.mono,
        };
        let mut style = Style::new()
            .with_font_family(family)
            .with_font_size(font.size);
        if font.style.bold {
            style.set_bold();
        }
        if font.style.italic {
            style.set_italic();
        }
        style
    }

    fn face(&self, font: Font) -> &IndirectFontRef {
        match font.family {
            FontFamily::Sans => self.helvetica.get(font.style),
            FontFamily::Mono => self.courier.get(font.style),
        }
    }

    fn page(&self, page: usize) -> Result<&Page> {
        self.pages
            .get(page)
            .ok_or_else(|| Error::MissingPage { page: page + 1 })
    }
}

impl Surface for PdfSurface {
    type Output = Vec<u8>;

    fn begin_page(&mut self, width: f64, height: f64) -> Result<()> {
        // The document is created with its first page already in place.
        if self.opened > 0 {
            let (page, layer) = self.doc.add_page(Mm(width), Mm(height), "Layer 1");
            self.pages.push(Page {
                layer: self.doc.get_page(page).get_layer(layer),
                height,
            });
        }
        self.opened += 1;
        Ok(())
    }

    fn text_width(&self, font: Font, text: &str) -> f64 {
        mm_to_f64(self.metric_style(font).str_width(&self.font_cache, text))
    }

    fn draw_text(&mut self, run: TextRun<'_>) -> Result<()> {
        let style = self.metric_style(run.font);
        let line_height = mm_to_f64(style.line_height(&self.font_cache));
        let glyph_height = mm_to_f64(
            style
                .font(&self.font_cache)
                .glyph_height(style.font_size()),
        );
        let baseline = run.y + (run.height - line_height) / 2.0 + glyph_height;

        let page = self.page(run.page)?;
        if baseline > page.height {
            warn!(
                "text '{}' does not fit on page {} at y={:.1}",
                run.text,
                run.page + 1,
                run.y
            );
        }
        page.layer.set_fill_color(pdf_color(run.color));
        page.layer.use_text(
            run.text,
            f64::from(run.font.size),
            Mm(run.x),
            Mm(page.height - baseline),
            self.face(run.font),
        );
        Ok(())
    }

    fn draw_line(
        &mut self,
        page: usize,
        from: Point,
        to: Point,
        width: f64,
        rgb: Rgb,
    ) -> Result<()> {
        let page = self.page(page)?;
        let thickness: Pt = Mm(width).into();
        page.layer.set_outline_thickness(thickness.0);
        page.layer.set_outline_color(pdf_color(rgb));
        page.layer.add_shape(Line {
            points: vec![
                (printpdf::Point::new(Mm(from.x), Mm(page.height - from.y)), false),
                (printpdf::Point::new(Mm(to.x), Mm(page.height - to.y)), false),
            ],
            is_closed: false,
            has_fill: false,
            has_stroke: true,
            is_clipping_path: false,
        });
        Ok(())
    }

    fn fill_rect(&mut self, page: usize, rect: Rect, rgb: Rgb) -> Result<()> {
        let page = self.page(page)?;
        let top = page.height - rect.y;
        let bottom = top - rect.height;
        let right = rect.x + rect.width;
        page.layer.set_fill_color(pdf_color(rgb));
        page.layer.add_shape(Line {
            points: vec![
                (printpdf::Point::new(Mm(rect.x), Mm(top)), false),
                (printpdf::Point::new(Mm(right), Mm(top)), false),
                (printpdf::Point::new(Mm(right), Mm(bottom)), false),
                (printpdf::Point::new(Mm(rect.x), Mm(bottom)), false),
            ],
            is_closed: true,
            has_fill: true,
            has_stroke: false,
            is_clipping_path: false,
        });
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>> {
        let mut writer = BufWriter::new(Vec::new());
        self.doc.save(&mut writer)?;
        let bytes = writer
            .into_inner()
            .map_err(|err| lopdf::Error::from(err.into_error()))?;
        pin_document_identity(&bytes, &self.title)
    }
}

/// Replaces the wall-clock dates and random `/ID` that `printpdf` stamps on
/// every document, so equal input always serializes to equal bytes.
///
/// The identifier is derived from the title and the page content streams.
pub fn pin_document_identity(pdf_bytes: &[u8], title: &str) -> Result<Vec<u8>> {
    let mut document = lopdf::Document::load_mem(pdf_bytes)?;

    let mut hasher = DefaultHasher::new();
    title.hash(&mut hasher);
    for page_id in document.get_pages().into_values() {
        document.get_page_content(page_id)?.hash(&mut hasher);
    }
    let low = hasher.finish();
    low.hash(&mut hasher);
    let id = format!("{:016x}{:016x}", hasher.finish(), low);
    debug!("pinned document id {}", id);

    if let Ok(info_id) = document.trailer.get(b"Info").and_then(Object::as_reference) {
        let info = document.get_dictionary_mut(info_id)?;
        for key in ["CreationDate", "ModDate"] {
            if info.has(key.as_bytes()) {
                info.set(key, Object::string_literal(FIXED_TIMESTAMP));
            }
        }
    }
    document.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(id.clone().into_bytes(), StringFormat::Literal),
            Object::String(id.into_bytes(), StringFormat::Literal),
        ]),
    );

    let mut buffer = Vec::new();
    document.save_to(&mut buffer).map_err(lopdf::Error::from)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped_pdf(created: &str, id: &str) -> Vec<u8> {
        use lopdf::dictionary;

        let mut doc = lopdf::Document::with_version("1.3");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(lopdf::Stream::new(
            lopdf::Dictionary::new(),
            b"0 0 10 10 re f".to_vec(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        doc.objects.insert(
            pages_id,
            dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1_i64,
            }
            .into(),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Guide"),
            "CreationDate" => Object::string_literal(created),
            "ModDate" => Object::string_literal(created),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.trailer.set(
            "ID",
            vec![Object::string_literal(id), Object::string_literal(id)],
        );

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn dates_and_ids_are_pinned() {
        let morning = stamped_pdf("D:20240101080000+00'00'", "AAAA");
        let evening = stamped_pdf("D:20240101200000+00'00'", "BBBB");
        assert_ne!(morning, evening);

        let a = pin_document_identity(&morning, "Guide").unwrap();
        let b = pin_document_identity(&evening, "Guide").unwrap();
        assert_eq!(a, b);

        let doc = lopdf::Document::load_mem(&a).unwrap();
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        let created = info.get(b"CreationDate").and_then(Object::as_str).unwrap();
        assert_eq!(created, FIXED_TIMESTAMP.as_bytes());
    }

    #[test]
    fn different_titles_get_different_ids() {
        let bytes = stamped_pdf("D:20240101080000+00'00'", "AAAA");
        let id = |title: &str| {
            let pinned = pin_document_identity(&bytes, title).unwrap();
            let doc = lopdf::Document::load_mem(&pinned).unwrap();
            let id = doc.trailer.get(b"ID").and_then(Object::as_array).unwrap();
            id[0].as_str().unwrap().to_vec()
        };
        assert_ne!(id("Guide"), id("Manual"));
    }
}
