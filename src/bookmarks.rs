//! PDF outline built from the rendered section and subsection pages.
//!
//! Every rendered section becomes a top-level bookmark. Its `###` subsections
//! hang below it as child entries, each jumping to the page its heading was
//! drawn on. The tree is written into the finished bytes with `lopdf`.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::layout::SubsectionMark;
use crate::model::Section;

/// Errors that can occur while embedding the outline into a rendered PDF document.
#[derive(Debug, thiserror::Error)]
pub enum BookmarkError {
    /// The PDF bytes could not be parsed or written back by `lopdf`.
    #[error("failed to process PDF bytes")]
    Pdf(#[from] lopdf::Error),
    /// The trailer has no usable `/Root` catalog.
    #[error("PDF catalog entry is missing")]
    MissingCatalog,
    /// The catalog object is not a dictionary.
    #[error("PDF catalog entry is not a dictionary")]
    InvalidCatalog,
    /// A section or subsection page does not exist in the rendered document.
    #[error("section {section_index} refers to missing page {page_number}")]
    MissingPage {
        /// Index of the section whose page reference is missing.
        section_index: usize,
        /// The requested (1-based) page number.
        page_number: usize,
    },
}

/// One bookmark with its destination page and nested entries.
struct OutlineNode {
    id: ObjectId,
    page: ObjectId,
    title: String,
    children: Vec<OutlineNode>,
}

/// Adds an outline with one entry per rendered section and one child entry
/// per subsection heading.
///
/// `section_pages` and `subsections` are parallel to `sections`. Sections
/// mapped to `None` get no bookmark, and neither do their subsections. Every
/// entry jumps to its page with a `/Fit` destination. Sections start out
/// expanded so their subsections are visible.
pub fn apply_section_bookmarks(
    pdf_bytes: &[u8],
    sections: &[Section],
    section_pages: &[Option<usize>],
    subsections: &[Vec<SubsectionMark>],
) -> Result<Vec<u8>, BookmarkError> {
    let mut document = Document::load_mem(pdf_bytes)?;
    let pages = document.get_pages();

    let mut roots = Vec::new();
    for (index, (section, start)) in sections.iter().zip(section_pages).enumerate() {
        let Some(start) = *start else {
            continue;
        };
        let marks = subsections.get(index).map(Vec::as_slice).unwrap_or_default();
        let mut children = Vec::with_capacity(marks.len());
        for mark in marks {
            children.push(OutlineNode {
                id: document.new_object_id(),
                page: page_id(&pages, index, mark.page)?,
                title: mark.title.clone(),
                children: Vec::new(),
            });
        }
        roots.push(OutlineNode {
            id: document.new_object_id(),
            page: page_id(&pages, index, start)?,
            title: section.title().to_owned(),
            children,
        });
    }
    if roots.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let outlines_id = document.new_object_id();
    let visible = write_level(&mut document, outlines_id, &roots);
    let mut outlines = level_links(&roots);
    outlines.set("Type", Object::Name("Outlines".into()));
    outlines.set("Count", Object::Integer(visible));
    document
        .objects
        .insert(outlines_id, Object::Dictionary(outlines));
    attach_to_catalog(&mut document, outlines_id)?;

    let mut buffer = Vec::new();
    document.save_to(&mut buffer).map_err(lopdf::Error::from)?;
    Ok(buffer)
}

fn page_id(
    pages: &BTreeMap<u32, ObjectId>,
    section_index: usize,
    page_number: usize,
) -> Result<ObjectId, BookmarkError> {
    u32::try_from(page_number)
        .ok()
        .and_then(|number| pages.get(&number))
        .copied()
        .ok_or(BookmarkError::MissingPage {
            section_index,
            page_number,
        })
}

/// `/First`, `/Last` of a non-empty level.
fn level_links(nodes: &[OutlineNode]) -> Dictionary {
    let mut dictionary = Dictionary::new();
    if let (Some(first), Some(last)) = (nodes.first(), nodes.last()) {
        dictionary.set("First", Object::Reference(first.id));
        dictionary.set("Last", Object::Reference(last.id));
    }
    dictionary
}

/// Writes sibling entries under `parent` and returns how many entries are
/// visible from it, nested ones included.
fn write_level(document: &mut Document, parent: ObjectId, nodes: &[OutlineNode]) -> i64 {
    let mut visible = 0;
    for (index, node) in nodes.iter().enumerate() {
        let mut dictionary = level_links(&node.children);
        dictionary.set("Title", Object::string_literal(node.title.as_str()));
        dictionary.set("Parent", Object::Reference(parent));
        dictionary.set(
            "Dest",
            Object::Array(vec![Object::Reference(node.page), Object::Name("Fit".into())]),
        );
        if let Some(previous) = index.checked_sub(1).map(|i| &nodes[i]) {
            dictionary.set("Prev", Object::Reference(previous.id));
        }
        if let Some(next) = nodes.get(index + 1) {
            dictionary.set("Next", Object::Reference(next.id));
        }

        let nested = write_level(document, node.id, &node.children);
        if nested > 0 {
            dictionary.set("Count", Object::Integer(nested));
        }
        visible += 1 + nested;
        document
            .objects
            .insert(node.id, Object::Dictionary(dictionary));
    }
    visible
}

fn attach_to_catalog(document: &mut Document, outlines_id: ObjectId) -> Result<(), BookmarkError> {
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| BookmarkError::MissingCatalog)?;
    let catalog = document
        .objects
        .get_mut(&catalog_id)
        .ok_or(BookmarkError::MissingCatalog)?
        .as_dict_mut()
        .map_err(|_| BookmarkError::InvalidCatalog)?;
    catalog.set("Outlines", Object::Reference(outlines_id));
    catalog.set("PageMode", Object::Name("UseOutlines".into()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn blank_pdf(page_count: u32) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..page_count)
            .map(|_| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }
            .into(),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn mark(title: &str, page: usize) -> SubsectionMark {
        SubsectionMark {
            title: title.to_owned(),
            page,
        }
    }

    /// Titles of the entries below `parent`, with the page number each jumps to.
    fn children(doc: &Document, parent: &Dictionary) -> Vec<(String, u32, ObjectId)> {
        let numbers: BTreeMap<ObjectId, u32> =
            doc.get_pages().into_iter().map(|(n, id)| (id, n)).collect();
        let mut entries = Vec::new();
        let mut next = parent.get(b"First").and_then(Object::as_reference).ok();
        while let Some(id) = next {
            let entry = doc.get_dictionary(id).unwrap();
            let title = entry.get(b"Title").and_then(Object::as_str).unwrap();
            let dest = entry.get(b"Dest").and_then(Object::as_array).unwrap();
            let page = numbers[&dest[0].as_reference().unwrap()];
            entries.push((String::from_utf8_lossy(title).into_owned(), page, id));
            next = entry.get(b"Next").and_then(Object::as_reference).ok();
        }
        entries
    }

    fn outline_root(doc: &Document) -> &Dictionary {
        let root = doc.trailer.get(b"Root").and_then(Object::as_reference).unwrap();
        let catalog = doc.get_dictionary(root).unwrap();
        let outlines_id = catalog.get(b"Outlines").unwrap().as_reference().unwrap();
        doc.get_dictionary(outlines_id).unwrap()
    }

    #[test]
    fn sections_carry_their_subsections() {
        let sections = vec![
            Section::new("Table of Contents"),
            Section::new("Files"),
            Section::new("Network"),
        ];
        let subsections = vec![
            vec![mark("ignored", 1)],
            vec![mark("Listing", 3), mark("Copying", 4)],
            Vec::new(),
        ];
        let bytes = apply_section_bookmarks(
            &blank_pdf(5),
            &sections,
            &[None, Some(3), Some(5)],
            &subsections,
        )
        .unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let root = outline_root(&doc);
        assert_eq!(root.get(b"Count").unwrap().as_i64().unwrap(), 4);

        let top = children(&doc, root);
        let titles: Vec<_> = top.iter().map(|(t, p, _)| (t.as_str(), *p)).collect();
        assert_eq!(titles, vec![("Files", 3), ("Network", 5)]);

        let files = doc.get_dictionary(top[0].2).unwrap();
        assert_eq!(files.get(b"Count").unwrap().as_i64().unwrap(), 2);
        let nested: Vec<_> = children(&doc, files)
            .into_iter()
            .map(|(t, p, _)| (t, p))
            .collect();
        assert_eq!(
            nested,
            vec![("Listing".to_owned(), 3), ("Copying".to_owned(), 4)]
        );

        let network = doc.get_dictionary(top[1].2).unwrap();
        assert!(network.get(b"First").is_err());
        assert!(network.get(b"Count").is_err());
    }

    #[test]
    fn missing_subsection_pages_are_reported() {
        let sections = vec![Section::new("Intro"), Section::new("Late")];
        let err = apply_section_bookmarks(
            &blank_pdf(3),
            &sections,
            &[Some(1), Some(2)],
            &[Vec::new(), vec![mark("Beyond", 7)]],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BookmarkError::MissingPage {
                section_index: 1,
                page_number: 7
            }
        ));
    }

    #[test]
    fn no_rendered_sections_leaves_bytes_untouched() {
        let original = blank_pdf(1);
        let bytes =
            apply_section_bookmarks(&original, &[Section::new("x")], &[None], &[]).unwrap();
        assert_eq!(bytes, original);
    }
}
