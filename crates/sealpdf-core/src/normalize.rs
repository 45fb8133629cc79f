//! Normalization pass.
//!
//! Arbitrary input PDFs are re-serialized through `lopdf` before
//! sealing, which rewrites object streams and cross-reference streams
//! into classic objects and a classic xref table. The byte scanners in
//! this crate only ever run over normalized output, so they can assume
//! `N G obj` markers and `<< >>` dictionaries are visible in the byte
//! stream. Page dimensions are captured in the same pass.

use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::SealError;
use crate::layout::PageDimensions;

/// US Letter, used when no `/MediaBox` is inherited anywhere up the tree.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// A re-serialized document plus the dimensions of each page, in page
/// order.
pub struct NormalizedPdf {
    pub bytes: Vec<u8>,
    pub pages: Vec<PageDimensions>,
}

pub fn normalize(input: &[u8]) -> Result<NormalizedPdf, SealError> {
    let mut doc =
        Document::load_mem(input).map_err(|e| SealError::ParseError(e.to_string()))?;

    // lopdf writes a cross-reference stream for versions 1.5 and up;
    // the scanners need a classic table, and re-normalizing must be
    // byte-stable, so clamp the version and drop the input's XRef and
    // ObjStm container objects (their contents are already inlined
    // into the object map by the loader).
    if forces_xref_stream(&doc.version) {
        doc.version = "1.4".to_string();
    }
    let stale: Vec<ObjectId> = doc
        .objects
        .iter()
        .filter(|(_, obj)| is_xref_container(obj))
        .map(|(id, _)| *id)
        .collect();
    for id in stale {
        doc.objects.remove(&id);
    }

    let mut pages = Vec::new();
    for (_, page_id) in doc.get_pages() {
        let rect = media_box(&doc, page_id);
        pages.push(PageDimensions {
            width: rect[2] - rect[0],
            height: rect[3] - rect[1],
        });
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| SealError::SaveError(e.to_string()))?;
    debug!(input = input.len(), output = bytes.len(), pages = pages.len(), "normalized");
    Ok(NormalizedPdf { bytes, pages })
}

fn forces_xref_stream(version: &str) -> bool {
    let mut parts = version.split('.');
    let major: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(1);
    let minor: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    major > 1 || minor >= 5
}

fn is_xref_container(obj: &Object) -> bool {
    let stream = match obj {
        Object::Stream(stream) => stream,
        _ => return false,
    };
    match stream.dict.get(b"Type").and_then(|t| t.as_name()) {
        Ok(name) => name == b"XRef" || name == b"ObjStm",
        Err(_) => false,
    }
}

/// `/MediaBox` of a page, walking `/Parent` links for inherited boxes.
fn media_box(doc: &Document, page_id: ObjectId) -> [f64; 4] {
    let mut current = page_id;
    for _ in 0..32 {
        let dict = match doc.get_dictionary(current) {
            Ok(d) => d,
            Err(_) => break,
        };
        if let Ok(obj) = dict.get(b"MediaBox") {
            if let Some(rect) = as_rect(doc, obj) {
                return rect;
            }
        }
        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => current = parent,
            Err(_) => break,
        }
    }
    DEFAULT_MEDIA_BOX
}

fn as_rect(doc: &Document, obj: &Object) -> Option<[f64; 4]> {
    let resolved = match obj {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let arr = resolved.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let mut rect = [0.0f64; 4];
    for (slot, item) in rect.iter_mut().zip(arr) {
        *slot = match item {
            Object::Integer(i) => *i as f64,
            Object::Real(f) => *f as f64,
            _ => return None,
        };
    }
    Some(rect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;
    use lopdf::{Object, Stream};
    use pretty_assertions::assert_eq;

    fn build_doc(media_box: Option<Vec<Object>>, on_parent: bool) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content = Stream::new(dictionary! {}, b"1 1 1 rg\n".to_vec());
        let content_id = doc.add_object(content);
        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        let mut pages_dict = dictionary! {
            "Type" => "Pages",
            "Count" => 1,
        };
        if let Some(rect) = media_box {
            if on_parent {
                pages_dict.set("MediaBox", rect);
            } else {
                page_dict.set("MediaBox", rect);
            }
        }
        let page_id = doc.add_object(page_dict);
        pages_dict.set("Kids", vec![Object::Reference(page_id)]);
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn to_bytes(mut doc: Document) -> Vec<u8> {
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn reads_page_dimensions() {
        let rect = vec![0.into(), 0.into(), 595.into(), 842.into()];
        let bytes = to_bytes(build_doc(Some(rect), false));
        let norm = normalize(&bytes).unwrap();
        assert_eq!(
            norm.pages,
            vec![PageDimensions {
                width: 595.0,
                height: 842.0
            }]
        );
    }

    #[test]
    fn media_box_inherited_from_parent() {
        let rect = vec![0.into(), 0.into(), 612.into(), 792.into()];
        let bytes = to_bytes(build_doc(Some(rect), true));
        let norm = normalize(&bytes).unwrap();
        assert_eq!(norm.pages[0].width, 612.0);
        assert_eq!(norm.pages[0].height, 792.0);
    }

    #[test]
    fn missing_media_box_defaults_to_letter() {
        let bytes = to_bytes(build_doc(None, false));
        let norm = normalize(&bytes).unwrap();
        assert_eq!(norm.pages[0].width, 612.0);
        assert_eq!(norm.pages[0].height, 792.0);
    }

    #[test]
    fn normalized_output_is_classic_pdf() {
        let rect = vec![0.into(), 0.into(), 612.into(), 792.into()];
        let bytes = to_bytes(build_doc(Some(rect), false));
        let norm = normalize(&bytes).unwrap();
        let text = String::from_utf8_lossy(&norm.bytes);
        assert!(text.contains("xref"));
        assert!(text.contains("trailer"));
        assert!(text.ends_with("%%EOF") || text.ends_with("%%EOF\n"));
    }

    #[test]
    fn renormalizing_is_byte_stable() {
        // the input is saved at 1.5, so its tail is a cross-reference
        // stream; both passes must still converge on identical bytes
        let rect = vec![0.into(), 0.into(), 612.into(), 792.into()];
        let bytes = to_bytes(build_doc(Some(rect), false));
        let first = normalize(&bytes).unwrap();
        let second = normalize(&first.bytes).unwrap();
        assert_eq!(first.bytes, second.bytes);
        let third = normalize(&second.bytes).unwrap();
        assert_eq!(second.bytes, third.bytes);
    }

    #[test]
    fn xref_stream_input_is_rewritten_classic() {
        let rect = vec![0.into(), 0.into(), 612.into(), 792.into()];
        let bytes = to_bytes(build_doc(Some(rect), false));
        assert!(find_subslice(&bytes, b"/XRef").is_some());

        let norm = normalize(&bytes).unwrap();
        assert!(norm.bytes.starts_with(b"%PDF-1.4"));
        assert!(find_subslice(&norm.bytes, b"/XRef").is_none());
        assert!(find_subslice(&norm.bytes, b"/ObjStm").is_none());
        assert!(find_subslice(&norm.bytes, b"\ntrailer").is_some());
    }

    fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    #[test]
    fn garbage_input_is_a_parse_error() {
        assert!(matches!(
            normalize(b"not a pdf at all"),
            Err(SealError::ParseError(_))
        ));
    }
}
