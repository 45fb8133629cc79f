//! Page dictionary rewriting for the incremental update.
//!
//! The patched page is a new version of the same object number: its
//! `/Contents` gains the overlay stream as the last element (so the QR
//! paints on top), and its `/Resources` gains an `/XObject` entry named
//! `/FmQR` for the form. All other entries pass through untouched.

use crate::error::SealError;
use crate::object::{dict_get, dict_set, locate_object_dict, PdfAtom};
use crate::pages::LocatedPage;

/// The rewritten page, plus any referenced dictionaries that had to be
/// redefined alongside it (indirect `/Resources` or `/XObject`).
pub struct PatchedPage {
    pub page_body: Vec<u8>,
    pub extra_objects: Vec<(u32, Vec<u8>)>,
}

pub fn patch_page(
    buf: &[u8],
    page: &LocatedPage,
    content_obj: u32,
    form_obj: u32,
) -> Result<PatchedPage, SealError> {
    let mut dict = page.dict.clone();
    let entries = dict
        .as_dict_mut()
        .ok_or_else(|| SealError::SyntaxError(format!("page {} is not a dictionary", page.obj)))?;
    let mut extras = Vec::new();

    let contents = match dict_get(entries, "Contents") {
        Some(PdfAtom::Array(items)) => {
            let mut items = items.clone();
            items.push(PdfAtom::Ref(content_obj, 0));
            items
        }
        Some(existing @ PdfAtom::Ref(_, _)) => {
            vec![existing.clone(), PdfAtom::Ref(content_obj, 0)]
        }
        _ => vec![PdfAtom::Ref(content_obj, 0)],
    };
    dict_set(entries, "Contents", PdfAtom::Array(contents));

    match dict_get(entries, "Resources").cloned() {
        Some(PdfAtom::Dict(mut res)) => {
            merge_form_ref(buf, &mut res, form_obj, &mut extras)?;
            dict_set(entries, "Resources", PdfAtom::Dict(res));
        }
        Some(PdfAtom::Ref(res_num, _)) => {
            // redefine the shared resources object in the update section
            let slice = locate_object_dict(buf, res_num)
                .ok_or(SealError::ObjectNotFound(res_num))?;
            let mut res_dict = PdfAtom::parse(slice)?;
            let res = res_dict.as_dict_mut().ok_or_else(|| {
                SealError::SyntaxError(format!("resources {} is not a dictionary", res_num))
            })?;
            merge_form_ref(buf, res, form_obj, &mut extras)?;
            extras.push((res_num, res_dict.serialize()));
        }
        _ => {
            let xobj = PdfAtom::Dict(vec![("FmQR".to_string(), PdfAtom::Ref(form_obj, 0))]);
            dict_set(
                entries,
                "Resources",
                PdfAtom::Dict(vec![("XObject".to_string(), xobj)]),
            );
        }
    }

    Ok(PatchedPage {
        page_body: dict.serialize(),
        extra_objects: extras,
    })
}

fn merge_form_ref(
    buf: &[u8],
    resources: &mut Vec<(String, PdfAtom)>,
    form_obj: u32,
    extras: &mut Vec<(u32, Vec<u8>)>,
) -> Result<(), SealError> {
    match dict_get(resources, "XObject").cloned() {
        Some(PdfAtom::Dict(mut xobjs)) => {
            dict_set(&mut xobjs, "FmQR", PdfAtom::Ref(form_obj, 0));
            dict_set(resources, "XObject", PdfAtom::Dict(xobjs));
        }
        Some(PdfAtom::Ref(xo_num, _)) => {
            let slice =
                locate_object_dict(buf, xo_num).ok_or(SealError::ObjectNotFound(xo_num))?;
            let mut xo_dict = PdfAtom::parse(slice)?;
            let xobjs = xo_dict.as_dict_mut().ok_or_else(|| {
                SealError::SyntaxError(format!("XObject {} is not a dictionary", xo_num))
            })?;
            dict_set(xobjs, "FmQR", PdfAtom::Ref(form_obj, 0));
            extras.push((xo_num, xo_dict.serialize()));
        }
        _ => {
            let xobj = PdfAtom::Dict(vec![("FmQR".to_string(), PdfAtom::Ref(form_obj, 0))]);
            dict_set(resources, "XObject", xobj);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::LocatedPage;
    use crate::scan::ObjRef;
    use pretty_assertions::assert_eq;

    fn page_from(dict: &[u8]) -> LocatedPage {
        LocatedPage {
            obj: ObjRef(3, 0),
            dict: PdfAtom::parse(dict).unwrap(),
        }
    }

    fn parse_entries(body: &[u8]) -> Vec<(String, PdfAtom)> {
        PdfAtom::parse(body).unwrap().as_dict().unwrap().clone()
    }

    #[test]
    fn single_contents_ref_becomes_array() {
        let page = page_from(b"<< /Type /Page /Contents 4 0 R /Resources << >> >>");
        let patched = patch_page(b"", &page, 10, 11).unwrap();
        let entries = parse_entries(&patched.page_body);
        assert_eq!(
            dict_get(&entries, "Contents"),
            Some(&PdfAtom::Array(vec![PdfAtom::Ref(4, 0), PdfAtom::Ref(10, 0)]))
        );
    }

    #[test]
    fn contents_array_appends_overlay_last() {
        let page = page_from(b"<< /Type /Page /Contents [4 0 R 5 0 R] /Resources << >> >>");
        let patched = patch_page(b"", &page, 10, 11).unwrap();
        let entries = parse_entries(&patched.page_body);
        assert_eq!(
            dict_get(&entries, "Contents"),
            Some(&PdfAtom::Array(vec![
                PdfAtom::Ref(4, 0),
                PdfAtom::Ref(5, 0),
                PdfAtom::Ref(10, 0),
            ]))
        );
    }

    #[test]
    fn missing_contents_and_resources_are_created() {
        let page = page_from(b"<< /Type /Page >>");
        let patched = patch_page(b"", &page, 10, 11).unwrap();
        let entries = parse_entries(&patched.page_body);
        assert_eq!(
            dict_get(&entries, "Contents"),
            Some(&PdfAtom::Array(vec![PdfAtom::Ref(10, 0)]))
        );
        let res = dict_get(&entries, "Resources").unwrap().as_dict().unwrap();
        let xobj = dict_get(res, "XObject").unwrap().as_dict().unwrap();
        assert_eq!(dict_get(xobj, "FmQR"), Some(&PdfAtom::Ref(11, 0)));
    }

    #[test]
    fn inline_xobject_dict_keeps_existing_entries() {
        let page =
            page_from(b"<< /Type /Page /Resources << /XObject << /Im0 6 0 R >> /ProcSet [/PDF] >> >>");
        let patched = patch_page(b"", &page, 10, 11).unwrap();
        let entries = parse_entries(&patched.page_body);
        let res = dict_get(&entries, "Resources").unwrap().as_dict().unwrap();
        assert_eq!(
            dict_get(res, "ProcSet"),
            Some(&PdfAtom::Array(vec![PdfAtom::Name("PDF".into())]))
        );
        let xobj = dict_get(res, "XObject").unwrap().as_dict().unwrap();
        assert_eq!(dict_get(xobj, "Im0"), Some(&PdfAtom::Ref(6, 0)));
        assert_eq!(dict_get(xobj, "FmQR"), Some(&PdfAtom::Ref(11, 0)));
        assert!(patched.extra_objects.is_empty());
    }

    #[test]
    fn indirect_resources_are_redefined() {
        let buf: &[u8] = b"8 0 obj\n<< /Font << /F1 5 0 R >> >>\nendobj\n";
        let page = page_from(b"<< /Type /Page /Resources 8 0 R >>");
        let patched = patch_page(buf, &page, 10, 11).unwrap();
        // the page keeps pointing at object 8; object 8 is redefined
        let entries = parse_entries(&patched.page_body);
        assert_eq!(dict_get(&entries, "Resources"), Some(&PdfAtom::Ref(8, 0)));
        assert_eq!(patched.extra_objects.len(), 1);
        let (num, body) = &patched.extra_objects[0];
        assert_eq!(*num, 8);
        let res = parse_entries(body);
        assert!(dict_get(&res, "Font").is_some());
        let xobj = dict_get(&res, "XObject").unwrap().as_dict().unwrap();
        assert_eq!(dict_get(xobj, "FmQR"), Some(&PdfAtom::Ref(11, 0)));
    }

    #[test]
    fn indirect_resources_missing_from_buffer_is_an_error() {
        let page = page_from(b"<< /Type /Page /Resources 8 0 R >>");
        assert!(matches!(
            patch_page(b"", &page, 10, 11),
            Err(SealError::ObjectNotFound(8))
        ));
    }
}
