//! Page tree traversal.
//!
//! Resolves a 1-based page number to its leaf `/Page` object by walking
//! `/Root -> /Pages -> /Kids` depth-first in document order. Intermediate
//! `/Pages` nodes recurse; `/Type /Page` leaves count.

use crate::error::SealError;
use crate::object::{dict_get, locate_object_dict, PdfAtom};
use crate::scan::ObjRef;
use crate::trailer::TrailerInfo;

/// A located page: its object number and its dictionary atom.
#[derive(Debug, Clone)]
pub struct LocatedPage {
    pub obj: ObjRef,
    pub dict: PdfAtom,
}

/// Find page `page_num` (1-based) starting from the trailer's catalog.
pub fn find_page(buf: &[u8], trailer: &TrailerInfo, page_num: u32) -> Result<LocatedPage, SealError> {
    let pages_ref = catalog_pages_ref(buf, trailer)?;
    let mut counter = 0u32;
    match walk(buf, pages_ref, page_num, &mut counter)? {
        Some(page) => Ok(page),
        None if counter == 0 => Err(SealError::NoPages),
        None => Err(SealError::PageNotFound {
            requested: page_num,
            total: counter,
        }),
    }
}

/// Count the leaf pages reachable from the catalog.
pub fn count_pages(buf: &[u8], trailer: &TrailerInfo) -> Result<u32, SealError> {
    let pages_ref = catalog_pages_ref(buf, trailer)?;
    let mut counter = 0u32;
    // target 0 never matches; the walk just counts leaves
    walk(buf, pages_ref, 0, &mut counter)?;
    Ok(counter)
}

fn catalog_pages_ref(buf: &[u8], trailer: &TrailerInfo) -> Result<ObjRef, SealError> {
    let root_dict = load_dict(buf, trailer.root)?;
    match dict_get(root_dict.as_dict().ok_or(SealError::PagesNotFound)?, "Pages") {
        Some(PdfAtom::Ref(num, gen)) => Ok(ObjRef(*num, *gen)),
        _ => Err(SealError::PagesNotFound),
    }
}

fn walk(
    buf: &[u8],
    node: ObjRef,
    target: u32,
    counter: &mut u32,
) -> Result<Option<LocatedPage>, SealError> {
    let dict = load_dict(buf, node)?;
    let (is_page, kids) = {
        let entries = dict.as_dict().ok_or_else(|| {
            SealError::SyntaxError(format!("object {} is not a dictionary", node))
        })?;
        let is_page =
            matches!(dict_get(entries, "Type"), Some(PdfAtom::Name(t)) if t == "Page");
        let kids = match dict_get(entries, "Kids") {
            Some(PdfAtom::Array(kids)) => kids.clone(),
            _ => Vec::new(),
        };
        (is_page, kids)
    };

    if is_page {
        *counter += 1;
        if *counter == target {
            return Ok(Some(LocatedPage { obj: node, dict }));
        }
        return Ok(None);
    }
    for kid in kids {
        if let PdfAtom::Ref(num, gen) = kid {
            if let Some(found) = walk(buf, ObjRef(num, gen), target, counter)? {
                return Ok(Some(found));
            }
        }
    }
    Ok(None)
}

fn load_dict(buf: &[u8], obj: ObjRef) -> Result<PdfAtom, SealError> {
    let slice = locate_object_dict(buf, obj.0).ok_or(SealError::ObjectNotFound(obj.0))?;
    PdfAtom::parse(slice)
}
