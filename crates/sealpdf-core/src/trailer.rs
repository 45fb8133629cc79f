//! Tail parsing: last `startxref` plus the trailer dictionary.

use crate::error::SealError;
use crate::scan::{
    balanced_dict, extract_int_after, extract_ref_after, find_pattern, read_uint, rfind_pattern,
    skip_whitespace, ObjRef,
};

/// What the end of the document tells us about the current revision.
#[derive(Debug, Clone)]
pub struct TrailerInfo {
    /// Object count of the document (`/Size`)
    pub size: u32,
    /// Catalog reference (`/Root`)
    pub root: ObjRef,
    /// Optional `/Info` reference
    pub info: Option<ObjRef>,
    /// Raw text inside the `/ID [ ... ]` array, when present
    pub id_array: Option<String>,
    /// Byte offset of the current xref table (`startxref` value)
    pub xref_offset: usize,
}

/// Parse the tail of a PDF buffer into a [`TrailerInfo`].
///
/// The last `startxref` gives the xref offset. The dictionary is taken
/// from the last `trailer` keyword before it; documents whose revision
/// ends in a cross-reference stream have no `trailer` keyword, so the
/// fallback reads the dictionary embedded at the xref offset instead.
pub fn parse_trailer(buf: &[u8]) -> Result<TrailerInfo, SealError> {
    let sx = rfind_pattern(buf, b"startxref", buf.len())
        .ok_or_else(|| SealError::MalformedTrailer("startxref not found".into()))?;
    let offset_pos = skip_whitespace(buf, sx + b"startxref".len());
    let (xref_offset, _) = read_uint(buf, offset_pos)
        .ok_or_else(|| SealError::MalformedTrailer("invalid startxref offset".into()))?;
    let xref_offset = xref_offset as usize;

    if let Some(t_idx) = rfind_pattern(buf, b"trailer", sx) {
        if let Some(dict) = dict_after(buf, t_idx) {
            if let Some(info) = extract_trailer_keys(dict, xref_offset) {
                return Ok(info);
            }
        }
    }

    // Cross-reference-stream style: the dictionary lives in the object at
    // the xref offset.
    let dict = dict_after(buf, xref_offset.min(buf.len()))
        .ok_or_else(|| SealError::MalformedTrailer("no dictionary at xref offset".into()))?;
    extract_trailer_keys(dict, xref_offset)
        .ok_or_else(|| SealError::MalformedTrailer("missing /Size or /Root".into()))
}

/// Balanced dictionary slice starting at the first `<<` at or after `from`
fn dict_after(buf: &[u8], from: usize) -> Option<&[u8]> {
    let ds = find_pattern(buf, b"<<", from)?;
    let range = balanced_dict(buf, ds)?;
    Some(&buf[range])
}

fn extract_trailer_keys(dict: &[u8], xref_offset: usize) -> Option<TrailerInfo> {
    let size = extract_int_after(dict, b"/Size")?;
    let root = extract_ref_after(dict, b"/Root")?;
    Some(TrailerInfo {
        size: size as u32,
        root,
        info: extract_ref_after(dict, b"/Info"),
        id_array: extract_id_array(dict),
        xref_offset,
    })
}

/// Raw contents of `/ID [ <...> <...> ]`, trimmed
fn extract_id_array(dict: &[u8]) -> Option<String> {
    let pos = find_pattern(dict, b"/ID", 0)?;
    let open = find_pattern(dict, b"[", pos)?;
    let close = find_pattern(dict, b"]", open)?;
    let inner = std::str::from_utf8(&dict[open + 1..close]).ok()?.trim();
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}
