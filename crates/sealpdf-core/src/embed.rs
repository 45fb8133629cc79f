//! Incremental-update writer.
//!
//! The original bytes are copied unchanged, followed by a comment line
//! recording their exact length, the new objects, a classic xref table
//! covering them, and a trailer chaining to the previous one via
//! `/Prev`. Because nothing before the marker is touched, the original
//! file is recoverable byte for byte.

use tracing::debug;

use crate::draw::{build_overlay_body, build_qr_form};
use crate::error::SealError;
use crate::layout::{anchor_position, target_qr_size, Anchor, PageDimensions};
use crate::pages::find_page;
use crate::patch::patch_page;
use crate::qr;
use crate::trailer::parse_trailer;

/// Marker comment that anchors detachment. `% ORIGLEN=<n>` directly
/// after byte `n` of the output.
pub const ORIGLEN_MARKER: &[u8] = b"% ORIGLEN=";

/// What to place on the page and where.
pub struct EmbedRequest<'a> {
    /// Text encoded into the QR symbol, typically a verification URL.
    pub qr_text: &'a str,
    /// Optional signature payload carried as a `/SignatureData` object.
    pub attachment: Option<&'a str>,
    /// 1-based page number.
    pub page: u32,
    pub anchor: Anchor,
}

/// Append the QR overlay (and optional attachment) to `pdf` as an
/// incremental update. `pages` holds the dimensions of every page, in
/// order.
pub fn embed(pdf: &[u8], pages: &[PageDimensions], req: &EmbedRequest) -> Result<Vec<u8>, SealError> {
    if req.page < 1 || req.page as usize > pages.len() {
        return Err(SealError::PageNotFound {
            requested: req.page,
            total: pages.len() as u32,
        });
    }
    if crate::scan::find_pattern(pdf, ORIGLEN_MARKER, 0).is_some() {
        return Err(SealError::AlreadySealed);
    }

    let trailer = parse_trailer(pdf)?;
    let page = find_page(pdf, &trailer, req.page)?;
    let dims = pages[req.page as usize - 1];

    let (sig_num, form_num, content_num) = if req.attachment.is_some() {
        (Some(trailer.size), trailer.size + 1, trailer.size + 2)
    } else {
        (None, trailer.size, trailer.size + 1)
    };

    let form = build_qr_form(&qr::encode(req.qr_text)?);
    let size = target_qr_size(dims);
    let (x, y) = anchor_position(dims, req.anchor, size);
    debug!(page = req.page, size, x, y, "placing qr overlay");

    let content = build_overlay_body(form_num, form.native_size, x, y, size);
    let patched = patch_page(pdf, &page, content_num, form_num)?;

    // objects in file order; xref entries carry (number, offset)
    let mut objects: Vec<(u32, Vec<u8>)> = Vec::new();
    if let (Some(num), Some(text)) = (sig_num, req.attachment) {
        let body = format!(
            "<< /Type /SignatureData /Contents ({}) >>",
            escape_literal(text)
        );
        objects.push((num, body.into_bytes()));
    }
    objects.push((form_num, form.body));
    objects.push((content_num, content));
    objects.push((page.obj.0, patched.page_body));
    objects.extend(patched.extra_objects);

    let mut out = Vec::with_capacity(pdf.len() + 4096);
    out.extend_from_slice(pdf);
    out.extend_from_slice(format!("\n% ORIGLEN={}\n", pdf.len()).as_bytes());

    let mut entries: Vec<(u32, usize)> = Vec::with_capacity(objects.len());
    for (num, body) in &objects {
        entries.push((*num, out.len()));
        out.extend_from_slice(format!("{} 0 obj\n", num).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    out.extend_from_slice(&build_xref(&entries));

    let max_num = entries.iter().map(|(n, _)| *n).max().unwrap_or(0);
    let mut t = format!(
        "trailer\n<<\n/Size {}\n/Root {}\n/Prev {}\n",
        max_num + 1,
        trailer.root,
        trailer.xref_offset
    );
    if let Some(info) = trailer.info {
        t.push_str(&format!("/Info {}\n", info));
    }
    if let Some(id) = &trailer.id_array {
        t.push_str(&format!("/ID [{}]\n", id));
    }
    t.push_str(">>\n");
    out.extend_from_slice(t.as_bytes());
    out.extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_offset).as_bytes());

    debug!(bytes = out.len(), objects = entries.len(), "update section written");
    Ok(out)
}

/// Classic xref table for the update section: sorted entries grouped
/// into contiguous-run subsections.
fn build_xref(entries: &[(u32, usize)]) -> Vec<u8> {
    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|(num, _)| *num);

    let mut xref = String::from("xref\n");
    let mut i = 0;
    while i < sorted.len() {
        let start = sorted[i].0;
        let mut run = String::new();
        let mut len = 0u32;
        while i < sorted.len() && sorted[i].0 == start + len {
            run.push_str(&format!("{:010} 00000 n \n", sorted[i].1));
            len += 1;
            i += 1;
        }
        xref.push_str(&format!("{} {}\n{}", start, len, run));
    }
    xref.into_bytes()
}

/// Escape a string for a PDF literal: backslash, and both parentheses.
fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            _ => out.push(c),
        }
    }
    out
}
