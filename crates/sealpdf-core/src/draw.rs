//! PDF content generation for the QR overlay.
//!
//! The QR symbol is drawn once, as a Form XObject of black `re f`
//! rectangles at 2pt per module with a 2-module quiet zone. Each page
//! placement is a short content stream that paints a white backing
//! square and invokes the form via `/FmQR Do`, scaled to the target
//! size. Reusing one form keeps repeat placements cheap.

use crate::qr::QrMatrix;

/// Points per QR module in the form's native coordinates.
const MODULE_PT: f64 = 2.0;
/// Quiet-zone width in modules on every side.
const QUIET_MODULES: usize = 2;

/// A built Form XObject: its full object body (dictionary plus stream)
/// and its native side length in points.
pub struct QrForm {
    pub body: Vec<u8>,
    pub native_size: f64,
}

/// Render the matrix into a Form XObject body.
pub fn build_qr_form(qr: &QrMatrix) -> QrForm {
    let native_size = (qr.size + 2 * QUIET_MODULES) as f64 * MODULE_PT;
    let n = qr.size;

    let mut stream = String::from("0 0 0 rg\n1 w\n");
    for (row, cols) in qr.modules.iter().enumerate() {
        for (col, dark) in cols.iter().enumerate() {
            if !dark {
                continue;
            }
            let x = (col + QUIET_MODULES) as f64 * MODULE_PT;
            // row 0 is the top of the symbol; PDF y grows upward
            let y = (n - 1 - row + QUIET_MODULES) as f64 * MODULE_PT;
            stream.push_str(&format!(
                "{} {} {} {} re f\n",
                fmt_num(x),
                fmt_num(y),
                fmt_num(MODULE_PT),
                fmt_num(MODULE_PT)
            ));
        }
    }

    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "<< /Type /XObject /Subtype /Form /BBox [0 0 {w} {w}] /Resources << /ProcSet [/PDF] >> /Length {len} >>\nstream\n",
            w = fmt_num(native_size),
            len = stream.len()
        )
        .as_bytes(),
    );
    body.extend_from_slice(stream.as_bytes());
    body.extend_from_slice(b"endstream");

    QrForm { body, native_size }
}

/// Build the page content stream that places the form at `(x, y)` with
/// side `size`, over a white backing square. `form_obj` is the form's
/// object number, referenced as `/FmQR` from the page resources.
pub fn build_overlay_body(form_obj: u32, native_size: f64, x: f64, y: f64, size: f64) -> Vec<u8> {
    let scale = size / native_size;
    let stream = format!(
        "q\n{s} 0 0 {s} {x} {y} cm\n1 1 1 rg\n0 0 {w} {w} re f\n/FmQR Do\nQ\n",
        s = fmt_num(scale),
        x = fmt_num(x),
        y = fmt_num(y),
        w = fmt_num(native_size),
    );
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "<< /Resources << /XObject << /FmQR {} 0 R >> >> /Length {} >>\nstream\n",
            form_obj,
            stream.len()
        )
        .as_bytes(),
    );
    body.extend_from_slice(stream.as_bytes());
    body.extend_from_slice(b"endstream");
    body
}

/// Format a number for a content stream: up to four decimal places,
/// trailing zeros and dangling points trimmed.
pub(crate) fn fmt_num(v: f64) -> String {
    let mut s = format!("{:.4}", v);
    while s.contains('.') && (s.ends_with('0') || s.ends_with('.')) {
        s.pop();
    }
    s
}
