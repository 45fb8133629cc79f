//! Recovering the original document from a sealed file.
//!
//! The `% ORIGLEN=<n>` comment written at embed time records exactly how
//! many bytes the original occupied, so restoration is a prefix slice.
//! Bytes found after the update section's own `%%EOF` are edits made
//! after sealing; they are carried into the restored buffer so the
//! content hash no longer matches and verification fails.

use tracing::debug;

use crate::embed::ORIGLEN_MARKER;
use crate::scan::{find_pattern, is_pdf_whitespace, read_uint, rfind_pattern};

/// Result of detaching: the bytes to hash, any embedded signature text,
/// and whether trailing edits were found.
#[derive(Debug, Clone)]
pub struct Detached {
    pub restored: Vec<u8>,
    pub embedded_text: Option<String>,
    pub modified_after_signing: bool,
}

/// Strip the update section from a sealed file.
pub fn detach(buf: &[u8]) -> Detached {
    let embedded_text = extract_signature_text(buf);

    let orig_len = match read_marker(buf) {
        Some(n) => n,
        None => {
            // not sealed by this engine; fall back to cutting at the
            // second-to-last %%EOF
            let restored = strip_last_revision(buf).to_vec();
            return Detached {
                restored,
                embedded_text,
                modified_after_signing: false,
            };
        }
    };

    if orig_len >= buf.len() {
        return Detached {
            restored: buf.to_vec(),
            embedded_text,
            modified_after_signing: false,
        };
    }

    // the update section ends at the first %%EOF past the original
    let section_end = match find_pattern(buf, b"%%EOF", orig_len) {
        Some(eof) => eof + 5,
        None => {
            return Detached {
                restored: buf[..orig_len].to_vec(),
                embedded_text,
                modified_after_signing: false,
            }
        }
    };

    let tail = &buf[section_end.min(buf.len())..];
    if tail.iter().all(|&b| is_pdf_whitespace(b)) {
        return Detached {
            restored: buf[..orig_len].to_vec(),
            embedded_text,
            modified_after_signing: false,
        };
    }

    debug!(
        original = orig_len,
        trailing = tail.len(),
        "file was modified after sealing"
    );
    let mut restored = Vec::with_capacity(orig_len + tail.len());
    restored.extend_from_slice(&buf[..orig_len]);
    restored.extend_from_slice(tail);
    Detached {
        restored,
        embedded_text,
        modified_after_signing: true,
    }
}

fn read_marker(buf: &[u8]) -> Option<usize> {
    let at = find_pattern(buf, ORIGLEN_MARKER, 0)?;
    let (n, _) = read_uint(buf, at + ORIGLEN_MARKER.len())?;
    Some(n as usize)
}

fn strip_last_revision(buf: &[u8]) -> &[u8] {
    let last = match rfind_pattern(buf, b"%%EOF", buf.len()) {
        Some(i) => i,
        None => return buf,
    };
    match rfind_pattern(buf, b"%%EOF", last) {
        Some(prev) => &buf[..prev + 5],
        None => buf,
    }
}

/// Pull the `/Contents` literal out of the `/SignatureData` object, if
/// present, and undo the literal-string escaping.
fn extract_signature_text(buf: &[u8]) -> Option<String> {
    let sig = find_pattern(buf, b"/SignatureData", 0)?;
    let contents = find_pattern(buf, b"/Contents", sig)?;
    let open = find_pattern(buf, b"(", contents + 9)?;

    let mut raw = Vec::new();
    let mut i = open + 1;
    while i < buf.len() {
        match buf[i] {
            b'\\' if i + 1 < buf.len() => {
                raw.push(buf[i + 1]);
                i += 2;
            }
            b')' => {
                let text = String::from_utf8_lossy(&raw).into_owned();
                return Some(text);
            }
            b => {
                raw.push(b);
                i += 1;
            }
        }
    }
    None
}
