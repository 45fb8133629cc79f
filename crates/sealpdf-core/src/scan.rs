//! Byte-level scanning primitives shared by the tail parser, object
//! locator and page resolver.
//!
//! All parsing in this crate is read-only scanning over `&[u8]`. PDF
//! structure is ASCII, so working on raw bytes keeps the view
//! byte-transparent: any region sliced out of the buffer reproduces the
//! original bytes exactly.

/// Object reference (object number, generation number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(pub u32, pub u16);

impl std::fmt::Display for ObjRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.0, self.1)
    }
}

/// Find pattern in bytes, starting the search at `from`
pub fn find_pattern(bytes: &[u8], pattern: &[u8], from: usize) -> Option<usize> {
    if pattern.is_empty() || from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(pattern.len())
        .position(|window| window == pattern)
        .map(|pos| from + pos)
}

/// Find the last occurrence of a pattern before `end` (exclusive)
pub fn rfind_pattern(bytes: &[u8], pattern: &[u8], end: usize) -> Option<usize> {
    let end = end.min(bytes.len());
    if pattern.is_empty() || pattern.len() > end {
        return None;
    }
    (0..=(end - pattern.len()))
        .rev()
        .find(|&i| &bytes[i..i + pattern.len()] == pattern)
}

pub fn is_pdf_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' | b'\0')
}

/// Skip whitespace starting at `pos`, returning the first non-whitespace index
pub fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && is_pdf_whitespace(bytes[pos]) {
        pos += 1;
    }
    pos
}

/// Read an unsigned decimal integer at `pos`, returning the value and the
/// index just past it
pub fn read_uint(bytes: &[u8], pos: usize) -> Option<(u64, usize)> {
    let mut i = pos;
    let mut value: u64 = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        value = value.checked_mul(10)?.checked_add((bytes[i] - b'0') as u64)?;
        i += 1;
    }
    if i == pos {
        None
    } else {
        Some((value, i))
    }
}

/// Slice a balanced `<< ... >>` dictionary starting at `start` (which must
/// point at the opening `<<`). Tracks nesting depth rather than assuming a
/// flat dictionary. Returns the range including both delimiters.
pub fn balanced_dict(bytes: &[u8], start: usize) -> Option<std::ops::Range<usize>> {
    if !bytes[start..].starts_with(b"<<") {
        return None;
    }
    let mut depth = 0usize;
    let mut i = start;
    while i + 1 < bytes.len() {
        if bytes[i] == b'<' && bytes[i + 1] == b'<' {
            depth += 1;
            i += 2;
        } else if bytes[i] == b'>' && bytes[i + 1] == b'>' {
            depth -= 1;
            i += 2;
            if depth == 0 {
                return Some(start..i);
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Extract integer after a key (e.g., "/Size 100")
pub fn extract_int_after(bytes: &[u8], key: &[u8]) -> Option<i64> {
    let pos = find_pattern(bytes, key, 0)?;
    let after = &bytes[pos + key.len()..];

    let start = after
        .iter()
        .position(|&b| b.is_ascii_digit() || b == b'-')?;
    let after = &after[start..];
    let end = after
        .iter()
        .position(|&b| !b.is_ascii_digit() && b != b'-')
        .unwrap_or(after.len());

    std::str::from_utf8(&after[..end]).ok()?.parse().ok()
}

/// Extract reference after a key (e.g., "/Root 1 0 R")
pub fn extract_ref_after(bytes: &[u8], key: &[u8]) -> Option<ObjRef> {
    let pos = find_pattern(bytes, key, 0)?;
    let after = &bytes[pos + key.len()..];

    let start = skip_whitespace(after, 0);
    let (obj_num, next) = read_uint(after, start)?;
    let gen_start = skip_whitespace(after, next);
    let (gen, after_gen) = read_uint(after, gen_start)?;
    let r_pos = skip_whitespace(after, after_gen);
    if after.get(r_pos) != Some(&b'R') {
        return None;
    }
    Some(ObjRef(obj_num as u32, gen as u16))
}
