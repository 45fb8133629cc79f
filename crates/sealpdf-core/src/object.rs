//! Object location and a minimal typed object model.
//!
//! Locating an object scans for its line-anchored `N G obj` marker and
//! slices the balanced dictionary that follows. The located slice can
//! then be tokenized into a [`PdfAtom`], a tagged variant the page
//! patcher rewrites and serializes back to PDF syntax. Existing file
//! bytes are never rewritten in place; rewritten objects are always
//! appended as part of an incremental update.

use crate::error::SealError;
use crate::scan::{balanced_dict, find_pattern, is_pdf_whitespace, read_uint, skip_whitespace};

/// Find the dictionary of object `obj_num` in the buffer.
///
/// Scans for a `N G obj` marker anchored at the start of the buffer or of
/// a line, then slices the first balanced `<< ... >>` after it. Returns
/// `None` when the object is absent; callers treat that as a
/// missing-object condition, not a crash.
pub fn locate_object_dict(buf: &[u8], obj_num: u32) -> Option<&[u8]> {
    let mut i = 0;
    while i < buf.len() {
        if buf[i].is_ascii_digit() && (i == 0 || buf[i - 1] == b'\n' || buf[i - 1] == b'\r') {
            if let Some(end) = match_obj_marker(buf, i, obj_num) {
                let ds = find_pattern(buf, b"<<", end)?;
                let range = balanced_dict(buf, ds)?;
                return Some(&buf[range]);
            }
        }
        i += 1;
    }
    None
}

/// Match `obj_num <gen> obj` at `pos`, returning the index past `obj`
fn match_obj_marker(buf: &[u8], pos: usize, obj_num: u32) -> Option<usize> {
    let (num, after_num) = read_uint(buf, pos)?;
    if num != obj_num as u64 || after_num >= buf.len() || !is_pdf_whitespace(buf[after_num]) {
        return None;
    }
    let gen_start = skip_whitespace(buf, after_num);
    let (_, after_gen) = read_uint(buf, gen_start)?;
    if after_gen >= buf.len() || !is_pdf_whitespace(buf[after_gen]) {
        return None;
    }
    let kw = skip_whitespace(buf, after_gen);
    if buf[kw..].starts_with(b"obj") {
        Some(kw + 3)
    } else {
        None
    }
}

/// Minimal tagged object model, sufficient for rewriting page and
/// resources dictionaries.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfAtom {
    /// `<< /Key value ... >>`, key order preserved
    Dict(Vec<(String, PdfAtom)>),
    Array(Vec<PdfAtom>),
    /// `N G R`
    Ref(u32, u16),
    /// `/Name`
    Name(String),
    Int(i64),
    Real(f64),
    /// Raw bytes between the outer parentheses, escape sequences intact
    LiteralStr(Vec<u8>),
    /// Hex digits between `<` and `>`
    HexStr(String),
    /// `true`, `false`, `null`
    Keyword(String),
}

impl PdfAtom {
    /// Tokenize a single object (typically a located dictionary slice)
    pub fn parse(bytes: &[u8]) -> Result<PdfAtom, SealError> {
        let mut pos = 0;
        let atom = parse_value(bytes, &mut pos)?;
        Ok(atom)
    }

    /// Serialize back to PDF syntax
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        write_atom(self, &mut out);
        out
    }

    /// `true` if the serialized form starts with a delimiter and needs no
    /// separating space after a preceding token
    fn starts_with_delimiter(&self) -> bool {
        matches!(
            self,
            PdfAtom::Dict(_)
                | PdfAtom::Array(_)
                | PdfAtom::Name(_)
                | PdfAtom::LiteralStr(_)
                | PdfAtom::HexStr(_)
        )
    }

    pub fn as_dict(&self) -> Option<&Vec<(String, PdfAtom)>> {
        match self {
            PdfAtom::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Vec<(String, PdfAtom)>> {
        match self {
            PdfAtom::Dict(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Get a dictionary entry by key
pub fn dict_get<'a>(entries: &'a [(String, PdfAtom)], key: &str) -> Option<&'a PdfAtom> {
    entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
}

/// Replace or append a dictionary entry, preserving key order
pub fn dict_set(entries: &mut Vec<(String, PdfAtom)>, key: &str, value: PdfAtom) {
    if let Some(slot) = entries.iter_mut().find(|(k, _)| k == key) {
        slot.1 = value;
    } else {
        entries.push((key.to_string(), value));
    }
}

fn parse_value(bytes: &[u8], pos: &mut usize) -> Result<PdfAtom, SealError> {
    skip_ws_and_comments(bytes, pos);
    let b = *bytes
        .get(*pos)
        .ok_or_else(|| syntax("unexpected end of input"))?;

    match b {
        b'<' if bytes.get(*pos + 1) == Some(&b'<') => parse_dict(bytes, pos),
        b'<' => parse_hex_string(bytes, pos),
        b'[' => parse_array(bytes, pos),
        b'/' => parse_name(bytes, pos),
        b'(' => parse_literal_string(bytes, pos),
        b'+' | b'-' | b'.' | b'0'..=b'9' => parse_number_or_ref(bytes, pos),
        _ if b.is_ascii_alphabetic() => parse_keyword(bytes, pos),
        _ => Err(syntax(&format!("unexpected byte 0x{:02x}", b))),
    }
}

fn parse_dict(bytes: &[u8], pos: &mut usize) -> Result<PdfAtom, SealError> {
    *pos += 2; // <<
    let mut entries = Vec::new();
    loop {
        skip_ws_and_comments(bytes, pos);
        if bytes[*pos..].starts_with(b">>") {
            *pos += 2;
            return Ok(PdfAtom::Dict(entries));
        }
        if bytes.get(*pos) != Some(&b'/') {
            return Err(syntax("expected name key in dictionary"));
        }
        let key = read_name(bytes, pos)?;
        let value = parse_value(bytes, pos)?;
        entries.push((key, value));
    }
}

fn parse_array(bytes: &[u8], pos: &mut usize) -> Result<PdfAtom, SealError> {
    *pos += 1; // [
    let mut items = Vec::new();
    loop {
        skip_ws_and_comments(bytes, pos);
        match bytes.get(*pos) {
            Some(b']') => {
                *pos += 1;
                return Ok(PdfAtom::Array(items));
            }
            Some(_) => items.push(parse_value(bytes, pos)?),
            None => return Err(syntax("unterminated array")),
        }
    }
}

fn parse_name(bytes: &[u8], pos: &mut usize) -> Result<PdfAtom, SealError> {
    read_name(bytes, pos).map(PdfAtom::Name)
}

fn read_name(bytes: &[u8], pos: &mut usize) -> Result<String, SealError> {
    *pos += 1; // /
    let start = *pos;
    while *pos < bytes.len() && is_regular(bytes[*pos]) {
        *pos += 1;
    }
    std::str::from_utf8(&bytes[start..*pos])
        .map(str::to_string)
        .map_err(|_| syntax("non-UTF-8 name"))
}

fn parse_literal_string(bytes: &[u8], pos: &mut usize) -> Result<PdfAtom, SealError> {
    *pos += 1; // (
    let start = *pos;
    let mut depth = 1usize;
    while *pos < bytes.len() {
        match bytes[*pos] {
            b'\\' => *pos += 2,
            b'(' => {
                depth += 1;
                *pos += 1;
            }
            b')' => {
                depth -= 1;
                *pos += 1;
                if depth == 0 {
                    return Ok(PdfAtom::LiteralStr(bytes[start..*pos - 1].to_vec()));
                }
            }
            _ => *pos += 1,
        }
    }
    Err(syntax("unterminated literal string"))
}

fn parse_hex_string(bytes: &[u8], pos: &mut usize) -> Result<PdfAtom, SealError> {
    *pos += 1; // <
    let start = *pos;
    while *pos < bytes.len() && bytes[*pos] != b'>' {
        *pos += 1;
    }
    if *pos >= bytes.len() {
        return Err(syntax("unterminated hex string"));
    }
    let hex = std::str::from_utf8(&bytes[start..*pos])
        .map_err(|_| syntax("non-UTF-8 hex string"))?
        .to_string();
    *pos += 1; // >
    Ok(PdfAtom::HexStr(hex))
}

fn parse_keyword(bytes: &[u8], pos: &mut usize) -> Result<PdfAtom, SealError> {
    let start = *pos;
    while *pos < bytes.len() && bytes[*pos].is_ascii_alphabetic() {
        *pos += 1;
    }
    let word = std::str::from_utf8(&bytes[start..*pos])
        .unwrap_or_default()
        .to_string();
    Ok(PdfAtom::Keyword(word))
}

/// Numbers need one token of lookahead: `N G R` is a reference when a
/// second integer and a lone `R` follow.
fn parse_number_or_ref(bytes: &[u8], pos: &mut usize) -> Result<PdfAtom, SealError> {
    let start = *pos;
    if matches!(bytes[*pos], b'+' | b'-') {
        *pos += 1;
    }
    let mut is_real = false;
    while *pos < bytes.len() && (bytes[*pos].is_ascii_digit() || bytes[*pos] == b'.') {
        if bytes[*pos] == b'.' {
            is_real = true;
        }
        *pos += 1;
    }
    let text = std::str::from_utf8(&bytes[start..*pos]).map_err(|_| syntax("bad number"))?;

    if is_real {
        let value: f64 = text.parse().map_err(|_| syntax("bad real number"))?;
        return Ok(PdfAtom::Real(value));
    }
    let value: i64 = text.parse().map_err(|_| syntax("bad integer"))?;

    if value >= 0 {
        let gen_start = skip_whitespace(bytes, *pos);
        if let Some((gen, after_gen)) = read_uint(bytes, gen_start) {
            let r_pos = skip_whitespace(bytes, after_gen);
            if bytes.get(r_pos) == Some(&b'R')
                && bytes
                    .get(r_pos + 1)
                    .map_or(true, |b| !b.is_ascii_alphanumeric())
            {
                *pos = r_pos + 1;
                return Ok(PdfAtom::Ref(value as u32, gen as u16));
            }
        }
    }
    Ok(PdfAtom::Int(value))
}

fn skip_ws_and_comments(bytes: &[u8], pos: &mut usize) {
    loop {
        while *pos < bytes.len() && is_pdf_whitespace(bytes[*pos]) {
            *pos += 1;
        }
        if bytes.get(*pos) == Some(&b'%') {
            while *pos < bytes.len() && bytes[*pos] != b'\n' {
                *pos += 1;
            }
        } else {
            return;
        }
    }
}

fn is_regular(b: u8) -> bool {
    !is_pdf_whitespace(b) && !matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn syntax(msg: &str) -> SealError {
    SealError::SyntaxError(msg.to_string())
}

fn write_atom(atom: &PdfAtom, out: &mut Vec<u8>) {
    match atom {
        PdfAtom::Dict(entries) => {
            out.extend_from_slice(b"<<");
            for (key, value) in entries {
                out.push(b'/');
                out.extend_from_slice(key.as_bytes());
                if !value.starts_with_delimiter() {
                    out.push(b' ');
                }
                write_atom(value, out);
            }
            out.extend_from_slice(b">>");
        }
        PdfAtom::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 && !item.starts_with_delimiter() {
                    out.push(b' ');
                }
                write_atom(item, out);
            }
            out.push(b']');
        }
        PdfAtom::Ref(num, gen) => out.extend_from_slice(format!("{} {} R", num, gen).as_bytes()),
        PdfAtom::Name(n) => {
            out.push(b'/');
            out.extend_from_slice(n.as_bytes());
        }
        PdfAtom::Int(v) => out.extend_from_slice(v.to_string().as_bytes()),
        PdfAtom::Real(v) => out.extend_from_slice(crate::draw::fmt_num(*v).as_bytes()),
        PdfAtom::LiteralStr(raw) => {
            out.push(b'(');
            out.extend_from_slice(raw);
            out.push(b')');
        }
        PdfAtom::HexStr(hex) => {
            out.push(b'<');
            out.extend_from_slice(hex.as_bytes());
            out.push(b'>');
        }
        PdfAtom::Keyword(word) => out.extend_from_slice(word.as_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn locates_object_by_marker() {
        let buf = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n";
        let dict = locate_object_dict(buf, 1).unwrap();
        assert_eq!(dict, b"<< /Type /Catalog /Pages 2 0 R >>");
    }

    #[test]
    fn locator_ignores_embedded_numbers() {
        // "2 0 R" inside object 1 must not be mistaken for "2 0 obj"
        let buf = b"1 0 obj\n<< /Pages 2 0 R >>\nendobj\n2 0 obj\n<< /Type /Pages >>\nendobj\n";
        let dict = locate_object_dict(buf, 2).unwrap();
        assert_eq!(dict, b"<< /Type /Pages >>");
    }

    #[test]
    fn locator_balances_nested_dicts() {
        let buf = b"7 0 obj\n<< /Resources << /XObject << /Im0 3 0 R >> >> /Rotate 0 >>\nendobj\n";
        let dict = locate_object_dict(buf, 7).unwrap();
        assert!(dict.ends_with(b"/Rotate 0 >>"));
    }

    #[test]
    fn missing_object_is_none() {
        assert_eq!(locate_object_dict(b"1 0 obj\n<< >>\nendobj\n", 9), None);
    }

    #[test]
    fn parses_page_dictionary() {
        let dict = b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R >>";
        let atom = PdfAtom::parse(dict).unwrap();
        let entries = atom.as_dict().unwrap();
        assert_eq!(dict_get(entries, "Type"), Some(&PdfAtom::Name("Page".into())));
        assert_eq!(dict_get(entries, "Contents"), Some(&PdfAtom::Ref(4, 0)));
        assert_eq!(
            dict_get(entries, "MediaBox"),
            Some(&PdfAtom::Array(vec![
                PdfAtom::Int(0),
                PdfAtom::Int(0),
                PdfAtom::Int(612),
                PdfAtom::Int(792),
            ]))
        );
    }

    #[test]
    fn parses_literal_string_with_escapes() {
        let atom = PdfAtom::parse(br"(a\(b\)c\\d)").unwrap();
        assert_eq!(atom, PdfAtom::LiteralStr(br"a\(b\)c\\d".to_vec()));
    }

    #[test]
    fn parses_nested_parens_in_string() {
        let atom = PdfAtom::parse(b"(outer (inner) tail)").unwrap();
        assert_eq!(atom, PdfAtom::LiteralStr(b"outer (inner) tail".to_vec()));
    }

    #[test]
    fn reference_lookahead_does_not_eat_plain_ints() {
        let atom = PdfAtom::parse(b"[1 2 3]").unwrap();
        assert_eq!(
            atom,
            PdfAtom::Array(vec![PdfAtom::Int(1), PdfAtom::Int(2), PdfAtom::Int(3)])
        );
    }

    #[test]
    fn serialization_is_reparsable() {
        let dict = b"<< /Type /Page /Kids [3 0 R 4 0 R] /Count 2 /Label (p \\(1\\)) >>";
        let atom = PdfAtom::parse(dict).unwrap();
        let out = atom.serialize();
        let reparsed = PdfAtom::parse(&out).unwrap();
        assert_eq!(atom, reparsed);
    }

    #[test]
    fn dict_set_replaces_in_place() {
        let mut entries = vec![
            ("A".to_string(), PdfAtom::Int(1)),
            ("B".to_string(), PdfAtom::Int(2)),
        ];
        dict_set(&mut entries, "A", PdfAtom::Int(9));
        dict_set(&mut entries, "C", PdfAtom::Int(3));
        assert_eq!(entries[0], ("A".to_string(), PdfAtom::Int(9)));
        assert_eq!(entries.len(), 3);
    }
}
