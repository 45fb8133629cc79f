//! Signature payload encoding: the attachment text, its field grammar,
//! and the verification URLs carried in the QR code.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Characters left bare by `encodeURIComponent`; everything else
/// non-alphanumeric is percent-escaped. Verifier frontends decode the
/// QR URL with the matching rules.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// NFC normalization. Applied to every user-supplied string before it
/// is signed or compared, so visually identical input signs identically
/// regardless of how the platform composed it.
pub fn nfc(s: &str) -> String {
    s.nfc().collect()
}

pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, URI_COMPONENT).to_string()
}

/// The five fields carried in the `/SignatureData` attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedData {
    /// Unix timestamp of signing.
    pub date: i64,
    pub signature: String,
    pub number: String,
    pub recipient: String,
    pub title: String,
}

/// Render the attachment text: one `Key: value` line per field.
pub fn encode_attachment(data: &ExtractedData) -> String {
    format!(
        "Date: {}\nSignature: {}\nNumber: {}\nRecipient: {}\nTitle: {}",
        data.date, data.signature, data.number, data.recipient, data.title
    )
}

/// Parse attachment text back into its fields. All five must be present
/// and non-empty (a zero date counts as missing).
pub fn extract_fields(text: &str) -> Option<ExtractedData> {
    let mut date = 0i64;
    let mut signature = String::new();
    let mut number = String::new();
    let mut recipient = String::new();
    let mut title = String::new();

    for line in text.lines() {
        if let Some(v) = line.strip_prefix("Date: ") {
            date = v.parse().unwrap_or(0);
        } else if let Some(v) = line.strip_prefix("Signature: ") {
            signature = v.to_string();
        } else if let Some(v) = line.strip_prefix("Number: ") {
            number = v.to_string();
        } else if let Some(v) = line.strip_prefix("Recipient: ") {
            recipient = v.to_string();
        } else if let Some(v) = line.strip_prefix("Title: ") {
            title = v.to_string();
        }
    }

    if date != 0 && !signature.is_empty() && !number.is_empty() && !recipient.is_empty() && !title.is_empty()
    {
        Some(ExtractedData {
            date,
            signature,
            number,
            recipient,
            title,
        })
    } else {
        None
    }
}

/// QR URL for hybrid mode: every signed field rides in the query string
/// so the verifier page can prefill before the document is uploaded.
pub fn hybrid_verify_url(base: &str, data: &ExtractedData, hash: &str) -> String {
    format!(
        "{}/verify?signature={}&date={}&hash={}&number={}&recipient={}&title={}",
        base,
        encode_component(&data.signature),
        data.date,
        encode_component(hash),
        encode_component(&data.number),
        encode_component(&data.recipient),
        encode_component(&data.title),
    )
}

/// QR URL for full-onchain mode: the hash alone, everything else lives
/// in contract storage.
pub fn onchain_verify_url(base: &str, hash: &str) -> String {
    format!("{}/full/verify?hash={}", base, encode_component(hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> ExtractedData {
        ExtractedData {
            date: 1700000000,
            signature: format!("0x{}", "ab".repeat(65)),
            number: "SK-042/2026".to_string(),
            recipient: "Ana Suryani".to_string(),
            title: "Surat Keputusan".to_string(),
        }
    }

    #[test]
    fn attachment_round_trips() {
        let data = sample();
        let text = encode_attachment(&data);
        assert_eq!(extract_fields(&text), Some(data));
    }

    #[test]
    fn missing_field_yields_none() {
        let text = "Date: 1700000000\nSignature: 0xab\nNumber: 1\nRecipient: A";
        assert_eq!(extract_fields(text), None);
    }

    #[test]
    fn zero_date_counts_as_missing() {
        let text = "Date: 0\nSignature: 0xab\nNumber: 1\nRecipient: A\nTitle: T";
        assert_eq!(extract_fields(text), None);
    }

    #[test]
    fn unknown_lines_are_ignored() {
        let text = format!("X-Extra: hi\n{}\nTrailing garbage", encode_attachment(&sample()));
        assert_eq!(extract_fields(&text), Some(sample()));
    }

    #[test]
    fn nfc_composes_decomposed_input() {
        // "é" as e + combining acute composes to a single scalar
        assert_eq!(nfc("Jos\u{0065}\u{0301}"), "Jos\u{00e9}");
        assert_eq!(nfc("plain"), "plain");
    }

    #[test]
    fn encoding_matches_encode_uri_component() {
        assert_eq!(encode_component("a b&c=d"), "a%20b%26c%3Dd");
        assert_eq!(encode_component("keep-_.!~*'()"), "keep-_.!~*'()");
        assert_eq!(encode_component("Ana/β"), "Ana%2F%CE%B2");
    }

    #[test]
    fn hybrid_url_carries_all_fields() {
        let url = hybrid_verify_url("https://sign.example", &sample(), "0xdead");
        assert!(url.starts_with("https://sign.example/verify?signature=0x"));
        assert!(url.contains("&date=1700000000&"));
        assert!(url.contains("&hash=0xdead&"));
        assert!(url.contains("&number=SK-042%2F2026&"));
        assert!(url.contains("&recipient=Ana%20Suryani&"));
        assert!(url.ends_with("&title=Surat%20Keputusan"));
    }

    #[test]
    fn onchain_url_is_hash_only() {
        assert_eq!(
            onchain_verify_url("https://sign.example", "0xbeef"),
            "https://sign.example/full/verify?hash=0xbeef"
        );
    }
}
