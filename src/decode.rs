//! Byte decoding with a deterministic fallback chain.
//!
//! EPUB mandates UTF-8 or UTF-16 for content documents, but files in the
//! wild ship whatever their producer felt like. Decoding therefore never
//! fails: strict UTF-8 first, then strict UTF-16, then a statistical guess
//! with replacement characters for anything still unmappable.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};

/// UTF-8 BOM: EF BB BF
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
/// UTF-16 LE BOM: FF FE
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
/// UTF-16 BE BOM: FE FF
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Outcome of decoding a byte buffer.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub text: String,
    /// The encoding that produced the text.
    pub encoding: &'static Encoding,
    /// True when unmappable sequences were replaced with U+FFFD.
    pub lossy: bool,
}

/// Decode raw bytes into text. Never fails.
///
/// 1. Strict UTF-8 (BOM tolerated and stripped).
/// 2. Strict UTF-16: a BOM selects the byte order, otherwise little-endian
///    is assumed. Odd lengths and unpaired surrogates fail this step.
/// 3. Statistical detection over the whole buffer, decoded with the guessed
///    encoding and U+FFFD for unmappable sequences.
pub fn decode(bytes: &[u8]) -> Decoded {
    if let Ok(text) = std::str::from_utf8(strip_bom(bytes)) {
        return Decoded {
            text: text.to_string(),
            encoding: UTF_8,
            lossy: false,
        };
    }

    let (utf16, payload) = if bytes.starts_with(UTF16_LE_BOM) {
        (UTF_16LE, &bytes[2..])
    } else if bytes.starts_with(UTF16_BE_BOM) {
        (UTF_16BE, &bytes[2..])
    } else {
        (UTF_16LE, bytes)
    };
    if let Some(text) = utf16.decode_without_bom_handling_and_without_replacement(payload) {
        return Decoded {
            text: text.into_owned(),
            encoding: utf16,
            lossy: false,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let guessed = detector.guess(None, true);
    let (text, encoding, had_errors) = guessed.decode(bytes);
    Decoded {
        text: text.into_owned(),
        encoding,
        lossy: had_errors,
    }
}

/// Strip UTF-8 BOM (byte order mark) if present
fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(UTF8_BOM) {
        &data[3..]
    } else {
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        let decoded = decode("Hello, World!".as_bytes());
        assert_eq!(decoded.text, "Hello, World!");
        assert_eq!(decoded.encoding, UTF_8);
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_decode_utf8_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("caf\u{e9}".as_bytes());
        let decoded = decode(&bytes);
        assert_eq!(decoded.text, "caf\u{e9}");
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_decode_empty() {
        let decoded = decode(b"");
        assert_eq!(decoded.text, "");
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_decode_utf16_le_bom() {
        // "hi" in UTF-16 LE with BOM
        let bytes = [0xFF, 0xFE, b'h', 0x00, b'i', 0x00];
        let decoded = decode(&bytes);
        assert_eq!(decoded.text, "hi");
        assert_eq!(decoded.encoding, UTF_16LE);
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_decode_utf16_be_bom() {
        let bytes = [0xFE, 0xFF, 0x00, b'h', 0x00, b'i'];
        let decoded = decode(&bytes);
        assert_eq!(decoded.text, "hi");
        assert_eq!(decoded.encoding, UTF_16BE);
        assert!(!decoded.lossy);
    }

    #[test]
    fn test_decode_legacy_codepage() {
        // Windows-1252 "café". Odd length, so the strict UTF-16 attempt
        // fails and the detector takes over.
        let bytes = b"This is a caf\xe9 in town!";
        assert_eq!(bytes.len() % 2, 1);
        let decoded = decode(bytes);
        assert!(decoded.text.contains("caf\u{e9}"), "got: {}", decoded.text);
    }

    #[test]
    fn test_decode_never_fails_on_garbage() {
        let garbage: Vec<u8> = (0..=255).rev().collect();
        let decoded = decode(&garbage);
        assert!(!decoded.text.is_empty());
    }
}
