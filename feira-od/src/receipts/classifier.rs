//! Receipt payload classification
//!
//! Decides what an incoming receipt string is before anything touches the
//! filesystem: an URL to pass through untouched, a data URI with a declared
//! MIME type, raw base64 whose type must be sniffed from magic bytes, or
//! something this module does not recognize at all.

use base64::{engine::general_purpose, Engine as _};

/// URL prefix of receipts already stored by this system. Anything under it is
/// passed through verbatim, never decoded again.
pub const UPLOAD_URL_PREFIX: &str = "/uploads/";

/// Strings this short are never treated as base64; real receipts are far
/// larger and short opaque tokens would otherwise false-positive.
const MIN_BASE64_LEN: usize = 100;

/// Only this many leading characters are decoded for magic-byte sniffing.
const SNIFF_PREFIX_LEN: usize = 100;

/// Outcome of classifying a receipt payload string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// An http(s) URL or an already-stored upload path; must be returned
    /// verbatim by consumers
    PassThroughUrl,
    /// `data:<mime>;base64,<data>` with the declared MIME type and the raw
    /// (still encoded) payload substring
    DataUri { mime: String, data: String },
    /// Plausible raw base64 with a MIME type guessed from magic bytes
    RawBase64 { mime: String, data: String },
    /// Not a URL and not plausible base64; callers treat the value as opaque
    Unrecognized,
}

/// Classify a receipt payload string.
///
/// Classification happens exactly once per ingestion; no branch mutates the
/// input. Decoding failures during sniffing classify as `Unrecognized`
/// rather than erroring.
pub fn classify(input: &str) -> Classification {
    if input.is_empty() {
        return Classification::Unrecognized;
    }

    if let Some((mime, data)) = parse_data_uri(input) {
        return Classification::DataUri {
            mime: mime.to_string(),
            data: data.to_string(),
        };
    }

    if input.starts_with("http://")
        || input.starts_with("https://")
        || input.starts_with(UPLOAD_URL_PREFIX)
    {
        return Classification::PassThroughUrl;
    }

    let cleaned = strip_wrapping(input);
    if cleaned.len() <= MIN_BASE64_LEN || !cleaned.bytes().all(is_base64_byte) {
        return Classification::Unrecognized;
    }

    // Only the leading bytes are needed to identify the format
    match general_purpose::STANDARD.decode(&cleaned[..SNIFF_PREFIX_LEN]) {
        Ok(head) => Classification::RawBase64 {
            mime: sniff_mime(&head).to_string(),
            data: cleaned,
        },
        Err(_) => Classification::Unrecognized,
    }
}

/// Parse `data:<mime>;base64,<payload>`.
///
/// The MIME part must be non-empty and must not itself contain `;` (media
/// type parameters such as `charset=` are not part of this wire format).
fn parse_data_uri(input: &str) -> Option<(&str, &str)> {
    let rest = input.strip_prefix("data:")?;
    let (mime, data) = rest.split_once(";base64,")?;
    if mime.is_empty() || mime.contains(';') || data.is_empty() {
        return None;
    }
    Some((mime, data))
}

/// Remove the wrapping characters e-mail clients and front-ends introduce
/// when shuttling base64 around: spaces, newlines, carriage returns.
pub(crate) fn strip_wrapping(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, ' ' | '\n' | '\r'))
        .collect()
}

fn is_base64_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'='
}

/// Identify a binary format from its leading bytes.
///
/// Unknown formats fall back to a generic binary type; sniffing never fails
/// outright.
pub fn sniff_mime(head: &[u8]) -> &'static str {
    if head.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if head.starts_with(&[0xff, 0xd8]) {
        "image/jpeg"
    } else if head.starts_with(b"%PDF") {
        "application/pdf"
    } else if head.starts_with(b"GIF8") {
        "image/gif"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};

    /// Base64 of `header` padded with zero bytes, long enough to pass the
    /// plausibility length check.
    fn long_base64(header: &[u8]) -> String {
        let mut bytes = header.to_vec();
        bytes.resize(90, 0);
        general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn test_http_url_passes_through() {
        assert_eq!(
            classify("http://example.com/receipt.png"),
            Classification::PassThroughUrl
        );
        assert_eq!(
            classify("https://example.com/receipt.png"),
            Classification::PassThroughUrl
        );
    }

    #[test]
    fn test_existing_upload_passes_through() {
        assert_eq!(
            classify("/uploads/comprovantes/abc.png"),
            Classification::PassThroughUrl
        );
    }

    #[test]
    fn test_data_uri_captures_mime_and_payload() {
        let classification = classify("data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(
            classification,
            Classification::DataUri {
                mime: "image/png".to_string(),
                data: "iVBORw0KGgo=".to_string(),
            }
        );
    }

    #[test]
    fn test_data_uri_with_mime_parameters_is_not_a_data_uri() {
        // `data:` strings that fail the grammar fall through; the colon then
        // disqualifies them from the base64 check
        let classification = classify("data:text/plain;charset=utf-8;base64,aGVsbG8=");
        assert_eq!(classification, Classification::Unrecognized);
    }

    #[test]
    fn test_empty_input_unrecognized() {
        assert_eq!(classify(""), Classification::Unrecognized);
    }

    #[test]
    fn test_short_base64_unrecognized() {
        // Valid base64, but far below the plausibility threshold
        assert_eq!(classify("aGVsbG8="), Classification::Unrecognized);
    }

    #[test]
    fn test_exactly_100_chars_unrecognized() {
        let s = "A".repeat(100);
        assert_eq!(classify(&s), Classification::Unrecognized);
    }

    #[test]
    fn test_disallowed_characters_unrecognized() {
        let mut s = "A".repeat(150);
        s.push('!');
        assert_eq!(classify(&s), Classification::Unrecognized);
    }

    #[test]
    fn test_png_magic_bytes() {
        let encoded = long_base64(b"\x89PNG\r\n\x1a\n");
        match classify(&encoded) {
            Classification::RawBase64 { mime, data } => {
                assert_eq!(mime, "image/png");
                assert_eq!(data, encoded);
            }
            other => panic!("expected RawBase64, got {:?}", other),
        }
    }

    #[test]
    fn test_jpeg_magic_bytes() {
        let encoded = long_base64(&[0xff, 0xd8, 0xff, 0xe0]);
        match classify(&encoded) {
            Classification::RawBase64 { mime, .. } => assert_eq!(mime, "image/jpeg"),
            other => panic!("expected RawBase64, got {:?}", other),
        }
    }

    #[test]
    fn test_pdf_magic_bytes() {
        let encoded = long_base64(b"%PDF-1.4");
        match classify(&encoded) {
            Classification::RawBase64 { mime, .. } => assert_eq!(mime, "application/pdf"),
            other => panic!("expected RawBase64, got {:?}", other),
        }
    }

    #[test]
    fn test_gif_magic_bytes() {
        let encoded = long_base64(b"GIF89a");
        match classify(&encoded) {
            Classification::RawBase64 { mime, .. } => assert_eq!(mime, "image/gif"),
            other => panic!("expected RawBase64, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_magic_bytes_fall_back_to_octet_stream() {
        let encoded = long_base64(b"NOPE");
        match classify(&encoded) {
            Classification::RawBase64 { mime, .. } => {
                assert_eq!(mime, "application/octet-stream")
            }
            other => panic!("expected RawBase64, got {:?}", other),
        }
    }

    #[test]
    fn test_wrapped_base64_is_cleaned() {
        let encoded = long_base64(b"\x89PNG\r\n\x1a\n");
        // Insert line breaks the way mail clients wrap payloads
        let wrapped = format!("{}\n{}\r\n {}", &encoded[..40], &encoded[40..80], &encoded[80..]);
        match classify(&wrapped) {
            Classification::RawBase64 { mime, data } => {
                assert_eq!(mime, "image/png");
                assert_eq!(data, encoded);
            }
            other => panic!("expected RawBase64, got {:?}", other),
        }
    }

    #[test]
    fn test_sniff_mime_direct() {
        assert_eq!(
            sniff_mime(&[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a]),
            "image/png"
        );
        assert_eq!(sniff_mime(b"random bytes"), "application/octet-stream");
    }
}
