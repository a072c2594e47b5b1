//! Content-Transfer-Encoding decoders and byte-to-text conversion.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;

/// Decode a body according to its `Content-Transfer-Encoding` value.
///
/// An empty or unknown encoding returns the input unchanged. Base64 decode
/// failures are logged and the original (still-encoded) content is returned
/// so a broken part never aborts the parse.
pub fn decode_body(content: &str, encoding: &str) -> String {
    match encoding.trim().to_ascii_lowercase().as_str() {
        "base64" => match decode_base64(content) {
            Some(bytes) => bytes_to_text(&bytes),
            None => {
                warn!("Failed to decode base64 body, keeping raw content");
                content.to_string()
            }
        },
        "quoted-printable" => bytes_to_text(&decode_quoted_printable(content)),
        _ => content.to_string(),
    }
}

/// Decode quoted-printable content to bytes.
///
/// Soft line breaks (`=` at end of line) are removed, then every `=XX` hex
/// escape becomes the corresponding byte. A `=` not followed by a line
/// ending or two hex digits stays literal, which makes this a no-op on any
/// input without `=`.
pub fn decode_quoted_printable(content: &str) -> Vec<u8> {
    let bytes = content.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'=' {
            // Soft line break: "=\n" or "=\r\n"
            if bytes.get(i + 1) == Some(&b'\n') {
                i += 2;
                continue;
            }
            if bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n') {
                i += 3;
                continue;
            }
            // Hex escape: "=XX"
            if i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit()
            {
                let hex = &content[i + 1..i + 3];
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    out
}

/// Strip whitespace and decode base64 content to bytes.
pub fn decode_base64(content: &str) -> Option<Vec<u8>> {
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned.as_bytes()).ok()
}

/// Convert decoded bytes to text.
///
/// UTF-8 first; anything else is read as Windows-1252, which accepts every
/// byte, so 8-bit content (e.g. quoted-printable `=E9`) survives display
/// without per-charset transcoding.
pub fn bytes_to_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Convert raw message bytes to text, stripping a UTF-8 BOM if present.
pub fn decode_message_bytes(data: &[u8]) -> String {
    let data = if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    };
    bytes_to_text(data)
}
