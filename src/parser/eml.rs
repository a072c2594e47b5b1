//! Top-level EML parsing: from raw message text (or file) to [`ParsedEmail`].

use std::path::Path;

use crate::error::{EmlError, Result};
use crate::model::email::ParsedEmail;
use crate::parser::decode::{decode_body, decode_message_bytes};
use crate::parser::header::{decode_encoded_words, normalize_address_field, parse_header_block};
use crate::parser::mime::{collect_multipart, extract_boundary, filter_attachments, BodyContent};

/// Parse a complete RFC 5322 message into a [`ParsedEmail`].
///
/// This never fails: structurally absent pieces fall back to documented
/// defaults and per-part decode failures degrade to the raw content, so a
/// malformed part cannot abort the message parse.
pub fn parse_message(raw: &str) -> ParsedEmail {
    let lines: Vec<&str> = raw.lines().collect();
    let (headers, body_start) = parse_header_block(&lines);
    let body_start = body_start.min(lines.len());

    let content_type = headers.get_or_empty("content-type");
    let mut content = BodyContent::default();

    // A multipart Content-Type with a recoverable boundary gets split into
    // parts; everything else (including multipart with a missing boundary)
    // is treated as one single-part body.
    if let Some(boundary) = extract_boundary(content_type) {
        let body = lines[body_start..].join("\n");
        collect_multipart(&body, &boundary, &mut content, 0);
    } else {
        let body = lines[body_start..].join("\n");
        let encoding = headers.get_or_empty("content-transfer-encoding");
        let decoded = decode_body(&body, encoding);
        if content_type.to_ascii_lowercase().contains("text/html") {
            content.html = decoded;
        } else {
            content.text = decoded;
        }
    }

    let attachments = filter_attachments(content.attachments);

    let from = normalize_address_field(headers.get_or_empty("from"));
    let to = normalize_address_field(headers.get_or_empty("to"));
    let cc = normalize_address_field(headers.get_or_empty("cc"));
    let subject = decode_encoded_words(headers.get_or_empty("subject"));

    ParsedEmail {
        from: if from.is_empty() {
            "Unknown".to_string()
        } else {
            from
        },
        to,
        cc,
        subject: if subject.is_empty() {
            "No Subject".to_string()
        } else {
            subject
        },
        date: headers.get_or_empty("date").to_string(),
        text: content.text,
        html: content.html,
        attachments,
    }
}

/// Parse a message from raw bytes.
///
/// Bytes are read as UTF-8 with a Windows-1252 fallback (and BOM stripping),
/// so any byte sequence yields a parseable string.
pub fn parse_message_bytes(data: &[u8]) -> ParsedEmail {
    parse_message(&decode_message_bytes(data))
}

/// Read and parse a single `.eml` file.
///
/// The only fallible step is reading the file; the parse itself is
/// best-effort per [`parse_message`].
pub fn parse_eml_file(path: impl AsRef<Path>) -> Result<ParsedEmail> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            EmlError::FileNotFound(path.to_path_buf())
        } else {
            EmlError::io(path, e)
        }
    })?;

    Ok(parse_message_bytes(&data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_single_part() {
        let email = parse_message("From: a@x.com\nSubject: Hi\n\nHello there\n");
        assert_eq!(email.from, "a@x.com");
        assert_eq!(email.subject, "Hi");
        assert_eq!(email.text, "Hello there");
        assert_eq!(email.html, "");
        assert!(email.attachments.is_empty());
    }

    #[test]
    fn test_defaults_for_missing_headers() {
        let email = parse_message("X-Nothing: here\n\nbody\n");
        assert_eq!(email.from, "Unknown");
        assert_eq!(email.subject, "No Subject");
        assert_eq!(email.to, "");
        assert_eq!(email.cc, "");
        assert_eq!(email.date, "");
    }

    #[test]
    fn test_single_part_html() {
        let email =
            parse_message("Content-Type: text/html; charset=utf-8\n\n<p>Hello</p>\n");
        assert_eq!(email.html, "<p>Hello</p>");
        assert_eq!(email.text, "");
    }

    #[test]
    fn test_single_part_quoted_printable() {
        let email = parse_message(
            "Content-Transfer-Encoding: quoted-printable\n\nCaf=E9\n",
        );
        assert_eq!(email.text, "Caf\u{e9}");
    }

    #[test]
    fn test_empty_input() {
        let email = parse_message("");
        assert_eq!(email.from, "Unknown");
        assert_eq!(email.subject, "No Subject");
        assert_eq!(email.text, "");
    }

    #[test]
    fn test_headers_only_no_blank_line() {
        let email = parse_message("From: a@x.com\nSubject: All headers");
        assert_eq!(email.from, "a@x.com");
        assert_eq!(email.subject, "All headers");
        assert_eq!(email.text, "");
    }

    #[test]
    fn test_multipart_without_boundary_falls_back_to_single_part() {
        let email = parse_message("Content-Type: multipart/mixed\n\nplain body\n");
        assert_eq!(email.text, "plain body");
    }

    #[test]
    fn test_encoded_subject() {
        let email = parse_message("Subject: =?UTF-8?B?SGVsbG8=?=\n\n\n");
        assert_eq!(email.subject, "Hello");
    }

    #[test]
    fn test_crlf_and_lf_agree() {
        let lf = parse_message("From: a@x.com\nSubject: Hi\n\nBody\n");
        let crlf = parse_message("From: a@x.com\r\nSubject: Hi\r\n\r\nBody\r\n");
        assert_eq!(lf.from, crlf.from);
        assert_eq!(lf.subject, crlf.subject);
        assert_eq!(lf.text, crlf.text);
    }

    #[test]
    fn test_parse_bytes_with_8bit_content() {
        let email = parse_message_bytes(b"Subject: caf\xE9\n\nbody\n");
        assert_eq!(email.subject, "caf\u{e9}");
    }
}
