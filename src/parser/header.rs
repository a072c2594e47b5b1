//! RFC 5322 header parsing: the header block, folding, encoded-words
//! (RFC 2047), address fields, and date parsing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

use crate::parser::decode::{bytes_to_text, decode_quoted_printable};

/// Ordered header map with lowercased, unique keys.
///
/// A repeated header name overwrites the stored value (the entry keeps its
/// original position); folded continuation lines append to the value of the
/// header they follow. Lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    /// Get a header value by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header value, or `""` when absent.
    pub fn get_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: String, value: String) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    fn append_folded(&mut self, key: &str, continuation: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1.push(' ');
            entry.1.push_str(continuation);
        }
    }
}

/// Parse a header block from the start of `lines`.
///
/// Returns the map and the index of the first body line (the line after the
/// blank separator). A line whose name matches `[A-Za-z-]+:` starts a header;
/// a line starting with whitespace continues the previous one; anything else
/// before the blank line is malformed and dropped silently. When no blank
/// line exists the whole input is headers and the body is empty.
pub fn parse_header_block(lines: &[&str]) -> (HeaderMap, usize) {
    let mut headers = HeaderMap::default();
    let mut current: Option<String> = None;

    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            return (headers, i + 1);
        }

        if let Some(colon) = header_name_end(line) {
            let key = line[..colon].trim().to_ascii_lowercase();
            let value = line[colon + 1..].trim().to_string();
            headers.insert(key.clone(), value);
            current = Some(key);
        } else if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(key) = &current {
                headers.append_folded(key, line.trim());
            }
        }
    }

    let body_start = lines.len();
    (headers, body_start)
}

/// If the line begins a new header (one or more `[A-Za-z-]` name characters
/// immediately followed by a colon), return the colon's position.
fn header_name_end(line: &str) -> Option<usize> {
    match line.find(':') {
        Some(0) | None => None,
        Some(colon) => line[..colon]
            .bytes()
            .all(|b| b.is_ascii_alphabetic() || b == b'-')
            .then_some(colon),
    }
}

/// Decode RFC 2047 encoded-words in a header value.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= mundo"` → `"Hola mundo"`
///
/// Each `=?charset?B|Q?text?=` token is decoded independently; literal text
/// between tokens is preserved as-is. If a token fails to decode, its
/// original text is kept. The declared charset is not used for transcoding
/// (ASCII/UTF-8 input assumed); non-UTF-8 byte sequences fall back to a
/// Windows-1252 interpretation so nothing is lost.
pub fn decode_encoded_words(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut remaining = input;

    while let Some(start) = remaining.find("=?") {
        result.push_str(&remaining[..start]);
        let after_marker = &remaining[start + 2..];

        match try_decode_one_word(after_marker) {
            Some((text, consumed)) => {
                result.push_str(&text);
                remaining = &after_marker[consumed..];
            }
            None => {
                result.push_str("=?");
                remaining = after_marker;
            }
        }
    }

    result.push_str(remaining);
    result
}

/// Decode one encoded word starting just after its `=?` marker.
///
/// Returns the decoded text and the number of bytes consumed (through the
/// closing `?=`), or `None` if the token is malformed or fails to decode.
fn try_decode_one_word(s: &str) -> Option<(String, usize)> {
    // Format: charset?encoding?encoded_text?=
    let first_q = s.find('?')?;
    let _charset = &s[..first_q];

    let rest = &s[first_q + 1..];
    let second_q = rest.find('?')?;
    let encoding = &rest[..second_q];

    let payload = &rest[second_q + 1..];
    let end = payload.find("?=")?;
    let encoded_text = &payload[..end];

    let consumed = first_q + 1 + second_q + 1 + end + 2;

    let bytes = if encoding.eq_ignore_ascii_case("B") {
        STANDARD.decode(encoded_text.as_bytes()).ok()?
    } else if encoding.eq_ignore_ascii_case("Q") {
        decode_quoted_printable(&encoded_text.replace('_', " "))
    } else {
        return None;
    };

    Some((bytes_to_text(&bytes), consumed))
}

/// Normalize an address header value (`From`/`To`/`Cc`) for display.
///
/// Encoded words are decoded first. A comma-separated list is split, each
/// piece trimmed, and rejoined with `", "`. Splitting does NOT respect
/// commas inside quoted display names: `"Doe, Jane" <jane@x.com>` becomes
/// two pieces. Known limitation, kept deliberately; see DESIGN.md.
/// An empty input yields an empty output.
pub fn normalize_address_field(raw: &str) -> String {
    let decoded = decode_encoded_words(raw);
    if decoded.contains(',') {
        decoded
            .split(',')
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        decoded.trim().to_string()
    }
}

/// Parse an email date string in common formats.
///
/// Supports RFC 2822, ISO 8601, and several broken real-world variants.
/// Display-side helper only: the parsed message keeps the raw header value.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    // Remove leading day-of-week: "Thu, " or "Thu "
    let no_dow = strip_day_of_week(trimmed);

    let formats = [
        "%d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M:%S %Z",
        "%d %b %Y %H:%M:%S",
        "%b %d %H:%M:%S %Y",
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S",
    ];

    for fmt in &formats {
        if let Ok(dt) = DateTime::parse_from_str(&no_dow, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(ndt) = NaiveDateTime::parse_from_str(&no_dow, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    // Replace named timezones with offsets and try again
    let replaced = replace_named_tz(&no_dow);
    for fmt in &formats {
        if let Ok(dt) = DateTime::parse_from_str(&replaced, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    warn!(date = trimmed, "Could not parse date");
    None
}

/// Strip leading day-of-week prefix (e.g. "Thu, " or "Thu ").
fn strip_day_of_week(s: &str) -> String {
    let days = [
        "Mon,", "Tue,", "Wed,", "Thu,", "Fri,", "Sat,", "Sun,", "Mon ", "Tue ", "Wed ", "Thu ",
        "Fri ", "Sat ", "Sun ",
    ];
    for day in &days {
        if let Some(rest) = s.strip_prefix(day) {
            return rest.trim().to_string();
        }
    }
    s.to_string()
}

/// Replace well-known timezone abbreviations with numeric offsets.
fn replace_named_tz(s: &str) -> String {
    let tzs = [
        ("EST", "-0500"),
        ("EDT", "-0400"),
        ("CST", "-0600"),
        ("CDT", "-0500"),
        ("MST", "-0700"),
        ("MDT", "-0600"),
        ("PST", "-0800"),
        ("PDT", "-0700"),
        ("GMT", "+0000"),
        ("UTC", "+0000"),
        ("CET", "+0100"),
        ("CEST", "+0200"),
        ("JST", "+0900"),
    ];
    let mut result = s.to_string();
    for (name, offset) in &tzs {
        if result.ends_with(name) {
            let pos = result.len() - name.len();
            result.replace_range(pos.., offset);
            return result;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_keys_case_insensitive() {
        let lines = ["SUBJECT: A", "", "body"];
        let (headers, _) = parse_header_block(&lines);
        assert_eq!(headers.get("subject"), Some("A"));
        assert_eq!(headers.get("Subject"), Some("A"));
    }

    #[test]
    fn test_repeated_header_overwrites() {
        let lines = ["Received: first", "Received: second", "", "body"];
        let (headers, _) = parse_header_block(&lines);
        assert_eq!(headers.get("received"), Some("second"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_folded_header_reconstruction() {
        let lines = ["Subject: Hello", " World", "", "body"];
        let (headers, body_start) = parse_header_block(&lines);
        assert_eq!(headers.get("subject"), Some("Hello World"));
        assert_eq!(body_start, 3);
    }

    #[test]
    fn test_tab_continuation() {
        let lines = ["Subject: This is a long", "\tsubject line", "", ""];
        let (headers, _) = parse_header_block(&lines);
        assert_eq!(headers.get("subject"), Some("This is a long subject line"));
    }

    #[test]
    fn test_malformed_line_dropped() {
        let lines = ["From: a@x.com", "this line has no colon", "To: b@x.com", ""];
        let (headers, _) = parse_header_block(&lines);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("from"), Some("a@x.com"));
        assert_eq!(headers.get("to"), Some("b@x.com"));
    }

    #[test]
    fn test_no_blank_line_means_all_headers() {
        let lines = ["From: a@x.com", "Subject: Hi"];
        let (headers, body_start) = parse_header_block(&lines);
        assert_eq!(headers.len(), 2);
        assert_eq!(body_start, 2);
    }

    #[test]
    fn test_header_start_rule() {
        assert!(header_name_end("Content-Type: text/plain").is_some());
        assert!(header_name_end("X-Custom-Header: v").is_some());
        assert!(header_name_end(": empty name").is_none());
        assert!(header_name_end("no colon here").is_none());
        assert!(header_name_end("bad header: has spaces in name").is_none());
    }

    #[test]
    fn test_decode_base64_encoded_word() {
        assert_eq!(decode_encoded_words("=?UTF-8?B?SGVsbG8=?="), "Hello");
    }

    #[test]
    fn test_decode_q_encoded_word() {
        assert_eq!(decode_encoded_words("=?ISO-8859-1?Q?caf=E9?="), "café");
    }

    #[test]
    fn test_decode_q_underscores_become_spaces() {
        assert_eq!(
            decode_encoded_words("=?UTF-8?Q?Hello_world?="),
            "Hello world"
        );
    }

    #[test]
    fn test_decode_preserves_literal_text_between_tokens() {
        assert_eq!(
            decode_encoded_words("Re: =?UTF-8?B?SG9sYQ==?= there"),
            "Re: Hola there"
        );
        // Whitespace between two adjacent tokens is literal text and survives.
        assert_eq!(
            decode_encoded_words("=?UTF-8?B?SGVsbG8=?= =?UTF-8?B?d29ybGQ=?="),
            "Hello world"
        );
    }

    #[test]
    fn test_decode_failure_leaves_original() {
        // "!!!" is not valid base64, so the token stays as-is.
        let input = "=?UTF-8?B?!!!?=";
        assert_eq!(decode_encoded_words(input), input);
        // Unknown encoding letter likewise.
        let input = "=?UTF-8?X?abc?=";
        assert_eq!(decode_encoded_words(input), input);
    }

    #[test]
    fn test_decode_plain_passthrough() {
        assert_eq!(decode_encoded_words("Normal subject"), "Normal subject");
        assert_eq!(decode_encoded_words("50% =? done"), "50% =? done");
    }

    #[test]
    fn test_normalize_address_single() {
        assert_eq!(
            normalize_address_field("  Alice <alice@example.com> "),
            "Alice <alice@example.com>"
        );
    }

    #[test]
    fn test_normalize_address_list() {
        assert_eq!(
            normalize_address_field("a@x.com ,  b@x.com,c@x.com"),
            "a@x.com, b@x.com, c@x.com"
        );
    }

    #[test]
    fn test_normalize_address_encoded() {
        assert_eq!(
            normalize_address_field("=?UTF-8?B?Sm9zw6k=?= <jose@example.com>"),
            "José <jose@example.com>"
        );
    }

    #[test]
    fn test_normalize_address_quoted_comma_stays_naive() {
        // Known limitation carried over: the comma inside the quoted display
        // name is treated as a list separator.
        assert_eq!(
            normalize_address_field("\"Doe, Jane\" <jane@x.com>"),
            "\"Doe, Jane\" <jane@x.com>"
        );
    }

    #[test]
    fn test_normalize_address_empty() {
        assert_eq!(normalize_address_field(""), "");
    }

    #[test]
    fn test_parse_date_rfc2822() {
        let dt = parse_date("Thu, 04 Jan 2024 10:00:00 +0000").unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-01-04");
    }

    #[test]
    fn test_parse_date_without_dow() {
        assert!(parse_date("04 Jan 2024 10:00:00 +0000").is_some());
    }

    #[test]
    fn test_parse_date_named_tz() {
        assert!(parse_date("Thu, 04 Jan 2024 10:00:00 EST").is_some());
    }

    #[test]
    fn test_parse_date_iso8601() {
        assert!(parse_date("2024-01-04T10:00:00Z").is_some());
    }

    #[test]
    fn test_parse_date_empty() {
        assert!(parse_date("").is_none());
        assert!(parse_date("   ").is_none());
    }
}
