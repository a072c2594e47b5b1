//! MIME multipart handling: boundary extraction, part splitting,
//! classification into body text / HTML / attachments, and the
//! HTML-to-text conversion used for terminal display.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use percent_encoding::percent_decode_str;
use tracing::{debug, warn};

use crate::model::attachment::Attachment;
use crate::parser::decode::{decode_body, decode_quoted_printable};
use crate::parser::header::{parse_header_block, HeaderMap};

/// Maximum depth for recursive multipart descent. Boundaries are
/// sender-controlled, so the recursion must be bounded.
const MAX_DEPTH: usize = 10;

/// Parts whose filename resolved to nothing (or the generic placeholder)
/// and whose body is shorter than this are MIME structural noise, not
/// attachments (e.g. signature boundary stubs).
const NOISE_BODY_THRESHOLD: usize = 500;

/// One raw MIME part: its header block and the body text that follows it.
#[derive(Debug, Clone)]
pub struct MimePart {
    pub headers: HeaderMap,
    pub body: String,
}

/// Classified outcome of a single part. Exactly one variant per part.
#[derive(Debug, Clone)]
pub enum PartContent {
    /// A `text/plain` (or other non-HTML inline) body.
    Text { content: String },
    /// A `text/html` body.
    Html { content: String },
    /// An attachment candidate, payload already normalized.
    Attachment(Attachment),
}

/// Accumulated bodies and attachments of a message.
///
/// When several parts map to the same kind, the last one wins; attachments
/// accumulate in document order.
#[derive(Debug, Clone, Default)]
pub struct BodyContent {
    pub text: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

/// Extract the `boundary` parameter from a `Content-Type` value.
///
/// Returns `None` unless the value names a `multipart` type and carries a
/// boundary. Both quoted and bare forms are accepted; the value ends at a
/// `;` or whitespace and surrounding quotes are stripped.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    let lower = content_type.to_ascii_lowercase();
    if !lower.contains("multipart") {
        return None;
    }

    let idx = lower.find("boundary=")?;
    let rest = &content_type[idx + "boundary=".len()..];
    let end = rest
        .find(|c: char| c == ';' || c.is_whitespace())
        .unwrap_or(rest.len());
    let boundary = rest[..end].trim_matches(|c| c == '"' || c == '\'');

    if boundary.is_empty() {
        None
    } else {
        Some(boundary.to_string())
    }
}

/// Split a multipart body on its boundary into trimmed part segments.
///
/// The delimiter `--<boundary>` is matched with plain substring search, so
/// pattern metacharacters in a (sender-controlled) boundary are taken
/// literally by construction. The preamble (text before the first
/// delimiter), empty segments, and closing-delimiter / epilogue segments
/// (those reduced to `--` or still starting with `--`) are discarded.
pub fn split_multipart<'a>(body: &'a str, boundary: &str) -> Vec<&'a str> {
    let delimiter = format!("--{boundary}");
    let mut segments = Vec::new();

    for (i, segment) in body.split(delimiter.as_str()).enumerate() {
        if i == 0 {
            continue;
        }
        let segment = segment.trim();
        if segment.is_empty() || segment.starts_with("--") {
            continue;
        }
        segments.push(segment);
    }

    segments
}

/// Parse one segment into its header block and body.
pub fn parse_part(segment: &str) -> MimePart {
    let lines: Vec<&str> = segment.lines().collect();
    let (headers, body_start) = parse_header_block(&lines);
    let body_start = body_start.min(lines.len());
    let body = lines[body_start..].join("\n").trim().to_string();
    MimePart { headers, body }
}

/// Classify a part as attachment, HTML body, or text body, decoding its
/// payload accordingly.
///
/// Returns `None` for parts that are structural noise (see
/// [`NOISE_BODY_THRESHOLD`]).
pub fn classify_part(part: &MimePart) -> Option<PartContent> {
    let content_type = part.headers.get_or_empty("content-type");
    let disposition = part.headers.get_or_empty("content-disposition");
    let transfer_encoding = part.headers.get_or_empty("content-transfer-encoding");

    let ct_lower = content_type.to_ascii_lowercase();
    let disp_lower = disposition.to_ascii_lowercase();

    let is_attachment = disp_lower.contains("attachment")
        || (disp_lower.contains("filename") && !disp_lower.contains("inline"))
        || (!content_type.is_empty()
            && !ct_lower.contains("text/")
            && ct_lower.contains("name="));

    if is_attachment {
        return build_attachment(part, content_type, disposition, transfer_encoding)
            .map(PartContent::Attachment);
    }

    let content = decode_body(&part.body, transfer_encoding);
    if ct_lower.contains("text/html") {
        Some(PartContent::Html { content })
    } else {
        Some(PartContent::Text { content })
    }
}

/// Build an attachment from a classified part, or `None` when the part is
/// structural noise.
fn build_attachment(
    part: &MimePart,
    content_type: &str,
    disposition: &str,
    transfer_encoding: &str,
) -> Option<Attachment> {
    let name = extract_param(disposition, "filename")
        .or_else(|| extract_param(content_type, "name"))
        .map(|raw| decode_extended_filename(&raw))
        .unwrap_or_default();

    // No usable filename and a tiny body: a signature stub or similar
    // by-product of boundary splitting, not a real attachment.
    if (name.is_empty() || name == "attachment") && part.body.len() < NOISE_BODY_THRESHOLD {
        debug!(body_len = part.body.len(), "Dropping noise part");
        return None;
    }

    // Normalize the payload: keep base64 as base64, re-encode
    // quoted-printable to base64, pass anything else through raw.
    let data = match transfer_encoding.trim().to_ascii_lowercase().as_str() {
        "base64" => part.body.chars().filter(|c| !c.is_whitespace()).collect(),
        "quoted-printable" => STANDARD.encode(decode_quoted_printable(&part.body)),
        _ => part.body.clone(),
    };

    let bare_type = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_string();

    Some(Attachment {
        name: if name.is_empty() {
            "attachment".to_string()
        } else {
            name
        },
        content_type: bare_type,
        size: data.len() as u64,
        data,
    })
}

/// Extract a `key=value` or `key*=value` parameter from a header value.
///
/// The match is case-insensitive; the value runs to the next `;` and loses
/// surrounding quotes. Multi-segment RFC 2231 continuations
/// (`filename*0*=` and friends) deliberately do not match; they are out of
/// scope.
fn extract_param(source: &str, key: &str) -> Option<String> {
    let lower = source.to_ascii_lowercase();
    let bytes = source.as_bytes();
    let mut from = 0;

    while let Some(rel) = lower[from..].find(key) {
        let mut pos = from + rel + key.len();
        if bytes.get(pos) == Some(&b'*') {
            pos += 1;
        }
        if bytes.get(pos) == Some(&b'=') {
            let rest = &source[pos + 1..];
            let end = rest.find(';').unwrap_or(rest.len());
            let value = rest[..end]
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .trim();
            return Some(value.to_string());
        }
        from += rel + 1;
    }

    None
}

/// Decode the single-segment RFC 2231 form `UTF-8''percent%20encoded`.
///
/// Anything else is returned unchanged.
fn decode_extended_filename(name: &str) -> String {
    if name.contains("UTF-8") {
        if let Some((_, encoded)) = name.split_once("''") {
            return percent_decode_str(encoded)
                .decode_utf8()
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| encoded.to_string());
        }
    }
    name.to_string()
}

/// Walk a multipart body, recursing into nested multiparts, and collect
/// bodies and attachments into `out`.
pub fn collect_multipart(body: &str, boundary: &str, out: &mut BodyContent, depth: usize) {
    if depth >= MAX_DEPTH {
        warn!(depth, "Multipart nesting too deep, ignoring inner parts");
        return;
    }

    for segment in split_multipart(body, boundary) {
        let part = parse_part(segment);

        // A part that is itself multipart gets split again rather than
        // classified; its inner parts land in the same accumulator.
        let part_type = part.headers.get_or_empty("content-type");
        if let Some(inner_boundary) = extract_boundary(part_type) {
            collect_multipart(&part.body, &inner_boundary, out, depth + 1);
            continue;
        }

        match classify_part(&part) {
            Some(PartContent::Text { content }) => out.text = content,
            Some(PartContent::Html { content }) => out.html = content,
            Some(PartContent::Attachment(att)) => out.attachments.push(att),
            None => {}
        }
    }
}

/// Final attachment filter, applied once to the collected candidates.
///
/// Drops generically-named small candidates, empty payloads, and blank
/// names. A coarser pass than the per-part noise check, applied uniformly
/// regardless of which path produced the candidate.
pub fn filter_attachments(candidates: Vec<Attachment>) -> Vec<Attachment> {
    candidates
        .into_iter()
        .filter(|att| {
            if att.name.trim().is_empty() {
                return false;
            }
            if att.name.eq_ignore_ascii_case("attachment")
                && att.size < NOISE_BODY_THRESHOLD as u64
            {
                return false;
            }
            if att.data.is_empty() {
                return false;
            }
            true
        })
        .collect()
}

/// Convert HTML to plain text for terminal display.
///
/// Good enough for previewing a body: block tags become newlines, scripts
/// and styles disappear, remaining tags are stripped, common entities are
/// decoded, and blank runs collapse.
pub fn html_to_text(html: &str) -> String {
    let mut text = strip_tag_blocks(html, "script");
    text = strip_tag_blocks(&text, "style");

    // Block-level elements introduce line breaks.
    for tag in ["br", "br/", "br /", "p", "div", "tr", "li"] {
        text = text.replace(&format!("<{tag}>"), "\n");
        text = text.replace(&format!("<{}>", tag.to_uppercase()), "\n");
    }
    for tag in ["p", "div", "tr", "li"] {
        text = text.replace(&format!("</{tag}>"), "\n");
        text = text.replace(&format!("</{}>", tag.to_uppercase()), "\n");
    }

    // Strip every remaining tag.
    let mut stripped = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => stripped.push(ch),
            _ => {}
        }
    }

    let entities = [
        ("&amp;", "&"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&apos;", "'"),
        ("&nbsp;", " "),
    ];
    for (entity, replacement) in entities {
        stripped = stripped.replace(entity, replacement);
    }

    // Collapse runs of blank lines.
    let mut cleaned = String::with_capacity(stripped.len());
    let mut prev_blank = false;
    for line in stripped.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !prev_blank {
                cleaned.push('\n');
                prev_blank = true;
            }
        } else {
            cleaned.push_str(trimmed);
            cleaned.push('\n');
            prev_blank = false;
        }
    }

    cleaned.trim().to_string()
}

/// Remove `<tag>…</tag>` blocks wholesale (case-insensitive).
fn strip_tag_blocks(html: &str, tag: &str) -> String {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut result = String::with_capacity(html.len());
    let mut remaining = html;

    // ASCII lowercasing keeps byte offsets aligned with the original.
    while let Some(start) = remaining.to_ascii_lowercase().find(&open) {
        result.push_str(&remaining[..start]);
        let after = &remaining[start..];
        match after.to_ascii_lowercase().find(&close) {
            Some(end) => remaining = &after[end + close.len()..],
            None => {
                remaining = "";
                break;
            }
        }
    }
    result.push_str(remaining);
    result
}
