//! The parsed message record.

use serde::{Deserialize, Serialize};

use super::attachment::Attachment;

/// Structured result of parsing one EML message.
///
/// Built once per parse and never mutated afterwards. All header-derived
/// fields are decoded strings; `date` keeps the raw header value so no
/// information is lost on unparseable dates (display code may normalize it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedEmail {
    /// Sender, decoded. `"Unknown"` when the header is absent or empty.
    pub from: String,

    /// Recipients, decoded, comma-joined. Empty when absent.
    pub to: String,

    /// Carbon-copy recipients, decoded, comma-joined. Empty when absent.
    pub cc: String,

    /// Decoded subject. `"No Subject"` when absent or empty.
    pub subject: String,

    /// Raw `Date:` header value. Empty when absent.
    pub date: String,

    /// Plain-text body. Empty when the message has none.
    pub text: String,

    /// HTML body. Empty when the message has none.
    pub html: String,

    /// Attachments that survived filtering.
    pub attachments: Vec<Attachment>,
}
