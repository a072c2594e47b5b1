//! Attachment payload and helpers.
//!
//! `data` holds the payload the way the wire carried it, normalized for
//! downstream consumers: base64 text for base64 and quoted-printable parts,
//! raw text for identity-encoded parts. [`Attachment::decoded_bytes`] is the
//! bridge to real bytes when writing to disk.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// A single extracted attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Filename from `Content-Disposition` (or `Content-Type` `name=`).
    pub name: String,

    /// Bare MIME type with parameters stripped (e.g. `"application/pdf"`).
    /// May be empty if the part carried no `Content-Type`.
    #[serde(rename = "contentType")]
    pub content_type: String,

    /// Payload: ASCII base64, or raw text for identity-encoded parts.
    pub data: String,

    /// Length of `data` in bytes.
    pub size: u64,
}

/// Image extensions recognized for inline preview.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"];

impl Attachment {
    /// The filename extension, lowercased, without the dot. Empty if none.
    pub fn extension(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
            _ => String::new(),
        }
    }

    /// Whether the filename looks like an image.
    pub fn is_image(&self) -> bool {
        IMAGE_EXTENSIONS.contains(&self.extension().as_str())
    }

    /// Best-guess MIME type: the part's own `Content-Type`, falling back to
    /// the extension for common image formats, then `application/octet-stream`.
    pub fn mime_type(&self) -> String {
        if !self.content_type.is_empty() {
            return self.content_type.clone();
        }
        match self.extension().as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            _ => "application/octet-stream",
        }
        .to_string()
    }

    /// Decode the payload to raw bytes.
    ///
    /// `data` is probed as base64 first; if it does not parse, it is treated
    /// as raw (identity-encoded) content and returned byte-for-byte.
    pub fn decoded_bytes(&self) -> Vec<u8> {
        match STANDARD.decode(self.data.as_bytes()) {
            Ok(bytes) => bytes,
            Err(_) => self.data.as_bytes().to_vec(),
        }
    }

    /// Render the payload as a `data:` URL suitable for embedding.
    pub fn data_url(&self) -> String {
        let base64_data = match STANDARD.decode(self.data.as_bytes()) {
            Ok(_) => self.data.clone(),
            Err(_) => STANDARD.encode(self.data.as_bytes()),
        };
        format!("data:{};base64,{}", self.mime_type(), base64_data)
    }
}
