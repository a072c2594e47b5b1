//! Write decoded attachments to disk.

use std::path::{Path, PathBuf};

use crate::error::{EmlError, Result};
use crate::model::attachment::Attachment;
use crate::model::email::ParsedEmail;

use super::sanitize_filename_part;

/// Write a single attachment into `output_dir`.
///
/// The filename is sanitized and collisions are avoided by appending a
/// counter. Returns the path of the created file.
pub fn save_attachment(attachment: &Attachment, output_dir: &Path) -> Result<PathBuf> {
    let filename = sanitize_filename_part(&attachment.name, 150);
    let path = unique_path(&output_dir.join(&filename));

    std::fs::write(&path, attachment.decoded_bytes()).map_err(|e| EmlError::io(&path, e))?;
    Ok(path)
}

/// Write all of a message's attachments into `output_dir`.
///
/// A failing attachment is logged and skipped; the rest are still written.
pub fn save_all_attachments(email: &ParsedEmail, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir).map_err(|e| EmlError::io(output_dir, e))?;

    let mut paths = Vec::with_capacity(email.attachments.len());
    for attachment in &email.attachments {
        match save_attachment(attachment, output_dir) {
            Ok(path) => paths.push(path),
            Err(e) => {
                tracing::warn!(
                    filename = %attachment.name,
                    error = %e,
                    "Failed to save attachment"
                );
            }
        }
    }

    Ok(paths)
}

/// If `path` already exists, append a counter to make it unique.
fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parent = path.parent().unwrap_or(Path::new("."));

    for i in 1..1000 {
        let candidate = if ext.is_empty() {
            parent.join(format!("{stem}_{i}"))
        } else {
            parent.join(format!("{stem}_{i}.{ext}"))
        };
        if !candidate.exists() {
            return candidate;
        }
    }

    // Fallback — very unlikely
    parent.join(format!("{stem}_dup.{ext}"))
}
