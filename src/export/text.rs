//! Export a parsed message as a plain text file.

use std::path::{Path, PathBuf};

use chrono::DateTime;

use crate::error::{EmlError, Result};
use crate::model::email::ParsedEmail;
use crate::parser::header::parse_date;
use crate::parser::mime::html_to_text;

use super::sanitize_filename_part;

/// Write a message as a `.txt` file with headers, body, and an attachment
/// listing. Returns the path of the created file.
pub fn export_text(email: &ParsedEmail, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir).map_err(|e| EmlError::io(output_dir, e))?;

    let filename = text_filename(email);
    let path = output_dir.join(&filename);

    let mut content = String::new();

    // Headers
    content.push_str(&format!("Date:    {}\n", email.date));
    content.push_str(&format!("From:    {}\n", email.from));
    if !email.to.is_empty() {
        content.push_str(&format!("To:      {}\n", email.to));
    }
    if !email.cc.is_empty() {
        content.push_str(&format!("Cc:      {}\n", email.cc));
    }
    content.push_str(&format!("Subject: {}\n", email.subject));
    content.push_str(&format!("\n{}\n", "-".repeat(72)));

    // Body: prefer the plain-text part, fall back to converted HTML.
    if !email.text.is_empty() {
        content.push('\n');
        content.push_str(&email.text);
        content.push('\n');
    } else if !email.html.is_empty() {
        content.push('\n');
        content.push_str(&html_to_text(&email.html));
        content.push('\n');
    }

    // Attachments list
    if !email.attachments.is_empty() {
        content.push_str(&format!(
            "\n[Attachments: {} file(s)]\n",
            email.attachments.len()
        ));
        for att in &email.attachments {
            let size = humansize::format_size(att.size, humansize::BINARY);
            content.push_str(&format!(
                "  - {} ({}, {})\n",
                att.name, att.content_type, size
            ));
        }
    }

    std::fs::write(&path, content).map_err(|e| EmlError::io(&path, e))?;
    Ok(path)
}

/// Generate a filename for the text export: `{date}_{subject}.txt`.
fn text_filename(email: &ParsedEmail) -> String {
    let date = parse_date(&email.date)
        .unwrap_or(DateTime::UNIX_EPOCH)
        .format("%Y%m%d_%H%M%S")
        .to_string();
    let subject = sanitize_filename_part(&email.subject, 80);
    format!("{date}_{subject}.txt")
}
