//! Integration tests for attachment extraction and text export.

use std::path::Path;

use assert_fs::prelude::*;
use predicates::prelude::*;

use emlview::export::attachment::save_all_attachments;
use emlview::export::text::export_text;
use emlview::parser::eml::parse_eml_file;

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_save_attachments_writes_decoded_files() {
    let email = parse_eml_file(fixture("scenario.eml")).unwrap();
    let tmp = assert_fs::TempDir::new().unwrap();

    let paths = save_all_attachments(&email, tmp.path()).unwrap();
    assert_eq!(paths.len(), 1);

    tmp.child("a.txt").assert(predicate::path::exists());
    let written = std::fs::read(tmp.child("a.txt").path()).unwrap();
    assert_eq!(written, b"Hi", "base64 payload should be decoded on disk");
}

#[test]
fn test_save_attachments_avoids_collisions() {
    let email = parse_eml_file(fixture("scenario.eml")).unwrap();
    let tmp = tempfile::tempdir().unwrap();

    let first = save_all_attachments(&email, tmp.path()).unwrap();
    let second = save_all_attachments(&email, tmp.path()).unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_ne!(first[0], second[0], "second write must pick a fresh name");
    assert!(second[0].ends_with("a_1.txt"));
}

#[test]
fn test_save_attachments_sanitizes_names() {
    let raw = "Content-Type: multipart/mixed; boundary=\"B\"\n\n\
        --B\nContent-Disposition: attachment; filename=\"../../evil.sh\"\n\npayload\n\
        --B--\n";
    let email = emlview::parser::eml::parse_message(raw);
    assert_eq!(email.attachments.len(), 1);

    let tmp = assert_fs::TempDir::new().unwrap();
    let paths = save_all_attachments(&email, tmp.path()).unwrap();
    assert_eq!(paths.len(), 1);

    // Separators were replaced (and leading dots stripped), so the file
    // lands inside the temp dir.
    assert!(paths[0].starts_with(tmp.path()));
    tmp.child("_.._evil.sh").assert(predicate::path::exists());
}

#[test]
fn test_export_text_contains_headers_body_and_listing() {
    let email = parse_eml_file(fixture("multipart.eml")).unwrap();
    let tmp = assert_fs::TempDir::new().unwrap();

    let path = export_text(&email, tmp.path()).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();

    assert!(content.contains("From:    Alice Example <alice@example.com>"));
    assert!(content.contains("Subject: Project files"));
    assert!(content.contains("Please find the files attached."));
    assert!(content.contains("[Attachments: 2 file(s)]"));
    assert!(content.contains("report.pdf"));
    assert!(
        path.file_name().unwrap().to_str().unwrap().starts_with("20240104_"),
        "filename should start with the parsed date, got {path:?}"
    );
}
