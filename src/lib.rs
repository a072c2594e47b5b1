//! `emlview` — a terminal viewer and parser for `.eml` email files.
//!
//! This crate provides the core library for parsing RFC 5322 messages with
//! MIME multipart bodies into a structured [`model::email::ParsedEmail`],
//! plus helpers for rendering and exporting the result.

pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
