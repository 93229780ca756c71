//! `multipart/form-data` bodies for form submissions.

use crate::{data::Files, error::Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::{fs, path::Path};

lazy_static! {
    static ref BOUNDARY_REGEX: Regex =
        Regex::new(r#"(?i)^\s*multipart/form-data\s*;(?:.*;)?\s*boundary="?([^";]+)"?"#).unwrap();
}

/// The boundary token of a `multipart/form-data` content type, if it is one.
pub fn boundary_of(content_type: &str) -> Option<&str> {
    BOUNDARY_REGEX
        .captures(content_type)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str().trim())
}

/// Text value of a form field; non-string values travel as their JSON text.
pub fn field_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Encodes `fields` then `files` as parts delimited by `boundary`.
///
/// Files are read here, so a missing file fails the send with an `Io` error.
pub fn encode(boundary: &str, fields: &Map<String, Value>, files: &Files) -> Result<Vec<u8>> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", escape(name)).as_bytes(),
        );
        body.extend_from_slice(field_text(value).as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    for (name, path) in files {
        let content = fs::read(path)?;

        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                escape(name),
                escape(&file_name(path))
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type_of(path)).as_bytes());
        body.extend_from_slice(&content);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    Ok(body)
}

fn escape(text: &str) -> String {
    text.replace('"', "%22").replace('\r', "%0D").replace('\n', "%0A")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn content_type_of(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
