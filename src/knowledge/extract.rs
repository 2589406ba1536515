//! Text extraction for validated uploads.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

use super::types::{DocumentKind, FileUpload, KnowledgeFile};
use super::validate::validate_batch;

/// Array items rendered before truncating JSON output.
const JSON_ARRAY_PREVIEW: usize = 10;

/// Data rows rendered before truncating CSV output.
const CSV_ROW_LIMIT: usize = 100;

/// Share of control characters above which undeclared content is treated as binary.
const MAX_CONTROL_RATIO: f64 = 0.05;

// ─────────────────────────────────────────────────────────────────
// Ingestion
// ─────────────────────────────────────────────────────────────────

/// Result of ingesting a batch that passed validation.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Successfully ingested files, in upload order.
    pub files: Vec<KnowledgeFile>,

    /// Files whose text could not be extracted.
    pub failures: Vec<Error>,
}

/// Extract text from an upload and wrap it in a new [`KnowledgeFile`].
///
/// Callers are expected to run [`super::validate`] first; [`ingest_batch`]
/// does so for the whole batch.
pub fn ingest(upload: &FileUpload) -> Result<KnowledgeFile> {
    let uploaded_at = Utc::now();
    let kind = upload.kind();
    let content = extract_text(upload, kind, uploaded_at)?;

    let file = KnowledgeFile {
        id: generate_id(uploaded_at),
        name: upload.name.clone(),
        mime_type: upload.mime_type.clone(),
        size: upload.size(),
        content,
        uploaded_at,
    };

    debug!(
        id = %file.id,
        name = %file.name,
        kind = %kind,
        chars = file.content.len(),
        "Knowledge file ingested"
    );
    Ok(file)
}

/// Validate the whole batch, then ingest each upload independently.
///
/// A validation failure rejects the batch before anything is ingested.
/// Extraction failures are collected per file.
pub fn ingest_batch(uploads: &[FileUpload]) -> Result<BatchOutcome> {
    validate_batch(uploads)?;

    let mut outcome = BatchOutcome::default();
    for upload in uploads {
        match ingest(upload) {
            Ok(file) => outcome.files.push(file),
            Err(e) => {
                warn!(name = %upload.name, error = %e.format_for_log(), "Skipping file, extraction failed");
                outcome.failures.push(e);
            }
        }
    }

    info!(
        ingested = outcome.files.len(),
        failed = outcome.failures.len(),
        "Knowledge batch processed"
    );
    Ok(outcome)
}

/// Short descriptive statistic for listings.
pub fn summarize(file: &KnowledgeFile) -> String {
    let lines = file
        .content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .count();
    let words = file.content.split_whitespace().count();
    format!("{} lines, ~{} words", lines, words)
}

fn generate_id(at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("kf-{:x}-{}", at.timestamp_millis(), &suffix[..8])
}

// ─────────────────────────────────────────────────────────────────
// Extraction by kind
// ─────────────────────────────────────────────────────────────────

fn extract_text(upload: &FileUpload, kind: DocumentKind, at: DateTime<Utc>) -> Result<String> {
    match kind {
        DocumentKind::PlainText | DocumentKind::Markdown => {
            Ok(String::from_utf8_lossy(&upload.bytes).into_owned())
        }
        DocumentKind::Json => {
            let raw = String::from_utf8_lossy(&upload.bytes);
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => Ok(format_json(&value)),
                Err(e) => {
                    debug!(name = %upload.name, error = %e, "JSON parse failed, keeping raw text");
                    Ok(raw.into_owned())
                }
            }
        }
        DocumentKind::Csv => Ok(format_csv(&String::from_utf8_lossy(&upload.bytes))),
        DocumentKind::Pdf | DocumentKind::Word => Ok(placeholder(upload, kind, at)),
        DocumentKind::Other => decode_unknown(upload),
    }
}

fn decode_unknown(upload: &FileUpload) -> Result<String> {
    let text = std::str::from_utf8(&upload.bytes)
        .map_err(|_| Error::extraction_failed(&upload.name, "content is not valid UTF-8 text"))?;

    if !looks_like_text(text) {
        return Err(Error::extraction_failed(
            &upload.name,
            "content appears to be binary",
        ));
    }
    Ok(text.to_string())
}

fn looks_like_text(text: &str) -> bool {
    if text.contains('\0') {
        return false;
    }
    let total = text.chars().count();
    if total == 0 {
        return true;
    }
    let control = text
        .chars()
        .filter(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        .count();
    (control as f64 / total as f64) <= MAX_CONTROL_RATIO
}

fn placeholder(upload: &FileUpload, kind: DocumentKind, at: DateTime<Utc>) -> String {
    let label = match kind {
        DocumentKind::Pdf => "PDF Document",
        _ => "Word Document",
    };
    format!(
        "[{label}: {name}]\n\
         File size: {kb:.1} KB\n\
         Uploaded: {date}\n\n\
         Full text extraction is not available for {kind} files. \
         The document {name} is part of the knowledge base and can be referenced by name.",
        label = label,
        name = upload.name,
        kb = upload.size() as f64 / 1024.0,
        date = at.format("%Y-%m-%d %H:%M UTC"),
        kind = kind,
    )
}

// ─────────────────────────────────────────────────────────────────
// JSON
// ─────────────────────────────────────────────────────────────────

fn format_json(value: &Value) -> String {
    let mut lines = Vec::new();
    write_json(value, 0, &mut lines);
    lines.join("\n")
}

fn write_json(value: &Value, depth: usize, out: &mut Vec<String>) {
    let indent = "  ".repeat(depth);
    match value {
        Value::Object(map) if map.is_empty() => out.push(format!("{}(empty object)", indent)),
        Value::Object(map) => {
            for (key, child) in map {
                if is_container(child) {
                    out.push(format!("{}{}:", indent, key));
                    write_json(child, depth + 1, out);
                } else {
                    out.push(format!("{}{}: {}", indent, key, scalar_text(child)));
                }
            }
        }
        Value::Array(items) => {
            out.push(format!("{}Array with {} items", indent, items.len()));
            let child_indent = "  ".repeat(depth + 1);
            for (i, item) in items.iter().take(JSON_ARRAY_PREVIEW).enumerate() {
                if is_container(item) {
                    out.push(format!("{}- [{}]", child_indent, i));
                    write_json(item, depth + 2, out);
                } else {
                    out.push(format!("{}- {}", child_indent, scalar_text(item)));
                }
            }
            if items.len() > JSON_ARRAY_PREVIEW {
                out.push(format!(
                    "{}... and {} more items",
                    child_indent,
                    items.len() - JSON_ARRAY_PREVIEW
                ));
            }
        }
        scalar => out.push(format!("{}{}", indent, scalar_text(scalar))),
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────
// CSV
// ─────────────────────────────────────────────────────────────────

fn format_csv(text: &str) -> String {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

    let header = match lines.next() {
        Some(line) => split_csv_row(line),
        None => return String::new(),
    };

    let rows: Vec<Vec<String>> = lines
        .map(split_csv_row)
        .filter(|row| row.len() == header.len())
        .collect();

    let mut out = Vec::with_capacity(rows.len().min(CSV_ROW_LIMIT) + 2);
    out.push(format!("Headers: {}", header.join(" | ")));
    out.extend(rows.iter().take(CSV_ROW_LIMIT).map(|row| row.join(" | ")));
    if rows.len() > CSV_ROW_LIMIT {
        out.push(format!("... and {} more rows", rows.len() - CSV_ROW_LIMIT));
    }
    out.join("\n")
}

fn split_csv_row(line: &str) -> Vec<String> {
    line.split(',')
        .map(|cell| cell.trim().replace('"', ""))
        .collect()
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
