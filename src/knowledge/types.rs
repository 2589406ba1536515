//! Core types for the knowledge store.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────
// Upload
// ─────────────────────────────────────────────────────────────────

/// A file handed over by a file-picking collaborator.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Original filename, including extension.
    pub name: String,

    /// Declared MIME type (may be empty when the picker does not know it).
    pub mime_type: String,

    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lowercased filename extension without the dot, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }

    /// Lowercased MIME type with any parameters (`; charset=...`) removed.
    pub fn essence_mime(&self) -> String {
        self.mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase()
    }

    /// Classify the upload for extraction. The MIME type wins when it is
    /// specific; the extension decides otherwise.
    pub fn kind(&self) -> DocumentKind {
        let mime = self.essence_mime();
        let ext = self.extension().unwrap_or_default();

        if mime == "application/json" || ext == "json" {
            DocumentKind::Json
        } else if mime == "text/csv" || mime == "application/vnd.ms-excel" || ext == "csv" {
            DocumentKind::Csv
        } else if mime == "text/markdown" || ext == "md" {
            DocumentKind::Markdown
        } else if mime == "application/pdf" || ext == "pdf" {
            DocumentKind::Pdf
        } else if mime == "application/msword"
            || mime == "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            || ext == "doc"
            || ext == "docx"
        {
            DocumentKind::Word
        } else if mime.starts_with("text/") || ext == "txt" {
            DocumentKind::PlainText
        } else {
            DocumentKind::Other
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Document Kind
// ─────────────────────────────────────────────────────────────────

/// How an upload's bytes are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Markdown,
    Json,
    Csv,
    Pdf,
    Word,
    Other,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DocumentKind::PlainText => "Text",
            DocumentKind::Markdown => "Markdown",
            DocumentKind::Json => "JSON",
            DocumentKind::Csv => "CSV",
            DocumentKind::Pdf => "PDF",
            DocumentKind::Word => "Word",
            DocumentKind::Other => "Other",
        };
        write!(f, "{}", label)
    }
}

// ─────────────────────────────────────────────────────────────────
// Knowledge File
// ─────────────────────────────────────────────────────────────────

/// An ingested document reduced to plain text. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeFile {
    /// Opaque unique token.
    pub id: String,

    /// Original filename.
    pub name: String,

    /// Declared MIME type at upload time.
    #[serde(rename = "type", default)]
    pub mime_type: String,

    /// Original size in bytes.
    pub size: u64,

    /// Extracted plain text.
    pub content: String,

    /// Ingestion time.
    #[serde(rename = "uploadedAt")]
    pub uploaded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, mime: &str) -> FileUpload {
        FileUpload::new(name, mime, Vec::new())
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(upload("notes.txt", "").kind(), DocumentKind::PlainText);
        assert_eq!(upload("README.MD", "").kind(), DocumentKind::Markdown);
        assert_eq!(upload("data.json", "").kind(), DocumentKind::Json);
        assert_eq!(upload("sheet.csv", "").kind(), DocumentKind::Csv);
        assert_eq!(upload("paper.pdf", "").kind(), DocumentKind::Pdf);
        assert_eq!(upload("letter.docx", "").kind(), DocumentKind::Word);
        assert_eq!(upload("tool.exe", "").kind(), DocumentKind::Other);
    }

    #[test]
    fn test_kind_prefers_specific_mime() {
        assert_eq!(
            upload("export", "application/json; charset=utf-8").kind(),
            DocumentKind::Json
        );
        assert_eq!(upload("report.bin", "text/csv").kind(), DocumentKind::Csv);
        assert_eq!(upload("log.out", "text/x-log").kind(), DocumentKind::PlainText);
    }

    #[test]
    fn test_serde_field_names() {
        let file = KnowledgeFile {
            id: "kf-1".into(),
            name: "a.txt".into(),
            mime_type: "text/plain".into(),
            size: 3,
            content: "abc".into(),
            uploaded_at: Utc::now(),
        };
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["type"], "text/plain");
        assert!(json.get("uploadedAt").is_some());
    }
}
