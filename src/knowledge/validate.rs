//! Upload validation: size and type gates applied before ingestion.

use tracing::debug;

use crate::error::{Error, Result};

use super::types::FileUpload;

/// Largest accepted upload (10 MiB).
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Extensions accepted without a matching MIME type.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "csv", "json", "md", "pdf", "doc", "docx"];

/// MIME types accepted without a matching extension.
const SUPPORTED_MIME_TYPES: &[&str] = &[
    "text/plain",
    "text/csv",
    "application/json",
    "text/markdown",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Check a single upload against the size limit and the supported types.
pub fn validate(upload: &FileUpload) -> Result<()> {
    if upload.size() > MAX_FILE_SIZE {
        return Err(Error::FileTooLarge {
            name: upload.name.clone(),
            size: upload.size(),
            limit_mb: MAX_FILE_SIZE / (1024 * 1024),
        });
    }

    let ext_ok = upload
        .extension()
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);
    let mime_ok = SUPPORTED_MIME_TYPES.contains(&upload.essence_mime().as_str());

    if !ext_ok && !mime_ok {
        return Err(Error::UnsupportedFileType {
            name: upload.name.clone(),
            mime_type: if upload.mime_type.is_empty() {
                "unknown".to_string()
            } else {
                upload.mime_type.clone()
            },
            supported: SUPPORTED_EXTENSIONS.join(", "),
        });
    }

    debug!(name = %upload.name, size = upload.size(), "Upload validated");
    Ok(())
}

/// Validate every upload in a batch; the first failure rejects the whole batch.
pub fn validate_batch(uploads: &[FileUpload]) -> Result<()> {
    uploads.iter().try_for_each(validate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(name: &str, mime: &str, size: usize) -> FileUpload {
        FileUpload::new(name, mime, vec![b'a'; size])
    }

    #[test]
    fn test_exact_limit_passes() {
        let upload = sized("big.txt", "text/plain", MAX_FILE_SIZE as usize);
        assert!(validate(&upload).is_ok());
    }

    #[test]
    fn test_one_byte_over_limit_fails() {
        let upload = sized("big.txt", "text/plain", MAX_FILE_SIZE as usize + 1);
        let err = validate(&upload).unwrap_err();
        assert!(matches!(err, Error::FileTooLarge { .. }));
    }

    #[test]
    fn test_unknown_type_fails() {
        let err = validate(&sized("setup.exe", "application/octet-stream", 10)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType { .. }));

        let err = validate(&sized("setup.exe", "", 10)).unwrap_err();
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn test_extension_or_mime_suffices() {
        assert!(validate(&sized("notes.md", "application/octet-stream", 4)).is_ok());
        assert!(validate(&sized("export", "application/json", 4)).is_ok());
        assert!(validate(&sized("REPORT.DOCX", "", 4)).is_ok());
    }

    #[test]
    fn test_batch_stops_at_first_invalid() {
        let uploads = vec![
            sized("a.txt", "text/plain", 4),
            sized("b.exe", "", 4),
            sized("c.bin", "", 4),
        ];
        let err = validate_batch(&uploads).unwrap_err();
        assert!(err.to_string().contains("b.exe"));
    }
}
