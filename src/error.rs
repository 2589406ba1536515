//! Error types for GPT Studio
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for CLI
//!
//! Remote completion failures have their own type ([`RemoteError`]) because the
//! orchestrator absorbs them; they only reach this enum through CLI commands that
//! talk to the remote service directly.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::chat::RemoteError;

/// Result type alias for GPT Studio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Knowledge errors (3xx)
    FileTooLarge = 300,
    UnsupportedFileType = 301,
    ExtractionFailed = 310,
    KnowledgeFileNotFound = 320,

    // Remote completion errors (4xx)
    RemoteStatus = 400,
    RemoteTransport = 401,
    RemoteTimeout = 402,
    RemoteMalformed = 403,

    // Persona errors (5xx)
    PersonaNotFound = 500,
    PersonaInvalid = 501,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10,
            200..=299 => 20,
            300..=399 => 30,
            400..=499 => 40,
            500..=599 => 50,
            900..=999 => 90,
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Knowledge Errors
    // ─────────────────────────────────────────────────────────────

    /// Uploaded file exceeds the size limit
    #[error("File \"{name}\" is too large ({size} bytes). Maximum size is {limit_mb}MB.")]
    FileTooLarge { name: String, size: u64, limit_mb: u64 },

    /// Uploaded file has neither a supported extension nor a supported MIME type
    #[error("File \"{name}\" has an unsupported type ({mime_type}). Supported types: {supported}.")]
    UnsupportedFileType {
        name: String,
        mime_type: String,
        supported: String,
    },

    /// Content could not be turned into text
    #[error("Could not extract text from \"{name}\": {reason}")]
    ExtractionFailed { name: String, reason: String },

    /// No knowledge file with this id on the persona
    #[error("Knowledge file not found: {id}")]
    KnowledgeFileNotFound { id: String },

    // ─────────────────────────────────────────────────────────────
    // Remote Errors
    // ─────────────────────────────────────────────────────────────

    /// Remote completion service failure
    #[error(transparent)]
    Remote(#[from] RemoteError),

    // ─────────────────────────────────────────────────────────────
    // Persona Errors
    // ─────────────────────────────────────────────────────────────

    /// Persona not found
    #[error("Persona not found: {name}")]
    PersonaNotFound { name: String },

    /// Persona document or configuration is invalid
    #[error("Persona \"{name}\" is invalid: {reason}")]
    PersonaInvalid { name: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,
            Error::Config(_) => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,
            Error::Json(_) => ErrorCode::PersonaInvalid,

            Error::FileTooLarge { .. } => ErrorCode::FileTooLarge,
            Error::UnsupportedFileType { .. } => ErrorCode::UnsupportedFileType,
            Error::ExtractionFailed { .. } => ErrorCode::ExtractionFailed,
            Error::KnowledgeFileNotFound { .. } => ErrorCode::KnowledgeFileNotFound,

            Error::Remote(e) => match e {
                RemoteError::Status { .. } => ErrorCode::RemoteStatus,
                RemoteError::Timeout { .. } => ErrorCode::RemoteTimeout,
                RemoteError::Transport(_) => ErrorCode::RemoteTransport,
                RemoteError::Malformed(_) => ErrorCode::RemoteMalformed,
            },

            Error::PersonaNotFound { .. } => ErrorCode::PersonaNotFound,
            Error::PersonaInvalid { .. } => ErrorCode::PersonaInvalid,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Whether the error came from validating an upload (the batch is rejected)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::FileTooLarge { .. } | Error::UnsupportedFileType { .. }
        )
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'gpt-studio config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } | Error::Config(_) => Some(
                "Check your configuration file syntax. Run 'gpt-studio config validate' to see details."
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the configuration file and fix the invalid values."
            ),

            Error::FileTooLarge { .. } => Some(
                "Split the document into smaller files of at most 10MB each."
            ),
            Error::UnsupportedFileType { .. } => Some(
                "Upload .txt, .md, .csv, .json, .pdf, .doc or .docx files, or pass --mime with a supported type."
            ),

            Error::KnowledgeFileNotFound { .. } => Some(
                "Run 'gpt-studio knowledge list <PERSONA>' to see file ids."
            ),

            Error::Remote(RemoteError::Status { status: 401, .. }) => Some(
                "The API key was rejected. Run 'gpt-studio key set <KEY>' with a valid key."
            ),
            Error::Remote(_) => Some(
                "Check your network connection and the [openai] base_url in the configuration."
            ),

            Error::PersonaNotFound { .. } => Some(
                "Run 'gpt-studio persona list' to see the available personas."
            ),
            Error::PersonaInvalid { .. } => Some(
                "Make sure the persona has a name and instructions, and that imported files are valid JSON."
            ),

            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            self.code().as_str(),
            self
        );

        if let Some(hint) = self.suggestion() {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an extraction error
    pub fn extraction_failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ExtractionFailed {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a persona not found error
    pub fn persona_not_found(name: impl Into<String>) -> Self {
        Error::PersonaNotFound { name: name.into() }
    }

    /// Create a persona invalid error
    pub fn persona_invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::PersonaInvalid {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
