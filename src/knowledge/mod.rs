//! Knowledge store
//!
//! Uploads are validated ([`validate`]), converted into immutable
//! [`KnowledgeFile`] records ([`ingest`]) and searched with a keyword-overlap
//! ranker ([`search`]). Nothing here touches the file system; callers hand in
//! bytes together with the filename and declared MIME type.

pub mod extract;
pub mod search;
pub mod types;
pub mod validate;

pub use extract::{ingest, ingest_batch, summarize, BatchOutcome};
pub use search::{search, search_hits, SearchHit};
pub use types::{DocumentKind, FileUpload, KnowledgeFile};
pub use validate::{validate, validate_batch, MAX_FILE_SIZE, SUPPORTED_EXTENSIONS};
