//! Conversation core
//!
//! [`Orchestrator`] combines knowledge search, simulated capabilities and a
//! remote completion call, and degrades to a locally composed reply whenever
//! the remote path is unavailable.

pub mod completion;
pub mod credentials;
pub mod fallback;
pub mod orchestrator;
pub mod prompt;

pub use completion::{CompletionClient, OpenAiCompletionClient, RemoteError, NO_RESPONSE};
pub use credentials::{CredentialChain, CredentialStore, FileCredentialStore, StaticCredential};
pub use orchestrator::{Orchestrator, Reply, ReplySource};
pub use prompt::build_system_prompt;
