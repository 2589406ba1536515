//! Conversation orchestrator
//!
//! The remote completion is tried once when a key is available. Any failure
//! falls through to local synthesis, so callers always receive text.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::capabilities;
use crate::knowledge;
use crate::persona::PersonaConfig;

use super::completion::CompletionClient;
use super::credentials::CredentialStore;
use super::fallback;
use super::prompt::{build_system_prompt, build_user_message};

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Remote,
    Local,
}

/// A response together with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

/// Stateless conversation core with injected collaborators.
pub struct Orchestrator {
    client: Arc<dyn CompletionClient>,
    credentials: Arc<dyn CredentialStore>,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn CompletionClient>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Answer `message` as `persona`. Never fails.
    pub async fn send_message(&self, message: &str, persona: &PersonaConfig) -> String {
        self.reply(message, persona).await.text
    }

    /// Like [`send_message`](Self::send_message) but reports which path answered.
    pub async fn reply(&self, message: &str, persona: &PersonaConfig) -> Reply {
        let excerpts = knowledge::search(message, &persona.knowledge_files);

        if let Some(api_key) = self.api_key() {
            let system_prompt = build_system_prompt(persona);
            let user_message = build_user_message(message, &excerpts);

            match self
                .client
                .complete(&api_key, &system_prompt, &user_message)
                .await
            {
                Ok(text) => {
                    debug!(persona = %persona.name, "Remote completion used");
                    return Reply {
                        text,
                        source: ReplySource::Remote,
                    };
                }
                Err(e) => {
                    warn!(persona = %persona.name, error = %e, "Remote completion failed, answering locally");
                }
            }
        } else {
            debug!("No API key configured, answering locally");
        }

        let results = capabilities::evaluate(message, &persona.capabilities);
        info!(
            persona = %persona.name,
            excerpts = excerpts.len(),
            capabilities = results.len(),
            "Local reply composed"
        );

        Reply {
            text: fallback::compose(message, persona, &excerpts, &results),
            source: ReplySource::Local,
        }
    }

    fn api_key(&self) -> Option<String> {
        match self.credentials.api_key() {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e.format_for_log(), "Could not read API key, treating as absent");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::credentials::StaticCredential;
    use crate::chat::RemoteError;
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClient {
        outcome: std::result::Result<String, RemoteError>,
        calls: AtomicUsize,
    }

    impl FixedClient {
        fn new(outcome: std::result::Result<String, RemoteError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for FixedClient {
        async fn complete(
            &self,
            _api_key: &str,
            _system_prompt: &str,
            _user_message: &str,
        ) -> std::result::Result<String, RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    struct BrokenStore;

    impl CredentialStore for BrokenStore {
        fn api_key(&self) -> Result<Option<String>> {
            Err(Error::Internal("keyring locked".into()))
        }
    }

    fn persona() -> PersonaConfig {
        let mut p = PersonaConfig::new("Code Mentor");
        p.description = "Teaches Rust".into();
        p.instructions = "Be patient.".into();
        p.capabilities.web_search = true;
        p
    }

    #[tokio::test]
    async fn test_remote_success_is_verbatim() {
        let client = FixedClient::new(Ok("Remote says hi".into()));
        let orch = Orchestrator::new(client.clone(), Arc::new(StaticCredential::new("sk-1")));

        let reply = orch.reply("hello", &persona()).await;
        assert_eq!(reply.text, "Remote says hi");
        assert_eq!(reply.source, ReplySource::Remote);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_key_skips_remote() {
        let client = FixedClient::new(Ok("unused".into()));
        let orch = Orchestrator::new(client.clone(), Arc::new(StaticCredential::none()));

        let reply = orch.reply("hello", &persona()).await;
        assert_eq!(reply.source, ReplySource::Local);
        assert!(reply.text.contains("programming mentor"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_once() {
        let client = FixedClient::new(Err(RemoteError::Status {
            status: 401,
            message: "Incorrect API key provided".into(),
        }));
        let orch = Orchestrator::new(client.clone(), Arc::new(StaticCredential::new("bad")));

        let text = orch
            .send_message("search for the latest news", &persona())
            .await;
        assert!(text.contains("Web Search Results"));
        assert!(!text.contains("Incorrect API key"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_credential_error_means_local() {
        let client = FixedClient::new(Ok("unused".into()));
        let orch = Orchestrator::new(client.clone(), Arc::new(BrokenStore));

        let reply = orch.reply("help", &persona()).await;
        assert_eq!(reply.source, ReplySource::Local);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_local_structure_is_stable() {
        let orch = Orchestrator::new(
            FixedClient::new(Ok(String::new())),
            Arc::new(StaticCredential::none()),
        );
        let p = persona();
        let first = tokio_test::block_on(orch.send_message("search for news about rust", &p));
        let second = tokio_test::block_on(orch.send_message("search for news about rust", &p));

        let head = |s: &str| s.split("\n\n").next().map(str::to_string);
        assert_eq!(head(&first), head(&second));
        assert!(first.starts_with("🔍 **Web Search Results"));
    }
}
