//! Common test utilities and fixtures
//!
//! This module provides shared test infrastructure: an isolated environment
//! for running the binary and a mock OpenAI-compatible HTTP server.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use assert_cmd::Command;
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

// ─────────────────────────────────────────────────────────────────
// Isolated CLI environment
// ─────────────────────────────────────────────────────────────────

/// A home directory and a data directory that no other test shares.
///
/// The working directory and `HOME` both point into the temp dir, so no
/// stray `gpt-studio.toml` or `~/.gpt-studio` on the machine is picked up.
pub struct TestEnv {
    home: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
        }
    }

    pub fn home(&self) -> &Path {
        self.home.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.home.path().join("data")
    }

    pub fn persona_dir(&self) -> PathBuf {
        self.data_dir().join("personas")
    }

    /// Write a file inside the home directory and return its path.
    pub fn write_file(&self, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.home.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// The `gpt-studio` binary with the isolated environment applied.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("gpt-studio").unwrap();
        cmd.current_dir(self.home.path())
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path().join(".config"))
            .env("GPT_STUDIO_DATA_DIR", self.data_dir())
            .env("GPT_STUDIO_OPENAI_API_KEY", "")
            .env_remove("GPT_STUDIO_CONFIG")
            .env_remove("GPT_STUDIO_PERSONA_DIR")
            .env_remove("GPT_STUDIO_CREDENTIALS_FILE")
            .env_remove("GPT_STUDIO_OPENAI_BASE_URL")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Create a persona through the CLI and return its id.
    pub fn create_persona(&self, args: &[&str]) -> String {
        let output = self
            .cmd()
            .args(["persona", "new"])
            .args(args)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "persona new failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8_lossy(&output.stdout);
        // "Created persona 'Name' (<id>)"
        stdout
            .lines()
            .find(|l| l.starts_with("Created persona"))
            .and_then(|l| l.rsplit_once('('))
            .map(|(_, rest)| rest.trim_end_matches(')').to_string())
            .expect("persona id in output")
    }
}

// ─────────────────────────────────────────────────────────────────
// Mock completion server
// ─────────────────────────────────────────────────────────────────

/// One HTTP request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

#[derive(Clone)]
struct CannedResponse {
    status: u16,
    body: String,
    delay: Duration,
}

/// Mock OpenAI-compatible server answering every request with one canned response
pub struct MockCompletionServer {
    addr: SocketAddr,
    shutdown_tx: Option<mpsc::Sender<()>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockCompletionServer {
    /// Start a server that replies with `status` and `body`
    pub async fn start(status: u16, body: impl Into<String>) -> Self {
        Self::start_with_delay(status, body, Duration::ZERO).await
    }

    /// Start a server that waits `delay` before replying
    pub async fn start_with_delay(status: u16, body: impl Into<String>, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let requests_clone = requests.clone();
        let canned = CannedResponse {
            status,
            body: body.into(),
            delay,
        };

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    accept_result = listener.accept() => {
                        if let Ok((stream, _)) = accept_result {
                            let requests = requests_clone.clone();
                            let canned = canned.clone();
                            tokio::spawn(async move {
                                handle_connection(stream, canned, requests).await;
                            });
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            requests,
        }
    }

    /// Base URL to put in `[openai] base_url`
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

impl Drop for MockCompletionServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.try_send(());
        }
    }
}

/// A successful chat-completion body whose first choice says `text`
pub fn completion_body(text: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": text },
                "finish_reason": "stop"
            }
        ]
    })
    .to_string()
}

/// An error body in the OpenAI format
pub fn error_body(message: &str) -> String {
    serde_json::json!({
        "error": { "message": message, "type": "invalid_request_error" }
    })
    .to_string()
}

async fn handle_connection(
    mut stream: TcpStream,
    canned: CannedResponse,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let body_end = buf.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).into_owned();

    requests.lock().push(RecordedRequest {
        method,
        path,
        headers,
        body,
    });

    if !canned.delay.is_zero() {
        tokio::time::sleep(canned.delay).await;
    }

    let reason = if canned.status < 400 { "OK" } else { "Error" };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        canned.status,
        reason,
        canned.body.len(),
        canned.body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_paths_are_isolated() {
        let a = TestEnv::new();
        let b = TestEnv::new();
        assert_ne!(a.data_dir(), b.data_dir());
        assert!(a.persona_dir().starts_with(a.home()));
    }

    #[test]
    fn test_completion_body_shape() {
        let body: serde_json::Value = serde_json::from_str(&completion_body("hi")).unwrap();
        assert_eq!(body["choices"][0]["message"]["content"], "hi");
    }
}
