//! GPT Studio - custom assistant personas with graceful offline replies
//!
//! The conversational core lives in [`chat`]: given a message and a
//! [`persona::PersonaConfig`] it searches the persona's [`knowledge`] files,
//! asks a remote completion service when a key is configured, and otherwise
//! composes a reply locally from knowledge excerpts and simulated
//! [`capabilities`].

pub mod capabilities;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod logging;
pub mod persona;
pub mod version;

pub use error::{Error, ErrorCode, Result};
