//! Core types for personas.
//!
//! A persona is a user-authored assistant configuration: who it is, how it
//! behaves, which simulated tools it may use and which documents it knows.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capabilities::CapabilityKind;
use crate::error::{Error, Result};
use crate::knowledge::KnowledgeFile;

/// Conversation starters shown at most.
pub const MAX_STARTERS: usize = 4;

// ─────────────────────────────────────────────────────────────────
// Visibility
// ─────────────────────────────────────────────────────────────────

/// Who may open a persona. Stored and displayed only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
    Link,
    Public,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Private => write!(f, "private"),
            Visibility::Link => write!(f, "link"),
            Visibility::Public => write!(f, "public"),
        }
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "link" => Ok(Visibility::Link),
            "public" => Ok(Visibility::Public),
            _ => Err(format!(
                "Unknown visibility '{}'. Valid: private, link, public",
                s
            )),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Capabilities
// ─────────────────────────────────────────────────────────────────

/// Capability flags. Independent; every combination is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub web_search: bool,

    #[serde(default)]
    pub canvas: bool,

    #[serde(default)]
    pub dalle_image_generation: bool,

    #[serde(default)]
    pub code_interpreter: bool,
}

impl Capabilities {
    /// Whether the flag for `kind` is set.
    pub fn is_enabled(&self, kind: CapabilityKind) -> bool {
        match kind {
            CapabilityKind::WebSearch => self.web_search,
            CapabilityKind::ImageGeneration => self.dalle_image_generation,
            CapabilityKind::CodeInterpreter => self.code_interpreter,
            CapabilityKind::Canvas => self.canvas,
        }
    }

    /// Set the flag for `kind`.
    pub fn set(&mut self, kind: CapabilityKind, enabled: bool) {
        match kind {
            CapabilityKind::WebSearch => self.web_search = enabled,
            CapabilityKind::ImageGeneration => self.dalle_image_generation = enabled,
            CapabilityKind::CodeInterpreter => self.code_interpreter = enabled,
            CapabilityKind::Canvas => self.canvas = enabled,
        }
    }

    /// Enabled capabilities in the fixed evaluation order.
    pub fn enabled(&self) -> Vec<CapabilityKind> {
        CapabilityKind::all()
            .iter()
            .copied()
            .filter(|kind| self.is_enabled(*kind))
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────
// Persona Config
// ─────────────────────────────────────────────────────────────────

/// Full persona configuration, stored as JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Assigned by the store on first save.
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Free text defining behavior.
    #[serde(default)]
    pub instructions: String,

    /// Suggested prompts; may contain blank placeholders.
    #[serde(default)]
    pub conversation_starters: Vec<String>,

    #[serde(default)]
    pub capabilities: Capabilities,

    /// Documents owned by this persona, in upload order.
    #[serde(default)]
    pub knowledge_files: Vec<KnowledgeFile>,

    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl PersonaConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Ensure the persona can be chatted with: name and instructions are required.
    pub fn check(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::persona_invalid("(unnamed)", "a name is required"));
        }
        if self.instructions.trim().is_empty() {
            return Err(Error::persona_invalid(&self.name, "instructions are required"));
        }
        Ok(())
    }

    /// Non-blank conversation starters, at most [`MAX_STARTERS`].
    pub fn starters(&self) -> Vec<&str> {
        self.conversation_starters
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .take(MAX_STARTERS)
            .collect()
    }

    /// Shareable link for this persona under `base_url`.
    pub fn share_link(&self, base_url: &str) -> String {
        format!("{}/gpt/{}", base_url.trim_end_matches('/'), self.id)
    }

    /// Append ingested files, keeping upload order.
    pub fn add_knowledge_files(&mut self, files: impl IntoIterator<Item = KnowledgeFile>) {
        self.knowledge_files.extend(files);
    }

    /// Drop a knowledge file by id. Returns whether anything was removed.
    pub fn remove_knowledge_file(&mut self, id: &str) -> bool {
        let before = self.knowledge_files.len();
        self.knowledge_files.retain(|f| f.id != id);
        self.knowledge_files.len() != before
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
