//! Persona storage on disk
//!
//! One pretty-printed JSON document per persona, named `<id>.json`, under the
//! configured persona directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

use super::types::PersonaConfig;

// ─────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────

const EXTENSION: &str = "json";
const DEFAULT_AUTHOR: &str = "You";
const IMPORTED_AUTHOR: &str = "You (Imported)";

// ─────────────────────────────────────────────────────────────────
// Persona Store
// ─────────────────────────────────────────────────────────────────

/// Directory-backed persona storage for a single local user.
pub struct PersonaStore {
    /// Root directory for persona documents: ~/.gpt-studio/personas/
    persona_dir: PathBuf,
}

impl PersonaStore {
    pub fn new(persona_dir: PathBuf) -> Self {
        Self { persona_dir }
    }

    /// Get the persona directory.
    pub fn persona_dir(&self) -> &Path {
        &self.persona_dir
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.persona_dir.exists() {
            fs::create_dir_all(&self.persona_dir).map_err(|e| Error::IoWrite {
                path: self.persona_dir.clone(),
                source: e,
            })?;
            debug!(path = %self.persona_dir.display(), "Created persona directory");
        }
        Ok(())
    }

    /// Document path for an id. Ids that could escape the directory resolve to nothing.
    fn persona_path(&self, id: &str) -> Option<PathBuf> {
        let safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        safe.then(|| self.persona_dir.join(format!("{}.{}", id, EXTENSION)))
    }

    // ─────────────────────────────────────────────────────────────
    // Save / Delete
    // ─────────────────────────────────────────────────────────────

    /// Persist a persona, filling in id, timestamps and author as needed.
    pub fn save(&self, mut persona: PersonaConfig) -> Result<PersonaConfig> {
        self.ensure_dir()?;

        let now = Utc::now();
        if persona.id.is_empty() {
            persona.id = Uuid::new_v4().to_string();
        }
        if persona.created_at.is_none() {
            persona.created_at = Some(now);
        }
        persona.updated_at = Some(now);
        if persona.author.is_none() {
            persona.author = Some(DEFAULT_AUTHOR.to_string());
        }

        let path = self
            .persona_path(&persona.id)
            .ok_or_else(|| Error::persona_invalid(&persona.name, "id contains unsupported characters"))?;
        let json = serde_json::to_string_pretty(&persona)?;
        fs::write(&path, json).map_err(|e| Error::IoWrite {
            path: path.clone(),
            source: e,
        })?;

        info!(id = %persona.id, name = %persona.name, "Persona saved");
        Ok(persona)
    }

    /// Remove a persona. Returns whether a document existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let path = match self.persona_path(id) {
            Some(p) if p.exists() => p,
            _ => return Ok(false),
        };
        fs::remove_file(&path).map_err(|e| Error::IoWrite {
            path: path.clone(),
            source: e,
        })?;
        info!(id = %id, "Persona deleted");
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────────
    // List / Load
    // ─────────────────────────────────────────────────────────────

    /// All stored personas, most recently updated first. Unreadable documents are skipped.
    pub fn list(&self) -> Result<Vec<PersonaConfig>> {
        if !self.persona_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.persona_dir).map_err(|e| Error::IoRead {
            path: self.persona_dir.clone(),
            source: e,
        })?;

        let mut personas = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            match read_document(&path) {
                Ok(persona) => personas.push(persona),
                Err(e) => warn!(path = %path.display(), error = %e.format_for_log(), "Skipping unreadable persona"),
            }
        }

        personas.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(personas)
    }

    /// Load a persona by id.
    pub fn load(&self, id: &str) -> Result<PersonaConfig> {
        match self.persona_path(id) {
            Some(path) if path.exists() => read_document(&path),
            _ => Err(Error::persona_not_found(id)),
        }
    }

    /// Find a persona by exact id, then by case-insensitive name.
    pub fn resolve(&self, id_or_name: &str) -> Result<PersonaConfig> {
        if let Ok(persona) = self.load(id_or_name) {
            return Ok(persona);
        }

        let wanted = id_or_name.trim().to_lowercase();
        self.list()?
            .into_iter()
            .find(|p| p.name.trim().to_lowercase() == wanted)
            .ok_or_else(|| Error::persona_not_found(id_or_name))
    }

    // ─────────────────────────────────────────────────────────────
    // Export / Import
    // ─────────────────────────────────────────────────────────────

    /// Write a persona document to an arbitrary path.
    pub fn export(&self, id: &str, dest: &Path) -> Result<PathBuf> {
        let persona = self.load(id)?;
        let json = serde_json::to_string_pretty(&persona)?;
        fs::write(dest, json).map_err(|e| Error::IoWrite {
            path: dest.to_path_buf(),
            source: e,
        })?;
        info!(id = %id, path = %dest.display(), "Persona exported");
        Ok(dest.to_path_buf())
    }

    /// Import a persona document as a new persona with a fresh id.
    pub fn import(&self, src: &Path) -> Result<PersonaConfig> {
        let mut persona = read_document(src)?;
        persona.id = String::new();
        persona.created_at = None;
        persona.updated_at = None;
        persona.author = Some(IMPORTED_AUTHOR.to_string());
        self.save(persona)
    }
}

fn read_document(path: &Path) -> Result<PersonaConfig> {
    let content = fs::read_to_string(path).map_err(|e| Error::IoRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content)
        .map_err(|e| Error::persona_invalid(path.display().to_string(), format!("invalid JSON: {}", e)))
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
