//! Persona system
//!
//! A persona carries a name, instructions, capability flags and the knowledge
//! files it owns. The chat core only reads personas; the store persists them.

pub mod store;
pub mod types;

pub use store::PersonaStore;
pub use types::{Capabilities, PersonaConfig, Visibility, MAX_STARTERS};
