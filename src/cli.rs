//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for GPT Studio.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::capabilities::CapabilityKind;
use crate::persona::Visibility;

/// GPT Studio - build custom assistant personas and chat with them
///
/// Personas carry instructions, simulated tools and uploaded knowledge files.
/// With an API key, replies come from an OpenAI-compatible service; without
/// one (or when it fails) they are composed locally.
#[derive(Parser, Debug)]
#[command(name = "gpt-studio")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, env = "GPT_STUDIO_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat with a persona (interactive unless --message is given)
    Chat {
        /// Persona id or name
        persona: String,

        /// Send a single message and exit
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Persona management
    Persona {
        #[command(subcommand)]
        subcommand: PersonaSubcommand,
    },

    /// Knowledge files attached to a persona
    Knowledge {
        #[command(subcommand)]
        subcommand: KnowledgeSubcommand,
    },

    /// API key management
    Key {
        #[command(subcommand)]
        subcommand: KeySubcommand,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Display version and build information
    Version,
}

/// Capability flags as accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityArg {
    WebSearch,
    Image,
    Code,
    Canvas,
}

impl From<CapabilityArg> for CapabilityKind {
    fn from(arg: CapabilityArg) -> Self {
        match arg {
            CapabilityArg::WebSearch => CapabilityKind::WebSearch,
            CapabilityArg::Image => CapabilityKind::ImageGeneration,
            CapabilityArg::Code => CapabilityKind::CodeInterpreter,
            CapabilityArg::Canvas => CapabilityKind::Canvas,
        }
    }
}

/// Persona subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum PersonaSubcommand {
    /// Create a persona
    New {
        /// Display name
        name: String,

        /// Short description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Behavior instructions
        #[arg(short, long, conflicts_with = "instructions_file")]
        instructions: Option<String>,

        /// Read instructions from a file
        #[arg(long)]
        instructions_file: Option<PathBuf>,

        /// Conversation starter (repeatable)
        #[arg(long = "starter")]
        starters: Vec<String>,

        /// Enable a capability (repeatable)
        #[arg(long = "capability", value_enum)]
        capabilities: Vec<CapabilityArg>,

        /// private, link or public
        #[arg(long, default_value = "private")]
        visibility: Visibility,
    },

    /// List stored personas, most recently updated first
    List,

    /// Show a persona
    Show {
        /// Persona id or name
        persona: String,
    },

    /// Delete a persona and its knowledge files
    Delete {
        /// Persona id or name
        persona: String,
    },

    /// Write a persona to a JSON file
    Export {
        /// Persona id or name
        persona: String,

        /// Destination file
        output: PathBuf,
    },

    /// Import a persona from a JSON file
    Import {
        /// Source file
        file: PathBuf,
    },

    /// Check that a persona is ready to chat
    Check {
        /// Persona id or name
        persona: String,
    },

    /// Print the shareable link for a persona
    Share {
        /// Persona id or name
        persona: String,
    },
}

/// Knowledge subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum KnowledgeSubcommand {
    /// Upload documents to a persona (all are rejected if any is invalid)
    Add {
        /// Persona id or name
        persona: String,

        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Declared MIME type for every file (guessed from the extension otherwise)
        #[arg(long)]
        mime: Option<String>,
    },

    /// List a persona's knowledge files
    List {
        /// Persona id or name
        persona: String,
    },

    /// Remove a knowledge file by id
    Remove {
        /// Persona id or name
        persona: String,

        /// Knowledge file id
        file_id: String,
    },

    /// Search a persona's knowledge files
    Search {
        /// Persona id or name
        persona: String,

        /// Search text
        query: String,
    },
}

/// API key subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum KeySubcommand {
    /// Store an API key
    Set {
        /// The key
        key: String,
    },

    /// Remove the stored API key
    Clear,

    /// Show whether an API key is configured
    Status {
        /// Also test the key against the completion service
        #[arg(long)]
        check: bool,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the effective configuration (API key redacted)
    Show,

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the configuration
    Validate,
}
