//! GPT Studio - custom assistant personas
//!
//! This is the main entry point for the `gpt-studio` binary. File reads and
//! terminal I/O happen here; the library crate only sees bytes and values.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use gpt_studio::capabilities::CapabilityKind;
use gpt_studio::chat::{
    CredentialChain, CredentialStore, FileCredentialStore, OpenAiCompletionClient, Orchestrator,
    StaticCredential,
};
use gpt_studio::cli::{
    Cli, Commands, ConfigSubcommand, KeySubcommand, KnowledgeSubcommand, PersonaSubcommand,
};
use gpt_studio::config::{self, AppConfig};
use gpt_studio::error::{Error, Result};
use gpt_studio::knowledge::{self, FileUpload};
use gpt_studio::persona::{PersonaConfig, PersonaStore};
use gpt_studio::{logging, version};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    // Commands that don't need the full configuration
    match &cli.command {
        Commands::Version => {
            version::print_version();
            return Ok(());
        }
        Commands::Config { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            return handle_config_command(subcommand.clone(), cli.config.as_deref());
        }
        _ => {}
    }

    let config = AppConfig::load(cli.config.as_deref())?;

    // The guards must be kept alive for the lifetime of the program
    let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

    debug!(
        version = %version::build_info().full_version(),
        persona_dir = %config.storage.persona_dir,
        "Starting GPT Studio"
    );

    let store = PersonaStore::new(config.persona_dir());

    match cli.command {
        Commands::Chat { persona, message } => {
            runtime()?.block_on(run_chat(&config, &store, &persona, message))
        }
        Commands::Persona { subcommand } => handle_persona_command(subcommand, &store, &config),
        Commands::Knowledge { subcommand } => {
            runtime()?.block_on(handle_knowledge_command(subcommand, &store))
        }
        Commands::Key { subcommand } => runtime()?.block_on(handle_key_command(subcommand, &config)),
        // Handled before configuration was loaded
        Commands::Version | Commands::Config { .. } => Ok(()),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))
}

// ─────────────────────────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────────────────────────

fn credential_chain(config: &AppConfig) -> CredentialChain {
    CredentialChain::new()
        .with(StaticCredential::new(&config.openai.api_key))
        .with(FileCredentialStore::new(config.credentials_file()))
}

fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator> {
    let client = OpenAiCompletionClient::new(&config.openai)?;
    Ok(Orchestrator::new(
        Arc::new(client),
        Arc::new(credential_chain(config)),
    ))
}

async fn run_chat(
    config: &AppConfig,
    store: &PersonaStore,
    persona_ref: &str,
    message: Option<String>,
) -> Result<()> {
    let persona = store.resolve(persona_ref)?;
    if let Err(e) = persona.check() {
        warn!(error = %e.format_for_log(), "Persona is incomplete; replies may be generic");
    }

    let orchestrator = build_orchestrator(config)?;

    match message {
        Some(message) => {
            println!("{}", orchestrator.send_message(&message, &persona).await);
            Ok(())
        }
        None => repl(&orchestrator, &persona).await,
    }
}

async fn repl(orchestrator: &Orchestrator, persona: &PersonaConfig) -> Result<()> {
    let starters = persona.starters();

    // Display only; every message is answered without prior turns
    let mut transcript: Vec<(String, String)> = Vec::new();

    println!(
        "Chatting with {}. Type /starters for ideas, /history to review, /quit to leave.",
        persona.name
    );
    print_starters(&starters);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        let input = line.trim();

        let message = match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/starters" => {
                print_starters(&starters);
                continue;
            }
            "/history" => {
                for (you, them) in &transcript {
                    println!("\nYou: {}\n{}: {}", you, persona.name, them);
                }
                continue;
            }
            // "/2" sends the second starter
            cmd if cmd.starts_with('/') => match cmd[1..].parse::<usize>() {
                Ok(n) if (1..=starters.len()).contains(&n) => starters[n - 1].to_string(),
                _ => {
                    println!("Unknown command. Use /starters, /history, /<number> or /quit.");
                    continue;
                }
            },
            text => text.to_string(),
        };

        let reply = orchestrator.send_message(&message, persona).await;
        println!("\n{}: {}", persona.name, reply);
        transcript.push((message, reply));
    }

    Ok(())
}

fn print_starters(starters: &[&str]) {
    if starters.is_empty() {
        return;
    }
    println!("\nConversation starters:");
    for (i, starter) in starters.iter().enumerate() {
        println!("  /{}  {}", i + 1, starter);
    }
}

// ─────────────────────────────────────────────────────────────────
// Personas
// ─────────────────────────────────────────────────────────────────

fn handle_persona_command(
    subcommand: PersonaSubcommand,
    store: &PersonaStore,
    config: &AppConfig,
) -> Result<()> {
    match subcommand {
        PersonaSubcommand::New {
            name,
            description,
            instructions,
            instructions_file,
            starters,
            capabilities,
            visibility,
        } => {
            let instructions = match (instructions, instructions_file) {
                (Some(text), _) => text,
                (None, Some(path)) => {
                    std::fs::read_to_string(&path).map_err(|e| Error::IoRead { path, source: e })?
                }
                (None, None) => String::new(),
            };

            let mut persona = PersonaConfig::new(name);
            persona.description = description;
            persona.instructions = instructions;
            persona.conversation_starters = starters;
            persona.visibility = visibility;
            for capability in capabilities {
                persona.capabilities.set(capability.into(), true);
            }

            let saved = store.save(persona)?;
            println!("Created persona '{}' ({})", saved.name, saved.id);
            if let Err(e) = saved.check() {
                eprintln!("Note: {}", e);
            }
        }

        PersonaSubcommand::List => {
            let personas = store.list()?;
            if personas.is_empty() {
                println!("No personas yet. Create one with 'gpt-studio persona new <NAME> -i <INSTRUCTIONS>'.");
                return Ok(());
            }
            for p in personas {
                println!(
                    "{:<36}  {:<24}  {:>2} file(s)  {:<7}  {}",
                    p.id,
                    p.name,
                    p.knowledge_files.len(),
                    p.visibility,
                    p.updated_at
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default()
                );
            }
        }

        PersonaSubcommand::Show { persona } => {
            print_persona(&store.resolve(&persona)?);
        }

        PersonaSubcommand::Delete { persona } => {
            let p = store.resolve(&persona)?;
            if store.delete(&p.id)? {
                println!("Deleted persona '{}' ({})", p.name, p.id);
            }
        }

        PersonaSubcommand::Export { persona, output } => {
            let p = store.resolve(&persona)?;
            let path = store.export(&p.id, &output)?;
            println!("Exported '{}' to {}", p.name, path.display());
        }

        PersonaSubcommand::Import { file } => {
            let p = store.import(&file)?;
            println!("Imported persona '{}' ({})", p.name, p.id);
        }

        PersonaSubcommand::Check { persona } => {
            let p = store.resolve(&persona)?;
            p.check()?;
            println!("Persona '{}' is ready to chat.", p.name);
        }

        PersonaSubcommand::Share { persona } => {
            let p = store.resolve(&persona)?;
            println!("{}", p.share_link(&config.sharing.base_url));
            if p.visibility == gpt_studio::persona::Visibility::Private {
                eprintln!("Note: '{}' is private; only you can open this link.", p.name);
            }
        }
    }

    Ok(())
}

fn print_persona(p: &PersonaConfig) {
    let tools: Vec<&str> = p
        .capabilities
        .enabled()
        .iter()
        .map(CapabilityKind::display_name)
        .collect();

    println!("Name:         {}", p.name);
    println!("Id:           {}", p.id);
    if !p.description.is_empty() {
        println!("Description:  {}", p.description);
    }
    println!("Visibility:   {}", p.visibility);
    if let Some(ref author) = p.author {
        println!("Author:       {}", author);
    }
    if let Some(updated) = p.updated_at {
        println!("Updated:      {}", updated.format("%Y-%m-%d %H:%M UTC"));
    }
    println!(
        "Capabilities: {}",
        if tools.is_empty() { "none".to_string() } else { tools.join(", ") }
    );

    let starters = p.starters();
    if !starters.is_empty() {
        println!("Starters:");
        for s in starters {
            println!("  - {}", s);
        }
    }

    println!("Knowledge:    {} file(s)", p.knowledge_files.len());
    for f in &p.knowledge_files {
        println!("  - {} ({})", f.name, knowledge::summarize(f));
    }

    if !p.instructions.is_empty() {
        println!("\nInstructions:\n{}", p.instructions);
    }
}

// ─────────────────────────────────────────────────────────────────
// Knowledge
// ─────────────────────────────────────────────────────────────────

/// MIME type implied by a file extension, empty when unknown.
fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "",
    }
}

async fn handle_knowledge_command(subcommand: KnowledgeSubcommand, store: &PersonaStore) -> Result<()> {
    match subcommand {
        KnowledgeSubcommand::Add {
            persona,
            files,
            mime,
        } => {
            let mut p = store.resolve(&persona)?;

            let mut uploads = Vec::with_capacity(files.len());
            for path in files {
                let bytes = tokio::fs::read(&path).await.map_err(|e| Error::IoRead {
                    path: path.clone(),
                    source: e,
                })?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let mime_type = mime.clone().unwrap_or_else(|| guess_mime(&path).to_string());
                uploads.push(FileUpload::new(name, mime_type, bytes));
            }

            let outcome = knowledge::ingest_batch(&uploads)?;
            for e in &outcome.failures {
                eprintln!("Skipped: {}", e);
            }
            if outcome.files.is_empty() {
                if let Some(first) = outcome.failures.into_iter().next() {
                    return Err(first);
                }
                return Ok(());
            }

            for f in &outcome.files {
                println!("Added {} ({}, {})", f.name, f.id, knowledge::summarize(f));
            }
            p.add_knowledge_files(outcome.files);
            store.save(p)?;
        }

        KnowledgeSubcommand::List { persona } => {
            let p = store.resolve(&persona)?;
            if p.knowledge_files.is_empty() {
                println!("'{}' has no knowledge files.", p.name);
            }
            for f in &p.knowledge_files {
                println!(
                    "{}  {}  {} bytes  {}",
                    f.id,
                    f.name,
                    f.size,
                    knowledge::summarize(f)
                );
            }
        }

        KnowledgeSubcommand::Remove { persona, file_id } => {
            let mut p = store.resolve(&persona)?;
            if !p.remove_knowledge_file(&file_id) {
                return Err(Error::KnowledgeFileNotFound { id: file_id });
            }
            store.save(p)?;
            println!("Removed {}", file_id);
        }

        KnowledgeSubcommand::Search { persona, query } => {
            let p = store.resolve(&persona)?;
            let hits = knowledge::search_hits(&query, &p.knowledge_files);
            if hits.is_empty() {
                println!("No matches.");
            }
            for hit in hits {
                println!("[score {}] {}\n", hit.score, hit.excerpt);
            }
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────
// API Key
// ─────────────────────────────────────────────────────────────────

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 10 {
        return "****".to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

async fn handle_key_command(subcommand: KeySubcommand, config: &AppConfig) -> Result<()> {
    let file_store = FileCredentialStore::new(config.credentials_file());

    match subcommand {
        KeySubcommand::Set { key } => {
            file_store.set_key(&key)?;
            println!("API key stored in {}", file_store.path().display());
        }

        KeySubcommand::Clear => {
            if file_store.clear()? {
                println!("Stored API key removed.");
            } else {
                println!("No stored API key.");
            }
            if !config.openai.api_key.trim().is_empty() {
                println!("Note: a key is still set in the configuration or environment.");
            }
        }

        KeySubcommand::Status { check } => {
            let from_config = StaticCredential::new(&config.openai.api_key).api_key()?;
            let key = match from_config {
                Some(key) => {
                    println!("API key: configured in settings ({})", mask_key(&key));
                    Some(key)
                }
                None => match file_store.api_key()? {
                    Some(key) => {
                        println!(
                            "API key: stored in {} ({})",
                            file_store.path().display(),
                            mask_key(&key)
                        );
                        Some(key)
                    }
                    None => {
                        println!("API key: not configured (replies are composed locally)");
                        None
                    }
                },
            };

            if check {
                match key {
                    Some(key) => {
                        let client = OpenAiCompletionClient::new(&config.openai)?;
                        client.test_connection(&key).await?;
                        println!("Connection OK: {}", config.openai.base_url);
                    }
                    None => println!("Nothing to check."),
                }
            }
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand, config_path: Option<&str>) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show => {
            let cfg = AppConfig::load(config_path)?;
            println!("{}", toml::to_string_pretty(&cfg.redacted())?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), force)?;
            println!("Configuration file created: {}", written.display());
        }
        ConfigSubcommand::Validate => {
            AppConfig::load(config_path)?;
            println!("Configuration is valid.");
        }
    }

    Ok(())
}
