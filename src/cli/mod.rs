//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod say;

use std::error::Error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cli::chat::run_chat;
use crate::cli::say::run_say;
use crate::core::completion::ClientConfig;
use crate::core::config::{Config, ConfigKey, API_KEY_ENV};

#[derive(Parser)]
#[command(name = "gemchat")]
#[command(version)]
#[command(about = "A terminal chat interface for the Gemini API")]
#[command(
    long_about = "gemchat is a line-oriented terminal chat client for the Gemini \
generateContent API. Each message is sent with the full conversation so far; \
rate-limited requests are retried with exponential backoff.\n\n\
Configuration:\n\
  Use 'gemchat set api-key <KEY>' to store a key in the config file.\n\n\
Environment Variables (fallback if no key is configured):\n\
  GEMINI_API_KEY    Your Gemini API key\n\
  RUST_LOG          Log filter for diagnostics written to stderr\n\n\
Controls:\n\
  Enter             Send the message\n\
  Ctrl+C            Cancel the pending reply (pauses the chat), or quit at the prompt\n\
  /pause            Pause the chat, cancelling any pending reply\n\
  /resume           Accept messages again after a pause\n\
  /help             Show commands\n\
  /quit             Leave the chat"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for chat (overrides the configured model)
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Log request diagnostics to stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive chat (default)
    Chat,
    /// Send a single prompt and print the reply
    Say {
        /// Prompt text (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Set a configuration value, or print the configuration when no value is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key
        value: Option<String>,
    },
    /// Unset a configuration value
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "gemchat=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn resolve_client_config(config: &Config, model: Option<&str>) -> ClientConfig {
    let client_config = config.client_config_from_env(model);
    if client_config.api_key.is_empty() {
        eprintln!(
            "⚠️  No API key configured. Run 'gemchat set api-key <KEY>' or export {API_KEY_ENV}."
        );
    }
    client_config
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let config = Config::load()?;
            run_chat(resolve_client_config(&config, args.model.as_deref())).await
        }
        Commands::Say { prompt } => {
            let config = Config::load()?;
            run_say(
                prompt,
                resolve_client_config(&config, args.model.as_deref()),
            )
            .await
        }
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            let (Some(key), Some(value)) = (key, value) else {
                config.print_all();
                return Ok(());
            };
            let key: ConfigKey = match key.parse() {
                Ok(key) => key,
                Err(err) => {
                    eprintln!("❌ {err}");
                    std::process::exit(1);
                }
            };
            if let Err(err) = config.set(key, &value) {
                eprintln!("❌ {err}");
                std::process::exit(1);
            }
            config.save()?;
            if key == ConfigKey::ApiKey {
                println!("✅ Set {key}");
            } else {
                println!("✅ Set {key} to: {}", value.trim());
            }
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            let key: ConfigKey = match key.parse() {
                Ok(key) => key,
                Err(err) => {
                    eprintln!("❌ {err}");
                    std::process::exit(1);
                }
            };
            config.unset(key);
            config.save()?;
            println!("✅ Unset {key}");
            Ok(())
        }
    }
}
