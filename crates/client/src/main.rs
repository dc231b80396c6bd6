//! tinychat client
//!
//! Joins a chat session on a tinychat server and keeps the terminal in sync
//! with it by polling, while sending whatever the operator types.

mod config;
mod connection;
mod console;
mod coordinator;
mod handshake;
mod sync;
#[cfg(test)]
mod testutil;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::ClientConfig;
use connection::{HttpSessionClient, SessionApi};
use console::{ConsoleInput, StdoutTranscript, Transcript};
use coordinator::{Coordinator, ShutdownReason};
use handshake::HandshakeOptions;

#[derive(Parser)]
#[command(name = "tinychat")]
#[command(about = "tinychat client - chat in a session from the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Server base URL, overriding the config file
    #[arg(short, long, global = true)]
    server: Option<String>,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Join a session and chat (the default)
    Join {
        #[arg(short, long)]
        user: Option<String>,

        #[arg(long)]
        code: Option<String>,
    },

    /// Create a new session and print its code
    Create {
        #[arg(short, long)]
        user: String,
    },

    /// Delete a session you created
    Destroy {
        code: String,

        #[arg(short, long)]
        user: String,
    },

    /// Print a session's messages and exit
    History {
        code: String,
    },

    GenerateConfig {
        #[arg(short, long, default_value = "client.toml")]
        output: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The terminal doubles as the chat window, so stay quiet unless asked.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.unwrap_or_else(ClientConfig::default_path);
    let mut config = if config_path.exists() {
        ClientConfig::load(&config_path)?
    } else {
        ClientConfig::default()
    };

    if let Some(server) = cli.server {
        config.connection.base_url = server;
    }

    match cli.command {
        None => run_join(&config, None, None).await,
        Some(Commands::Join { user, code }) => run_join(&config, user, code).await,
        Some(Commands::Create { user }) => run_create(&config, &user).await,
        Some(Commands::Destroy { code, user }) => run_destroy(&config, &code, &user).await,
        Some(Commands::History { code }) => run_history(&config, &code).await,
        Some(Commands::GenerateConfig { output }) => generate_config(&output),
    }
}

async fn run_join(config: &ClientConfig, user: Option<String>, code: Option<String>) -> Result<()> {
    info!("Starting tinychat client v{}", env!("CARGO_PKG_VERSION"));
    println!("Using API at: {}", config.connection.base_url);

    let api = Arc::new(HttpSessionClient::new(&config.connection)?);
    let transcript: Arc<dyn Transcript> = Arc::new(StdoutTranscript::new(config.ui.show_timestamps));

    let interrupt = CancellationToken::new();
    tokio::spawn(console::watch_interrupt(interrupt.clone()));
    let mut input = ConsoleInput::spawn(interrupt.clone()).context("Failed to start input reader")?;

    let options = HandshakeOptions {
        username: user,
        code,
        warn_on_name_collision: config.ui.warn_on_name_collision,
        interrupt,
    };
    let Some(session) = handshake::establish(api.as_ref(), &mut input, transcript.as_ref(), options).await else {
        println!("Exiting");
        return Ok(());
    };

    transcript.notice("Type your messages. Press Ctrl+C or type /quit to leave.");
    let reason = Coordinator::new(api, session, transcript.clone(), config.sync.clone())
        .run(&mut input)
        .await;

    match reason {
        ShutdownReason::SessionRemoved => transcript.notice("The session has ended."),
        ShutdownReason::InputClosed | ShutdownReason::Quit => transcript.notice("Leaving..."),
    }

    Ok(())
}

async fn run_create(config: &ClientConfig, user: &str) -> Result<()> {
    let api = HttpSessionClient::new(&config.connection)?;

    match api.create_session(user).await {
        Ok(code) => {
            println!("Created session: {}", code);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn run_destroy(config: &ClientConfig, code: &str, user: &str) -> Result<()> {
    let api = HttpSessionClient::new(&config.connection)?;

    let token = match api.connect(code, user).await {
        Ok(token) => token,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match api.destroy_session(code, &token).await {
        Ok(()) => {
            println!("Destroyed session: {}", code);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn run_history(config: &ClientConfig, code: &str) -> Result<()> {
    let api = HttpSessionClient::new(&config.connection)?;
    let transcript = StdoutTranscript::new(config.ui.show_timestamps);

    match api.list(code).await {
        Ok(messages) => {
            for msg in &messages {
                transcript.message(msg);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn generate_config(output: &PathBuf) -> Result<()> {
    ClientConfig::default().save(output)?;
    println!("Generated example config: {:?}", output);
    Ok(())
}
