//! cellarnote - command-line front end for the cellarnote wine journal.
//!
//! Signs in with a social identity, keeps the session's token pair in the
//! OS keychain (or a file with `--file-storage`), and issues authenticated
//! requests against the backend.

mod commands;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use cellarnote_core::auth::{default_store, FileTokenStore, StaticIdentity, TokenStore};
use cellarnote_core::{ClientConfig, SessionClient};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "cellarnote")]
#[command(version)]
#[command(about = "Sign in to cellarnote and call its API from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Keep tokens in a file under the config directory instead of the OS keychain
    #[arg(long, global = true)]
    pub file_storage: bool,

    /// Federated identity token, used only while no session is stored
    #[arg(long, global = true, env = "CELLARNOTE_ID_TOKEN", hide_env_values = true)]
    pub id_token: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session tokens
    Login {
        #[command(subcommand)]
        provider: LoginProvider,
    },

    /// Sign out on the server and delete the stored tokens
    Logout,

    /// Show session state and configuration
    Status,

    /// Show the signed-in member's profile
    Whoami,

    /// Search the wine catalog by name
    Search {
        /// Wine name (Korean or English)
        name: String,

        /// Page number, starting at 0
        #[arg(long, default_value_t = 0)]
        page: u32,
    },

    /// List the bottles in your cellar
    Cellar,

    /// Send an authenticated GET request and print the response body
    Get {
        /// API path, e.g. /member/name
        path: String,
    },
}

#[derive(Subcommand)]
pub enum LoginProvider {
    /// Sign in with Apple
    Apple {
        /// Identity token from Sign in with Apple (prompted for when omitted)
        #[arg(long)]
        identity_token: Option<String>,
    },

    /// Sign in with Kakao
    Kakao {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        social_id: String,
    },
}

/// Initialize the tracing subscriber for logging.
/// The returned guard flushes buffered log lines when dropped.
fn init_tracing(verbose: bool) -> WorkerGuard {
    // RUST_LOG overrides the default level (e.g. RUST_LOG=cellarnote_core=trace)
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (writer, guard) = tracing_appender::non_blocking(io::stderr());
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();
    guard
}

fn build_client(cli: &Cli) -> Result<SessionClient> {
    let store: Arc<dyn TokenStore> = if cli.file_storage {
        Arc::new(FileTokenStore::in_config_dir()?)
    } else {
        Arc::from(default_store()?)
    };

    let mut builder = SessionClient::builder(ClientConfig::load()).store(store);
    if let Some(token) = cli.id_token.as_deref().filter(|t| !t.trim().is_empty()) {
        builder = builder.identity(Arc::new(StaticIdentity::new("cli", token)));
    }
    builder.build()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose);
    info!("cellarnote starting");

    let client = build_client(&cli)?;
    commands::run(&client, cli.command, cli.format).await
}
