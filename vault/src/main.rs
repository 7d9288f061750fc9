//! stealth-vault CLI - derive viewing keys and inspect the confidential vault of a wallet

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stealth_vault::config::{ConfigOverrides, VaultConfig};

mod commands;

use commands::*;

#[derive(Parser)]
#[command(name = "stealth-vault")]
#[command(version)]
#[command(about = "Signature-derived viewing keys and vault addresses for WaveSwap confidential vaults")]
#[command(long_about = r#"
Your wallet signs one fixed message. That signature deterministically yields a
spend keypair and a view keypair, and your vault lives at a program address
derived from your wallet key. Nothing is written to disk.

Quick Start:
  1. stealth-vault message        Show the message your wallet will sign
  2. stealth-vault keygen         Derive your viewing keys
  3. stealth-vault vault          Resolve your vault on-chain
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Solana RPC URL
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Path to keypair file
    #[arg(long, global = true)]
    keypair: Option<String>,

    /// Vault program id (base58)
    #[arg(long, global = true)]
    program_id: Option<String>,

    /// Ledger query timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Settings file (default: ~/.stealth-vault/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "info" or "stealth_vault=debug" (default: RUST_LOG, else "warn")
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the domain message a wallet signs
    Message {
        /// Print hex bytes instead of text
        #[arg(long)]
        hex: bool,
    },

    /// Sign the domain message and derive spend/view keys
    Keygen {
        /// Also print the view secret (read-only capability)
        #[arg(long)]
        export_view_key: bool,
    },

    /// Derive a vault address without touching the network
    Address {
        /// Owner public key (default: keypair file)
        #[arg(long)]
        owner: Option<String>,
    },

    /// Derive keys, then resolve the vault on-chain
    Vault {
        /// Re-read the balance after resolving
        #[arg(long)]
        refresh: bool,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configuration
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    let config = VaultConfig::load(cli.config.as_deref())?.apply(ConfigOverrides {
        rpc_url: cli.rpc_url,
        program_id: cli.program_id,
        query_timeout_secs: cli.timeout_secs,
    });
    config.validate()?;

    match cli.command {
        Commands::Message { hex } => {
            message::run(&config, hex)?;
        }
        Commands::Keygen { export_view_key } => {
            keygen::run(&config, cli.keypair.as_deref(), export_view_key).await?;
        }
        Commands::Address { owner } => {
            address::run(&config, cli.keypair.as_deref(), owner.as_deref())?;
        }
        Commands::Vault { refresh, json } => {
            vault::run(&config, cli.keypair.as_deref(), refresh, json).await?;
        }
        Commands::Info => {
            info::run(&config, cli.config.as_deref())?;
        }
    }

    Ok(())
}

const DEFAULT_LOG_FILTER: &str = "warn";

/// `--log-level` wins, then `RUST_LOG`, then the default
fn log_filter(level: Option<&str>) -> Result<EnvFilter> {
    match level {
        Some(level) => EnvFilter::try_new(level)
            .map_err(|e| anyhow::anyhow!("Invalid log filter {:?}: {}", level, e)),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))),
    }
}

fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = log_filter(level)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}
