//! Show configuration

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use stealth_vault::config::{default_config_path, default_keypair_path, VaultConfig};

pub fn run(config: &VaultConfig, config_path: Option<&Path>) -> Result<()> {
    println!();
    println!("{}", "Stealth Vault Configuration".yellow().bold());
    println!();

    println!("{}:", "Settings File".cyan());
    match config_path {
        Some(path) => println!("  {}", path.display()),
        None => {
            let path = default_config_path()?;
            let state = if path.exists() { "" } else { " (not present, using defaults)" };
            println!("  {}{}", path.display(), state.dimmed());
        }
    }
    println!();

    println!("{}:", "RPC Endpoint".cyan());
    println!("  {}", config.rpc_url);
    println!();

    println!("{}:", "Program ID".cyan());
    println!("  {}", config.program_id);
    println!();

    println!("{}:", "Key Derivation".cyan());
    println!("  Domain tag:        {}", config.domain_tag);
    println!("  Verify signature:  {}", config.verify_signature);
    println!("  Auto derive:       {}", config.auto_derive);
    println!("  Query timeout:     {}s", config.query_timeout_secs);
    println!();

    println!("{}:", "Default Wallet".cyan());
    println!("  {}", default_keypair_path()?.display());

    Ok(())
}
