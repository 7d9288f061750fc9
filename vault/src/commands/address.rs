//! Display the vault address of a wallet

use std::str::FromStr;

use anyhow::{Context, Result};
use colored::Colorize;
use solana_sdk::{pubkey::Pubkey, signer::Signer};

use stealth_vault::config::{load_solana_keypair, VaultConfig};
use stealth_vault::VaultRecord;

pub fn run(config: &VaultConfig, keypair_path: Option<&str>, owner: Option<&str>) -> Result<()> {
    let owner = match owner {
        Some(owner) => Pubkey::from_str(owner).with_context(|| format!("Invalid owner: {}", owner))?,
        None => load_solana_keypair(keypair_path)?.pubkey(),
    };
    let program_id = config.program_id()?;
    let record = VaultRecord::uninitialized(&owner, &program_id);

    println!();
    println!("{}", "Vault Address".yellow().bold());
    println!();
    println!("{}", record.vault_address);
    println!();
    println!("{}:", "Components".dimmed());
    println!("  Owner:    {}", owner);
    println!("  Program:  {}", program_id);
    println!("  Bump:     {}", record.vault_bump);
    println!("  Registry: {}", record.registry_address);

    Ok(())
}
