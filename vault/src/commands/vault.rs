//! Resolve the vault of the local wallet

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use stealth_vault::config::{load_solana_keypair, VaultConfig};
use stealth_vault::{KeypairSigner, RpcLedger, VaultRecord, VaultSession};

const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

pub async fn run(config: &VaultConfig, keypair_path: Option<&str>, refresh: bool, json: bool) -> Result<()> {
    let keypair = load_solana_keypair(keypair_path)?;
    let ledger = Arc::new(RpcLedger::new(&config.rpc_url));
    let session = VaultSession::new(config.session_config()?, ledger);

    if !json {
        println!("{}", "Resolving confidential vault...".cyan());
    }

    session
        .connect(Arc::new(KeypairSigner::new(keypair)))
        .await
        .context("Failed to derive viewing keys")?;

    let mut record = session.create_or_resolve_vault().await?;
    if refresh {
        record = session
            .refresh_vault()
            .await
            .context("Balance refresh failed")?;
    }

    let snapshot = session.snapshot();
    let keys = snapshot
        .viewing_keys
        .context("Viewing keys missing after resolution")?;

    if json {
        let output = serde_json::json!({
            "owner": record.owner.to_string(),
            "vault_address": record.vault_address.to_string(),
            "vault_bump": record.vault_bump,
            "registry_address": record.registry_address.to_string(),
            "balance": record.balance,
            "is_initialized": record.is_initialized,
            "spend_pubkey": hex::encode(keys.spend),
            "view_pubkey": hex::encode(keys.view),
            "lifecycle": snapshot.lifecycle.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_record(&record);
    }

    session.disconnect();
    Ok(())
}

fn print_record(record: &VaultRecord) {
    println!();
    println!("{}", "Vault Summary".yellow().bold());
    println!();
    println!("Owner:    {}", record.owner);
    println!("Vault:    {}", record.vault_address);
    println!("Registry: {}", record.registry_address);
    println!(
        "Balance:  {} SOL",
        format!("{:.9}", record.balance as f64 / LAMPORTS_PER_SOL).green()
    );
    if record.is_initialized {
        println!("Status:   {}", "initialized".green());
    } else {
        println!("Status:   {}", "not yet initialized".yellow());
        println!();
        println!(
            "{}",
            "The vault is registered on your first confidential deposit.".dimmed()
        );
    }
}
