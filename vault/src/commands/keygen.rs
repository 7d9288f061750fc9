//! Derive viewing keys by signing the domain message with the local keypair

use anyhow::{Context, Result};
use colored::Colorize;
use solana_sdk::signer::Signer;

use stealth_vault::config::{load_solana_keypair, VaultConfig};
use stealth_vault::{generate_viewing_keys, KeypairSigner};

pub async fn run(config: &VaultConfig, keypair_path: Option<&str>, export_view_key: bool) -> Result<()> {
    let session_config = config.session_config()?;
    let keypair = load_solana_keypair(keypair_path)?;
    let owner = keypair.pubkey();
    let signer = KeypairSigner::new(keypair);

    println!("{}", "Deriving viewing keys...".cyan());

    let keys = generate_viewing_keys(
        Some(&signer),
        &session_config.domain,
        session_config.verify_signature,
    )
    .await
    .context("Viewing key derivation failed")?;

    let (spend_pubkey, view_pubkey) = keys.public_keys();

    println!();
    println!("{}", "Viewing keys derived".green().bold());
    println!();
    println!("{}:", "Wallet".yellow());
    println!("  {}", owner);
    println!();
    println!("{}:", "Spend Public Key".yellow());
    println!("  {}", hex::encode(spend_pubkey));
    println!();
    println!("{}:", "View Public Key".yellow());
    println!("  {}", hex::encode(view_pubkey));
    println!();

    if export_view_key {
        println!("{}", "=== VIEW KEY (read-only, cannot spend) ===".red().bold());
        println!("  {}", hex::encode(keys.view().export_secret()));
        println!();
        println!("{}", "Anyone holding this key can see your vault activity.".red());
        println!();
    }

    println!(
        "{}",
        "Keys are held in memory only. Re-run keygen to derive them again.".dimmed()
    );

    Ok(())
}
