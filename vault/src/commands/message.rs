//! Print the message a wallet signs for key derivation

use anyhow::Result;
use colored::Colorize;

use stealth_vault::config::VaultConfig;
use stealth_vault::DomainMessage;

pub fn run(config: &VaultConfig, as_hex: bool) -> Result<()> {
    let message = DomainMessage::for_tag(&config.domain_tag);

    if as_hex {
        println!("{}", hex::encode(message.as_bytes()));
        return Ok(());
    }

    println!();
    println!("{}", "Viewing Key Signing Message".yellow().bold());
    println!();
    println!("{}", message);
    println!();
    println!("{}:", "Domain Tag".cyan());
    println!("  {}", message.tag());
    if let Some(version) = message.version() {
        println!("  version {}", version);
    }
    println!();
    println!(
        "{}",
        "Changing the domain tag rotates every derived key.".dimmed()
    );

    Ok(())
}
