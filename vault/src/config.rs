//! Configuration for the stealth-vault CLI
//!
//! Settings come from `~/.stealth-vault/config.json` (or `--config`), then CLI flags.
//! Viewing keys are never written here or anywhere else.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::{pubkey::Pubkey, signature::Keypair};

use crate::domain::{DomainMessage, VIEWING_KEYS_TAG};
use crate::registry::{DEFAULT_QUERY_TIMEOUT, VAULT_PROGRAM_ID};
use crate::session::SessionConfig;

/// Default directory for stealth-vault settings
const CONFIG_DIR: &str = ".stealth-vault";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

/// User-editable settings
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct VaultConfig {
    /// Solana RPC endpoint
    pub rpc_url: String,
    /// Vault program (base58)
    pub program_id: String,
    /// Upper bound for a single account lookup
    pub query_timeout_secs: u64,
    /// Derive viewing keys as soon as a wallet connects
    pub auto_derive: bool,
    /// Verify the wallet signature before deriving from it
    pub verify_signature: bool,
    /// Domain tag mixed into the signed message
    pub domain_tag: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            program_id: VAULT_PROGRAM_ID.to_string(),
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT.as_secs(),
            auto_derive: true,
            verify_signature: true,
            domain_tag: VIEWING_KEYS_TAG.to_string(),
        }
    }
}

/// Command-line values that take precedence over the file
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub rpc_url: Option<String>,
    pub program_id: Option<String>,
    pub query_timeout_secs: Option<u64>,
}

impl VaultConfig {
    /// Load from `path`, or from the default location when it exists, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let default = default_config_path()?;
                if default.exists() {
                    Self::load_from(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write config file {:?}", path))
    }

    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(rpc_url) = overrides.rpc_url {
            self.rpc_url = rpc_url;
        }
        if let Some(program_id) = overrides.program_id {
            self.program_id = program_id;
        }
        if let Some(secs) = overrides.query_timeout_secs {
            self.query_timeout_secs = secs;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            bail!("rpc_url must not be empty");
        }
        if self.query_timeout_secs == 0 {
            bail!("query_timeout_secs must be greater than zero");
        }
        if self.domain_tag.trim().is_empty() {
            bail!("domain_tag must not be empty");
        }
        self.program_id()?;
        Ok(())
    }

    pub fn program_id(&self) -> Result<Pubkey> {
        Pubkey::from_str(&self.program_id)
            .with_context(|| format!("Invalid program id: {}", self.program_id))
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn session_config(&self) -> Result<SessionConfig> {
        self.validate()?;
        Ok(SessionConfig {
            program_id: self.program_id()?,
            query_timeout: self.query_timeout(),
            auto_derive: self.auto_derive,
            verify_signature: self.verify_signature,
            domain: DomainMessage::for_tag(&self.domain_tag),
        })
    }
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("Could not find home directory")
}

/// Get the settings directory path
pub fn config_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join(CONFIG_DIR))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

pub fn default_keypair_path() -> Result<PathBuf> {
    Ok(home_dir()?.join(".config").join("solana").join("id.json"))
}

/// Load Solana keypair from file or default location
pub fn load_solana_keypair(path: Option<&str>) -> Result<Keypair> {
    let keypair_path = match path {
        Some(p) => PathBuf::from(p),
        None => default_keypair_path()?,
    };

    if !keypair_path.exists() {
        bail!(
            "Solana keypair not found at {:?}. Generate one with 'solana-keygen new' or specify path with --keypair",
            keypair_path
        );
    }

    let keypair_json = fs::read_to_string(&keypair_path)?;
    let bytes: Vec<u8> = serde_json::from_str(&keypair_json)
        .with_context(|| format!("Failed to parse keypair file {:?}", keypair_path))?;
    let keypair = Keypair::from_bytes(&bytes)
        .map_err(|e| anyhow::anyhow!("Invalid keypair file {:?}: {}", keypair_path, e))?;

    Ok(keypair)
}
