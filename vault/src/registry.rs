//! Vault address derivation and lookup
//!
//! A wallet's vault lives at PDA(["registry", owner], program). The address is pure
//! and cheap to recompute; whether an account exists there is a network question
//! answered under a deadline.

use std::time::Duration;

use solana_sdk::{pubkey, pubkey::Pubkey};
use tracing::{debug, info, warn};

use crate::error::VaultError;
use crate::ledger::{AccountSnapshot, LedgerQuery};

/// Confidential vault program
pub const VAULT_PROGRAM_ID: Pubkey = pubkey!("G2vgFitSj3SxmvR5k9NZ1y8SigUq38DdHptmd5mfK9t");

/// Seed literal shared by the program-wide registry and every per-owner vault
pub const REGISTRY_SEED: &[u8] = b"registry";

/// Recommended bound on a single ledger query
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-owner vault PDA
pub fn derive_registry_address(owner: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[REGISTRY_SEED, owner.as_ref()], program_id)
}

/// Program-wide registry PDA
pub fn derive_global_registry(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[REGISTRY_SEED], program_id)
}

/// Resolved view of a wallet's vault
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VaultRecord {
    pub owner: Pubkey,
    pub vault_address: Pubkey,
    pub vault_bump: u8,
    pub registry_address: Pubkey,
    /// Lamports held at the vault address
    pub balance: u64,
    pub is_initialized: bool,
}

impl VaultRecord {
    /// Record with derived addresses and nothing observed on-chain yet
    pub fn uninitialized(owner: &Pubkey, program_id: &Pubkey) -> Self {
        let (vault_address, vault_bump) = derive_registry_address(owner, program_id);
        let (registry_address, _) = derive_global_registry(program_id);
        Self {
            owner: *owner,
            vault_address,
            vault_bump,
            registry_address,
            balance: 0,
            is_initialized: false,
        }
    }

    fn observe(&mut self, snapshot: Option<AccountSnapshot>, program_id: &Pubkey) {
        match snapshot {
            Some(account) => {
                self.balance = account.lamports;
                // Once initialized a vault stays initialized
                self.is_initialized |= account.is_initialized_by(program_id);
            }
            None => self.balance = 0,
        }
    }
}

/// Derives vault addresses and asks the ledger about them
#[derive(Clone, Debug)]
pub struct VaultResolver {
    program_id: Pubkey,
    query_timeout: Duration,
}

impl Default for VaultResolver {
    fn default() -> Self {
        Self::new(VAULT_PROGRAM_ID, DEFAULT_QUERY_TIMEOUT)
    }
}

impl VaultResolver {
    pub fn new(program_id: Pubkey, query_timeout: Duration) -> Self {
        Self {
            program_id,
            query_timeout,
        }
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Derive the vault for `owner` and classify it as existing or not
    ///
    /// Never fails: a timed-out or failed lookup yields an uninitialized record,
    /// since a missing vault is the normal first-use state.
    pub async fn resolve_vault(&self, owner: &Pubkey, ledger: &dyn LedgerQuery) -> VaultRecord {
        let mut record = VaultRecord::uninitialized(owner, &self.program_id);
        debug!(%owner, vault = %record.vault_address, bump = record.vault_bump, "vault address derived");

        match self.query(ledger, &record.vault_address).await {
            Ok(snapshot) => {
                record.observe(snapshot, &self.program_id);
                info!(
                    vault = %record.vault_address,
                    initialized = record.is_initialized,
                    balance = record.balance,
                    "vault resolved"
                );
            }
            Err(VaultError::QueryTimeout(after)) => {
                warn!(
                    vault = %record.vault_address,
                    timeout_ms = after.as_millis() as u64,
                    "vault lookup timed out; treating vault as uninitialized"
                );
            }
            Err(err) => {
                warn!(
                    vault = %record.vault_address,
                    error = %err,
                    "vault lookup failed; treating vault as uninitialized"
                );
            }
        }

        record
    }

    /// Re-read the balance at an already-derived vault address
    pub async fn refresh_balance(
        &self,
        record: &VaultRecord,
        ledger: &dyn LedgerQuery,
    ) -> Result<VaultRecord, VaultError> {
        let snapshot = self.query(ledger, &record.vault_address).await?;
        let mut updated = record.clone();
        updated.observe(snapshot, &self.program_id);
        debug!(vault = %updated.vault_address, balance = updated.balance, "vault balance refreshed");
        Ok(updated)
    }

    async fn query(
        &self,
        ledger: &dyn LedgerQuery,
        address: &Pubkey,
    ) -> Result<Option<AccountSnapshot>, VaultError> {
        match tokio::time::timeout(self.query_timeout, ledger.get_account_info(address)).await {
            Ok(result) => result,
            Err(_) => Err(VaultError::QueryTimeout(self.query_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_address_is_valid_pda() {
        let owner = Pubkey::new_unique();
        let (vault, bump) = derive_registry_address(&owner, &VAULT_PROGRAM_ID);

        let recreated =
            Pubkey::create_program_address(&[REGISTRY_SEED, owner.as_ref(), &[bump]], &VAULT_PROGRAM_ID)
                .unwrap();
        assert_eq!(vault, recreated);
        assert!(!vault.is_on_curve());
    }

    #[test]
    fn test_vault_differs_from_global_registry() {
        let owner = Pubkey::new_unique();
        let record = VaultRecord::uninitialized(&owner, &VAULT_PROGRAM_ID);
        assert_ne!(record.vault_address, record.registry_address);
        assert_eq!(record.registry_address, derive_global_registry(&VAULT_PROGRAM_ID).0);
        assert_eq!(record.balance, 0);
        assert!(!record.is_initialized);
    }

    #[test]
    fn test_program_id_changes_address() {
        let owner = Pubkey::new_unique();
        let other_program = Pubkey::new_unique();
        assert_ne!(
            derive_registry_address(&owner, &VAULT_PROGRAM_ID).0,
            derive_registry_address(&owner, &other_program).0
        );
    }

    #[test]
    fn test_initialized_never_reverts() {
        let owner = Pubkey::new_unique();
        let mut record = VaultRecord::uninitialized(&owner, &VAULT_PROGRAM_ID);
        record.observe(
            Some(AccountSnapshot { lamports: 10, data_len: 8, owner: VAULT_PROGRAM_ID }),
            &VAULT_PROGRAM_ID,
        );
        assert!(record.is_initialized);

        record.observe(None, &VAULT_PROGRAM_ID);
        assert!(record.is_initialized);
        assert_eq!(record.balance, 0);
    }
}
