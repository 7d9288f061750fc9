//! Account lookups against the host ledger

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};

use crate::error::VaultError;

/// What the resolver needs to know about an account
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub lamports: u64,
    pub data_len: usize,
    pub owner: Pubkey,
}

impl AccountSnapshot {
    /// True once the program has written its own data to the account
    pub fn is_initialized_by(&self, program_id: &Pubkey) -> bool {
        self.data_len > 0 && self.owner == *program_id
    }
}

/// Read-only ledger query capability
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// `Ok(None)` when no account exists at `address`
    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<AccountSnapshot>, VaultError>;
}

/// JSON-RPC backed ledger
pub struct RpcLedger {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcLedger {
    pub fn new(rpc_url: &str) -> Self {
        Self::with_commitment(rpc_url, CommitmentConfig::confirmed())
    }

    pub fn with_commitment(rpc_url: &str, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url.to_string(), commitment),
            commitment,
        }
    }
}

#[async_trait]
impl LedgerQuery for RpcLedger {
    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<AccountSnapshot>, VaultError> {
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(|e| VaultError::LedgerQuery(e.to_string()))?;

        Ok(response.value.map(|account| AccountSnapshot {
            lamports: account.lamports,
            data_len: account.data.len(),
            owner: account.owner,
        }))
    }
}
