//! Error taxonomy for viewing-key derivation and vault resolution

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the derivation engine, the resolver and the session.
///
/// Signing and derivation errors require user action (reconnect, approve, retry) and are
/// returned verbatim. `QueryTimeout` only reaches callers from balance refreshes; during
/// vault resolution a timeout is folded into the "not yet initialized" state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("Signer unavailable: {0}")]
    SignerUnavailable(String),

    #[error("Signing request rejected: {0}")]
    UserRejectedSigning(String),

    #[error("Invalid signature length: expected {expected} bytes, got {actual}")]
    InvalidSignatureLength { expected: usize, actual: usize },

    #[error("Signature does not verify against the connected wallet")]
    SignatureMismatch,

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Ledger query timed out after {0:?}")]
    QueryTimeout(Duration),

    #[error("Ledger query failed: {0}")]
    LedgerQuery(String),

    #[error("A {0} is already in progress")]
    OperationInProgress(&'static str),

    #[error("Wallet not connected")]
    NotConnected,

    #[error("Vault has not been resolved yet")]
    VaultNotResolved,
}

impl VaultError {
    /// Errors that clear up by calling the same operation again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VaultError::UserRejectedSigning(_)
                | VaultError::QueryTimeout(_)
                | VaultError::LedgerQuery(_)
                | VaultError::OperationInProgress(_)
        )
    }
}
