//! Wallet signing capability injected into the derivation engine
//!
//! Browser wallets, hardware wallets and local keypair files all reduce to
//! "sign these bytes for this public key". The engine only ever sees this trait,
//! so tests can hand it canned signatures.

use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer, SignerError},
};
use thiserror::Error;

use crate::error::VaultError;

/// Why a signer did not produce a signature
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    /// No signing capability (wallet locked, adapter missing, device unplugged)
    #[error("{0}")]
    Unavailable(String),
    /// The user declined the request
    #[error("{0}")]
    Rejected(String),
}

impl From<SigningError> for VaultError {
    fn from(err: SigningError) -> Self {
        match err {
            SigningError::Unavailable(reason) => VaultError::SignerUnavailable(reason),
            SigningError::Rejected(reason) => VaultError::UserRejectedSigning(reason),
        }
    }
}

/// Message-signing capability of a connected wallet
#[async_trait]
pub trait MessageSigner: Send + Sync {
    /// Public key the signature is expected to verify against
    fn pubkey(&self) -> Pubkey;

    /// Whether the wallet exposes arbitrary message signing at all
    fn can_sign_messages(&self) -> bool {
        true
    }

    /// Sign raw message bytes, returning the raw signature
    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, SigningError>;
}

/// Signer backed by a local Solana keypair
pub struct KeypairSigner {
    keypair: Keypair,
}

impl KeypairSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }
}

#[async_trait]
impl MessageSigner for KeypairSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, SigningError> {
        let signature = self
            .keypair
            .try_sign_message(message)
            .map_err(|e: SignerError| SigningError::Unavailable(e.to_string()))?;
        Ok(signature.as_ref().to_vec())
    }
}

impl std::fmt::Debug for KeypairSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeypairSigner")
            .field("pubkey", &self.keypair.pubkey())
            .finish_non_exhaustive()
    }
}
