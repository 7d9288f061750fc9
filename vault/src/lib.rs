//! Stealth vault - signature-derived viewing keys and vault address binding
//!
//! A wallet signs one static, versioned message. The signature is hashed into a master
//! seed, split into independent spend and view keypairs, and the wallet's vault address
//! is derived as a program address of the confidential vault program.

// op_ref warnings are common with curve25519-dalek ergonomics
#![allow(clippy::op_ref)]

pub mod config;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod registry;
pub mod session;
pub mod signer;

#[cfg(test)]
mod tests;

#[cfg(test)]
mod test_vectors;



pub use crypto::{generate_viewing_keys, KeyPair, KeyRole, ViewingKeys, ViewingPublicKeys};
pub use domain::DomainMessage;
pub use error::VaultError;
pub use ledger::{AccountSnapshot, LedgerQuery, RpcLedger};
pub use registry::{derive_registry_address, VaultRecord, VaultResolver};
pub use session::{LifecycleState, SessionConfig, SessionSnapshot, VaultSession};
pub use signer::{KeypairSigner, MessageSigner, SigningError};
