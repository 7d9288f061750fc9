//! Viewing-key derivation from a wallet signature
//!
//! Derivation chain:
//! - master = SHA256(signature || domain_message)
//! - labeled(role) = SHA256(master || label), label ∈ {"spend", "view"}
//! - secret(role) = labeled(role) mod ℓ, public(role) = secret(role)·G
//!
//! Security features:
//! - Signature length is checked before hashing
//! - Optional strict ed25519 verification of the signature against the wallet key
//! - Zeroization of seeds, scalars and raw signatures on drop
//! - Constant-time comparison of key sets

use curve25519_dalek::{constants::ED25519_BASEPOINT_POINT, scalar::Scalar};
use ed25519_dalek::{PublicKey as DalekPublicKey, Signature as DalekSignature};
use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;
use subtle::{Choice, ConstantTimeEq};
use tracing::debug;
use zeroize::Zeroize;

use crate::domain::DomainMessage;
use crate::error::VaultError;
use crate::signer::MessageSigner;

/// Ed25519 signature length expected from the wallet
pub const SIGNATURE_LENGTH: usize = 64;

/// Output length of every seed in the chain
pub const SEED_LENGTH: usize = 32;

const SPEND_LABEL: &[u8] = b"spend";
const VIEW_LABEL: &[u8] = b"view";

// ============================================================================
// Zeroizing Wrappers
// ============================================================================

/// A 32-byte seed that zeroizes its contents on drop
pub struct Seed {
    bytes: [u8; SEED_LENGTH],
}

impl Seed {
    pub fn from_bytes(bytes: [u8; SEED_LENGTH]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; SEED_LENGTH] {
        &self.bytes
    }
}

impl Drop for Seed {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Seed(..)")
    }
}

/// A scalar that zeroizes its contents on drop
#[derive(Clone)]
struct SecretScalar {
    bytes: [u8; 32],
}

impl SecretScalar {
    fn from_scalar(scalar: &Scalar) -> Self {
        Self { bytes: scalar.to_bytes() }
    }
}

impl Drop for SecretScalar {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

// ============================================================================
// Seed Derivation
// ============================================================================

/// Which of the two independent keypairs to derive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyRole {
    /// Authorizes movement of funds
    Spend,
    /// Read-only visibility into balance and activity
    View,
}

impl KeyRole {
    pub fn label(&self) -> &'static [u8] {
        match self {
            KeyRole::Spend => SPEND_LABEL,
            KeyRole::View => VIEW_LABEL,
        }
    }
}

fn check_signature_length(signature: &[u8]) -> Result<(), VaultError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(VaultError::InvalidSignatureLength {
            expected: SIGNATURE_LENGTH,
            actual: signature.len(),
        });
    }
    Ok(())
}

/// Derive the master seed: SHA256(signature || domain_message)
pub fn derive_master_seed(signature: &[u8], domain_message: &[u8]) -> Result<Seed, VaultError> {
    check_signature_length(signature)?;

    let mut hasher = Sha256::new();
    hasher.update(signature);
    hasher.update(domain_message);
    Ok(Seed::from_bytes(hasher.finalize().into()))
}

/// Derive a role seed: SHA256(master || label)
pub fn derive_labeled_seed(master: &Seed, role: KeyRole) -> Seed {
    hash_with_label(master, role.label())
}

pub(crate) fn hash_with_label(master: &Seed, label: &[u8]) -> Seed {
    let mut hasher = Sha256::new();
    hasher.update(master.as_bytes());
    hasher.update(label);
    Seed::from_bytes(hasher.finalize().into())
}

// ============================================================================
// Key Pairs
// ============================================================================

/// An ed25519 scalar keypair derived from a seed
///
/// Clone is NOT derived to prevent accidental secret duplication.
pub struct KeyPair {
    secret: SecretScalar,
    public: [u8; 32],
}

impl KeyPair {
    /// Compressed Edwards Y public key
    pub fn public_key(&self) -> [u8; 32] {
        self.public
    }

    pub fn pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.public)
    }

    /// Export the reduced secret scalar
    ///
    /// WARNING: Handle these bytes with extreme care!
    pub fn export_secret(&self) -> [u8; 32] {
        self.secret.bytes
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &hex::encode(self.public))
            .finish_non_exhaustive()
    }
}

/// Turn a seed into a keypair. No randomness is involved.
pub fn derive_key_pair(seed: &Seed) -> Result<KeyPair, VaultError> {
    let scalar = Scalar::from_bytes_mod_order(*seed.as_bytes());
    if scalar == Scalar::zero() {
        return Err(VaultError::DerivationFailed(
            "seed reduces to the zero scalar".to_string(),
        ));
    }

    let public = (&scalar * &ED25519_BASEPOINT_POINT).compress().to_bytes();

    Ok(KeyPair {
        secret: SecretScalar::from_scalar(&scalar),
        public,
    })
}

// ============================================================================
// Viewing Key Set
// ============================================================================

/// Spend and view keypairs derived from one wallet signature
pub struct ViewingKeys {
    spend: KeyPair,
    view: KeyPair,
}

impl ViewingKeys {
    pub fn spend(&self) -> &KeyPair {
        &self.spend
    }

    pub fn view(&self) -> &KeyPair {
        &self.view
    }

    pub fn spend_pubkey(&self) -> [u8; 32] {
        self.spend.public
    }

    pub fn view_pubkey(&self) -> [u8; 32] {
        self.view.public
    }

    /// Public halves as (spend_pubkey, view_pubkey)
    pub fn public_keys(&self) -> ([u8; 32], [u8; 32]) {
        (self.spend.public, self.view.public)
    }

    pub fn public(&self) -> ViewingPublicKeys {
        ViewingPublicKeys {
            spend: self.spend.public,
            view: self.view.public,
        }
    }
}

/// Public halves of a viewing key set. Carries no secret material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewingPublicKeys {
    pub spend: [u8; 32],
    pub view: [u8; 32],
}

impl ConstantTimeEq for ViewingKeys {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.spend.secret.bytes.ct_eq(&other.spend.secret.bytes)
            & self.view.secret.bytes.ct_eq(&other.view.secret.bytes)
            & self.spend.public.ct_eq(&other.spend.public)
            & self.view.public.ct_eq(&other.view.public)
    }
}

impl PartialEq for ViewingKeys {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.ct_eq(other))
    }
}

impl Eq for ViewingKeys {}

impl std::fmt::Debug for ViewingKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewingKeys")
            .field("spend", &self.spend)
            .field("view", &self.view)
            .finish()
    }
}

/// Run the full chain for an already-obtained signature
pub fn derive_viewing_keys(
    signature: &[u8],
    domain: &DomainMessage,
) -> Result<ViewingKeys, VaultError> {
    let master = derive_master_seed(signature, domain.as_bytes())?;
    let spend = derive_key_pair(&derive_labeled_seed(&master, KeyRole::Spend))?;
    let view = derive_key_pair(&derive_labeled_seed(&master, KeyRole::View))?;
    Ok(ViewingKeys { spend, view })
}

/// Check that `signature` was produced by `owner` over `message`
///
/// Uses strict verification so malleated signatures cannot yield a second key set.
pub fn verify_wallet_signature(
    owner: &Pubkey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), VaultError> {
    check_signature_length(signature)?;

    let public = DalekPublicKey::from_bytes(owner.as_ref())
        .map_err(|_| VaultError::SignatureMismatch)?;
    let signature =
        DalekSignature::try_from(signature).map_err(|_| VaultError::SignatureMismatch)?;

    public
        .verify_strict(message, &signature)
        .map_err(|_| VaultError::SignatureMismatch)
}

/// Ask the wallet to sign the domain message and derive the viewing keys
pub async fn generate_viewing_keys(
    signer: Option<&dyn MessageSigner>,
    domain: &DomainMessage,
    verify_signer: bool,
) -> Result<ViewingKeys, VaultError> {
    let signer = signer
        .ok_or_else(|| VaultError::SignerUnavailable("no wallet signer provided".to_string()))?;

    if !signer.can_sign_messages() {
        return Err(VaultError::SignerUnavailable(
            "wallet does not support message signing".to_string(),
        ));
    }

    let owner = signer.pubkey();
    debug!(%owner, tag = domain.tag(), "requesting viewing-key signature");

    let mut signature = signer.sign_message(domain.as_bytes()).await?;

    let derived = check_signature_length(&signature)
        .and_then(|_| {
            if verify_signer {
                verify_wallet_signature(&owner, domain.as_bytes(), &signature)
            } else {
                Ok(())
            }
        })
        .and_then(|_| derive_viewing_keys(&signature, domain));

    signature.zeroize();

    if derived.is_ok() {
        debug!(%owner, "viewing keys derived");
    }
    derived
}

// ============================================================================
// Tests
// ============================================================================
