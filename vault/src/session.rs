//! Per-wallet vault session
//!
//! Owns the lifecycle Disconnected → KeysPending → KeysReady → VaultPending → VaultReady.
//! All derived material is scoped to the connected public key and dropped on disconnect.
//! Secret halves never leave the session: snapshots carry public keys only and secrets are
//! reachable through `with_viewing_keys` for the duration of a closure.
//!
//! Concurrency:
//! - one in-flight key derivation and one in-flight vault query per session
//! - a disconnect bumps the session epoch; in-flight work observes the bump through a
//!   watch channel, stops waiting and never writes state for a dead epoch
//! - the state mutex is never held across an await

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use solana_sdk::pubkey::Pubkey;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::crypto::{self, ViewingKeys, ViewingPublicKeys};
use crate::domain::DomainMessage;
use crate::error::VaultError;
use crate::ledger::LedgerQuery;
use crate::registry::{VaultRecord, VaultResolver, DEFAULT_QUERY_TIMEOUT, VAULT_PROGRAM_ID};
use crate::signer::MessageSigner;

/// Work that may only have one instance in flight per session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operation {
    KeyDerivation,
    VaultQuery,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Operation::KeyDerivation => "key derivation",
            Operation::VaultQuery => "vault query",
        }
    }
}

/// Where a session is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LifecycleState {
    #[default]
    Disconnected,
    KeysPending,
    KeysReady,
    VaultPending,
    VaultReady,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Disconnected => "disconnected",
            LifecycleState::KeysPending => "keys-pending",
            LifecycleState::KeysReady => "keys-ready",
            LifecycleState::VaultPending => "vault-pending",
            LifecycleState::VaultReady => "vault-ready",
        };
        f.write_str(name)
    }
}

/// Session behaviour knobs
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub program_id: Pubkey,
    pub query_timeout: Duration,
    /// Derive keys as part of `connect`
    pub auto_derive: bool,
    /// Verify the wallet signature before using it as entropy
    pub verify_signature: bool,
    pub domain: DomainMessage,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            program_id: VAULT_PROGRAM_ID,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            auto_derive: true,
            verify_signature: true,
            domain: DomainMessage::current(),
        }
    }
}

/// Read-only view of a session
#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    pub owner: Option<Pubkey>,
    pub lifecycle: LifecycleState,
    pub viewing_keys: Option<ViewingPublicKeys>,
    pub vault: Option<VaultRecord>,
    pub error: Option<String>,
}

#[derive(Default)]
struct SessionState {
    epoch: u64,
    signer: Option<Arc<dyn MessageSigner>>,
    owner: Option<Pubkey>,
    lifecycle: LifecycleState,
    viewing_keys: Option<ViewingKeys>,
    vault: Option<VaultRecord>,
    error: Option<String>,
    deriving: bool,
    querying: bool,
}

impl SessionState {
    fn in_flight(&mut self, operation: Operation) -> &mut bool {
        match operation {
            Operation::KeyDerivation => &mut self.deriving,
            Operation::VaultQuery => &mut self.querying,
        }
    }
}

/// Vault state controller for one connected wallet at a time
pub struct VaultSession {
    domain: DomainMessage,
    auto_derive: bool,
    verify_signature: bool,
    resolver: VaultResolver,
    ledger: Arc<dyn LedgerQuery>,
    state: Mutex<SessionState>,
    lifecycle_tx: watch::Sender<LifecycleState>,
    epoch_tx: watch::Sender<u64>,
}

impl VaultSession {
    pub fn new(config: SessionConfig, ledger: Arc<dyn LedgerQuery>) -> Self {
        let (lifecycle_tx, _) = watch::channel(LifecycleState::Disconnected);
        let (epoch_tx, _) = watch::channel(0);
        Self {
            domain: config.domain,
            auto_derive: config.auto_derive,
            verify_signature: config.verify_signature,
            resolver: VaultResolver::new(config.program_id, config.query_timeout),
            ledger,
            state: Mutex::new(SessionState::default()),
            lifecycle_tx,
            epoch_tx,
        }
    }

    pub fn resolver(&self) -> &VaultResolver {
        &self.resolver
    }

    pub fn domain(&self) -> &DomainMessage {
        &self.domain
    }

    /// Bind a wallet to the session
    ///
    /// Reconnecting the same wallet is a no-op unless auto-derivation previously failed,
    /// in which case derivation is retried. A different wallet discards everything derived
    /// for the previous one first. With auto-derivation the signing prompt is issued
    /// immediately and its outcome returned.
    pub async fn connect(&self, signer: Arc<dyn MessageSigner>) -> Result<(), VaultError> {
        let owner = signer.pubkey();
        {
            let mut state = self.lock();
            if state.owner == Some(owner) {
                if !self.auto_derive || state.viewing_keys.is_some() || state.deriving {
                    debug!(%owner, "wallet already connected");
                    return Ok(());
                }
                debug!(%owner, "wallet reconnected without keys; retrying derivation");
            } else {
                if let Some(previous) = state.owner {
                    info!(%previous, next = %owner, "switching wallet; discarding derived material");
                    self.reset(&mut state);
                }
                state.owner = Some(owner);
                state.signer = Some(signer);
                info!(%owner, "wallet connected");
                if self.auto_derive {
                    self.transition(&mut state, LifecycleState::KeysPending);
                }
            }
        }

        if self.auto_derive {
            self.generate_viewing_keys().await?;
        }
        Ok(())
    }

    /// Derive (or return the cached) viewing keys for the connected wallet
    ///
    /// Only the public halves are returned; the secret keys stay in the session.
    pub async fn generate_viewing_keys(&self) -> Result<ViewingPublicKeys, VaultError> {
        let (signer, epoch) = {
            let mut state = self.lock();
            let signer = state.signer.clone().ok_or(VaultError::NotConnected)?;
            if let Some(keys) = &state.viewing_keys {
                return Ok(keys.public());
            }
            if state.deriving {
                return Err(VaultError::OperationInProgress(Operation::KeyDerivation.name()));
            }
            state.deriving = true;
            state.error = None;
            self.transition(&mut state, LifecycleState::KeysPending);
            (signer, state.epoch)
        };
        let guard = InFlight::new(self, epoch, Operation::KeyDerivation);

        let derived = self
            .until_reset(
                epoch,
                crypto::generate_viewing_keys(
                    Some(signer.as_ref()),
                    &self.domain,
                    self.verify_signature,
                ),
            )
            .await;

        let mut state = self.lock();
        if state.epoch != epoch {
            return Err(VaultError::NotConnected);
        }
        guard.release(&mut state);

        match derived {
            Ok(keys) => {
                let public = keys.public();
                state.viewing_keys = Some(keys);
                self.transition(&mut state, LifecycleState::KeysReady);
                info!(owner = ?state.owner, "viewing keys ready");
                Ok(public)
            }
            Err(err) => {
                state.viewing_keys = None;
                state.error = Some(err.to_string());
                warn!(error = %err, "viewing key derivation failed");
                Err(err)
            }
        }
    }

    /// Derive the vault address and check whether it exists on-chain
    ///
    /// Derives keys first if they are missing. Once the vault is resolved the cached
    /// record is returned; use `refresh_vault` to re-read the balance.
    pub async fn create_or_resolve_vault(&self) -> Result<VaultRecord, VaultError> {
        let (needs_keys, epoch) = {
            let state = self.lock();
            if state.owner.is_none() {
                return Err(VaultError::NotConnected);
            }
            if state.lifecycle == LifecycleState::VaultReady {
                if let Some(vault) = &state.vault {
                    return Ok(vault.clone());
                }
            }
            (state.viewing_keys.is_none(), state.epoch)
        };
        if needs_keys {
            self.generate_viewing_keys().await?;
        }

        let owner = {
            let mut state = self.lock();
            // The wallet may have been switched or dropped while keys were derived
            if state.epoch != epoch || state.viewing_keys.is_none() {
                return Err(VaultError::NotConnected);
            }
            let owner = state.owner.ok_or(VaultError::NotConnected)?;
            if state.querying {
                return Err(VaultError::OperationInProgress(Operation::VaultQuery.name()));
            }
            state.querying = true;
            self.transition(&mut state, LifecycleState::VaultPending);
            owner
        };
        let guard = InFlight::new(self, epoch, Operation::VaultQuery);

        let resolved = self
            .until_reset(epoch, async {
                Ok::<_, VaultError>(self.resolver.resolve_vault(&owner, self.ledger.as_ref()).await)
            })
            .await;

        let mut state = self.lock();
        if state.epoch != epoch {
            return Err(VaultError::NotConnected);
        }
        guard.release(&mut state);

        let record = resolved?;
        state.vault = Some(record.clone());
        self.transition(&mut state, LifecycleState::VaultReady);
        Ok(record)
    }

    /// Re-read the vault balance without re-deriving the address
    ///
    /// Failures are recorded and returned; the resolved record and lifecycle are kept.
    pub async fn refresh_vault(&self) -> Result<VaultRecord, VaultError> {
        let (record, epoch) = {
            let mut state = self.lock();
            if state.owner.is_none() {
                return Err(VaultError::NotConnected);
            }
            let record = state.vault.clone().ok_or(VaultError::VaultNotResolved)?;
            if state.querying {
                return Err(VaultError::OperationInProgress(Operation::VaultQuery.name()));
            }
            state.querying = true;
            (record, state.epoch)
        };
        let guard = InFlight::new(self, epoch, Operation::VaultQuery);

        let refreshed = self
            .until_reset(
                epoch,
                self.resolver.refresh_balance(&record, self.ledger.as_ref()),
            )
            .await;

        let mut state = self.lock();
        if state.epoch != epoch {
            return Err(VaultError::NotConnected);
        }
        guard.release(&mut state);

        match refreshed {
            Ok(updated) => {
                state.vault = Some(updated.clone());
                state.error = None;
                Ok(updated)
            }
            Err(err) => {
                state.error = Some(err.to_string());
                warn!(vault = %record.vault_address, error = %err, "vault refresh failed");
                Err(err)
            }
        }
    }

    pub fn clear_error(&self) {
        self.lock().error = None;
    }

    /// Forget the wallet and everything derived for it
    pub fn disconnect(&self) {
        let mut state = self.lock();
        if let Some(owner) = state.owner {
            info!(%owner, "wallet disconnected");
        }
        self.reset(&mut state);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            owner: state.owner,
            lifecycle: state.lifecycle,
            viewing_keys: state.viewing_keys.as_ref().map(ViewingKeys::public),
            vault: state.vault.clone(),
            error: state.error.clone(),
        }
    }

    /// Borrow the secret-bearing keys for the duration of `f`
    ///
    /// Returns `None` when no keys are derived. The borrow cannot escape the closure, so
    /// nothing outside the session keeps the secrets alive past `disconnect`. The state
    /// lock is held while `f` runs; `f` must not call back into the session.
    pub fn with_viewing_keys<R>(&self, f: impl FnOnce(&ViewingKeys) -> R) -> Option<R> {
        let state = self.lock();
        state.viewing_keys.as_ref().map(f)
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.lock().lifecycle
    }

    /// Observe lifecycle transitions
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.lifecycle_tx.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, state: &mut SessionState, next: LifecycleState) {
        if state.lifecycle != next {
            debug!(from = %state.lifecycle, to = %next, "lifecycle transition");
        }
        state.lifecycle = next;
        self.lifecycle_tx.send_replace(next);
    }

    fn reset(&self, state: &mut SessionState) {
        let epoch = state.epoch.wrapping_add(1);
        *state = SessionState {
            epoch,
            ..SessionState::default()
        };
        self.epoch_tx.send_replace(epoch);
        self.transition(state, LifecycleState::Disconnected);
    }

    /// Run `work` unless the session is reset first
    async fn until_reset<T, F>(&self, epoch: u64, work: F) -> Result<T, VaultError>
    where
        F: Future<Output = Result<T, VaultError>>,
    {
        let mut epoch_rx = self.epoch_tx.subscribe();
        tokio::select! {
            result = work => result,
            _ = epoch_rx.wait_for(|current| *current != epoch) => Err(VaultError::NotConnected),
        }
    }
}

impl fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("VaultSession")
            .field("owner", &state.owner)
            .field("lifecycle", &state.lifecycle)
            .finish_non_exhaustive()
    }
}

/// Clears a single-flight flag even if the owning future is dropped mid-await
struct InFlight<'a> {
    session: &'a VaultSession,
    epoch: u64,
    operation: Operation,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(session: &'a VaultSession, epoch: u64, operation: Operation) -> Self {
        Self {
            session,
            epoch,
            operation,
            armed: true,
        }
    }

    fn release(mut self, state: &mut SessionState) {
        if state.epoch == self.epoch {
            *state.in_flight(self.operation) = false;
        }
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.session.lock();
        if state.epoch == self.epoch {
            *state.in_flight(self.operation) = false;
            debug!(operation = self.operation.name(), "in-flight operation abandoned");
        }
    }
}
