//! Access session state machine
//!
//! This module provides:
//! - `AccessSession` - one resolved, lock-holding view of the granted folder
//! - `SessionManager` - the single mutex-guarded "active session" slot,
//!   enforcing that at most one session holds the security scope at a time

use crate::error::{Error, ResolveError, Result};
use crate::platform::{with_access, ScopedResourceProvider};
use crate::types::{CapabilityToken, RawLocator};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Session lifecycle states. `Released` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unresolved,
    Active,
    Released,
}

/// An unlocked, usable view of one resolved location.
///
/// Created only by [`SessionManager::resolve`]; the manager records which
/// locator is held so release targets exactly it.
#[derive(Debug)]
pub struct AccessSession {
    id: Uuid,
    locator: RawLocator,
    state: SessionState,
}

impl AccessSession {
    fn new(locator: RawLocator) -> Self {
        Self {
            id: Uuid::new_v4(),
            locator,
            state: SessionState::Unresolved,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &std::path::Path {
        self.locator.path()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    fn locator(&self) -> &RawLocator {
        &self.locator
    }

    /// `Unresolved → Active`. Called once, after the lock is acquired.
    fn activate(&mut self) {
        debug_assert_eq!(self.state, SessionState::Unresolved);
        self.state = SessionState::Active;
    }

    /// `Active → Released`. Returns whether the lock must be given back;
    /// no-op on any other state since `Released` is terminal.
    fn mark_released(&mut self) -> bool {
        if self.state == SessionState::Active {
            self.state = SessionState::Released;
            true
        } else {
            false
        }
    }
}

/// Owner of the single active-session slot.
///
/// All platform interaction goes through the injected provider; concurrent
/// `resolve` calls are serialized by the slot mutex.
pub struct SessionManager {
    provider: Arc<dyn ScopedResourceProvider>,
    active: Mutex<Option<AccessSession>>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn ScopedResourceProvider>) -> Self {
        Self {
            provider,
            active: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<AccessSession>> {
        // Slot contents stay consistent even if a holder panicked mid-update:
        // every transition is a single assignment.
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Serialize a durable token for a freshly picked location.
    ///
    /// The access lock is taken transiently just to materialize the token
    /// and released before returning: grant never leaves a session active.
    /// Mirrors the platform's behavior of still attempting the mint when the
    /// transient lock is refused.
    pub fn grant(&self, locator: &RawLocator) -> Result<(CapabilityToken, String)> {
        let provider = &*self.provider;
        let minted = with_access(provider, locator, || {
            provider.mint_token(locator).map_err(Error::from)
        });

        let token = match minted {
            Ok(token) => token,
            Err(Error::Resolve(ResolveError::LockAcquireFailed(_))) => {
                debug!(path = %locator.display_path(), "Lock refused during grant, minting without scope");
                provider.mint_token(locator)?
            }
            Err(e) => return Err(e),
        };

        info!(path = %locator.display_path(), "Minted bookmark token");
        Ok((token, locator.display_path()))
    }

    /// Resolve a stored token into the active session, acquiring the lock.
    ///
    /// Rejects with [`ResolveError::SessionAlreadyActive`] while a prior
    /// session still holds the scope; callers must release first. On any
    /// failure nothing is left acquired and the slot is unchanged.
    pub fn resolve(&self, token: &CapabilityToken) -> Result<String> {
        let mut slot = self.slot();

        if slot.as_ref().is_some_and(|s| s.is_active()) {
            warn!("Resolve rejected: a session is already active");
            return Err(ResolveError::SessionAlreadyActive.into());
        }

        let resolved = self.provider.resolve_token(token).map_err(Error::from)?;
        if resolved.is_stale {
            info!(path = %resolved.locator.display_path(), "Bookmark is stale, re-grant required");
            return Err(ResolveError::Stale.into());
        }

        if !self.provider.start_access(&resolved.locator) {
            warn!(path = %resolved.locator.display_path(), "Platform refused security scope");
            return Err(ResolveError::LockAcquireFailed(resolved.locator.display_path()).into());
        }

        let mut session = AccessSession::new(resolved.locator);
        session.activate();
        let path = session.locator().display_path();
        info!(session_id = %session.id(), path = %path, "Security scope acquired");

        *slot = Some(session);
        Ok(path)
    }

    /// Release the active session's lock, if any. Idempotent: releasing an
    /// already-released or never-resolved slot is a no-op, never an error,
    /// so cleanup paths can call it unconditionally.
    pub fn release(&self) {
        let mut slot = self.slot();
        if let Some(mut session) = slot.take() {
            if session.mark_released() {
                self.provider.stop_access(session.locator());
                info!(session_id = %session.id(), path = %session.locator().display_path(), "Security scope released");
            }
        }
    }

    /// Whether a session currently holds the security scope.
    pub fn is_active(&self) -> bool {
        self.slot().as_ref().is_some_and(|s| s.is_active())
    }

    /// Display path of the active session, if any.
    pub fn active_path(&self) -> Option<String> {
        self.slot()
            .as_ref()
            .filter(|s| s.is_active())
            .map(|s| s.locator().display_path())
    }
}

impl Drop for SessionManager {
    // Teardown backstop: a still-active scope must not leak past the
    // manager's lifetime. Hosts are expected to release explicitly.
    fn drop(&mut self) {
        self.release();
    }
}
