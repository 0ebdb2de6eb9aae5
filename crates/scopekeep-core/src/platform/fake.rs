//! In-memory platform provider for tests
//!
//! Tokens are the locator path prefixed with a magic tag; staleness, lock
//! refusal, and mint failure are toggled per path. The held-locks set
//! asserts strict acquire/release pairing.

use super::ScopedResourceProvider;
use crate::error::{GrantError, ResolveError};
use crate::types::{CapabilityToken, RawLocator, ResolvedLocation};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const TOKEN_TAG: &[u8] = b"fake-bookmark:";

#[derive(Debug, Default)]
struct FakeState {
    stale: HashSet<PathBuf>,
    refuse_access: HashSet<PathBuf>,
    refuse_mint: HashSet<PathBuf>,
    held: HashSet<PathBuf>,
}

/// Fake security-scoped resource provider
#[derive(Debug, Default)]
pub struct FakeProvider {
    state: Mutex<FakeState>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a path's tokens as stale (location moved/renamed externally).
    pub fn set_stale(&self, path: impl AsRef<Path>, stale: bool) {
        let mut state = self.state.lock().unwrap();
        if stale {
            state.stale.insert(path.as_ref().to_path_buf());
        } else {
            state.stale.remove(path.as_ref());
        }
    }

    /// Make `start_access` fail for a path (storage unmounted, revoked).
    pub fn set_refuse_access(&self, path: impl AsRef<Path>, refuse: bool) {
        let mut state = self.state.lock().unwrap();
        if refuse {
            state.refuse_access.insert(path.as_ref().to_path_buf());
        } else {
            state.refuse_access.remove(path.as_ref());
        }
    }

    /// Make `mint_token` fail for a path (unbookmarkable location).
    pub fn set_refuse_mint(&self, path: impl AsRef<Path>, refuse: bool) {
        let mut state = self.state.lock().unwrap();
        if refuse {
            state.refuse_mint.insert(path.as_ref().to_path_buf());
        } else {
            state.refuse_mint.remove(path.as_ref());
        }
    }

    /// Whether the access lock is currently held for a locator.
    pub fn is_access_held(&self, locator: &RawLocator) -> bool {
        self.state.lock().unwrap().held.contains(locator.path())
    }

    /// Number of locks currently held across all paths.
    pub fn held_count(&self) -> usize {
        self.state.lock().unwrap().held.len()
    }

    /// A token that no provider ever minted.
    pub fn corrupt_token() -> CapabilityToken {
        CapabilityToken::new(vec![0xde, 0xad, 0xbe, 0xef])
    }
}

impl ScopedResourceProvider for FakeProvider {
    fn mint_token(
        &self,
        locator: &RawLocator,
    ) -> Result<CapabilityToken, GrantError> {
        let state = self.state.lock().unwrap();
        if state.refuse_mint.contains(locator.path()) {
            return Err(GrantError::SerializationFailed(format!(
                "cannot bookmark {}",
                locator.display_path()
            )));
        }

        let mut bytes = TOKEN_TAG.to_vec();
        bytes.extend_from_slice(locator.display_path().as_bytes());
        Ok(CapabilityToken::new(bytes))
    }

    fn resolve_token(
        &self,
        token: &CapabilityToken,
    ) -> Result<ResolvedLocation, ResolveError> {
        let payload = token
            .as_bytes()
            .strip_prefix(TOKEN_TAG)
            .ok_or_else(|| ResolveError::DeserializeFailed("bad token tag".to_string()))?;

        let path = String::from_utf8(payload.to_vec())
            .map_err(|e| ResolveError::DeserializeFailed(e.to_string()))?;

        let locator = RawLocator::new(&path);
        let is_stale = self.state.lock().unwrap().stale.contains(locator.path());

        Ok(ResolvedLocation { locator, is_stale })
    }

    fn start_access(&self, locator: &RawLocator) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.refuse_access.contains(locator.path()) {
            return false;
        }
        state.held.insert(locator.path().to_path_buf())
    }

    fn stop_access(&self, locator: &RawLocator) {
        let mut state = self.state.lock().unwrap();
        let removed = state.held.remove(locator.path());
        assert!(
            removed,
            "stop_access without matching start_access for {}",
            locator.display_path()
        );
    }
}
