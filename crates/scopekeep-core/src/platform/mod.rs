//! Platform security-scoped resource boundary
//!
//! This module defines:
//! - `ScopedResourceProvider` - the OS primitive for minting and resolving
//!   bookmarks and for the paired access lock
//! - `with_access` - scoped acquisition that releases on every exit path
//! - `FakeProvider` - in-memory provider for tests and host integration

#[cfg(any(test, feature = "testing"))]
pub mod fake;

#[cfg(any(test, feature = "testing"))]
pub use fake::FakeProvider;

use crate::error::{GrantError, ResolveError, Result};
use crate::types::{CapabilityToken, RawLocator, ResolvedLocation};

/// The platform's security-scoped resource primitive.
///
/// Injected into the core at construction so tests can substitute
/// [`FakeProvider`]. All calls are synchronous; lock acquisition is expected
/// to be fast and non-blocking on real platforms. If a platform call can
/// block indefinitely, the host must apply its own timeout and still release
/// any handle it obtained.
pub trait ScopedResourceProvider: Send + Sync {
    /// Serialize a durable bookmark for a location the user just picked.
    ///
    /// Must be called while the locator's access lock is held (or at least
    /// transiently attempted); fails for locations the platform cannot
    /// bookmark, such as network-only or ephemeral ones.
    fn mint_token(
        &self,
        locator: &RawLocator,
    ) -> std::result::Result<CapabilityToken, GrantError>;

    /// Deserialize a token back into a concrete location.
    ///
    /// Staleness is reported via [`ResolvedLocation::is_stale`], not as an
    /// error; corrupt or incompatible bytes fail with
    /// [`ResolveError::DeserializeFailed`].
    fn resolve_token(
        &self,
        token: &CapabilityToken,
    ) -> std::result::Result<ResolvedLocation, ResolveError>;

    /// Acquire the access lock. Returns `false` when the platform refuses
    /// (storage unmounted, permission revoked externally).
    fn start_access(&self, locator: &RawLocator) -> bool;

    /// Release the access lock. Must only be called after a successful
    /// `start_access` for the same locator.
    fn stop_access(&self, locator: &RawLocator);
}

/// Run `f` with the locator's access lock held, releasing on all exit paths.
///
/// Fails with [`ResolveError::LockAcquireFailed`] if the lock is refused;
/// `f`'s own error is propagated after the lock has been released.
pub fn with_access<T>(
    provider: &dyn ScopedResourceProvider,
    locator: &RawLocator,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    if !provider.start_access(locator) {
        return Err(ResolveError::LockAcquireFailed(locator.display_path()).into());
    }

    let out = f();
    provider.stop_access(locator);
    out
}
