//! Host method-channel surface
//!
//! Mirrors the host application's three bookmark calls: `pickFolder`,
//! `restoreBookmark`, `releaseBookmark`. Responses are channel-shaped:
//! `Ok(Some(..))` for a value, `Ok(None)` for null (user cancel, empty
//! store), `Err(ChannelError)` for a coded failure. The picker itself is an
//! external collaborator behind [`FolderPicker`].

use crate::error::{Error, ResolveError};
use crate::platform::ScopedResourceProvider;
use crate::session::SessionManager;
use crate::store::TokenStore;
use crate::types::{PickedFolder, RawLocator};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Method channel name the host registers for bookmark calls
pub const CHANNEL_NAME: &str = "scopekeep/bookmarks";

/// Structured failure sent back over the channel
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelError {
    pub code: String,
    pub message: String,
}

impl From<Error> for ChannelError {
    fn from(err: Error) -> Self {
        Self {
            code: err.channel_code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Channel-shaped result alias
pub type ChannelResult<T> = std::result::Result<T, ChannelError>;

/// Folder-selection UI collaborator.
///
/// Returns the raw locator for the picked directory, or `None` when the
/// user cancels. Awaited because the host drives it through its own event
/// dispatch; the core never blocks on UI.
#[async_trait]
pub trait FolderPicker: Send + Sync {
    async fn pick_folder(&self) -> Option<RawLocator>;
}

/// The bookmark lifecycle service the host channel dispatches into.
///
/// All state is injected at construction: the token store, the platform
/// provider (via the session manager), and the picker. No process-wide
/// singletons.
pub struct BookmarkService {
    store: TokenStore,
    sessions: SessionManager,
    picker: Arc<dyn FolderPicker>,
}

impl BookmarkService {
    pub fn new(
        store: TokenStore,
        provider: Arc<dyn ScopedResourceProvider>,
        picker: Arc<dyn FolderPicker>,
    ) -> Self {
        Self {
            store,
            sessions: SessionManager::new(provider),
            picker,
        }
    }

    /// `pickFolder`: run the picker, mint a token for the selection, persist
    /// it, and return the chosen path. `None` when the user cancels.
    ///
    /// The store is written only after a successful grant, so a failed pick
    /// never clobbers a previously persisted bookmark.
    pub async fn pick_folder(&self) -> ChannelResult<Option<PickedFolder>> {
        let Some(locator) = self.picker.pick_folder().await else {
            debug!("Folder pick cancelled by user");
            return Ok(None);
        };

        let (token, path) = self
            .sessions
            .grant(&locator)
            .map_err(|e| self.channel_failure(e))?;
        self.store
            .put(&token)
            .map_err(|e| self.channel_failure(e))?;

        info!(path = %path, "Folder granted and bookmark persisted");
        Ok(Some(PickedFolder { path }))
    }

    /// `restoreBookmark`: read the persisted token and resolve it into the
    /// active session. `None` when no bookmark was ever stored.
    ///
    /// The store is left untouched on every failure path; a stale or
    /// corrupt token stays in place for the host to decide what to do.
    pub fn restore_bookmark(&self) -> ChannelResult<Option<String>> {
        let token = match self.store.get().map_err(|e| self.channel_failure(e))? {
            Some(token) => token,
            None => {
                debug!("No bookmark stored, nothing to restore");
                return Ok(None);
            }
        };

        let path = self
            .sessions
            .resolve(&token)
            .map_err(|e| self.channel_failure(e))?;
        Ok(Some(path))
    }

    /// `releaseBookmark`: drop the active security scope, if any. Always
    /// succeeds so teardown paths can call it unconditionally.
    pub fn release_bookmark(&self) -> bool {
        self.sessions.release();
        true
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    // Stale and lock refusal are expected, user-recoverable conditions;
    // corruption and store failures are anomalies.
    fn channel_failure(&self, err: Error) -> ChannelError {
        match &err {
            Error::Resolve(ResolveError::Stale)
            | Error::Resolve(ResolveError::LockAcquireFailed(_)) => {
                info!(code = err.channel_code(), "Bookmark restore needs user action: {}", err);
            }
            Error::Store(_) => {
                error!(code = err.channel_code(), "Bookmark store failure: {}", err);
            }
            _ => {
                error!(code = err.channel_code(), "Bookmark operation failed: {}", err);
            }
        }
        ChannelError::from(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::FakeProvider;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Picker fake returning a scripted sequence of selections.
    struct ScriptedPicker {
        responses: Mutex<VecDeque<Option<RawLocator>>>,
    }

    impl ScriptedPicker {
        fn new(responses: Vec<Option<RawLocator>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
            })
        }

        fn picks(paths: &[&str]) -> Arc<Self> {
            Self::new(paths.iter().map(|p| Some(RawLocator::new(*p))).collect())
        }

        fn cancels() -> Arc<Self> {
            Self::new(vec![None])
        }
    }

    #[async_trait]
    impl FolderPicker for ScriptedPicker {
        async fn pick_folder(&self) -> Option<RawLocator> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("picker invoked more times than scripted")
        }
    }

    fn service(picker: Arc<dyn FolderPicker>) -> (Arc<FakeProvider>, BookmarkService) {
        let provider = Arc::new(FakeProvider::new());
        let store = TokenStore::in_memory().unwrap();
        let service = BookmarkService::new(store, provider.clone(), picker);
        (provider, service)
    }

    #[tokio::test]
    async fn test_pick_restore_release_scenario() {
        let picker = ScriptedPicker::picks(&["/Users/x/Documents/Proj"]);
        let (provider, service) = service(picker);

        // pickFolder returns the chosen path and persists a token.
        let picked = service.pick_folder().await.unwrap().unwrap();
        assert_eq!(picked.path, "/Users/x/Documents/Proj");
        assert!(!service.store().get().unwrap().unwrap().is_empty());
        assert_eq!(provider.held_count(), 0);

        // restoreBookmark resolves to the same path and holds the lock.
        let restored = service.restore_bookmark().unwrap().unwrap();
        assert_eq!(restored, "/Users/x/Documents/Proj");
        assert!(provider.is_access_held(&RawLocator::new("/Users/x/Documents/Proj")));

        // releaseBookmark always reports true and drops the lock.
        assert!(service.release_bookmark());
        assert_eq!(provider.held_count(), 0);

        // The lock is re-acquirable after release.
        let restored = service.restore_bookmark().unwrap().unwrap();
        assert_eq!(restored, "/Users/x/Documents/Proj");
    }

    #[tokio::test]
    async fn test_pick_cancel_returns_null() {
        let (_provider, service) = service(ScriptedPicker::cancels());

        let picked = service.pick_folder().await.unwrap();
        assert_eq!(picked, None);
        assert_eq!(service.store().get().unwrap(), None);
    }

    #[tokio::test]
    async fn test_restore_with_empty_store_returns_null() {
        let (_provider, service) = service(ScriptedPicker::picks(&[]));
        assert_eq!(service.restore_bookmark().unwrap(), None);
    }

    #[tokio::test]
    async fn test_second_pick_overwrites_first_grant() {
        let picker = ScriptedPicker::picks(&["/work/old", "/work/new"]);
        let (_provider, service) = service(picker);

        service.pick_folder().await.unwrap();
        service.pick_folder().await.unwrap();

        let restored = service.restore_bookmark().unwrap().unwrap();
        assert_eq!(restored, "/work/new");
    }

    #[tokio::test]
    async fn test_unbookmarkable_location_reports_bookmark_error() {
        let picker = ScriptedPicker::picks(&["/volumes/ephemeral"]);
        let (provider, service) = service(picker);
        provider.set_refuse_mint("/volumes/ephemeral", true);

        let err = service.pick_folder().await.unwrap_err();
        assert_eq!(err.code, "BOOKMARK_ERROR");
        // No partial state: nothing persisted, nothing held.
        assert_eq!(service.store().get().unwrap(), None);
        assert_eq!(provider.held_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_bookmark_reports_code_and_keeps_store() {
        let picker = ScriptedPicker::picks(&["/work/proj"]);
        let (provider, service) = service(picker);

        service.pick_folder().await.unwrap();
        let stored_before = service.store().get().unwrap();

        provider.set_stale("/work/proj", true);
        let err = service.restore_bookmark().unwrap_err();

        assert_eq!(err.code, "BOOKMARK_STALE");
        assert_eq!(service.store().get().unwrap(), stored_before);
        assert_eq!(provider.held_count(), 0);
    }

    #[tokio::test]
    async fn test_lock_refusal_reports_start_access_fail() {
        let picker = ScriptedPicker::picks(&["/work/proj"]);
        let (provider, service) = service(picker);

        service.pick_folder().await.unwrap();
        provider.set_refuse_access("/work/proj", true);

        let err = service.restore_bookmark().unwrap_err();
        assert_eq!(err.code, "START_ACCESS_FAIL");
    }

    #[tokio::test]
    async fn test_restore_while_active_reports_restore_error() {
        let picker = ScriptedPicker::picks(&["/work/proj"]);
        let (provider, service) = service(picker);

        service.pick_folder().await.unwrap();
        service.restore_bookmark().unwrap();

        let err = service.restore_bookmark().unwrap_err();
        assert_eq!(err.code, "RESTORE_ERROR");
        // First session still holds its scope.
        assert!(provider.is_access_held(&RawLocator::new("/work/proj")));
    }

    #[tokio::test]
    async fn test_release_with_no_session_is_true() {
        let (_provider, service) = service(ScriptedPicker::picks(&[]));
        assert!(service.release_bookmark());
        assert!(service.release_bookmark());
    }
}
