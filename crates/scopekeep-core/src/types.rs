//! Shared type definitions

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Opaque serialized security-scoped bookmark bytes.
///
/// The encoding is platform-defined; the core never inspects it, only moves
/// it between the platform provider and the token store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityToken(pub Vec<u8>);

impl CapabilityToken {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for CapabilityToken {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Raw, OS-provided reference to a location the user just picked.
///
/// Only valid within the process that obtained it; durable re-access goes
/// through a [`CapabilityToken`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLocator {
    path: PathBuf,
}

impl RawLocator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Human-readable path for host display.
    pub fn display_path(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

/// Result of deserializing a capability token back into a location.
///
/// Staleness is reported as data here; the session layer turns it into an
/// error so callers cannot miss it.
#[derive(Debug, Clone)]
pub struct ResolvedLocation {
    pub locator: RawLocator,
    pub is_stale: bool,
}

/// Persisted bookmark row: token bytes plus when the token was minted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBookmark {
    pub token: CapabilityToken,
    pub minted_at: chrono::DateTime<chrono::Utc>,
}

/// Successful folder pick, as returned over the host channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PickedFolder {
    pub path: String,
}
