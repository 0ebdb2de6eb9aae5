//! Scopekeep Core Library
//!
//! This crate provides the core functionality for Scopekeep, including:
//! - Security-scoped bookmark minting and resolution
//! - Access session lifecycle with symmetric acquire/release
//! - SQLite-based single-slot token persistence
//! - The host method-channel surface (pickFolder / restoreBookmark /
//!   releaseBookmark)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     scopekeep-core                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  bridge/       - Host channel service, picker trait         │
//! │  session/      - Access session state machine, active slot  │
//! │  platform/     - Security-scoped resource provider trait    │
//! │  store/        - SQLite token store                         │
//! │  types.rs      - Capability token, locator types            │
//! │  error.rs      - Error types                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The core holds no global state: the token store, the platform provider,
//! and the folder picker are all injected at construction, so hosts and
//! tests alike decide what stands behind them.

pub mod bridge;
pub mod error;
pub mod platform;
pub mod session;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{Error, GrantError, ResolveError, Result, StoreError};
pub use types::{CapabilityToken, PickedFolder, RawLocator, ResolvedLocation, StoredBookmark};

// Re-export bridge surface
pub use bridge::{BookmarkService, ChannelError, ChannelResult, FolderPicker, CHANNEL_NAME};

// Re-export session components
pub use session::{AccessSession, SessionManager, SessionState};

// Re-export platform boundary
pub use platform::{with_access, ScopedResourceProvider};

#[cfg(any(test, feature = "testing"))]
pub use platform::FakeProvider;

// Re-export storage
pub use store::{TokenStore, BOOKMARK_KEY};
