//! Authentication module

pub mod context;
pub mod error_messages;
pub mod guards;
pub mod restore;
pub mod token_store;

// Re-export commonly used items
pub use context::{AuthAction, SessionState, SessionStore};
pub use guards::{AuthGuard, GuardOutcome, GuestGuard, RoleGuard, Route, RouteGuard};
pub use restore::{RestoreOutcome, restore_session};
pub use token_store::{FileStore, KeyValueStore, MemoryStore, StorageError, TokenStore};

#[cfg(target_arch = "wasm32")]
pub use token_store::BrowserStore;
