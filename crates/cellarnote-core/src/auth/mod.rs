//! Authentication module for credential storage and session state.
//!
//! This module provides:
//! - `CredentialPair` and the `TokenStore` backends (keychain, file, memory)
//! - `SessionState`/`SessionWatch`: the observable signed-in/signed-out state
//! - `FederatedIdentity`: the fallback identity-token provider seam

pub mod credentials;
pub mod identity;
pub mod session;

#[cfg(feature = "keyring-storage")]
pub use credentials::KeyringTokenStore;
pub use credentials::{default_store, CredentialPair, FileTokenStore, MemoryTokenStore, TokenStore};
pub use identity::{FederatedIdentity, FederatedUser, StaticIdentity};
pub use session::{SessionState, SessionWatch};
