//! cellarnote core library
//!
//! Session and API plumbing for the cellarnote wine journal:
//! - `SessionClient`: authenticated requests with single refresh-and-retry
//! - Token pair storage (keychain, file, or memory)
//! - Observable session state for the UI layer
//! - Typed endpoints: login and member, wine catalog, cellar, wishlist,
//!   tasting notes, food pairing and banners
//!
//! # Features
//!
//! - `keyring-storage` (default): keep the token pair in the OS keychain
//! - `ts`: derive TypeScript bindings for the wire types
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cellarnote_core::{ClientConfig, FileTokenStore, SessionClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(FileTokenStore::in_config_dir()?);
//!     let client = SessionClient::new(ClientConfig::load(), store)?;
//!
//!     client.login_with_apple("<identity token>").await?;
//!     let me = client.member_info().await?;
//!     println!("Signed in as {}", me.username);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiError, ApiRequest, RefreshError, ReviewQuery, SessionClient, WineSearch};
pub use auth::{
    CredentialPair, FederatedIdentity, FederatedUser, FileTokenStore, MemoryTokenStore,
    SessionState, StaticIdentity, TokenStore,
};
pub use config::{ClientConfig, ConfigSource};
pub use models::{ApiEnvelope, Banner, LoginResult, MemberInfo, Page};
