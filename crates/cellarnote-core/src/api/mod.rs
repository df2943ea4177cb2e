//! REST API client module for the cellarnote backend.
//!
//! This module provides the `SessionClient` for issuing authenticated
//! requests. Requests carry `Authorization: Bearer <accessToken>`; an
//! expired access token is exchanged once through the reissue endpoint
//! using the stored refresh token.

pub mod attempt;
pub mod banner;
pub mod client;
pub mod error;
pub mod member;
mod refresh;
pub mod request;
pub mod wine;

pub use attempt::{Attempt, RefreshOutcome, Step};
pub use client::{SessionClient, SessionClientBuilder};
pub use error::{ApiError, RefreshError};
pub use request::ApiRequest;
pub use wine::{ReviewQuery, WineSearch};
