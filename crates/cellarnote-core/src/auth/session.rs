//! Observable session state.
//!
//! The state is derived from whether a credential pair is stored; the
//! session client publishes a new value whenever it saves or clears the pair.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use super::CredentialPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Authenticated,
    SignedOut,
}

impl SessionState {
    pub fn from_pair(pair: Option<&CredentialPair>) -> Self {
        match pair {
            Some(_) => SessionState::Authenticated,
            None => SessionState::SignedOut,
        }
    }

    pub fn is_authenticated(self) -> bool {
        self == SessionState::Authenticated
    }
}

/// Broadcasts session transitions to UI observers.
#[derive(Clone)]
pub struct SessionWatch {
    tx: Arc<watch::Sender<SessionState>>,
}

impl SessionWatch {
    pub fn new(initial: SessionState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Publish a state; observers are only woken on an actual change.
    pub fn publish(&self, state: SessionState) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            info!(?state, "Session state changed");
        }
    }

    pub fn current(&self) -> SessionState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }
}
