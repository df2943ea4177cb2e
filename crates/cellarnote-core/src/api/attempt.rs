//! Refresh-and-retry state machine for a single request.
//!
//! Every authenticated request moves through these states:
//!
//! ```text
//! FirstAttempt --401--> Refreshing --renewed--> Retried --any--> Terminal
//!      |                    |
//!      +--other--> Terminal +--missing / failed--> Terminal
//! ```
//!
//! A 401 coming back from the reissue endpoint itself always goes straight
//! to `Terminal` with a purge, and a 401 on a `Retried` request never starts
//! another refresh.

use reqwest::StatusCode;

use super::ApiRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    FirstAttempt,
    Refreshing,
    Retried,
    Terminal,
}

/// What the client does with the response it just received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Return the response to the caller unchanged.
    Deliver,
    /// Surface the HTTP error; stored credentials are left alone.
    Fail,
    /// Obtain a new credential pair, then resend once.
    Refresh,
    /// Clear stored credentials, then surface the error.
    PurgeAndFail,
}

/// Result of the refresh performed in the `Refreshing` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Renewed,
    MissingToken,
    Failed,
}

impl Attempt {
    pub fn start(request: &ApiRequest) -> Self {
        if request.is_retried() {
            Attempt::Retried
        } else {
            Attempt::FirstAttempt
        }
    }

    pub fn on_response(self, status: StatusCode, is_reissue_call: bool) -> (Attempt, Step) {
        if status.as_u16() < 400 {
            return (Attempt::Terminal, Step::Deliver);
        }
        if status != StatusCode::UNAUTHORIZED {
            return (Attempt::Terminal, Step::Fail);
        }
        if is_reissue_call {
            return (Attempt::Terminal, Step::PurgeAndFail);
        }
        match self {
            Attempt::FirstAttempt => (Attempt::Refreshing, Step::Refresh),
            Attempt::Refreshing | Attempt::Retried | Attempt::Terminal => {
                (Attempt::Terminal, Step::Fail)
            }
        }
    }

    pub fn on_refresh(self, outcome: RefreshOutcome) -> Attempt {
        match (self, outcome) {
            (Attempt::Refreshing, RefreshOutcome::Renewed) => Attempt::Retried,
            _ => Attempt::Terminal,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Attempt::Terminal
    }
}
