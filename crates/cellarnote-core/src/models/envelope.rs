use serde::{Deserialize, Serialize};

use crate::api::ApiError;

fn default_success() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_success")]
    pub is_success: bool,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    pub result: T,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload, turning `isSuccess: false` into an error.
    pub fn into_result(self) -> Result<T, ApiError> {
        if self.is_success {
            Ok(self.result)
        } else {
            Err(ApiError::Rejected {
                code: self.code,
                message: self.message,
            })
        }
    }
}
