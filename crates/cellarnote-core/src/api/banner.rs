//! Home screen banners.

use super::{ApiError, ApiRequest, SessionClient};
use crate::models::Banner;

impl SessionClient {
    pub async fn banners(&self) -> Result<Vec<Banner>, ApiError> {
        self.request_result(ApiRequest::get("/banner")).await
    }
}
