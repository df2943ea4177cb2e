//! Login, logout and member profile endpoints.

use reqwest::header::{HeaderMap, SET_COOKIE};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{ApiError, ApiRequest, SessionClient};
use crate::models::{
    ApiEnvelope, AppleLoginRequest, KakaoLoginRequest, LoginResult, MemberInfo, MemberInitRequest,
};

const APPLE_LOGIN_PATH: &str = "/login/apple";
const KAKAO_LOGIN_PATH: &str = "/login/kakao";
const LOGOUT_PATH: &str = "/logout";

/// Value of cookie `name` from the response's `Set-Cookie` headers.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookie| cookie.split(';'))
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

impl SessionClient {
    // ===== Authentication =====

    /// Sign in with an Apple identity token.
    pub async fn login_with_apple(&self, identity_token: &str) -> Result<LoginResult, ApiError> {
        let request = ApiRequest::post(APPLE_LOGIN_PATH).json(&AppleLoginRequest {
            identity_token: identity_token.to_string(),
        })?;
        self.login(request).await
    }

    /// Sign in with a Kakao profile.
    pub async fn login_with_kakao(
        &self,
        name: &str,
        email: &str,
        social_id: &str,
    ) -> Result<LoginResult, ApiError> {
        let request = ApiRequest::post(KAKAO_LOGIN_PATH).json(&KakaoLoginRequest {
            kakao_name: name.to_string(),
            kakao_email: email.to_string(),
            social_id: social_id.to_string(),
        })?;
        self.login(request).await
    }

    async fn login(&self, request: ApiRequest) -> Result<LoginResult, ApiError> {
        let response = self.send_anonymous(&request).await?;
        let headers = response.headers().clone();
        let text = response.text().await?;

        let envelope: ApiEnvelope<LoginResult> = serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse {}: {}", request.path, e))
        })?;
        let mut result = envelope.into_result()?;

        // Tokens set as cookies take precedence over the body
        if let Some(token) = cookie_value(&headers, "accessToken") {
            result.access_token = Some(token);
        }
        if let Some(token) = cookie_value(&headers, "refreshToken") {
            result.refresh_token = Some(token);
        }

        match (result.access_token.as_deref(), result.refresh_token.as_deref()) {
            (Some(access), Some(refresh)) => self.save_credentials(access, refresh)?,
            _ => {
                return Err(ApiError::InvalidResponse(format!(
                    "{} returned no token pair",
                    request.path
                )))
            }
        }

        info!(member_id = result.id, first_login = result.is_first, "Logged in");
        Ok(result)
    }

    /// End the session on the server and locally.
    ///
    /// Local credentials are cleared even when the server call fails; that
    /// failure is still returned.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let server_result = self
            .request_json::<ApiEnvelope<Value>>(ApiRequest::post(LOGOUT_PATH))
            .await
            .and_then(ApiEnvelope::into_result);

        self.clear_credentials()?;

        match server_result {
            Ok(_) => {
                info!("Logged out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Server logout failed, local session cleared anyway");
                Err(e)
            }
        }
    }

    // ===== Member profile =====

    pub async fn member_info(&self) -> Result<MemberInfo, ApiError> {
        self.request_result(ApiRequest::get("/member/info")).await
    }

    pub async fn member_name(&self) -> Result<String, ApiError> {
        self.request_result(ApiRequest::get("/member/name")).await
    }

    /// Ask the server about `nickname`. Returns its boolean verdict as is.
    pub async fn check_nickname(&self, nickname: &str) -> Result<bool, ApiError> {
        let path = format!("/member/check/{}", urlencoding::encode(nickname));
        self.request_result(ApiRequest::post(path)).await
    }

    /// Submit the onboarding questionnaire.
    pub async fn update_member_init_info(&self, answers: &MemberInitRequest) -> Result<(), ApiError> {
        self.request_result::<Value>(ApiRequest::patch("/member").json(answers)?)
            .await?;
        info!(newbie = answers.is_newbie, "Onboarding answers saved");
        Ok(())
    }

    /// Change the display name.
    pub async fn update_member_name(&self, name: &str) -> Result<String, ApiError> {
        let request = ApiRequest::patch("/member/info").json(&json!({ "name": name }))?;
        self.request_result(request).await
    }

    pub async fn delete_profile_image(&self) -> Result<String, ApiError> {
        self.request_result(ApiRequest::delete("/member/profileImage"))
            .await
    }

    // ===== Account deletion =====

    /// Delete the account. Local credentials are cleared once the server
    /// confirms.
    pub async fn delete_member(&self, reason: Option<&str>) -> Result<(), ApiError> {
        let request = ApiRequest::delete("/member/delete").json(&json!({ "reason": reason }))?;
        self.delete_account(request).await
    }

    /// Delete an account created with Sign in with Apple, revoking the
    /// Apple grant with `authorization_code`.
    pub async fn delete_apple_member(&self, authorization_code: &str) -> Result<(), ApiError> {
        let request = ApiRequest::delete("/member/delete/apple")
            .json(&json!({ "authorizationCode": authorization_code }))?;
        self.delete_account(request).await
    }

    async fn delete_account(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.request_result::<Value>(request).await?;
        self.clear_credentials()?;
        info!("Account deleted");
        Ok(())
    }
}
