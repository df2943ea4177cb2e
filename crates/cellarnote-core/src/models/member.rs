use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppleLoginRequest {
    pub identity_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KakaoLoginRequest {
    pub kakao_name: String,
    pub kakao_email: String,
    pub social_id: String,
}

/// Account summary returned by the social login endpoints.
///
/// Tokens may arrive in the body or only as `Set-Cookie` headers; the
/// login call fills them in from whichever is present.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub id: i64,
    pub username: String,
    pub role: String,
    /// True until the onboarding questionnaire has been completed
    pub is_first: bool,
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for LoginResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResult")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("is_first", &self.is_first)
            .field("has_tokens", &(self.access_token.is_some() && self.refresh_token.is_some()))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    #[serde(default)]
    pub image_url: Option<String>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub auth_type: String,
    #[serde(default)]
    pub adult: bool,
    // Taste profile from onboarding, 1-5 scale
    #[serde(default)]
    pub acidity: Option<f64>,
    #[serde(default)]
    pub sweetness: Option<f64>,
    #[serde(default)]
    pub tannin: Option<f64>,
    #[serde(default)]
    pub body: Option<f64>,
    #[serde(default)]
    pub alcohol: Option<f64>,
}

impl MemberInfo {
    pub fn has_taste_profile(&self) -> bool {
        [self.acidity, self.sweetness, self.tannin, self.body, self.alcohol]
            .iter()
            .any(Option::is_some)
    }
}

/// Onboarding answers sent with `PATCH /member`.
///
/// Experienced drinkers fill in regions and varieties; newcomers fill in
/// preferred drinks, foods and a taste profile instead. Unused fields are
/// sent as `null`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInitRequest {
    pub name: String,
    pub is_newbie: bool,
    /// Monthly wine budget in KRW
    pub month_price: i64,
    pub wine_sort: Vec<String>,
    pub wine_area: Option<Vec<String>>,
    pub wine_variety: Option<Vec<String>>,
    pub preferred_alcohols: Option<Vec<String>>,
    pub preferred_foods: Option<Vec<String>>,
    pub acidity: Option<f64>,
    pub sweetness: Option<f64>,
    pub tannin: Option<f64>,
    pub body: Option<f64>,
    pub alcohol: Option<f64>,
}
