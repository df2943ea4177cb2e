use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One page of a paged listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default)]
    pub content: Vec<T>,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: Option<u64>,
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        self.page_number + 1 >= self.total_pages
    }
}

/// Wine as it appears in search results and the wishlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct WineSummary {
    pub wine_id: i64,
    pub name: String,
    #[serde(default)]
    pub name_eng: Option<String>,
    #[serde(default)]
    pub vintage_year: Option<i32>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sort: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub variety: String,
    #[serde(default)]
    pub vivino_rating: Option<f64>,
    #[serde(default)]
    pub price: Option<i64>,
}

/// `GET /wine/{id}`: the wine plus a few of its latest reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct WineDetail {
    #[serde(rename = "wineInfoResponse")]
    pub info: WineInfo,
    #[serde(default)]
    pub recent_reviews: Vec<Review>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct WineInfo {
    pub wine_id: i64,
    pub name: String,
    #[serde(default)]
    pub name_eng: Option<String>,
    #[serde(default)]
    pub vintage_year: Option<i32>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub sort: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub variety: String,
    #[serde(default)]
    pub vivino_rating: Option<f64>,
    // Averages over members' tasting notes
    #[serde(default)]
    pub avg_sweetness: Option<f64>,
    #[serde(default)]
    pub avg_acidity: Option<f64>,
    #[serde(default)]
    pub avg_tannin: Option<f64>,
    #[serde(default)]
    pub avg_body: Option<f64>,
    #[serde(default)]
    pub avg_alcohol: Option<f64>,
    #[serde(default)]
    pub nose1: Option<String>,
    #[serde(default)]
    pub nose2: Option<String>,
    #[serde(default)]
    pub nose3: Option<String>,
    #[serde(default)]
    pub avg_member_rating: Option<f64>,
    #[serde(default)]
    pub liked: bool,
}

impl WineInfo {
    /// Most mentioned aromas, in rank order.
    pub fn top_aromas(&self) -> Vec<&str> {
        [&self.nose1, &self.nose2, &self.nose3]
            .into_iter()
            .filter_map(|nose| nose.as_deref())
            .filter(|nose| !nose.trim().is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub name: String,
    #[serde(default)]
    pub review: String,
    pub rating: f64,
    pub created_at: String,
    #[serde(default)]
    pub vintage_year: Option<i32>,
    #[serde(default)]
    pub taste_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct RecommendedWine {
    pub wine_id: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    pub wine_name: String,
    #[serde(default)]
    pub wine_name_eng: Option<String>,
    #[serde(default)]
    pub sort: String,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub vivino_rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryEntry {
    pub vintage: i32,
    pub purchase_date: String,
    pub price: i64,
    #[serde(default)]
    pub shop_name: String,
    #[serde(default)]
    pub purchase_type: Option<String>,
}

// ===== Cellar =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseType {
    /// Bought in a shop
    Offline,
    /// Bought directly, e.g. abroad or from the producer
    Direct,
}

impl std::fmt::Display for PurchaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PurchaseType::Offline => write!(f, "Offline"),
            PurchaseType::Direct => write!(f, "Direct"),
        }
    }
}

/// A bottle in the member's cellar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct MyWine {
    pub my_wine_id: i64,
    pub wine_id: i64,
    pub wine_name: String,
    #[serde(default)]
    pub vintage_year: Option<i32>,
    #[serde(default)]
    pub wine_sort: String,
    #[serde(default)]
    pub wine_country: String,
    #[serde(default)]
    pub wine_region: String,
    #[serde(default)]
    pub wine_variety: String,
    #[serde(default)]
    pub wine_image_url: Option<String>,
    pub purchase_date: String,
    pub purchase_price: i64,
    /// Days since purchase
    #[serde(default)]
    pub period: i64,
    #[serde(default)]
    pub purchase_type: Option<PurchaseType>,
    #[serde(default)]
    pub purchase_shop: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMyWine {
    pub wine_id: i64,
    pub vintage_year: i32,
    pub purchase_date: NaiveDate,
    pub purchase_price: i64,
    pub purchase_type: PurchaseType,
    pub purchase_shop: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyWineUpdate {
    pub vintage_year: i32,
    pub purchase_date: NaiveDate,
    pub purchase_price: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_type: Option<PurchaseType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_shop: Option<String>,
}

// ===== Tasting notes =====

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct TastingNotePreview {
    // Older servers answer with `noteId`
    #[serde(alias = "noteId")]
    pub tasting_note_id: i64,
    pub wine_id: i64,
    pub wine_name: String,
    #[serde(default)]
    pub vintage_year: Option<i32>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub taste_date: String,
    pub rating: f64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub sort: String,
}

/// Body of `POST /tasting-note/new-note`. Taste levels are 0-100.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTastingNote {
    pub wine_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vintage_year: Option<i32>,
    pub color: String,
    pub taste_date: NaiveDate,
    pub sweetness: u8,
    pub acidity: u8,
    pub tannin: u8,
    pub body: u8,
    pub alcohol: u8,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nose: Vec<String>,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
}

impl NewTastingNote {
    pub const MAX_LEVEL: u8 = 100;

    /// First taste level above `MAX_LEVEL`, by name.
    pub fn out_of_range_level(&self) -> Option<&'static str> {
        [
            ("sweetness", self.sweetness),
            ("acidity", self.acidity),
            ("tannin", self.tannin),
            ("body", self.body),
            ("alcohol", self.alcohol),
        ]
        .into_iter()
        .find(|(_, level)| *level > Self::MAX_LEVEL)
        .map(|(name, _)| name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct TastingNote {
    pub note_id: i64,
    pub wine_id: i64,
    pub wine_name: String,
    #[serde(default)]
    pub vintage_year: Option<i32>,
    #[serde(default)]
    pub color: String,
    pub taste_date: String,
    #[serde(default)]
    pub sweetness: f64,
    #[serde(default)]
    pub acidity: f64,
    #[serde(default)]
    pub tannin: f64,
    #[serde(default)]
    pub body: f64,
    #[serde(default)]
    pub alcohol: f64,
    #[serde(default)]
    pub nose_list: Vec<String>,
    pub rating: f64,
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

// ===== Food pairing =====

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct FoodPairing {
    pub food_name: String,
    pub food_flavor: FlavorProfile,
    #[serde(default)]
    pub recommend_wines: Vec<WineStyle>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct FlavorProfile {
    pub sweetness: f64,
    pub acidity: f64,
    pub body: f64,
    pub tannin: f64,
    pub alcohol: f64,
}

/// A kind of wine rather than a specific bottle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct WineStyle {
    pub sort: String,
    pub variety: String,
    pub country: String,
    pub region: String,
}
