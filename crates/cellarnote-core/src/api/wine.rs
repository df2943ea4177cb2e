//! Wine catalog, cellar, wishlist and tasting note endpoints.

use tracing::{debug, info};

use super::{ApiError, ApiRequest, SessionClient};
use crate::models::{
    FoodPairing, MyWine, MyWineUpdate, NewMyWine, NewTastingNote, Page, PriceHistoryEntry,
    RecommendedWine, Review, TastingNote, TastingNotePreview, WineDetail, WineSummary,
};

/// Filters for `GET /wine`. Unset fields are left out of the query.
#[derive(Debug, Clone, Default)]
pub struct WineSearch {
    pub name: Option<String>,
    /// RED, WHITE, SPARKLING, ...
    pub sort: Option<String>,
    pub variety: Option<String>,
    pub country: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    /// Ordering, e.g. `price,asc`
    pub order: Vec<String>,
}

impl WineSearch {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        request = request
            .query_opt("searchName", self.name.as_deref())
            .query_opt("wineSort", self.sort.as_deref())
            .query_opt("wineVariety", self.variety.as_deref())
            .query_opt("wineCountry", self.country.as_deref())
            .query_opt("page", self.page)
            .query_opt("size", self.size);
        for order in &self.order {
            request = request.query("sort", order);
        }
        request
    }
}

/// Paging and ordering for a wine's reviews.
#[derive(Debug, Clone)]
pub struct ReviewQuery {
    pub vintage_year: Option<i32>,
    pub sort_type: String,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl ReviewQuery {
    /// Newest first, the ordering the app uses.
    pub const LATEST_FIRST: &'static str = "최신순";

    pub fn latest() -> Self {
        Self {
            vintage_year: None,
            sort_type: Self::LATEST_FIRST.to_string(),
            page: None,
            size: None,
        }
    }
}

impl Default for ReviewQuery {
    fn default() -> Self {
        Self::latest()
    }
}

impl SessionClient {
    // ===== Catalog =====

    /// Search the wine catalog
    pub async fn search_wines(&self, search: &WineSearch) -> Result<Page<WineSummary>, ApiError> {
        let page: Page<WineSummary> = self
            .request_result(search.apply(ApiRequest::get("/wine")))
            .await?;
        debug!(
            results = page.content.len(),
            page = page.page_number,
            total_pages = page.total_pages,
            "Wine search returned"
        );
        Ok(page)
    }

    /// Fetch one wine, optionally for a specific vintage
    pub async fn wine_detail(
        &self,
        wine_id: i64,
        vintage_year: Option<i32>,
    ) -> Result<WineDetail, ApiError> {
        let request =
            ApiRequest::get(format!("/wine/{}", wine_id)).query_opt("vintageYear", vintage_year);
        self.request_result(request).await
    }

    /// Wines picked for the member's taste profile
    pub async fn recommended_wines(&self) -> Result<Vec<RecommendedWine>, ApiError> {
        self.request_result(ApiRequest::get("/wine/recommend")).await
    }

    /// Wine styles that go with a dish
    pub async fn food_pairing(&self, food_name: &str) -> Result<FoodPairing, ApiError> {
        let request = ApiRequest::get("/wine/recommend/food").query("foodName", food_name);
        self.request_result(request).await
    }

    /// Prices members paid for a wine
    pub async fn price_history(
        &self,
        wine_id: i64,
        vintage_year: Option<i32>,
    ) -> Result<Vec<PriceHistoryEntry>, ApiError> {
        let request = ApiRequest::get(format!("/wine/{}/price-history", wine_id))
            .query_opt("vintageYear", vintage_year);
        self.request_result(request).await
    }

    pub async fn wine_reviews(
        &self,
        wine_id: i64,
        query: &ReviewQuery,
    ) -> Result<Page<Review>, ApiError> {
        let request = ApiRequest::get(format!("/wine/review/{}", wine_id))
            .query_opt("vintageYear", query.vintage_year)
            .query("sortType", &query.sort_type)
            .query_opt("page", query.page)
            .query_opt("size", query.size);
        self.request_result(request).await
    }

    // ===== Cellar =====

    pub async fn my_wines(&self) -> Result<Vec<MyWine>, ApiError> {
        self.request_result(ApiRequest::get("/my-wine")).await
    }

    pub async fn my_wine(&self, my_wine_id: i64) -> Result<MyWine, ApiError> {
        self.request_result(ApiRequest::get(format!("/my-wine/{}", my_wine_id)))
            .await
    }

    /// Add a bottle to the cellar. Returns the server's confirmation message.
    pub async fn add_my_wine(&self, wine: &NewMyWine) -> Result<String, ApiError> {
        let message = self
            .request_result(ApiRequest::post("/my-wine").json(wine)?)
            .await?;
        info!(wine_id = wine.wine_id, "Wine added to cellar");
        Ok(message)
    }

    pub async fn update_my_wine(
        &self,
        my_wine_id: i64,
        update: &MyWineUpdate,
    ) -> Result<String, ApiError> {
        let request = ApiRequest::patch(format!("/my-wine/{}", my_wine_id)).json(update)?;
        self.request_result(request).await
    }

    pub async fn delete_my_wine(&self, my_wine_id: i64) -> Result<String, ApiError> {
        self.request_result(ApiRequest::delete(format!("/my-wine/{}", my_wine_id)))
            .await
    }

    // ===== Wishlist =====

    pub async fn wishlist(&self) -> Result<Vec<WineSummary>, ApiError> {
        self.request_result(ApiRequest::get("/wine-wishlist")).await
    }

    pub async fn add_to_wishlist(
        &self,
        wine_id: i64,
        vintage_year: Option<i32>,
    ) -> Result<String, ApiError> {
        let request = ApiRequest::post(format!("/wine-wishlist/{}", wine_id))
            .query_opt("vintageYear", vintage_year);
        self.request_result(request).await
    }

    pub async fn remove_from_wishlist(
        &self,
        wine_id: i64,
        vintage_year: Option<i32>,
    ) -> Result<String, ApiError> {
        let request = ApiRequest::delete(format!("/wine-wishlist/{}", wine_id))
            .query_opt("vintageYear", vintage_year);
        self.request_result(request).await
    }

    // ===== Tasting notes =====

    pub async fn my_tasting_notes(&self) -> Result<Vec<TastingNotePreview>, ApiError> {
        self.request_result(ApiRequest::get("/tasting-note/my")).await
    }

    /// Record a tasting note. Taste levels above 100 are rejected locally.
    pub async fn create_tasting_note(&self, note: &NewTastingNote) -> Result<String, ApiError> {
        if let Some(level) = note.out_of_range_level() {
            return Err(ApiError::InvalidRequest(format!(
                "{} must be between 0 and {}",
                level,
                NewTastingNote::MAX_LEVEL
            )));
        }
        let message = self
            .request_result(ApiRequest::post("/tasting-note/new-note").json(note)?)
            .await?;
        info!(wine_id = note.wine_id, "Tasting note created");
        Ok(message)
    }

    pub async fn tasting_note(&self, note_id: i64) -> Result<TastingNote, ApiError> {
        self.request_result(ApiRequest::get(format!("/tasting-note/{}", note_id)))
            .await
    }

    pub async fn delete_tasting_note(&self, note_id: i64) -> Result<String, ApiError> {
        self.request_result(ApiRequest::delete(format!("/tasting-note/{}", note_id)))
            .await
    }
}
