//! Wire types for the cellarnote backend.
//!
//! - `ApiEnvelope`: the `{isSuccess, code, message, result}` wrapper every
//!   JSON endpoint answers with
//! - Member types: login results, profile info and onboarding answers
//! - Wine types: catalog, cellar, wishlist, tasting notes and pairings
//! - Banners for the home screen

pub mod banner;
pub mod envelope;
pub mod member;
pub mod wine;

pub use banner::Banner;
pub use envelope::ApiEnvelope;
pub use member::{AppleLoginRequest, KakaoLoginRequest, LoginResult, MemberInfo, MemberInitRequest};
pub use wine::{
    FlavorProfile, FoodPairing, MyWine, MyWineUpdate, NewMyWine, NewTastingNote, Page,
    PriceHistoryEntry, PurchaseType, RecommendedWine, Review, TastingNote, TastingNotePreview,
    WineDetail, WineInfo, WineStyle, WineSummary,
};
