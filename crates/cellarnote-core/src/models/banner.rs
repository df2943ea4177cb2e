use serde::{Deserialize, Serialize};

/// Home screen banner linking to a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub banner_id: i64,
    pub image_url: String,
    #[serde(default)]
    pub post_url: Option<String>,
}
