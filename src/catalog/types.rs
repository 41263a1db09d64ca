use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stored feed definition: one content source plus its display settings.
#[derive(Clone, Debug, Serialize)]
pub struct FeedDefinition {
    pub id: i64,
    pub name: Option<String>,
    /// Raw settings map; insertion order is irrelevant and the reconciler
    /// never interprets individual settings.
    pub settings: serde_json::Value,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct FeedListRow {
    pub feed_id: i64,
    pub name: Option<String>,
    pub total_placements: i64,
    pub active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct FeedList {
    pub feeds: Vec<FeedListRow>,
}
