use serde::Serialize;

/// One resolved placement row as shown in the admin listing.
#[derive(Clone, Debug, Serialize)]
pub struct PlacementDescriptor {
    /// Permalink of the page the directive sits on; empty when the page
    /// no longer resolves.
    pub link: String,
    pub page_title: String,
    pub category_label: &'static str,
    /// Canonical directive string reconstructed from the stored attributes.
    pub directive: String,
}

/// Per-owner reconciliation output: the true total across all categories
/// plus a bounded sample for the requested page. `samples` is never null,
/// and `total_count` is `None` only for the synthetic legacy group.
#[derive(Clone, Debug, Serialize)]
pub struct PlacementPage {
    pub total_count: Option<i64>,
    pub samples: Vec<PlacementDescriptor>,
}

/// Synthesized pseudo-feed for placements recorded before feeds had
/// stable ids. Never persisted.
#[derive(Clone, Debug, Serialize)]
pub struct LegacyFeedGroup {
    pub signature: String,
    pub display_name: String,
    pub feed_type: String,
}

#[derive(Debug, Serialize)]
pub struct FeedPlacements {
    pub feed_id: i64,
    pub name: Option<String>,
    pub page: PlacementPage,
}

#[derive(Serialize)]
pub struct FeedPlacementsList {
    pub page: u32,
    pub feeds: Vec<FeedPlacements>,
}

#[derive(Serialize)]
pub struct LegacyPlacementsRow {
    pub group: LegacyFeedGroup,
    pub page: PlacementPage,
}

#[derive(Serialize)]
pub struct LegacyPlacementsList {
    pub page: u32,
    pub groups: Vec<LegacyPlacementsRow>,
}
