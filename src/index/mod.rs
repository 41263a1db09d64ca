use async_trait::async_trait;
use serde::Serialize;

use crate::attrs::AttributeMap;
use crate::error::Result;

pub mod pg;

#[cfg(test)]
pub mod memory;

/// Structural zone a placement was found in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Content,
    Header,
    Footer,
    Sidebar,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Content => "content",
            Category::Header => "header",
            Category::Footer => "footer",
            Category::Sidebar => "sidebar",
        }
    }

    /// Store rows may carry anything in the category column; unknown text
    /// maps to `None` and is only reachable via the relaxed query.
    pub fn parse(s: &str) -> Option<Category> {
        match s {
            "content" => Some(Category::Content),
            "header" => Some(Category::Header),
            "footer" => Some(Category::Footer),
            "sidebar" => Some(Category::Sidebar),
            _ => None,
        }
    }

    pub fn human_label(category: Option<Category>) -> &'static str {
        match category {
            Some(Category::Content) => "Content",
            Some(Category::Header) => "Header",
            Some(Category::Footer) => "Footer",
            Some(Category::Sidebar) => "Sidebar",
            None => "Unknown",
        }
    }
}

/// Fixed backfill order: header, then footer, then sidebar.
pub const BACKFILL_CATEGORIES: [Category; 3] =
    [Category::Header, Category::Footer, Category::Sidebar];

pub const CONTENT_ONLY: [Category; 1] = [Category::Content];

/// Who a placement belongs to: a cataloged feed, or a legacy signature
/// group for placements recorded before feeds had stable ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OwnerKey {
    Feed(i64),
    Legacy(String),
}

/// 1-based page request with a fixed size.
#[derive(Clone, Copy, Debug)]
pub struct PageRequest {
    pub number: u32,
    pub size: usize,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        (i64::from(self.number.max(1)) - 1) * self.size as i64
    }
}

/// One recorded occurrence of a rendering directive. Read-only to the
/// reconciler; the content scanner owns writes.
#[derive(Clone, Debug)]
pub struct Placement {
    pub id: i64,
    pub feed_id: Option<i64>,
    pub category: Option<Category>,
    pub page_ref: i64,
    pub attributes: AttributeMap,
}

impl Placement {
    /// Grouping signature for unkeyed rows, always recomputed from the
    /// attributes so the codec stays the single grouping authority.
    pub fn legacy_signature(&self) -> String {
        crate::directive::signature(&self.attributes, crate::directive::SIGNATURE_EXCLUDED_KEYS_V1)
    }
}

/// Query contract over the persisted placement records. Rows come back in
/// a stable order (insertion order) so pagination is consistent across
/// calls within one request. All failures surface as
/// `Error::StoreUnavailable`; an unreachable store must never look like an
/// empty result.
#[async_trait]
pub trait PlacementIndex: Send + Sync {
    /// Placements for one owner. `categories: None` relaxes the category
    /// filter entirely (including rows with missing tags); `page: None`
    /// returns all matching rows.
    async fn query_by_owner(
        &self,
        owner: &OwnerKey,
        categories: Option<&[Category]>,
        page: Option<PageRequest>,
    ) -> Result<Vec<Placement>>;

    /// Total placements for one owner across all categories.
    async fn count_by_owner(&self, owner: &OwnerKey) -> Result<i64>;

    /// Unkeyed (legacy) placements, grouped by signature. An empty
    /// `signatures` slice means all unkeyed rows.
    async fn query_by_grouping(
        &self,
        signatures: &[String],
        categories: Option<&[Category]>,
    ) -> Result<Vec<Placement>>;
}
