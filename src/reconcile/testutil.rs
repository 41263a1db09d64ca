// Hand-rolled fakes for reconciler tests.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::attrs::{AttrValue, AttributeMap};
use crate::catalog::FeedCatalog;
use crate::catalog::types::FeedDefinition;
use crate::error::{Error, Result};
use crate::index::{Category, OwnerKey, PageRequest, Placement, PlacementIndex};
use crate::resolve::{GlobalStatus, LocationResolver, SourceRegistry};

pub fn feed_def(id: i64, name: &str) -> FeedDefinition {
    FeedDefinition {
        id,
        name: Some(name.to_string()),
        settings: serde_json::json!({}),
        active: true,
        created_at: None,
    }
}

pub fn placement(id: i64, feed_id: Option<i64>, category: Option<Category>, page_ref: i64) -> Placement {
    let mut attributes = AttributeMap::new();
    if let Some(f) = feed_id {
        attributes.set("feed", AttrValue::Num(f.into()));
    }
    Placement { id, feed_id, category, page_ref, attributes }
}

pub fn legacy_placement(id: i64, page_ref: i64, pairs: &[(&str, &str)]) -> Placement {
    let mut attributes = AttributeMap::new();
    for (k, v) in pairs {
        attributes.set(*k, AttrValue::Str((*v).to_string()));
    }
    Placement { id, feed_id: None, category: Some(Category::Content), page_ref, attributes }
}

pub struct StaticCatalog {
    pub feeds: Vec<FeedDefinition>,
}

#[async_trait]
impl FeedCatalog for StaticCatalog {
    async fn get(&self, feed_id: i64) -> Result<Option<FeedDefinition>> {
        Ok(self.feeds.iter().find(|f| f.id == feed_id).cloned())
    }

    async fn list(&self, active: Option<bool>) -> Result<Vec<FeedDefinition>> {
        Ok(self
            .feeds
            .iter()
            .filter(|f| active.is_none_or(|a| f.active == a))
            .cloned()
            .collect())
    }
}

pub struct StaticResolver;

#[async_trait]
impl LocationResolver for StaticResolver {
    async fn permalink(&self, page_ref: i64) -> Result<String> {
        Ok(format!("https://example.org/?p={}", page_ref))
    }

    async fn title(&self, page_ref: i64) -> Result<String> {
        Ok(format!("Page {}", page_ref))
    }
}

#[derive(Default)]
pub struct MapRegistry {
    pub names: HashMap<String, String>,
}

#[async_trait]
impl SourceRegistry for MapRegistry {
    async fn lookup_display_name(&self, identifier: &str) -> Result<Option<String>> {
        Ok(self.names.get(identifier).cloned())
    }
}

pub struct FlagStatus(pub bool);

#[async_trait]
impl GlobalStatus for FlagStatus {
    async fn is_legacy_support_enabled(&self) -> Result<bool> {
        Ok(self.0)
    }
}

/// Index whose every query fails, for StoreUnavailable propagation tests.
pub struct DownIndex;

#[async_trait]
impl PlacementIndex for DownIndex {
    async fn query_by_owner(
        &self,
        _owner: &OwnerKey,
        _categories: Option<&[Category]>,
        _page: Option<PageRequest>,
    ) -> Result<Vec<Placement>> {
        Err(Error::StoreUnavailable(sqlx::Error::PoolTimedOut))
    }

    async fn count_by_owner(&self, _owner: &OwnerKey) -> Result<i64> {
        Err(Error::StoreUnavailable(sqlx::Error::PoolTimedOut))
    }

    async fn query_by_grouping(
        &self,
        _signatures: &[String],
        _categories: Option<&[Category]>,
    ) -> Result<Vec<Placement>> {
        Err(Error::StoreUnavailable(sqlx::Error::PoolTimedOut))
    }
}

/// Index that fails only for one feed, for whole-listing abort tests.
pub struct PartialDownIndex {
    pub inner: crate::index::memory::MemoryIndex,
    pub bad_feed: i64,
}

#[async_trait]
impl PlacementIndex for PartialDownIndex {
    async fn query_by_owner(
        &self,
        owner: &OwnerKey,
        categories: Option<&[Category]>,
        page: Option<PageRequest>,
    ) -> Result<Vec<Placement>> {
        if *owner == OwnerKey::Feed(self.bad_feed) {
            return Err(Error::StoreUnavailable(sqlx::Error::PoolTimedOut));
        }
        self.inner.query_by_owner(owner, categories, page).await
    }

    async fn count_by_owner(&self, owner: &OwnerKey) -> Result<i64> {
        if *owner == OwnerKey::Feed(self.bad_feed) {
            return Err(Error::StoreUnavailable(sqlx::Error::PoolTimedOut));
        }
        self.inner.count_by_owner(owner).await
    }

    async fn query_by_grouping(
        &self,
        signatures: &[String],
        categories: Option<&[Category]>,
    ) -> Result<Vec<Placement>> {
        self.inner.query_by_grouping(signatures, categories).await
    }
}

/// Index that leaks a content-tagged row into the backfill query,
/// simulating a broken category filter.
pub struct LeakyIndex {
    pub inner: crate::index::memory::MemoryIndex,
    pub leak: Placement,
}

#[async_trait]
impl PlacementIndex for LeakyIndex {
    async fn query_by_owner(
        &self,
        owner: &OwnerKey,
        categories: Option<&[Category]>,
        page: Option<PageRequest>,
    ) -> Result<Vec<Placement>> {
        let mut rows = self.inner.query_by_owner(owner, categories, page).await?;
        if categories.is_some_and(|set| !set.contains(&Category::Content)) {
            rows.push(self.leak.clone());
        }
        Ok(rows)
    }

    async fn count_by_owner(&self, owner: &OwnerKey) -> Result<i64> {
        self.inner.count_by_owner(owner).await
    }

    async fn query_by_grouping(
        &self,
        signatures: &[String],
        categories: Option<&[Category]>,
    ) -> Result<Vec<Placement>> {
        self.inner.query_by_grouping(signatures, categories).await
    }
}
