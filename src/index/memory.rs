// In-memory placement index used by the reconciler tests. Mirrors the
// Postgres implementation's semantics: insertion-order rows, category
// filtering, signature matching for legacy owners.

use async_trait::async_trait;

use crate::error::Result;

use super::{Category, OwnerKey, PageRequest, Placement, PlacementIndex};

#[derive(Default)]
pub struct MemoryIndex {
    rows: Vec<Placement>,
}

impl MemoryIndex {
    pub fn new(rows: Vec<Placement>) -> Self {
        Self { rows }
    }

    fn matches(owner: &OwnerKey, p: &Placement) -> bool {
        match owner {
            OwnerKey::Feed(id) => p.feed_id == Some(*id),
            OwnerKey::Legacy(sig) => p.feed_id.is_none() && p.legacy_signature() == *sig,
        }
    }

    fn in_categories(categories: Option<&[Category]>, p: &Placement) -> bool {
        match categories {
            None => true,
            Some(set) => p.category.is_some_and(|c| set.contains(&c)),
        }
    }
}

#[async_trait]
impl PlacementIndex for MemoryIndex {
    async fn query_by_owner(
        &self,
        owner: &OwnerKey,
        categories: Option<&[Category]>,
        page: Option<PageRequest>,
    ) -> Result<Vec<Placement>> {
        let matched = self
            .rows
            .iter()
            .filter(|p| Self::matches(owner, p) && Self::in_categories(categories, p))
            .cloned();
        Ok(match page {
            Some(pr) => matched.skip(pr.offset() as usize).take(pr.size).collect(),
            None => matched.collect(),
        })
    }

    async fn count_by_owner(&self, owner: &OwnerKey) -> Result<i64> {
        Ok(self.rows.iter().filter(|p| Self::matches(owner, p)).count() as i64)
    }

    async fn query_by_grouping(
        &self,
        signatures: &[String],
        categories: Option<&[Category]>,
    ) -> Result<Vec<Placement>> {
        Ok(self
            .rows
            .iter()
            .filter(|p| p.feed_id.is_none() && Self::in_categories(categories, p))
            .filter(|p| signatures.is_empty() || signatures.contains(&p.legacy_signature()))
            .cloned()
            .collect())
    }
}
