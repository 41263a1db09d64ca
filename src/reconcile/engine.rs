use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, Span};

use crate::catalog::FeedCatalog;
use crate::directive;
use crate::error::{Error, Result};
use crate::index::{
    Category, OwnerKey, PageRequest, Placement, PlacementIndex, BACKFILL_CATEGORIES, CONTENT_ONLY,
};
use crate::resolve::{GlobalStatus, LocationResolver, SourceRegistry};
use crate::telemetry::ctx::LogCtx;
use crate::telemetry::ops::reconcile::{Phase, Reconcile};

use super::types::{FeedPlacements, PlacementDescriptor, PlacementPage};

/// Fixed admin page size. A configuration constant, never derived from
/// row counts.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Upper bound on concurrent per-feed reconciliations in the all-feeds
/// listing.
pub const MAX_WORKERS: usize = 8;

/// Read-only orchestrator over the placement index and resolver ports.
/// One instance serves one admin request; the index is treated as a
/// snapshot for its duration even though the scanner may rewrite it
/// between requests.
#[derive(Clone)]
pub struct Reconciler {
    pub(super) catalog: Arc<dyn FeedCatalog>,
    pub(super) index: Arc<dyn PlacementIndex>,
    pub(super) resolver: Arc<dyn LocationResolver>,
    pub(super) registry: Arc<dyn SourceRegistry>,
    pub(super) status: Arc<dyn GlobalStatus>,
    pub(super) page_size: usize,
}

impl Reconciler {
    pub fn new(
        catalog: Arc<dyn FeedCatalog>,
        index: Arc<dyn PlacementIndex>,
        resolver: Arc<dyn LocationResolver>,
        registry: Arc<dyn SourceRegistry>,
        status: Arc<dyn GlobalStatus>,
    ) -> Self {
        Self {
            catalog,
            index,
            resolver,
            registry,
            status,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Placement page for one cataloged feed. A feed id absent from the
    /// catalog is an explicit error, never an empty page.
    pub async fn list_feed_placements(
        &self,
        feed_id: i64,
        page: u32,
        log: Option<&LogCtx<Reconcile>>,
    ) -> Result<PlacementPage> {
        if self.catalog.get(feed_id).await?.is_none() {
            return Err(Error::UnknownFeed(feed_id));
        }
        self.owner_page(&OwnerKey::Feed(feed_id), page, log).await
    }

    /// The "list feeds" admin request: every catalog feed with its page,
    /// reconciled on a bounded worker pool. Catalog order is preserved in
    /// the output; the first store failure aborts the whole response.
    pub async fn list_all_feeds(&self, page: u32) -> Result<Vec<FeedPlacements>> {
        let feeds = self.catalog.list(None).await?;
        let workers = feeds.len().min(MAX_WORKERS).max(1);
        let sem = Arc::new(Semaphore::new(workers));

        let mut set = JoinSet::new();
        for (pos, feed) in feeds.into_iter().enumerate() {
            let this = self.clone();
            let sem = Arc::clone(&sem);
            set.spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                let page = this.owner_page(&OwnerKey::Feed(feed.id), page, None).await;
                (pos, feed, page)
            });
        }

        let mut slots: Vec<Option<FeedPlacements>> = Vec::new();
        slots.resize_with(set.len(), || None);
        while let Some(joined) = set.join_next().await {
            let (pos, feed, page) = match joined {
                Ok(v) => v,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                // a cancelled worker means a feed with no page; the
                // listing must not ship shorter than the catalog
                Err(_) => return Err(Error::Interrupted),
            };
            slots[pos] = Some(FeedPlacements {
                feed_id: feed.id,
                name: feed.name,
                page: page?,
            });
        }
        slots
            .into_iter()
            .map(|slot| slot.ok_or(Error::Interrupted))
            .collect()
    }

    /// Steps 1-8 for one owner (feed or legacy signature group).
    pub(super) async fn owner_page(
        &self,
        owner: &OwnerKey,
        page: u32,
        log: Option<&LogCtx<Reconcile>>,
    ) -> Result<PlacementPage> {
        let page = page.max(1);
        let size = self.page_size;

        // 1. primary content-category query
        let content_rows = self
            .index
            .query_by_owner(owner, Some(&CONTENT_ONLY), Some(PageRequest { number: page, size }))
            .instrument(phase_span(log, &Phase::Primary))
            .await?;

        // 2. a short content page is, by stable-query construction, the
        // last one; only then are the non-content categories fetched, once
        // and unpaginated.
        let is_last_content_page = content_rows.len() < size;
        let extra_rows = if is_last_content_page {
            let mut extras = self
                .index
                .query_by_owner(owner, Some(&BACKFILL_CATEGORIES), None)
                .instrument(phase_span(log, &Phase::Backfill))
                .await?;
            sort_backfill(&mut extras);
            extras
        } else {
            Vec::new()
        };

        // 3. the two queries filter complementary category sets; a row
        // outside its set means the index is broken, not a dedup problem.
        verify_disjoint(&content_rows, &extra_rows)?;

        // 4. content first, then header/footer/sidebar
        let mut rows = content_rows;
        rows.extend(extra_rows);

        // 5. one relaxed retry on an empty first page, covering stores
        // with missing or inconsistent category tags
        if page == 1 && rows.is_empty() {
            rows = self
                .index
                .query_by_owner(owner, None, Some(PageRequest { number: 1, size }))
                .instrument(phase_span(log, &Phase::Relax))
                .await?;
        }

        rows.truncate(size);

        // 6. true total across all categories, independent of the sample
        let total = self
            .index
            .count_by_owner(owner)
            .instrument(phase_span(log, &Phase::Count))
            .await?;

        // 7. resolve rows into descriptors
        let samples = async {
            let mut samples = Vec::with_capacity(rows.len());
            for row in &rows {
                samples.push(self.describe(row).await?);
            }
            Ok::<_, Error>(samples)
        }
        .instrument(phase_span(log, &Phase::Resolve))
        .await?;

        Ok(PlacementPage { total_count: Some(total), samples })
    }

    async fn describe(&self, placement: &Placement) -> Result<PlacementDescriptor> {
        Ok(PlacementDescriptor {
            link: self.resolver.permalink(placement.page_ref).await?,
            page_title: self.resolver.title(placement.page_ref).await?,
            category_label: Category::human_label(placement.category),
            directive: directive::encode(directive::DIRECTIVE_NAME, &placement.attributes),
        })
    }
}

// Span-or-noop so the per-owner future stays Send for the worker pool.
fn phase_span(log: Option<&LogCtx<Reconcile>>, phase: &Phase) -> Span {
    log.map(|ctx| ctx.span(phase)).unwrap_or_else(Span::none)
}

fn sort_backfill(extras: &mut [Placement]) {
    extras.sort_by_key(|p| {
        BACKFILL_CATEGORIES
            .iter()
            .position(|c| Some(*c) == p.category)
            .unwrap_or(BACKFILL_CATEGORIES.len())
    });
}

fn verify_disjoint(content_rows: &[Placement], extra_rows: &[Placement]) -> Result<()> {
    if let Some(p) = content_rows
        .iter()
        .find(|p| p.category != Some(Category::Content))
    {
        return Err(Error::CategoryOverlap { page_ref: p.page_ref });
    }
    if let Some(p) = extra_rows
        .iter()
        .find(|p| !matches!(p.category, Some(c) if BACKFILL_CATEGORIES.contains(&c)))
    {
        return Err(Error::CategoryOverlap { page_ref: p.page_ref });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::MemoryIndex;
    use crate::reconcile::testutil::*;

    fn reconciler(index: Arc<dyn PlacementIndex>, feeds: Vec<crate::catalog::types::FeedDefinition>) -> Reconciler {
        Reconciler::new(
            Arc::new(StaticCatalog { feeds }),
            index,
            Arc::new(StaticResolver),
            Arc::new(MapRegistry::default()),
            Arc::new(FlagStatus(false)),
        )
        .with_page_size(5)
    }

    fn content_rows(feed_id: i64, n: i64) -> Vec<Placement> {
        (1..=n)
            .map(|i| placement(i, Some(feed_id), Some(Category::Content), 100 + i))
            .collect()
    }

    // Scenario A: 12 content placements, page size 5. Pages 1 and 2 are
    // full content with no backfill; page 3 carries the tail plus the
    // non-content rows, capped at the page size.
    #[tokio::test]
    async fn scenario_a_backfill_lands_on_last_content_page() {
        let mut rows = content_rows(1, 12);
        rows.push(placement(20, Some(1), Some(Category::Sidebar), 200));
        rows.push(placement(21, Some(1), Some(Category::Header), 201));
        let r = reconciler(Arc::new(MemoryIndex::new(rows)), vec![feed_def(1, "F1")]);

        let p1 = r.list_feed_placements(1, 1, None).await.unwrap();
        let p2 = r.list_feed_placements(1, 2, None).await.unwrap();
        let p3 = r.list_feed_placements(1, 3, None).await.unwrap();

        assert_eq!(p1.samples.len(), 5);
        assert_eq!(p2.samples.len(), 5);
        assert!(p1.samples.iter().all(|s| s.category_label == "Content"));
        assert!(p2.samples.iter().all(|s| s.category_label == "Content"));

        // tail page: 2 content rows then header before sidebar
        assert_eq!(p3.samples.len(), 4);
        let labels: Vec<&str> = p3.samples.iter().map(|s| s.category_label).collect();
        assert_eq!(labels, vec!["Content", "Content", "Header", "Sidebar"]);
        assert_eq!(p3.total_count, Some(14));
    }

    // Scenario B: a feed with zero placements is an empty page, not an
    // error.
    #[tokio::test]
    async fn scenario_b_zero_placements_is_empty_page() {
        let r = reconciler(Arc::new(MemoryIndex::new(Vec::new())), vec![feed_def(2, "F2")]);
        let page = r.list_feed_placements(2, 1, None).await.unwrap();
        assert_eq!(page.total_count, Some(0));
        assert!(page.samples.is_empty());
    }

    // P3: concatenating the content rows of pages 1..ceil(k/N) yields all
    // k content placements, no duplicates, no omissions.
    #[tokio::test]
    async fn pagination_is_complete_and_duplicate_free() {
        let k = 12;
        let r = reconciler(Arc::new(MemoryIndex::new(content_rows(1, k))), vec![feed_def(1, "F1")]);

        let mut seen = Vec::new();
        for page in 1..=3 {
            let out = r.list_feed_placements(1, page, None).await.unwrap();
            for s in out.samples.iter().filter(|s| s.category_label == "Content") {
                seen.push(s.link.clone());
            }
        }
        assert_eq!(seen.len(), k as usize);
        let mut dedup = seen.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), seen.len());
    }

    // P4: across the pages the UI requests (1..=ceil(k/N)), backfill rows
    // appear on exactly one page, the last content page.
    #[tokio::test]
    async fn backfill_appears_exactly_once() {
        let mut rows = content_rows(1, 7);
        rows.push(placement(30, Some(1), Some(Category::Footer), 300));
        let r = reconciler(Arc::new(MemoryIndex::new(rows)), vec![feed_def(1, "F1")]);

        let mut footer_pages = Vec::new();
        for page in 1..=2 {
            let out = r.list_feed_placements(1, page, None).await.unwrap();
            if out.samples.iter().any(|s| s.category_label == "Footer") {
                footer_pages.push(page);
            }
        }
        assert_eq!(footer_pages, vec![2]);
    }

    // P4, zero-content case: backfill shows on page 1.
    #[tokio::test]
    async fn backfill_on_page_one_without_content_rows() {
        let rows = vec![placement(1, Some(1), Some(Category::Sidebar), 50)];
        let r = reconciler(Arc::new(MemoryIndex::new(rows)), vec![feed_def(1, "F1")]);
        let out = r.list_feed_placements(1, 1, None).await.unwrap();
        assert_eq!(out.samples.len(), 1);
        assert_eq!(out.samples[0].category_label, "Sidebar");
    }

    // P5: rows whose category tag never made it into the store are still
    // reachable through the relaxed first-page query.
    #[tokio::test]
    async fn relaxed_query_recovers_untagged_rows() {
        let rows = vec![
            placement(1, Some(1), None, 10),
            placement(2, Some(1), None, 11),
        ];
        let r = reconciler(Arc::new(MemoryIndex::new(rows)), vec![feed_def(1, "F1")]);
        let out = r.list_feed_placements(1, 1, None).await.unwrap();
        assert_eq!(out.samples.len(), 2);
        assert!(out.samples.iter().all(|s| s.category_label == "Unknown"));
        assert_eq!(out.total_count, Some(2));
    }

    // Merged samples never exceed the page size even when backfill is
    // plentiful; the count still reflects everything.
    #[tokio::test]
    async fn samples_are_capped_at_page_size() {
        let mut rows = content_rows(1, 2);
        for i in 0..6 {
            rows.push(placement(40 + i, Some(1), Some(Category::Sidebar), 400 + i));
        }
        let r = reconciler(Arc::new(MemoryIndex::new(rows)), vec![feed_def(1, "F1")]);
        let out = r.list_feed_placements(1, 1, None).await.unwrap();
        assert_eq!(out.samples.len(), 5);
        assert_eq!(out.total_count, Some(8));
    }

    // P2: whatever the category mix, rows surfaced by the primary query
    // and rows surfaced by the backfill query never share a page_ref.
    #[tokio::test]
    async fn primary_and_backfill_rows_stay_disjoint() {
        // small LCG so the mix is reproducible
        let mut seed: u64 = 0x9e3779b9;
        let mut rows = Vec::new();
        for i in 0..50 {
            seed = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let cat = match (seed >> 33) & 3 {
                0 => Category::Content,
                1 => Category::Header,
                2 => Category::Footer,
                _ => Category::Sidebar,
            };
            rows.push(placement(i, Some(1), Some(cat), 2000 + i));
        }
        let r = reconciler(Arc::new(MemoryIndex::new(rows)), vec![feed_def(1, "F1")]);

        let mut content_refs: Vec<String> = Vec::new();
        let mut backfill_refs: Vec<String> = Vec::new();
        for page in 1..=11 {
            let out = r.list_feed_placements(1, page, None).await.unwrap();
            for s in &out.samples {
                if s.category_label == "Content" {
                    content_refs.push(s.link.clone());
                } else {
                    backfill_refs.push(s.link.clone());
                }
            }
        }
        assert!(content_refs.iter().all(|l| !backfill_refs.contains(l)));
    }

    #[tokio::test]
    async fn unknown_feed_is_an_explicit_error() {
        let r = reconciler(Arc::new(MemoryIndex::new(Vec::new())), vec![feed_def(1, "F1")]);
        let err = r.list_feed_placements(99, 1, None).await.unwrap_err();
        assert!(matches!(err, Error::UnknownFeed(99)));
    }

    #[tokio::test]
    async fn store_failure_propagates_instead_of_empty_page() {
        let r = reconciler(Arc::new(DownIndex), vec![feed_def(1, "F1")]);
        let err = r.list_feed_placements(1, 1, None).await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }

    // P2 guard: a content-tagged row leaking out of the backfill query is
    // reported as index corruption.
    #[tokio::test]
    async fn category_leak_is_detected() {
        let rows = content_rows(1, 2);
        let leaky = LeakyIndex {
            inner: MemoryIndex::new(rows),
            leak: placement(99, Some(1), Some(Category::Content), 999),
        };
        let r = reconciler(Arc::new(leaky), vec![feed_def(1, "F1")]);
        let err = r.list_feed_placements(1, 1, None).await.unwrap_err();
        assert!(matches!(err, Error::CategoryOverlap { page_ref: 999 }));
    }

    // The all-feeds listing preserves catalog order under the worker pool.
    #[tokio::test]
    async fn list_all_preserves_catalog_order() {
        let mut rows = Vec::new();
        for feed in 1..=10 {
            rows.push(placement(feed, Some(feed), Some(Category::Content), 1000 + feed));
        }
        let feeds = (1..=10).map(|i| feed_def(i, &format!("feed-{}", i))).collect();
        let r = reconciler(Arc::new(MemoryIndex::new(rows)), feeds);

        let out = r.list_all_feeds(1).await.unwrap();
        let ids: Vec<i64> = out.iter().map(|f| f.feed_id).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<i64>>());
        assert!(out.iter().all(|f| f.page.total_count == Some(1)));
    }

    // One unreachable feed fails the whole listing; the admin must never
    // see a list shorter than the catalog.
    #[tokio::test]
    async fn one_failing_feed_aborts_the_whole_listing() {
        let mut rows = Vec::new();
        for feed in 1..=10 {
            rows.push(placement(feed, Some(feed), Some(Category::Content), 1000 + feed));
        }
        let index = PartialDownIndex { inner: MemoryIndex::new(rows), bad_feed: 5 };
        let feeds = (1..=10).map(|i| feed_def(i, &format!("feed-{}", i))).collect();
        let r = reconciler(Arc::new(index), feeds);

        let err = r.list_all_feeds(1).await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn descriptors_carry_link_title_and_directive() {
        let rows = vec![placement(1, Some(3), Some(Category::Content), 77)];
        let r = reconciler(Arc::new(MemoryIndex::new(rows)), vec![feed_def(3, "F3")]);
        let out = r.list_feed_placements(3, 1, None).await.unwrap();
        let s = &out.samples[0];
        assert_eq!(s.link, "https://example.org/?p=77");
        assert_eq!(s.page_title, "Page 77");
        assert_eq!(s.directive, r#"[feed feed="3"]"#);
    }
}
