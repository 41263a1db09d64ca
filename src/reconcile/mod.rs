use anyhow::Result;
use clap::{Args, Subcommand};
use sqlx::PgPool;
use std::sync::Arc;

use crate::catalog::PgCatalog;
use crate::index::pg::PgPlacementIndex;
use crate::resolve::pg::{self, PgGlobalStatus, PgLocationResolver, PgSourceRegistry};
use crate::telemetry;

pub mod engine;
pub mod legacy;
pub mod types;

#[cfg(test)]
pub mod testutil;

pub use engine::Reconciler;

use types::{FeedPlacementsList, LegacyPlacementsList, LegacyPlacementsRow, PlacementPage};

/// feedplace placements feed/all/legacy
#[derive(Args)]
pub struct PlacementsCmd {
    #[command(subcommand)]
    pub cmd: PlacementsSub,
}

#[derive(Subcommand)]
pub enum PlacementsSub {
    // placement page for one feed
    Feed {
        #[arg(long)]
        feed: i64,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    // placement pages for every cataloged feed
    All {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    // legacy signature groups
    Legacy {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

pub async fn run(pool: &PgPool, args: PlacementsCmd) -> Result<()> {
    let reconciler = build_reconciler(pool).await?;
    match args.cmd {
        PlacementsSub::Feed { feed, page } => feed_placements(&reconciler, feed, page).await?,
        PlacementsSub::All { page } => all_placements(&reconciler, page).await?,
        PlacementsSub::Legacy { page } => legacy_placements(&reconciler, page).await?,
    }
    Ok(())
}

async fn build_reconciler(pool: &PgPool) -> Result<Reconciler> {
    let base = pg::site_base_url(pool).await?;
    Ok(Reconciler::new(
        Arc::new(PgCatalog::new(pool.clone())),
        Arc::new(PgPlacementIndex::new(pool.clone())),
        Arc::new(PgLocationResolver::new(pool.clone(), base)),
        Arc::new(PgSourceRegistry::new(pool.clone())),
        Arc::new(PgGlobalStatus::new(pool.clone())),
    ))
}

async fn feed_placements(reconciler: &Reconciler, feed: i64, page: u32) -> Result<()> {
    let log = telemetry::reconcile();
    let _g = log
        .root_span_kv([("feed", feed.to_string()), ("page", page.to_string())])
        .entered();

    let out = reconciler.list_feed_placements(feed, page, Some(&log)).await?;
    print_page(&log, feed, page, &out);

    if telemetry::config::json_mode() {
        log.result(&out)?;
    }
    Ok(())
}

async fn all_placements(reconciler: &Reconciler, page: u32) -> Result<()> {
    let log = telemetry::reconcile();
    let _g = log.root_span_kv([("page", page.to_string())]).entered();

    let feeds = reconciler.list_all_feeds(page).await?;
    log.info(format!("📡 Feeds with placements (page {}):", page));
    for feed in &feeds {
        log.info(format!(
            "[{}] {}",
            feed.feed_id,
            feed.name.as_deref().unwrap_or("(unnamed)")
        ));
        print_page(&log, feed.feed_id, page, &feed.page);
    }

    if telemetry::config::json_mode() {
        let result = FeedPlacementsList { page, feeds };
        log.result(&result)?;
    }
    Ok(())
}

async fn legacy_placements(reconciler: &Reconciler, page: u32) -> Result<()> {
    let log = telemetry::legacy();
    let _g = log.root_span_kv([("page", page.to_string())]).entered();

    let groups = reconciler.list_legacy_placements(page, Some(&log)).await?;
    if groups.is_empty() {
        log.info("ℹ️  Legacy feed support is disabled");
    }
    for (group, group_page) in &groups {
        log.info(format!(
            "🕰  {} (type={}) total={}",
            group.display_name,
            group.feed_type,
            group_page
                .total_count
                .map(|t| t.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        ));
        for sample in &group_page.samples {
            log.info(format!(
                "  [{}] {} {} {}",
                sample.category_label, sample.page_title, sample.link, sample.directive
            ));
        }
    }

    if telemetry::config::json_mode() {
        let rows: Vec<LegacyPlacementsRow> = groups
            .into_iter()
            .map(|(group, group_page)| LegacyPlacementsRow { group, page: group_page })
            .collect();
        let result = LegacyPlacementsList { page, groups: rows };
        log.result(&result)?;
    }
    Ok(())
}

fn print_page(
    log: &telemetry::ctx::LogCtx<telemetry::ops::reconcile::Reconcile>,
    feed_id: i64,
    page: u32,
    out: &PlacementPage,
) {
    log.page_summary(
        feed_id,
        page,
        out.total_count.unwrap_or(0),
        out.samples.len(),
        out.samples.iter().any(|s| s.category_label != "Content"),
    );
    for sample in &out.samples {
        log.info(format!(
            "  [{}] {} {} {}",
            sample.category_label, sample.page_title, sample.link, sample.directive
        ));
    }
}
