use anyhow::Result;
use async_trait::async_trait;
use clap::{Args, Subcommand};
use sqlx::PgPool;

use crate::index::{OwnerKey, PlacementIndex};
use crate::index::pg::PgPlacementIndex;
use crate::telemetry;
use crate::telemetry::ops::feed::Phase as FeedPhase;

mod db;
pub mod types;

use types::{FeedDefinition, FeedList, FeedListRow};

/// Read access to the feed definition catalog. `active: None` lists every
/// feed; `Some(flag)` keeps only feeds with a matching active state.
#[async_trait]
pub trait FeedCatalog: Send + Sync {
    async fn get(&self, feed_id: i64) -> crate::error::Result<Option<FeedDefinition>>;
    async fn list(&self, active: Option<bool>) -> crate::error::Result<Vec<FeedDefinition>>;
}

pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedCatalog for PgCatalog {
    async fn get(&self, feed_id: i64) -> crate::error::Result<Option<FeedDefinition>> {
        db::get_feed(&self.pool, feed_id).await
    }

    async fn list(&self, active: Option<bool>) -> crate::error::Result<Vec<FeedDefinition>> {
        db::list_feeds(&self.pool, active).await
    }
}

/// feedplace feed ls
#[derive(Args)]
pub struct FeedCmd {
    #[command(subcommand)]
    pub cmd: FeedSub,
}

#[derive(Subcommand)]
pub enum FeedSub {
    // list feed definitions with their placement totals
    Ls {
        /// Keep only feeds whose active flag matches
        #[arg(long)]
        active: Option<bool>,
    },
}

pub async fn run(pool: &PgPool, args: FeedCmd) -> Result<()> {
    let log = telemetry::feed();
    let _g = log.root_span().entered();
    match args.cmd {
        FeedSub::Ls { active } => ls_feeds(pool, active).await?,
    }
    Ok(())
}

async fn ls_feeds(pool: &PgPool, active: Option<bool>) -> Result<()> {
    let log = telemetry::feed();
    let _s = log.span(&FeedPhase::List).entered();

    let feeds = db::list_feeds(pool, active).await?;
    let index = PgPlacementIndex::new(pool.clone());

    let mut rows = Vec::with_capacity(feeds.len());
    for feed in &feeds {
        let total = index.count_by_owner(&OwnerKey::Feed(feed.id)).await?;
        rows.push(FeedListRow {
            feed_id: feed.id,
            name: feed.name.clone(),
            total_placements: total,
            active: feed.active,
            created_at: feed.created_at,
        });
    }

    log.info("📡 Feeds:");
    for row in &rows {
        log.info(format!(
            "[{}] {} placements={} active={} created_at={:?}",
            row.feed_id,
            row.name.as_deref().unwrap_or("(unnamed)"),
            row.total_placements,
            row.active,
            row.created_at
        ));
    }
    if telemetry::config::json_mode() {
        let list = FeedList { feeds: rows };
        log.result(&list)?;
    }
    Ok(())
}
