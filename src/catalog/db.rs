use sqlx::{PgPool, Row};
use sqlx::postgres::PgRow;

use crate::error::Result;

use super::types::FeedDefinition;

pub async fn get_feed(pool: &PgPool, feed_id: i64) -> Result<Option<FeedDefinition>> {
    let row = sqlx::query(
        r#"
        SELECT feed_id, name, settings, active, created_at
        FROM fp.feed
        WHERE feed_id = $1
        "#,
    )
    .bind(feed_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.as_ref().map(decode_feed))
}

/// `active: None` lists everything; `Some(flag)` keeps only matching feeds.
pub async fn list_feeds(pool: &PgPool, active: Option<bool>) -> Result<Vec<FeedDefinition>> {
    let rows = sqlx::query(
        r#"
        SELECT feed_id, name, settings, active, created_at
        FROM fp.feed
        WHERE ($1::bool IS NULL OR active = $1)
        ORDER BY feed_id
        "#,
    )
    .bind(active)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(decode_feed).collect())
}

fn decode_feed(row: &PgRow) -> FeedDefinition {
    FeedDefinition {
        id: row.get("feed_id"),
        name: row.get("name"),
        settings: row.get("settings"),
        active: row.get("active"),
        created_at: row.get("created_at"),
    }
}
