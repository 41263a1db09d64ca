use async_trait::async_trait;
use sqlx::{PgPool, Row};
use sqlx::postgres::PgRow;

use crate::attrs::AttributeMap;
use crate::error::Result;

use super::{Category, OwnerKey, PageRequest, Placement, PlacementIndex};

/// Postgres-backed placement index. Rows are ordered by `placement_id`
/// (insertion order), which keeps pagination stable within a request.
pub struct PgPlacementIndex {
    pool: PgPool,
}

impl PgPlacementIndex {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_unkeyed(&self, categories: Option<&[Category]>) -> Result<Vec<Placement>> {
        let rows = sqlx::query(
            r#"
            SELECT placement_id, feed_id, category, page_ref, attributes
            FROM fp.placement
            WHERE feed_id IS NULL
              AND ($1::text[] IS NULL OR category = ANY($1))
            ORDER BY placement_id
            "#,
        )
        .bind(category_params(categories))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(decode_row).collect())
    }
}

#[async_trait]
impl PlacementIndex for PgPlacementIndex {
    async fn query_by_owner(
        &self,
        owner: &OwnerKey,
        categories: Option<&[Category]>,
        page: Option<PageRequest>,
    ) -> Result<Vec<Placement>> {
        match owner {
            OwnerKey::Feed(feed_id) => {
                let rows = match page {
                    Some(p) => {
                        sqlx::query(
                            r#"
                            SELECT placement_id, feed_id, category, page_ref, attributes
                            FROM fp.placement
                            WHERE feed_id = $1
                              AND ($2::text[] IS NULL OR category = ANY($2))
                            ORDER BY placement_id
                            LIMIT $3 OFFSET $4
                            "#,
                        )
                        .bind(*feed_id)
                        .bind(category_params(categories))
                        .bind(p.size as i64)
                        .bind(p.offset())
                        .fetch_all(&self.pool)
                        .await?
                    }
                    None => {
                        sqlx::query(
                            r#"
                            SELECT placement_id, feed_id, category, page_ref, attributes
                            FROM fp.placement
                            WHERE feed_id = $1
                              AND ($2::text[] IS NULL OR category = ANY($2))
                            ORDER BY placement_id
                            "#,
                        )
                        .bind(*feed_id)
                        .bind(category_params(categories))
                        .fetch_all(&self.pool)
                        .await?
                    }
                };
                Ok(rows.iter().map(decode_row).collect())
            }
            // Legacy owners are matched by recomputing the grouping
            // signature from the stored attributes; admin-scale row counts
            // make the in-process filter acceptable.
            OwnerKey::Legacy(signature) => {
                let rows = self.fetch_unkeyed(categories).await?;
                let matched: Vec<Placement> = rows
                    .into_iter()
                    .filter(|p| p.legacy_signature() == *signature)
                    .collect();
                Ok(paginate(matched, page))
            }
        }
    }

    async fn count_by_owner(&self, owner: &OwnerKey) -> Result<i64> {
        match owner {
            OwnerKey::Feed(feed_id) => {
                let row = sqlx::query(
                    "SELECT COUNT(*) AS total FROM fp.placement WHERE feed_id = $1",
                )
                .bind(*feed_id)
                .fetch_one(&self.pool)
                .await?;
                Ok(row.get::<i64, _>("total"))
            }
            OwnerKey::Legacy(signature) => {
                let rows = self.fetch_unkeyed(None).await?;
                Ok(rows.iter().filter(|p| p.legacy_signature() == *signature).count() as i64)
            }
        }
    }

    async fn query_by_grouping(
        &self,
        signatures: &[String],
        categories: Option<&[Category]>,
    ) -> Result<Vec<Placement>> {
        let rows = self.fetch_unkeyed(categories).await?;
        if signatures.is_empty() {
            return Ok(rows);
        }
        Ok(rows
            .into_iter()
            .filter(|p| signatures.contains(&p.legacy_signature()))
            .collect())
    }
}

fn category_params(categories: Option<&[Category]>) -> Option<Vec<String>> {
    categories.map(|set| set.iter().map(|c| c.as_str().to_string()).collect())
}

fn paginate(rows: Vec<Placement>, page: Option<PageRequest>) -> Vec<Placement> {
    let Some(p) = page else { return rows };
    rows.into_iter()
        .skip(p.offset() as usize)
        .take(p.size)
        .collect()
}

fn decode_row(row: &PgRow) -> Placement {
    let category: String = row.get("category");
    let attributes: serde_json::Value = row.get("attributes");
    Placement {
        id: row.get("placement_id"),
        feed_id: row.get("feed_id"),
        category: Category::parse(&category),
        page_ref: row.get("page_ref"),
        attributes: AttributeMap::from_json(&attributes),
    }
}
