use async_trait::async_trait;
use sqlx::{PgPool, Row};
use url::Url;

use crate::error::Result;

use super::{GlobalStatus, LocationResolver, SourceRegistry};

const BASE_URL_OPTION: &str = "site_base_url";
const LEGACY_ENABLED_OPTION: &str = "legacy_feeds_enabled";

/// Resolves page refs against `fp.page`, building permalinks from the
/// configured site base URL.
pub struct PgLocationResolver {
    pool: PgPool,
    base: Url,
}

impl PgLocationResolver {
    pub fn new(pool: PgPool, base: Url) -> Self {
        Self { pool, base }
    }

    async fn page_row(&self, page_ref: i64) -> Result<Option<(String, String)>> {
        let row = sqlx::query("SELECT slug, title FROM fp.page WHERE page_id = $1")
            .bind(page_ref)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| (r.get::<String, _>("slug"), r.get::<String, _>("title"))))
    }
}

#[async_trait]
impl LocationResolver for PgLocationResolver {
    async fn permalink(&self, page_ref: i64) -> Result<String> {
        let Some((slug, _)) = self.page_row(page_ref).await? else {
            return Ok(String::new());
        };
        Ok(self
            .base
            .join(&slug)
            .map(|u| u.to_string())
            .unwrap_or_default())
    }

    async fn title(&self, page_ref: i64) -> Result<String> {
        Ok(self
            .page_row(page_ref)
            .await?
            .map(|(_, title)| title)
            .unwrap_or_default())
    }
}

/// Account display names from `fp.source_account`.
pub struct PgSourceRegistry {
    pool: PgPool,
}

impl PgSourceRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SourceRegistry for PgSourceRegistry {
    async fn lookup_display_name(&self, identifier: &str) -> Result<Option<String>> {
        let row = sqlx::query(
            "SELECT display_name FROM fp.source_account WHERE account_id = $1",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get::<String, _>("display_name")))
    }
}

/// Global flags read from the `fp.app_option` key/value table.
pub struct PgGlobalStatus {
    pool: PgPool,
}

impl PgGlobalStatus {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GlobalStatus for PgGlobalStatus {
    async fn is_legacy_support_enabled(&self) -> Result<bool> {
        let value = read_option(&self.pool, LEGACY_ENABLED_OPTION).await?;
        Ok(matches!(value.as_deref(), Some("true") | Some("1")))
    }
}

pub async fn read_option(pool: &PgPool, key: &str) -> Result<Option<String>> {
    let row = sqlx::query("SELECT value FROM fp.app_option WHERE key = $1")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.get::<String, _>("value")))
}

/// Site base for permalink construction, with a localhost fallback so a
/// fresh install still renders links.
pub async fn site_base_url(pool: &PgPool) -> Result<Url> {
    let stored = read_option(pool, BASE_URL_OPTION).await?;
    let base = stored
        .and_then(|s| Url::parse(&s).ok())
        .unwrap_or_else(|| Url::parse("http://localhost/").expect("static url"));
    Ok(base)
}
