use async_trait::async_trait;

use crate::error::Result;

pub mod pg;

/// Resolves a placement's page reference into a label and link. A page
/// that no longer exists resolves to empty strings, never an error: the
/// placement should still be listed, just without a usable link.
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn permalink(&self, page_ref: i64) -> Result<String>;
    async fn title(&self, page_ref: i64) -> Result<String>;
}

/// Display-name lookups for legacy groups, keyed by account identifier.
#[async_trait]
pub trait SourceRegistry: Send + Sync {
    async fn lookup_display_name(&self, identifier: &str) -> Result<Option<String>>;
}

/// Read-only global flags, loaded once per request.
#[async_trait]
pub trait GlobalStatus: Send + Sync {
    async fn is_legacy_support_enabled(&self) -> Result<bool>;
}
