use thiserror::Error;

/// Errors surfaced by the reconciliation core. Everything else (zero
/// placements, zero legacy signatures, unresolved page refs) is a valid
/// empty result, not an error.
#[derive(Error, Debug)]
pub enum Error {
    /// The placement/catalog store could not be reached or timed out.
    /// Propagated as-is; retry policy belongs to the caller.
    #[error("placement store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    /// The requested feed id does not exist in the catalog. Distinct from
    /// "feed has no placements" so the UI can tell the two apart.
    #[error("unknown feed: {0}")]
    UnknownFeed(i64),

    /// The index returned a row outside the category set it was asked for.
    /// Category disjointness between the primary and backfill queries is a
    /// precondition; a violation means the index itself is broken.
    #[error("placement index returned out-of-category row (page_ref={page_ref})")]
    CategoryOverlap { page_ref: i64 },

    /// A per-feed reconciliation task ended without producing a page
    /// (cancelled mid-flight). The whole listing fails rather than ship
    /// with that feed silently missing.
    #[error("feed reconciliation interrupted before all feeds completed")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, Error>;
