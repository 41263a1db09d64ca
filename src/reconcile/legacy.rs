// Legacy signature groups: placements recorded before feed definitions
// had stable ids, grouped by the deterministic attribute signature.

use std::collections::HashMap;

use tracing::{Instrument, Span};

use crate::directive::{ACCOUNT_ID_KEY, DEFAULT_FEED_TYPE, FEED_TYPE_KEY};
use crate::error::{Error, Result};
use crate::index::{OwnerKey, Placement};
use crate::telemetry::ctx::LogCtx;
use crate::telemetry::ops::legacy::{Legacy, Phase};

use super::engine::Reconciler;
use super::types::{LegacyFeedGroup, PlacementPage};

/// Shown when legacy support is on but the scanner found no trace of a
/// legacy placement; the group keeps legacy global settings reachable.
pub const UNKNOWN_LOCATION_NAME: &str = "Legacy Feed (unknown location)";

impl Reconciler {
    /// Every legacy signature group with its placement page. Empty when
    /// legacy support is disabled; exactly one synthetic group when it is
    /// enabled but no signature is discoverable.
    pub async fn list_legacy_placements(
        &self,
        page: u32,
        log: Option<&LogCtx<Legacy>>,
    ) -> Result<Vec<(LegacyFeedGroup, PlacementPage)>> {
        if !self.status.is_legacy_support_enabled().await? {
            return Ok(Vec::new());
        }

        let unkeyed = self
            .index
            .query_by_grouping(&[], None)
            .instrument(phase_span(log, &Phase::Discover))
            .await?;
        let (signatures, representatives) = distinct_signatures(&unkeyed);

        if signatures.is_empty() {
            let group = LegacyFeedGroup {
                signature: String::new(),
                display_name: UNKNOWN_LOCATION_NAME.to_string(),
                feed_type: DEFAULT_FEED_TYPE.to_string(),
            };
            let empty = PlacementPage { total_count: None, samples: Vec::new() };
            return Ok(vec![(group, empty)]);
        }

        let out = async {
            let mut out = Vec::with_capacity(signatures.len());
            for sig in &signatures {
                let group = self.legacy_group(sig, representatives[sig]).await?;
                let owner = OwnerKey::Legacy(sig.clone());
                let page_out = self.owner_page(&owner, page, None).await?;
                out.push((group, page_out));
            }
            Ok::<_, Error>(out)
        }
        .instrument(phase_span(log, &Phase::Reconcile))
        .await?;
        Ok(out)
    }

    async fn legacy_group(
        &self,
        signature: &str,
        representative: &Placement,
    ) -> Result<LegacyFeedGroup> {
        let attrs = &representative.attributes;

        let display_name = match attrs.get(ACCOUNT_ID_KEY) {
            Some(id) => self.registry.lookup_display_name(&id.render()).await?,
            None => None,
        }
        .unwrap_or_else(|| signature.to_string());

        let feed_type = match attrs.get(FEED_TYPE_KEY) {
            Some(t) if t.render() != DEFAULT_FEED_TYPE => t.render(),
            _ => DEFAULT_FEED_TYPE.to_string(),
        };

        Ok(LegacyFeedGroup {
            signature: signature.to_string(),
            display_name,
            feed_type,
        })
    }
}

/// Distinct signatures in first-seen order, with one representative
/// placement per signature for name/type resolution.
fn distinct_signatures(rows: &[Placement]) -> (Vec<String>, HashMap<String, &Placement>) {
    let mut order = Vec::new();
    let mut representatives: HashMap<String, &Placement> = HashMap::new();
    for row in rows {
        let sig = row.legacy_signature();
        if !representatives.contains_key(&sig) {
            order.push(sig.clone());
            representatives.insert(sig, row);
        }
    }
    (order, representatives)
}

// Span-or-noop; attaching with Instrument keeps the future Send.
fn phase_span(log: Option<&LogCtx<Legacy>>, phase: &Phase) -> Span {
    log.map(|ctx| ctx.span(phase)).unwrap_or_else(Span::none)
}
