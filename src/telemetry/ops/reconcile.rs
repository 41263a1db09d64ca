use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Reconcile;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Primary, Backfill, Relax, Count, Resolve }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Primary => "primary",
            Phase::Backfill => "backfill",
            Phase::Relax => "relax",
            Phase::Count => "count",
            Phase::Resolve => "resolve",
        }
    }
    fn span(&self) -> Span {
        match self {
            Phase::Primary => info_span!("primary"),
            Phase::Backfill => info_span!("backfill"),
            Phase::Relax => info_span!("relax"),
            Phase::Count => info_span!("count"),
            Phase::Resolve => info_span!("resolve"),
        }
    }
}

impl OpMarker for Reconcile {
    const NAME: &'static str = "reconcile";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("reconcile") }
}
