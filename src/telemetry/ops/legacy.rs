use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Legacy;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Discover, Reconcile }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Discover => "discover", Phase::Reconcile => "reconcile" } }
    fn span(&self) -> Span { match self { Phase::Discover => info_span!("discover"), Phase::Reconcile => info_span!("reconcile") } }
}

impl OpMarker for Legacy {
    const NAME: &'static str = "legacy";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("legacy") }
}
