//! End-of-run displacement summary.

use serde::Serialize;

use marktrack_model::sample::LengthUnit;
use marktrack_model::series::{DisplacementSeries, DisplacementSummary, MarkerPair};

/// What the reporter has to say about a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryOutcome {
    /// The pair was never detected together.
    NoCoOccurrence,
    Displacement(DisplacementSummary),
}

impl SummaryOutcome {
    pub fn from_series(series: &DisplacementSeries) -> Self {
        match series.summary() {
            Some(summary) => SummaryOutcome::Displacement(summary),
            None => SummaryOutcome::NoCoOccurrence,
        }
    }

    pub fn summary(&self) -> Option<&DisplacementSummary> {
        match self {
            SummaryOutcome::Displacement(summary) => Some(summary),
            SummaryOutcome::NoCoOccurrence => None,
        }
    }
}

/// Notice emitted when the series is empty.
pub fn no_co_occurrence_notice(pair: MarkerPair) -> String {
    format!(
        "Markers ID {} and ID {} were never detected together in any frame.",
        pair.reference, pair.target
    )
}

/// Human-readable summary block.
pub fn render_summary_text(
    summary: &DisplacementSummary,
    pair: MarkerPair,
    unit: LengthUnit,
) -> String {
    format!(
        "Relative vertical displacement between ID {reference} and ID {target}:\n\
         \n\
         Initial time: {t0:.4} s\n\
         Initial displacement: {d0:.2} {unit}\n\
         \n\
         Final time: {t1:.4} s\n\
         Final displacement: {d1:.2} {unit}\n\
         \n\
         Net displacement: {net:.2} {unit}",
        reference = pair.reference,
        target = pair.target,
        t0 = summary.first_time_secs,
        d0 = summary.first_separation,
        t1 = summary.last_time_secs,
        d1 = summary.last_separation,
        net = summary.net,
    )
}

/// Render whichever message applies to the outcome.
pub fn render_outcome_text(outcome: &SummaryOutcome, pair: MarkerPair, unit: LengthUnit) -> String {
    match outcome {
        SummaryOutcome::Displacement(summary) => render_summary_text(summary, pair, unit),
        SummaryOutcome::NoCoOccurrence => no_co_occurrence_notice(pair),
    }
}
