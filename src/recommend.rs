//! Recommendation pipeline orchestration.
//!
//! Composes the pieces: cold-start check, context boost for the current
//! moment, scoring, ranking, diversity selection. This is the one entry
//! point collaborators call per recommendation request; everything it
//! consumes (pattern, candidates, recent plays, clock) arrives as an
//! explicit argument, so identical inputs always produce identical
//! output.

use crate::features::{Candidate, ScoredTrack, TrackId};
use crate::pattern::UserPattern;
use crate::ranking::{diverse_selection, rank_candidates, DEFAULT_DIVERSITY_THRESHOLD};
use crate::scoring::context_boost;
use anyhow::{ensure, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Default size of a recommendation response.
pub const DEFAULT_LIMIT: usize = 20;

/// Produce an ordered, diversity-filtered recommendation list.
///
/// When `pattern` is absent or backed by too little history, no scoring
/// is attempted at all: the candidates come back unmodified, in input
/// order, with no score populated (cold-start passthrough). Otherwise
/// every candidate is scored against the pattern, ranked, and the
/// diversity selector picks at most `limit` tracks.
///
/// # Errors
///
/// `limit == 0` is an integration bug in the caller, not a data
/// condition, and fails fast. Nothing else here errors: missing feature
/// vectors and empty candidate lists are ordinary data.
pub fn recommend(
    pattern: Option<&UserPattern>,
    candidates: Vec<Candidate>,
    recent_ids: &[TrackId],
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<ScoredTrack>> {
    ensure!(limit > 0, "recommendation limit must be positive, got {limit}");

    let Some(pattern) = pattern.filter(|p| p.is_reliable()) else {
        log::info!(
            "No reliable listening pattern, passing {} candidates through unscored.",
            candidates.len()
        );
        return Ok(candidates
            .into_iter()
            .map(|c| ScoredTrack {
                id: c.id,
                features: c.features,
                score: None,
            })
            .collect());
    };

    let boost = context_boost(pattern, now);
    let recent: HashSet<TrackId> = recent_ids.iter().cloned().collect();

    let ranked = rank_candidates(candidates, pattern, boost, &recent);
    let selected = diverse_selection(&ranked, limit, DEFAULT_DIVERSITY_THRESHOLD);

    log::info!(
        "Recommended {} tracks (boost {boost:.2}, {} recently played excluded from full weight).",
        selected.len(),
        recent.len()
    );
    Ok(selected)
}
