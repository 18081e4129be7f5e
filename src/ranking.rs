//! Candidate ranking and diversity selection.
//!
//! Two stages. The ranking stage scores every candidate against the
//! listener's pattern (embarrassingly parallel, sharded with rayon) and
//! stable-sorts descending. The diversity stage then walks the ranked
//! list in three score tiers and accepts only candidates that are
//! sufficiently dissimilar from the recently accepted ones, so the final
//! list does not degenerate into twenty near-copies of the same track.

use crate::features::{Candidate, ScoredTrack, TrackId};
use crate::pattern::UserPattern;
use crate::scoring::score_track;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Maximum similarity a candidate may have to any of the last
/// [`SIMILARITY_WINDOW`] accepted tracks.
pub const DEFAULT_DIVERSITY_THRESHOLD: f64 = 0.65;

/// How many of the most recently accepted tracks a candidate is compared
/// against.
pub const SIMILARITY_WINDOW: usize = 5;

/// Tier boundaries: top is `[0.8, 1.0]`, mid is `[0.6, 0.8)`, low the rest.
const TOP_TIER_MIN: f64 = 0.8;
const MID_TIER_MIN: f64 = 0.6;

/// Per-tier share of `limit` (each rounded up independently).
const TIER_SHARES: [f64; 3] = [0.6, 0.3, 0.1];

/// Score all candidates and sort them best-first.
///
/// A candidate without a feature vector is a data condition, not an
/// error: it gets score 0 and sinks to the bottom. The sort is stable,
/// so candidates with equal scores keep their input order.
#[must_use]
pub fn rank_candidates(
    candidates: Vec<Candidate>,
    pattern: &UserPattern,
    context_boost: f64,
    recent_ids: &HashSet<TrackId>,
) -> Vec<ScoredTrack> {
    let mut scored: Vec<ScoredTrack> = candidates
        .into_par_iter()
        .map(|candidate| {
            let score = match &candidate.features {
                Some(features) => score_track(
                    features,
                    pattern,
                    context_boost,
                    recent_ids.contains(&candidate.id),
                ),
                None => {
                    log::debug!("Candidate `{}' has no features, scoring 0.", candidate.id);
                    0.0
                }
            };
            ScoredTrack {
                id: candidate.id,
                features: candidate.features,
                score: Some(score),
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score_or_zero()
            .partial_cmp(&a.score_or_zero())
            .unwrap_or(Ordering::Equal)
    });
    scored
}

/// Pick a bounded, tier-weighted, pairwise-dissimilar subset of an
/// already ranked list.
///
/// Tiers are processed top to bottom, each bounded by its own `ceil`
/// quota (0.6/0.3/0.1 of `limit`). Within a tier, candidates are taken
/// in rank order and accepted only if their maximum similarity to the
/// last [`SIMILARITY_WINDOW`] accepted tracks stays below `threshold`;
/// the very first acceptance is unconditional. Selection hard-stops at
/// `limit` total.
///
/// Two deliberate edge behaviors, pinned by tests:
/// - the independent `ceil` quotas can jointly exceed `limit`, in which
///   case earlier tiers consume headroom that later tiers never see;
/// - a tier that runs out of dissimilar candidates contributes fewer
///   tracks and its unused quota is *not* redistributed, so the output
///   may be shorter than `limit`.
#[must_use]
pub fn diverse_selection(
    ranked: &[ScoredTrack],
    limit: usize,
    threshold: f64,
) -> Vec<ScoredTrack> {
    let tiers = [
        tier_slice(ranked, TOP_TIER_MIN, f64::INFINITY),
        tier_slice(ranked, MID_TIER_MIN, TOP_TIER_MIN),
        tier_slice(ranked, f64::NEG_INFINITY, MID_TIER_MIN),
    ];

    let mut selected: Vec<ScoredTrack> = Vec::with_capacity(limit);

    for (tier, share) in tiers.into_iter().zip(TIER_SHARES) {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let quota = (share * limit as f64).ceil() as usize;
        let mut accepted_from_tier = 0;

        for candidate in tier {
            if selected.len() >= limit || accepted_from_tier >= quota {
                break;
            }
            if selected.is_empty() || max_window_similarity(candidate, &selected) < threshold {
                selected.push(candidate.clone());
                accepted_from_tier += 1;
            } else {
                log::trace!("Rejected `{}' as too similar to recent picks.", candidate.id);
            }
        }

        if selected.len() >= limit {
            break;
        }
    }

    log::debug!(
        "Diversity pass kept {} of {} ranked candidates (limit {limit}).",
        selected.len(),
        ranked.len()
    );
    selected
}

/// Tracks whose score falls in `[min, max)` (`max` exclusive, so a track
/// scoring exactly 0.8 belongs to the top tier, not mid).
fn tier_slice(ranked: &[ScoredTrack], min: f64, max: f64) -> Vec<&ScoredTrack> {
    ranked
        .iter()
        .filter(|track| {
            let score = track.score_or_zero();
            score >= min && score < max
        })
        .collect()
}

/// Highest similarity between `candidate` and the sliding window of the
/// last [`SIMILARITY_WINDOW`] accepted tracks. Tracks without features
/// cannot crowd the window: any comparison involving one is 0.
fn max_window_similarity(candidate: &ScoredTrack, selected: &[ScoredTrack]) -> f64 {
    let Some(features) = &candidate.features else {
        return 0.0;
    };
    selected
        .iter()
        .rev()
        .take(SIMILARITY_WINDOW)
        .filter_map(|accepted| accepted.features.as_ref())
        .map(|accepted| features.similarity(accepted))
        .fold(0.0, f64::max)
}
