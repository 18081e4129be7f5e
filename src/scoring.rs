//! Track scoring against a listener's pattern.
//!
//! Produces a single match score in `[0, 1]` for one candidate track.
//! The weighting scheme is part of the external contract, not a tuning
//! detail: collaborators (and the `explain` diagnostic output) rely on
//! the exact formulas below.
//!
//! ## Score composition
//!
//! ```text
//! score = energy·w_e + valence·w_v + danceability·w_d
//!       + tempo·0.12 + acoustic·0.08 + mood·0.10
//! ```
//!
//! where `w_e = w_v = 0.25 + 0.05·pattern_strength` and `w_d = 0.20`.
//! Energy, valence and danceability use a Gaussian match against the
//! listener's mean/stddev; tempo uses a tolerance band; acoustics and
//! mood are fixed heuristics. A context boost multiplies the total by
//! `1 + boost·0.3`, a recently-played track is halved, and the result is
//! clamped back to `[0, 1]`.

use crate::features::{FeatureVector, Mode, TrackId};
use crate::pattern::UserPattern;
use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;
use std::fmt;

/// Below this stddev the Gaussian match is considered degenerate and
/// [`EFFECTIVE_STD_DEV_FLOOR`] is used instead. A near-constant history
/// would otherwise score everything but exact matches at ~0.
pub const STD_DEV_FLOOR_TRIGGER: f64 = 0.05;
pub const EFFECTIVE_STD_DEV_FLOOR: f64 = 0.1;

/// Multiplier applied per unit of context boost.
const CONTEXT_BOOST_FACTOR: f64 = 0.3;

/// Recently played tracks keep half their score.
const RECENCY_PENALTY: f64 = 0.5;

/// Feature weights, adapted to how consistent the listener's taste is.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScoringWeights {
    pub energy: f64,
    pub valence: f64,
    pub danceability: f64,
    pub tempo: f64,
    pub acoustic: f64,
    pub mood: f64,
}

impl ScoringWeights {
    /// Weights for a given pattern strength.
    ///
    /// Energy and valence gain up to 0.05 each as the pattern gets more
    /// consistent; at maximum strength the six weights sum to exactly 1.
    #[must_use]
    pub fn adaptive(pattern_strength: f64) -> Self {
        Self {
            energy: 0.25 + 0.05 * pattern_strength,
            valence: 0.25 + 0.05 * pattern_strength,
            danceability: 0.20,
            tempo: 0.12,
            acoustic: 0.08,
            mood: 0.10,
        }
    }
}

/// Gaussian match of a track value against the listener's mean/stddev.
///
/// `exp(−z²/2)` with `z = |value − mean| / effective_stddev`. Exactly 1.0
/// when the value hits the mean, monotonically decaying with distance.
#[must_use]
pub fn feature_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    let effective_std_dev = if std_dev >= STD_DEV_FLOOR_TRIGGER {
        std_dev
    } else {
        EFFECTIVE_STD_DEV_FLOOR
    };
    let z = (value - mean).abs() / effective_std_dev;
    (-z * z / 2.0).exp()
}

/// Tempo match within a tolerance band derived from the listener's
/// tempo spread. The BPM difference is normalized by 100 and compared to
/// twice the (already /200-normalized) tempo stddev, floored at 0.2.
#[must_use]
pub fn tempo_score(track_tempo: f64, avg_tempo: f64, tempo_std_dev: f64) -> f64 {
    let normalized_diff = ((track_tempo - avg_tempo).abs() / 100.0).clamp(0.0, 1.0);
    let tolerance = if tempo_std_dev >= 0.1 {
        tempo_std_dev * 2.0
    } else {
        0.2
    };
    (1.0 - normalized_diff / tolerance).clamp(0.0, 1.0)
}

/// Acoustic fit heuristic: high-energy listeners are assumed to want
/// mostly electric material (target 0.3), everyone else a balanced mix
/// (target 0.5). Not derived from the pattern's acoustic history.
#[must_use]
pub fn acoustic_score(acousticness: f64, avg_energy: f64) -> f64 {
    let target = if avg_energy > 0.7 { 0.3 } else { 0.5 };
    1.0 - (acousticness - target).abs()
}

/// Mood compatibility from basic music theory: major keys read brighter
/// the higher the track's valence, minor keys fit better the lower it is.
#[must_use]
pub fn mood_score(mode: Mode, valence: f64) -> f64 {
    match mode {
        Mode::Major => 0.5 + 0.5 * valence,
        Mode::Minor => 0.5 + 0.5 * (1.0 - valence),
    }
}

/// Score one candidate against the listener's pattern.
///
/// `context_boost` is a non-negative boost derived by the caller (see
/// [`context_boost`]); `recently_played` halves the final score. The
/// result is always in `[0, 1]`.
#[must_use]
pub fn score_track(
    features: &FeatureVector,
    pattern: &UserPattern,
    context_boost: f64,
    recently_played: bool,
) -> f64 {
    let weights = ScoringWeights::adaptive(pattern.pattern_strength());

    let energy = feature_score(features.energy, pattern.avg_energy, pattern.energy_std_dev);
    let valence = feature_score(features.valence, pattern.avg_valence, pattern.valence_std_dev);
    let danceability = feature_score(
        features.danceability,
        pattern.avg_danceability,
        pattern.danceability_std_dev,
    );
    let tempo = tempo_score(features.tempo, pattern.avg_tempo, pattern.tempo_std_dev);
    let acoustic = acoustic_score(features.acousticness, pattern.avg_energy);
    let mood = mood_score(features.mode, features.valence);

    let mut total = energy * weights.energy
        + valence * weights.valence
        + danceability * weights.danceability
        + tempo * weights.tempo
        + acoustic * weights.acoustic
        + mood * weights.mood;

    if context_boost > 0.0 {
        total *= 1.0 + context_boost * CONTEXT_BOOST_FACTOR;
    }
    if recently_played {
        total *= RECENCY_PENALTY;
    }

    let total = total.clamp(0.0, 1.0);
    log::trace!("Scored track at {total:.3} (boost {context_boost:.2}, recent: {recently_played})");
    total
}

/// Context boost for the current moment.
///
/// Uses the pattern's learned time-of-day preference for the current
/// four-hour bucket when one exists. Otherwise falls back to a fixed
/// daypart heuristic: mornings boost energetic listeners, evenings boost
/// positive ones, nights boost calm ones, and daytime gets a flat 0.1.
#[must_use]
pub fn context_boost(pattern: &UserPattern, now: DateTime<Utc>) -> f64 {
    let hour = now.hour();
    let bucket = (hour / 4) as u8;

    if let Some(prefs) = &pattern.time_of_day_preferences {
        if let Some(&weight) = prefs.get(&bucket) {
            log::trace!("Context boost {weight:.3} from learned bucket {bucket}.");
            return weight;
        }
    }

    match hour {
        6..=9 => {
            if pattern.avg_energy > 0.6 {
                0.2
            } else {
                0.0
            }
        }
        10..=17 => 0.1,
        18..=21 => {
            if pattern.avg_valence > 0.5 {
                0.15
            } else {
                0.0
            }
        }
        _ => {
            if pattern.avg_energy < 0.4 {
                0.2
            } else {
                0.0
            }
        }
    }
}

/// One line of an [`explain`] report.
#[derive(Debug, Clone, Serialize)]
pub struct MatchComponent {
    pub name: &'static str,
    /// Raw sub-score in `[0, 1]`.
    pub score: f64,
    /// Weight applied to this component in the total.
    pub weight: f64,
}

impl MatchComponent {
    /// Weighted contribution to the total score.
    #[must_use]
    pub fn contribution(&self) -> f64 {
        self.score * self.weight
    }
}

/// Per-feature breakdown of how a candidate matched a pattern.
///
/// Diagnostic/transparency output only; nothing in the pipeline makes
/// control-flow decisions based on it.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub track_id: TrackId,
    pub pattern_strength: f64,
    pub components: Vec<MatchComponent>,
}

impl MatchReport {
    /// Sum of the weighted contributions (the pre-boost, pre-penalty
    /// score of [`score_track`]).
    #[must_use]
    pub fn base_score(&self) -> f64 {
        self.components.iter().map(MatchComponent::contribution).sum()
    }
}

impl fmt::Display for MatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Match breakdown for `{}':", self.track_id)?;
        writeln!(f, "  pattern strength: {:.1}%", self.pattern_strength * 100.0)?;
        for component in &self.components {
            writeln!(
                f,
                "  {:<13} {:>5.1}% match  (weight {:.2}, contributes {:.3})",
                component.name,
                component.score * 100.0,
                component.weight,
                component.contribution()
            )?;
        }
        write!(f, "  base score: {:.3}", self.base_score())
    }
}

/// Explain how one candidate's features line up with the pattern.
#[must_use]
pub fn explain(track_id: &str, features: &FeatureVector, pattern: &UserPattern) -> MatchReport {
    let weights = ScoringWeights::adaptive(pattern.pattern_strength());

    let components = vec![
        MatchComponent {
            name: "energy",
            score: feature_score(features.energy, pattern.avg_energy, pattern.energy_std_dev),
            weight: weights.energy,
        },
        MatchComponent {
            name: "valence",
            score: feature_score(features.valence, pattern.avg_valence, pattern.valence_std_dev),
            weight: weights.valence,
        },
        MatchComponent {
            name: "danceability",
            score: feature_score(
                features.danceability,
                pattern.avg_danceability,
                pattern.danceability_std_dev,
            ),
            weight: weights.danceability,
        },
        MatchComponent {
            name: "tempo",
            score: tempo_score(features.tempo, pattern.avg_tempo, pattern.tempo_std_dev),
            weight: weights.tempo,
        },
        MatchComponent {
            name: "acoustics",
            score: acoustic_score(features.acousticness, pattern.avg_energy),
            weight: weights.acoustic,
        },
        MatchComponent {
            name: "mood",
            score: mood_score(features.mode, features.valence),
            weight: weights.mood,
        },
    ];

    MatchReport {
        track_id: track_id.to_string(),
        pattern_strength: pattern.pattern_strength(),
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::vector;
    use crate::pattern::UserPattern;
    use chrono::TimeZone;

    fn pattern_with(avg_energy: f64, avg_valence: f64, std_dev: f64) -> UserPattern {
        UserPattern {
            avg_energy,
            avg_valence,
            avg_danceability: 0.75,
            avg_tempo: 120.0,
            energy_std_dev: std_dev,
            valence_std_dev: std_dev,
            danceability_std_dev: std_dev,
            tempo_std_dev: std_dev,
            total_tracks_analyzed: 20,
            last_updated: Utc::now(),
            time_of_day_preferences: None,
        }
    }

    #[test]
    fn feature_score_is_perfect_at_the_mean() {
        for std_dev in [0.01, 0.05, 0.1, 0.5, 2.0] {
            assert_eq!(feature_score(0.42, 0.42, std_dev), 1.0);
        }
    }

    #[test]
    fn feature_score_decays_with_distance() {
        let near = feature_score(0.55, 0.5, 0.1);
        let far = feature_score(0.9, 0.5, 0.1);
        assert!(near > far);
        assert!(far > 0.0);
    }

    #[test]
    fn feature_score_floors_degenerate_std_dev() {
        // Zero spread must not make every non-exact value score ~0.
        let with_zero = feature_score(0.55, 0.5, 0.0);
        let with_floor = feature_score(0.55, 0.5, EFFECTIVE_STD_DEV_FLOOR);
        assert_eq!(with_zero, with_floor);
        assert!(with_zero > 0.8);
    }

    #[test]
    fn tempo_score_is_perfect_at_average_and_zero_far_away() {
        assert_eq!(tempo_score(120.0, 120.0, 0.1), 1.0);
        assert_eq!(tempo_score(220.0, 120.0, 0.1), 0.0);
    }

    #[test]
    fn tempo_tolerance_floor_applies_to_tight_listeners() {
        // stddev below 0.1 uses tolerance 0.2: a 10 BPM miss scores 0.5.
        let score = tempo_score(130.0, 120.0, 0.0);
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn acoustic_target_depends_on_energy() {
        // Calm listener, balanced target 0.5.
        assert!((acoustic_score(0.5, 0.4) - 1.0).abs() < 1e-9);
        // Energetic listener, electric target 0.3.
        assert!((acoustic_score(0.3, 0.8) - 1.0).abs() < 1e-9);
        assert!(acoustic_score(0.9, 0.8) < acoustic_score(0.3, 0.8));
    }

    #[test]
    fn mood_score_matches_mode_to_valence() {
        assert!((mood_score(Mode::Major, 0.7) - 0.85).abs() < 1e-9);
        assert!((mood_score(Mode::Minor, 0.7) - 0.65).abs() < 1e-9);
        assert!((mood_score(Mode::Minor, 0.1) - 0.95).abs() < 1e-9);
    }

    #[test]
    fn adaptive_weights_sum_to_one_at_full_strength() {
        let w = ScoringWeights::adaptive(1.0);
        let sum = w.energy + w.valence + w.danceability + w.tempo + w.acoustic + w.mood;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn score_stays_in_unit_interval() {
        let pattern = pattern_with(0.8, 0.7, 0.1);
        let track = vector();
        for boost in [0.0, 0.5, 1.0, 5.0] {
            for recent in [false, true] {
                let score = score_track(&track, &pattern, boost, recent);
                assert!((0.0..=1.0).contains(&score), "score {score} out of range");
            }
        }
    }

    #[test]
    fn perfect_match_scores_close_to_one() {
        // Candidate sits exactly on every mean: every sub-score is at or
        // near its maximum, so the total lands at the top of the range.
        // The final clamp keeps it from ever exceeding 1.0.
        let pattern = pattern_with(0.8, 0.7, 0.1);
        let track = crate::features::FeatureVector {
            energy: 0.8,
            valence: 0.7,
            danceability: 0.75,
            tempo: 120.0,
            acousticness: 0.3,
            mode: Mode::Major,
            ..vector()
        };
        let score = score_track(&track, &pattern, 0.0, false);
        assert!(score > 0.9, "near-perfect match scored only {score}");
        assert!(score <= 1.0, "score must never exceed 1.0");
    }

    #[test]
    fn recency_penalty_halves_the_score() {
        let pattern = pattern_with(0.6, 0.5, 0.15);
        let track = vector();
        let fresh = score_track(&track, &pattern, 0.0, false);
        let recent = score_track(&track, &pattern, 0.0, true);
        assert!((recent - fresh * 0.5).abs() < 1e-12);
    }

    #[test]
    fn context_boost_raises_the_score() {
        let pattern = pattern_with(0.6, 0.5, 0.15);
        let track = vector();
        let plain = score_track(&track, &pattern, 0.0, false);
        let boosted = score_track(&track, &pattern, 0.5, false);
        assert!(boosted > plain);
        assert!((boosted - (plain * 1.15).min(1.0)).abs() < 1e-12);
    }

    #[test]
    fn context_boost_prefers_learned_buckets() {
        let mut pattern = pattern_with(0.9, 0.9, 0.1);
        let mut prefs = std::collections::BTreeMap::new();
        prefs.insert(3u8, 0.65);
        pattern.time_of_day_preferences = Some(prefs);

        // 13:00 falls in bucket 3, which the pattern has learned.
        let now = Utc.with_ymd_and_hms(2024, 3, 14, 13, 0, 0).unwrap();
        assert!((context_boost(&pattern, now) - 0.65).abs() < 1e-9);

        // 07:00 falls in bucket 1, which it has not: default morning
        // heuristic for an energetic listener.
        let morning = Utc.with_ymd_and_hms(2024, 3, 14, 7, 0, 0).unwrap();
        assert!((context_boost(&pattern, morning) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn default_heuristic_covers_all_dayparts() {
        let calm = pattern_with(0.3, 0.4, 0.1);
        let at = |hour| Utc.with_ymd_and_hms(2024, 3, 14, hour, 0, 0).unwrap();

        assert_eq!(context_boost(&calm, at(7)), 0.0); // not energetic
        assert!((context_boost(&calm, at(12)) - 0.1).abs() < 1e-9);
        assert_eq!(context_boost(&calm, at(19)), 0.0); // not positive
        assert!((context_boost(&calm, at(2)) - 0.2).abs() < 1e-9); // calm night
    }

    #[test]
    fn explain_base_score_matches_score_track() {
        let pattern = pattern_with(0.8, 0.7, 0.12);
        let track = vector();
        let report = explain("track-1", &track, &pattern);
        let score = score_track(&track, &pattern, 0.0, false);
        assert!((report.base_score() - score).abs() < 1e-12);
        assert_eq!(report.components.len(), 6);

        let rendered = report.to_string();
        assert!(rendered.contains("track-1"));
        assert!(rendered.contains("energy"));
        assert!(rendered.contains("% match"));
    }
}
