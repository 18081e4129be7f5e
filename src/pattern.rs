//! Listening-pattern analysis.
//!
//! Reduces a listener's recent feature history into a [`UserPattern`]:
//! per-feature means and population standard deviations, plus a
//! time-of-day preference map. The pattern is recomputed in full from a
//! bounded history window on every refresh; it is never updated
//! incrementally.

use crate::features::{FeatureVector, TEMPO_SCALE};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Most-recent history entries considered per refresh. Anything older is
/// ignored so a long-lived account cannot freeze the pattern in the past.
pub const HISTORY_WINDOW: usize = 100;

/// Patterns derived from fewer entries than this are not trusted for
/// personalization; the orchestrator falls back to cold-start passthrough.
pub const RELIABILITY_THRESHOLD: usize = 10;

/// Number of four-hour time-of-day buckets (bucket = hour / 4).
pub const TIME_BUCKETS: u8 = 6;

/// One play event from the persistence layer: what was played, and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub played_at: DateTime<Utc>,
    pub features: FeatureVector,
}

/// Statistical summary of a listener's recent feature history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPattern {
    pub avg_energy: f64,
    pub avg_valence: f64,
    pub avg_danceability: f64,
    /// Mean tempo in BPM (not normalized).
    pub avg_tempo: f64,
    pub energy_std_dev: f64,
    pub valence_std_dev: f64,
    pub danceability_std_dev: f64,
    /// Population stddev of tempo, divided by 200 so it lives on roughly
    /// the same scale as the unit-interval stddevs.
    pub tempo_std_dev: f64,
    pub total_tracks_analyzed: usize,
    pub last_updated: DateTime<Utc>,
    /// Preference weight in `[0, 1]` per four-hour bucket (0 = 00:00-03:59,
    /// ..., 5 = 20:00-23:59). Only buckets with history are present.
    pub time_of_day_preferences: Option<BTreeMap<u8, f64>>,
}

impl UserPattern {
    /// Whether enough history backs this pattern to personalize with it.
    #[must_use]
    pub fn is_reliable(&self) -> bool {
        self.total_tracks_analyzed >= RELIABILITY_THRESHOLD
    }

    /// How consistent the listener's taste is: 1 minus the average of the
    /// four feature stddevs, clamped to `[0, 1]`. Near 1.0 means a
    /// near-constant history; near 0.0 means all over the map.
    #[must_use]
    pub fn pattern_strength(&self) -> f64 {
        let avg_std_dev = (self.energy_std_dev
            + self.valence_std_dev
            + self.danceability_std_dev
            + self.tempo_std_dev)
            / 4.0;
        (1.0 - avg_std_dev).clamp(0.0, 1.0)
    }
}

/// Derive a [`UserPattern`] from a listener's play history.
///
/// Only the most recent [`HISTORY_WINDOW`] entries are analyzed (the
/// input is expected newest-last; the window keeps the tail). An empty
/// history is not an error: it returns `None`, and the caller falls back
/// to cold-start behavior.
#[must_use]
pub fn analyze_pattern(history: &[HistoryEntry]) -> Option<UserPattern> {
    if history.is_empty() {
        log::debug!("Empty listening history, no pattern to derive.");
        return None;
    }

    let window = &history[history.len().saturating_sub(HISTORY_WINDOW)..];

    let energies: Vec<f64> = window.iter().map(|e| e.features.energy).collect();
    let valences: Vec<f64> = window.iter().map(|e| e.features.valence).collect();
    let dance: Vec<f64> = window.iter().map(|e| e.features.danceability).collect();
    let tempos: Vec<f64> = window.iter().map(|e| e.features.tempo).collect();

    let (avg_energy, energy_std_dev) = mean_and_std_dev(&energies);
    let (avg_valence, valence_std_dev) = mean_and_std_dev(&valences);
    let (avg_danceability, danceability_std_dev) = mean_and_std_dev(&dance);
    let (avg_tempo, tempo_std_dev_raw) = mean_and_std_dev(&tempos);

    let pattern = UserPattern {
        avg_energy,
        avg_valence,
        avg_danceability,
        avg_tempo,
        energy_std_dev,
        valence_std_dev,
        danceability_std_dev,
        tempo_std_dev: tempo_std_dev_raw / TEMPO_SCALE,
        total_tracks_analyzed: window.len(),
        last_updated: Utc::now(),
        time_of_day_preferences: Some(time_of_day_preferences(window)),
    };

    log::trace!(
        "Derived pattern from {} entries: strength {:.3}, reliable: {}",
        pattern.total_tracks_analyzed,
        pattern.pattern_strength(),
        pattern.is_reliable()
    );

    Some(pattern)
}

/// Arithmetic mean and population standard deviation.
fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Build the per-bucket preference weights.
///
/// Buckets 1-2 (morning/noon) prefer energetic and positive listening,
/// buckets 3-4 (afternoon/evening) weigh energy and valence equally, and
/// the night buckets 0 and 5 prefer calm tracks.
fn time_of_day_preferences(window: &[HistoryEntry]) -> BTreeMap<u8, f64> {
    let mut grouped: BTreeMap<u8, Vec<&FeatureVector>> = BTreeMap::new();
    for entry in window {
        let bucket = (entry.played_at.hour() / 4) as u8;
        grouped.entry(bucket).or_default().push(&entry.features);
    }

    grouped
        .into_iter()
        .map(|(bucket, features)| {
            #[allow(clippy::cast_precision_loss)]
            let n = features.len() as f64;
            let avg_energy = features.iter().map(|f| f.energy).sum::<f64>() / n;
            let avg_valence = features.iter().map(|f| f.valence).sum::<f64>() / n;

            let weight = match bucket {
                1 | 2 => 0.6 * avg_energy + 0.4 * avg_valence,
                3 | 4 => (avg_energy + avg_valence) / 2.0,
                // Night and early morning: calm listening reads as a
                // positive signal, so low energy raises the weight.
                _ => 0.6 * (1.0 - avg_energy) + 0.4 * avg_valence,
            };

            (bucket, weight.clamp(0.0, 1.0))
        })
        .collect()
}
