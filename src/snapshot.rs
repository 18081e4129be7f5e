//! JSON snapshot loading for the CLI boundary.
//!
//! The catalog and persistence layers are external collaborators; the
//! binary consumes their data as pre-fetched JSON files. Feature vectors
//! are validated here, once, on the way in: out-of-range values are
//! clamped and malformed records fail loudly instead of silently
//! defaulting to zeros deep inside the scoring code.

use crate::features::{Candidate, TrackId};
use crate::pattern::HistoryEntry;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Load and validate a listening-history snapshot.
///
/// Expects a JSON array of `{"played_at": <RFC 3339>, "features": {...}}`
/// entries, newest last.
pub fn load_history(path: &Path) -> Result<Vec<HistoryEntry>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read history snapshot at {}", path.display()))?;
    let entries: Vec<HistoryEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("Malformed history snapshot at {}", path.display()))?;

    let validated = entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            Ok(HistoryEntry {
                played_at: entry.played_at,
                features: entry
                    .features
                    .validated()
                    .with_context(|| format!("Invalid features in history entry {i}"))?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!("Loaded {} history entries from {}.", validated.len(), path.display());
    Ok(validated)
}

/// Load and validate a candidate snapshot.
///
/// Expects a JSON array of `{"id": ..., "features": {...} | null}`.
/// A null/absent feature vector is allowed (the ranker scores it 0);
/// a present but malformed one is not.
pub fn load_candidates(path: &Path) -> Result<Vec<Candidate>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read candidate snapshot at {}", path.display()))?;
    let candidates: Vec<Candidate> = serde_json::from_str(&raw)
        .with_context(|| format!("Malformed candidate snapshot at {}", path.display()))?;

    let validated = candidates
        .into_iter()
        .map(|candidate| {
            let features = candidate
                .features
                .map(|f| {
                    f.validated()
                        .with_context(|| format!("Invalid features for candidate `{}'", candidate.id))
                })
                .transpose()?;
            Ok(Candidate {
                id: candidate.id,
                features,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!(
        "Loaded {} candidates from {}.",
        validated.len(),
        path.display()
    );
    Ok(validated)
}

/// Load a recently-played-id snapshot (JSON array of strings).
pub fn load_recent_ids(path: &Path) -> Result<Vec<TrackId>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read recent-plays snapshot at {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Malformed recent-plays snapshot at {}", path.display()))
}
