//! Personalized track recommendations from listening patterns.
//!
//! Core modules:
//! - [`features`] - Audio feature data model and similarity metric
//! - [`pattern`] - Listening-history analysis into a [`pattern::UserPattern`]
//! - [`scoring`] - Per-track match scoring and `explain` diagnostics
//! - [`ranking`] - Parallel ranking and diversity selection
//! - [`recommend`] - Pipeline orchestration with cold-start fallback
//!
//! ### Supporting Modules
//!
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`snapshot`] - JSON snapshot loading for the CLI boundary
//!
//! ## Quick Start Example
//!
//! ```
//! use attune::features::{Candidate, FeatureVector, Mode};
//! use attune::pattern::{analyze_pattern, HistoryEntry};
//! use attune::recommend::recommend;
//! use chrono::Utc;
//!
//! let features = FeatureVector {
//!     energy: 0.8,
//!     valence: 0.7,
//!     danceability: 0.75,
//!     tempo: 120.0,
//!     acousticness: 0.2,
//!     instrumentalness: 0.0,
//!     liveness: 0.1,
//!     speechiness: 0.05,
//!     loudness: -7.5,
//!     key: 4,
//!     mode: Mode::Major,
//!     time_signature: 4,
//!     duration_ms: 215_000,
//! };
//!
//! // Derive a pattern from a (frozen) history snapshot.
//! let history: Vec<HistoryEntry> = (0..15)
//!     .map(|_| HistoryEntry { played_at: Utc::now(), features: features.clone() })
//!     .collect();
//! let pattern = analyze_pattern(&history).expect("non-empty history");
//! assert!(pattern.is_reliable());
//!
//! // Score, rank, and diversify candidates against it.
//! let candidates = vec![Candidate { id: "track-1".into(), features: Some(features) }];
//! let picks = recommend(Some(&pattern), candidates, &[], Utc::now(), 20)?;
//! assert_eq!(picks.len(), 1);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Design Notes
//!
//! The core is a pure computation over immutable inputs: no global
//! state, no I/O, no hidden clock. The catalog API, the persistence
//! layer, playback, and authentication are external collaborators whose
//! data arrives fully fetched (the CLI represents them as JSON
//! snapshots). Given identical inputs, output is bit-for-bit
//! reproducible.
//!
//! ## Error Handling
//!
//! Data conditions are never errors: an empty history means "no
//! pattern", a candidate without features scores 0, and an unreliable
//! pattern falls back to cold-start passthrough. `anyhow::Result` is
//! reserved for integration bugs (a zero limit, malformed snapshots at
//! the boundary).

pub mod cli;
pub mod features;
pub mod pattern;
pub mod ranking;
pub mod recommend;
pub mod scoring;
pub mod snapshot;

pub use features::{Candidate, FeatureVector, Mode, ScoredTrack, TrackId};
pub use pattern::{analyze_pattern, HistoryEntry, UserPattern};
pub use recommend::recommend;
pub use scoring::{explain, MatchReport};
