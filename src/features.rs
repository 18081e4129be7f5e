//! Audio feature data model.
//!
//! [`FeatureVector`] is the leaf data type of the whole pipeline: an
//! immutable numeric description of one track's audio character, as
//! delivered by the catalog provider. Construction goes through a
//! validation step so that out-of-range values are clamped once, at the
//! boundary, instead of being re-checked all over the scoring code.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Identifier of a track in the external catalog.
pub type TrackId = String;

/// Musical mode of a track's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Minor,
    Major,
}

impl Mode {
    /// Parse the catalog's 0/1 encoding (0 = minor, 1 = major).
    pub fn from_catalog(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(Mode::Minor),
            1 => Ok(Mode::Major),
            other => bail!("invalid mode value {other}, expected 0 (minor) or 1 (major)"),
        }
    }
}

/// Per-track audio feature record.
///
/// Unit-interval fields (`energy`, `valence`, `danceability`,
/// `acousticness`, `instrumentalness`, `liveness`, `speechiness`) are
/// guaranteed to be within `[0, 1]` after [`FeatureVector::validated`].
/// `key` and `mode` are categorical and never interpolated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub energy: f64,
    pub valence: f64,
    pub danceability: f64,
    /// Beats per minute, typically 40-220.
    pub tempo: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub speechiness: f64,
    /// Average loudness in dB, negative (typically -60..0).
    pub loudness: f64,
    /// Pitch class 0-11 (0 = C, 1 = C#/Db, ...).
    pub key: u8,
    pub mode: Mode,
    pub time_signature: u8,
    pub duration_ms: u32,
}

/// Tempo values are scaled by this constant wherever they have to live on
/// the same axis as the unit-interval features (stddev normalization,
/// similarity distance).
pub const TEMPO_SCALE: f64 = 200.0;

impl FeatureVector {
    /// Validate a freshly deserialized record.
    ///
    /// Finite but out-of-range unit-interval values are clamped to
    /// `[0, 1]`; negative tempo is clamped to 0. Non-finite numbers and
    /// invalid categorical values are integration bugs upstream and fail
    /// loudly instead of being silently defaulted.
    pub fn validated(mut self) -> Result<Self> {
        let numeric = [
            ("energy", self.energy),
            ("valence", self.valence),
            ("danceability", self.danceability),
            ("tempo", self.tempo),
            ("acousticness", self.acousticness),
            ("instrumentalness", self.instrumentalness),
            ("liveness", self.liveness),
            ("speechiness", self.speechiness),
            ("loudness", self.loudness),
        ];
        for (name, value) in numeric {
            if !value.is_finite() {
                bail!("feature `{name}` is not a finite number: {value}");
            }
        }
        if self.key > 11 {
            bail!("invalid key {}, expected pitch class 0-11", self.key);
        }

        self.energy = self.energy.clamp(0.0, 1.0);
        self.valence = self.valence.clamp(0.0, 1.0);
        self.danceability = self.danceability.clamp(0.0, 1.0);
        self.acousticness = self.acousticness.clamp(0.0, 1.0);
        self.instrumentalness = self.instrumentalness.clamp(0.0, 1.0);
        self.liveness = self.liveness.clamp(0.0, 1.0);
        self.speechiness = self.speechiness.clamp(0.0, 1.0);
        self.tempo = self.tempo.max(0.0);

        Ok(self)
    }

    /// Similarity to another vector, in `[0, 1]`.
    ///
    /// Inverse mean absolute distance over the unit-scaled audio
    /// dimensions (tempo divided by [`TEMPO_SCALE`]). Symmetric, and
    /// exactly 1.0 for identical vectors. Used by the diversity pass to
    /// reject near-duplicates.
    #[must_use]
    pub fn similarity(&self, other: &FeatureVector) -> f64 {
        let dims = [
            (self.energy, other.energy),
            (self.valence, other.valence),
            (self.danceability, other.danceability),
            (self.acousticness, other.acousticness),
            (self.instrumentalness, other.instrumentalness),
            (self.liveness, other.liveness),
            (self.speechiness, other.speechiness),
            (
                (self.tempo / TEMPO_SCALE).clamp(0.0, 1.0),
                (other.tempo / TEMPO_SCALE).clamp(0.0, 1.0),
            ),
        ];

        #[allow(clippy::cast_precision_loss)]
        let mean_distance =
            dims.iter().map(|(a, b)| (a - b).abs()).sum::<f64>() / dims.len() as f64;

        (1.0 - mean_distance).clamp(0.0, 1.0)
    }
}

/// A candidate track as delivered by the catalog provider.
///
/// `features` may be absent; the ranker treats that as "score 0", not as
/// an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: TrackId,
    #[serde(default)]
    pub features: Option<FeatureVector>,
}

/// A candidate after the scoring pass.
///
/// `score` stays `None` on the cold-start path, where candidates are
/// passed through without being scored at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredTrack {
    pub id: TrackId,
    pub features: Option<FeatureVector>,
    pub score: Option<f64>,
}

impl ScoredTrack {
    /// Effective score for ordering purposes (unscored counts as 0).
    #[must_use]
    pub fn score_or_zero(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::vector;
    use super::*;

    #[test]
    fn validation_clamps_out_of_range_unit_features() {
        let raw = FeatureVector {
            energy: 1.3,
            valence: -0.2,
            ..vector()
        };
        let validated = raw.validated().expect("finite values should validate");
        assert_eq!(validated.energy, 1.0);
        assert_eq!(validated.valence, 0.0);
    }

    #[test]
    fn validation_rejects_non_finite_values() {
        let raw = FeatureVector {
            tempo: f64::NAN,
            ..vector()
        };
        assert!(raw.validated().is_err());

        let raw = FeatureVector {
            loudness: f64::INFINITY,
            ..vector()
        };
        assert!(raw.validated().is_err());
    }

    #[test]
    fn validation_rejects_invalid_key() {
        let raw = FeatureVector { key: 12, ..vector() };
        assert!(raw.validated().is_err());
    }

    #[test]
    fn mode_parses_catalog_encoding() {
        assert_eq!(Mode::from_catalog(0).unwrap(), Mode::Minor);
        assert_eq!(Mode::from_catalog(1).unwrap(), Mode::Major);
        assert!(Mode::from_catalog(2).is_err());
    }

    #[test]
    fn similarity_is_one_for_identical_vectors() {
        let v = vector();
        assert!((v.similarity(&v) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn similarity_is_symmetric_and_bounded() {
        let a = vector();
        let b = FeatureVector {
            energy: 0.9,
            valence: 0.1,
            tempo: 180.0,
            ..vector()
        };
        let ab = a.similarity(&b);
        let ba = b.similarity(&a);
        assert_eq!(ab, ba, "similarity must be symmetric");
        assert!((0.0..=1.0).contains(&ab));
        assert!(ab < 1.0, "different vectors must not be fully similar");
    }

    #[test]
    fn similarity_decreases_with_distance() {
        let base = vector();
        let near = FeatureVector {
            energy: 0.55,
            ..vector()
        };
        let far = FeatureVector {
            energy: 1.0,
            valence: 0.0,
            danceability: 1.0,
            ..vector()
        };
        assert!(base.similarity(&near) > base.similarity(&far));
    }
}
