//! Song classification into bangers, slow, happy and neutral buckets.
//!
//! Every track lands in exactly one bucket. The checks run in a fixed order
//! and the first match wins:
//!
//! 1. banger: tempo, energy, danceability, loudness and valence all strictly
//!    above their thresholds
//! 2. slow: energy and valence both strictly below their thresholds
//! 3. happy: valence strictly above the happy threshold
//! 4. neutral: everything else

use crate::track::{AudioFeatures, EnrichedTrack};
use serde::{Deserialize, Serialize};

/// Thresholds for the four-way split. All comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    pub banger_tempo: f64,
    pub banger_energy: f64,
    pub banger_danceability: f64,
    pub banger_loudness: f64,
    pub banger_valence: f64,
    pub slow_energy: f64,
    pub slow_valence: f64,
    pub happy_valence: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            banger_tempo: 100.0,
            banger_energy: 0.7,
            banger_danceability: 0.7,
            banger_loudness: -5.0,
            banger_valence: 0.7,
            slow_energy: 0.3,
            slow_valence: 0.3,
            happy_valence: 0.7,
        }
    }
}

/// Bucket a track was assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Banger,
    Slow,
    Happy,
    Neutral,
}

impl ClassifierThresholds {
    #[must_use]
    pub fn is_banger(&self, features: &AudioFeatures) -> bool {
        features.tempo > self.banger_tempo
            && features.energy > self.banger_energy
            && features.danceability > self.banger_danceability
            && features.loudness > self.banger_loudness
            && features.valence > self.banger_valence
    }

    #[must_use]
    pub fn classify(&self, features: &AudioFeatures) -> Category {
        if self.is_banger(features) {
            Category::Banger
        } else if features.energy < self.slow_energy && features.valence < self.slow_valence {
            Category::Slow
        } else if features.valence > self.happy_valence {
            Category::Happy
        } else {
            Category::Neutral
        }
    }
}

/// Banger check against the default thresholds.
///
/// ```
/// use vibeshuffle::classify::is_banger;
///
/// assert!(!is_banger(100.0, 0.71, 0.71, -4.9, 0.71));
/// assert!(is_banger(100.1, 0.71, 0.71, -4.9, 0.71));
/// ```
#[must_use]
pub fn is_banger(tempo: f64, energy: f64, danceability: f64, loudness: f64, valence: f64) -> bool {
    ClassifierThresholds::default().is_banger(&AudioFeatures {
        tempo,
        energy,
        danceability,
        loudness,
        valence,
    })
}

/// The four buckets, each in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Categories {
    pub bangers: Vec<EnrichedTrack>,
    pub slow: Vec<EnrichedTrack>,
    pub happy: Vec<EnrichedTrack>,
    pub neutral: Vec<EnrichedTrack>,
}

impl Categories {
    /// Total number of tracks across all four buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bangers.len() + self.slow.len() + self.happy.len() + self.neutral.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buckets in interleave order: bangers, slow, happy, neutral.
    #[must_use]
    pub fn into_buckets(self) -> [Vec<EnrichedTrack>; 4] {
        [self.bangers, self.slow, self.happy, self.neutral]
    }
}

/// Splits `tracks` into the four buckets.
///
/// Each track is cloned into exactly one bucket, and every bucket keeps the
/// input order.
///
/// # Examples
///
/// ```
/// use vibeshuffle::classify::{categorize_songs, ClassifierThresholds};
/// use vibeshuffle::track::{AudioFeatures, EnrichedTrack, TrackRef};
///
/// let track = |id: &str, tempo, energy, valence| {
///     let track = TrackRef {
///         id: id.to_string(),
///         name: id.to_string(),
///         artist: "Artist".to_string(),
///         artist_id: "a1".to_string(),
///         album: "Album".to_string(),
///         image_url: None,
///         duration_ms: 200_000,
///         popularity: 50,
///     };
///     let features = AudioFeatures { tempo, energy, danceability: 0.8, loudness: -4.0, valence };
///     EnrichedTrack::new(track, features)
/// };
///
/// let tracks = vec![track("loud", 128.0, 0.9, 0.9), track("quiet", 70.0, 0.1, 0.1), track("sunny", 95.0, 0.5, 0.8)];
/// let categories = categorize_songs(&tracks, &ClassifierThresholds::default());
///
/// assert_eq!(categories.bangers[0].id(), "loud");
/// assert_eq!(categories.slow[0].id(), "quiet");
/// assert_eq!(categories.happy[0].id(), "sunny");
/// assert!(categories.neutral.is_empty());
/// ```
#[must_use]
pub fn categorize_songs(tracks: &[EnrichedTrack], thresholds: &ClassifierThresholds) -> Categories {
    let mut categories = Categories::default();

    for track in tracks {
        let bucket = match thresholds.classify(&track.features) {
            Category::Banger => &mut categories.bangers,
            Category::Slow => &mut categories.slow,
            Category::Happy => &mut categories.happy,
            Category::Neutral => &mut categories.neutral,
        };
        bucket.push(track.clone());
    }

    log::debug!(
        "Categorized {} tracks: {} bangers, {} slow, {} happy, {} neutral",
        tracks.len(),
        categories.bangers.len(),
        categories.slow.len(),
        categories.happy.len(),
        categories.neutral.len()
    );

    categories
}
