//! Playlist reordering strategies.
//!
//! - [`BellCurveStrategy`]: the default; see [`crate::algorithm`]
//! - [`BalancedStrategy`]: round-robin across the classifier buckets

use crate::algorithm::{self, ArrangementWeights};
use crate::classify::{self, ClassifierThresholds};
use crate::track::EnrichedTrack;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// A way of reordering a fetched playlist.
pub trait ShuffleStrategy {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns a permutation of `tracks`.
    fn arrange(&self, tracks: &[EnrichedTrack]) -> Vec<EnrichedTrack>;
}

/// Low-high-low energy arc; see [`algorithm::create_bell_curve_playlist`].
#[derive(Debug, Clone, Default)]
pub struct BellCurveStrategy {
    weights: ArrangementWeights,
}

impl BellCurveStrategy {
    #[must_use]
    pub fn new(weights: ArrangementWeights) -> Self {
        Self { weights }
    }
}

impl ShuffleStrategy for BellCurveStrategy {
    fn name(&self) -> &'static str {
        "bell-curve"
    }

    fn arrange(&self, tracks: &[EnrichedTrack]) -> Vec<EnrichedTrack> {
        algorithm::create_bell_curve_playlist(tracks, &self.weights)
    }
}

/// Shuffles each classifier bucket, then interleaves them.
///
/// With a seed the result is reproducible; without one every call differs.
#[derive(Debug, Clone, Default)]
pub struct BalancedStrategy {
    thresholds: ClassifierThresholds,
    seed: Option<u64>,
}

impl BalancedStrategy {
    #[must_use]
    pub fn new(thresholds: ClassifierThresholds, seed: Option<u64>) -> Self {
        Self { thresholds, seed }
    }
}

impl ShuffleStrategy for BalancedStrategy {
    fn name(&self) -> &'static str {
        "balanced"
    }

    fn arrange(&self, tracks: &[EnrichedTrack]) -> Vec<EnrichedTrack> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        create_balanced_playlist(tracks, &self.thresholds, &mut rng)
    }
}

/// Categorizes, shuffles within each category, and interleaves bangers, slow,
/// happy and neutral tracks in that order.
pub fn create_balanced_playlist<R: Rng + ?Sized>(
    tracks: &[EnrichedTrack],
    thresholds: &ClassifierThresholds,
    rng: &mut R,
) -> Vec<EnrichedTrack> {
    let mut buckets = classify::categorize_songs(tracks, thresholds).into_buckets();
    for bucket in &mut buckets {
        bucket.shuffle(rng);
    }
    interleave_songs(&buckets)
}

/// Round-robin merge: one item from each non-empty category per round until
/// all are used up.
///
/// ```
/// use vibeshuffle::shuffle::interleave_songs;
///
/// let merged = interleave_songs(&[vec![1, 2, 3], vec![], vec![10], vec![20, 21]]);
/// assert_eq!(merged, vec![1, 10, 20, 2, 21, 3]);
/// ```
#[must_use]
pub fn interleave_songs<T: Clone>(categories: &[Vec<T>]) -> Vec<T> {
    let rounds = categories.iter().map(Vec::len).max().unwrap_or(0);
    let total = categories.iter().map(Vec::len).sum();

    let mut interleaved = Vec::with_capacity(total);
    for round in 0..rounds {
        interleaved.extend(categories.iter().filter_map(|category| category.get(round)).cloned());
    }
    interleaved
}
