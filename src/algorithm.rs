//! Bell-curve arrangement of enriched tracks.
//!
//! Tracks are scored from their audio features, sorted, split into Low/Mid/High
//! pools sized by a vibe pattern, and then dealt back out following that
//! pattern. Positions at the edges of the playlist take the quietest remaining
//! track of their pool, positions in the middle third take the loudest, which
//! gives the rise-then-fall energy arc.
//!
//! # Score
//!
//! ```text
//! score(track) = w_energy       * (energy / 1)
//!              + w_danceability * (danceability / 1)
//!              + w_valence      * (|valence - 0.5| / 0.5)
//! ```
//!
//! A low score is a calm, emotionally neutral track. A high score is energetic,
//! danceable and emotionally strong in either direction.

use crate::track::EnrichedTrack;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

const MAX_ENERGY: f64 = 1.0;
const MAX_DANCEABILITY: f64 = 1.0;
const MAX_VALENCE_DISTANCE: f64 = 0.5;

/// Weights of the arrangement score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrangementWeights {
    pub energy: f64,
    pub danceability: f64,
    pub valence: f64,
}

impl Default for ArrangementWeights {
    fn default() -> Self {
        Self {
            energy: 0.4,
            danceability: 0.4,
            valence: 0.2,
        }
    }
}

/// Target intensity for one playlist slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VibeLabel {
    Low,
    Mid,
    High,
}

impl fmt::Display for VibeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "Low",
            Self::Mid => "Mid",
            Self::High => "High",
        };
        f.write_str(label)
    }
}

const SHORT_PATTERN: [VibeLabel; 5] = [
    VibeLabel::Low,
    VibeLabel::Mid,
    VibeLabel::High,
    VibeLabel::Mid,
    VibeLabel::Low,
];

/// Weighted arrangement score of a single track.
#[must_use]
pub fn calculate_vibe_score(track: &EnrichedTrack, weights: &ArrangementWeights) -> f64 {
    let features = &track.features;
    let score = weights.energy * (features.energy / MAX_ENERGY)
        + weights.danceability * (features.danceability / MAX_DANCEABILITY)
        + weights.valence * ((0.5 - features.valence).abs() / MAX_VALENCE_DISTANCE);

    log::trace!("Calculated vibe score {score:.3} for `{}'", track.track.name);
    score
}

/// Builds the Low/Mid/High pattern for a playlist of `n` tracks.
///
/// The pattern always has length `n` and, for `n > 0`, starts and ends on
/// [`VibeLabel::Low`]. Five tracks get the literal `Low Mid High Mid Low`;
/// fewer tracks get that literal folded down symmetrically (`Low Mid Low`
/// for three, `Low Low` for two, and so on).
///
/// ```
/// use vibeshuffle::algorithm::{generate_playlist_vibes, VibeLabel::*};
///
/// assert_eq!(generate_playlist_vibes(5), vec![Low, Mid, High, Mid, Low]);
/// assert_eq!(generate_playlist_vibes(6), vec![Low, Mid, High, Low, High, Low]);
/// ```
#[must_use]
pub fn generate_playlist_vibes(n: usize) -> Vec<VibeLabel> {
    if n <= SHORT_PATTERN.len() {
        return fold_short_pattern(n);
    }

    #[allow(clippy::cast_precision_loss)]
    let (lower_edge, upper_edge) = (n as f64 / 4.0, 3.0 * n as f64 / 4.0);

    let mut pattern = Vec::with_capacity(n);
    pattern.push(VibeLabel::Low);
    let mut alternate = true;
    let mut placed = 1usize;

    while placed < n - 1 {
        #[allow(clippy::cast_precision_loss)]
        let position = placed as f64;

        let vibe = if position < lower_edge || position > upper_edge {
            if placed % 2 == 0 {
                VibeLabel::Low
            } else {
                VibeLabel::Mid
            }
        } else {
            let vibe = match (alternate, placed % 3 == 0) {
                (true, _) => VibeLabel::High,
                (false, true) => VibeLabel::Low,
                (false, false) => VibeLabel::Mid,
            };
            alternate = !alternate;
            vibe
        };

        pattern.push(vibe);
        placed += 1;
    }

    pattern.push(VibeLabel::Low);
    pattern
}

/// Rising half of the short literal plus its mirror image.
fn fold_short_pattern(n: usize) -> Vec<VibeLabel> {
    let rising = &SHORT_PATTERN[..(n + 1) / 2];
    let falling = SHORT_PATTERN[..n / 2].iter().rev();
    rising.iter().chain(falling).copied().collect()
}

/// Per-pool draw state. The head cursor walks up from the quietest track, the
/// tail cursor walks down from the loudest; together they hand out each track
/// exactly once.
struct Pool<'a> {
    tracks: &'a [EnrichedTrack],
    head: usize,
    tail: usize,
}

impl<'a> Pool<'a> {
    fn new(tracks: &'a [EnrichedTrack]) -> Self {
        Self {
            tracks,
            head: 0,
            tail: tracks.len(),
        }
    }

    fn take_head(&mut self) -> Option<&'a EnrichedTrack> {
        if self.head >= self.tail {
            return None;
        }
        let tracks = self.tracks;
        self.head += 1;
        Some(&tracks[self.head - 1])
    }

    fn take_tail(&mut self) -> Option<&'a EnrichedTrack> {
        if self.head >= self.tail {
            return None;
        }
        let tracks = self.tracks;
        self.tail -= 1;
        Some(&tracks[self.tail])
    }
}

/// Reorders `tracks` into a bell-curve playlist.
///
/// The result is always a permutation of the input.
///
/// ```
/// use vibeshuffle::algorithm::{create_bell_curve_playlist, ArrangementWeights};
///
/// let playlist = create_bell_curve_playlist(&[], &ArrangementWeights::default());
/// assert!(playlist.is_empty());
/// ```
#[must_use]
pub fn create_bell_curve_playlist(
    tracks: &[EnrichedTrack],
    weights: &ArrangementWeights,
) -> Vec<EnrichedTrack> {
    let sorted = sort_by_vibe_score(tracks, weights);
    let n = sorted.len();
    let pattern = generate_playlist_vibes(n);

    let count = |label| pattern.iter().filter(|&&vibe| vibe == label).count();
    let (low_count, mid_count) = (count(VibeLabel::Low), count(VibeLabel::Mid));

    let (low, rest) = sorted.split_at(low_count);
    let (mid, high) = rest.split_at(mid_count);
    let mut pools = [Pool::new(low), Pool::new(mid), Pool::new(high)];

    log::debug!(
        "Bell curve over {n} tracks: {} low, {} mid, {} high",
        low.len(),
        mid.len(),
        high.len()
    );

    let third = n / 3;
    let playlist: Vec<EnrichedTrack> = pattern
        .iter()
        .enumerate()
        .filter_map(|(i, vibe)| {
            let pool = &mut pools[*vibe as usize];
            if third < i && i < third * 2 {
                pool.take_tail()
            } else {
                pool.take_head()
            }
        })
        .cloned()
        .collect();

    debug_assert_eq!(playlist.len(), n);
    playlist
}

/// Stable ascending sort by [`calculate_vibe_score`].
#[must_use]
pub fn sort_by_vibe_score(tracks: &[EnrichedTrack], weights: &ArrangementWeights) -> Vec<EnrichedTrack> {
    let mut scored: Vec<(f64, &EnrichedTrack)> = tracks
        .iter()
        .map(|track| (calculate_vibe_score(track, weights), track))
        .collect();

    scored.sort_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    scored.into_iter().map(|(_, track)| track.clone()).collect()
}

/// Aggregate figures over a playlist.
pub mod statistics {
    use super::*;
    use std::collections::HashMap;

    /// Mean audio features, shaped the way the playlist view reads them.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AverageStats {
        pub average_tempo: f64,
        pub average_energy: f64,
        pub average_danceability: f64,
        pub average_valence: f64,
    }

    /// `None` for an empty playlist.
    #[must_use]
    pub fn average_stats(tracks: &[EnrichedTrack]) -> Option<AverageStats> {
        if tracks.is_empty() {
            return None;
        }

        #[allow(clippy::cast_precision_loss)]
        let count = tracks.len() as f64;
        let mean = |f: fn(&EnrichedTrack) -> f64| tracks.iter().map(f).sum::<f64>() / count;

        Some(AverageStats {
            average_tempo: mean(|t| t.features.tempo),
            average_energy: mean(|t| t.features.energy),
            average_danceability: mean(|t| t.features.danceability),
            average_valence: mean(|t| t.features.valence),
        })
    }

    /// Genre label used for tracks whose artist has no known genres.
    pub const UNKNOWN_GENRE: &str = "N/A";

    /// Most frequent genres, highest count first. Ties keep first-seen order.
    ///
    /// Tracks with an empty genre list count towards [`UNKNOWN_GENRE`]; tracks
    /// whose genres were never resolved are skipped.
    #[must_use]
    pub fn genre_frequencies(tracks: &[EnrichedTrack], limit: usize) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        let mut bump = |label: &str| {
            let slot = *index.entry(label.to_string()).or_insert_with(|| {
                counts.push((label.to_string(), 0));
                counts.len() - 1
            });
            counts[slot].1 += 1;
        };

        for genres in tracks.iter().filter_map(|track| track.genres.as_deref()) {
            if genres.is_empty() {
                bump(UNKNOWN_GENRE);
            }
            for genre in genres {
                bump(genre);
            }
        }

        counts.sort_by(|(_, a), (_, b)| b.cmp(a));
        counts.truncate(limit);
        counts
    }
}
