//! Track records as they come out of the catalog, and the enriched form the
//! arrangement code works on.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// A track as listed in a playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRef {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub artist_id: String,
    pub album: String,
    /// Cover art, when the catalog has one.
    #[serde(default, rename = "album_cover", alias = "image_url")]
    pub image_url: Option<String>,
    pub duration_ms: u64,
    /// 0-100 as reported by the catalog.
    pub popularity: u8,
}

/// One playlist item. The catalog hands back `null` tracks for removed or
/// local files, so the track is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackContainer {
    pub track: Option<TrackRef>,
}

impl TrackContainer {
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.track.as_ref().map(|track| track.id.as_str())
    }
}

impl From<TrackRef> for TrackContainer {
    fn from(track: TrackRef) -> Self {
        Self { track: Some(track) }
    }
}

/// Audio analysis metrics for a single track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    /// Beats per minute.
    pub tempo: f64,
    pub energy: f64,
    pub danceability: f64,
    /// dB, usually negative.
    pub loudness: f64,
    pub valence: f64,
}

/// A track joined with its audio features and, optionally, its artist's genres.
///
/// Built once by [`join_enriched`] and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedTrack {
    #[serde(flatten)]
    pub track: TrackRef,
    #[serde(flatten)]
    pub features: AudioFeatures,
    /// Written as one comma-separated `genre` string; an empty list is
    /// written as `null`.
    #[serde(
        default,
        rename = "genre",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_genre",
        deserialize_with = "deserialize_genre"
    )]
    pub genres: Option<Vec<String>>,
}

const GENRE_SEPARATOR: &str = ", ";

#[allow(clippy::ref_option)]
fn serialize_genre<S: Serializer>(genres: &Option<Vec<String>>, serializer: S) -> Result<S::Ok, S::Error> {
    match genres.as_deref() {
        None | Some([]) => serializer.serialize_none(),
        Some(genres) => serializer.serialize_str(&genres.join(GENRE_SEPARATOR)),
    }
}

fn deserialize_genre<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
    let joined: Option<String> = Option::deserialize(deserializer)?;
    Ok(joined.map(|joined| {
        joined
            .split(GENRE_SEPARATOR)
            .filter(|genre| !genre.is_empty())
            .map(str::to_string)
            .collect()
    }))
}

impl EnrichedTrack {
    #[must_use]
    pub fn new(track: TrackRef, features: AudioFeatures) -> Self {
        Self {
            track,
            features,
            genres: None,
        }
    }

    #[must_use]
    pub fn with_genres(mut self, genres: Vec<String>) -> Self {
        self.genres = Some(genres);
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.track.id
    }
}

/// IDs of every playlist item that has a track, in playlist order.
#[must_use]
pub fn track_ids(containers: &[TrackContainer]) -> Vec<String> {
    containers
        .iter()
        .filter_map(TrackContainer::id)
        .map(str::to_string)
        .collect()
}

/// Distinct primary-artist IDs in first-seen order.
#[must_use]
pub fn artist_ids(containers: &[TrackContainer]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut ids = Vec::new();
    for track in containers.iter().filter_map(|container| container.track.as_ref()) {
        if seen.insert(track.artist_id.as_str()) {
            ids.push(track.artist_id.clone());
        }
    }
    ids
}

/// Pairs tracks with feature entries **by position**.
///
/// `features` is expected in [`track_ids`] order, so items without a track are
/// skipped before pairing: the nth track is matched with the nth feature
/// entry. Tracks whose entry is `None` are dropped. When the two lists differ
/// in length the surplus on the longer side is ignored.
///
/// Genres are attached when `genres` is given; artists absent from the map get
/// an empty list.
#[must_use]
pub fn join_enriched(
    containers: &[TrackContainer],
    features: &[Option<AudioFeatures>],
    genres: Option<&HashMap<String, Vec<String>>>,
) -> Vec<EnrichedTrack> {
    let tracks: Vec<&TrackRef> = containers.iter().filter_map(|container| container.track.as_ref()).collect();
    if tracks.len() != features.len() {
        log::warn!(
            "Track list ({}) and feature list ({}) differ in length; positional pairing may be misaligned",
            tracks.len(),
            features.len()
        );
    }

    tracks
        .into_iter()
        .zip(features)
        .filter_map(|(track, feature)| feature.map(|feature| (track, feature)))
        .map(|(track, feature)| {
            let enriched = EnrichedTrack::new(track.clone(), feature);
            match genres {
                Some(map) => {
                    let artist_genres = map.get(&track.artist_id).cloned().unwrap_or_default();
                    enriched.with_genres(artist_genres)
                }
                None => enriched,
            }
        })
        .collect()
}
