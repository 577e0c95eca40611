//! # Catalog Service Interface
//!
//! The music catalog is reached through the [`CatalogService`] trait. The
//! fetch layer only relies on the paging and batching contract described on
//! each method, so any transport can sit behind it.
//!
//! [`SnapshotCatalog`] is the bundled implementation. It serves a JSON dump of
//! a catalog from disk, which keeps the whole pipeline usable offline:
//!
//! ```json
//! {
//!   "playlists": [
//!     { "id": "road-trip", "name": "Road Trip", "tracks": [ { "id": "t1", ... }, null ] }
//!   ],
//!   "audio_features": { "t1": { "tempo": 122.0, "energy": 0.8, ... } },
//!   "artists": { "a1": ["synthpop", "new wave"] }
//! }
//! ```

use crate::track::{AudioFeatures, TrackContainer, TrackRef};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors reported by a catalog call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    /// The service asked us to slow down. `retry_after` is in seconds.
    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("catalog returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed catalog response: {0}")]
    Malformed(String),
}

/// One page of a playlist listing.
///
/// `items` is `None` when the response did not contain an item collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackPage {
    pub items: Option<Vec<TrackContainer>>,
}

impl TrackPage {
    #[must_use]
    pub fn new(items: Vec<TrackContainer>) -> Self {
        Self { items: Some(items) }
    }

    #[must_use]
    pub fn malformed() -> Self {
        Self { items: None }
    }
}

/// Genre data for one artist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistGenres {
    pub id: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// A playlist as listed in the catalog, without its tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
}

/// The calls the fetch layer makes against a music catalog.
pub trait CatalogService {
    /// Every playlist the catalog offers, in catalog order.
    ///
    /// # Errors
    ///
    /// Transport or service failures.
    fn playlists(&self) -> Result<Vec<PlaylistSummary>, CatalogError>;

    /// Up to `limit` playlist items starting at `offset`.
    ///
    /// # Errors
    ///
    /// Transport or service failures.
    fn playlist_tracks(&self, playlist_id: &str, limit: usize, offset: usize) -> Result<TrackPage, CatalogError>;

    /// Features for each ID, aligned with the input. Unknown IDs yield `None`.
    ///
    /// # Errors
    ///
    /// [`CatalogError::RateLimited`] when throttled, other variants otherwise.
    fn audio_features(&self, track_ids: &[String]) -> Result<Vec<Option<AudioFeatures>>, CatalogError>;

    /// Genre data for each artist ID, aligned with the input.
    ///
    /// # Errors
    ///
    /// [`CatalogError::RateLimited`] when throttled, other variants otherwise.
    fn artists(&self, artist_ids: &[String]) -> Result<Vec<Option<ArtistGenres>>, CatalogError>;

    /// Display name of a playlist.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] for unknown playlists.
    fn playlist_name(&self, playlist_id: &str) -> Result<String, CatalogError>;
}

/// One playlist of a snapshot, tracks included.
///
/// `null` entries in `tracks` stand for items whose track is gone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPlaylist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tracks: Vec<Option<TrackRef>>,
}

/// A catalog loaded from a JSON snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotCatalog {
    #[serde(default)]
    pub playlists: Vec<SnapshotPlaylist>,
    #[serde(default)]
    pub audio_features: HashMap<String, AudioFeatures>,
    #[serde(default)]
    pub artists: HashMap<String, Vec<String>>,
}

impl SnapshotCatalog {
    /// Reads a snapshot file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog snapshot at {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("Invalid catalog snapshot in {}", path.display()))
    }

    /// Parses a snapshot from a JSON string.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or missing required fields.
    pub fn from_json(raw: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(raw)?;
        log::debug!(
            "Loaded snapshot with {} playlists, {} feature entries, {} artists",
            catalog.playlists.len(),
            catalog.audio_features.len(),
            catalog.artists.len()
        );
        Ok(catalog)
    }

    fn playlist(&self, playlist_id: &str) -> Option<&SnapshotPlaylist> {
        self.playlists.iter().find(|playlist| playlist.id == playlist_id)
    }
}

impl CatalogService for SnapshotCatalog {
    fn playlists(&self) -> Result<Vec<PlaylistSummary>, CatalogError> {
        Ok(self
            .playlists
            .iter()
            .map(|playlist| PlaylistSummary {
                id: playlist.id.clone(),
                name: playlist.name.clone(),
            })
            .collect())
    }

    fn playlist_tracks(&self, playlist_id: &str, limit: usize, offset: usize) -> Result<TrackPage, CatalogError> {
        // Unknown playlists page as empty; the pipeline reports them as not found.
        let items = self
            .playlist(playlist_id)
            .map(|playlist| {
                playlist
                    .tracks
                    .iter()
                    .skip(offset)
                    .take(limit)
                    .map(|track| TrackContainer { track: track.clone() })
                    .collect()
            })
            .unwrap_or_default();
        Ok(TrackPage::new(items))
    }

    fn audio_features(&self, track_ids: &[String]) -> Result<Vec<Option<AudioFeatures>>, CatalogError> {
        Ok(track_ids
            .iter()
            .map(|id| self.audio_features.get(id).copied())
            .collect())
    }

    fn artists(&self, artist_ids: &[String]) -> Result<Vec<Option<ArtistGenres>>, CatalogError> {
        Ok(artist_ids
            .iter()
            .map(|id| {
                self.artists.get(id).map(|genres| ArtistGenres {
                    id: id.clone(),
                    genres: genres.clone(),
                })
            })
            .collect())
    }

    fn playlist_name(&self, playlist_id: &str) -> Result<String, CatalogError> {
        self.playlist(playlist_id)
            .map(|playlist| playlist.name.clone())
            .ok_or_else(|| CatalogError::NotFound(format!("playlist {playlist_id}")))
    }
}
