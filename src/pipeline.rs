//! End-to-end playlist processing: fetch, enrich, arrange, report.

use crate::algorithm::statistics::{self, AverageStats};
use crate::catalog::CatalogService;
use crate::config::Settings;
use crate::fetch::{CatalogFetcher, FetchError, Sleeper};
use crate::shuffle::ShuffleStrategy;
use crate::track::{self, EnrichedTrack};
use serde::{Serialize, Serializer};

/// The arranged playlist as handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistReport {
    pub name: String,
    pub tracks: Vec<EnrichedTrack>,
    /// Written as a one-element list, which is what the playlist view indexes.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_as_list")]
    pub stats: Option<AverageStats>,
    /// `[genre, count]` pairs, most frequent first.
    pub genres: Vec<(String, usize)>,
}

#[allow(clippy::ref_option)]
fn serialize_as_list<S: Serializer>(stats: &Option<AverageStats>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(stats)
}

impl PlaylistReport {
    /// Wraps arranged tracks, computing stats and the genre table as
    /// configured.
    #[must_use]
    pub fn new(name: String, tracks: Vec<EnrichedTrack>, settings: &Settings) -> Self {
        let stats = if settings.report.include_stats {
            statistics::average_stats(&tracks)
        } else {
            None
        };
        let genres = statistics::genre_frequencies(&tracks, settings.report.genre_limit);

        Self {
            name,
            tracks,
            stats,
            genres,
        }
    }
}

/// Result of processing one playlist.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaylistOutcome {
    Arranged(PlaylistReport),
    /// The catalog returned no tracks for the playlist.
    NotFound,
}

/// Options for a single run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Look up artist genres as well as audio features.
    pub resolve_genres: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { resolve_genres: true }
    }
}

/// Fetches a playlist's tracks and metadata, without arranging them.
///
/// Returns an empty list when the playlist has no tracks.
///
/// # Errors
///
/// Any fatal [`FetchError`] from the catalog.
pub fn fetch_enriched_tracks(
    fetcher: &CatalogFetcher<'_>,
    playlist_id: &str,
    options: PipelineOptions,
) -> Result<Vec<EnrichedTrack>, FetchError> {
    let containers = fetcher.fetch_all_tracks(playlist_id)?;
    if containers.is_empty() {
        return Ok(Vec::new());
    }

    let track_ids = track::track_ids(&containers);
    let features = fetcher.fetch_audio_features_with_retry(&track_ids)?;

    let genres = if options.resolve_genres {
        Some(fetcher.get_artist_to_genres(&track::artist_ids(&containers))?)
    } else {
        None
    };

    let enriched = track::join_enriched(&containers, &features, genres.as_ref());
    log::info!(
        "Enriched {} of {} playlist items from {playlist_id}",
        enriched.len(),
        containers.len()
    );
    Ok(enriched)
}

/// Runs the full pipeline for one playlist.
///
/// # Errors
///
/// Any fatal [`FetchError`], including a failed name lookup.
pub fn process_playlist(
    catalog: &dyn CatalogService,
    sleeper: &dyn Sleeper,
    playlist_id: &str,
    strategy: &dyn ShuffleStrategy,
    settings: &Settings,
    options: PipelineOptions,
) -> Result<PlaylistOutcome, FetchError> {
    let fetcher = CatalogFetcher::new(catalog, sleeper, settings.fetch);

    let enriched = fetch_enriched_tracks(&fetcher, playlist_id, options)?;
    if enriched.is_empty() {
        log::info!("No tracks found for playlist {playlist_id}");
        return Ok(PlaylistOutcome::NotFound);
    }

    let arranged = strategy.arrange(&enriched);
    log::info!("Arranged {} tracks with the {} strategy", arranged.len(), strategy.name());

    let name = catalog.playlist_name(playlist_id)?;
    Ok(PlaylistOutcome::Arranged(PlaylistReport::new(name, arranged, settings)))
}
