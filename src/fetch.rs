//! # Catalog Fetch Pipeline
//!
//! Pulls a playlist and its audio metadata out of a [`CatalogService`] one
//! request at a time:
//!
//! - **Pages**: playlist items at offsets 0, 100, 200, ... until a short
//!   page. A page without an item collection ends the listing early and the
//!   items gathered so far are returned as-is.
//! - **Feature batches**: audio features for up to 100 track IDs per call,
//!   retried with exponential backoff while the catalog reports rate limits.
//! - **Artist batches**: genres per artist, same discipline as features.
//!
//! Consecutive requests are separated by a fixed pacing delay. All waits go
//! through a [`Sleeper`], so callers can observe them without blocking.
//!
//! ## Failure policy
//!
//! | Condition           | Outcome                                  |
//! |---------------------|------------------------------------------|
//! | malformed page      | listing truncated, no error              |
//! | rate limited        | wait `retry_after * 2^attempt`, retry    |
//! | attempts exhausted  | [`FetchError::MaxRetriesExceeded`]       |
//! | any other error     | [`FetchError::Catalog`], no retry        |

use crate::catalog::{CatalogError, CatalogService};
use crate::config::FetchSettings;
use crate::track::{AudioFeatures, TrackContainer};
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Most items the catalog accepts or returns per request.
pub const MAX_ITEMS_PER_REQUEST: usize = 100;

/// Fatal fetch failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("max retries exceeded after {attempts} rate-limited attempts")]
    MaxRetriesExceeded { attempts: u32 },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Blocking wait used for pacing and backoff.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Records requested waits instead of blocking.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    waits: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every wait requested so far, in order.
    #[must_use]
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.borrow().clone()
    }

    #[must_use]
    pub fn total(&self) -> Duration {
        self.waits.borrow().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.borrow_mut().push(duration);
    }
}

/// Bounded exponential backoff for rate-limited calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub default_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            default_retry_after: Duration::from_secs(1),
        }
    }
}

impl From<&FetchSettings> for RetryPolicy {
    fn from(settings: &FetchSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            default_retry_after: Duration::from_secs(settings.default_retry_after_secs),
        }
    }
}

impl RetryPolicy {
    /// Wait before the next try: `retry_after * 2^attempt`, `attempt` counting
    /// from zero.
    #[must_use]
    pub fn backoff(&self, retry_after: Option<u64>, attempt: u32) -> Duration {
        let base = retry_after.map_or(self.default_retry_after, Duration::from_secs);
        base.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Runs `call` until it succeeds, fails with a non-rate-limit error, or
    /// runs out of attempts. The backoff wait is taken after every rate-limited
    /// attempt, including the last one.
    ///
    /// # Errors
    ///
    /// [`FetchError::Catalog`] for any error other than a rate limit, and
    /// [`FetchError::MaxRetriesExceeded`] once every attempt was rate limited.
    pub fn run<T, F>(&self, sleeper: &dyn Sleeper, what: &str, mut call: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Result<T, CatalogError>,
    {
        for attempt in 0..self.max_attempts {
            match call() {
                Ok(value) => return Ok(value),
                Err(CatalogError::RateLimited { retry_after }) => {
                    let wait = self.backoff(retry_after, attempt);
                    log::warn!(
                        "Rate limited while fetching {what} (attempt {}/{}). Retrying after {:.1}s",
                        attempt + 1,
                        self.max_attempts,
                        wait.as_secs_f64()
                    );
                    sleeper.sleep(wait);
                }
                Err(other) => return Err(other.into()),
            }
        }

        log::error!("Giving up on {what} after {} rate-limited attempts", self.max_attempts);
        Err(FetchError::MaxRetriesExceeded {
            attempts: self.max_attempts,
        })
    }
}

fn request_size(setting: &str, configured: usize) -> usize {
    let size = configured.clamp(1, MAX_ITEMS_PER_REQUEST);
    if size != configured {
        log::warn!("fetch.{setting} = {configured} is outside 1..={MAX_ITEMS_PER_REQUEST}, using {size}");
    }
    size
}

/// Pulls playlists and metadata from a catalog, honouring its rate limits.
pub struct CatalogFetcher<'a> {
    catalog: &'a dyn CatalogService,
    sleeper: &'a dyn Sleeper,
    settings: FetchSettings,
    retry: RetryPolicy,
}

impl<'a> CatalogFetcher<'a> {
    /// Page and batch sizes are clamped to `1..=`[`MAX_ITEMS_PER_REQUEST`].
    #[must_use]
    pub fn new(catalog: &'a dyn CatalogService, sleeper: &'a dyn Sleeper, settings: FetchSettings) -> Self {
        let settings = FetchSettings {
            page_size: request_size("page_size", settings.page_size),
            batch_size: request_size("batch_size", settings.batch_size),
            artist_batch_size: request_size("artist_batch_size", settings.artist_batch_size),
            ..settings
        };
        Self {
            catalog,
            sleeper,
            retry: RetryPolicy::from(&settings),
            settings,
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Every item of a playlist, in playlist order.
    ///
    /// A page without an item collection stops the listing; the result may
    /// then be incomplete.
    ///
    /// # Errors
    ///
    /// Catalog errors from a page request are passed through.
    pub fn fetch_all_tracks(&self, playlist_id: &str) -> Result<Vec<TrackContainer>, FetchError> {
        let page_size = self.settings.page_size;
        let mut offset = 0;
        let mut all_tracks = Vec::new();

        loop {
            log::debug!("Fetching tracks of {playlist_id} with offset: {offset}");
            let page = self.catalog.playlist_tracks(playlist_id, page_size, offset)?;

            let Some(items) = page.items else {
                log::error!("Unexpected response for {playlist_id} at offset {offset}: no items");
                break;
            };

            let fetched = items.len();
            all_tracks.extend(items);
            if fetched < page_size {
                break;
            }

            offset += page_size;
            self.sleeper.sleep(self.settings.pacing());
        }

        log::info!("Fetched {} tracks from {playlist_id}", all_tracks.len());
        Ok(all_tracks)
    }

    /// Audio features for `track_ids`, aligned with the input.
    ///
    /// Nothing is returned unless every batch succeeds.
    ///
    /// # Errors
    ///
    /// See [`RetryPolicy::run`].
    pub fn fetch_audio_features_with_retry(
        &self,
        track_ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, FetchError> {
        let mut all_features = Vec::with_capacity(track_ids.len());

        for (index, batch) in track_ids.chunks(self.settings.batch_size).enumerate() {
            log::debug!("Fetching audio features batch {index} ({} ids)", batch.len());
            let features = self
                .retry
                .run(self.sleeper, "audio features", || self.catalog.audio_features(batch))?;
            all_features.extend(features);
            self.sleeper.sleep(self.settings.pacing());
        }

        Ok(all_features)
    }

    /// Genre lists keyed by artist ID. Artists the catalog doesn't know are
    /// left out of the map.
    ///
    /// # Errors
    ///
    /// See [`RetryPolicy::run`].
    pub fn get_artist_to_genres(&self, artist_ids: &[String]) -> Result<HashMap<String, Vec<String>>, FetchError> {
        let mut artist_to_genres = HashMap::with_capacity(artist_ids.len());

        for (index, batch) in artist_ids.chunks(self.settings.artist_batch_size).enumerate() {
            log::debug!("Fetching artist batch {index} ({} ids)", batch.len());
            let artists = self
                .retry
                .run(self.sleeper, "artist genres", || self.catalog.artists(batch))?;
            artist_to_genres.extend(artists.into_iter().flatten().map(|artist| (artist.id, artist.genres)));
            self.sleeper.sleep(self.settings.pacing());
        }

        Ok(artist_to_genres)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ArtistGenres, PlaylistSummary, TrackPage};
    use crate::track::fixtures::{features, track_ref};
    use std::cell::Cell;
    use std::collections::VecDeque;

    /// Catalog whose responses are scripted per call.
    #[derive(Default)]
    struct ScriptedCatalog {
        tracks: Vec<TrackContainer>,
        malformed_at_offset: Option<usize>,
        /// Per-call outcome for feature lookups; `None` means succeed.
        feature_script: RefCell<VecDeque<Option<CatalogError>>>,
        artist_errors: RefCell<VecDeque<CatalogError>>,
        page_requests: Cell<usize>,
        feature_requests: RefCell<Vec<usize>>,
    }

    impl ScriptedCatalog {
        fn with_tracks(count: usize) -> Self {
            Self {
                tracks: (0..count)
                    .map(|i| TrackContainer::from(track_ref(&format!("t{i}"), &format!("a{}", i % 7))))
                    .collect(),
                ..Self::default()
            }
        }

        fn failing_features(self, errors: Vec<CatalogError>) -> Self {
            self.scripted_features(errors.into_iter().map(Some).collect())
        }

        fn scripted_features(self, script: Vec<Option<CatalogError>>) -> Self {
            *self.feature_script.borrow_mut() = script.into();
            self
        }
    }

    fn features_for(id: &str) -> AudioFeatures {
        let n: f64 = id.trim_start_matches('t').parse().unwrap_or(0.0);
        features(60.0 + n, 0.5, 0.5, -6.0, 0.5)
    }

    impl CatalogService for ScriptedCatalog {
        fn playlists(&self) -> Result<Vec<PlaylistSummary>, CatalogError> {
            Ok(Vec::new())
        }

        fn playlist_tracks(&self, _: &str, limit: usize, offset: usize) -> Result<TrackPage, CatalogError> {
            self.page_requests.set(self.page_requests.get() + 1);
            if self.malformed_at_offset == Some(offset) {
                return Ok(TrackPage::malformed());
            }
            Ok(TrackPage::new(self.tracks.iter().skip(offset).take(limit).cloned().collect()))
        }

        fn audio_features(&self, ids: &[String]) -> Result<Vec<Option<AudioFeatures>>, CatalogError> {
            self.feature_requests.borrow_mut().push(ids.len());
            if let Some(Some(error)) = self.feature_script.borrow_mut().pop_front() {
                return Err(error);
            }
            Ok(ids
                .iter()
                .map(|id| (id != "missing").then(|| features_for(id)))
                .collect())
        }

        fn artists(&self, ids: &[String]) -> Result<Vec<Option<ArtistGenres>>, CatalogError> {
            if let Some(error) = self.artist_errors.borrow_mut().pop_front() {
                return Err(error);
            }
            Ok(ids
                .iter()
                .map(|id| {
                    (id != "ghost").then(|| ArtistGenres {
                        id: id.clone(),
                        genres: vec![format!("{id}-core")],
                    })
                })
                .collect())
        }

        fn playlist_name(&self, _: &str) -> Result<String, CatalogError> {
            Ok("Scripted".to_string())
        }
    }

    fn ids(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("t{i}")).collect()
    }

    const PACING: Duration = Duration::from_millis(200);

    #[test]
    fn test_fetch_all_tracks_pages_until_short_page() {
        let catalog = ScriptedCatalog::with_tracks(250);
        let sleeper = RecordingSleeper::new();
        let fetcher = CatalogFetcher::new(&catalog, &sleeper, FetchSettings::default());

        let tracks = fetcher.fetch_all_tracks("p").unwrap();

        assert_eq!(tracks.len(), 250);
        assert_eq!(catalog.page_requests.get(), 3);
        assert!(tracks.iter().enumerate().all(|(i, t)| t.id() == Some(format!("t{i}").as_str())));
        // Pacing between pages only, none after the last.
        assert_eq!(sleeper.waits(), vec![PACING, PACING]);
    }

    #[test]
    fn test_fetch_all_tracks_exact_multiple_needs_trailing_empty_page() {
        let catalog = ScriptedCatalog::with_tracks(200);
        let sleeper = RecordingSleeper::new();
        let fetcher = CatalogFetcher::new(&catalog, &sleeper, FetchSettings::default());

        assert_eq!(fetcher.fetch_all_tracks("p").unwrap().len(), 200);
        assert_eq!(catalog.page_requests.get(), 3);
    }

    #[test]
    fn test_malformed_page_truncates_silently() {
        let catalog = ScriptedCatalog {
            malformed_at_offset: Some(100),
            ..ScriptedCatalog::with_tracks(250)
        };
        let sleeper = RecordingSleeper::new();
        let fetcher = CatalogFetcher::new(&catalog, &sleeper, FetchSettings::default());

        let tracks = fetcher.fetch_all_tracks("p").unwrap();
        assert_eq!(tracks.len(), 100);
        assert_eq!(catalog.page_requests.get(), 2);
    }

    #[test]
    fn test_empty_playlist() {
        let catalog = ScriptedCatalog::default();
        let sleeper = RecordingSleeper::new();
        let fetcher = CatalogFetcher::new(&catalog, &sleeper, FetchSettings::default());

        assert!(fetcher.fetch_all_tracks("p").unwrap().is_empty());
        assert_eq!(catalog.page_requests.get(), 1);
        assert!(sleeper.waits().is_empty());
    }

    #[test]
    fn test_features_retry_after_rate_limit_then_succeed() {
        let catalog = ScriptedCatalog::default().failing_features(vec![
            CatalogError::RateLimited { retry_after: Some(1) },
            CatalogError::RateLimited { retry_after: Some(1) },
        ]);
        let sleeper = RecordingSleeper::new();
        let fetcher = CatalogFetcher::new(&catalog, &sleeper, FetchSettings::default());
        let track_ids = ids(50);

        let features = fetcher.fetch_audio_features_with_retry(&track_ids).unwrap();

        let expected: Vec<_> = track_ids.iter().map(|id| Some(features_for(id))).collect();
        assert_eq!(features, expected);
        assert_eq!(
            sleeper.waits(),
            vec![Duration::from_secs(1), Duration::from_secs(2), PACING]
        );
        assert_eq!(*catalog.feature_requests.borrow(), vec![50, 50, 50]);
    }

    #[test]
    fn test_features_exhausted_retries_is_fatal() {
        let catalog = ScriptedCatalog::default().failing_features(vec![
            CatalogError::RateLimited { retry_after: None },
            CatalogError::RateLimited { retry_after: None },
            CatalogError::RateLimited { retry_after: None },
        ]);
        let sleeper = RecordingSleeper::new();
        let fetcher = CatalogFetcher::new(&catalog, &sleeper, FetchSettings::default());

        let result = fetcher.fetch_audio_features_with_retry(&ids(50));

        assert_eq!(result, Err(FetchError::MaxRetriesExceeded { attempts: 3 }));
        assert!(result.unwrap_err().to_string().contains("max retries exceeded"));
        // Default retry-after of 1s, doubled per attempt, no pacing after failure.
        assert_eq!(
            sleeper.waits(),
            vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[test]
    fn test_failure_in_later_batch_discards_earlier_batches() {
        let catalog = ScriptedCatalog::default().scripted_features(vec![
            None,
            Some(CatalogError::Status {
                status: 500,
                message: "boom".to_string(),
            }),
        ]);
        let sleeper = RecordingSleeper::new();
        let fetcher = CatalogFetcher::new(&catalog, &sleeper, FetchSettings::default());

        let result = fetcher.fetch_audio_features_with_retry(&ids(150));

        assert!(matches!(result, Err(FetchError::Catalog(CatalogError::Status { status: 500, .. }))));
        assert_eq!(*catalog.feature_requests.borrow(), vec![100, 50]);
        // Pacing after the first batch only.
        assert_eq!(sleeper.waits(), vec![PACING]);
    }

    #[test]
    fn test_permanent_error_is_not_retried() {
        let catalog = ScriptedCatalog::default().failing_features(vec![CatalogError::Status {
            status: 401,
            message: "token expired".to_string(),
        }]);
        let sleeper = RecordingSleeper::new();
        let fetcher = CatalogFetcher::new(&catalog, &sleeper, FetchSettings::default());

        let result = fetcher.fetch_audio_features_with_retry(&ids(10));

        assert!(matches!(result, Err(FetchError::Catalog(CatalogError::Status { status: 401, .. }))));
        assert_eq!(catalog.feature_requests.borrow().len(), 1);
        assert!(sleeper.waits().is_empty());
    }

    #[test]
    fn test_features_are_batched_and_keep_nulls_aligned() {
        let catalog = ScriptedCatalog::default();
        let sleeper = RecordingSleeper::new();
        let fetcher = CatalogFetcher::new(&catalog, &sleeper, FetchSettings::default());
        let mut track_ids = ids(230);
        track_ids[101] = "missing".to_string();

        let features = fetcher.fetch_audio_features_with_retry(&track_ids).unwrap();

        assert_eq!(features.len(), 230);
        assert!(features[101].is_none());
        assert_eq!(features[229].map(|f| f.tempo), Some(60.0 + 229.0));
        assert_eq!(*catalog.feature_requests.borrow(), vec![100, 100, 30]);
        assert_eq!(sleeper.waits(), vec![PACING; 3]);
    }

    #[test]
    fn test_artist_genres_batched_with_unknown_artists_left_out() {
        let catalog = ScriptedCatalog::default();
        let sleeper = RecordingSleeper::new();
        let settings = FetchSettings {
            artist_batch_size: 2,
            pacing_ms: 0,
            ..FetchSettings::default()
        };
        let fetcher = CatalogFetcher::new(&catalog, &sleeper, settings);
        let artist_ids: Vec<String> = ["a1", "ghost", "a2"].iter().map(|s| s.to_string()).collect();

        let genres = fetcher.get_artist_to_genres(&artist_ids).unwrap();

        assert_eq!(genres.len(), 2);
        assert_eq!(genres["a1"], vec!["a1-core".to_string()]);
        assert!(!genres.contains_key("ghost"));
        assert_eq!(sleeper.waits().len(), 2);
    }

    #[test]
    fn test_artist_genres_retry_on_rate_limit() {
        let catalog = ScriptedCatalog::default();
        catalog
            .artist_errors
            .borrow_mut()
            .push_back(CatalogError::RateLimited { retry_after: Some(3) });
        let sleeper = RecordingSleeper::new();
        let fetcher = CatalogFetcher::new(&catalog, &sleeper, FetchSettings::default());

        let genres = fetcher.get_artist_to_genres(&["a1".to_string()]).unwrap();

        assert_eq!(genres.len(), 1);
        assert_eq!(sleeper.waits(), vec![Duration::from_secs(3), PACING]);
    }

    #[test]
    fn test_oversized_settings_are_capped_at_catalog_limit() {
        let catalog = ScriptedCatalog::with_tracks(250);
        let sleeper = RecordingSleeper::new();
        let settings = FetchSettings {
            page_size: 500,
            batch_size: 1000,
            artist_batch_size: 0,
            pacing_ms: 0,
            ..FetchSettings::default()
        };
        let fetcher = CatalogFetcher::new(&catalog, &sleeper, settings);

        assert_eq!(fetcher.fetch_all_tracks("p").unwrap().len(), 250);
        assert_eq!(catalog.page_requests.get(), 3);

        fetcher.fetch_audio_features_with_retry(&ids(250)).unwrap();
        assert_eq!(*catalog.feature_requests.borrow(), vec![100, 100, 50]);

        let artist_ids: Vec<String> = ["a1", "a2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(fetcher.get_artist_to_genres(&artist_ids).unwrap().len(), 2);
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.backoff(Some(1), 0), Duration::from_secs(1));
        assert_eq!(policy.backoff(Some(1), 1), Duration::from_secs(2));
        assert_eq!(policy.backoff(Some(5), 2), Duration::from_secs(20));
        assert_eq!(policy.backoff(None, 3), Duration::from_secs(8));
    }

    #[test]
    fn test_custom_retry_policy() {
        let catalog = ScriptedCatalog::default().failing_features(vec![CatalogError::RateLimited {
            retry_after: Some(1),
        }]);
        let sleeper = RecordingSleeper::new();
        let fetcher = CatalogFetcher::new(&catalog, &sleeper, FetchSettings::default()).with_retry_policy(RetryPolicy {
            max_attempts: 1,
            default_retry_after: Duration::from_secs(1),
        });

        let result = fetcher.fetch_audio_features_with_retry(&ids(5));
        assert_eq!(result, Err(FetchError::MaxRetriesExceeded { attempts: 1 }));
        assert_eq!(sleeper.total(), Duration::from_secs(1));
    }
}
