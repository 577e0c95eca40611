//! Playlist reordering by audio features.
//!
//! Core modules:
//! - [`track`] - Track metadata, audio features and the enrichment join
//! - [`classify`] - Banger/slow/happy/neutral buckets
//! - [`algorithm`] - Vibe score, vibe pattern and bell-curve arrangement
//! - [`shuffle`] - Arrangement strategies (bell curve, balanced round-robin)
//! - [`fetch`] - Paging, batching and rate-limit retries against a catalog
//! - [`pipeline`] - Fetch, enrich, arrange, report
//!
//! ### Supporting Modules
//!
//! - [`catalog`] - The catalog service seam and an offline JSON snapshot
//! - [`config`] - Settings file loading
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use std::path::Path;
//! use vibeshuffle::catalog::SnapshotCatalog;
//! use vibeshuffle::config::Settings;
//! use vibeshuffle::fetch::ThreadSleeper;
//! use vibeshuffle::pipeline::{process_playlist, PipelineOptions, PlaylistOutcome};
//! use vibeshuffle::shuffle::BellCurveStrategy;
//!
//! let settings = Settings::load(None)?;
//! let catalog = SnapshotCatalog::load(Path::new("snapshot.json"))?;
//! let strategy = BellCurveStrategy::new(settings.weights);
//!
//! let outcome = process_playlist(
//!     &catalog,
//!     &ThreadSleeper,
//!     "road-trip",
//!     &strategy,
//!     &settings,
//!     PipelineOptions::default(),
//! )?;
//! if let PlaylistOutcome::Arranged(report) = outcome {
//!     for track in &report.tracks {
//!         println!("{} - {}", track.track.artist, track.track.name);
//!     }
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Bell Curve
//!
//! Each track gets a score from energy, danceability and how far its valence
//! sits from neutral. Tracks are sorted by score and split into Low/Mid/High
//! pools whose sizes follow a vibe pattern of the playlist's length. The
//! pattern opens and closes on Low and keeps High slots in the middle third,
//! so the result climbs and then settles.
//!
//! ## Error Handling
//!
//! Catalog calls return typed errors ([`catalog::CatalogError`],
//! [`fetch::FetchError`]). File loading and the binary use `anyhow` for
//! context.

pub mod algorithm;
pub mod catalog;
pub mod classify;
pub mod cli;
pub mod completion;
pub mod config;
pub mod fetch;
pub mod pipeline;
pub mod shuffle;
pub mod track;
