//! # Vibeshuffle
//!
//! Reorders a playlist so its energy rises toward the middle and falls off
//! again at the end, or deals it round-robin across mood buckets.
//!
//! ## Usage
//!
//! ```bash
//! # Bell-curve arrangement of a playlist from a catalog snapshot
//! vibeshuffle shuffle road-trip --catalog snapshot.json --pretty
//!
//! # Round-robin across bangers/slow/happy/neutral
//! vibeshuffle shuffle road-trip --catalog snapshot.json --strategy balanced --seed 7
//!
//! # See which playlists a snapshot holds
//! vibeshuffle playlists --catalog snapshot.json
//!
//! # Inspect the buckets or the vibe pattern
//! vibeshuffle classify road-trip --catalog snapshot.json
//! vibeshuffle vibes 12
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::info;
use std::process::ExitCode;
use vibeshuffle::algorithm::generate_playlist_vibes;
use vibeshuffle::catalog::{CatalogService, SnapshotCatalog};
use vibeshuffle::classify::categorize_songs;
use vibeshuffle::cli::{self, Source, Strategy};
use vibeshuffle::completion;
use vibeshuffle::config::Settings;
use vibeshuffle::fetch::{CatalogFetcher, ThreadSleeper};
use vibeshuffle::pipeline::{self, PipelineOptions, PlaylistOutcome};
use vibeshuffle::shuffle::{BalancedStrategy, BellCurveStrategy, ShuffleStrategy};
use vibeshuffle::track::EnrichedTrack;

/// Exit status when the playlist has no usable tracks.
const NOT_FOUND_EXIT: u8 = 2;

fn load_source(source: &Source) -> Result<(Settings, SnapshotCatalog)> {
    let settings = Settings::load(source.config.as_deref())?;
    let catalog = SnapshotCatalog::load(&source.catalog)?;
    Ok((settings, catalog))
}

fn build_strategy(strategy: Strategy, settings: &Settings, seed: Option<u64>) -> Box<dyn ShuffleStrategy> {
    match strategy {
        Strategy::BellCurve => Box::new(BellCurveStrategy::new(settings.weights)),
        Strategy::Balanced => Box::new(BalancedStrategy::new(settings.classifier, seed)),
    }
}

fn print_bucket(label: &str, tracks: &[EnrichedTrack]) {
    println!("{label} ({})", tracks.len());
    for track in tracks {
        println!("  {} - {}", track.track.artist, track.track.name);
    }
}

/// Main entry point.
///
/// Logging is controlled via `RUST_LOG`:
/// - `RUST_LOG=info vibeshuffle shuffle ...` - Progress of paging and batching
/// - `RUST_LOG=vibeshuffle::fetch=debug vibeshuffle shuffle ...` - Every catalog request
fn main() -> Result<ExitCode> {
    env_logger::init();

    let args = cli::Args::parse();

    match args.command {
        cli::Command::Playlists { catalog, json } => {
            let catalog = SnapshotCatalog::load(&catalog)?;
            let playlists = catalog.playlists().context("Failed to list playlists")?;

            if json {
                println!("{}", serde_json::to_string(&playlists)?);
            } else {
                for playlist in &playlists {
                    println!("{}\t{}", playlist.id, playlist.name);
                }
            }
        }
        cli::Command::Shuffle {
            source,
            strategy,
            seed,
            no_genres,
            pretty,
        } => {
            let (settings, catalog) = load_source(&source)?;
            let strategy = build_strategy(strategy, &settings, seed);
            let options = PipelineOptions {
                resolve_genres: !no_genres,
            };

            info!("Shuffling playlist {} with {}", source.playlist_id, strategy.name());
            let outcome = pipeline::process_playlist(
                &catalog,
                &ThreadSleeper,
                &source.playlist_id,
                strategy.as_ref(),
                &settings,
                options,
            )
            .with_context(|| format!("Failed to process playlist {}", source.playlist_id))?;

            match outcome {
                PlaylistOutcome::Arranged(report) => {
                    let json = if pretty {
                        serde_json::to_string_pretty(&report)?
                    } else {
                        serde_json::to_string(&report)?
                    };
                    println!("{json}");
                }
                PlaylistOutcome::NotFound => {
                    eprintln!("No tracks found for playlist {}", source.playlist_id);
                    return Ok(ExitCode::from(NOT_FOUND_EXIT));
                }
            }
        }
        cli::Command::Classify { source } => {
            let (settings, catalog) = load_source(&source)?;
            let fetcher = CatalogFetcher::new(&catalog, &ThreadSleeper, settings.fetch);
            let tracks = pipeline::fetch_enriched_tracks(
                &fetcher,
                &source.playlist_id,
                PipelineOptions { resolve_genres: false },
            )
            .with_context(|| format!("Failed to fetch playlist {}", source.playlist_id))?;

            if tracks.is_empty() {
                eprintln!("No tracks found for playlist {}", source.playlist_id);
                return Ok(ExitCode::from(NOT_FOUND_EXIT));
            }

            let categories = categorize_songs(&tracks, &settings.classifier);
            print_bucket("Bangers", &categories.bangers);
            print_bucket("Slow", &categories.slow);
            print_bucket("Happy", &categories.happy);
            print_bucket("Neutral", &categories.neutral);
        }
        cli::Command::Vibes { count } => {
            let labels: Vec<String> = generate_playlist_vibes(count).iter().map(ToString::to_string).collect();
            println!("{}", labels.join(" "));
        }
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(shell), &mut cmd);
        }
    }

    Ok(ExitCode::SUCCESS)
}
