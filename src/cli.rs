//! # Command-Line Interface Module
//!
//! Defines the command-line interface for Vibeshuffle using Clap derive macros.
//!
//! ## Commands
//!
//! - `playlists`: List the playlists in a catalog snapshot
//! - `shuffle`: Fetch a playlist from a catalog snapshot and print it reordered
//! - `classify`: Show how a playlist's tracks split into bangers/slow/happy/neutral
//! - `vibes`: Print the Low/Mid/High pattern for a playlist length
//! - `completion`: Generate shell completions
//!
//! ## Examples
//!
//! ```bash
//! vibeshuffle playlists --catalog snapshot.json
//! vibeshuffle shuffle road-trip --catalog snapshot.json --pretty
//! vibeshuffle shuffle road-trip --catalog snapshot.json --strategy balanced --seed 7
//! vibeshuffle vibes 12
//! ```

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Reordering strategy
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug, Default)]
pub enum Strategy {
    /// Low-high-low energy arc driven by audio features
    #[default]
    BellCurve,
    /// Round-robin across banger/slow/happy/neutral buckets
    Balanced,
}

/// Main application arguments structure.
#[derive(Parser)]
#[command(name = "vibeshuffle")]
#[command(about = "Vibeshuffle: reorder playlists into a bell-curve energy arc")]
#[command(version)]
pub struct Args {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Where to read the catalog and settings from.
#[derive(ClapArgs, Debug, Clone)]
pub struct Source {
    /// Playlist identifier in the catalog
    pub playlist_id: String,

    /// Catalog snapshot (JSON) to read the playlist from
    #[arg(long, env = "VIBESHUFFLE_CATALOG", value_hint = clap::ValueHint::FilePath)]
    pub catalog: PathBuf,

    /// Settings file; defaults to the platform config directory
    #[arg(long, env = "VIBESHUFFLE_CONFIG", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// List the playlists in a catalog
    Playlists {
        /// Catalog snapshot (JSON) to list
        #[arg(long, env = "VIBESHUFFLE_CATALOG", value_hint = clap::ValueHint::FilePath)]
        catalog: PathBuf,

        /// Print `[{id, name}]` JSON instead of one line per playlist
        #[arg(long)]
        json: bool,
    },

    /// Reorder a playlist and print it as JSON
    ///
    /// Fetches every track of the playlist, looks up audio features and
    /// artist genres, reorders the tracks and prints the result together with
    /// average stats and the most common genres.
    Shuffle {
        #[command(flatten)]
        source: Source,

        /// Reordering strategy
        #[arg(long, value_enum, default_value_t = Strategy::BellCurve)]
        strategy: Strategy,

        /// Seed for the balanced strategy's shuffling
        #[arg(long)]
        seed: Option<u64>,

        /// Skip artist genre lookups
        #[arg(long)]
        no_genres: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Show how a playlist's tracks are classified
    Classify {
        #[command(flatten)]
        source: Source,
    },

    /// Print the vibe pattern for a playlist of the given length
    Vibes {
        /// Number of tracks
        count: usize,
    },

    /// Generate shell completions
    ///
    /// Usage: vibeshuffle completion bash > ~/.local/share/bash-completion/completions/vibeshuffle
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_shuffle_defaults() {
        let args = Args::try_parse_from(["vibeshuffle", "shuffle", "p1", "--catalog", "snap.json"]).unwrap();

        match args.command {
            Command::Shuffle {
                source,
                strategy,
                seed,
                no_genres,
                pretty,
            } => {
                assert_eq!(source.playlist_id, "p1");
                assert_eq!(source.catalog, PathBuf::from("snap.json"));
                assert_eq!(strategy, Strategy::BellCurve);
                assert_eq!(seed, None);
                assert!(!no_genres);
                assert!(!pretty);
            }
            _ => panic!("expected shuffle"),
        }
    }

    #[test]
    fn test_parse_balanced_strategy() {
        let args = Args::try_parse_from([
            "vibeshuffle",
            "shuffle",
            "p1",
            "--catalog",
            "snap.json",
            "--strategy",
            "balanced",
            "--seed",
            "9",
        ])
        .unwrap();

        assert!(matches!(
            args.command,
            Command::Shuffle {
                strategy: Strategy::Balanced,
                seed: Some(9),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_playlists() {
        let args = Args::try_parse_from(["vibeshuffle", "playlists", "--catalog", "snap.json", "--json"]).unwrap();

        match args.command {
            Command::Playlists { catalog, json } => {
                assert_eq!(catalog, PathBuf::from("snap.json"));
                assert!(json);
            }
            _ => panic!("expected playlists"),
        }
    }

    #[test]
    fn test_parse_vibes() {
        let args = Args::try_parse_from(["vibeshuffle", "vibes", "12"]).unwrap();
        assert!(matches!(args.command, Command::Vibes { count: 12 }));
        assert!(Args::try_parse_from(["vibeshuffle", "vibes", "many"]).is_err());
    }
}
