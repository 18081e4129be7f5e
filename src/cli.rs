//! # Command-Line Interface Module
//!
//! Defines the command-line interface for Attune using Clap derive
//! macros. The binary operates on pre-fetched JSON snapshots: the
//! catalog and persistence collaborators are out of scope here, so
//! history, candidates and recent plays arrive as files.
//!
//! ## Commands
//!
//! - `analyze`: Derive a listening pattern from a history snapshot
//! - `recommend`: Score, rank and diversify a candidate snapshot
//! - `explain`: Show the per-feature match breakdown for one candidate
//! - `completion`: Generate shell completion scripts
//!
//! ## Examples
//!
//! ```bash
//! attune analyze history.json
//! attune recommend history.json candidates.json --limit 10
//! attune explain history.json candidates.json 4uLU6hMCjMI75M1A2tKUQC
//! ```

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main application arguments structure.
///
/// Uses Clap derive macros to automatically generate argument parsing,
/// help text, and validation. All functionality is accessed through
/// subcommands.
#[derive(Parser)]
#[command(name = "attune")]
#[command(about = "Attune: Personalized track recommendations from listening patterns")]
#[command(version)]
pub struct Args {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Derive a listening pattern from a history snapshot
    ///
    /// Reads a JSON array of `{played_at, features}` entries (newest
    /// last) and prints the derived pattern: per-feature means and
    /// standard deviations, pattern strength, reliability, and the
    /// learned time-of-day preferences. Only the most recent 100
    /// entries are analyzed.
    Analyze {
        /// Path to the history snapshot (JSON)
        history: PathBuf,

        /// Emit the pattern as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },

    /// Recommend tracks from a candidate snapshot
    ///
    /// Runs the full pipeline: pattern derivation, scoring with
    /// time-of-day context boost, ranking, and diversity selection.
    /// With fewer than 10 history entries the pattern is not trusted
    /// and candidates are passed through unscored (cold start).
    Recommend {
        /// Path to the history snapshot (JSON)
        history: PathBuf,

        /// Path to the candidate snapshot (JSON array of `{id, features}`)
        candidates: PathBuf,

        /// Maximum number of recommendations to return
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Path to a JSON array of recently played track ids; matches
        /// keep only half their score
        #[arg(long)]
        recent: Option<PathBuf>,

        /// Evaluate the time-of-day context at this RFC 3339 instant
        /// instead of the current wall clock (useful for scripting and
        /// reproducibility)
        #[arg(long)]
        now: Option<String>,

        /// Emit the recommendation list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Explain how one candidate matches the listening pattern
    ///
    /// Prints the per-feature match percentages, the weight applied to
    /// each component, and the resulting base score. Diagnostic output
    /// only; the pipeline never branches on it.
    Explain {
        /// Path to the history snapshot (JSON)
        history: PathBuf,

        /// Path to the candidate snapshot (JSON)
        candidates: PathBuf,

        /// Id of the candidate to explain
        track_id: String,
    },

    /// Generate shell completions
    ///
    /// Usage: attune completion bash > ~/.local/share/bash-completion/completions/attune
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
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn recommend_defaults_limit_to_twenty() {
        let args = Args::try_parse_from(["attune", "recommend", "h.json", "c.json"]).unwrap();
        match args.command {
            Command::Recommend { limit, recent, now, json, .. } => {
                assert_eq!(limit, 20);
                assert!(recent.is_none());
                assert!(now.is_none());
                assert!(!json);
            }
            _ => panic!("expected recommend subcommand"),
        }
    }
}
