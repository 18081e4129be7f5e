//! # Attune - Personalized Track Recommendations
//!
//! Attune scores candidate tracks against a listener's historical
//! audio-feature pattern, ranks them, and selects a diverse top-N
//! subset. The binary is a thin wrapper around the library: it reads
//! pre-fetched JSON snapshots (the catalog and persistence layers are
//! external collaborators), runs the pure pipeline, and prints results.
//!
//! ## Usage
//!
//! ```bash
//! # Inspect the derived listening pattern
//! attune analyze history.json
//!
//! # Full pipeline: score, rank, diversify
//! attune recommend history.json candidates.json --limit 10
//!
//! # Per-feature breakdown for one candidate
//! attune explain history.json candidates.json 4uLU6hMCjMI75M1A2tKUQC
//! ```

use anyhow::{bail, Context, Result};
use attune::cli::{Args, Command};
use attune::pattern::analyze_pattern;
use attune::recommend::recommend;
use attune::scoring::explain;
use attune::snapshot;
use chrono::{DateTime, Utc};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use log::debug;
use std::io;
use std::path::Path;

/// Main entry point for the Attune application.
///
/// Initializes logging, parses command-line arguments, and routes
/// commands to the appropriate module functions. Logging is controlled
/// via `RUST_LOG`:
/// - `RUST_LOG=debug attune recommend ...` - Enable debug logging
/// - `RUST_LOG=attune::ranking=trace attune recommend ...` - Module-specific logging
fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Command::Analyze { history, json } => run_analyze(&history, json),
        Command::Recommend {
            history,
            candidates,
            limit,
            recent,
            now,
            json,
        } => run_recommend(&history, &candidates, limit, recent.as_deref(), now.as_deref(), json),
        Command::Explain {
            history,
            candidates,
            track_id,
        } => run_explain(&history, &candidates, &track_id),
        Command::Completion { shell } => {
            let mut cmd = Args::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

fn run_analyze(history_path: &Path, json: bool) -> Result<()> {
    let history = snapshot::load_history(history_path)?;
    let Some(pattern) = analyze_pattern(&history) else {
        println!("No listening history, no pattern to derive.");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&pattern)?);
        return Ok(());
    }

    println!("Listening pattern ({} tracks analyzed):", pattern.total_tracks_analyzed);
    println!("  energy:       {:.3} ± {:.3}", pattern.avg_energy, pattern.energy_std_dev);
    println!("  valence:      {:.3} ± {:.3}", pattern.avg_valence, pattern.valence_std_dev);
    println!(
        "  danceability: {:.3} ± {:.3}",
        pattern.avg_danceability, pattern.danceability_std_dev
    );
    println!(
        "  tempo:        {:.1} BPM (spread {:.3})",
        pattern.avg_tempo, pattern.tempo_std_dev
    );
    println!("  strength:     {:.1}%", pattern.pattern_strength() * 100.0);
    println!(
        "  reliable:     {}",
        if pattern.is_reliable() { "yes" } else { "no (cold start)" }
    );

    if let Some(prefs) = &pattern.time_of_day_preferences {
        println!("  time-of-day preferences:");
        for (&bucket, &weight) in prefs {
            let start = u32::from(bucket) * 4;
            println!("    {:02}:00-{:02}:59  {:.2}", start, start + 3, weight);
        }
    }
    Ok(())
}

fn run_recommend(
    history_path: &Path,
    candidates_path: &Path,
    limit: usize,
    recent_path: Option<&Path>,
    now: Option<&str>,
    json: bool,
) -> Result<()> {
    let history = snapshot::load_history(history_path)?;
    let candidates = snapshot::load_candidates(candidates_path)?;
    let recent_ids = match recent_path {
        Some(path) => snapshot::load_recent_ids(path)?,
        None => Vec::new(),
    };
    let now = parse_now(now)?;

    let pattern = analyze_pattern(&history);
    debug!(
        "Running pipeline over {} candidates (pattern: {}).",
        candidates.len(),
        if pattern.is_some() { "present" } else { "absent" }
    );

    let picks = recommend(pattern.as_ref(), candidates, &recent_ids, now, limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&picks)?);
        return Ok(());
    }

    if picks.iter().all(|p| p.score.is_none()) {
        println!("No reliable listening pattern yet; returning candidates as-is:");
    }
    for (rank, track) in picks.iter().enumerate() {
        match track.score {
            Some(score) => println!("{:>3}. {}  ({:.3})", rank + 1, track.id, score),
            None => println!("{:>3}. {}", rank + 1, track.id),
        }
    }
    Ok(())
}

fn run_explain(history_path: &Path, candidates_path: &Path, track_id: &str) -> Result<()> {
    let history = snapshot::load_history(history_path)?;
    let candidates = snapshot::load_candidates(candidates_path)?;

    let Some(pattern) = analyze_pattern(&history) else {
        bail!("Cannot explain a match without listening history.");
    };
    let candidate = candidates
        .iter()
        .find(|c| c.id == track_id)
        .with_context(|| format!("Track `{track_id}' not found in candidate snapshot"))?;
    let features = candidate
        .features
        .as_ref()
        .with_context(|| format!("Track `{track_id}' has no feature vector to explain"))?;

    println!("{}", explain(track_id, features, &pattern));
    Ok(())
}

/// Parse the `--now` override, defaulting to the wall clock.
fn parse_now(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        None => Ok(Utc::now()),
        Some(s) => Ok(DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("Invalid --now value `{s}', expected RFC 3339"))?
            .with_timezone(&Utc)),
    }
}
