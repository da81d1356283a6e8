//! SwingCheck CLI: golf swing event decoding and judgement from the command line.
//!
//! Usage:
//!   swingcheck decode <PROBS>            Decode swing event frames
//!   swingcheck metrics <LANDMARKS>       Compute metric rows
//!   swingcheck build-ranges <ROWS>...    Build standard ranges from a population
//!   swingcheck judge <INPUT>             Continuous judgement, one report per video
//!   swingcheck keyframes <ROWS>          Keyframe judgement from metric rows
//!   swingcheck analyze <PROBS> <LANDMARKS>  Decode, measure and judge one video
//!
//! Reports go to `-o <PATH>`, to `-o -` for stdout, or to the configured
//! output directory when no path is given.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use swingcheck_common::config::{AppConfig, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "swingcheck",
    about = "Golf swing event decoding and metric judgement",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/swingcheck/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode one frame per swing event from a probability matrix
    Decode {
        /// Probability matrix JSON (`{"rows": [[...], ...]}`)
        probabilities: PathBuf,

        /// Decoding strategy: ordered or independent
        #[arg(long)]
        strategy: Option<String>,

        /// Number of events to decode
        #[arg(long)]
        events: Option<usize>,

        /// Output path (`-` for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute metric rows from landmark tracks
    Metrics {
        /// Landmark JSONL file
        landmarks: PathBuf,

        /// Decoded events JSON; computes keyframe rows instead of continuous rows
        #[arg(long)]
        events: Option<PathBuf>,

        /// Video to measure (required for keyframe rows over a multi-video file)
        #[arg(long)]
        video: Option<String>,

        /// Camera view: side or front
        #[arg(long)]
        view: Option<String>,

        /// Base (reference) frame; defaults to the first event or tracked frame
        #[arg(long)]
        base: Option<usize>,

        /// Output path (`-` for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build percentile standard ranges from population metric rows
    BuildRanges {
        /// Metric row JSONL files
        #[arg(required = true)]
        rows: Vec<PathBuf>,

        /// Minimum finite samples before a range is emitted
        #[arg(long)]
        min_samples: Option<usize>,

        /// Extra bands to compute, e.g. `p10-p90` (loose, standard and strict are always built)
        #[arg(long = "band")]
        bands: Vec<String>,

        /// Output path (`-` for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Continuous judgement of every frame, summarized per video
    Judge {
        /// Landmark JSONL, or metric rows with `--rows`
        input: PathBuf,

        /// Standard range table JSON
        #[arg(long)]
        ranges: PathBuf,

        /// Treat the input as continuous metric rows
        #[arg(long)]
        rows: bool,

        /// Camera view: side or front
        #[arg(long)]
        view: Option<String>,

        /// Band to judge against: loose, standard, strict or pLOW-pHIGH
        #[arg(long)]
        band: Option<String>,

        /// Minimum NotStandard run that survives the streak filter
        #[arg(long)]
        min_streak: Option<usize>,

        /// Base frame for landmark input; defaults to each video's first frame
        #[arg(long)]
        base: Option<usize>,

        /// Output path (`-` for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Keyframe judgement of per-event metric rows
    Keyframes {
        /// Keyframe metric row JSONL
        rows: PathBuf,

        /// Standard range table JSON
        #[arg(long)]
        ranges: PathBuf,

        /// Decoded events JSON to attach to the report
        #[arg(long)]
        events: Option<PathBuf>,

        /// Camera view: side or front
        #[arg(long)]
        view: Option<String>,

        /// Band to judge against: loose, standard, strict or pLOW-pHIGH
        #[arg(long)]
        band: Option<String>,

        /// Output path (`-` for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode events, compute metrics and judge one video end to end
    Analyze {
        /// Probability matrix JSON
        probabilities: PathBuf,

        /// Landmark JSONL file
        landmarks: PathBuf,

        /// Standard range table JSON
        #[arg(long)]
        ranges: PathBuf,

        /// Video to analyze when the landmark file holds several
        #[arg(long)]
        video: Option<String>,

        /// Camera view: side or front
        #[arg(long)]
        view: Option<String>,

        /// Band to judge against: loose, standard, strict or pLOW-pHIGH
        #[arg(long)]
        band: Option<String>,

        /// Decoding strategy: ordered or independent
        #[arg(long)]
        strategy: Option<String>,

        /// Base frame; defaults to the first decoded event frame
        #[arg(long)]
        base: Option<usize>,

        /// Also run continuous judgement over every tracked frame
        #[arg(long)]
        continuous: bool,

        /// Output path (`-` for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    // Initialize logging
    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    swingcheck_common::logging::init_logging(&LoggingConfig {
        level: log_level,
        ..config.logging.clone()
    });

    match cli.command {
        Commands::Decode {
            probabilities,
            strategy,
            events,
            output,
        } => commands::decode::run(&config, probabilities, strategy, events, output),
        Commands::Metrics {
            landmarks,
            events,
            video,
            view,
            base,
            output,
        } => commands::metrics::run(&config, landmarks, events, video, view, base, output),
        Commands::BuildRanges {
            rows,
            min_samples,
            bands,
            output,
        } => commands::build_ranges::run(&config, rows, min_samples, bands, output),
        Commands::Judge {
            input,
            ranges,
            rows,
            view,
            band,
            min_streak,
            base,
            output,
        } => {
            commands::judge::run(
                &config, input, ranges, rows, view, band, min_streak, base, output,
            )
            .await
        }
        Commands::Keyframes {
            rows,
            ranges,
            events,
            view,
            band,
            output,
        } => commands::keyframes::run(&config, rows, ranges, events, view, band, output),
        Commands::Analyze {
            probabilities,
            landmarks,
            ranges,
            video,
            view,
            band,
            strategy,
            base,
            continuous,
            output,
        } => commands::analyze::run(
            &config,
            commands::analyze::AnalyzeArgs {
                probabilities,
                landmarks,
                ranges,
                video,
                view,
                band,
                strategy,
                base,
                continuous,
                output,
            },
        ),
    }
}
