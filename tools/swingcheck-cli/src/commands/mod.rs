pub mod analyze;
pub mod build_ranges;
pub mod decode;
pub mod judge;
pub mod keyframes;
pub mod metrics;

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use swingcheck_common::config::AppConfig;
use swingcheck_model::event::DecodeStrategy;
use swingcheck_model::files;
use swingcheck_model::landmarks::{parse_landmarks, LandmarkTrack};
use swingcheck_model::metric::View;
use swingcheck_model::standards::BandKind;
use swingcheck_processing_core::aggregate::AggregationConfig;

/// Where a command writes its result.
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl Output {
    /// `-` means stdout; no path means `<output_dir>/<default_name>`.
    pub fn resolve(path: Option<PathBuf>, config: &AppConfig, default_name: &str) -> Self {
        match path {
            Some(p) if p.as_os_str() == "-" => Output::Stdout,
            Some(p) => Output::File(p),
            None => Output::File(config.output_dir.join(default_name)),
        }
    }

    pub fn write_json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        match self {
            Output::Stdout => {
                println!("{}", serde_json::to_string_pretty(value)?);
            }
            Output::File(path) => {
                files::save_json(path, value)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("Wrote {}", path.display());
            }
        }
        Ok(())
    }

    pub fn write_jsonl<T: Serialize>(&self, records: &[T]) -> anyhow::Result<()> {
        match self {
            Output::Stdout => {
                print!("{}", files::serialize_jsonl(records)?);
            }
            Output::File(path) => {
                files::save_jsonl(path, records)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("Wrote {} records to {}", records.len(), path.display());
            }
        }
        Ok(())
    }
}

pub fn resolve_view(flag: Option<String>, config: &AppConfig) -> anyhow::Result<View> {
    let raw = flag.unwrap_or_else(|| config.analysis.view.clone());
    raw.parse::<View>().map_err(anyhow::Error::msg)
}

pub fn resolve_band(flag: Option<String>, config: &AppConfig) -> anyhow::Result<BandKind> {
    let raw = flag.unwrap_or_else(|| config.analysis.band.clone());
    raw.parse::<BandKind>()
        .with_context(|| format!("Invalid band '{raw}'"))
}

pub fn resolve_strategy(
    flag: Option<String>,
    config: &AppConfig,
) -> anyhow::Result<DecodeStrategy> {
    let raw = flag.unwrap_or_else(|| config.decode.strategy.clone());
    raw.parse::<DecodeStrategy>().map_err(anyhow::Error::msg)
}

/// View defaults with the configured streak length and rule overrides.
pub fn aggregation_config(view: View, config: &AppConfig) -> anyhow::Result<AggregationConfig> {
    AggregationConfig::for_view(view)
        .with_min_streak(config.analysis.min_streak)
        .with_overrides(&config.analysis.rules)
        .context("Invalid rule overrides in config")
}

/// Load a landmark JSONL file as one track per video, applying the
/// configured visibility threshold.
pub fn load_tracks(path: &Path, config: &AppConfig) -> anyhow::Result<Vec<LandmarkTrack>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Landmarks file not found: {}", path.display()))?;
    let records = parse_landmarks(&content)
        .with_context(|| format!("Failed to parse landmarks in {}", path.display()))?;
    let min_visibility = config.analysis.min_visibility;
    Ok(LandmarkTrack::group_by_video(records)
        .into_iter()
        .map(|t| t.with_min_visibility(min_visibility))
        .collect())
}

/// Pick one track: the named video, or the only one in the file.
pub fn select_track(
    tracks: Vec<LandmarkTrack>,
    video: Option<&str>,
) -> anyhow::Result<LandmarkTrack> {
    match video {
        Some(id) => tracks
            .into_iter()
            .find(|t| t.video_id() == id)
            .ok_or_else(|| anyhow::anyhow!("Video '{id}' not found in landmarks")),
        None => {
            let count = tracks.len();
            let mut iter = tracks.into_iter();
            match (iter.next(), count) {
                (Some(track), 1) => Ok(track),
                (None, _) => anyhow::bail!("Landmarks file has no records"),
                _ => anyhow::bail!("Landmarks file holds {count} videos; pick one with --video"),
            }
        }
    }
}
