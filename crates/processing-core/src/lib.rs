//! SwingCheck Processing Core
//!
//! Turns classifier and pose-estimator output into swing judgements:
//! - **Decoding:** Pick one frame per swing event from class probabilities
//! - **Metrics:** Measure rotations, tilts and displacements against a base frame
//! - **Standards:** Build percentile bands from a reference population
//! - **Judgement:** Label, score, streak-filter and summarize
//!
//! This crate is pure computation with no I/O and no platform dependencies.
//! All inputs are data; all outputs are data.

pub mod aggregate;
pub mod classify;
pub mod decoder;
pub mod geometry;
pub mod keyframe;
pub mod metrics;
pub mod pipeline;
pub mod standards;

pub use aggregate::AggregationConfig;
pub use decoder::{DecodeError, EventDecoder};
pub use keyframe::KeyframeJudge;
pub use metrics::MetricComputer;
pub use pipeline::{AnalyzerConfig, SwingAnalyzer};
pub use standards::StandardRangeBuilder;
