//! SwingCheck Data Model
//!
//! Defines the data contracts shared by the analysis pipeline:
//! - **Probabilities:** Per-frame event-class probabilities from the classifier
//! - **Landmarks:** Per-frame 3D pose landmarks from the pose estimator
//! - **Events:** Decoded swing-event frame sequences
//! - **Metrics:** The fixed biomechanical metric vocabulary and per-frame values
//! - **Standards:** Quantile-based standard-range tables
//! - **Judgements:** Labels, verdicts, frame/video/keyframe reports
//!
//! Missing measurements are `f64::NAN` in memory and `null` on disk.

pub mod error;
pub mod event;
pub mod files;
pub mod judgement;
pub mod landmarks;
pub mod metric;
pub mod probability;
pub mod serde_nan;
pub mod standards;

pub use error::*;
pub use event::*;
pub use judgement::*;
pub use landmarks::*;
pub use metric::*;
pub use probability::*;
pub use standards::*;
