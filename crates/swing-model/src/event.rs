//! Decoded swing events.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How event frames are chosen from the probability matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecodeStrategy {
    /// Jointly choose non-decreasing frames maximizing total log-probability.
    #[default]
    Ordered,
    /// Choose each event's argmax frame on its own; no ordering guarantee.
    Independent,
}

impl DecodeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::Independent => "independent",
        }
    }
}

impl fmt::Display for DecodeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecodeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ordered" => Ok(Self::Ordered),
            "independent" => Ok(Self::Independent),
            other => Err(format!(
                "unknown decode strategy '{other}' (expected ordered|independent)"
            )),
        }
    }
}

/// Frame indices for each swing event, with the classifier confidence at
/// the chosen frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSequence {
    /// Strategy that produced this sequence.
    pub strategy: DecodeStrategy,

    /// `frames[i]` is the frame chosen for event `i`.
    pub frames: Vec<usize>,

    /// `confidence[i]` is `P[frames[i], i]` (raw probability, not logged).
    pub confidence: Vec<f64>,
}

impl EventSequence {
    /// An empty sequence (zero events requested).
    pub fn empty(strategy: DecodeStrategy) -> Self {
        Self {
            strategy,
            frames: vec![],
            confidence: vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// True when `f_0 <= f_1 <= ... <= f_{E-1}`.
    pub fn is_monotone(&self) -> bool {
        self.frames.windows(2).all(|w| w[0] <= w[1])
    }

    /// Iterate `(event_index, frame, confidence)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.frames
            .iter()
            .zip(&self.confidence)
            .enumerate()
            .map(|(i, (&frame, &conf))| (i, frame, conf))
    }
}

/// Named swing-event vocabularies used when labelling reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SwingEventSet {
    /// Address through Finish.
    #[default]
    Eight,
    /// Toe-up through follow-through, with transition and pre-impact phases.
    Nine,
}

const EIGHT_EVENT_NAMES: [&str; 8] = [
    "Address",
    "Toe-up",
    "Mid-backswing",
    "Top",
    "Mid-downswing",
    "Impact",
    "Mid-follow-through",
    "Finish",
];

const NINE_EVENT_NAMES: [&str; 9] = [
    "Toe-up",
    "Takeaway",
    "Backswing",
    "Top",
    "Transition",
    "Pre-impact",
    "Impact",
    "Follow-through",
    "Finish",
];

impl SwingEventSet {
    /// Pick the vocabulary matching an event count, if any.
    pub fn for_count(num_events: usize) -> Option<Self> {
        match num_events {
            8 => Some(Self::Eight),
            9 => Some(Self::Nine),
            _ => None,
        }
    }

    pub fn names(&self) -> &'static [&'static str] {
        match self {
            Self::Eight => &EIGHT_EVENT_NAMES,
            Self::Nine => &NINE_EVENT_NAMES,
        }
    }
}

/// Display name for an event index. Falls back to `event_<i>` outside the set.
pub fn event_name(set: Option<SwingEventSet>, index: usize) -> String {
    set.and_then(|s| s.names().get(index).copied())
        .map(str::to_string)
        .unwrap_or_else(|| format!("event_{index}"))
}
