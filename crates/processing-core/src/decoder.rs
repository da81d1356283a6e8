//! Event sequence decoding: turn per-frame class probabilities into one
//! frame index per swing event.
//!
//! # Strategies
//!
//! - **Independent:** each event takes the argmax frame of its own column.
//!   Fast, but the resulting frames may be out of temporal order.
//! - **Ordered:** dynamic programming in log space over non-decreasing frame
//!   sequences `f_0 <= f_1 <= ... <= f_{E-1}`, maximizing
//!   `sum_i ln P[f_i, i]`. Runs in `O(E * T)` time and memory.
//!
//! Both strategies break ties toward the earliest frame.

use swingcheck_model::event::{DecodeStrategy, EventSequence};
use swingcheck_model::probability::ProbabilityMatrix;

/// Probabilities are clamped to `[LOG_EPSILON, 1]` before taking logs.
pub const LOG_EPSILON: f64 = 1e-9;

/// Structural problems that make a matrix undecodable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("probability matrix has no frames")]
    EmptyMatrix,

    #[error("requested {requested} events but matrix has {columns} columns (need events + 1)")]
    TooManyEvents { requested: usize, columns: usize },

    #[error("event column {column} contains no finite probability")]
    NonFiniteColumn { column: usize },
}

/// Decodes event frames from a probability matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventDecoder {
    strategy: DecodeStrategy,
}

impl EventDecoder {
    pub fn new(strategy: DecodeStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> DecodeStrategy {
        self.strategy
    }

    /// Decode `num_events` event frames.
    ///
    /// Columns `0..num_events` are the events; the matrix must carry at least
    /// one more column for the "no event" class.
    pub fn decode(
        &self,
        matrix: &ProbabilityMatrix,
        num_events: usize,
    ) -> Result<EventSequence, DecodeError> {
        tracing::debug!(
            strategy = %self.strategy,
            frames = matrix.num_frames(),
            events = num_events,
            "Decoding swing events"
        );

        if let Err(err) = validate(matrix, num_events) {
            tracing::warn!(error = %err, strategy = %self.strategy, "Event decoding failed");
            return Err(err);
        }

        if num_events == 0 {
            return Ok(EventSequence::empty(self.strategy));
        }

        let frames = match self.strategy {
            DecodeStrategy::Independent => decode_independent(matrix, num_events),
            DecodeStrategy::Ordered => decode_ordered(matrix, num_events),
        };

        let confidence = frames
            .iter()
            .enumerate()
            .map(|(event, &frame)| matrix.get(frame, event))
            .collect();

        Ok(EventSequence {
            strategy: self.strategy,
            frames,
            confidence,
        })
    }
}

/// `ln(clamp(p, LOG_EPSILON, 1))`, with non-finite input treated as epsilon.
pub fn log_prob(p: f64) -> f64 {
    if p.is_finite() {
        p.clamp(LOG_EPSILON, 1.0).ln()
    } else {
        LOG_EPSILON.ln()
    }
}

/// Total log-probability of assigning `frames[i]` to event `i`.
///
/// # Panics
///
/// Panics if a frame or event index is outside the matrix.
pub fn log_likelihood(matrix: &ProbabilityMatrix, frames: &[usize]) -> f64 {
    frames
        .iter()
        .enumerate()
        .map(|(event, &frame)| log_prob(matrix.get(frame, event)))
        .sum()
}

fn validate(matrix: &ProbabilityMatrix, num_events: usize) -> Result<(), DecodeError> {
    if matrix.is_empty() {
        return Err(DecodeError::EmptyMatrix);
    }
    if num_events + 1 > matrix.num_columns() {
        return Err(DecodeError::TooManyEvents {
            requested: num_events,
            columns: matrix.num_columns(),
        });
    }
    if let Some(column) =
        (0..num_events).find(|&c| !matrix.column(c).any(|p| p.is_finite()))
    {
        return Err(DecodeError::NonFiniteColumn { column });
    }
    Ok(())
}

fn decode_independent(matrix: &ProbabilityMatrix, num_events: usize) -> Vec<usize> {
    (0..num_events)
        .map(|event| {
            let mut best_frame = 0;
            let mut best = f64::NEG_INFINITY;
            for (frame, p) in matrix.column(event).enumerate() {
                // Strict comparison keeps the first maximum.
                if p.is_finite() && p > best {
                    best = p;
                    best_frame = frame;
                }
            }
            best_frame
        })
        .collect()
}

fn decode_ordered(matrix: &ProbabilityMatrix, num_events: usize) -> Vec<usize> {
    let num_frames = matrix.num_frames();

    // dp[t]: best score of events 0..=e with event e at frame t.
    let mut dp: Vec<f64> = matrix.column(0).map(log_prob).collect();
    // back[(e - 1) * T + t]: frame of event e-1 on the best path through (e, t).
    let mut back = vec![0usize; (num_events - 1) * num_frames];

    for event in 1..num_events {
        let mut next = Vec::with_capacity(num_frames);
        let mut prefix_best = f64::NEG_INFINITY;
        let mut prefix_arg = 0;

        for (t, p) in matrix.column(event).enumerate() {
            if dp[t] > prefix_best {
                prefix_best = dp[t];
                prefix_arg = t;
            }
            back[(event - 1) * num_frames + t] = prefix_arg;
            next.push(prefix_best + log_prob(p));
        }
        dp = next;
    }

    let mut last = 0;
    for t in 1..num_frames {
        if dp[t] > dp[last] {
            last = t;
        }
    }

    let mut frames = vec![0usize; num_events];
    frames[num_events - 1] = last;
    for event in (1..num_events).rev() {
        frames[event - 1] = back[(event - 1) * num_frames + frames[event]];
    }
    frames
}
