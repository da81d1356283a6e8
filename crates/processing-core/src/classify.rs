//! Per-metric judgement against a `[low, high]` band.
//!
//! Two outputs are derived from the same thresholds:
//! - a discrete two-sided [`Label`] (keyframe mode), and
//! - a normalized deviation that buckets into a [`Severity`] (continuous mode).
//!
//! NaN in the value or either threshold always means "missing".

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use swingcheck_model::judgement::{Label, Severity};

/// Width used when a band collapses (`high <= low`).
pub const MIN_BAND_WIDTH: f64 = 1e-9;

/// Which side(s) of the band count as a defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Direction {
    pub low_is_bad: bool,
    pub high_is_bad: bool,
}

impl Direction {
    pub const BOTH: Direction = Direction {
        low_is_bad: true,
        high_is_bad: true,
    };
    pub const LOW_ONLY: Direction = Direction {
        low_is_bad: true,
        high_is_bad: false,
    };
    pub const HIGH_ONLY: Direction = Direction {
        low_is_bad: false,
        high_is_bad: true,
    };
}

impl Default for Direction {
    fn default() -> Self {
        Self::BOTH
    }
}

/// How a deviation is measured against the thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeRule {
    /// Distance outside `[low, high]` in band widths.
    #[default]
    Between,
    /// `|value|` must not exceed `high`; `low` is ignored.
    AbsWithin,
}

impl FromStr for JudgeRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "between" => Ok(Self::Between),
            "abs_within" => Ok(Self::AbsWithin),
            other => Err(format!(
                "unknown judge rule '{other}' (expected between|abs_within)"
            )),
        }
    }
}

/// Discrete label of `value` against `[low, high]`.
///
/// The low boundary is inclusive: `value == low` is normal.
pub fn classify(value: f64, low: f64, high: f64, direction: Direction) -> Label {
    if value.is_nan() || low.is_nan() || high.is_nan() {
        return Label::Missing;
    }
    if direction.low_is_bad && value < low {
        Label::SevereInsufficient
    } else if direction.high_is_bad && value > high {
        Label::SlightExceed
    } else {
        Label::Normal
    }
}

/// Normalized deviation of `value` outside its band, `>= 0`, NaN if missing.
pub fn deviation(value: f64, low: f64, high: f64, rule: JudgeRule, direction: Direction) -> f64 {
    match rule {
        JudgeRule::Between => {
            if value.is_nan() || low.is_nan() || high.is_nan() {
                return f64::NAN;
            }
            let width = if high - low > 0.0 {
                high - low
            } else {
                MIN_BAND_WIDTH
            };
            let dev = if value < low {
                if direction.low_is_bad {
                    (low - value) / width
                } else {
                    0.0
                }
            } else if value > high {
                if direction.high_is_bad {
                    (value - high) / width
                } else {
                    0.0
                }
            } else {
                0.0
            };
            dev.max(0.0)
        }
        JudgeRule::AbsWithin => {
            if value.is_nan() || high.is_nan() {
                return f64::NAN;
            }
            if !direction.high_is_bad {
                return 0.0;
            }
            ((value.abs() - high) / (high + MIN_BAND_WIDTH)).max(0.0)
        }
    }
}

/// Deviation bucketed into a severity.
pub fn severity(
    value: f64,
    low: f64,
    high: f64,
    rule: JudgeRule,
    direction: Direction,
) -> Severity {
    Severity::from_deviation(deviation(value, low, high, rule, direction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_boundary_is_inclusive() {
        assert_eq!(classify(10.0, 10.0, 20.0, Direction::BOTH), Label::Normal);
        assert_eq!(
            classify(10.0 - 0.0001, 10.0, 20.0, Direction::BOTH),
            Label::SevereInsufficient
        );
        assert_eq!(classify(20.0, 10.0, 20.0, Direction::BOTH), Label::Normal);
        assert_eq!(
            classify(20.5, 10.0, 20.0, Direction::BOTH),
            Label::SlightExceed
        );
    }

    #[test]
    fn nan_anywhere_is_missing() {
        assert_eq!(classify(f64::NAN, 0.0, 1.0, Direction::BOTH), Label::Missing);
        assert_eq!(classify(0.5, f64::NAN, 1.0, Direction::BOTH), Label::Missing);
        assert_eq!(classify(0.5, 0.0, f64::NAN, Direction::BOTH), Label::Missing);
        assert!(deviation(0.5, f64::NAN, 1.0, JudgeRule::Between, Direction::BOTH).is_nan());
        assert_eq!(
            severity(f64::NAN, 0.0, 1.0, JudgeRule::Between, Direction::BOTH),
            Severity::Missing
        );
    }

    #[test]
    fn direction_flags_mute_one_side() {
        assert_eq!(classify(-5.0, 0.0, 1.0, Direction::HIGH_ONLY), Label::Normal);
        assert_eq!(classify(5.0, 0.0, 1.0, Direction::LOW_ONLY), Label::Normal);
        assert_eq!(
            deviation(-5.0, 0.0, 1.0, JudgeRule::Between, Direction::HIGH_ONLY),
            0.0
        );
        assert_eq!(
            deviation(5.0, 0.0, 1.0, JudgeRule::Between, Direction::HIGH_ONLY),
            4.0
        );
    }

    #[test]
    fn deviation_in_band_widths() {
        let d = |v| deviation(v, 10.0, 20.0, JudgeRule::Between, Direction::BOTH);
        assert_eq!(d(15.0), 0.0);
        assert_eq!(d(10.0), 0.0);
        assert_eq!(d(25.0), 0.5);
        assert_eq!(d(0.0), 1.0);
        assert_eq!(
            severity(25.0, 10.0, 20.0, JudgeRule::Between, Direction::BOTH),
            Severity::Minor
        );
        assert_eq!(
            severity(26.0, 10.0, 20.0, JudgeRule::Between, Direction::BOTH),
            Severity::Abnormal
        );
    }

    #[test]
    fn collapsed_band_uses_minimum_width() {
        let d = deviation(1.0 + 1e-9, 1.0, 1.0, JudgeRule::Between, Direction::BOTH);
        assert!(d > 0.5);
        assert_eq!(
            deviation(1.0, 1.0, 1.0, JudgeRule::Between, Direction::BOTH),
            0.0
        );
    }

    #[test]
    fn judge_rule_names() {
        assert_eq!("between".parse::<JudgeRule>(), Ok(JudgeRule::Between));
        assert_eq!("ABS_WITHIN".parse::<JudgeRule>(), Ok(JudgeRule::AbsWithin));
        assert!("outside".parse::<JudgeRule>().is_err());
    }

    #[test]
    fn abs_within_ignores_low() {
        let d = |v| deviation(v, f64::NAN, 2.0, JudgeRule::AbsWithin, Direction::BOTH);
        assert_eq!(d(1.5), 0.0);
        assert_eq!(d(-2.0), 0.0);
        assert!((d(-3.0) - 0.5).abs() < 1e-6);
        assert!(d(f64::NAN).is_nan());
    }
}
