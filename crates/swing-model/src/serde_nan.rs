//! Serde helpers mapping `NaN` to JSON `null` and back.
//!
//! Use with `#[serde(with = "crate::serde_nan")]` on `f64` fields that may
//! hold a missing measurement.

use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Convert an optional JSON number to the in-memory representation.
pub fn from_option(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}

/// Convert an in-memory value to its JSON representation.
pub fn to_option(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "crate::serde_nan")]
        value: f64,
    }

    #[test]
    fn nan_serializes_as_null() {
        let json = serde_json::to_string(&Sample { value: f64::NAN }).unwrap();
        assert_eq!(json, r#"{"value":null}"#);
    }

    #[test]
    fn null_deserializes_as_nan() {
        let parsed: Sample = serde_json::from_str(r#"{"value":null}"#).unwrap();
        assert!(parsed.value.is_nan());

        let parsed: Sample = serde_json::from_str(r#"{"value":1.5}"#).unwrap();
        assert_eq!(parsed.value, 1.5);
    }
}
