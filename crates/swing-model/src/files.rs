//! JSON / JSONL file helpers used at the I/O boundary.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ModelError;

/// Read and parse a JSON document.
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ModelError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ModelError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| ModelError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Serialize a value as pretty JSON, creating parent directories.
pub fn save_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), ModelError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ModelError::IoError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| ModelError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, json).map_err(|e| ModelError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Parse JSONL content (one JSON object per line, `#` lines are comments).
pub fn parse_jsonl<T: DeserializeOwned>(jsonl: &str) -> Result<Vec<T>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize records to JSONL format.
pub fn serialize_jsonl<T: Serialize>(records: &[T]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for record in records {
        output.push_str(&serde_json::to_string(record)?);
        output.push('\n');
    }
    Ok(output)
}

/// Read and parse a JSONL file.
pub fn load_jsonl<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>, ModelError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ModelError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_jsonl(&content).map_err(|e| ModelError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write records as a JSONL file, creating parent directories.
pub fn save_jsonl<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> Result<(), ModelError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ModelError::IoError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let jsonl = serialize_jsonl(records).map_err(|e| ModelError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, jsonl).map_err(|e| ModelError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jsonl_skips_comments_and_blank_lines() {
        let parsed: Vec<u32> = parse_jsonl("# header\n1\n\n2\n").unwrap();
        assert_eq!(parsed, vec![1, 2]);
    }

    #[test]
    fn json_file_roundtrip() {
        let dir = std::env::temp_dir().join("swingcheck_files_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("values.json");

        save_json(&path, &vec![1.0_f64, 2.5]).unwrap();
        let loaded: Vec<f64> = load_json(&path).unwrap();
        assert_eq!(loaded, vec![1.0, 2.5]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_json_reports_missing_file() {
        let err = load_json::<Vec<f64>>("/nonexistent/swingcheck.json").unwrap_err();
        assert!(matches!(err, ModelError::IoError { .. }));
    }
}
