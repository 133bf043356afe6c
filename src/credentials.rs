use std::path::{Path, PathBuf};

use thiserror::Error;

/// Reasons the API key could not be obtained. All of them are operator
/// configuration problems and abort the run.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential file not found at {0}")]
    Missing(PathBuf),
    #[error("failed to read credential file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("credential file {path} is not valid JSON: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("credential file {0} has no usable \"api_key\"")]
    MissingKey(PathBuf),
}

/// Read `<base_dir>/<file_name>` and return its `api_key` field.
pub fn load_api_key(base_dir: &Path, file_name: &str) -> Result<String, CredentialError> {
    let path = base_dir.join(file_name);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CredentialError::Missing(path))
        }
        Err(source) => return Err(CredentialError::Unreadable { path, source }),
    };

    let secrets: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(source) => return Err(CredentialError::Malformed { path, source }),
    };

    // A top-level array or string parses fine but carries no key.
    match secrets.get("api_key").and_then(|k| k.as_str()) {
        Some(key) if !key.trim().is_empty() => Ok(key.to_string()),
        _ => Err(CredentialError::MissingKey(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_secrets(dir: &Path, contents: &str) {
        std::fs::write(dir.join("secrets.json"), contents).unwrap();
    }

    #[test]
    fn test_loads_key() {
        let dir = tempfile::tempdir().unwrap();
        write_secrets(dir.path(), r#"{"api_key": "abc123", "other": 1}"#);
        assert_eq!(load_api_key(dir.path(), "secrets.json").unwrap(), "abc123");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_api_key(dir.path(), "secrets.json").unwrap_err();
        assert!(matches!(err, CredentialError::Missing(_)));
    }

    #[test]
    fn test_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        write_secrets(dir.path(), "{ api_key: ");
        let err = load_api_key(dir.path(), "secrets.json").unwrap_err();
        assert!(matches!(err, CredentialError::Malformed { .. }));
    }

    #[test]
    fn test_missing_or_null_key() {
        let dir = tempfile::tempdir().unwrap();
        write_secrets(dir.path(), r#"{"token": "abc"}"#);
        assert!(matches!(
            load_api_key(dir.path(), "secrets.json").unwrap_err(),
            CredentialError::MissingKey(_)
        ));

        write_secrets(dir.path(), r#"{"api_key": null}"#);
        assert!(matches!(
            load_api_key(dir.path(), "secrets.json").unwrap_err(),
            CredentialError::MissingKey(_)
        ));

        write_secrets(dir.path(), r#"["abc"]"#);
        assert!(matches!(
            load_api_key(dir.path(), "secrets.json").unwrap_err(),
            CredentialError::MissingKey(_)
        ));
    }
}
