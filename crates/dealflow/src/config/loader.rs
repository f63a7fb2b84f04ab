use std::path::Path;

use super::{Config, ConfigError};

/// Loads and validates a config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_config_from_str(&contents)
}

/// Parses and validates config JSON from a string.
pub fn load_config_from_str(contents: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            r#"{{"version": "1", "upload_directory": "{}", "worker_count": 2}}"#,
            dir.path().join("uploads").display()
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.worker_count, 2);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/dealflow.json").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_config_invalid_json() {
        let err = load_config_from_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseJson(_)));
    }
}
