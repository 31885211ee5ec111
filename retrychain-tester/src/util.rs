use std::path::Path;

use anyhow::{Context, Result};
use retrychain_engine::RunConfig;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Load a JSON run configuration from disk.
pub fn load_run_config(path: &Path) -> Result<RunConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    RunConfig::from_json_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_drops_blanks() {
        assert_eq!(split_csv(" 1, 2,,random "), vec!["1", "2", "random"]);
        assert!(split_csv("").is_empty());
    }

    #[test]
    fn load_run_config_reports_missing_file() {
        let err = load_run_config(Path::new("/nonexistent/retrychain.json")).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read config"));
    }

    #[test]
    fn load_run_config_parses_file() {
        let path = std::env::temp_dir().join("retrychain-util-config.json");
        std::fs::write(&path, r#"{"maxAttempts": 4, "random_seed": 5}"#).unwrap();
        let cfg = load_run_config(&path).unwrap();
        assert_eq!(cfg.max_attempts, 4);
        assert_eq!(cfg.random_seed, Some(5));
    }
}
