//! Engine configuration.
//!
//! Every field has a serde default drawn from [`crate::constants`], so a
//! partial TOML file (or none at all) yields a working configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants;
use crate::errors::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum normalized confidence for a category to be reported.
    pub confidence_threshold: f64,
    /// Bounded classifier result-cache capacity (entries).
    pub classify_cache_capacity: u64,
    /// Scanner chunk size in bytes.
    pub chunk_size: usize,
    /// Scanner overlap in bytes.
    pub chunk_overlap: usize,
    /// Inputs larger than this many bytes use the parallel scan path.
    pub parallel_threshold: u64,
    /// Optional cap on total raw matches; reaching it cancels the scan
    /// cooperatively.
    pub max_matches: Option<usize>,
    /// TTL for template cache entries, in seconds.
    pub template_ttl_secs: u64,
    /// Capacity of each template cache level (entries).
    pub template_cache_capacity: u64,
    /// Debounce window for template change events, in milliseconds.
    pub debounce_window_ms: u64,
    /// Template source directories; later paths shadow earlier ones by name.
    pub template_dirs: Vec<PathBuf>,
    /// User-writable template directory; its templates load under the
    /// `user.` namespace.
    pub user_template_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: constants::DEFAULT_CONFIDENCE_THRESHOLD,
            classify_cache_capacity: constants::CLASSIFY_CACHE_CAPACITY,
            chunk_size: constants::DEFAULT_CHUNK_SIZE,
            chunk_overlap: constants::DEFAULT_CHUNK_OVERLAP,
            parallel_threshold: constants::PARALLEL_SCAN_THRESHOLD,
            max_matches: None,
            template_ttl_secs: constants::TEMPLATE_CACHE_TTL_SECS,
            template_cache_capacity: constants::TEMPLATE_CACHE_CAPACITY,
            debounce_window_ms: constants::DEBOUNCE_WINDOW_MS,
            template_dirs: Vec::new(),
            user_template_dir: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn template_ttl(&self) -> Duration {
        Duration::from_secs(self.template_ttl_secs)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.confidence_threshold, 0.3);
        assert_eq!(cfg.chunk_overlap, 1024);
        assert!(cfg.max_matches.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "confidence_threshold = 0.5").unwrap();
        writeln!(file, "chunk_size = 4096").unwrap();

        let cfg = EngineConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(cfg.confidence_threshold, 0.5);
        assert_eq!(cfg.chunk_size, 4096);
        // Untouched fields keep their defaults
        assert_eq!(cfg.template_ttl_secs, 3600);
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chunk_size = \"not a number\"").unwrap();
        assert!(matches!(
            EngineConfig::from_toml_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
