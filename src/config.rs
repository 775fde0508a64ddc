// src/config.rs
//! Capture configuration and startup validation

use std::path::PathBuf;
use std::time::Duration;

use crate::backends::HelperProgram;
use crate::error::{CaptureError, Result};

pub const DEFAULT_INTERVAL_SECS: u64 = 2;
pub const DEFAULT_PREFIX: &str = "clip";
pub const DEFAULT_HELPER_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_IMAGE_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/bmp"];

/// Which clipboard backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BackendChoice {
    /// Helper program on Linux, OS bindings elsewhere
    #[default]
    Auto,
    /// OS clipboard bindings only
    Native,
    /// OS bindings for text, external helper for images and files
    Helper,
}

/// Everything the capture loop needs from the outside world
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Directory that receives captured files
    pub target_dir: PathBuf,

    /// Sleep between two clipboard checks
    pub interval: Duration,

    /// File name prefix, as in `clip_20121212_120102.txt`
    pub prefix: String,

    /// Image MIME types the helper backend will read, in preference order
    pub image_types: Vec<String>,

    pub backend: BackendChoice,

    /// Helper program override; detected from the session when `None`
    pub helper: Option<HelperProgram>,

    /// Upper bound on a single helper invocation
    pub helper_timeout: Duration,
}

impl CaptureConfig {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            prefix: DEFAULT_PREFIX.to_string(),
            image_types: DEFAULT_IMAGE_TYPES.iter().map(|t| t.to_string()).collect(),
            backend: BackendChoice::default(),
            helper: None,
            helper_timeout: Duration::from_secs(DEFAULT_HELPER_TIMEOUT_SECS),
        }
    }

    /// Startup checks. Failing here means the loop never starts.
    pub fn validate(&self) -> Result<()> {
        if self.interval < Duration::from_secs(1) {
            return Err(CaptureError::InvalidInterval);
        }
        if !self.target_dir.exists() {
            return Err(CaptureError::InvalidTargetDir(self.target_dir.clone()));
        }
        if !self.target_dir.is_dir() {
            return Err(CaptureError::NotADirectory(self.target_dir.clone()));
        }
        Ok(())
    }
}

/// Directory to use when none was given: the user's Pictures directory if
/// it exists, otherwise the home directory.
pub fn candidate_target_dir() -> Option<PathBuf> {
    candidate_from(dirs::picture_dir(), dirs::home_dir())
}

fn candidate_from(pictures: Option<PathBuf>, home: Option<PathBuf>) -> Option<PathBuf> {
    pictures
        .filter(|dir| dir.is_dir())
        .or_else(|| home.filter(|dir| dir.is_dir()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CaptureConfig::new("/tmp");
        assert_eq!(config.interval, Duration::from_secs(2));
        assert_eq!(config.prefix, "clip");
        assert_eq!(config.image_types, vec!["image/png", "image/jpeg", "image/bmp"]);
        assert_eq!(config.backend, BackendChoice::Auto);
    }

    #[test]
    fn test_validate_accepts_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CaptureConfig::new(dir.path()).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = CaptureConfig::new(dir.path().join("missing")).validate().unwrap_err();
        assert!(matches!(err, CaptureError::InvalidTargetDir(_)));
    }

    #[test]
    fn test_validate_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();
        let err = CaptureConfig::new(&file).validate().unwrap_err();
        assert!(matches!(err, CaptureError::NotADirectory(_)));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CaptureConfig::new(dir.path());
        config.interval = Duration::ZERO;
        assert!(matches!(config.validate(), Err(CaptureError::InvalidInterval)));
    }

    #[test]
    fn test_candidate_prefers_pictures() {
        let home = tempfile::tempdir().unwrap();
        let pictures = home.path().join("Pictures");

        let fallback = candidate_from(Some(pictures.clone()), Some(home.path().to_path_buf()));
        assert_eq!(fallback.as_deref(), Some(home.path()));

        std::fs::create_dir(&pictures).unwrap();
        let chosen = candidate_from(Some(pictures.clone()), Some(home.path().to_path_buf()));
        assert_eq!(chosen, Some(pictures));

        assert_eq!(candidate_from(None, None), None);
    }
}
