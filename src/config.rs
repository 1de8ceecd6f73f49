//! Run configuration, read from an optional TOML file.
//!
//! Every key is optional; a missing file section falls back to the defaults
//! below. CLI flags are applied on top in `main`.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root for per-month artifacts (`<output_dir>/<MONTH>/charts`).
    pub output_dir: PathBuf,
    pub insights: InsightSettings,
    pub smoother: SmootherConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("reports"),
            insights: InsightSettings::default(),
            smoother: SmootherConfig::default(),
        }
    }
}

/// Thresholds used by the narrative rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightSettings {
    /// How many issue types the "Top issues" line lists.
    pub top_n: usize,
    /// Top engineer share (0..1) at which workload counts as concentrated.
    pub concentration_threshold: f64,
    /// Closure rate (%) below which a follow-up warning is recommended.
    pub closure_target: f64,
    pub recommendations: bool,
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            top_n: 3,
            concentration_threshold: 0.60,
            closure_target: 95.0,
            recommendations: true,
        }
    }
}

/// External phrasing command. Absent `command` means no smoothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmootherConfig {
    pub command: Option<String>,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_secs: 20,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = Config::parse("").unwrap();
        assert_eq!(cfg.output_dir, PathBuf::from("reports"));
        assert_eq!(cfg.insights.top_n, 3);
        assert!(cfg.insights.recommendations);
        assert!(cfg.smoother.command.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = Config::parse(
            r#"
            output_dir = "out"
            [insights]
            closure_target = 90.0
            [smoother]
            command = "smooth"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.output_dir, PathBuf::from("out"));
        assert_eq!(cfg.insights.closure_target, 90.0);
        assert_eq!(cfg.insights.concentration_threshold, 0.60);
        assert_eq!(cfg.smoother.command.as_deref(), Some("smooth"));
        assert_eq!(cfg.smoother.timeout_secs, 20);
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = Config::parse("top_n = [").unwrap_err();
        assert!(matches!(err, crate::error::ReportError::Config(_)));
    }
}
