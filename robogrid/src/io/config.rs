//! Robogrid configuration stored in `robogrid.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::program::DEFAULT_REPEAT_COUNT;
use crate::engine::interpreter::DEFAULT_MAX_UNITS;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "robogrid.toml";

/// Robogrid configuration (TOML).
///
/// Missing fields fall back to the reference game's values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RobogridConfig {
    /// Pause between highlighting a step and applying it, in milliseconds.
    pub step_delay_ms: u64,

    /// Refuse to run programs that expand to more units than this.
    pub max_expanded_units: usize,

    /// Repeat count for loops written without one.
    pub default_repeat_count: u32,

    /// Loop counts offered to the learner. The CLI rejects any other count,
    /// including a `default_repeat_count` outside this list.
    pub loop_count_choices: Vec<u32>,

    /// Level catalog to use instead of the built-in one.
    pub catalog: Option<PathBuf>,
}

impl Default for RobogridConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: 500,
            max_expanded_units: DEFAULT_MAX_UNITS,
            default_repeat_count: DEFAULT_REPEAT_COUNT,
            loop_count_choices: vec![2, 3, 4, 5],
            catalog: None,
        }
    }
}

impl RobogridConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_expanded_units == 0 {
            return Err(anyhow!("max_expanded_units must be > 0"));
        }
        if self.default_repeat_count == 0 {
            return Err(anyhow!("default_repeat_count must be >= 1"));
        }
        if self.loop_count_choices.is_empty() {
            return Err(anyhow!("loop_count_choices must be a non-empty array"));
        }
        if self.loop_count_choices.contains(&0) {
            return Err(anyhow!("loop_count_choices must all be >= 1"));
        }
        Ok(())
    }

    /// True if `count` is one of the loop counts offered to the learner.
    pub fn is_loop_choice(&self, count: u32) -> bool {
        self.loop_count_choices.contains(&count)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `RobogridConfig::default()`.
pub fn load_config(path: &Path) -> Result<RobogridConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        let cfg = RobogridConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RobogridConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate().with_context(|| format!("validate {}", path.display()))?;
    debug!(path = %path.display(), ?cfg, "config loaded");
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &RobogridConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, RobogridConfig::default());
        assert_eq!(cfg.step_delay_ms, 500);
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("robogrid.toml");
        let cfg = RobogridConfig {
            step_delay_ms: 0,
            catalog: Some(PathBuf::from("levels.json")),
            ..RobogridConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("robogrid.toml");
        fs::write(&path, "step_delay_ms = 100\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.step_delay_ms, 100);
        assert_eq!(cfg.loop_count_choices, vec![2, 3, 4, 5]);
        assert!(cfg.is_loop_choice(5));
        assert!(!cfg.is_loop_choice(6));
    }

    #[test]
    fn zero_repeat_count_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("robogrid.toml");
        fs::write(&path, "default_repeat_count = 0\n").expect("write");
        let err = load_config(&path).expect_err("invalid");
        assert!(format!("{:#}", err).contains("default_repeat_count"));
    }
}
