use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tally_core::GradeBands;

use crate::state::ensure_tally_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceSection,
    pub grades: GradeBands,
    pub display: DisplaySection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    /// Remote JSON array of task records.
    pub url: Option<String>,
    /// Local JSON array of task records. Ignored when `url` is set.
    pub path: Option<PathBuf>,
    /// Synthetic tasks to generate when the load yields none.
    pub fallback_count: usize,
    /// Fixed seed for the synthetic generator.
    pub seed: Option<u64>,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            url: None,
            path: None,
            fallback_count: 50,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySection {
    /// IANA zone for rendering timestamps.
    pub timezone: String,
    /// Seconds a deletion stays undoable in the shell.
    pub undo_window_secs: u64,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            undo_window_secs: 10,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_tally_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
    cfg.grades
        .validate()
        .with_context(|| format!("[grades] in {}", p.display()))?;
    tally_core::time::parse_tz(&cfg.display.timezone)
        .with_context(|| format!("[display] in {}", p.display()))?;
    Ok(cfg)
}

pub fn save_config(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}
