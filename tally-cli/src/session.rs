//! Pick the record source, build the store and run the initial load.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::PathBuf;
use tally_core::{StoreOptions, TaskStore};
use tally_ingest::{
    AnySource, FileSource, HttpSource, LoadError, StaticSource, SyntheticGenerator, load_into,
    source::into_records,
};

use crate::config::Config;

const BUNDLED: &str = include_str!("../data/sample_tasks.json");

/// `--url` / `--file` overrides from the command line.
#[derive(Debug, Clone, Default)]
pub struct SourceOverride {
    pub url: Option<String>,
    pub file: Option<PathBuf>,
}

/// Bundled sample records shipped with the binary.
pub fn bundled_records() -> std::result::Result<Vec<Value>, LoadError> {
    into_records(serde_json::from_str(BUNDLED)?)
}

fn pick_source(cfg: &Config, over: &SourceOverride) -> Result<AnySource> {
    let url = over.url.clone().or_else(|| cfg.source.url.clone());
    let file = over.file.clone().or_else(|| cfg.source.path.clone());

    if let Some(url) = url {
        return Ok(AnySource::Http(HttpSource::new(url)?));
    }
    if let Some(path) = file {
        return Ok(AnySource::File(FileSource::new(path)));
    }
    let records = bundled_records().context("bundled sample tasks")?;
    Ok(AnySource::Static(StaticSource(records)))
}

pub fn generator(cfg: &Config) -> SyntheticGenerator {
    match cfg.source.seed {
        Some(seed) => SyntheticGenerator::seeded(seed),
        None => SyntheticGenerator::new(),
    }
}

/// Build a store and complete its initial load. A load failure does not fail
/// this call; it shows up as `store.error()`.
pub async fn open_store(cfg: &Config, over: &SourceOverride) -> Result<TaskStore> {
    let options = StoreOptions {
        fallback_count: cfg.source.fallback_count,
        bands: cfg.grades,
    };
    let mut store = TaskStore::new().with_options(options);
    let mut fallback = generator(cfg);

    let source = pick_source(cfg, over)?;
    load_into(&mut store, &source, &mut fallback).await;

    if let Some(err) = store.error() {
        tracing::warn!(error = err, "using fallback tasks");
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_sample_parses() {
        let records = bundled_records().unwrap();
        assert_eq!(records.len(), 7);
    }

    #[tokio::test]
    async fn default_config_loads_bundled_sample() {
        let store = open_store(&Config::default(), &SourceOverride::default())
            .await
            .unwrap();
        assert!(!store.is_loading());
        assert_eq!(store.error(), None);
        assert_eq!(store.tasks().len(), 7);

        let tax = store.get("sample-06").unwrap();
        assert_eq!(tax.revenue, 0.0);
        assert_eq!(tax.time_taken, 0.0);
        assert_eq!(tax.priority, tally_core::Priority::Medium);
    }

    #[tokio::test]
    async fn missing_file_reports_error_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.source.fallback_count = 5;
        cfg.source.seed = Some(1);
        let over = SourceOverride {
            url: None,
            file: Some(dir.path().join("tasks.json")),
        };
        let store = open_store(&cfg, &over).await.unwrap();
        assert!(store.error().unwrap().starts_with("read "));
        assert_eq!(store.tasks().len(), 5);
    }
}
