//! Raw record sources for the initial load.
//!
//! A source yields the untyped JSON array described by the input contract;
//! it does no normalization. Anything that prevents getting an array at all
//! is a `LoadError`.

use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of task records, got {0}")]
    NotAnArray(&'static str),
}

pub trait RecordSource {
    /// Short label for logs ("https://...", "tasks.json", ...).
    fn describe(&self) -> String;

    fn fetch(&self) -> impl Future<Output = Result<Vec<Value>, LoadError>> + Send;
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Unwrap the top-level array.
pub fn into_records(v: Value) -> Result<Vec<Value>, LoadError> {
    match v {
        Value::Array(items) => Ok(items),
        other => Err(LoadError::NotAnArray(kind(&other))),
    }
}

/// Remote record list fetched with a GET.
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

impl RecordSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Vec<Value>, LoadError> {
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        let body: Value = resp.json().await?;
        into_records(body)
    }
}

/// Bundled record list on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<Value>, LoadError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| LoadError::Io {
                path: self.path.clone(),
                source,
            })?;
        into_records(serde_json::from_str(&text)?)
    }
}

/// Records already in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource(pub Vec<Value>);

impl RecordSource for StaticSource {
    fn describe(&self) -> String {
        format!("{} in-memory records", self.0.len())
    }

    async fn fetch(&self) -> Result<Vec<Value>, LoadError> {
        Ok(self.0.clone())
    }
}

/// Source picked at runtime from configuration.
#[derive(Debug, Clone)]
pub enum AnySource {
    Http(HttpSource),
    File(FileSource),
    Static(StaticSource),
}

impl RecordSource for AnySource {
    fn describe(&self) -> String {
        match self {
            AnySource::Http(s) => s.describe(),
            AnySource::File(s) => s.describe(),
            AnySource::Static(s) => s.describe(),
        }
    }

    async fn fetch(&self) -> Result<Vec<Value>, LoadError> {
        match self {
            AnySource::Http(s) => s.fetch().await,
            AnySource::File(s) => s.fetch().await,
            AnySource::Static(s) => s.fetch().await,
        }
    }
}
