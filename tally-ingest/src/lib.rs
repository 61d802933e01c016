//! tally-ingest: where the initial task records come from (HTTP, a JSON file,
//! memory), the synthetic fallback generator, and the async initial load.

pub mod generator;
pub mod loader;
pub mod source;

pub use generator::SyntheticGenerator;
pub use loader::{SharedStore, load_into, load_shared, shared, spawn_load};
pub use source::{AnySource, FileSource, HttpSource, LoadError, RecordSource, StaticSource};
