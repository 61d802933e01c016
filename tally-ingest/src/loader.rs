//! Initial load: fetch raw records from a source and hand them to the store.
//!
//! The store may be shared behind a single async mutex (`SharedStore`), which
//! serializes every mutation. The background load only holds a `Weak`
//! reference while the fetch is in flight, so a store that was dropped in the
//! meantime is simply not written to.

use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use tally_core::{Clock, SystemClock, TaskGenerator, TaskStore};

use crate::source::RecordSource;

pub type SharedStore<C = SystemClock> = Arc<Mutex<TaskStore<C>>>;

pub fn shared<C: Clock>(store: TaskStore<C>) -> SharedStore<C> {
    Arc::new(Mutex::new(store))
}

/// Load into a store owned by the caller.
pub async fn load_into<S, G, C>(store: &mut TaskStore<C>, source: &S, generator: &mut G)
where
    S: RecordSource,
    G: TaskGenerator,
    C: Clock,
{
    tracing::debug!(source = %source.describe(), "fetching task records");
    let outcome = source.fetch().await.map_err(|e| e.to_string());
    store.finish_load(outcome, generator);
}

/// Load into a shared store. Returns `false` when the store was dropped
/// before the fetch resolved.
pub async fn load_shared<S, G, C>(
    store: Weak<Mutex<TaskStore<C>>>,
    source: &S,
    generator: &mut G,
) -> bool
where
    S: RecordSource,
    G: TaskGenerator,
    C: Clock,
{
    tracing::debug!(source = %source.describe(), "fetching task records");
    let outcome = source.fetch().await.map_err(|e| e.to_string());

    let Some(store) = store.upgrade() else {
        tracing::debug!("task store dropped before load finished");
        return false;
    };
    store.lock().await.finish_load(outcome, generator);
    true
}

/// Run `load_shared` on the runtime.
pub fn spawn_load<S, G, C>(store: &SharedStore<C>, source: S, mut generator: G) -> JoinHandle<bool>
where
    S: RecordSource + Send + Sync + 'static,
    G: TaskGenerator + Send + 'static,
    C: Clock + Send + 'static,
{
    let weak = Arc::downgrade(store);
    tokio::spawn(async move { load_shared(weak, &source, &mut generator).await })
}
