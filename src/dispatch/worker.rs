use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::http::context::ResponseContext;

/// Boxed future returned by workers and script executors.
pub type WorkerFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// A pluggable handler that produces a response instead of a static file.
pub trait Worker: Send + Sync {
    fn handle<'a>(&'a self, ctx: &'a mut ResponseContext) -> WorkerFuture<'a>;
}

/// Constructor registered under an implementation name.
pub type WorkerFactory = fn() -> Box<dyn Worker>;

/// Implementation name -> constructor.
///
/// Configuration names implementations by string; this table is what turns
/// those names into workers, both for the static path map built at startup
/// and for the per-call `/ext/<Name>` lookups.
#[derive(Clone, Default)]
pub struct WorkerCatalog {
    factories: HashMap<String, WorkerFactory>,
}

impl WorkerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, factory: WorkerFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn with(mut self, name: impl Into<String>, factory: WorkerFactory) -> Self {
        self.register(name, factory);
        self
    }

    /// Builds a fresh instance of the named implementation.
    pub fn create(&self, name: &str) -> Option<Box<dyn Worker>> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}
