//! Two-level template cache.
//!
//! Level one holds resolved template bodies, level two holds compiled
//! rendering units. Both are keyed by template name with the version
//! embedded in the entry: a lookup with a different version misses and
//! evicts, so version bumps need no key bookkeeping. TTL expiry defends
//! against stale entries if the dependency graph ever misses an edge.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tracing::trace;

use crate::render::{CompiledReport, ResolvedTemplate};

#[derive(Clone)]
struct Versioned<T> {
    version: u64,
    value: T,
}

pub struct TemplateCache {
    resolved: Cache<String, Versioned<Arc<ResolvedTemplate>>>,
    compiled: Cache<String, Versioned<Arc<CompiledReport>>>,
}

impl TemplateCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            resolved: build_cache(capacity, ttl),
            compiled: build_cache(capacity, ttl),
        }
    }

    pub fn get_resolved(&self, name: &str, version: u64) -> Option<Arc<ResolvedTemplate>> {
        lookup(&self.resolved, name, version)
    }

    pub fn put_resolved(&self, name: &str, version: u64, value: Arc<ResolvedTemplate>) {
        self.resolved
            .insert(name.to_string(), Versioned { version, value });
    }

    pub fn get_compiled(&self, name: &str, version: u64) -> Option<Arc<CompiledReport>> {
        lookup(&self.compiled, name, version)
    }

    pub fn put_compiled(&self, name: &str, version: u64, value: Arc<CompiledReport>) {
        self.compiled
            .insert(name.to_string(), Versioned { version, value });
    }

    /// Drop both levels for every name in `names` (a dependents closure,
    /// not just the changed template).
    pub fn invalidate_all<S: AsRef<str>>(&self, names: &[S]) {
        for name in names {
            let name = name.as_ref();
            trace!(name, "invalidating cached template");
            self.resolved.invalidate(name);
            self.compiled.invalidate(name);
        }
    }
}

fn build_cache<T>(capacity: u64, ttl: Duration) -> Cache<String, Versioned<T>>
where
    T: Clone + Send + Sync + 'static,
{
    Cache::builder()
        .max_capacity(capacity)
        .time_to_live(ttl)
        .build()
}

fn lookup<T>(cache: &Cache<String, Versioned<T>>, name: &str, version: u64) -> Option<T>
where
    T: Clone + Send + Sync + 'static,
{
    let entry = cache.get(name)?;
    if entry.version == version {
        Some(entry.value)
    } else {
        cache.invalidate(name);
        None
    }
}
