//! Record definition registry and process-wide cache.
//!
//! Definitions are server-defined contracts fetched on first reference and
//! kept for the life of the process; there is no eviction. Decoding never
//! fetches mid-record: [`SchemaCache::resolve_closure`] pulls a record
//! type's definition together with every nested record type it reaches, and
//! the decoders then work synchronously against that snapshot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::SchemaError;
use crate::schema::types::{RecordDef, TypeCode};

/// Abstraction over the remote definition endpoint.
///
/// The production implementation POSTs to the `definition` API; tests
/// substitute an in-memory table.
#[async_trait]
pub trait DefinitionSource: Send + Sync {
    /// Fetch the definition for one record type.
    ///
    /// # Errors
    /// `SchemaError::Unavailable` if the endpoint cannot be reached or
    /// answers with something other than a definition;
    /// `SchemaError::Malformed` if the definition does not parse.
    async fn fetch_definition(&self, record_type: &str) -> Result<RecordDef, SchemaError>;
}

/// Process-wide cache of record definitions.
///
/// Shared across concurrent requests via `Arc`. Concurrent resolution of
/// the same never-seen type may fetch twice; definitions are immutable and
/// idempotent, so the cache converges to a single entry either way and the
/// duplicate fetch is accepted rather than serialized.
pub struct SchemaCache {
    source: Arc<dyn DefinitionSource>,
    defs: tokio::sync::RwLock<HashMap<String, Arc<RecordDef>>>,
    defs_from_cache: AtomicU64,
    defs_fetched: AtomicU64,
}

impl SchemaCache {
    /// Create a cache backed by the given definition source.
    pub fn new(source: Arc<dyn DefinitionSource>) -> Self {
        Self {
            source,
            defs: tokio::sync::RwLock::new(HashMap::new()),
            defs_from_cache: AtomicU64::new(0),
            defs_fetched: AtomicU64::new(0),
        }
    }

    /// Resolve one record type's definition, fetching it if unseen.
    ///
    /// # Errors
    /// Propagates `SchemaError` from the definition source.
    pub async fn resolve(&self, record_type: &str) -> Result<Arc<RecordDef>, SchemaError> {
        if let Some(def) = self.defs.read().await.get(record_type) {
            self.defs_from_cache.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(def));
        }

        self.defs_fetched.fetch_add(1, Ordering::Relaxed);
        debug!(record_type, "fetching record definition");
        let fetched = Arc::new(self.source.fetch_definition(record_type).await?);

        // A racing fetch may have inserted already; first writer wins so
        // every caller sees one structurally equal definition.
        let mut defs = self.defs.write().await;
        let def = defs
            .entry(record_type.to_string())
            .or_insert(fetched);
        Ok(Arc::clone(def))
    }

    /// Resolve a record type plus every nested record type reachable from
    /// it, returning an immutable snapshot for synchronous decoding.
    pub async fn resolve_closure(&self, record_type: &str) -> Result<SchemaSet, SchemaError> {
        let mut defs = HashMap::new();
        let mut pending = vec![record_type.to_string()];

        while let Some(name) = pending.pop() {
            if defs.contains_key(&name) {
                continue;
            }
            let def = self.resolve(&name).await?;
            for (_, field) in def.fields() {
                if TypeCode::from_name(&field.type_name).is_none()
                    && !defs.contains_key(&field.type_name)
                {
                    pending.push(field.type_name.clone());
                }
            }
            defs.insert(name, def);
        }

        Ok(SchemaSet { defs })
    }

    /// Warm the cache with a list of well-known record types.
    ///
    /// # Errors
    /// Fails on the first unresolvable type; previously resolved types stay
    /// cached.
    pub async fn prefetch(&self, record_types: &[&str]) -> Result<(), SchemaError> {
        for record_type in record_types {
            self.resolve_closure(record_type).await?;
        }
        Ok(())
    }

    /// Number of resolutions served from the cache.
    pub fn defs_from_cache(&self) -> u64 {
        self.defs_from_cache.load(Ordering::Relaxed)
    }

    /// Number of resolutions that went to the definition source.
    pub fn defs_fetched(&self) -> u64 {
        self.defs_fetched.load(Ordering::Relaxed)
    }

    /// Number of distinct record types currently cached.
    pub async fn len(&self) -> usize {
        self.defs.read().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.defs.read().await.is_empty()
    }
}

/// An immutable set of resolved definitions covering one record type and
/// all record types nested under it.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    defs: HashMap<String, Arc<RecordDef>>,
}

impl SchemaSet {
    /// Build a set directly from definitions. Mainly useful in tests.
    pub fn from_defs(defs: impl IntoIterator<Item = RecordDef>) -> Self {
        Self {
            defs: defs
                .into_iter()
                .map(|d| (d.type_name().to_string(), Arc::new(d)))
                .collect(),
        }
    }

    /// Look up a resolved definition by record type name.
    pub fn get(&self, record_type: &str) -> Option<&RecordDef> {
        self.defs.get(record_type).map(Arc::as_ref)
    }

    /// Whether the set holds a definition for the given type.
    pub fn contains(&self, record_type: &str) -> bool {
        self.defs.contains_key(record_type)
    }
}
