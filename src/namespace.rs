use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::{container::Key, registry::Registry, resolver::Resolver};

/// Registries grouped by name.
///
/// Asking for an unknown name creates an empty [`Registry`] that shares the
/// namespace's resolver. The same name always hands back the same `Arc`, so
/// registrations made through one handle are visible through every other.
/// Registries are never removed.
pub struct Namespace<K, V> {
    registries: DashMap<String, Arc<Registry<K, V>>>,
    resolver: Arc<dyn Resolver<V>>,
}

impl<K, V> Namespace<K, V>
where
    K: Key,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(resolver: Arc<dyn Resolver<V>>) -> Self {
        Self {
            registries: DashMap::new(),
            resolver,
        }
    }

    pub fn get_or_create(&self, name: &str) -> Arc<Registry<K, V>> {
        if let Some(registry) = self.registries.get(name) {
            return registry.value().clone();
        }

        // entry() はシャード単位でロックされるので同名の同時生成は一つにまとまる
        self.registries
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(registry = %name, "creating registry");
                Arc::new(Registry::new(name, self.resolver.clone()))
            })
            .value()
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Registry<K, V>>> {
        self.registries.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registries.contains_key(name)
    }

    /// Registry names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .registries
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.registries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registries.is_empty()
    }

    pub fn resolver(&self) -> Arc<dyn Resolver<V>> {
        self.resolver.clone()
    }
}
