use std::{borrow::Borrow, fmt, hash::Hash, sync::Arc};

use crate::{
    container::{EntryState, Key, LazyContainer, Target},
    error::{Origin, RegistryResult},
    resolver::Resolver,
};

/// A [`LazyContainer`] with a name.
///
/// The name only shows up in diagnostics: every error raised through a registry
/// reads `... in registry '<name>'`.
pub struct Registry<K, V> {
    name: String,
    entries: LazyContainer<K, V>,
}

impl<K, V> Registry<K, V>
where
    K: Key,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, resolver: Arc<dyn Resolver<V>>) -> Self {
        let name = name.into();
        Self {
            entries: LazyContainer::with_origin(Origin::registry(name.clone()), resolver),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_eager_load(self, eager_load: bool) -> Self {
        self.entries.set_eager_load(eager_load);
        self
    }

    pub fn set_eager_load(&self, eager_load: bool) {
        self.entries.set_eager_load(eager_load);
    }

    pub fn eager_load(&self) -> bool {
        self.entries.eager_load()
    }

    pub fn register(&self, key: K, target: Target<V>, eager: bool) -> RegistryResult<()> {
        self.entries.register(key, target, eager)
    }

    pub fn register_instance(&self, key: K, value: V) {
        self.entries.register_instance(key, value)
    }

    pub fn register_lazy(&self, key: K, reference: impl Into<String>) -> RegistryResult<()> {
        self.entries.register_lazy(key, reference)
    }

    pub fn register_eager(&self, key: K, reference: impl Into<String>) -> RegistryResult<()> {
        self.entries.register_eager(key, reference)
    }

    pub fn extend_lazy<I, S>(&self, entries: I) -> RegistryResult<()>
    where
        I: IntoIterator<Item = (K, S)>,
        S: Into<String>,
    {
        self.entries.extend_lazy(entries)
    }

    pub fn get<Q>(&self, key: &Q) -> RegistryResult<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains(key)
    }

    pub fn state<Q>(&self, key: &Q) -> Option<EntryState>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.state(key)
    }

    pub fn keys(&self) -> Vec<K> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolver(&self) -> Arc<dyn Resolver<V>> {
        self.entries.resolver()
    }
}

impl<K, V> fmt::Debug for Registry<K, V>
where
    K: Key,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("keys", &self.keys())
            .finish()
    }
}
