//! Keyed storage with memoized resolution.
//!
//! Every key maps to an [`Entry`]: either a value that is ready, or a
//! [`Reference`] that is resolved through the container's [`Resolver`] the first
//! time the key is read. A successful resolution replaces the entry for good; a
//! failed one leaves it unresolved so the next read tries again.
//!
//! The internal lock is held only to look an entry up and to store a result,
//! never while the resolver runs, so resolvers are free to read from or register
//! into the same container.

use std::{
    borrow::Borrow,
    fmt,
    hash::Hash,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::{
    error::{Origin, RegistryError, RegistryResult},
    reference::Reference,
    resolver::Resolver,
};

/// Bounds every registry key satisfies.
pub trait Key: Eq + Hash + Clone + fmt::Debug + fmt::Display + Send + Sync + 'static {}

impl<T> Key for T where T: Eq + Hash + Clone + fmt::Debug + fmt::Display + Send + Sync + 'static {}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry<V> {
    Unresolved(Reference),
    Resolved(V),
}

impl<V> Entry<V> {
    pub fn state(&self) -> EntryState {
        match self {
            Entry::Unresolved(_) => EntryState::Unresolved,
            Entry::Resolved(_) => EntryState::Resolved,
        }
    }

    pub fn reference(&self) -> Option<&Reference> {
        match self {
            Entry::Unresolved(reference) => Some(reference),
            Entry::Resolved(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum EntryState {
    Unresolved,
    Resolved,
}

/// What a caller binds a key to.
#[derive(Debug, Clone, PartialEq)]
pub enum Target<V> {
    /// A value that is stored as-is.
    Instance(V),
    /// A `location:member` string, parsed at registration.
    Reference(String),
}

impl<V> Target<V> {
    pub fn instance(value: V) -> Self {
        Target::Instance(value)
    }

    pub fn reference(raw: impl Into<String>) -> Self {
        Target::Reference(raw.into())
    }
}

impl<V> From<Reference> for Target<V> {
    fn from(reference: Reference) -> Self {
        Target::Reference(reference.to_string())
    }
}

pub struct LazyContainer<K, V> {
    origin: Origin,
    entries: RwLock<IndexMap<K, Entry<V>>>,
    resolver: Arc<dyn Resolver<V>>,
    eager_load: AtomicBool,
}

impl<K, V> LazyContainer<K, V>
where
    K: Key,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(resolver: Arc<dyn Resolver<V>>) -> Self {
        Self::with_origin(Origin::default(), resolver)
    }

    pub(crate) fn with_origin(origin: Origin, resolver: Arc<dyn Resolver<V>>) -> Self {
        Self {
            origin,
            entries: RwLock::new(IndexMap::new()),
            resolver,
            eager_load: AtomicBool::new(false),
        }
    }

    pub fn with_eager_load(self, eager_load: bool) -> Self {
        self.set_eager_load(eager_load);
        self
    }

    /// Default used by [`register_lazy`](Self::register_lazy). Existing entries are untouched.
    pub fn set_eager_load(&self, eager_load: bool) {
        self.eager_load.store(eager_load, Ordering::Relaxed);
    }

    pub fn eager_load(&self) -> bool {
        self.eager_load.load(Ordering::Relaxed)
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn resolver(&self) -> Arc<dyn Resolver<V>> {
        self.resolver.clone()
    }

    /// Binds `key`, replacing whatever was there.
    ///
    /// A [`Target::Reference`] is parsed first and fails with
    /// [`RegistryError::InvalidRegistration`] if malformed. With `eager` the
    /// reference is resolved before returning; if that fails nothing is stored.
    pub fn register(&self, key: K, target: Target<V>, eager: bool) -> RegistryResult<()> {
        let entry = match target {
            Target::Instance(value) => {
                debug!(key = %key, origin = ?self.origin.name(), "registered instance");
                Entry::Resolved(value)
            }
            Target::Reference(raw) => {
                let reference =
                    Reference::parse(&raw).map_err(|cause| RegistryError::InvalidRegistration {
                        origin: self.origin.clone(),
                        key: key.to_string(),
                        source: Box::new(cause),
                    })?;
                if eager {
                    let value = self.resolve(&key, &reference)?;
                    debug!(key = %key, reference = %reference, "registered eagerly");
                    Entry::Resolved(value)
                } else {
                    debug!(key = %key, reference = %reference, "registered lazily");
                    Entry::Unresolved(reference)
                }
            }
        };

        self.write().insert(key, entry);
        Ok(())
    }

    pub fn register_instance(&self, key: K, value: V) {
        self.write().insert(key, Entry::Resolved(value));
    }

    /// Registers a reference, resolving immediately only if the container is eager.
    pub fn register_lazy(&self, key: K, reference: impl Into<String>) -> RegistryResult<()> {
        self.register(key, Target::reference(reference), self.eager_load())
    }

    pub fn register_eager(&self, key: K, reference: impl Into<String>) -> RegistryResult<()> {
        self.register(key, Target::reference(reference), true)
    }

    /// Bulk [`register_lazy`](Self::register_lazy). Stops at the first failure;
    /// pairs before it stay registered.
    pub fn extend_lazy<I, S>(&self, entries: I) -> RegistryResult<()>
    where
        I: IntoIterator<Item = (K, S)>,
        S: Into<String>,
    {
        for (key, reference) in entries {
            self.register_lazy(key, reference)?;
        }
        Ok(())
    }

    pub fn get<Q>(&self, key: &Q) -> RegistryResult<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Display + ?Sized,
    {
        let reference = match self.read().get(key) {
            None => {
                return Err(RegistryError::KeyNotFound {
                    origin: self.origin.clone(),
                    key: key.to_string(),
                })
            }
            Some(Entry::Resolved(value)) => {
                trace!(key = %key, "cache hit");
                return Ok(value.clone());
            }
            Some(Entry::Unresolved(reference)) => reference.clone(),
        };

        let value = self.resolve(key, &reference)?;

        let mut entries = self.write();
        match entries.get_mut(key) {
            // 競合した場合は先に格納された値を返す
            Some(Entry::Resolved(cached)) => Ok(cached.clone()),
            Some(entry) if entry.reference() == Some(&reference) => {
                *entry = Entry::Resolved(value.clone());
                Ok(value)
            }
            _ => {
                debug!(key = %key, "entry replaced during resolution, result not cached");
                Ok(value)
            }
        }
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.read().contains_key(key)
    }

    pub fn state<Q>(&self, key: &Q) -> Option<EntryState>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.read().get(key).map(Entry::state)
    }

    /// Registered keys in insertion order.
    pub fn keys(&self) -> Vec<K> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn resolve<Q>(&self, key: &Q, reference: &Reference) -> RegistryResult<V>
    where
        Q: fmt::Display + ?Sized,
    {
        debug!(key = %key, reference = %reference, origin = ?self.origin.name(), "resolving");
        self.resolver
            .resolve(reference)
            .map_err(|source| RegistryError::Resolution {
                origin: self.origin.clone(),
                key: key.to_string(),
                reference: reference.clone(),
                source,
            })
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<K, Entry<V>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<K, Entry<V>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
