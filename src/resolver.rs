//! The resolution boundary.
//!
//! Containers never know how a [`Reference`] becomes a value; they call a
//! [`Resolver`] and cache whatever it returns. Any `Fn(&Reference) -> Result<V, BoxError>`
//! is a resolver, and [`ModuleResolver`] provides an in-process module table whose
//! modules are loaded on first use.

use std::{collections::HashMap, sync::Arc};

use dashmap::DashMap;
use tracing::debug;

use crate::{
    error::{BoxError, ResolveError},
    reference::Reference,
};

/// Turns a reference into a value. Called at most once per successful resolution.
pub trait Resolver<V>: Send + Sync {
    fn resolve(&self, reference: &Reference) -> Result<V, BoxError>;
}

impl<V, F> Resolver<V> for F
where
    F: Fn(&Reference) -> Result<V, BoxError> + Send + Sync,
{
    fn resolve(&self, reference: &Reference) -> Result<V, BoxError> {
        self(reference)
    }
}

/// Resolver that fails every reference. Used where no modules have been provided.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl<V> Resolver<V> for NoResolver {
    fn resolve(&self, reference: &Reference) -> Result<V, BoxError> {
        Err(Box::new(ResolveError::ModuleNotFound {
            location: reference.location().to_string(),
        }))
    }
}

/// Named members exported by one location.
#[derive(Debug, Clone)]
pub struct Module<V> {
    members: HashMap<String, V>,
}

impl<V> Default for Module<V> {
    fn default() -> Self {
        Self {
            members: HashMap::new(),
        }
    }
}

impl<V> Module<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, member: impl Into<String>, value: V) -> Self {
        self.members.insert(member.into(), value);
        self
    }

    pub fn insert(&mut self, member: impl Into<String>, value: V) {
        self.members.insert(member.into(), value);
    }

    pub fn get(&self, member: &str) -> Option<&V> {
        self.members.get(member)
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }
}

type Loader<V> = Arc<dyn Fn() -> Result<Module<V>, BoxError> + Send + Sync>;

/// In-process module table.
///
/// A location is either inserted already loaded or provided as a loader that runs
/// the first time any of its members is resolved. A loaded module is cached; a
/// failed load is not, so the next resolution runs the loader again.
pub struct ModuleResolver<V> {
    loaders: DashMap<String, Loader<V>>,
    loaded: DashMap<String, Arc<Module<V>>>,
}

impl<V> Default for ModuleResolver<V> {
    fn default() -> Self {
        Self {
            loaders: DashMap::new(),
            loaded: DashMap::new(),
        }
    }
}

impl<V: Clone + Send + Sync> ModuleResolver<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provide<F>(&self, location: impl Into<String>, loader: F)
    where
        F: Fn() -> Result<Module<V>, BoxError> + Send + Sync + 'static,
    {
        let location = location.into();
        debug!(location = %location, "module provided");
        self.loaders.insert(location.clone(), Arc::new(loader));
        self.loaded.remove(&location);
    }

    pub fn insert_module(&self, location: impl Into<String>, module: Module<V>) {
        let location = location.into();
        debug!(location = %location, "module inserted");
        self.loaders.remove(&location);
        self.loaded.insert(location, Arc::new(module));
    }

    pub fn is_loaded(&self, location: &str) -> bool {
        self.loaded.contains_key(location)
    }

    pub fn contains(&self, location: &str) -> bool {
        self.loaded.contains_key(location) || self.loaders.contains_key(location)
    }

    fn module(&self, location: &str) -> Result<Arc<Module<V>>, ResolveError> {
        if let Some(module) = self.loaded.get(location) {
            return Ok(module.value().clone());
        }

        // loader が再入しても詰まらないよう、ロック外で実行する
        let loader = self
            .loaders
            .get(location)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ResolveError::ModuleNotFound {
                location: location.to_string(),
            })?;

        debug!(location = %location, "loading module");
        let module = Arc::new(loader().map_err(|source| ResolveError::LoadFailed {
            location: location.to_string(),
            source,
        })?);

        // 読み込み中に provide() で差し替えられていたら古いモジュールはキャッシュしない
        match self.loaders.get(location) {
            Some(current) if Arc::ptr_eq(current.value(), &loader) => Ok(self
                .loaded
                .entry(location.to_string())
                .or_insert(module)
                .value()
                .clone()),
            _ => {
                debug!(location = %location, "loader replaced during load, module not cached");
                Ok(module)
            }
        }
    }
}

impl<V: Clone + Send + Sync> Resolver<V> for ModuleResolver<V> {
    fn resolve(&self, reference: &Reference) -> Result<V, BoxError> {
        let module = self.module(reference.location())?;
        module
            .get(reference.member())
            .cloned()
            .ok_or_else(|| {
                Box::new(ResolveError::MemberNotFound {
                    location: reference.location().to_string(),
                    member: reference.member().to_string(),
                }) as BoxError
            })
    }
}
