//! Process-wide defaults.
//!
//! One [`ModuleResolver`] per value type and one [`Namespace`] per key/value type
//! pair, created empty on first use and kept for the life of the process. The
//! global namespace resolves through the global module table of its value type.
//!
//! ```rust
//! use lazyregistry::{global, Module};
//!
//! global::modules::<&'static str>()
//!     .insert_module("json", Module::new().with("dumps", "json.dumps"));
//!
//! let writers = global::namespace::<String, &'static str>().get_or_create("writers");
//! writers.register_lazy("json".to_string(), "json:dumps").unwrap();
//! assert_eq!(writers.get("json").unwrap(), "json.dumps");
//! ```
//!
//! Tests should build their own [`Namespace`] instead; state here is shared by
//! everything in the process.

use std::{
    any::{Any, TypeId},
    sync::Arc,
};

use dashmap::DashMap;
use lazy_static::lazy_static;

use crate::{container::Key, namespace::Namespace, resolver::ModuleResolver};

type Erased = Arc<dyn Any + Send + Sync>;

lazy_static! {
    static ref MODULES: DashMap<TypeId, Erased> = DashMap::new();
    static ref NAMESPACES: DashMap<TypeId, Erased> = DashMap::new();
}

fn get_or_init<T, F>(table: &DashMap<TypeId, Erased>, id: TypeId, init: F) -> Arc<T>
where
    T: Any + Send + Sync,
    F: FnOnce() -> T,
{
    let erased = table
        .entry(id)
        .or_insert_with(|| Arc::new(init()) as Erased)
        .value()
        .clone();

    match erased.downcast::<T>() {
        Ok(typed) => typed,
        // TypeId をキーにしているので型は必ず一致する
        Err(_) => unreachable!("global table entry stored under a foreign TypeId"),
    }
}

/// The process-wide module table for values of type `V`.
pub fn modules<V>() -> Arc<ModuleResolver<V>>
where
    V: Clone + Send + Sync + 'static,
{
    get_or_init(&MODULES, TypeId::of::<V>(), ModuleResolver::<V>::new)
}

/// The process-wide namespace for registries keyed by `K` holding `V`.
pub fn namespace<K, V>() -> Arc<Namespace<K, V>>
where
    K: Key,
    V: Clone + Send + Sync + 'static,
{
    get_or_init(&NAMESPACES, TypeId::of::<(K, V)>(), || {
        Namespace::new(modules::<V>())
    })
}
