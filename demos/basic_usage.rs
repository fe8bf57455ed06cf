//! Lazy references, instances, namespaces and eager loading.

use std::sync::Arc;

use lazyregistry::{global, Module, ModuleResolver, Registry, RegistryResult};

type Writer = fn(&str) -> String;

fn json_dumps(s: &str) -> String {
    format!("{:?}", s)
}

fn json_loads(s: &str) -> String {
    s.trim_matches('"').to_string()
}

fn yaml_dump(s: &str) -> String {
    format!("--- {}", s)
}

fn modules() -> ModuleResolver<Writer> {
    let modules = ModuleResolver::new();
    modules.insert_module(
        "json",
        Module::new()
            .with("dumps", json_dumps as Writer)
            .with("loads", json_loads as Writer),
    );
    modules.provide("yaml", || {
        println!("  (loading yaml module)");
        Ok(Module::new().with("dump", yaml_dump as Writer))
    });
    modules
}

fn basic_registry() -> RegistryResult<()> {
    println!("=== Basic registry ===");
    let registry: Registry<&str, Writer> = Registry::new("plugins", Arc::new(modules()));

    registry.register_lazy("json", "json:dumps")?;
    registry.register_lazy("yaml", "yaml:dump")?;

    // only json is ever resolved
    let dumps = registry.get("json")?;
    println!("json -> {}", dumps("hello"));
    Ok(())
}

fn instance_registration() -> RegistryResult<()> {
    println!("\n=== Instance registration ===");
    let registry: Registry<&str, Writer> = Registry::new("serializers", Arc::new(modules()));

    registry.register_instance("json", json_dumps);
    registry.register_instance("yaml", yaml_dump);

    println!("yaml -> {}", registry.get("yaml")?("hello"));
    Ok(())
}

fn namespaces() -> RegistryResult<()> {
    println!("\n=== Namespaces ===");
    global::modules::<Writer>().insert_module(
        "json",
        Module::new()
            .with("dumps", json_dumps as Writer)
            .with("loads", json_loads as Writer),
    );

    let namespace = global::namespace::<String, Writer>();
    namespace
        .get_or_create("parsers")
        .register_lazy("json".to_string(), "json:loads")?;
    namespace
        .get_or_create("writers")
        .register_lazy("json".to_string(), "json:dumps")?;

    let parser = namespace.get_or_create("parsers").get("json")?;
    let writer = namespace.get_or_create("writers").get("json")?;
    println!("parser -> {}", parser("\"hi\""));
    println!("writer -> {}", writer("hi"));
    println!("registries: {:?}", namespace.names());
    Ok(())
}

fn eager_loading() -> RegistryResult<()> {
    println!("\n=== Eager loading ===");
    let registry: Registry<&str, Writer> = Registry::new("critical", Arc::new(modules()));

    registry.register_eager("yaml", "yaml:dump")?;
    println!("yaml resolved at registration: {:?}", registry.state("yaml"));

    registry.register_lazy("optional", "json:dumps")?;
    println!("optional not resolved yet: {:?}", registry.state("optional"));
    Ok(())
}

fn main() -> RegistryResult<()> {
    tracing_subscriber::fmt::init();

    basic_registry()?;
    instance_registration()?;
    namespaces()?;
    eager_loading()
}
