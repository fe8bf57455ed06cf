//! Plugins registered as instances and run by name.

use std::sync::Arc;

use lazyregistry::{NoResolver, Registry, RegistryResult};

trait Plugin: Send + Sync {
    fn execute(&self, data: &str) -> String;
}

struct Uppercase;

impl Plugin for Uppercase {
    fn execute(&self, data: &str) -> String {
        data.to_uppercase()
    }
}

struct Reverse;

impl Plugin for Reverse {
    fn execute(&self, data: &str) -> String {
        data.chars().rev().collect()
    }
}

struct Repeat;

impl Plugin for Repeat {
    fn execute(&self, data: &str) -> String {
        data.repeat(2)
    }
}

struct PluginManager {
    plugins: Registry<String, Arc<dyn Plugin>>,
}

impl PluginManager {
    fn new() -> Self {
        Self {
            plugins: Registry::new("plugins", Arc::new(NoResolver)),
        }
    }

    fn register(&self, name: &str, plugin: impl Plugin + 'static) -> &Self {
        self.plugins.register_instance(name.to_string(), Arc::new(plugin));
        self
    }

    fn run(&self, name: &str, data: &str) -> RegistryResult<String> {
        Ok(self.plugins.get(name)?.execute(data))
    }

    fn list(&self) -> Vec<String> {
        self.plugins.keys()
    }
}

fn main() -> RegistryResult<()> {
    tracing_subscriber::fmt::init();

    let manager = PluginManager::new();
    manager
        .register("uppercase", Uppercase)
        .register("reverse", Reverse)
        .register("repeat", Repeat);

    println!("Available plugins: {:?}", manager.list());

    let text = "hello";
    println!("\nOriginal: {}", text);
    println!("Uppercase: {}", manager.run("uppercase", text)?);
    println!("Reverse: {}", manager.run("reverse", text)?);
    println!("Repeat: {}", manager.run("repeat", text)?);

    if let Err(e) = manager.run("rot13", text) {
        println!("\n{}", e);
    }
    Ok(())
}
