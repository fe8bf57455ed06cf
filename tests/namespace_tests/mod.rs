use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use lazyregistry::{
    config::{self, NamespaceConfig},
    global, Module, ModuleResolver, Namespace, RegistryError,
};

type Handler = fn(&str) -> String;

fn upper(s: &str) -> String {
    s.to_uppercase()
}

fn reverse(s: &str) -> String {
    s.chars().rev().collect()
}

fn plugins(loads: Arc<AtomicUsize>) -> Namespace<String, Handler> {
    let modules = ModuleResolver::new();
    modules.provide("plugins.text", move || {
        loads.fetch_add(1, Ordering::SeqCst);
        Ok(Module::new()
            .with("upper", upper as Handler)
            .with("reverse", reverse as Handler))
    });
    Namespace::new(Arc::new(modules))
}

#[test]
fn test_plugin_manifest_loads_module_once() {
    let loads = Arc::new(AtomicUsize::new(0));
    let namespace = plugins(loads.clone());

    let manifest: NamespaceConfig = config::from_str(
        r#"{"registries": {"text": {"entries": {
            "upper": "plugins.text:upper",
            "reverse": "plugins.text:reverse"
        }}}}"#,
    )
    .unwrap();
    assert!(manifest.validate().is_empty());
    manifest.apply(&namespace).unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 0);

    let text = namespace.get_or_create("text");
    assert_eq!(text.get("upper").unwrap()("abc"), "ABC");
    assert_eq!(text.get("reverse").unwrap()("abc"), "cba");
    assert_eq!(text.get("upper").unwrap()("x"), "X");
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_missing_plugin_member_is_retryable() {
    let namespace = plugins(Arc::new(AtomicUsize::new(0)));
    let text = namespace.get_or_create("text");
    text.register_lazy("shout".to_string(), "plugins.text:shout")
        .unwrap();

    let err = text.get("shout").unwrap_err();
    assert!(err.is_retryable());
    assert!(matches!(err, RegistryError::Resolution { .. }));
    assert!(err.to_string().contains("shout"));

    // a later overwrite with a valid reference fixes the entry
    text.register_lazy("shout".to_string(), "plugins.text:upper")
        .unwrap();
    assert_eq!(text.get("shout").unwrap()("hey"), "HEY");
}

#[test]
fn test_global_namespace_round_trip() {
    global::modules::<Handler>().insert_module(
        "global_text",
        Module::new().with("reverse", reverse as Handler),
    );

    let first = global::namespace::<String, Handler>().get_or_create("integration_text");
    first
        .register_lazy("reverse".to_string(), "global_text:reverse")
        .unwrap();

    let second = global::namespace::<String, Handler>().get_or_create("integration_text");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.get("reverse").unwrap()("ab"), "ba");
}

#[test]
fn test_concurrent_gets_share_one_value() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let namespace: Namespace<String, Arc<String>> = Namespace::new(Arc::new(
        move |reference: &lazyregistry::Reference| -> Result<Arc<String>, lazyregistry::BoxError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(reference.to_string()))
        },
    ));
    let registry = namespace.get_or_create("shared");
    registry
        .register_lazy("value".to_string(), "pkg.mod:Value")
        .unwrap();

    let values: Vec<Arc<String>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| registry.get("value").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(values.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(values[0].as_str(), "pkg.mod:Value");
    assert!(calls.load(Ordering::SeqCst) >= 1);
    assert!(Arc::ptr_eq(&registry.get("value").unwrap(), &values[0]));
}
