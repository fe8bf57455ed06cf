use std::{path::Path, sync::Arc};

use lazyregistry::{
    config::{self, DispatchConfig},
    dispatch, AutoDispatch, Module, ModuleResolver, Namespace, NoResolver, Pretrained, Registry,
    RegistryError, RegistryResult, Source, VariantRef,
};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ModelConfig {
    model_type: String,
    #[serde(default = "default_hidden_size")]
    hidden_size: usize,
    #[serde(default)]
    vocab: Vec<String>,
}

fn default_hidden_size() -> usize {
    768
}

trait Model: Send + Sync {
    fn describe(&self) -> String;
    fn vocab_size(&self) -> usize {
        0
    }
}

#[derive(Debug)]
struct Bert {
    config: ModelConfig,
}

impl Pretrained for Bert {
    type Config = ModelConfig;

    fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn from_config(config: ModelConfig) -> Self {
        Self { config }
    }
}

impl Model for Bert {
    fn describe(&self) -> String {
        format!("bert/{}", self.config.hidden_size)
    }
}

/// Keeps its vocabulary in a separate file of the saved directory.
#[derive(Debug)]
struct Gpt {
    config: ModelConfig,
    vocab: Vec<String>,
}

impl Pretrained for Gpt {
    type Config = ModelConfig;

    fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn from_config(config: ModelConfig) -> Self {
        let vocab = config.vocab.clone();
        Self { config, vocab }
    }

    fn restore(config: ModelConfig, dir: Option<&Path>) -> RegistryResult<Self> {
        let vocab = match dir {
            Some(dir) => config::from_file(dir.join("vocab.json"))?,
            None => config.vocab.clone(),
        };
        Ok(Self { config, vocab })
    }

    fn save_state(&self, dir: &Path) -> RegistryResult<()> {
        config::to_file(dir.join("vocab.json"), &self.vocab)
    }
}

impl Model for Gpt {
    fn describe(&self) -> String {
        format!("gpt/{}", self.config.hidden_size)
    }

    fn vocab_size(&self) -> usize {
        self.vocab.len()
    }
}

type Models = AutoDispatch<ModelConfig, Box<dyn Model>>;

fn boxed<M: Model + 'static>(model: M) -> Box<dyn Model> {
    Box::new(model)
}

type ModelVariants = Namespace<String, VariantRef<ModelConfig, Box<dyn Model>>>;

fn models(registry_name: &str, namespace: &ModelVariants) -> Models {
    let models = AutoDispatch::in_namespace(namespace, registry_name, "model_type");
    models.register_pretrained::<Bert>("bert", boxed);
    models.register_pretrained::<Gpt>("gpt", boxed);
    models
}

#[test]
fn test_auto_dispatch_from_bytes() {
    let namespace = Namespace::new(Arc::new(NoResolver));
    let models = models("models", &namespace);

    let bert = models
        .load(Source::Bytes(br#"{"model_type": "bert", "hidden_size": 256}"#))
        .unwrap();
    assert_eq!(bert.describe(), "bert/256");

    let gpt = models
        .load(Source::Bytes(br#"{"model_type": "gpt", "vocab": ["a", "b"]}"#))
        .unwrap();
    assert_eq!(gpt.describe(), "gpt/768");
    assert_eq!(gpt.vocab_size(), 2);

    // registrations are visible through the namespace
    assert_eq!(namespace.get_or_create("models").keys(), vec!["bert", "gpt"]);
}

#[test]
fn test_unknown_variant_lists_registered() {
    let namespace = Namespace::new(Arc::new(NoResolver));
    let models = models("models", &namespace);

    let err = models
        .load(Source::Bytes(br#"{"model_type": "roberta"}"#))
        .err()
        .unwrap();
    match err {
        RegistryError::UnknownVariant { variant, known, .. } => {
            assert_eq!(variant, "roberta");
            assert_eq!(known, vec!["bert".to_string(), "gpt".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_pretrained_directory_restores_extra_state() {
    let dir = tempfile::tempdir().unwrap();
    let gpt = Gpt {
        config: ModelConfig {
            model_type: "gpt".to_string(),
            hidden_size: 64,
            vocab: Vec::new(),
        },
        vocab: vec!["hello".to_string(), "world".to_string(), "!".to_string()],
    };
    gpt.save_pretrained(dir.path()).unwrap();

    let namespace = Namespace::new(Arc::new(NoResolver));
    let models = models("models", &namespace);
    let loaded = models.load(Source::Directory(dir.path())).unwrap();
    assert_eq!(loaded.describe(), "gpt/64");
    assert_eq!(loaded.vocab_size(), 3);

    // the same config without the directory falls back to the inline vocab
    let inline = models
        .load(Source::File(&dir.path().join("config.json")))
        .unwrap();
    assert_eq!(inline.vocab_size(), 0);
}

#[test]
fn test_lazy_variants_resolve_through_namespace_resolver() {
    let modules: ModuleResolver<VariantRef<ModelConfig, Box<dyn Model>>> = ModuleResolver::new();
    modules.provide("models.bert", || {
        let variant: VariantRef<ModelConfig, Box<dyn Model>> = Arc::new(dispatch::from_fn(
            |config: ModelConfig, _: &Source<'_>| Ok(boxed(Bert { config })),
        ));
        Ok(Module::new().with("Bert", variant))
    });
    let namespace = Namespace::new(Arc::new(modules));
    let models: Models = AutoDispatch::in_namespace(&namespace, "lazy_models", "model_type");
    models
        .register_lazy_variant("bert", "models.bert:Bert")
        .unwrap();
    models
        .register_lazy_variant("t5", "models.t5:T5")
        .unwrap();

    let bert = models
        .load(Source::Bytes(br#"{"model_type": "bert"}"#))
        .unwrap();
    assert_eq!(bert.describe(), "bert/768");

    let err = models
        .load(Source::Bytes(br#"{"model_type": "t5"}"#))
        .err()
        .unwrap();
    assert!(matches!(err, RegistryError::UnknownVariant { ref variant, .. } if variant == "t5"));
}

#[test]
fn test_dispatch_config_and_global_registry() {
    let dispatch_config: DispatchConfig = config::from_str(
        r#"{"discriminator_field": "model_type", "config_filename": "model.json"}"#,
    )
    .unwrap();

    let global: Models = AutoDispatch::global("integration_models", "model_type");
    global.register_pretrained::<Bert>("bert", boxed);

    // a second handle over the same global registry sees the registration
    let models = AutoDispatch::from_config(global.registry().clone(), &dispatch_config);
    assert_eq!(models.variants(), vec!["bert"]);

    let dir = tempfile::tempdir().unwrap();
    let config = ModelConfig {
        model_type: "bert".to_string(),
        hidden_size: 32,
        vocab: Vec::new(),
    };
    let path = models.save(&config, dir.path()).unwrap();
    assert!(path.ends_with("model.json"));
    assert_eq!(
        models.load(Source::Directory(dir.path())).unwrap().describe(),
        "bert/32"
    );
}

#[test]
fn test_standalone_registry() {
    let registry: Arc<Registry<String, VariantRef<ModelConfig, Box<dyn Model>>>> =
        Arc::new(Registry::new("standalone", Arc::new(NoResolver)));
    let models: Models = AutoDispatch::new(registry, "model_type");
    models.register_variant(
        "bert",
        dispatch::from_fn(|config: ModelConfig, _: &Source<'_>| Ok(boxed(Bert { config }))),
    );

    let err = models
        .load(Source::Bytes(br#"{"hidden_size": 10}"#))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        RegistryError::MissingDiscriminator { ref field, .. } if field == "model_type"
    ));
}
