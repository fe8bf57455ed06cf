//! An auto-loader that picks the model type from a saved config.

use lazyregistry::{AutoDispatch, BoxError, Pretrained, Source};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelConfig {
    model_type: String,
    #[serde(default = "default_hidden_size")]
    hidden_size: usize,
    #[serde(default = "default_num_layers")]
    num_layers: usize,
}

fn default_hidden_size() -> usize {
    768
}

fn default_num_layers() -> usize {
    12
}

macro_rules! model {
    ($name:ident) => {
        #[derive(Debug)]
        struct $name {
            config: ModelConfig,
        }

        impl Pretrained for $name {
            type Config = ModelConfig;

            fn config(&self) -> &ModelConfig {
                &self.config
            }

            fn from_config(config: ModelConfig) -> Self {
                Self { config }
            }
        }
    };
}

model!(BertModel);
model!(Gpt2Model);
model!(T5Model);

#[derive(Debug)]
enum Model {
    Bert(BertModel),
    Gpt2(Gpt2Model),
    T5(T5Model),
}

fn auto_model() -> AutoDispatch<ModelConfig, Model> {
    let models = AutoDispatch::global("models", "model_type");
    models.register_pretrained("bert", Model::Bert);
    models.register_pretrained("gpt2", Model::Gpt2);
    models.register_pretrained("t5", Model::T5);
    models
}

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt::init();

    let model = BertModel::from_config(ModelConfig {
        model_type: "bert".to_string(),
        hidden_size: 768,
        num_layers: default_num_layers(),
    });

    let tmp = tempfile::tempdir()?;
    model.save_pretrained(tmp.path())?;
    println!("Saved model to {:?}", tmp.path());

    // the model type is read from config.json
    let loaded = auto_model().load(Source::Directory(tmp.path()))?;
    match &loaded {
        Model::Bert(bert) => println!("Loaded: BertModel {:?}", bert.config),
        Model::Gpt2(gpt2) => println!("Loaded: Gpt2Model {:?}", gpt2.config),
        Model::T5(t5) => println!("Loaded: T5Model {:?}", t5.config),
    }
    Ok(())
}
