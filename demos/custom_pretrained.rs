//! A pretrained type that saves a vocabulary next to its config.

use std::{collections::HashMap, fs, path::Path};

use lazyregistry::{
    AutoDispatch, BoxError, Pretrained, RegistryError, RegistryResult, Source,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProcessorConfig {
    processor_type: String,
    #[serde(default = "default_max_length")]
    max_length: usize,
    #[serde(default = "default_lowercase")]
    lowercase: bool,
}

fn default_max_length() -> usize {
    512
}

fn default_lowercase() -> bool {
    true
}

const VOCAB_FILENAME: &str = "vocab.txt";

struct TextProcessor {
    config: ProcessorConfig,
    vocab: HashMap<String, usize>,
}

impl TextProcessor {
    fn new(config: ProcessorConfig, vocab: HashMap<String, usize>) -> Self {
        Self { config, vocab }
    }

    fn process(&self, text: &str) -> Vec<usize> {
        let text = if self.config.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        text.split_whitespace()
            .take(self.config.max_length)
            .map(|word| self.vocab.get(word).copied().unwrap_or(0))
            .collect()
    }
}

impl Pretrained for TextProcessor {
    type Config = ProcessorConfig;

    fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    fn from_config(config: ProcessorConfig) -> Self {
        Self::new(config, HashMap::new())
    }

    fn restore(config: ProcessorConfig, dir: Option<&Path>) -> RegistryResult<Self> {
        let path = match dir {
            Some(dir) => dir.join(VOCAB_FILENAME),
            None => return Ok(Self::from_config(config)),
        };
        if !path.exists() {
            return Ok(Self::from_config(config));
        }

        let contents =
            fs::read_to_string(&path).map_err(|source| RegistryError::Io { path, source })?;
        let vocab = contents
            .lines()
            .enumerate()
            .map(|(idx, word)| (word.to_string(), idx))
            .collect();
        Ok(Self::new(config, vocab))
    }

    fn save_state(&self, dir: &Path) -> RegistryResult<()> {
        let mut words: Vec<(&String, &usize)> = self.vocab.iter().collect();
        words.sort_by_key(|(_, idx)| **idx);
        let contents: Vec<&str> = words.iter().map(|(word, _)| word.as_str()).collect();

        let path = dir.join(VOCAB_FILENAME);
        fs::write(&path, contents.join("\n")).map_err(|source| RegistryError::Io { path, source })
    }
}

enum Processor {
    Simple(TextProcessor),
    /// Strips punctuation before tokenizing.
    Advanced(TextProcessor),
}

impl Processor {
    fn process(&self, text: &str) -> Vec<usize> {
        match self {
            Processor::Simple(inner) => inner.process(text),
            Processor::Advanced(inner) => {
                let cleaned: String = text
                    .chars()
                    .filter(|c| c.is_alphanumeric() || c.is_whitespace())
                    .collect();
                inner.process(&cleaned)
            }
        }
    }

    fn vocab_size(&self) -> usize {
        match self {
            Processor::Simple(inner) | Processor::Advanced(inner) => inner.vocab.len(),
        }
    }
}

fn auto_processor() -> AutoDispatch<ProcessorConfig, Processor> {
    let processors = AutoDispatch::global("processors", "processor_type");
    processors.register_pretrained("simple", Processor::Simple);
    processors.register_pretrained("advanced", Processor::Advanced);
    processors
}

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt::init();

    let config = ProcessorConfig {
        processor_type: "simple".to_string(),
        max_length: 128,
        lowercase: true,
    };
    let vocab = ["<unk>", "hello", "world", "rust"]
        .iter()
        .enumerate()
        .map(|(idx, word)| (word.to_string(), idx))
        .collect();
    let processor = TextProcessor::new(config, vocab);

    let text = "Hello World Rust";
    let tokens = processor.process(text);
    println!("Original: {}", text);
    println!("Tokens: {:?}", tokens);

    let tmp = tempfile::tempdir()?;
    processor.save_pretrained(tmp.path())?;
    println!("\nSaved to {:?}", tmp.path());

    let loaded = auto_processor().load(Source::Directory(tmp.path()))?;
    println!("Vocab size: {}", loaded.vocab_size());

    let tokens_loaded = loaded.process(text);
    println!("Tokens (loaded): {:?}", tokens_loaded);
    assert_eq!(tokens, tokens_loaded, "tokens should match");
    println!("\nSave/load successful!");
    Ok(())
}
