use std::{
    fmt,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    container::Target,
    error::{RegistryError, RegistryResult},
    namespace::Namespace,
    reference::Reference,
};

pub const DEFAULT_DISCRIMINATOR_FIELD: &str = "type";
pub const DEFAULT_CONFIG_FILENAME: &str = "config.json";

/// Registries to populate, by name, in declaration order.
///
/// ```json
/// {
///   "registries": {
///     "serializers": {
///       "entries": { "json": "json:dumps", "pickle": "pickle:dumps" }
///     },
///     "models": { "eager_load": true, "entries": { "bert": "models.bert:Bert" } }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamespaceConfig {
    #[serde(default)]
    pub registries: IndexMap<String, RegistryConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub eager_load: bool,

    /// key -> `"location:member"`
    #[serde(default)]
    pub entries: IndexMap<String, String>,
}

/// A manifest entry whose reference does not parse.
#[derive(Debug)]
pub struct InvalidEntry {
    pub registry: String,
    pub key: String,
    pub error: RegistryError,
}

impl fmt::Display for InvalidEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.registry, self.key, self.error)
    }
}

impl NamespaceConfig {
    pub fn from_file(path: impl AsRef<Path>) -> RegistryResult<Self> {
        from_file(path)
    }

    /// Registers every entry into `namespace`, creating registries as needed.
    ///
    /// Entries of an `eager_load` registry are resolved immediately and the
    /// registry keeps eager loading as its default. Stops at the first failure;
    /// entries registered before it stay registered.
    pub fn apply<V>(&self, namespace: &Namespace<String, V>) -> RegistryResult<()>
    where
        V: Clone + Send + Sync + 'static,
    {
        for (name, config) in &self.registries {
            let registry = namespace.get_or_create(name);
            if config.eager_load {
                registry.set_eager_load(true);
            }
            for (key, reference) in &config.entries {
                registry.register(
                    key.clone(),
                    Target::reference(reference.as_str()),
                    config.eager_load,
                )?;
            }
            debug!(registry = %name, entries = config.entries.len(), "manifest applied");
        }
        Ok(())
    }

    /// Every malformed reference in the manifest, in declaration order.
    pub fn validate(&self) -> Vec<InvalidEntry> {
        self.registries
            .iter()
            .flat_map(|(name, config)| {
                config
                    .entries
                    .iter()
                    .filter_map(move |(key, reference)| {
                        Reference::parse(reference).err().map(|error| InvalidEntry {
                            registry: name.clone(),
                            key: key.clone(),
                            error,
                        })
                    })
            })
            .collect()
    }
}

/// Settings for an [`AutoDispatch`](crate::AutoDispatch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_discriminator_field")]
    pub discriminator_field: String,

    #[serde(default = "default_config_filename")]
    pub config_filename: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            discriminator_field: default_discriminator_field(),
            config_filename: default_config_filename(),
        }
    }
}

fn default_discriminator_field() -> String {
    DEFAULT_DISCRIMINATOR_FIELD.to_string()
}

fn default_config_filename() -> String {
    DEFAULT_CONFIG_FILENAME.to_string()
}

pub fn from_file<T: for<'de> Deserialize<'de>, P: AsRef<Path>>(path: P) -> RegistryResult<T> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| RegistryError::io(path, e))?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader)
        .map_err(|e| RegistryError::Serialization(Box::new(e)))?;
    Ok(config)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> RegistryResult<T> {
    let config =
        serde_json::from_str(s).map_err(|e| RegistryError::Serialization(Box::new(e)))?;
    Ok(config)
}

/// Writes `value` as indented JSON, replacing any existing file.
pub fn to_file<T: Serialize + ?Sized, P: AsRef<Path>>(path: P, value: &T) -> RegistryResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| RegistryError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| RegistryError::Serialization(Box::new(e)))?;
    writer.flush().map_err(|e| RegistryError::io(path, e))
}
