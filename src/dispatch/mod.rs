//! Discriminator-based construction.
//!
//! An [`AutoDispatch`] sits on top of a [`Registry`] whose keys are discriminator
//! values and whose values are [`Variant`]s. Loading a persisted configuration
//! reads the discriminator field, looks the matching variant up (resolving it
//! first if it was registered by reference) and lets the variant build the
//! instance from the parsed configuration.
//!
//! ```rust
//! use std::sync::Arc;
//! use lazyregistry::{dispatch, AutoDispatch, NoResolver, Registry, Source};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct ModelConfig {
//!     model_type: String,
//!     hidden_size: usize,
//! }
//!
//! let registry = Arc::new(Registry::new("models", Arc::new(NoResolver)));
//! let models: AutoDispatch<ModelConfig, String> = AutoDispatch::new(registry, "model_type");
//! models.register_variant(
//!     "bert",
//!     dispatch::from_fn(|config: ModelConfig, _: &Source<'_>| {
//!         Ok(format!("{} with {}", config.model_type, config.hidden_size))
//!     }),
//! );
//!
//! let loaded = models
//!     .load(Source::Bytes(br#"{"model_type": "bert", "hidden_size": 768}"#))
//!     .unwrap();
//! assert_eq!(loaded, "bert with 768");
//! ```

pub mod format;

use std::{
    borrow::Cow,
    fs,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    config::DispatchConfig,
    error::{BoxError, Origin, RegistryError, RegistryResult},
    global,
    namespace::Namespace,
    pretrained::Pretrained,
    registry::Registry,
};

pub use format::{ConfigFormat, JsonFormat};

/// Where a persisted configuration comes from.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    Bytes(&'a [u8]),
    File(&'a Path),
    /// A saved directory; the configuration is read from its config file.
    Directory(&'a Path),
}

impl<'a> Source<'a> {
    pub fn directory(&self) -> Option<&'a Path> {
        match *self {
            Source::Directory(dir) => Some(dir),
            _ => None,
        }
    }
}

/// Builds an instance of `T` from a parsed configuration.
pub trait Variant<C, T>: Send + Sync {
    fn restore(&self, config: C, source: &Source<'_>) -> Result<T, BoxError>;
}

pub type VariantRef<C, T> = Arc<dyn Variant<C, T>>;

pub struct FnVariant<F>(F);

impl<C, T, F> Variant<C, T> for FnVariant<F>
where
    F: Fn(C, &Source<'_>) -> Result<T, BoxError> + Send + Sync,
{
    fn restore(&self, config: C, source: &Source<'_>) -> Result<T, BoxError> {
        (self.0)(config, source)
    }
}

pub fn from_fn<C, T, F>(f: F) -> FnVariant<F>
where
    F: Fn(C, &Source<'_>) -> Result<T, BoxError> + Send + Sync,
{
    FnVariant(f)
}

/// Adapts a [`Pretrained`] type into a variant producing `T`.
///
/// On a [`Source::Directory`] the directory is passed to [`Pretrained::restore`]
/// so extra saved state can be loaded alongside the configuration.
pub struct PretrainedVariant<P, T> {
    wrap: fn(P) -> T,
    _marker: PhantomData<fn() -> P>,
}

impl<P, T> PretrainedVariant<P, T> {
    pub fn new(wrap: fn(P) -> T) -> Self {
        Self {
            wrap,
            _marker: PhantomData,
        }
    }
}

impl<P, T> Variant<P::Config, T> for PretrainedVariant<P, T>
where
    P: Pretrained,
{
    fn restore(&self, config: P::Config, source: &Source<'_>) -> Result<T, BoxError> {
        let instance = P::restore(config, source.directory())?;
        Ok((self.wrap)(instance))
    }
}

pub struct AutoDispatch<C, T> {
    registry: Arc<Registry<String, VariantRef<C, T>>>,
    discriminator_field: String,
    config_filename: String,
    format: Arc<dyn ConfigFormat>,
}

impl<C, T> AutoDispatch<C, T>
where
    C: DeserializeOwned + 'static,
    T: 'static,
{
    pub fn new(
        registry: Arc<Registry<String, VariantRef<C, T>>>,
        discriminator_field: impl Into<String>,
    ) -> Self {
        Self::from_config(
            registry,
            &DispatchConfig {
                discriminator_field: discriminator_field.into(),
                ..Default::default()
            },
        )
    }

    pub fn from_config(
        registry: Arc<Registry<String, VariantRef<C, T>>>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            registry,
            discriminator_field: config.discriminator_field.clone(),
            config_filename: config.config_filename.clone(),
            format: Arc::new(JsonFormat::pretty()),
        }
    }

    pub fn in_namespace(
        namespace: &Namespace<String, VariantRef<C, T>>,
        registry_name: &str,
        discriminator_field: impl Into<String>,
    ) -> Self {
        Self::new(namespace.get_or_create(registry_name), discriminator_field)
    }

    /// Dispatch over a registry of the process-wide namespace.
    pub fn global(registry_name: &str, discriminator_field: impl Into<String>) -> Self {
        Self::in_namespace(
            &global::namespace::<String, VariantRef<C, T>>(),
            registry_name,
            discriminator_field,
        )
    }

    pub fn with_format(mut self, format: Arc<dyn ConfigFormat>) -> Self {
        self.format = format;
        self
    }

    pub fn with_config_filename(mut self, config_filename: impl Into<String>) -> Self {
        self.config_filename = config_filename.into();
        self
    }

    pub fn registry(&self) -> &Arc<Registry<String, VariantRef<C, T>>> {
        &self.registry
    }

    pub fn discriminator_field(&self) -> &str {
        &self.discriminator_field
    }

    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    pub fn register_variant<V>(&self, discriminator: impl Into<String>, variant: V)
    where
        V: Variant<C, T> + 'static,
    {
        let discriminator = discriminator.into();
        debug!(registry = %self.registry.name(), variant = %discriminator, "variant registered");
        self.registry
            .register_instance(discriminator, Arc::new(variant));
    }

    pub fn register_pretrained<P>(&self, discriminator: impl Into<String>, wrap: fn(P) -> T)
    where
        P: Pretrained<Config = C> + 'static,
    {
        self.register_variant(discriminator, PretrainedVariant::new(wrap));
    }

    /// Registers a variant by reference; it is resolved through the registry's
    /// resolver the first time a configuration selects it.
    pub fn register_lazy_variant(
        &self,
        discriminator: impl Into<String>,
        reference: impl Into<String>,
    ) -> RegistryResult<()> {
        self.registry.register_lazy(discriminator.into(), reference)
    }

    /// Known discriminator values in registration order.
    pub fn variants(&self) -> Vec<String> {
        self.registry.keys()
    }

    #[instrument(level = "debug", skip_all, fields(registry = %self.registry.name()))]
    pub fn load(&self, source: Source<'_>) -> RegistryResult<T> {
        let bytes = self.read_source(&source)?;
        let object = self
            .format
            .parse(&bytes)
            .map_err(RegistryError::Serialization)?;
        let discriminator = self.discriminator(&object)?;

        debug!(variant = %discriminator, "dispatching");
        let variant = self
            .registry
            .get(discriminator.as_str())
            .map_err(|cause| self.unknown_variant(&discriminator, cause))?;

        let config: C =
            serde_json::from_value(object).map_err(|e| RegistryError::InvalidConfig {
                origin: self.origin(),
                variant: discriminator.clone(),
                source: Box::new(e),
            })?;

        variant
            .restore(config, &source)
            .map_err(|source| RegistryError::Restore {
                origin: self.origin(),
                variant: discriminator,
                source,
            })
    }

    fn discriminator(&self, object: &Value) -> RegistryResult<String> {
        object
            .get(&self.discriminator_field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RegistryError::MissingDiscriminator {
                origin: self.origin(),
                field: self.discriminator_field.clone(),
            })
    }

    fn origin(&self) -> Origin {
        Origin::registry(self.registry.name())
    }

    fn unknown_variant(&self, discriminator: &str, cause: RegistryError) -> RegistryError {
        RegistryError::UnknownVariant {
            origin: self.origin(),
            variant: discriminator.to_string(),
            known: self.variants(),
            source: Box::new(cause),
        }
    }

    fn read_source<'a>(&self, source: &Source<'a>) -> RegistryResult<Cow<'a, [u8]>> {
        match *source {
            Source::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
            Source::File(path) => fs::read(path)
                .map(Cow::Owned)
                .map_err(|e| RegistryError::io(path, e)),
            Source::Directory(dir) => {
                let path = dir.join(&self.config_filename);
                fs::read(&path)
                    .map(Cow::Owned)
                    .map_err(|e| RegistryError::io(path, e))
            }
        }
    }
}

impl<C, T> AutoDispatch<C, T>
where
    C: Serialize + DeserializeOwned + 'static,
    T: 'static,
{
    /// Writes `config` into `<dir>/<config_filename>`, creating `dir` if needed.
    pub fn save(&self, config: &C, dir: impl AsRef<Path>) -> RegistryResult<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| RegistryError::io(dir, e))?;

        let object =
            serde_json::to_value(config).map_err(|e| RegistryError::Serialization(Box::new(e)))?;
        let bytes = self
            .format
            .serialize(&object)
            .map_err(RegistryError::Serialization)?;

        let path = dir.join(&self.config_filename);
        fs::write(&path, bytes).map_err(|e| RegistryError::io(&path, e))?;
        Ok(path)
    }
}
