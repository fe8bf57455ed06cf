//! Types that save themselves to a directory and come back from it.
//!
//! A saved directory always holds the configuration as JSON under
//! [`Pretrained::CONFIG_FILENAME`]. Types with more to persist (weights, a
//! vocabulary) override [`Pretrained::save_state`] and [`Pretrained::restore`]
//! and keep their extra files next to it.

use std::{fs, path::Path};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::{
    config::{self, DEFAULT_CONFIG_FILENAME},
    error::{RegistryError, RegistryResult},
};

pub trait Pretrained: Sized {
    type Config: Serialize + DeserializeOwned;

    const CONFIG_FILENAME: &'static str = DEFAULT_CONFIG_FILENAME;

    fn config(&self) -> &Self::Config;

    fn from_config(config: Self::Config) -> Self;

    /// Rebuilds an instance from its configuration. `dir` is the saved
    /// directory when there is one.
    fn restore(config: Self::Config, _dir: Option<&Path>) -> RegistryResult<Self> {
        Ok(Self::from_config(config))
    }

    /// Writes state beyond the configuration into `dir`.
    fn save_state(&self, _dir: &Path) -> RegistryResult<()> {
        Ok(())
    }

    fn save_pretrained(&self, dir: impl AsRef<Path>) -> RegistryResult<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| RegistryError::io(dir, e))?;
        config::to_file(dir.join(Self::CONFIG_FILENAME), self.config())?;
        self.save_state(dir)?;
        debug!(dir = ?dir, "saved");
        Ok(())
    }

    fn from_pretrained(dir: impl AsRef<Path>) -> RegistryResult<Self> {
        let dir = dir.as_ref();
        let config = config::from_file(dir.join(Self::CONFIG_FILENAME))?;
        Self::restore(config, Some(dir))
    }
}
