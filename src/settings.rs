//! Settings for the clone engine and its logging.
//!
//! Settings are read with the `config` crate from an optional file followed by
//! `TWIN_`-prefixed environment variables, where nested keys are separated by a
//! double underscore (for example `TWIN_CLONE__VALIDATE_ELEMENTS=true`).

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::error::Result;

/// Options that apply to a single clone operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CloneOptions {
    /// Validate every element of a sequence or set against the inner rule
    /// before any element is cloned.
    pub validate_elements: bool,
    /// Number of objects the registry reserves room for up front.
    pub registry_capacity: usize,
}
impl Default for CloneOptions {
    fn default() -> Self {
        Self {
            validate_elements: false,
            registry_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_filter: String,
    pub clone: CloneOptions,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: String::from("info"),
            clone: CloneOptions::default(),
        }
    }
}

impl Settings {
    /// Loads `twin.{toml,json,yaml,...}` from the working directory if present.
    pub fn load() -> Result<Self> {
        Self::build(File::with_name("twin").required(false))
    }
    /// Loads the given file, which has to exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::build(File::from(path.as_ref()).required(true))
    }
    fn build<S>(file: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("TWIN")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

/// Installs a global `fmt` subscriber. `RUST_LOG` takes precedence over the
/// given filter. Calling this more than once is harmless.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
