//! Layered settings loading
//!
//! Settings are built from the type's defaults, an optional file (TOML, YAML
//! or JSON, picked by extension) and finally environment variables using the
//! given prefix. The prefix is joined with `_` (`PREFIX_TIMEOUT_SECS`) and
//! nested keys use `__` (`PREFIX_OUTER__INNER`).

use crate::error::{CoreError, CoreResult};
use config::{Config, Environment, File};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;

/// Load settings of type `T` from defaults, an optional file and the environment
///
/// # Errors
///
/// Returns an error if the file is missing or malformed, or if the merged
/// settings cannot be deserialized into `T`.
pub fn load_settings<T>(path: Option<&Path>, env_prefix: &str) -> CoreResult<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    build_settings(path, environment(env_prefix))
}

fn environment(prefix: &str) -> Environment {
    Environment::with_prefix(prefix)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn build_settings<T>(path: Option<&Path>, environment: Environment) -> CoreResult<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    let mut builder = Config::builder().add_source(Config::try_from(&T::default())?);

    if let Some(path) = path {
        if !path.exists() {
            return Err(CoreError::invalid_config(format!(
                "settings file not found: {}",
                path.display()
            )));
        }
        builder = builder.add_source(File::from(path));
    }
    builder = builder.add_source(environment);

    Ok(builder.build()?.try_deserialize()?)
}
