use crate::error::ClientError;
use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Plain environment variables that override a single configuration key,
/// e.g. `("api.url", "API_URL")`.
pub type EnvOverride<'a> = (&'a str, &'a str);

/// Resolve the `config/` directory of a crate, whether the process runs from
/// the workspace root or from inside the crate.
pub fn configuration_directory(crate_dir: &str) -> Result<PathBuf, ClientError> {
    let base_path = std::env::current_dir()?;

    if base_path.ends_with(crate_dir) {
        Ok(base_path.join("config"))
    } else {
        Ok(base_path.join(crate_dir).join("config"))
    }
}

/// Load layered settings: `config/base.yaml` (optional), then `APP_`-prefixed
/// environment variables (`APP_API__URL`), then the explicit overrides.
pub fn load_settings<T: DeserializeOwned>(
    crate_dir: &str,
    overrides: &[EnvOverride<'_>],
) -> Result<T, ClientError> {
    dotenvy::dotenv().ok();

    let configuration_directory = configuration_directory(crate_dir)?;

    let mut builder = Config::builder()
        .add_source(File::from(configuration_directory.join("base.yaml")).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        );

    for (key, var) in overrides {
        builder = builder.set_override_option(*key, std::env::var(var).ok())?;
    }

    let settings = builder.build()?;
    Ok(settings.try_deserialize::<T>()?)
}
