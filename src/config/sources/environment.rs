//! Environment variable source: NORNS_EDIT_ prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// Uses NORNS_EDIT prefix and __ as separator for nested keys
/// (e.g. `NORNS_EDIT__HOST__ROOT`).
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix("NORNS_EDIT")
            .separator("__")
            .try_parsing(true),
    );
    Ok(builder)
}
