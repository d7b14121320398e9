//! Environment source: `LABTRACK__BASE_FOLDER`, `LABTRACK__LOGGING__LEVEL`, ...

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "LABTRACK";

/// Add the environment source; nested keys are separated by `__`.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__"),
    )
}
