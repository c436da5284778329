pub mod config;
pub mod tracing_setup;

pub use config::{
    ConfigError, ConfigProperties, ConfigValue, DefaultSecretResolver, FromConfigValue,
    PropertyMeta, SecretResolver, StowageConfig,
};
pub use tracing_setup::init_tracing;
