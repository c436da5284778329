use super::{ConfigError, StowageConfig};

/// Metadata about a single configuration property.
#[derive(Debug, Clone)]
pub struct PropertyMeta {
    /// Relative key (e.g., `"max_connections"`).
    pub key: &'static str,
    /// Rust type name (e.g., `"u32"`).
    pub type_name: &'static str,
    /// Whether the property is required (no default and not `Option`).
    pub required: bool,
    /// Default value as a string, if any.
    pub default_value: Option<&'static str>,
    pub description: Option<&'static str>,
}

impl PropertyMeta {
    /// Absolute key under `prefix` (e.g., `"stowage.datasource.max_connections"`).
    pub fn full_key(&self, prefix: &str) -> String {
        format!("{prefix}.{}", self.key)
    }

    /// Environment variable that overrides this property.
    pub fn env_var(&self, prefix: &str) -> String {
        self.full_key(prefix).to_uppercase().replace('.', "_")
    }
}

/// Trait for strongly-typed configuration sections.
///
/// ```ignore
/// impl ConfigProperties for DataSourceOptions {
///     fn prefix() -> &'static str { "stowage.datasource" }
///     fn properties_metadata() -> Vec<PropertyMeta> { ... }
///     fn from_config(config: &StowageConfig) -> Result<Self, ConfigError> { ... }
/// }
///
/// let options: DataSourceOptions = config.section()?;
/// ```
pub trait ConfigProperties: Sized {
    /// The configuration key prefix (e.g., `"stowage.datasource"`).
    fn prefix() -> &'static str;

    /// Metadata about all expected properties.
    fn properties_metadata() -> Vec<PropertyMeta>;

    /// Construct from a `StowageConfig` instance.
    fn from_config(config: &StowageConfig) -> Result<Self, ConfigError>;

    /// Required keys of this section that are absent from `config`.
    fn missing_keys(config: &StowageConfig) -> Vec<String> {
        Self::properties_metadata()
            .iter()
            .filter(|p| p.required)
            .map(|p| p.full_key(Self::prefix()))
            .filter(|key| !config.contains_key(key))
            .collect()
    }
}
