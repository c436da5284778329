use stowage_core::config::{
    ConfigError, ConfigProperties, ConfigValue, DefaultSecretResolver, PropertyMeta,
    StowageConfig,
};

#[test]
fn test_empty_config() {
    let config = StowageConfig::empty();
    assert!(config.get::<String>("nonexistent").is_err());
}

#[test]
fn test_set_and_get() {
    let mut config = StowageConfig::empty();
    config.set("stowage.name", ConfigValue::String("test".into()));
    assert_eq!(config.get::<String>("stowage.name").unwrap(), "test");
}

#[test]
fn test_get_or_default() {
    let config = StowageConfig::empty();
    assert_eq!(config.get_or("missing", 42i64), 42);
}

#[test]
fn test_get_opt_distinguishes_missing_from_mismatch() {
    let mut config = StowageConfig::empty();
    config.set("port", ConfigValue::String("not-a-number".into()));
    assert!(config.get_opt::<u16>("absent").unwrap().is_none());
    assert!(matches!(
        config.get_opt::<u16>("port"),
        Err(ConfigError::TypeMismatch { .. })
    ));
}

#[test]
fn test_type_conversions() {
    let mut config = StowageConfig::empty();
    config.set("int_val", ConfigValue::Integer(42));
    config.set("float_val", ConfigValue::Float(2.5));
    config.set("bool_val", ConfigValue::Bool(true));
    config.set("bool_str", ConfigValue::String("yes".into()));
    config.set("null_val", ConfigValue::Null);

    assert_eq!(config.get::<i64>("int_val").unwrap(), 42);
    assert_eq!(config.get::<u32>("int_val").unwrap(), 42);
    assert_eq!(config.get::<f64>("float_val").unwrap(), 2.5);
    assert!(config.get::<bool>("bool_val").unwrap());
    assert!(config.get::<bool>("bool_str").unwrap());
    assert_eq!(config.get::<String>("int_val").unwrap(), "42");
    assert!(config.get::<Option<String>>("null_val").unwrap().is_none());
}

#[test]
fn test_negative_value_rejected_for_unsigned() {
    let mut config = StowageConfig::empty();
    config.set("n", ConfigValue::Integer(-1));
    assert!(config.get::<u64>("n").is_err());
}

#[test]
fn test_flatten_yaml() {
    let yaml = r#"
stowage:
  datasource:
    driver: sqlite
    filename: ":memory:"
    max_connections: 1
"#;
    let config = StowageConfig::from_yaml_str(yaml, "test").unwrap();

    assert_eq!(
        config.get::<String>("stowage.datasource.driver").unwrap(),
        "sqlite"
    );
    assert_eq!(
        config.get::<String>("stowage.datasource.filename").unwrap(),
        ":memory:"
    );
    assert_eq!(
        config.get::<i64>("stowage.datasource.max_connections").unwrap(),
        1
    );
}

#[test]
fn test_list_config() {
    let yaml = r#"
posts:
  fields:
    - id
    - title
"#;
    let config = StowageConfig::from_yaml_str(yaml, "test").unwrap();
    let fields: Vec<String> = config.get("posts.fields").unwrap();
    assert_eq!(fields, vec!["id", "title"]);
    assert_eq!(config.get::<String>("posts.fields.1").unwrap(), "title");
}

#[test]
fn test_single_value_as_vec() {
    let mut config = StowageConfig::empty();
    config.set("single", ConfigValue::String("only-one".into()));
    let result: Vec<String> = config.get("single").unwrap();
    assert_eq!(result, vec!["only-one"]);
}

#[test]
fn test_invalid_yaml_is_load_error() {
    let result = StowageConfig::from_yaml_str("a: [unclosed", "test");
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
fn test_load_from_dir_with_profile_and_secret() {
    let dir = tempfile::tempdir().unwrap();
    let secret = dir.path().join("db_password");
    std::fs::write(&secret, "hunter2\n").unwrap();

    std::fs::write(
        dir.path().join("application.yaml"),
        format!(
            "cfgtest:\n  driver: sqlite\n  password: \"${{file:{}}}\"\n",
            secret.display()
        ),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("application-staging.yaml"),
        "cfgtest:\n  driver: postgres\n",
    )
    .unwrap();

    let config = StowageConfig::load_from(dir.path(), "staging", &DefaultSecretResolver).unwrap();
    assert_eq!(config.profile(), "staging");
    assert_eq!(config.get::<String>("cfgtest.driver").unwrap(), "postgres");
    assert_eq!(config.get::<String>("cfgtest.password").unwrap(), "hunter2");
}

#[test]
fn test_env_overrides_yaml() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("application.yaml"),
        "envtest:\n  host: from-yaml\n",
    )
    .unwrap();

    unsafe { std::env::set_var("ENVTEST_HOST", "from-env") };
    let config = StowageConfig::load_from(dir.path(), "dev", &DefaultSecretResolver).unwrap();
    unsafe { std::env::remove_var("ENVTEST_HOST") };

    assert_eq!(config.get::<String>("envtest.host").unwrap(), "from-env");
}

// --- ConfigProperties ---

#[derive(Debug)]
struct PoolSection {
    url: String,
    size: u32,
}

impl ConfigProperties for PoolSection {
    fn prefix() -> &'static str {
        "app.pool"
    }

    fn properties_metadata() -> Vec<PropertyMeta> {
        vec![
            PropertyMeta {
                key: "url",
                type_name: "String",
                required: true,
                default_value: None,
                description: None,
            },
            PropertyMeta {
                key: "size",
                type_name: "u32",
                required: false,
                default_value: Some("4"),
                description: None,
            },
        ]
    }

    fn from_config(config: &StowageConfig) -> Result<Self, ConfigError> {
        Ok(PoolSection {
            url: config.get("app.pool.url")?,
            size: config.get_or("app.pool.size", 4),
        })
    }
}

#[test]
fn test_config_properties_defaults() {
    let config = StowageConfig::from_yaml_str("app:\n  pool:\n    url: x\n", "test").unwrap();
    let section: PoolSection = config.section().unwrap();
    assert_eq!(section.url, "x");
    assert_eq!(section.size, 4);
}

#[test]
fn test_config_properties_missing_required() {
    let config = StowageConfig::empty();
    assert!(config.section::<PoolSection>().is_err());
    assert_eq!(PoolSection::missing_keys(&config), vec!["app.pool.url"]);
    assert_eq!(
        PoolSection::properties_metadata()[0].env_var(PoolSection::prefix()),
        "APP_POOL_URL"
    );
}
