use parley::config::{RelayConfig, load, validate};

#[test]
fn default_config_has_sensible_values() {
    let config = RelayConfig::default();
    assert_eq!(config.gateway.port, 8000);
    assert_eq!(config.gateway.bind, "127.0.0.1");
    assert_eq!(config.inference.base_url, "http://localhost:11434/api");
    assert_eq!(config.inference.timeout_secs, 60);
    assert_eq!(config.inference.fallback_model, "dolphin-phi");
    assert_eq!(config.conversation.context_window, 2);
    assert!(validate(&config).is_ok());
}

#[test]
fn valid_toml_parses_successfully() {
    let toml_str = r#"
[gateway]
port = 9100
bind = "0.0.0.0"

[inference]
base_url = "http://ollama:11434/api"
timeout_secs = 120
fallback_model = "llama3"

[conversation]
context_window = 6
"#;

    let config: RelayConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(config.gateway.port, 9100);
    assert_eq!(config.gateway.bind, "0.0.0.0");
    assert_eq!(config.inference.base_url, "http://ollama:11434/api");
    assert_eq!(config.inference.timeout_secs, 120);
    assert_eq!(config.inference.fallback_model, "llama3");
    assert_eq!(config.conversation.context_window, 6);
    assert!(validate(&config).is_ok());
}

#[test]
fn partial_config_uses_defaults_for_missing_fields() {
    let toml_str = r#"
[inference]
timeout_secs = 5
"#;

    let config: RelayConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(config.gateway.port, 8000);
    assert_eq!(config.inference.timeout_secs, 5);
    assert_eq!(config.inference.base_url, "http://localhost:11434/api");
    assert_eq!(config.conversation.context_window, 2);
}

#[test]
fn empty_toml_uses_all_defaults() {
    let config: RelayConfig = toml::from_str("").unwrap();
    assert_eq!(config.gateway.port, 8000);
    assert_eq!(config.conversation.context_window, 2);
}

#[test]
fn malformed_toml_returns_parse_error() {
    let result = toml::from_str::<RelayConfig>("this is not valid toml {{{");
    assert!(result.is_err());
}

#[test]
fn validate_rejects_bad_values() {
    let mut config = RelayConfig::default();
    config.inference.base_url = "not a url".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("invalid inference.base_url"), "{err}");

    let mut config = RelayConfig::default();
    config.inference.base_url = "ftp://models.local/api".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("http or https"), "{err}");

    let mut config = RelayConfig::default();
    config.inference.timeout_secs = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("timeout_secs"), "{err}");

    let mut config = RelayConfig::default();
    config.inference.fallback_model = "  ".into();
    assert!(validate(&config).is_err());
}

// Environment variables are process-wide, so every env-dependent check
// lives in this one test.
#[test]
fn load_honours_config_path_and_env_overrides() {
    let missing = std::env::temp_dir().join("parley-nonexistent-config.toml");
    let present = std::env::temp_dir().join(format!("parley-test-config-{}.toml", std::process::id()));
    std::fs::write(
        &present,
        r#"
[gateway]
port = 9999

[conversation]
context_window = 4
"#,
    )
    .unwrap();

    // SAFETY: no other test in this binary touches these variables.
    unsafe {
        std::env::set_var("PARLEY_CONFIG", &missing);
        std::env::remove_var("OLLAMA_API_URL");
    }
    let defaults = load();

    unsafe {
        std::env::set_var("PARLEY_CONFIG", &present);
        std::env::set_var("OLLAMA_API_URL", "http://gpu-box:11434/api");
    }
    let from_file = load();

    unsafe {
        std::env::set_var("OLLAMA_API_URL", "::bad::");
    }
    let bad_env = load();

    unsafe {
        std::env::remove_var("PARLEY_CONFIG");
        std::env::remove_var("OLLAMA_API_URL");
    }
    std::fs::remove_file(&present).ok();

    let defaults = defaults.unwrap();
    assert_eq!(defaults.gateway.port, 8000);

    let from_file = from_file.unwrap();
    assert_eq!(from_file.gateway.port, 9999);
    assert_eq!(from_file.conversation.context_window, 4);
    assert_eq!(from_file.inference.base_url, "http://gpu-box:11434/api");

    assert!(bad_env.is_err());
}
