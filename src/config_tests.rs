use super::*;
use std::collections::BTreeMap;

fn temp_paths() -> (tempfile::TempDir, DataPaths) {
    let dir = tempfile::tempdir().expect("temp dir");
    let paths = DataPaths::new(dir.path().to_path_buf());
    (dir, paths)
}

#[test]
fn missing_config_loads_defaults() {
    let (_dir, paths) = temp_paths();
    let config = load_config(&paths).expect("load defaults");
    assert_eq!(config, default_config());
    assert_eq!(config.provider.base_url, DEFAULT_PROVIDER_URL);
    assert_eq!(config.provider.declined_reasons, vec!["customer-busy"]);
    validate_config(&config).expect("defaults are valid");
}

#[test]
fn config_round_trips_through_disk() {
    let (_dir, paths) = temp_paths();
    let mut config = default_config();
    config.provider.assistant_id = Some("asst-1".to_string());
    config.provider.default_country_code = Some("+91".to_string());
    write_config(&paths, &config).expect("write");
    assert_eq!(load_config(&paths).expect("load"), config);
}

#[test]
fn partial_provider_section_fills_defaults() {
    let (_dir, paths) = temp_paths();
    std::fs::write(
        paths.config_path(),
        r#"{"schema_version":1,"provider":{"api_key":"secret"}}"#,
    )
    .expect("write config");
    let config = load_config(&paths).expect("load");
    assert_eq!(config.provider.api_key.as_deref(), Some("secret"));
    assert_eq!(config.provider.timeout_ms, 30_000);
}

#[test]
fn unknown_fields_are_rejected() {
    let (_dir, paths) = temp_paths();
    std::fs::write(
        paths.config_path(),
        r#"{"schema_version":1,"provider":{"apiKey":"camel"}}"#,
    )
    .expect("write config");
    assert!(load_config(&paths).is_err());
}

#[test]
fn validate_config_rejects_bad_values() {
    let mut wrong_schema = default_config();
    wrong_schema.schema_version = 7;
    assert!(validate_config(&wrong_schema).is_err());

    let mut empty_url = default_config();
    empty_url.provider.base_url = "  ".to_string();
    assert!(validate_config(&empty_url).is_err());

    let mut no_scheme = default_config();
    no_scheme.provider.base_url = "api.vapi.ai".to_string();
    assert!(validate_config(&no_scheme).is_err());

    let mut zero_timeout = default_config();
    zero_timeout.provider.timeout_ms = 0;
    assert!(validate_config(&zero_timeout).is_err());
}

#[test]
fn env_overrides_win_over_file_values() {
    let mut config = default_config();
    config.provider.api_key = Some("from-file".to_string());
    config.provider.assistant_id = Some("file-assistant".to_string());

    let env: BTreeMap<&str, &str> = BTreeMap::from([
        (ENV_API_KEY, "from-env"),
        (ENV_PROVIDER_URL, "http://127.0.0.1:9"),
        (ENV_ASSISTANT_ID, ""),
    ]);
    apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

    assert_eq!(config.provider.api_key.as_deref(), Some("from-env"));
    assert_eq!(config.provider.base_url, "http://127.0.0.1:9");
    assert_eq!(
        config.provider.assistant_id.as_deref(),
        Some("file-assistant"),
        "blank env values are ignored"
    );
}
