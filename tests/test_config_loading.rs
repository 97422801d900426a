//! Configuration loading and validation tests
//!
//! Tests focus on BEHAVIOR of configuration loading, validation, and error handling.
//! We test observable outcomes, not implementation details of TOML parsing.


use query_router::config::{ConfigError, QueryRouterConfig};
use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "{content}").unwrap();
    temp_file
}

#[test]
fn test_config_loads_successfully_from_valid_toml() {
    let temp_file = write_config(
        r#"
[llm]
provider = "openai"
model = "gpt-4o-mini"
api_key_env = "OPENAI_API_KEY"

[retrieval]
corpus_dir = "knowledge"

[search]
max_results = 3
"#,
    );

    let config = QueryRouterConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.llm.provider, "openai");
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert_eq!(config.retrieval.corpus_dir, PathBuf::from("knowledge"));
    assert_eq!(config.retrieval.extension, "txt");
    assert_eq!(config.search.max_results, 3);
    assert_eq!(config.search.max_iterations, 5);
}

#[test]
fn test_defaults_match_helper_config() {
    let temp_file = write_config(
        r#"
[llm]
provider = "openai"
model = "gpt-4o-mini"
"#,
    );

    let config = QueryRouterConfig::load_from_file(temp_file.path()).unwrap();
    assert_eq!(config, test_helpers::test_config());
}

#[test]
fn test_config_returns_error_when_llm_section_missing() {
    let temp_file = write_config("[retrieval]\ntop_k = 3\n");

    let result = QueryRouterConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_config_returns_error_for_invalid_toml_syntax() {
    let temp_file = write_config("[llm\nprovider = ");

    let result = QueryRouterConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_config_returns_error_for_empty_file() {
    let temp_file = write_config("");

    let result = QueryRouterConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_config_returns_error_when_file_not_found() {
    let dir = TempDir::new().unwrap();

    let result = QueryRouterConfig::load_from_file(&dir.path().join("missing.toml"));
    assert!(matches!(result, Err(ConfigError::FileRead(_))));
}

#[test]
fn test_config_rejects_unsupported_provider() {
    let temp_file = write_config(
        r#"
[llm]
provider = "anthropic"
model = "claude"
"#,
    );

    let result = QueryRouterConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
}

#[test]
fn test_config_rejects_out_of_range_values() {
    for section in [
        "[llm]\nprovider = \"openai\"\nmodel = \"m\"\ntemperature = -0.1",
        "[llm]\nprovider = \"openai\"\nmodel = \"m\"\n[retrieval]\ntop_k = 0",
        "[llm]\nprovider = \"openai\"\nmodel = \"m\"\n[search]\nmax_results = 0",
        "[llm]\nprovider = \"openai\"\nmodel = \"m\"\n[search]\ntimeout_secs = 0",
    ] {
        let temp_file = write_config(section);
        let result = QueryRouterConfig::load_from_file(temp_file.path());
        assert!(
            matches!(result, Err(ConfigError::InvalidConfig(_))),
            "Expected InvalidConfig for:\n{section}"
        );
    }
}

#[test]
fn test_find_config_file_prefers_first_existing() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("query-router.toml");
    let second = dir.path().join("config.toml");
    std::fs::write(&second, "").unwrap();

    assert_eq!(
        QueryRouterConfig::find_config_file(&[&first, &second]).unwrap(),
        second
    );

    std::fs::write(&first, "").unwrap();
    assert_eq!(
        QueryRouterConfig::find_config_file(&[&first, &second]).unwrap(),
        first
    );
}

#[test]
fn test_api_keys_resolve_from_environment() {
    let temp_file = write_config(
        r#"
[llm]
provider = "openai"
model = "gpt-4o-mini"
api_key_env = "QUERY_ROUTER_TEST_LLM_KEY"

[search]
api_key_env = "QUERY_ROUTER_TEST_SEARCH_KEY"
"#,
    );
    std::env::set_var("QUERY_ROUTER_TEST_LLM_KEY", "sk-test123");
    std::env::set_var("QUERY_ROUTER_TEST_SEARCH_KEY", "tvly-test456");

    let config = QueryRouterConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.get_llm_api_key().unwrap(), "sk-test123");
    assert_eq!(config.get_search_api_key().unwrap(), "tvly-test456");

    std::env::remove_var("QUERY_ROUTER_TEST_LLM_KEY");
    std::env::remove_var("QUERY_ROUTER_TEST_SEARCH_KEY");
}

#[test]
fn test_missing_api_key_names_the_variable() {
    let temp_file = write_config(
        r#"
[llm]
provider = "openai"
model = "gpt-4o-mini"

[search]
api_key_env = "QUERY_ROUTER_TEST_NONEXISTENT_KEY"
"#,
    );

    let config = QueryRouterConfig::load_from_file(temp_file.path()).unwrap();

    match config.get_search_api_key() {
        Err(ConfigError::EnvVarNotFound(var)) => {
            assert_eq!(var, "QUERY_ROUTER_TEST_NONEXISTENT_KEY");
        }
        other => panic!("Expected EnvVarNotFound error, got {other:?}"),
    }
}
