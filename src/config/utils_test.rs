use std::time::Duration;

use crate::config::{
    StorageConfig,
    constants::{DEFAULT_IDLE_TIMEOUT_SECS, GREETING},
};

use super::*;

#[test]
fn test_load_configuration() {
    unsafe {
        std::env::set_var("EMPATHY_TEST_API_KEY", "secret-key");
    }
    let config = load_configuration("./testdata/config.toml").expect("failed to load config");

    assert_eq!(config.general.verbose, true);
    assert_eq!(
        config.general.greeting.as_deref(),
        Some("How is your day going?")
    );

    let log = &config.log;
    assert_eq!(log.level.as_deref(), Some("info"));
    let log_filters = log.filters.as_deref().unwrap_or_default();
    assert_eq!(log_filters.len(), 1);
    assert_eq!(
        log_filters[0].module.as_deref(),
        Some("empathy_chat::backend")
    );

    let log_file = log.file.as_ref().expect("log file is set");
    assert_eq!(log_file.path, "/var/log/empathy.log");
    assert_eq!(log_file.append, true);

    let backend = &config.backend;
    assert_eq!(backend.alias.as_deref(), Some("supabase"));
    assert_eq!(
        backend.endpoint,
        "https://project.supabase.co/functions/v1/empathy-chat"
    );
    assert_eq!(backend.api_key.as_deref(), Some("secret-key"));
    assert_eq!(backend.timeout(), Some(Duration::from_secs(30)));
    assert_eq!(backend.idle_timeout(), Some(Duration::from_secs(45)));

    match &config.storage {
        StorageConfig::Sqlite(sqlite) => {
            assert_eq!(sqlite.path(), Some("/var/lib/empathy/chat.db"));
        }
    }

    assert_eq!(
        config.session.user_id.as_deref(),
        Some("8d0b3a4e-6f1c-4a3b-9a57-2f1e0c9d7b11")
    );
    assert_eq!(config.session.email.as_deref(), Some("someone@example.com"));
}

#[test]
fn test_load_configuration_with_some_default_fields() {
    let config =
        load_configuration("./testdata/config_with_default.toml").expect("failed to load config");

    assert_eq!(config.general.verbose, false);
    assert_eq!(config.general.greeting.as_deref(), Some(GREETING));
    assert_eq!(config.log.level.as_deref(), Some("warn"));
    assert!(config.log.file.is_none());

    assert!(config.backend.api_key.is_none());
    assert_eq!(config.backend.timeout(), None);
    assert_eq!(
        config.backend.idle_timeout(),
        Some(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS as u64))
    );

    match &config.storage {
        StorageConfig::Sqlite(sqlite) => assert_eq!(sqlite.path(), None),
    }
    assert!(config.session.user_id.is_none());
}

#[test]
fn test_expand_env() {
    let ret = expand_env("Bearer ${EMPATHY_UNSET_VARIABLE}").expect("failed to expand");
    assert_eq!(ret, "Bearer ");

    unsafe {
        std::env::set_var("EMPATHY_EXPAND_TOKEN", "abc123");
    }
    let ret = expand_env("$EMPATHY_EXPAND_TOKEN-${EMPATHY_EXPAND_TOKEN}").expect("failed to expand");
    assert_eq!(ret, "abc123-abc123");
}

#[test]
fn test_resolve_path() {
    let ret = resolve_path("$EMPATHY_TEST_PATH/${EMPATHY_USER_PATH}/config.toml")
        .expect("failed to resolve path");
    assert_eq!(ret, "//config.toml");

    let dir = "/tmp/test";
    let user_path = "user_path";
    unsafe {
        std::env::set_var("EMPATHY_TEST_PATH", dir);
        std::env::set_var("EMPATHY_USER_PATH", user_path);
    }
    let ret = resolve_path("$EMPATHY_TEST_PATH/${EMPATHY_USER_PATH}/config.toml")
        .expect("failed to resolve path");
    assert_eq!(ret, format!("{dir}/{user_path}/config.toml"));
}

#[test]
fn test_basename() {
    assert_eq!(basename("src/backend/decoder.rs"), "decoder.rs");
    assert_eq!(basename("main.rs"), "main.rs");
}

#[test]
fn test_configuration_override() {
    assert!(!Configuration::instance().general.verbose);

    let mut config = Configuration::default();
    config.general.verbose = true;
    config.backend.alias = Some("Companion".to_string());
    Configuration::init(config).expect("failed to init config");

    let config = Configuration::instance();
    assert!(config.general.verbose);
    assert_eq!(config.backend.alias.as_deref(), Some("Companion"));
}

#[test]
fn test_user_agent() {
    use crate::config::{VERSION, user_agent, version};

    assert_eq!(user_agent(), format!("empathy-chat/{}", VERSION));
    assert_eq!(version(), format!("empathy-chat {}", VERSION));
}
