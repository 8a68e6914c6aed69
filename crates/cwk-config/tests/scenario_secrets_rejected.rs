//! Scenario: credentials pasted into YAML abort loading.
//!
//! # Invariant under test
//! - A token-looking literal fails with CONFIG_SECRET_DETECTED naming the
//!   leaf, never the value.
//! - A Postgres URL carrying a password is rejected the same way.
//! - Env var names are fine.

use cwk_config::load_layered_yaml_from_strings;

#[test]
fn token_literal_is_rejected_and_redacted() {
    let yaml = "daemon:\n  cors_origins: [\"ghp_abcdefghijklmnop\"]\n";
    let err = load_layered_yaml_from_strings(&[yaml]).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("CONFIG_SECRET_DETECTED"), "{msg}");
    assert!(msg.contains("/daemon/cors_origins/0"), "{msg}");
    assert!(!msg.contains("ghp_abcdefghijklmnop"), "{msg}");
}

#[test]
fn inline_database_password_is_rejected() {
    let yaml = "database:\n  url_env: \"postgres://cwk:s3cretpw@db:5432/cwk\"\n";
    let err = load_layered_yaml_from_strings(&[yaml]).unwrap_err();
    assert!(err.to_string().contains("CONFIG_SECRET_DETECTED"));
}

#[test]
fn overlay_can_introduce_a_secret() {
    let base = "database:\n  url_env: CWK_DATABASE_URL\n";
    let overlay = "database:\n  url_env: \"sk_live_0123456789\"\n";
    assert!(load_layered_yaml_from_strings(&[base]).is_ok());
    assert!(load_layered_yaml_from_strings(&[base, overlay]).is_err());
}
