//! Tests for CLI preferences (TOML roundtrip).

use narwhal_cli::prefs::Prefs;
use std::path::PathBuf;

#[test]
fn prefs_toml_roundtrip() {
    let prefs = Prefs {
        model: Some(PathBuf::from("/models/llama3.gguf")),
        max_tokens: 256,
        temperature: 0.2,
        top_p: 0.95,
        instructions: "Answer in French.".to_owned(),
    };

    let toml_str = toml::to_string_pretty(&prefs).unwrap();
    let parsed: Prefs = toml::from_str(&toml_str).unwrap();

    assert_eq!(parsed.model, Some(PathBuf::from("/models/llama3.gguf")));
    assert_eq!(parsed.max_tokens, 256);
    assert_eq!(parsed.temperature, 0.2);
    assert_eq!(parsed.top_p, 0.95);
    assert_eq!(parsed.instructions, "Answer in French.");
}

#[test]
fn missing_fields_fall_back_to_defaults() {
    let parsed: Prefs = toml::from_str("max_tokens = 64\n").unwrap();
    assert_eq!(parsed.max_tokens, 64);
    assert!(parsed.model.is_none());
    assert_eq!(parsed.temperature, 0.7);
    assert_eq!(parsed.top_p, 0.9);
    assert_eq!(parsed.instructions, "You are a helpful assistant.");
}
