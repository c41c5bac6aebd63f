use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;
use useful_preset::{load_options, resolve_command, Matcher, PresetError, ResolveArgs};

fn resolve_file(name: &str, content: &str) -> Value {
    let temp_dir = tempdir().unwrap();
    let config = temp_dir.path().join(name);
    fs::write(&config, content).unwrap();

    let json = resolve_command(&ResolveArgs {
        config: Some(config),
        compact: true,
    })
    .unwrap();
    serde_json::from_str(&json).unwrap()
}

fn plugin_names(resolved: &Value, kind: &str) -> Vec<String> {
    resolved["meta"][kind]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_resolve_without_config_uses_defaults() {
    let json = resolve_command(&ResolveArgs {
        config: None,
        compact: false,
    })
    .unwrap();
    assert!(json.contains('\n'));

    let resolved: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(plugin_names(&resolved, "presets"), ["uno", "attributify", "icons"]);
    assert_eq!(plugin_names(&resolved, "transformers"), ["directives", "variantGroup"]);
    assert_eq!(resolved["important"], Value::Null);
    assert_eq!(resolved["unColor"], Value::Null);
    assert_eq!(resolved["preflights"], json!({ "reset": true }));
    assert_eq!(resolved["enableDefaultShortcuts"], json!(true));
    assert_eq!(resolved["meta"]["presets"][0]["package"], json!("@unocss/preset-uno"));
}

#[test]
fn test_resolve_yaml_config() {
    let resolved = resolve_file(
        "useful.yaml",
        r#"
unColor: --brand-color
important:
  excludes:
    - color
    - /bg-/
typography: true
compileClass:
  trigger: ":uno:"
preflights:
  reset: false
"#,
    );

    assert_eq!(resolved["unColor"], json!("--brand-color"));
    assert_eq!(
        resolved["important"],
        json!({ "includes": ["/.*/"], "excludes": ["color", "/bg-/"] })
    );
    assert_eq!(resolved["preflights"], json!({ "reset": false }));
    assert_eq!(
        plugin_names(&resolved, "presets"),
        ["uno", "attributify", "icons", "typography"]
    );
    assert_eq!(
        plugin_names(&resolved, "transformers"),
        ["directives", "variantGroup", "compileClass"]
    );
    assert_eq!(resolved["meta"]["transformers"][2]["options"]["trigger"], json!(":uno:"));
}

#[test]
fn test_resolve_json_config() {
    let resolved = resolve_file(
        "useful.json",
        r#"{
            "unColor": true,
            "important": true,
            "attributify": false,
            "preflights": false,
            "enableDefaultShortcuts": false
        }"#,
    );

    assert_eq!(resolved["unColor"], json!("--un-color"));
    assert_eq!(resolved["important"], json!({ "includes": ["/.*/"], "excludes": [] }));
    assert_eq!(resolved["preflights"], Value::Null);
    assert_eq!(resolved["enableDefaultShortcuts"], json!(false));
    assert_eq!(plugin_names(&resolved, "presets"), ["uno", "icons"]);
}

#[test]
fn test_falsy_values_disable_features() {
    let resolved = resolve_file(
        "useful.json",
        r#"{ "unColor": "", "important": false, "icons": 0 }"#,
    );
    assert_eq!(resolved["unColor"], Value::Null);
    assert_eq!(resolved["important"], Value::Null);
    assert_eq!(plugin_names(&resolved, "presets"), ["uno", "attributify"]);
}

#[test]
fn test_theme_extension_from_yaml() {
    let resolved = resolve_file(
        "useful.yml",
        r#"
theme:
  extend:
    animation:
      wiggle: wiggle 0.5s ease-in-out infinite
    keyframes:
      wiggle:
        0%, 100%:
          transform: rotate(-3deg)
        50%:
          transform: rotate(3deg)
"#,
    );

    let animation = &resolved["theme"]["animation"];
    assert_eq!(animation["durations"]["wiggle"], json!("0.5s"));
    assert_eq!(animation["timingFns"]["wiggle"], json!("ease-in-out"));
    assert_eq!(animation["counts"]["wiggle"], json!("infinite"));
    assert_eq!(
        animation["keyframes"]["wiggle"],
        json!("{0%, 100%{transform:rotate(-3deg);}50%{transform:rotate(3deg);}}")
    );
    assert!(resolved["theme"].get("extend").is_none());
}

#[test]
fn test_unsupported_config_extension() {
    let temp_dir = tempdir().unwrap();
    let config = temp_dir.path().join("useful.toml");
    fs::write(&config, "important = true").unwrap();

    let result = load_options(Some(&config));
    assert!(matches!(result, Err(PresetError::ConfigError { .. })));
}

#[test]
fn test_invalid_matcher_pattern() {
    let result = Matcher::parse("/([/");
    assert!(matches!(result, Err(PresetError::InvalidMatcher { .. })));

    // Only a slash-delimited source with known flags is a pattern
    assert_eq!(Matcher::parse("/bg-/x").unwrap(), Matcher::exact("/bg-/x"));
    assert!(Matcher::parse("/BG-/i").unwrap().matches("bg-red"));
}

#[test]
fn test_missing_config_file() {
    let temp_dir = tempdir().unwrap();
    let result = load_options(Some(&temp_dir.path().join("missing.yaml")));
    assert!(matches!(result, Err(PresetError::ConfigError { .. })));
}
