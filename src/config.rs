use regex::Regex;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use crate::errors::{PresetError, Result};

/// Custom property name used when `unColor` is `true`
pub const DEFAULT_UN_COLOR: &str = "--un-color";

/// User-facing preset options.
///
/// Every field is optional; missing fields fall back to the values built by
/// [`UsefulOptions::with_defaults`]. Keys use camelCase in YAML and JSON files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UsefulOptions {
    /// Theme overrides, including the `extend` section
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Map<String, Value>>,

    /// Mark generated declarations with `!important`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub important: Option<ImportantOption>,

    /// Hoist color channels into a custom property
    #[serde(skip_serializing_if = "Option::is_none")]
    pub un_color: Option<UnColorOption>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preflights: Option<PreflightsOption>,

    #[serde(deserialize_with = "truthy_flag", skip_serializing_if = "Option::is_none")]
    pub enable_default_shortcuts: Option<bool>,

    /// Deprecated: use `magicss` instead
    #[serde(deserialize_with = "truthy_flag", skip_serializing_if = "Option::is_none")]
    pub enable_magic_animations: Option<bool>,

    /// Deprecated: use `preflights.reset` instead
    #[serde(deserialize_with = "truthy_flag", skip_serializing_if = "Option::is_none")]
    pub enable_reset_styles: Option<bool>,

    // Presets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uno: Option<PluginToggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributify: Option<PluginToggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icons: Option<PluginToggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_fonts: Option<PluginToggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typography: Option<PluginToggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tagify: Option<PluginToggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rem_to_px: Option<PluginToggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magicss: Option<PluginToggle>,

    // Transformers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directives: Option<PluginToggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_group: Option<PluginToggle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compile_class: Option<PluginToggle>,
}

/// Options after the shallow merge over the defaults.
///
/// Object-valued toggles from the user replace the default object whole.
#[derive(Debug, Clone)]
pub struct OptionsWithDefaults {
    pub theme: Map<String, Value>,
    pub important: ImportantOption,
    pub un_color: UnColorOption,
    pub preflights: PreflightsOption,
    pub enable_default_shortcuts: bool,
    pub enable_magic_animations: bool,
    pub enable_reset_styles: bool,
    pub uno: PluginToggle,
    pub attributify: PluginToggle,
    pub icons: PluginToggle,
    pub web_fonts: PluginToggle,
    pub typography: PluginToggle,
    pub tagify: PluginToggle,
    pub rem_to_px: PluginToggle,
    pub magicss: PluginToggle,
    pub directives: PluginToggle,
    pub variant_group: PluginToggle,
    pub compile_class: PluginToggle,
}

impl UsefulOptions {
    /// Merge these options over a freshly built set of defaults
    pub fn with_defaults(self) -> OptionsWithDefaults {
        let mut uno_defaults = Map::new();
        uno_defaults.insert("preflight".to_string(), Value::from("on-demand"));

        OptionsWithDefaults {
            theme: self.theme.unwrap_or_default(),
            important: self.important.unwrap_or(ImportantOption::Enabled(false)),
            un_color: self.un_color.unwrap_or(UnColorOption::Enabled(false)),
            preflights: self
                .preflights
                .unwrap_or(PreflightsOption::Options { reset: Some(true) }),
            enable_default_shortcuts: self.enable_default_shortcuts.unwrap_or(true),
            enable_magic_animations: self.enable_magic_animations.unwrap_or(false),
            enable_reset_styles: self.enable_reset_styles.unwrap_or(true),
            uno: self.uno.unwrap_or(PluginToggle::Options(uno_defaults)),
            attributify: self.attributify.unwrap_or(PluginToggle::Enabled(true)),
            icons: self.icons.unwrap_or(PluginToggle::Enabled(true)),
            web_fonts: self.web_fonts.unwrap_or(PluginToggle::Enabled(false)),
            typography: self.typography.unwrap_or(PluginToggle::Enabled(false)),
            tagify: self.tagify.unwrap_or(PluginToggle::Enabled(false)),
            rem_to_px: self.rem_to_px.unwrap_or(PluginToggle::Enabled(false)),
            magicss: self.magicss.unwrap_or(PluginToggle::Enabled(false)),
            directives: self.directives.unwrap_or(PluginToggle::Enabled(true)),
            variant_group: self.variant_group.unwrap_or(PluginToggle::Enabled(true)),
            compile_class: self.compile_class.unwrap_or(PluginToggle::Enabled(false)),
        }
    }

    /// Load options from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = read_config(path)?;
        serde_yaml::from_str(&content).map_err(|e| PresetError::ConfigError {
            message: format!("Failed to parse YAML config: {}", e),
        })
    }

    /// Load options from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = read_config(path)?;
        serde_json::from_str(&content).map_err(|e| PresetError::ConfigError {
            message: format!("Failed to parse JSON config: {}", e),
        })
    }

    /// Load options from a file (auto-detect format)
    pub fn from_file(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(PresetError::ConfigError {
                message: format!(
                    "Unsupported config file format: {}. Use .yaml, .yml, or .json",
                    path.display()
                ),
            }),
        }
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| PresetError::ConfigError {
        message: format!("Failed to read config file {}: {}", path.display(), e),
    })
}

/// A sub-preset or transformer switch: a bare flag or an options object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginToggle {
    Enabled(bool),
    Options(Map<String, Value>),
    /// Any other value, judged by truthiness
    Other(Value),
}

impl PluginToggle {
    pub fn is_enabled(&self) -> bool {
        match self {
            PluginToggle::Enabled(enabled) => *enabled,
            PluginToggle::Options(_) => true,
            PluginToggle::Other(value) => is_truthy(value),
        }
    }

    /// Options object carried by the toggle, if any
    pub fn options(&self) -> Option<&Map<String, Value>> {
        match self {
            PluginToggle::Options(options) => Some(options),
            _ => None,
        }
    }
}

/// `important` as written by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImportantOption {
    Enabled(bool),
    Rules(ImportantRulesOption),
    Other(Value),
}

/// Partial include/exclude lists; missing lists take the defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportantRulesOption {
    #[serde(deserialize_with = "lenient_matchers", skip_serializing_if = "Option::is_none")]
    pub includes: Option<Vec<Matcher>>,
    #[serde(deserialize_with = "lenient_matchers", skip_serializing_if = "Option::is_none")]
    pub excludes: Option<Vec<Matcher>>,
}

/// `unColor` as written by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnColorOption {
    Enabled(bool),
    Name(String),
    Other(Value),
}

/// `preflights` as written by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreflightsOption {
    Enabled(bool),
    Options {
        #[serde(
            default,
            deserialize_with = "truthy_flag",
            skip_serializing_if = "Option::is_none"
        )]
        reset: Option<bool>,
    },
    /// Any other value, judged by truthiness
    Other(Value),
}

/// Matches a class name or property name.
///
/// Written as a plain string for an exact match, or `/source/flags` for a
/// regular expression (`i` is honored, `g`, `m`, `s`, `u` and `y` are accepted).
#[derive(Clone)]
pub enum Matcher {
    Exact(String),
    Pattern(Regex),
}

impl Matcher {
    pub fn exact(value: impl Into<String>) -> Self {
        Matcher::Exact(value.into())
    }

    pub fn pattern(source: &str) -> Result<Self> {
        Regex::new(source)
            .map(Matcher::Pattern)
            .map_err(|e| PresetError::InvalidMatcher {
                pattern: source.to_string(),
                message: e.to_string(),
            })
    }

    /// The catch-all include used when none is configured
    pub fn match_all() -> Self {
        Matcher::Pattern(Regex::new(".*").expect("static pattern is valid"))
    }

    /// Parse the textual form used in configuration files
    pub fn parse(raw: &str) -> Result<Self> {
        if let Some(body) = raw.strip_prefix('/') {
            if let Some(end) = body.rfind('/') {
                let (source, flags) = (&body[..end], &body[end + 1..]);
                if flags.chars().all(|c| "gimsuy".contains(c)) {
                    return if flags.contains('i') {
                        Self::pattern(&format!("(?i){}", source))
                    } else {
                        Self::pattern(source)
                    };
                }
            }
        }
        Ok(Matcher::Exact(raw.to_string()))
    }

    pub fn matches(&self, subject: &str) -> bool {
        match self {
            Matcher::Exact(value) => value == subject,
            Matcher::Pattern(regex) => regex.is_match(subject),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Exact(value) => f.write_str(value),
            Matcher::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Exact(value) => write!(f, "Exact({:?})", value),
            Matcher::Pattern(regex) => write!(f, "Pattern(/{}/)", regex.as_str()),
        }
    }
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Matcher::Exact(a), Matcher::Exact(b)) => a == b,
            (Matcher::Pattern(a), Matcher::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Serialize for Matcher {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Matcher {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Matcher::parse(&raw).map_err(de::Error::custom)
    }
}

/// Read a flag of any JSON type as its truthiness
fn truthy_flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<bool>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(Some(is_truthy(&value)))
}

/// Read a matcher list, dropping entries that are not valid matchers
fn lenient_matchers<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Vec<Matcher>>, D::Error> {
    let entries = match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries,
        Value::Null => return Ok(None),
        single => vec![single],
    };

    let matchers = entries
        .iter()
        .filter_map(|entry| {
            let parsed = match entry {
                Value::String(raw) => Matcher::parse(raw),
                other => Err(PresetError::InvalidMatcher {
                    pattern: other.to_string(),
                    message: "expected a string".to_string(),
                }),
            };
            parsed
                .map_err(|e| tracing::warn!(error = %e, "dropping important matcher"))
                .ok()
        })
        .collect();
    Ok(Some(matchers))
}

/// Truthiness of a loosely typed option value
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_batteries_included() {
        let options = UsefulOptions::default().with_defaults();
        assert!(options.uno.is_enabled());
        assert_eq!(
            options.uno.options().and_then(|o| o.get("preflight")),
            Some(&Value::from("on-demand"))
        );
        assert!(options.attributify.is_enabled());
        assert!(options.icons.is_enabled());
        assert!(!options.web_fonts.is_enabled());
        assert!(options.directives.is_enabled());
        assert!(options.variant_group.is_enabled());
        assert!(!options.compile_class.is_enabled());
        assert_eq!(options.important, ImportantOption::Enabled(false));
        assert!(options.enable_default_shortcuts);
    }

    #[test]
    fn test_user_object_replaces_default_object() {
        let mut dark = Map::new();
        dark.insert("dark".to_string(), Value::from("class"));
        let options = UsefulOptions {
            uno: Some(PluginToggle::Options(dark.clone())),
            ..Default::default()
        }
        .with_defaults();
        assert_eq!(options.uno, PluginToggle::Options(dark));
    }

    #[test]
    fn test_matcher_parsing() {
        assert_eq!(Matcher::parse("color").unwrap(), Matcher::exact("color"));
        let pattern = Matcher::parse("/bg-/").unwrap();
        assert!(pattern.matches("bg-red"));
        assert!(!pattern.matches("background-color"));

        let flagged = Matcher::parse("/BG-/gi").unwrap();
        assert!(flagged.matches("bg-red"));

        // A trailing slash without a leading one stays literal
        assert_eq!(Matcher::parse("a/").unwrap(), Matcher::exact("a/"));
        assert!(Matcher::parse("/(/").is_err());
    }

    #[test]
    fn test_loose_values_are_coerced() {
        let options: UsefulOptions =
            serde_json::from_str(r#"{"icons": 0, "tagify": "yes", "unColor": 1, "important": null}"#)
                .unwrap();
        let options = options.with_defaults();
        assert!(!options.icons.is_enabled());
        assert!(options.tagify.is_enabled());
        assert_eq!(options.un_color, UnColorOption::Other(Value::from(1)));
        assert_eq!(options.important, ImportantOption::Enabled(false));
    }

    #[test]
    fn test_loose_flags_and_preflights_are_coerced() {
        let options: UsefulOptions = serde_json::from_value(serde_json::json!({
            "preflights": 0,
            "enableDefaultShortcuts": 1,
            "enableResetStyles": "",
            "enableMagicAnimations": null
        }))
        .unwrap();
        assert_eq!(options.preflights, Some(PreflightsOption::Other(Value::from(0))));
        assert_eq!(options.enable_default_shortcuts, Some(true));
        assert_eq!(options.enable_reset_styles, Some(false));
        assert_eq!(options.enable_magic_animations, Some(false));

        let options: UsefulOptions =
            serde_json::from_str(r#"{"preflights": {"reset": "no"}}"#).unwrap();
        assert_eq!(options.preflights, Some(PreflightsOption::Options { reset: Some(true) }));

        let options: UsefulOptions = serde_json::from_str(r#"{"preflights": "yes"}"#).unwrap();
        assert_eq!(
            options.preflights,
            Some(PreflightsOption::Other(Value::from("yes")))
        );
    }

    #[test]
    fn test_invalid_matchers_are_dropped() {
        let options: UsefulOptions = serde_json::from_str(
            r#"{"important": {"excludes": ["/([/", "color", 3], "includes": "/bg-/"}}"#,
        )
        .unwrap();
        match options.important {
            Some(ImportantOption::Rules(rules)) => {
                assert_eq!(rules.excludes, Some(vec![Matcher::exact("color")]));
                assert_eq!(rules.includes, Some(vec![Matcher::parse("/bg-/").unwrap()]));
            }
            other => panic!("unexpected important option: {:?}", other),
        }
    }

    #[test]
    fn test_yaml_config_loading() {
        let yaml_content = r##"
unColor: "--brand-color"
important:
  excludes:
    - color
    - "/bg-/"
webFonts:
  fonts:
    sans: Inter
preflights: false
"##;

        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(yaml_content.as_bytes()).unwrap();

        let options = UsefulOptions::from_file(file.path()).unwrap();
        assert_eq!(
            options.un_color,
            Some(UnColorOption::Name("--brand-color".to_string()))
        );
        match options.important {
            Some(ImportantOption::Rules(rules)) => {
                assert!(rules.includes.is_none());
                let excludes = rules.excludes.unwrap();
                assert_eq!(excludes[0], Matcher::exact("color"));
                assert!(matches!(excludes[1], Matcher::Pattern(_)));
            }
            other => panic!("unexpected important option: {:?}", other),
        }
        assert!(options.web_fonts.unwrap().options().is_some());
        assert_eq!(options.preflights, Some(PreflightsOption::Enabled(false)));
    }

    #[test]
    fn test_json_config_loading() {
        let json_content = r##"{
  "important": true,
  "theme": { "colors": { "brand": "#0066cc" } }
}"##;

        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(json_content.as_bytes()).unwrap();

        let options = UsefulOptions::from_file(file.path()).unwrap();
        assert_eq!(options.important, Some(ImportantOption::Enabled(true)));
        assert!(options.theme.unwrap().contains_key("colors"));
    }

    #[test]
    fn test_unsupported_config_format() {
        let file = NamedTempFile::with_suffix(".toml").unwrap();
        let err = UsefulOptions::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported config file format"));
    }
}
