use serde::Serialize;
use serde_json::{Map, Value};
use crate::config::{
    is_truthy, ImportantOption, OptionsWithDefaults, PluginToggle, PreflightsOption, UnColorOption,
    UsefulOptions, DEFAULT_UN_COLOR,
};
use crate::postprocess::ImportantRules;
use crate::registry::{instantiate, PluginInstance, PRESETS, TRANSFORMERS};
use crate::theme::{deep_merge, normalize_theme, resolve_extend, Shortcuts};

/// Preflight switches after normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Preflights {
    /// Emit the reset stylesheet
    pub reset: bool,
}

/// Plugins and shortcuts the host registers
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedMeta {
    pub presets: Vec<PluginInstance>,
    pub transformers: Vec<PluginInstance>,
    pub shortcuts: Shortcuts,
}

/// Options in canonical form, immutable once built
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedOptions {
    pub theme: Map<String, Value>,
    pub important: Option<ImportantRules>,
    pub un_color: Option<String>,
    pub preflights: Option<Preflights>,
    pub enable_default_shortcuts: bool,
    pub meta: ResolvedMeta,
}

/// Merge user options over the defaults and bring every union-typed option
/// into canonical form
pub fn resolve_options(options: UsefulOptions) -> ResolvedOptions {
    let mut merged = options.with_defaults();

    let un_color = resolve_un_color(&merged.un_color);
    let important = resolve_important(&merged.important);
    let preflights = resolve_preflights(&merged);

    if merged.enable_magic_animations {
        tracing::warn!("`enableMagicAnimations` is deprecated, use `magicss` instead");
        if !merged.magicss.is_enabled() {
            merged.magicss = PluginToggle::Enabled(true);
        }
    }

    let presets = instantiate(PRESETS, &merged);
    let transformers = instantiate(TRANSFORMERS, &merged);

    let mut theme = merged.theme;
    let extension = theme
        .get("extend")
        .and_then(Value::as_object)
        .map(resolve_extend)
        .unwrap_or_default();
    deep_merge(&mut theme, extension.theme);
    let theme = normalize_theme(theme);

    tracing::debug!(
        presets = presets.len(),
        transformers = transformers.len(),
        important = important.is_some(),
        un_color = un_color.as_deref().unwrap_or("off"),
        "resolved preset options"
    );

    ResolvedOptions {
        theme,
        important,
        un_color,
        preflights,
        enable_default_shortcuts: merged.enable_default_shortcuts,
        meta: ResolvedMeta {
            presets,
            transformers,
            shortcuts: extension.shortcuts,
        },
    }
}

fn resolve_un_color(option: &UnColorOption) -> Option<String> {
    match option {
        UnColorOption::Name(name) if name.is_empty() => None,
        UnColorOption::Name(name) => Some(name.clone()),
        UnColorOption::Enabled(true) => Some(DEFAULT_UN_COLOR.to_string()),
        UnColorOption::Enabled(false) => None,
        UnColorOption::Other(value) => is_truthy(value).then(|| DEFAULT_UN_COLOR.to_string()),
    }
}

fn resolve_important(option: &ImportantOption) -> Option<ImportantRules> {
    let defaults = ImportantRules::default();
    match option {
        ImportantOption::Enabled(true) => Some(defaults),
        ImportantOption::Enabled(false) => None,
        ImportantOption::Rules(rules) => Some(ImportantRules {
            includes: rules.includes.clone().unwrap_or(defaults.includes),
            excludes: rules.excludes.clone().unwrap_or(defaults.excludes),
        }),
        ImportantOption::Other(value) => is_truthy(value).then_some(defaults),
    }
}

fn resolve_preflights(options: &OptionsWithDefaults) -> Option<Preflights> {
    match options.preflights {
        PreflightsOption::Enabled(false) => None,
        PreflightsOption::Enabled(true) => Some(Preflights {
            reset: options.enable_reset_styles,
        }),
        PreflightsOption::Options { reset } => Some(Preflights {
            reset: reset.unwrap_or(true) && options.enable_reset_styles,
        }),
        PreflightsOption::Other(ref value) => is_truthy(value).then_some(Preflights {
            reset: options.enable_reset_styles,
        }),
    }
}
