//! Static registries of the sub-presets and transformers the preset can enable.
//!
//! Each entry maps an option key to the package that provides the plugin and
//! the options it is instantiated with. Entries are visited in table order, so
//! the plugin order never depends on the order of keys in the user config.

use serde::Serialize;
use serde_json::{Map, Value};
use crate::config::{OptionsWithDefaults, PluginToggle};

/// A sub-preset or transformer selected for the host to instantiate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginInstance {
    /// Option key that enabled the plugin
    pub name: &'static str,

    /// Package providing the factory
    pub package: &'static str,

    /// Exported factory name inside the package
    pub export: &'static str,

    /// Options passed to the factory
    pub options: Map<String, Value>,
}

/// Registry entry describing how to build one plugin
pub struct PluginFactory {
    pub key: &'static str,
    pub package: &'static str,
    pub export: &'static str,
    defaults: fn() -> Map<String, Value>,
    select: fn(&OptionsWithDefaults) -> &PluginToggle,
}

impl std::fmt::Debug for PluginFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginFactory")
            .field("key", &self.key)
            .field("package", &self.package)
            .field("export", &self.export)
            .finish()
    }
}

impl PluginFactory {
    /// Toggle controlling this entry in the merged options
    pub fn toggle<'a>(&self, options: &'a OptionsWithDefaults) -> &'a PluginToggle {
        (self.select)(options)
    }

    /// Instantiate the plugin if its toggle is truthy.
    ///
    /// An options object is layered over the entry defaults; a bare flag
    /// gets the defaults alone.
    pub fn create(&self, toggle: &PluginToggle) -> Option<PluginInstance> {
        if !toggle.is_enabled() {
            return None;
        }

        let mut options = (self.defaults)();
        if let Some(user) = toggle.options() {
            for (key, value) in user {
                options.insert(key.clone(), value.clone());
            }
        }

        Some(PluginInstance {
            name: self.key,
            package: self.package,
            export: self.export,
            options,
        })
    }
}

fn no_defaults() -> Map<String, Value> {
    Map::new()
}

fn web_fonts_defaults() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("provider".to_string(), Value::from("fontsource"));
    map
}

/// Sub-presets, in instantiation order
pub static PRESETS: &[PluginFactory] = &[
    PluginFactory {
        key: "uno",
        package: "@unocss/preset-uno",
        export: "presetUno",
        defaults: no_defaults,
        select: |o| &o.uno,
    },
    PluginFactory {
        key: "attributify",
        package: "@unocss/preset-attributify",
        export: "presetAttributify",
        defaults: no_defaults,
        select: |o| &o.attributify,
    },
    PluginFactory {
        key: "icons",
        package: "@unocss/preset-icons",
        export: "presetIcons",
        defaults: no_defaults,
        select: |o| &o.icons,
    },
    PluginFactory {
        key: "webFonts",
        package: "@unocss/preset-web-fonts",
        export: "presetWebFonts",
        defaults: web_fonts_defaults,
        select: |o| &o.web_fonts,
    },
    PluginFactory {
        key: "typography",
        package: "@unocss/preset-typography",
        export: "presetTypography",
        defaults: no_defaults,
        select: |o| &o.typography,
    },
    PluginFactory {
        key: "tagify",
        package: "@unocss/preset-tagify",
        export: "presetTagify",
        defaults: no_defaults,
        select: |o| &o.tagify,
    },
    PluginFactory {
        key: "remToPx",
        package: "@unocss/preset-rem-to-px",
        export: "default",
        defaults: no_defaults,
        select: |o| &o.rem_to_px,
    },
    PluginFactory {
        key: "magicss",
        package: "unocss-preset-magicss",
        export: "presetMagicss",
        defaults: no_defaults,
        select: |o| &o.magicss,
    },
];

/// Transformers, in instantiation order
pub static TRANSFORMERS: &[PluginFactory] = &[
    PluginFactory {
        key: "directives",
        package: "unocss",
        export: "transformerDirectives",
        defaults: no_defaults,
        select: |o| &o.directives,
    },
    PluginFactory {
        key: "variantGroup",
        package: "unocss",
        export: "transformerVariantGroup",
        defaults: no_defaults,
        select: |o| &o.variant_group,
    },
    PluginFactory {
        key: "compileClass",
        package: "unocss",
        export: "transformerCompileClass",
        defaults: no_defaults,
        select: |o| &o.compile_class,
    },
];

/// Instantiate every enabled entry of `registry`, in registry order
pub fn instantiate(registry: &[PluginFactory], options: &OptionsWithDefaults) -> Vec<PluginInstance> {
    registry
        .iter()
        .filter_map(|factory| {
            let instance = factory.create(factory.toggle(options))?;
            tracing::debug!(plugin = instance.name, package = instance.package, "plugin enabled");
            Some(instance)
        })
        .collect()
}
