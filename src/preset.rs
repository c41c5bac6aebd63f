use serde::Serialize;
use serde_json::{Map, Value};
use crate::config::UsefulOptions;
use crate::errors::Result;
use crate::postprocess::{postprocess, ImportantProcessor, Postprocessor, UnColorProcessor};
use crate::registry::PluginInstance;
use crate::resolve::{resolve_options, ResolvedOptions};
use crate::shortcuts::default_shortcuts;
use crate::stylesheet::{self, CssNode};
use crate::theme::Shortcuts;

pub const PRESET_NAME: &str = "unocss-preset-useful";

/// A stylesheet emitted ahead of the utilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preflight {
    pub layer: &'static str,
    pub package: &'static str,
}

const RESET_PREFLIGHT: Preflight = Preflight {
    layer: "preflights",
    package: "@unocss/reset/tailwind.css",
};

/// The preset as registered with the host generator.
///
/// Holds the resolved options, the sub-plugins to register, and the
/// postprocessors run over every batch of generated rules.
#[derive(Debug)]
pub struct UsefulPreset {
    pub name: &'static str,
    options: ResolvedOptions,
    shortcuts: Shortcuts,
    preflights: Vec<Preflight>,
    postprocessors: Vec<Box<dyn Postprocessor>>,
}

/// Build the preset from user options
pub fn preset_useful(options: UsefulOptions) -> UsefulPreset {
    UsefulPreset::new(resolve_options(options))
}

impl UsefulPreset {
    pub fn new(options: ResolvedOptions) -> Self {
        let mut shortcuts = if options.enable_default_shortcuts {
            default_shortcuts()
        } else {
            Shortcuts::new()
        };
        shortcuts.extend(options.meta.shortcuts.clone());

        let preflights = match options.preflights {
            Some(preflights) if preflights.reset => vec![RESET_PREFLIGHT],
            _ => Vec::new(),
        };

        // Color substitution runs before importance so hoisted properties
        // are marked like the rest of the rule
        let mut postprocessors: Vec<Box<dyn Postprocessor>> = Vec::new();
        if let Some(name) = &options.un_color {
            postprocessors.push(Box::new(UnColorProcessor::new(name.clone())));
        }
        if let Some(rules) = &options.important {
            postprocessors.push(Box::new(ImportantProcessor::new(rules.clone())));
        }

        Self {
            name: PRESET_NAME,
            options,
            shortcuts,
            preflights,
            postprocessors,
        }
    }

    /// Run `processor` before this preset's own postprocessors, as for a
    /// preset registered ahead of this one
    pub fn after(mut self, processor: impl Postprocessor + 'static) -> Self {
        self.postprocessors.insert(0, Box::new(processor));
        self
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    pub fn presets(&self) -> &[PluginInstance] {
        &self.options.meta.presets
    }

    pub fn transformers(&self) -> &[PluginInstance] {
        &self.options.meta.transformers
    }

    pub fn theme(&self) -> &Map<String, Value> {
        &self.options.theme
    }

    pub fn shortcuts(&self) -> &Shortcuts {
        &self.shortcuts
    }

    pub fn preflights(&self) -> &[Preflight] {
        &self.preflights
    }

    pub fn postprocessors(&self) -> &[Box<dyn Postprocessor>] {
        &self.postprocessors
    }

    /// Rewrite a batch of generated rules in place
    pub fn postprocess(&self, nodes: &mut [CssNode]) {
        postprocess(&self.postprocessors, nodes);
    }

    /// Parse generated CSS, postprocess it and serialize it again
    pub fn process_css(&self, css: &str, source_name: &str) -> Result<String> {
        let mut nodes = stylesheet::parse(css, source_name)?;
        self.postprocess(&mut nodes);
        Ok(stylesheet::to_css(&nodes))
    }
}
