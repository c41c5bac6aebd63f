use crate::theme::Shortcuts;

/// Shortcuts shipped with the preset, in registration order
const DEFAULT_SHORTCUTS: &[(&str, &str)] = &[
    ("f-c", "flex justify-center items-center"),
    ("f-c-c", "f-c flex-col"),
    ("fc", "flex justify-center"),
    ("fi", "flex items-center"),
    ("fs", "flex justify-start"),
    ("fe", "flex justify-end"),
    ("fb", "flex justify-between"),
    ("fa", "flex justify-around"),
    ("abs", "absolute"),
    ("rel", "relative"),
    ("wh-full", "w-full h-full"),
    ("trans-c", "absolute top-1/2 left-1/2 -translate-x-1/2 -translate-y-1/2"),
];

pub fn default_shortcuts() -> Shortcuts {
    DEFAULT_SHORTCUTS
        .iter()
        .map(|(name, expansion)| (name.to_string(), expansion.to_string()))
        .collect()
}
