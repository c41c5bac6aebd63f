use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Static shortcut table, in declaration order
pub type Shortcuts = IndexMap<String, String>;

/// Theme entries derived from `theme.extend`
#[derive(Debug, Clone, Default)]
pub struct ThemeExtension {
    pub theme: Map<String, Value>,
    pub shortcuts: Shortcuts,
}

/// Recursively merge `source` into `target`; `source` wins on conflicts
pub fn deep_merge(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match value {
            Value::Object(incoming) => {
                if let Some(Value::Object(existing)) = target.get_mut(&key) {
                    deep_merge(existing, incoming);
                    continue;
                }
                target.insert(key, Value::Object(incoming));
            }
            other => {
                target.insert(key, other);
            }
        }
    }
}

/// Serialize a nested style object into CSS block text.
///
/// Nested objects become `selector{...}` blocks, leaves become
/// `kebab-property:value;` declarations.
pub fn css_object_to_string(object: &Map<String, Value>) -> String {
    let mut css = String::new();
    for (key, value) in object {
        match value {
            Value::Object(nested) => {
                css.push_str(key);
                css.push('{');
                css.push_str(&css_object_to_string(nested));
                css.push('}');
            }
            Value::Null => {}
            Value::String(s) => push_declaration(&mut css, key, s),
            other => push_declaration(&mut css, key, &other.to_string()),
        }
    }
    css
}

fn push_declaration(css: &mut String, property: &str, value: &str) {
    css.push_str(&to_kebab_case(property));
    css.push(':');
    css.push_str(value);
    css.push(';');
}

/// `animationTimingFunction` -> `animation-timing-function`; custom
/// properties are kept verbatim
fn to_kebab_case(property: &str) -> String {
    if property.starts_with("--") {
        return property.to_string();
    }
    let mut out = String::with_capacity(property.len() + 4);
    for c in property.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Split on whitespace outside parentheses
fn split_shorthand(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                if let Some(s) = start.take() {
                    parts.push(&value[s..i]);
                }
                continue;
            }
            _ => {}
        }
        if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        parts.push(&value[s..]);
    }
    parts
}

/// Resolve `extend.animation` entries.
///
/// Each value is an `animation` shorthand `<keyframes> <duration> <timing> <count>`.
/// The parts are stored under the keyframe name in `durations`, `timingFns`
/// and `counts`; when the key differs from the keyframe name a shortcut
/// `animate-<key>` -> `animate-<name>` is emitted.
pub fn resolve_animation(animation: &Map<String, Value>) -> (Map<String, Value>, Shortcuts) {
    let mut durations = Map::new();
    let mut timing_fns = Map::new();
    let mut counts = Map::new();
    let mut shortcuts = Shortcuts::new();

    for (key, value) in animation {
        let Some(shorthand) = value.as_str() else {
            tracing::warn!(animation = %key, "ignoring non-string animation shorthand");
            continue;
        };
        let parts = split_shorthand(shorthand);
        let Some((&name, rest)) = parts.split_first() else {
            continue;
        };

        let mut rest = rest.iter();
        if let Some(duration) = rest.next() {
            durations.insert(name.to_string(), Value::from(*duration));
        }
        if let Some(timing) = rest.next() {
            timing_fns.insert(name.to_string(), Value::from(*timing));
        }
        if let Some(count) = rest.next() {
            counts.insert(name.to_string(), Value::from(*count));
        }

        if name != key.as_str() {
            shortcuts.insert(format!("animate-{}", key), format!("animate-{}", name));
        }
    }

    let mut resolved = Map::new();
    resolved.insert("durations".to_string(), Value::Object(durations));
    resolved.insert("timingFns".to_string(), Value::Object(timing_fns));
    resolved.insert("counts".to_string(), Value::Object(counts));
    (resolved, shortcuts)
}

/// Turn `theme.extend` into theme entries and shortcuts
pub fn resolve_extend(extend: &Map<String, Value>) -> ThemeExtension {
    let empty = Map::new();
    let animation = extend
        .get("animation")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let (mut resolved, shortcuts) = resolve_animation(animation);

    let mut keyframes = Map::new();
    if let Some(frames) = extend.get("keyframes").and_then(Value::as_object) {
        for (name, frame) in frames {
            let block = match frame {
                Value::Object(object) => css_object_to_string(object),
                Value::String(raw) => raw.clone(),
                _ => continue,
            };
            keyframes.insert(name.clone(), Value::from(format!("{{{}}}", block)));
        }
    }
    resolved.insert("keyframes".to_string(), Value::Object(keyframes));

    let mut theme = Map::new();
    theme.insert("animation".to_string(), Value::Object(resolved));
    ThemeExtension { theme, shortcuts }
}

/// Drop the consumed `extend` section and empty animation tables
pub fn normalize_theme(mut theme: Map<String, Value>) -> Map<String, Value> {
    theme.remove("extend");
    if let Some(Value::Object(animation)) = theme.get_mut("animation") {
        animation.retain(|_, table| !matches!(table, Value::Object(entries) if entries.is_empty()));
        if animation.is_empty() {
            theme.remove("animation");
        }
    }
    theme
}
