//! Rewrites applied to generated rules before serialization.
//!
//! Each [`Postprocessor`] works on one rule at a time; [`postprocess`] walks a
//! stylesheet, descending into `@media` and other grouping at-rules, and
//! hands every rule to each processor in order.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use crate::config::{Matcher, DEFAULT_UN_COLOR};
use crate::stylesheet::{for_each_rule_mut, CssNode, CssRule, Declaration};

const IMPORTANT: &str = "!important";

/// A rewrite of a single generated rule
pub trait Postprocessor: fmt::Debug + Send + Sync {
    fn process(&self, rule: &mut CssRule);
}

/// Run `processors` over every rule in `nodes`, in order
pub fn postprocess(processors: &[Box<dyn Postprocessor>], nodes: &mut [CssNode]) {
    if processors.is_empty() {
        return;
    }
    for_each_rule_mut(nodes, &mut |rule| {
        for processor in processors {
            processor.process(rule);
        }
    });
}

/// Include/exclude lists deciding which declarations become `!important`
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ImportantRules {
    pub includes: Vec<Matcher>,
    pub excludes: Vec<Matcher>,
}

impl Default for ImportantRules {
    fn default() -> Self {
        Self {
            includes: vec![Matcher::match_all()],
            excludes: Vec::new(),
        }
    }
}

impl ImportantRules {
    /// Whether a declaration is in scope.
    ///
    /// The subjects are the rule's base class name and the declaration
    /// property; at least one include must match and no exclude may match.
    pub fn in_scope(&self, class_name: Option<&str>, property: &str) -> bool {
        let hit = |matchers: &[Matcher]| {
            class_name
                .into_iter()
                .chain(std::iter::once(property))
                .any(|subject| matchers.iter().any(|m| m.matches(subject)))
        };
        hit(&self.includes) && !hit(&self.excludes)
    }
}

/// Appends `!important` to declarations in scope of [`ImportantRules`].
///
/// Importance the generator already added (`!text-xl`, `text-sm!`,
/// `important-ma`) is stripped first and decided again by the rules, so a
/// declaration is never marked twice.
#[derive(Debug, Clone)]
pub struct ImportantProcessor {
    rules: ImportantRules,
}

impl ImportantProcessor {
    pub fn new(rules: ImportantRules) -> Self {
        Self { rules }
    }
}

impl Postprocessor for ImportantProcessor {
    fn process(&self, rule: &mut CssRule) {
        let class_name = base_class_name(&rule.selector);
        for declaration in &mut rule.declarations {
            let value = strip_important(&declaration.value);
            declaration.value = if self.rules.in_scope(class_name.as_deref(), &declaration.property) {
                format!("{} {}", value, IMPORTANT)
            } else {
                value.to_string()
            };
        }
    }
}

fn strip_important(value: &str) -> &str {
    let trimmed = value.trim_end();
    let split = trimmed.len().saturating_sub(IMPORTANT.len());
    match (trimmed.get(..split), trimmed.get(split..)) {
        (Some(head), Some(tail)) if tail.eq_ignore_ascii_case(IMPORTANT) => head.trim_end(),
        _ => trimmed,
    }
}

/// Utility name a selector was generated for.
///
/// The class carrying a variant prefix wins, so `.dark .dark\:bg-red` and
/// `.group:hover .group-hover\:bg-red` give `bg-red`; otherwise the first
/// class is used. Escapes are decoded, variant prefixes up to the last `:`
/// outside brackets are dropped, and the importance markers `!` and
/// `important-` are removed.
pub fn base_class_name(selector: &str) -> Option<String> {
    let classes = selector_classes(selector);
    let name = classes
        .iter()
        .find(|name| variant_end(name) > 0)
        .or_else(|| classes.first())?;

    let utility = name[variant_end(name)..].trim_matches('!');
    let utility = utility.strip_prefix("important-").unwrap_or(utility);
    if utility.is_empty() {
        None
    } else {
        Some(utility.to_string())
    }
}

/// Decoded class names of a selector, in order
fn selector_classes(selector: &str) -> Vec<String> {
    let mut classes = Vec::new();
    let mut chars = selector.chars().peekable();
    let mut depth = 0usize;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => {
                let name = read_class(&mut chars);
                if !name.is_empty() {
                    classes.push(name);
                }
            }
            _ => {}
        }
    }
    classes
}

/// Read one class name, stopping before the first unescaped delimiter
fn read_class(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        match c {
            ':' | '.' | ' ' | '>' | '+' | '~' | ',' | '[' | '#' | '(' | ')' => break,
            '\\' => {
                chars.next();
                let mut hex = String::new();
                while hex.len() < 6 && chars.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                    hex.extend(chars.next());
                }
                if hex.is_empty() {
                    name.extend(chars.next());
                } else {
                    if chars.peek() == Some(&' ') {
                        chars.next();
                    }
                    let decoded = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32);
                    name.push(decoded.unwrap_or(char::REPLACEMENT_CHARACTER));
                }
            }
            c => {
                chars.next();
                name.push(c);
            }
        }
    }
    name
}

/// Byte offset just past the last variant separator outside brackets
fn variant_end(name: &str) -> usize {
    let mut depth = 0usize;
    let mut end = 0;
    for (i, c) in name.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => end = i + 1,
            _ => {}
        }
    }
    end
}

/// Three color channels followed by the alpha separator, in space or comma style
static COLOR_CHANNELS: Lazy<Regex> = Lazy::new(|| {
    let channel = r"-?\d*\.?\d+(?:%|deg|turn|rad)?";
    let sep = r"(?:\s*,\s*|\s+)";
    Regex::new(&format!(
        r"\b(rgba?|hsla?)\(\s*({ch}{sep}{ch}{sep}{ch})\s*([/,])\s*",
        ch = channel,
        sep = sep
    ))
    .expect("color channel pattern is valid")
});

/// Moves the channels of color functions into a custom property.
///
/// `background-color:rgb(248 113 113 / var(--un-bg-opacity))` becomes
/// `--un-color:248 113 113` plus `rgb(var(--un-color) / var(--un-bg-opacity))`.
/// Occurrences of the reserved `--un-color` token are renamed to the
/// configured property.
#[derive(Debug, Clone)]
pub struct UnColorProcessor {
    name: String,
}

impl UnColorProcessor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Postprocessor for UnColorProcessor {
    fn process(&self, rule: &mut CssRule) {
        if self.name != DEFAULT_UN_COLOR {
            for declaration in &mut rule.declarations {
                if let Some(renamed) = replace_token(&declaration.property, DEFAULT_UN_COLOR, &self.name) {
                    declaration.property = renamed;
                }
                if let Some(renamed) = replace_token(&declaration.value, DEFAULT_UN_COLOR, &self.name) {
                    declaration.value = renamed;
                }
            }
        }

        let existing = rule
            .declarations
            .iter()
            .find(|d| d.property == self.name)
            .map(|d| d.value.clone());
        let mut hoisted = existing.clone();

        for declaration in &mut rule.declarations {
            if declaration.property == self.name {
                continue;
            }
            let rewritten = COLOR_CHANNELS.replace_all(&declaration.value, |caps: &Captures<'_>| {
                let channels = &caps[2];
                if hoisted.as_deref().is_some_and(|current| current != channels) {
                    return caps[0].to_string();
                }
                if hoisted.is_none() {
                    hoisted = Some(channels.to_string());
                }
                format!("{}(var({}) {} ", &caps[1], self.name, &caps[3])
            });
            if let Cow::Owned(value) = rewritten {
                declaration.value = value;
            }
        }

        if existing.is_none() {
            if let Some(channels) = hoisted {
                rule.declarations.insert(0, Declaration::new(self.name.clone(), channels));
            }
        }
    }
}

/// Replace whole-token occurrences of `token`; `None` when nothing matched
fn replace_token(text: &str, token: &str, replacement: &str) -> Option<String> {
    let is_name_char = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    let mut out = String::new();
    let mut last = 0;
    for (start, _) in text.match_indices(token) {
        let end = start + token.len();
        let before_ok = !text[..start].chars().next_back().is_some_and(is_name_char);
        let after_ok = !text[end..].chars().next().is_some_and(is_name_char);
        if before_ok && after_ok {
            out.push_str(&text[last..start]);
            out.push_str(replacement);
            last = end;
        }
    }
    if last == 0 {
        return None;
    }
    out.push_str(&text[last..]);
    Some(out)
}

static LEGACY_COLOR_FN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(rgb|hsl)a?\(").expect("color function pattern is valid"));

/// Rewrites space-separated color functions to the legacy comma syntax:
/// `rgb(248 113 113 / var(--un-bg-opacity))` becomes
/// `rgba(248, 113, 113, var(--un-bg-opacity))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyColorCompat;

impl Postprocessor for LegacyColorCompat {
    fn process(&self, rule: &mut CssRule) {
        for declaration in &mut rule.declarations {
            if let Some(value) = comma_style_colors(&declaration.value) {
                declaration.value = value;
            }
        }
    }
}

fn comma_style_colors(value: &str) -> Option<String> {
    let mut out = String::new();
    let mut rest = value;
    let mut changed = false;

    while let Some(m) = LEGACY_COLOR_FN.find(rest) {
        let open = m.end();
        let Some(close) = matching_paren(rest, open) else {
            break;
        };
        out.push_str(&rest[..m.start()]);
        let function = &rest[m.start()..open - 1];
        match comma_arguments(&rest[open..close]) {
            Some((arguments, has_alpha)) => {
                let base = function.trim_end_matches('a');
                out.push_str(base);
                if has_alpha {
                    out.push('a');
                }
                out.push('(');
                out.push_str(&arguments);
                out.push(')');
                changed = true;
            }
            None => out.push_str(&rest[m.start()..=close]),
        }
        rest = &rest[close + 1..];
    }

    if !changed {
        return None;
    }
    out.push_str(rest);
    Some(out)
}

/// Index of the `)` closing the group opened just before `open`
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (i, b) in text.bytes().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn comma_arguments(inner: &str) -> Option<(String, bool)> {
    if inner.contains(',') {
        return None;
    }

    let mut depth = 0usize;
    let mut slash = None;
    for (i, b) in inner.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b'/' if depth == 0 => {
                slash = Some(i);
                break;
            }
            _ => {}
        }
    }

    let (channels, alpha) = match slash {
        Some(i) => (&inner[..i], Some(inner[i + 1..].trim())),
        None => (inner, None),
    };
    let channels: Vec<&str> = channels.split_whitespace().collect();
    if channels.len() != 3 {
        return None;
    }

    let mut arguments = channels.join(", ");
    match alpha {
        Some(alpha) if !alpha.is_empty() => {
            arguments.push_str(", ");
            arguments.push_str(alpha);
            Some((arguments, true))
        }
        _ => Some((arguments, false)),
    }
}
