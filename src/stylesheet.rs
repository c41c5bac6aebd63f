//! Minimal model of the CSS the generator emits.
//!
//! Generated CSS is flat: `selector{prop:value;...}` rules, optionally wrapped
//! in grouping at-rules such as `@media`, plus `/* layer: ... */` comments.
//! The parser covers that shape and keeps selectors byte-for-byte.

use std::fmt;
use crate::errors::{PresetError, Result};

/// A single `property: value` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

/// A selector and its declaration block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssRule {
    pub selector: String,
    pub declarations: Vec<Declaration>,
}

impl CssRule {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            declarations: Vec::new(),
        }
    }

    pub fn declaration(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.declarations.push(Declaration::new(property, value));
        self
    }
}

/// One top-level or nested item of a stylesheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssNode {
    Rule(CssRule),
    /// A grouping at-rule (`@media`, `@supports`, ...) and its children
    Group { prelude: String, children: Vec<CssNode> },
    /// A block-less at-rule such as `@import url(a.css)`
    Statement(String),
    Comment(String),
}

/// Visit every style rule, descending into groups.
///
/// Keyframe blocks and at-rule blocks such as `@font-face` are not style
/// rules and are skipped.
pub fn for_each_rule_mut<F>(nodes: &mut [CssNode], f: &mut F)
where
    F: FnMut(&mut CssRule),
{
    for node in nodes {
        match node {
            CssNode::Rule(rule) if !rule.selector.starts_with('@') => f(rule),
            CssNode::Group { prelude, children } if !is_keyframes(prelude.as_str()) => {
                for_each_rule_mut(children, f)
            }
            _ => {}
        }
    }
}

fn is_keyframes(prelude: &str) -> bool {
    prelude.starts_with("@keyframes") || prelude.starts_with("@-webkit-keyframes")
}

/// Serialize nodes in the generator's layout: one rule per line, group
/// bodies on their own lines
pub fn to_css(nodes: &[CssNode]) -> String {
    let mut out = String::new();
    write_nodes(&mut out, nodes);
    out
}

fn write_nodes(out: &mut String, nodes: &[CssNode]) {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match node {
            CssNode::Rule(rule) => {
                out.push_str(&rule.to_string());
            }
            CssNode::Group { prelude, children } => {
                out.push_str(prelude);
                out.push_str("{\n");
                write_nodes(out, children);
                out.push_str("\n}");
            }
            CssNode::Statement(statement) => {
                out.push_str(statement);
                out.push(';');
            }
            CssNode::Comment(comment) => {
                out.push_str("/* ");
                out.push_str(comment);
                out.push_str(" */");
            }
        }
    }
}

impl fmt::Display for CssRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.selector)?;
        for declaration in &self.declarations {
            write!(f, "{}:{};", declaration.property, declaration.value)?;
        }
        f.write_str("}")
    }
}

/// At-rules whose body holds rules rather than declarations
const GROUPING_AT_RULES: &[&str] = &[
    "media",
    "supports",
    "container",
    "layer",
    "document",
    "scope",
    "starting-style",
    "keyframes",
    "-webkit-keyframes",
];

/// Parse generated CSS text
pub fn parse(css: &str, source_name: &str) -> Result<Vec<CssNode>> {
    let mut parser = Parser {
        src: css,
        pos: 0,
        source_name,
    };
    let nodes = parser.parse_nodes(false)?;
    parser.skip_whitespace();
    if parser.pos < css.len() {
        return Err(parser.error("unexpected '}'"));
    }
    Ok(nodes)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    source_name: &'a str,
}

impl<'a> Parser<'a> {
    fn error(&self, message: &str) -> PresetError {
        PresetError::CssParse {
            source_name: self.source_name.to_string(),
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn parse_nodes(&mut self, nested: bool) -> Result<Vec<CssNode>> {
        let mut nodes = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => {
                    if nested {
                        return Err(self.error("unterminated block"));
                    }
                    return Ok(nodes);
                }
                Some(b'}') => return Ok(nodes),
                _ if self.rest().starts_with("/*") => nodes.push(self.parse_comment()?),
                _ => nodes.push(self.parse_node()?),
            }
        }
    }

    fn parse_comment(&mut self) -> Result<CssNode> {
        let body_start = self.pos + 2;
        let end = self.src[body_start..]
            .find("*/")
            .ok_or_else(|| self.error("unterminated comment"))?;
        let body = self.src[body_start..body_start + end].trim().to_string();
        self.pos = body_start + end + 2;
        Ok(CssNode::Comment(body))
    }

    fn parse_node(&mut self) -> Result<CssNode> {
        let start = self.pos;
        let stop = self.scan_until(&[b'{', b';', b'}'])?;
        let prelude = self.src[start..self.pos].trim().to_string();

        match stop {
            b';' => {
                self.pos += 1;
                if prelude.starts_with('@') {
                    Ok(CssNode::Statement(prelude))
                } else {
                    Err(self.error("declaration outside of a rule"))
                }
            }
            b'}' => Err(self.error("expected '{'")),
            _ => {
                self.pos += 1;
                if is_grouping_at_rule(&prelude) {
                    let children = self.parse_nodes(true)?;
                    self.expect_close()?;
                    Ok(CssNode::Group { prelude, children })
                } else {
                    let declarations = self.parse_declarations()?;
                    Ok(CssNode::Rule(CssRule {
                        selector: prelude,
                        declarations,
                    }))
                }
            }
        }
    }

    fn expect_close(&mut self) -> Result<()> {
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error("expected '}'"))
        }
    }

    fn parse_declarations(&mut self) -> Result<Vec<Declaration>> {
        let src = self.src;
        let mut declarations = Vec::new();
        loop {
            let start = self.pos;
            let stop = self.scan_until(&[b';', b'}'])?;
            let entry = src[start..self.pos].trim();
            self.pos += 1;

            if !entry.is_empty() {
                let (property, value) = entry
                    .split_once(':')
                    .ok_or_else(|| self.error("declaration without ':'"))?;
                declarations.push(Declaration::new(property.trim(), value.trim()));
            }
            if stop == b'}' {
                return Ok(declarations);
            }
        }
    }

    /// Advance to the first stop byte outside quotes, parentheses and
    /// brackets, honoring backslash escapes
    fn scan_until(&mut self, stops: &[u8]) -> Result<u8> {
        let bytes = self.src.as_bytes();
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;
        while let Some(&b) = bytes.get(self.pos) {
            match (quote, b) {
                (_, b'\\') => {
                    self.pos += 2;
                    continue;
                }
                (Some(q), b) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'(' | b'[') => depth += 1,
                (None, b')' | b']') => depth = depth.saturating_sub(1),
                (None, b) if depth == 0 && stops.contains(&b) => return Ok(b),
                _ => {}
            }
            self.pos += 1;
        }
        self.pos = self.pos.min(self.src.len());
        Err(self.error("unexpected end of input"))
    }
}

fn is_grouping_at_rule(prelude: &str) -> bool {
    let Some(name) = prelude.strip_prefix('@') else {
        return false;
    };
    let name = name
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default();
    GROUPING_AT_RULES.contains(&name)
}
