// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! kubectl-style JSONPath templates.
//!
//! Supported syntax: `.field`, `['field']`, `..field` (recursive descent),
//! `*` / `[*]`, `[n]` (negative counts from the end), `[a:b]`, unions
//! `[a,b]` and filters `[?(@.path)]` / `[?(@.path == "value")]` with
//! `==`, `!=`, `<`, `<=`, `>` and `>=`.
//!
//! An expression may be braced (`{.status.state}`), in which case literal
//! text around the braces is kept, or bare (`.status.state`). Missing keys
//! yield no results instead of an error.

use crate::error::{ProviderError, Result};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
enum Selector {
    Name(String),
    Wildcard,
    Index(i64),
    Slice(Option<i64>, Option<i64>),
    Union(Vec<Selector>),
    Filter(Box<Filter>),
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    recursive: bool,
    selector: Selector,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
struct Filter {
    path: Vec<Step>,
    condition: Option<(CmpOp, Value)>,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Path(Vec<Step>),
}

/// A parsed JSONPath template
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    source: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn parse(expression: &str) -> Result<Self> {
        let trimmed = expression.trim();
        let error = |message: &str| ProviderError::JsonPathError {
            expression: expression.to_string(),
            message: message.to_string(),
        };

        if trimmed.is_empty() {
            return Err(error("expression is empty"));
        }

        let mut segments = Vec::new();
        if find_unquoted(trimmed, '{').is_none() {
            if find_unquoted(trimmed, '}').is_some() {
                return Err(error("unbalanced '}'"));
            }
            segments.push(Segment::Path(parse_path(trimmed).map_err(|m| error(&m))?));
        } else {
            let mut rest = trimmed;
            while let Some(open) = rest.find('{') {
                if open > 0 {
                    if rest[..open].contains('}') {
                        return Err(error("unbalanced '}'"));
                    }
                    segments.push(Segment::Text(rest[..open].to_string()));
                }
                let after = &rest[open + 1..];
                let close = closing_brace(after).ok_or_else(|| error("unclosed '{'"))?;
                let inner = after[..close].trim();
                if inner.is_empty() {
                    return Err(error("empty '{}' block"));
                }
                segments.push(Segment::Path(parse_path(inner).map_err(|m| error(&m))?));
                rest = &after[close + 1..];
            }
            if !rest.is_empty() {
                if rest.contains('}') {
                    return Err(error("unbalanced '}'"));
                }
                segments.push(Segment::Text(rest.to_string()));
            }
        }

        Ok(JsonPath {
            source: expression.to_string(),
            segments,
        })
    }

    /// Render the template the way `kubectl -o jsonpath` prints it: strings
    /// raw, other values as compact JSON, several results separated by a
    /// space, nothing for missing values.
    pub fn render(&self, root: &Value) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Path(steps) => {
                    let rendered: Vec<String> =
                        evaluate(steps, root).into_iter().map(render_value).collect();
                    out.push_str(&rendered.join(" "));
                }
            }
        }
        out
    }
}

impl FromStr for JsonPath {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        JsonPath::parse(s)
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Byte offset of the first `target` outside quotes. When a quote is left
/// open the text is treated as unquoted, so `it's {.x}` still finds the brace.
fn find_unquoted(s: &str, target: char) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, c) if c == target => return Some(i),
            _ => {}
        }
    }
    match quote {
        Some(_) => s.find(target),
        None => None,
    }
}

/// Byte offset of the `}` closing a block, skipping quoted text
fn closing_brace(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '}') => return Some(i),
            (None, '{') => return None,
            _ => {}
        }
    }
    None
}

fn parse_path(path: &str) -> std::result::Result<Vec<Step>, String> {
    let mut parser = Parser::new(path);
    parser.skip_whitespace();
    if parser.peek() == Some('$') {
        parser.advance();
    } else if parser.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
        // `status.state` is accepted as `.status.state`
        let name = parser.read_name();
        let mut steps = vec![Step {
            recursive: false,
            selector: Selector::Name(name),
        }];
        steps.extend(parser.parse_steps()?);
        parser.finish()?;
        return Ok(steps);
    }
    let steps = parser.parse_steps()?;
    parser.finish()?;
    Ok(steps)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> std::result::Result<(), String> {
        match self.advance() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(format!(
                "expected '{}' at position {} but found '{}'",
                expected,
                self.pos - 1,
                c
            )),
            None => Err(format!("expected '{}' but reached the end", expected)),
        }
    }

    fn finish(&mut self) -> std::result::Result<(), String> {
        self.skip_whitespace();
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(format!("unexpected '{}' at position {}", c, self.pos)),
        }
    }

    fn read_name(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn parse_steps(&mut self) -> std::result::Result<Vec<Step>, String> {
        let mut steps = Vec::new();
        loop {
            match self.peek() {
                Some('.') => {
                    self.advance();
                    let recursive = self.peek() == Some('.');
                    if recursive {
                        self.advance();
                        if self.peek() == Some('[') {
                            steps.push(Step {
                                recursive,
                                selector: self.parse_bracket()?,
                            });
                            continue;
                        }
                    }
                    if self.peek() == Some('*') {
                        self.advance();
                        steps.push(Step {
                            recursive,
                            selector: Selector::Wildcard,
                        });
                        continue;
                    }
                    let name = self.read_name();
                    if name.is_empty() {
                        return Err(format!("expected a field name at position {}", self.pos));
                    }
                    steps.push(Step {
                        recursive,
                        selector: Selector::Name(name),
                    });
                }
                Some('[') => steps.push(Step {
                    recursive: false,
                    selector: self.parse_bracket()?,
                }),
                _ => return Ok(steps),
            }
        }
    }

    fn parse_bracket(&mut self) -> std::result::Result<Selector, String> {
        self.expect('[')?;
        self.skip_whitespace();

        let selector = match self.peek() {
            Some('?') => {
                self.advance();
                self.skip_whitespace();
                self.expect('(')?;
                let filter = self.parse_filter()?;
                self.skip_whitespace();
                self.expect(')')?;
                Selector::Filter(Box::new(filter))
            }
            Some('*') => {
                self.advance();
                Selector::Wildcard
            }
            _ => {
                let mut items = vec![self.parse_bracket_item()?];
                self.skip_whitespace();
                while self.peek() == Some(',') {
                    self.advance();
                    self.skip_whitespace();
                    items.push(self.parse_bracket_item()?);
                    self.skip_whitespace();
                }
                if items.len() == 1 {
                    items.remove(0)
                } else {
                    Selector::Union(items)
                }
            }
        };

        self.skip_whitespace();
        self.expect(']')?;
        Ok(selector)
    }

    fn parse_bracket_item(&mut self) -> std::result::Result<Selector, String> {
        match self.peek() {
            Some('\'' | '"') => Ok(Selector::Name(self.parse_quoted()?)),
            Some(':') => {
                self.advance();
                let end = self.parse_optional_int()?;
                Ok(Selector::Slice(None, end))
            }
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let start = self.parse_int()?;
                if self.peek() == Some(':') {
                    self.advance();
                    let end = self.parse_optional_int()?;
                    Ok(Selector::Slice(Some(start), end))
                } else {
                    Ok(Selector::Index(start))
                }
            }
            Some(c) => Err(format!("unexpected '{}' in brackets at position {}", c, self.pos)),
            None => Err("unterminated '['".to_string()),
        }
    }

    fn parse_quoted(&mut self) -> std::result::Result<String, String> {
        let quote = self.advance().ok_or("expected a quoted string")?;
        let mut out = String::new();
        loop {
            match self.advance() {
                Some('\\') => match self.advance() {
                    Some(c) => out.push(c),
                    None => return Err("unterminated string".to_string()),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err("unterminated string".to_string()),
            }
        }
    }

    fn parse_optional_int(&mut self) -> std::result::Result<Option<i64>, String> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_int().map(Some),
            _ => Ok(None),
        }
    }

    fn parse_int(&mut self) -> std::result::Result<i64, String> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.advance();
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse()
            .map_err(|_| format!("invalid integer '{}' at position {}", text, start))
    }

    fn parse_filter(&mut self) -> std::result::Result<Filter, String> {
        self.skip_whitespace();
        self.expect('@')?;
        let path = self.parse_steps()?;
        self.skip_whitespace();

        if self.peek() == Some(')') {
            return Ok(Filter {
                path,
                condition: None,
            });
        }

        let op = self.parse_operator()?;
        self.skip_whitespace();
        let literal = self.parse_literal()?;
        Ok(Filter {
            path,
            condition: Some((op, literal)),
        })
    }

    fn parse_operator(&mut self) -> std::result::Result<CmpOp, String> {
        let first = self.advance().ok_or("expected a comparison operator")?;
        let has_eq = self.peek() == Some('=');
        let op = match (first, has_eq) {
            ('=', true) => CmpOp::Eq,
            ('!', true) => CmpOp::Ne,
            ('<', true) => CmpOp::Le,
            ('>', true) => CmpOp::Ge,
            ('<', false) => CmpOp::Lt,
            ('>', false) => CmpOp::Gt,
            _ => {
                return Err(format!(
                    "unsupported operator at position {}",
                    self.pos - 1
                ))
            }
        };
        if has_eq {
            self.advance();
        }
        Ok(op)
    }

    fn parse_literal(&mut self) -> std::result::Result<Value, String> {
        match self.peek() {
            Some('\'' | '"') => Ok(Value::String(self.parse_quoted()?)),
            Some(c) if c.is_ascii_alphabetic() => match self.read_name().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                "null" => Ok(Value::Null),
                other => Err(format!("unsupported literal '{}'", other)),
            },
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
                {
                    self.advance();
                }
                let text: String = self.chars[start..self.pos].iter().collect();
                let number: f64 = text
                    .parse()
                    .map_err(|_| format!("invalid number '{}'", text))?;
                serde_json::Number::from_f64(number)
                    .map(Value::Number)
                    .ok_or_else(|| format!("invalid number '{}'", text))
            }
            _ => Err(format!("expected a literal at position {}", self.pos)),
        }
    }
}

fn evaluate<'a>(steps: &[Step], root: &'a Value) -> Vec<&'a Value> {
    let mut current = vec![root];
    for step in steps {
        let mut next = Vec::new();
        for node in current {
            if step.recursive {
                let mut all = Vec::new();
                descendants(node, &mut all);
                for n in all {
                    select(&step.selector, n, &mut next);
                }
            } else {
                select(&step.selector, node, &mut next);
            }
        }
        current = next;
    }
    current
}

fn descendants<'a>(node: &'a Value, out: &mut Vec<&'a Value>) {
    out.push(node);
    match node {
        Value::Object(map) => map.values().for_each(|v| descendants(v, out)),
        Value::Array(items) => items.iter().for_each(|v| descendants(v, out)),
        _ => {}
    }
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let idx = if index < 0 { len + index } else { index };
    (0..len).contains(&idx).then_some(idx as usize)
}

fn select<'a>(selector: &Selector, node: &'a Value, out: &mut Vec<&'a Value>) {
    match selector {
        Selector::Name(name) => {
            if let Some(v) = node.as_object().and_then(|m| m.get(name)) {
                out.push(v);
            }
        }
        Selector::Wildcard => match node {
            Value::Object(map) => out.extend(map.values()),
            Value::Array(items) => out.extend(items.iter()),
            _ => {}
        },
        Selector::Index(i) => {
            if let Some(items) = node.as_array() {
                if let Some(idx) = resolve_index(*i, items.len()) {
                    out.push(&items[idx]);
                }
            }
        }
        Selector::Slice(start, end) => {
            if let Some(items) = node.as_array() {
                let len = items.len() as i64;
                let clamp = |v: i64| if v < 0 { (len + v).max(0) } else { v.min(len) };
                let from = start.map(clamp).unwrap_or(0);
                let to = end.map(clamp).unwrap_or(len);
                if from < to {
                    out.extend(items[from as usize..to as usize].iter());
                }
            }
        }
        Selector::Union(selectors) => {
            for s in selectors {
                select(s, node, out);
            }
        }
        Selector::Filter(filter) => {
            if let Some(items) = node.as_array() {
                out.extend(items.iter().filter(|item| filter.matches(item)));
            }
        }
    }
}

impl Filter {
    fn matches(&self, item: &Value) -> bool {
        let results = evaluate(&self.path, item);
        match &self.condition {
            None => results.iter().any(|v| !matches!(v, Value::Null | Value::Bool(false))),
            Some((op, literal)) => results.iter().any(|v| compare(v, *op, literal)),
        }
    }
}

fn compare(left: &Value, op: CmpOp, right: &Value) -> bool {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => {
            return match op {
                CmpOp::Eq => left == right,
                CmpOp::Ne => left != right,
                _ => false,
            }
        }
    };

    let Some(ordering) = ordering else {
        return op == CmpOp::Ne;
    };
    match op {
        CmpOp::Eq => ordering == Ordering::Equal,
        CmpOp::Ne => ordering != Ordering::Equal,
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::Le => ordering != Ordering::Greater,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Ge => ordering != Ordering::Less,
    }
}
