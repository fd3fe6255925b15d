//! Line grammar for ooTextFile archives.
//!
//! Two primitives cooperate recursively to take an archive apart:
//!
//! - [`extract_fields`] matches an ordered list of [`FieldSpec`]s against
//!   consecutive lines of a [`Block`] and hands back the values plus the
//!   remaining body.
//! - [`split_blocks`] cuts a body into sub-blocks at each repeated header
//!   line (`item [1]:`, `intervals [3]:`, ...).
//!
//! Lines are kept with their 1-based position so every error can point at
//! the region of the archive it came from.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::domain::error::{DomainError, DomainResult, Span};

static HEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<indent>\s*)(?P<label>\S+) \[(?P<index>\d+)\]:\s*$").expect("header regex")
});

/// Archive text split into lines, owning nothing but the line slices.
#[derive(Debug, Clone)]
pub struct Source<'a> {
    lines: Vec<&'a str>,
}

impl<'a> Source<'a> {
    /// Split text on `\n`, dropping a trailing `\r` so both line-ending
    /// conventions read the same.
    pub fn new(text: &'a str) -> Self {
        let lines = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .collect();
        Self { lines }
    }

    pub fn block(&self) -> Block<'_> {
        Block {
            lines: &self.lines,
            first_line: 1,
        }
    }
}

/// A contiguous run of archive lines.
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    lines: &'a [&'a str],
    first_line: usize,
}

impl<'a> Block<'a> {
    pub fn lines(&self) -> &'a [&'a str] {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 1-based archive line number of the line at `idx`.
    pub fn line_no(&self, idx: usize) -> usize {
        self.first_line + idx
    }

    pub fn span(&self) -> Span {
        let end = self.first_line + self.lines.len().saturating_sub(1);
        Span::new(self.first_line, end)
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Sub-block `[from, to)` in local line indices.
    pub fn slice(&self, from: usize, to: usize) -> Block<'a> {
        let to = to.min(self.lines.len());
        let from = from.min(to);
        Block {
            lines: &self.lines[from..to],
            first_line: self.first_line + from,
        }
    }

    /// Block from local line `from` to the end.
    pub fn tail(&self, from: usize) -> Block<'a> {
        self.slice(from, self.lines.len())
    }

    pub fn malformed(&self, expected: impl Into<String>) -> DomainError {
        DomainError::MalformedBlock {
            expected: expected.into(),
            span: self.span(),
            text: self.text(),
        }
    }
}

/// How a field line is recognised.
#[derive(Debug, Clone, Copy)]
pub enum KeyPattern {
    /// `key = value` where key is one of the listed spellings.
    Exact(&'static [&'static str]),
    /// `<anything>: key = value`, e.g. `intervals: size = 3`.
    Qualified(&'static str),
    /// A bare line without `=`, e.g. `tiers? <exists>`.
    Marker(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Float,
    Count,
    Marker,
}

/// One named field of a fixed-order grammar.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub key: KeyPattern,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn text(name: &'static str, keys: &'static [&'static str]) -> Self {
        Self {
            name,
            key: KeyPattern::Exact(keys),
            kind: FieldKind::Text,
        }
    }

    pub const fn float(name: &'static str, keys: &'static [&'static str]) -> Self {
        Self {
            name,
            key: KeyPattern::Exact(keys),
            kind: FieldKind::Float,
        }
    }

    pub const fn count(name: &'static str, keys: &'static [&'static str]) -> Self {
        Self {
            name,
            key: KeyPattern::Exact(keys),
            kind: FieldKind::Count,
        }
    }

    pub const fn qualified_count(name: &'static str, key: &'static str) -> Self {
        Self {
            name,
            key: KeyPattern::Qualified(key),
            kind: FieldKind::Count,
        }
    }

    pub const fn marker(name: &'static str, line: &'static str) -> Self {
        Self {
            name,
            key: KeyPattern::Marker(line),
            kind: FieldKind::Marker,
        }
    }

    /// Value part of `line` if the line is this field, else `None`.
    fn match_line<'l>(&self, line: &'l str) -> Option<&'l str> {
        let trimmed = line.trim();
        match self.key {
            KeyPattern::Marker(marker) => (trimmed == marker).then_some(""),
            KeyPattern::Exact(keys) => {
                let (key, value) = split_assignment(trimmed)?;
                keys.contains(&key).then_some(value)
            }
            KeyPattern::Qualified(suffix) => {
                let (key, value) = split_assignment(trimmed)?;
                let (qualifier, key) = key.split_once(':')?;
                (!qualifier.trim().is_empty() && key.trim() == suffix).then_some(value)
            }
        }
    }
}

/// Splits `key = value` at the first `=`. Keys never contain quotes.
fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() || key.contains('"') {
        return None;
    }
    Some((key, value.trim()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Float(f64),
    Count(usize),
    Present,
}

/// A captured field with the archive line it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub value: FieldValue,
    pub line: usize,
}

/// Result of [`extract_fields`]: values in declaration order plus the body
/// following the last field.
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    fields: Vec<Field>,
    pub body: Block<'a>,
    pub block: Block<'a>,
}

impl<'a> Fields<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    fn get(&self, name: &str) -> DomainResult<&Field> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| self.block.malformed(format!("field `{name}`")))
    }

    pub fn line(&self, name: &str) -> DomainResult<usize> {
        Ok(self.get(name)?.line)
    }

    pub fn text(&self, name: &str) -> DomainResult<String> {
        match &self.get(name)?.value {
            FieldValue::Text(s) => Ok(s.clone()),
            other => Err(self.wrong_kind(name, other)),
        }
    }

    pub fn float(&self, name: &str) -> DomainResult<f64> {
        match self.get(name)?.value {
            FieldValue::Float(v) => Ok(v),
            ref other => Err(self.wrong_kind(name, other)),
        }
    }

    pub fn count(&self, name: &str) -> DomainResult<usize> {
        match self.get(name)?.value {
            FieldValue::Count(v) => Ok(v),
            ref other => Err(self.wrong_kind(name, other)),
        }
    }

    fn wrong_kind(&self, name: &str, value: &FieldValue) -> DomainError {
        DomainError::InvalidValue {
            field: name.to_string(),
            value: format!("{value:?}"),
            line: self.block.span().start,
        }
    }
}

/// Match `specs` against consecutive lines of `block`, starting at the first
/// position where the whole sequence fits.
///
/// Fails with [`DomainError::MalformedBlock`] when no position matches, and
/// with [`DomainError::InvalidValue`] when the keys line up but a value does
/// not parse as its kind.
pub fn extract_fields<'a>(
    block: Block<'a>,
    specs: &[FieldSpec],
    expected: &str,
) -> DomainResult<Fields<'a>> {
    for start in 0..block.len() {
        if let Some((fields, end)) = match_at(block, specs, start)? {
            trace!(start = block.line_no(start), end = block.line_no(end), "{expected}");
            return Ok(Fields {
                fields,
                body: block.tail(end),
                block,
            });
        }
    }
    Err(block.malformed(expected))
}

/// Try the field sequence at local line `start`. Returns the fields and the
/// local index of the first line after them.
fn match_at(
    block: Block<'_>,
    specs: &[FieldSpec],
    start: usize,
) -> DomainResult<Option<(Vec<Field>, usize)>> {
    let lines = block.lines();
    let mut pos = start;
    let mut raw = Vec::with_capacity(specs.len());

    for spec in specs {
        let Some(line) = lines.get(pos) else {
            return Ok(None);
        };
        let Some(value) = spec.match_line(line) else {
            return Ok(None);
        };
        let line_no = block.line_no(pos);
        if spec.kind == FieldKind::Text {
            let Some((text, consumed)) = read_quoted(value, &lines[pos + 1..]) else {
                return Ok(None);
            };
            raw.push((spec, RawValue::Text(text), line_no));
            pos += 1 + consumed;
        } else {
            raw.push((spec, RawValue::Scalar(value), line_no));
            pos += 1;
        }
    }

    let fields = raw
        .into_iter()
        .map(|(spec, value, line)| convert(spec, value, line))
        .collect::<DomainResult<Vec<_>>>()?;
    Ok(Some((fields, pos)))
}

enum RawValue<'l> {
    Text(String),
    Scalar(&'l str),
}

fn convert(spec: &FieldSpec, value: RawValue<'_>, line: usize) -> DomainResult<Field> {
    let invalid = |v: &str| DomainError::InvalidValue {
        field: spec.name.to_string(),
        value: v.to_string(),
        line,
    };
    let value = match (spec.kind, value) {
        (FieldKind::Marker, _) => FieldValue::Present,
        (FieldKind::Text, RawValue::Text(s)) => FieldValue::Text(s),
        (FieldKind::Float, RawValue::Scalar(s)) => {
            FieldValue::Float(parse_float(s).ok_or_else(|| invalid(s))?)
        }
        (FieldKind::Count, RawValue::Scalar(s)) => {
            FieldValue::Count(parse_count(s).ok_or_else(|| invalid(s))?)
        }
        (_, RawValue::Text(s)) => return Err(invalid(&s)),
        (FieldKind::Text, RawValue::Scalar(s)) => return Err(invalid(s)),
    };
    Ok(Field {
        name: spec.name,
        value,
        line,
    })
}

/// Integer, decimal and exponent literals; non-finite values are rejected.
pub fn parse_float(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Non-negative integer literal.
pub fn parse_count(s: &str) -> Option<usize> {
    s.trim().parse::<usize>().ok()
}

/// Read a quoted string starting with `first` and continuing on `rest` until
/// the closing quote. `""` is an escaped quote. Returns the unescaped text and
/// the number of continuation lines consumed.
fn read_quoted(first: &str, rest: &[&str]) -> Option<(String, usize)> {
    let opening = first.strip_prefix('"')?;
    let mut text = String::new();
    let mut segment = opening;
    let mut consumed = 0;
    loop {
        let mut chars = segment.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c != '"' {
                text.push(c);
                continue;
            }
            if matches!(chars.peek(), Some((_, '"'))) {
                chars.next();
                text.push('"');
                continue;
            }
            // closing quote: only whitespace may follow
            return segment[i + 1..].trim().is_empty().then_some((text, consumed));
        }
        segment = rest.get(consumed)?;
        consumed += 1;
        text.push('\n');
    }
}

/// Recognises the repeated header line introducing each sub-block.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    labels: &'static [&'static str],
}

impl Header {
    pub const fn new(labels: &'static [&'static str]) -> Self {
        Self { labels }
    }

    /// Indentation width and declared index if `line` is this header.
    fn matches(&self, line: &str) -> Option<(usize, usize)> {
        let caps = HEADER_LINE.captures(line)?;
        let label = caps.name("label")?.as_str();
        if !self.labels.contains(&label) {
            return None;
        }
        let indent = caps.name("indent")?.as_str().chars().count();
        let index = caps.name("index")?.as_str().parse().ok()?;
        Some((indent, index))
    }
}

pub const ITEM_HEADER: Header = Header::new(&["item"]);
pub const INTERVAL_HEADER: Header = Header::new(&["intervals"]);
pub const POINT_HEADER: Header = Header::new(&["points"]);

/// Cut `body` into sub-blocks, each running from one header line up to the
/// next header at the same depth or the end of the body.
///
/// The depth is fixed by the first header found; deeper lines with the same
/// header text belong to the enclosing sub-block. Lines before the first
/// header are ignored. Document order is authoritative, declared indices
/// are not checked for sequence.
pub fn split_blocks<'a>(body: Block<'a>, header: Header) -> Vec<Block<'a>> {
    let mut depth = None;
    let mut starts = Vec::new();
    for (idx, line) in body.lines().iter().enumerate() {
        let Some((indent, _index)) = header.matches(line) else {
            continue;
        };
        match depth {
            None => {
                depth = Some(indent);
                starts.push(idx);
            }
            Some(d) if d == indent => starts.push(idx),
            Some(_) => {}
        }
    }

    starts
        .iter()
        .enumerate()
        .map(|(n, &from)| {
            let to = starts.get(n + 1).copied().unwrap_or(body.len());
            body.slice(from, to)
        })
        .collect()
}
