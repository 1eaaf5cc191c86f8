//! Deferred tokens.
//!
//! A deferred string is text carrying one or more `<% expression %>`
//! markers. The markers are parsed once, when the string enters the property
//! tree, and are only substituted when a template is finalized against a
//! [`DataBag`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::data::DataBag;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<%\s*(.*?)\s*%>").unwrap());

/// One piece of a deferred string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text emitted as-is.
    Literal(String),
    /// A data bag key, substituted at finalize time.
    Token(String),
}

/// A string with embedded deferred tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredString {
    segments: Vec<Segment>,
}

impl DeferredString {
    /// A deferred string made of a single token.
    pub fn token(expression: impl AsRef<str>) -> Self {
        Self {
            segments: vec![Segment::Token(expression.as_ref().trim().to_string())],
        }
    }

    /// Parse marker syntax out of `text`.
    ///
    /// Returns `None` when the text carries no marker with a non-empty
    /// expression, in which case the caller should keep it as a literal.
    pub fn parse(text: &str) -> Option<Self> {
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in TOKEN_PATTERN.captures_iter(text) {
            let (Some(whole), Some(expr)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let expression = expr.as_str().trim();
            if expression.is_empty() {
                continue;
            }
            if whole.start() > last {
                segments.push(Segment::Literal(text[last..whole.start()].to_string()));
            }
            segments.push(Segment::Token(expression.to_string()));
            last = whole.end();
        }

        if !segments.iter().any(|s| matches!(s, Segment::Token(_))) {
            return None;
        }
        if last < text.len() {
            segments.push(Segment::Literal(text[last..].to_string()));
        }

        Some(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Token expressions in order of appearance.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Token(t) => Some(t.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitute every token from `data`.
    ///
    /// A token whose key is missing from the data bag is written back in
    /// its marker form, so the output is deterministic either way.
    pub fn render(&self, data: &DataBag) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Token(key) => match data.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        debug!("No data for token <% {} %>, leaving it in place", key);
                        write_marker(&mut out, key);
                    }
                },
            }
        }
        out
    }
}

fn write_marker(out: &mut String, key: &str) {
    out.push_str("<% ");
    out.push_str(key);
    out.push_str(" %>");
}

/// Whether `text` contains at least one token marker.
pub fn contains_marker(text: &str) -> bool {
    DeferredString::parse(text).is_some()
}

impl fmt::Display for DeferredString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Token(key) => write_marker(&mut out, key),
            }
        }
        f.write_str(&out)
    }
}

impl Serialize for DeferredString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
