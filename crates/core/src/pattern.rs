//! Element filter patterns.
//!
//! A filter is a whitespace-separated list of selector-like clauses:
//!
//! - `div` — tag name
//! - `*` — any tag
//! - `div.note` / `.note` — tag (or any tag) with a class token
//! - `a[href]` — tag with an attribute present
//! - `a[rel=next]`, `a[title="two words"]` — attribute with an exact value
//!
//! Each clause compiles to one [`FilterPattern`]. A node matches the filter if it
//! matches any of its patterns.
//!
//! ```
//! use canopy_core::pattern::parse_element_filter;
//!
//! let patterns = parse_element_filter("div.note a[rel=next]").unwrap();
//! assert_eq!(patterns.len(), 2);
//! assert_eq!(patterns[0].name(), "DIV.note");
//! assert_eq!(patterns[1].name(), "A[rel=\"next\"]");
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::{Error, Result};

const SYNTAX_ERROR: &str = "Invalid element syntax.";

/// A compiled element matcher.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FilterPattern {
    tag_name: String,
    class_name: Option<String>,
    attr_name: Option<String>,
    attr_value: Option<String>,
    name: String,
}

impl FilterPattern {
    /// Creates a pattern from its parts. The tag is upper-cased.
    pub fn new(
        tag_name: &str,
        class_name: Option<&str>,
        attr_name: Option<&str>,
        attr_value: Option<&str>,
    ) -> Self {
        let mut pattern = Self {
            tag_name: tag_name.to_ascii_uppercase(),
            class_name: class_name.map(String::from),
            attr_name: attr_name.map(String::from),
            attr_value: attr_value.map(String::from),
            name: String::new(),
        };
        pattern.name = pattern.canonical_name();
        pattern
    }

    /// Creates a pattern matching any container carrying `attr_name`.
    pub fn any_with_attribute(attr_name: &str) -> Self {
        Self::new("*", None, Some(attr_name), None)
    }

    /// Returns the upper-cased tag name, or `*`.
    #[inline]
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// Returns the required class token.
    #[inline]
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    /// Returns the required attribute name.
    #[inline]
    pub fn attr_name(&self) -> Option<&str> {
        self.attr_name.as_deref()
    }

    /// Returns the required attribute value.
    #[inline]
    pub fn attr_value(&self) -> Option<&str> {
        self.attr_value.as_deref()
    }

    /// Returns the canonical display name, `TAG[.class][[attr[="value"]]]`.
    ///
    /// Distinct patterns have distinct names, so the name doubles as a cache key.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tests a container against this pattern.
    ///
    /// `attr_value` is the value of [`attr_name`](Self::attr_name) and
    /// `class_value` the value of the `class` attribute, each as the caller
    /// wants them evaluated (current or historical).
    pub fn matches(&self, tag_name: &str, attr_value: Option<&str>, class_value: Option<&str>) -> bool {
        if self.tag_name != "*" && !self.tag_name.eq_ignore_ascii_case(tag_name) {
            return false;
        }

        if self.attr_name.is_some() {
            let Some(value) = attr_value else {
                return false;
            };
            if let Some(expected) = &self.attr_value {
                if expected != value {
                    return false;
                }
            }
        }

        if let Some(class_name) = &self.class_name {
            return class_value
                .map(|classes| classes.split_whitespace().any(|token| token == class_name))
                .unwrap_or(false);
        }

        true
    }

    fn canonical_name(&self) -> String {
        let mut name = self.tag_name.clone();
        if let Some(class_name) = &self.class_name {
            name.push('.');
            name.push_str(class_name);
        }
        if let Some(attr_name) = &self.attr_name {
            name.push('[');
            name.push_str(attr_name);
            if let Some(value) = &self.attr_value {
                name.push_str("=\"");
                name.push_str(&value.replace('"', "\\\""));
                name.push('"');
            }
            name.push(']');
        }
        name
    }
}

/// Returns true if `c` may start a tag, class or attribute name.
#[inline]
pub fn is_name_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == ':' || c == '_'
}

/// Returns true if `c` may continue a tag, class or attribute name.
#[inline]
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')
}

/// Returns true if `name` is a valid attribute name.
pub fn is_valid_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Outside,
    TagName,
    ClassName,
    BeginAttrName,
    AttrName,
    EndAttrName,
    BeginValue,
    Value,
    QuotedValue,
    EndValue,
}

#[derive(Default)]
struct Clause {
    tag_name: String,
    class_name: Option<String>,
    attr_name: Option<String>,
    attr_value: Option<String>,
}

impl Clause {
    fn tag(c: char) -> Self {
        let mut tag_name = String::new();
        tag_name.push(c);
        Self {
            tag_name,
            ..Self::default()
        }
    }

    fn into_pattern(self) -> FilterPattern {
        FilterPattern::new(
            &self.tag_name,
            self.class_name.as_deref(),
            self.attr_name.as_deref(),
            self.attr_value.as_deref(),
        )
    }
}

/// Character-level state machine over a filter string.
struct Compiler {
    state: State,
    current: Option<Clause>,
    quote: char,
    patterns: Vec<FilterPattern>,
}

impl Compiler {
    fn new() -> Self {
        Self {
            state: State::Outside,
            current: None,
            quote: '"',
            patterns: Vec::new(),
        }
    }

    fn finish_clause(&mut self) {
        if let Some(clause) = self.current.take() {
            self.patterns.push(clause.into_pattern());
        }
        self.state = State::Outside;
    }

    fn clause(&mut self, position: usize) -> Result<&mut Clause> {
        self.current
            .as_mut()
            .ok_or_else(|| Error::syntax(SYNTAX_ERROR, position))
    }

    fn step(&mut self, c: char, position: usize) -> Result<()> {
        let whitespace = c.is_whitespace();
        match self.state {
            State::Outside => {
                if is_name_start_char(c) || c == '*' {
                    self.current = Some(Clause::tag(c));
                    self.state = State::TagName;
                } else if c == '.' {
                    self.current = Some(Clause {
                        tag_name: String::from("*"),
                        class_name: Some(String::new()),
                        ..Clause::default()
                    });
                    self.state = State::ClassName;
                } else if !whitespace {
                    return Err(Error::syntax(SYNTAX_ERROR, position));
                }
            }
            State::TagName => {
                if c == '.' {
                    self.clause(position)?.class_name = Some(String::new());
                    self.state = State::ClassName;
                } else if is_name_char(c) && self.clause(position)?.tag_name != "*" {
                    self.clause(position)?.tag_name.push(c);
                } else if c == '[' {
                    self.state = State::BeginAttrName;
                } else if whitespace {
                    self.finish_clause();
                } else {
                    return Err(Error::syntax(SYNTAX_ERROR, position));
                }
            }
            State::ClassName => {
                if is_name_char(c) {
                    self.clause(position)?
                        .class_name
                        .get_or_insert_with(String::new)
                        .push(c);
                } else if whitespace {
                    self.finish_clause();
                } else {
                    return Err(Error::syntax(SYNTAX_ERROR, position));
                }
            }
            State::BeginAttrName => {
                if is_name_start_char(c) {
                    let mut name = String::new();
                    name.push(c);
                    self.clause(position)?.attr_name = Some(name);
                    self.state = State::AttrName;
                } else if !whitespace {
                    return Err(Error::syntax(SYNTAX_ERROR, position));
                }
            }
            State::AttrName => {
                if is_name_char(c) {
                    self.clause(position)?
                        .attr_name
                        .get_or_insert_with(String::new)
                        .push(c);
                } else if whitespace {
                    self.state = State::EndAttrName;
                } else if c == '=' {
                    self.state = State::BeginValue;
                } else if c == ']' {
                    self.finish_clause();
                } else {
                    return Err(Error::syntax(SYNTAX_ERROR, position));
                }
            }
            State::EndAttrName => {
                if c == ']' {
                    self.finish_clause();
                } else if c == '=' {
                    self.state = State::BeginValue;
                } else if !whitespace {
                    return Err(Error::syntax(SYNTAX_ERROR, position));
                }
            }
            State::BeginValue => {
                if c == '"' || c == '\'' {
                    self.quote = c;
                    self.clause(position)?.attr_value = Some(String::new());
                    self.state = State::QuotedValue;
                } else if !whitespace {
                    let mut value = String::new();
                    value.push(c);
                    self.clause(position)?.attr_value = Some(value);
                    self.state = State::Value;
                }
            }
            State::Value => {
                if whitespace {
                    self.state = State::EndValue;
                } else if c == ']' {
                    self.finish_clause();
                } else {
                    self.clause(position)?
                        .attr_value
                        .get_or_insert_with(String::new)
                        .push(c);
                }
            }
            State::QuotedValue => {
                if c == self.quote {
                    self.state = State::EndValue;
                } else {
                    self.clause(position)?
                        .attr_value
                        .get_or_insert_with(String::new)
                        .push(c);
                }
            }
            State::EndValue => {
                if c == ']' {
                    self.finish_clause();
                } else if !whitespace {
                    return Err(Error::syntax(SYNTAX_ERROR, position));
                }
            }
        }
        Ok(())
    }

    fn finish(mut self, len: usize) -> Result<Vec<FilterPattern>> {
        if let Some(clause) = &self.current {
            let complete = match self.state {
                State::TagName => true,
                State::ClassName => clause.class_name.as_deref().is_some_and(|c| !c.is_empty()),
                _ => false,
            };
            if !complete {
                return Err(Error::syntax(SYNTAX_ERROR, len));
            }
            self.finish_clause();
        }

        if self.patterns.is_empty() {
            return Err(Error::syntax(SYNTAX_ERROR, len));
        }
        Ok(self.patterns)
    }
}

/// Compiles a filter string into its patterns.
///
/// Fails with [`Error::Syntax`] on any unexpected character, on input ending in
/// the middle of a clause, or on input containing no clause at all.
pub fn parse_element_filter(input: &str) -> Result<Vec<FilterPattern>> {
    let mut compiler = Compiler::new();
    for (position, c) in input.char_indices() {
        compiler.step(c, position)?;
    }
    let patterns = compiler.finish(input.len())?;
    log::trace!("compiled filter {:?} into {} pattern(s)", input, patterns.len());
    Ok(patterns)
}
