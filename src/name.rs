//! Module for handling qualified names: `prefix:local` or `local`.
//!
//! Splitting is purely syntactic. The prefix is everything before the *first*
//! colon; no namespace binding is performed and raw string equality decides
//! whether an end tag matches its start tag.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// An owned, already-split qualified name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParsedName {
    raw: String,
    colon: Option<usize>,
}

impl ParsedName {
    /// The name exactly as written, e.g. `ns:item`.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The part after the first colon, or the whole name.
    pub fn local_name(&self) -> &str {
        match self.colon {
            Some(i) => &self.raw[i + 1..],
            None => &self.raw,
        }
    }

    /// The part before the first colon, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.colon.map(|i| &self.raw[..i])
    }

    /// Byte index of the first colon, if any.
    pub fn colon_index(&self) -> Option<usize> {
        self.colon
    }
}

impl fmt::Display for ParsedName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for ParsedName {
    fn from(raw: &str) -> Self {
        parse_name(raw)
    }
}

/// Splits a raw qualified name at the first colon.
///
/// # Examples
///
/// ```
/// use chunked_xml::name::parse_name;
///
/// let name = parse_name("ns:item");
/// assert_eq!(name.prefix(), Some("ns"));
/// assert_eq!(name.local_name(), "item");
///
/// let name = parse_name("item");
/// assert_eq!(name.prefix(), None);
/// assert_eq!(name.local_name(), "item");
/// ```
pub fn parse_name(raw: &str) -> ParsedName {
    ParsedName {
        raw: raw.to_string(),
        colon: raw.find(':'),
    }
}

/// An interning cache for [`parse_name`] results.
///
/// Repetitive feeds mention the same handful of names thousands of times
/// (`<item>`, `<title>`, ...); the cache hands out the same shared allocation
/// for every repetition. Used by the tree builder; the tokenizer always emits
/// raw strings.
#[derive(Debug, Default)]
pub struct NameCache {
    names: HashMap<String, Rc<ParsedName>>,
}

impl NameCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared split name for `raw`, computing it on first sight.
    pub fn parse(&mut self, raw: &str) -> Rc<ParsedName> {
        if let Some(name) = self.names.get(raw) {
            return Rc::clone(name);
        }
        let name = Rc::new(parse_name(raw));
        self.names.insert(raw.to_string(), Rc::clone(&name));
        name
    }
}
