//! A module to collect parse events into a document tree.
//!
//! [`TreeBuilder`] implements [`EventSink`] and assembles nested [`Node`]s;
//! [`parse_str`] / [`parse_str_with`] wrap it together with a
//! [`StreamParser`] for the common one-shot case.

use std::rc::Rc;

use crate::errors::{Error, Result};
use crate::name::{parse_name, NameCache, ParsedName};
use crate::parser::{Attributes, EventSink, StreamOptions, StreamParser};
use crate::tokenizer::{is_whitespace, Position};

/// Configuration for parsing a document into a tree.
#[derive(Clone, Copy, Debug)]
pub struct ParseOptions {
    pub(crate) ignore_whitespace: bool,
    pub(crate) ignore_comments: bool,
    pub(crate) track_position: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseOptions {
    /// Creates the default tree-parsing configuration.
    pub fn new() -> Self {
        Self {
            ignore_whitespace: false,
            ignore_comments: false,
            track_position: true,
        }
    }

    /// Changes whether pure-whitespace text nodes are dropped.
    ///
    /// (`false` by default)
    pub fn ignore_whitespace(mut self, val: bool) -> Self {
        self.ignore_whitespace = val;
        self
    }

    /// Changes whether comments are dropped.
    ///
    /// (`false` by default)
    pub fn ignore_comments(mut self, val: bool) -> Self {
        self.ignore_comments = val;
        self
    }

    /// Changes whether element positions are recorded.
    ///
    /// (`true` by default)
    pub fn track_position(mut self, val: bool) -> Self {
        self.track_position = val;
        self
    }
}

/// The `<?xml ...?>` declaration of a document.
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    /// XML version, `1.0` unless declared otherwise
    pub version: String,
    /// Declared encoding, informational only (input is already decoded)
    pub encoding: Option<String>,
    /// Declared standalone status
    pub standalone: Option<bool>,
}

/// The `<!DOCTYPE ...>` declaration of a document. Declarations inside the
/// internal subset are not represented.
#[derive(Clone, Debug, PartialEq)]
pub struct Doctype {
    /// Name of the root element
    pub name: String,
    /// Public identifier, if declared
    pub public_id: Option<String>,
    /// System identifier, if declared
    pub system_id: Option<String>,
}

/// One attribute of an [`Element`], with its value already normalized and
/// entity-decoded.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    /// The split qualified name
    pub name: Rc<ParsedName>,
    /// The decoded value
    pub value: String,
}

impl Attribute {
    /// Creates an attribute from a raw qualified name and a value.
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: Rc::new(parse_name(name)),
            value: value.into(),
        }
    }
}

/// A node in the document tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// A nested element
    Element(Element),
    /// Decoded character data
    Text(String),
    /// Verbatim CDATA content
    Cdata(String),
    /// A comment
    Comment(String),
    /// A processing instruction
    ProcessingInstruction {
        /// The instruction target
        target: String,
        /// The instruction body, empty if none
        content: String,
    },
}

/// An element with attributes and children.
#[derive(Clone, Debug)]
pub struct Element {
    /// The split qualified name
    pub name: Rc<ParsedName>,
    /// Attributes in document order
    pub attributes: Vec<Attribute>,
    /// Child nodes in document order
    pub children: Vec<Node>,
    /// Position of the element's `<` (zero when tracking was disabled or the
    /// element was built programmatically)
    pub position: Position,
}

impl Element {
    /// Creates an empty element with the given raw qualified name.
    pub fn new(name: &str) -> Self {
        Self {
            name: Rc::new(parse_name(name)),
            attributes: Vec::new(),
            children: Vec::new(),
            position: Position::default(),
        }
    }

    /// The value of the attribute with the given raw qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.as_str() == name)
            .map(|a| a.value.as_str())
    }

    /// Iterates over the element children, skipping text and other nodes.
    pub fn elements<'a>(&'a self) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Concatenates the direct text and CDATA children.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                Node::Text(t) | Node::Cdata(t) => out.push_str(t),
                _ => {}
            }
        }
        out
    }
}

/// Position is parser bookkeeping, not document structure, so trees compare
/// structurally (a reparsed serialization equals its source tree).
impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.attributes == other.attributes
            && self.children == other.children
    }
}

/// A parsed XML document.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// The XML declaration, if present
    pub declaration: Option<Declaration>,
    /// The document type declaration, if present
    pub doctype: Option<Doctype>,
    /// Comments and processing instructions before the root element
    pub prolog: Vec<Node>,
    /// The single root element
    pub root: Element,
    /// Comments and processing instructions after the root element
    pub epilog: Vec<Node>,
}

impl Document {
    /// Creates a document around the given root element.
    pub fn new(root: Element) -> Self {
        Self {
            declaration: None,
            doctype: None,
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }
}

/// An [`EventSink`] assembling events into a [`Document`].
#[derive(Debug, Default)]
pub struct TreeBuilder {
    declaration: Option<Declaration>,
    doctype: Option<Doctype>,
    prolog: Vec<Node>,
    epilog: Vec<Node>,
    root: Option<Element>,
    stack: Vec<Element>,
    names: NameCache,
}

impl TreeBuilder {
    /// Creates an empty tree builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finishes building and returns the document.
    pub fn into_document(self) -> Result<Document> {
        let root = match self.root {
            Some(root) => root,
            None => {
                return Err(Error::syntax(
                    "No root element found in XML document",
                    Position::start(),
                ));
            }
        };
        Ok(Document {
            declaration: self.declaration,
            doctype: self.doctype,
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }

    /// Where a non-element node at the current nesting level belongs.
    fn attach(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None if self.root.is_none() => self.prolog.push(node),
            None => self.epilog.push(node),
        }
    }
}

impl EventSink for TreeBuilder {
    fn start_element(
        &mut self,
        name: &str,
        _colon_index: Option<usize>,
        attributes: &Attributes,
        _self_closing: bool,
        pos: Position,
    ) -> Result<()> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(Error::syntax(
                "Multiple root elements found in XML document",
                pos,
            ));
        }
        let mut element = Element {
            name: self.names.parse(name),
            attributes: Vec::with_capacity(attributes.len()),
            children: Vec::new(),
            position: pos,
        };
        for (attr_name, value) in attributes.iter() {
            element.attributes.push(Attribute {
                name: self.names.parse(attr_name),
                value: value.to_string(),
            });
        }
        self.stack.push(element);
        Ok(())
    }

    fn end_element(&mut self, name: &str, _colon_index: Option<usize>, pos: Position) -> Result<()> {
        let element = match self.stack.pop() {
            Some(element) => element,
            None => {
                return Err(Error::syntax(
                    format!("Unexpected closing tag </{}> with no matching opening tag", name),
                    pos,
                ));
            }
        };
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(Node::Element(element)),
            None => self.root = Some(element),
        }
        Ok(())
    }

    fn text(&mut self, content: &str, pos: Position) -> Result<()> {
        if self.stack.is_empty() {
            if content.chars().all(is_whitespace) {
                return Ok(());
            }
            return Err(Error::syntax("Unexpected text outside of root element", pos));
        }
        self.attach(Node::Text(content.to_string()));
        Ok(())
    }

    fn cdata(&mut self, content: &str, pos: Position) -> Result<()> {
        if self.stack.is_empty() {
            return Err(Error::syntax(
                "Unexpected CDATA section outside of root element",
                pos,
            ));
        }
        self.attach(Node::Cdata(content.to_string()));
        Ok(())
    }

    fn comment(&mut self, content: &str, _pos: Position) -> Result<()> {
        self.attach(Node::Comment(content.to_string()));
        Ok(())
    }

    fn processing_instruction(&mut self, target: &str, content: &str, _pos: Position) -> Result<()> {
        self.attach(Node::ProcessingInstruction {
            target: target.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }

    fn declaration(
        &mut self,
        version: &str,
        encoding: Option<&str>,
        standalone: Option<bool>,
        _pos: Position,
    ) -> Result<()> {
        self.declaration = Some(Declaration {
            version: version.to_string(),
            encoding: encoding.map(str::to_string),
            standalone,
        });
        Ok(())
    }

    fn doctype(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        _pos: Position,
    ) -> Result<()> {
        self.doctype = Some(Doctype {
            name: name.to_string(),
            public_id: public_id.map(str::to_string),
            system_id: system_id.map(str::to_string),
        });
        Ok(())
    }
}

/// Parses a complete document with the default options.
///
/// # Examples
///
/// ```
/// let doc = chunked_xml::parse_str(r#"<library><book id="1">Moby-Dick</book></library>"#)?;
/// assert_eq!(doc.root.name.as_str(), "library");
/// let book = doc.root.elements().next().unwrap();
/// assert_eq!(book.attribute("id"), Some("1"));
/// assert_eq!(book.text_content(), "Moby-Dick");
/// # chunked_xml::Result::Ok(())
/// ```
pub fn parse_str(xml: &str) -> Result<Document> {
    parse_str_with(xml, &ParseOptions::new())
}

/// Parses a complete document with the given options.
pub fn parse_str_with(xml: &str, options: &ParseOptions) -> Result<Document> {
    let mut parser = StreamParser::with_options(
        StreamOptions::new()
            .ignore_whitespace(options.ignore_whitespace)
            .ignore_comments(options.ignore_comments)
            .track_position(options.track_position),
    );
    let mut builder = TreeBuilder::new();
    parser.process(xml, &mut builder)?;
    parser.finish(&mut builder)?;
    builder.into_document()
}
