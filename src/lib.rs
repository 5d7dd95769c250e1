//! Chunked, push-based XML reading and writing.
//!
//! The core of this crate is a non-validating XML 1.0 tokenizer that accepts
//! input in arbitrarily split chunks and pushes tokens into caller-supplied
//! callbacks. Every construct boundary (a tag name, a `-->`, a `]]>`, even a
//! `\r\n` pair) may fall across a chunk split without changing the emitted
//! sequence. On top of the tokenizer sit an event parser (well-formedness
//! validation, entity decoding, attribute-value normalization), a tree
//! builder for random-access use, and a serializer for the way back.
//!
//! # Streaming
//!
//! Implement [`EventSink`] and feed chunks as they arrive:
//!
//! ```
//! use chunked_xml::{EventSink, Position, Result, StreamOptions, StreamParser};
//!
//! #[derive(Default)]
//! struct TitleCollector {
//!     in_title: bool,
//!     titles: Vec<String>,
//! }
//!
//! impl EventSink for TitleCollector {
//!     fn start_element(
//!         &mut self,
//!         name: &str,
//!         _colon_index: Option<usize>,
//!         _attributes: &chunked_xml::Attributes,
//!         self_closing: bool,
//!         _pos: Position,
//!     ) -> Result<()> {
//!         self.in_title = name == "title" && !self_closing;
//!         Ok(())
//!     }
//!     fn end_element(&mut self, _name: &str, _colon: Option<usize>, _pos: Position) -> Result<()> {
//!         self.in_title = false;
//!         Ok(())
//!     }
//!     fn text(&mut self, content: &str, _pos: Position) -> Result<()> {
//!         if self.in_title {
//!             self.titles.push(content.to_string());
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut collector = TitleCollector::default();
//! let mut parser = StreamParser::with_options(StreamOptions::new().ignore_whitespace(true));
//! // chunks can be split anywhere, e.g. as they come off a socket
//! for chunk in ["<feed><title>one</ti", "tle><title>t&#119;o</title></feed>"] {
//!     parser.process(chunk, &mut collector)?;
//! }
//! parser.finish(&mut collector)?;
//! assert_eq!(collector.titles, ["one", "two"]);
//! # chunked_xml::Result::Ok(())
//! ```
//!
//! # Trees
//!
//! ```
//! let doc = chunked_xml::parse_str(r#"<library><book id="1">Moby-Dick</book></library>"#)?;
//! let book = doc.root.elements().next().unwrap();
//! assert_eq!(book.attribute("id"), Some("1"));
//! assert_eq!(book.text_content(), "Moby-Dick");
//!
//! let xml = doc.to_xml(&chunked_xml::StringifyOptions::new())?;
//! assert_eq!(xml, r#"<library><book id="1">Moby-Dick</book></library>"#);
//! # chunked_xml::Result::Ok(())
//! ```
#![cfg_attr(
    feature = "document-features",
    cfg_attr(doc, doc = ::document_features::document_features!())
)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
pub mod escape;
pub mod name;
pub mod parser;
pub mod reader;
pub mod tokenizer;
pub mod tree;
pub mod writer;

pub use crate::errors::{Error, Result, XmlSyntaxError};
pub use crate::parser::{Attributes, EventParser, EventSink, StreamOptions, StreamParser};
#[cfg(feature = "async")]
pub use crate::reader::read_from_async;
pub use crate::reader::{parse_file, parse_reader, read_from};
pub use crate::tokenizer::{Position, TokenSink, Tokenizer, TokenizerOptions};
pub use crate::tree::{
    parse_str, parse_str_with, Document, Element, Node, ParseOptions, TreeBuilder,
};
pub use crate::writer::{stringify, StringifyOptions};
