//! A module to handle the event parser sitting on top of the tokenizer.
//!
//! The [`EventParser`] consumes raw tokens, aggregates start tags with their
//! attributes, validates that end tags pair up with start tags, decodes
//! entities in character data and normalizes attribute values. Consumers
//! implement [`EventSink`]; the [`StreamParser`] ties a
//! [`Tokenizer`](crate::tokenizer::Tokenizer) and an [`EventParser`] together
//! for the common case.

use delegate::delegate;

use crate::errors::{Error, Result};
use crate::escape::{decode_entities, normalize_attribute_value};
use crate::tokenizer::{is_whitespace, Position, TokenSink, Tokenizer, TokenizerOptions};

/// Configuration for streaming event parsing.
#[derive(Clone, Copy, Debug)]
pub struct StreamOptions {
    pub(crate) ignore_whitespace: bool,
    pub(crate) ignore_comments: bool,
    pub(crate) ignore_processing_instructions: bool,
    pub(crate) coerce_cdata_to_text: bool,
    pub(crate) track_position: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamOptions {
    /// Creates the default streaming configuration.
    pub fn new() -> Self {
        Self {
            ignore_whitespace: false,
            ignore_comments: false,
            ignore_processing_instructions: false,
            coerce_cdata_to_text: false,
            track_position: false,
        }
    }

    /// Changes whether text events that decode to pure whitespace are
    /// suppressed.
    ///
    /// (`false` by default)
    pub fn ignore_whitespace(mut self, val: bool) -> Self {
        self.ignore_whitespace = val;
        self
    }

    /// Changes whether comment events are suppressed.
    ///
    /// (`false` by default)
    pub fn ignore_comments(mut self, val: bool) -> Self {
        self.ignore_comments = val;
        self
    }

    /// Changes whether processing-instruction events are suppressed. The XML
    /// declaration is not a processing instruction and is always forwarded.
    ///
    /// (`false` by default)
    pub fn ignore_processing_instructions(mut self, val: bool) -> Self {
        self.ignore_processing_instructions = val;
        self
    }

    /// Changes whether CDATA sections are forwarded as text events. The
    /// content is forwarded verbatim either way: CDATA is never
    /// entity-decoded.
    ///
    /// (`false` by default)
    pub fn coerce_cdata_to_text(mut self, val: bool) -> Self {
        self.coerce_cdata_to_text = val;
        self
    }

    /// Changes whether line/column/offset positions are maintained.
    ///
    /// (`false` by default for streaming; positions are mostly useful for
    /// error reporting and cost a little time per character)
    pub fn track_position(mut self, val: bool) -> Self {
        self.track_position = val;
        self
    }
}

/// The attributes of one start element, in document order.
///
/// The collection is owned by the [`EventParser`] and reused across
/// elements: storage only ever grows. Borrowed contents are valid for the
/// duration of the `start_element` callback only.
#[derive(Debug, Default)]
pub struct Attributes {
    /// Names and values of all attributes, concatenated
    buffer: String,
    entries: Vec<AttrEntry>,
}

#[derive(Debug)]
struct AttrEntry {
    start: usize,
    name_end: usize,
    value_end: usize,
    colon: Option<usize>,
}

impl Attributes {
    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the element has no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The raw qualified name of attribute `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds.
    pub fn name(&self, i: usize) -> &str {
        let entry = &self.entries[i];
        &self.buffer[entry.start..entry.name_end]
    }

    /// The normalized, entity-decoded value of attribute `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds.
    pub fn value(&self, i: usize) -> &str {
        let entry = &self.entries[i];
        &self.buffer[entry.name_end..entry.value_end]
    }

    /// Byte index of the first colon in the name of attribute `i`, if any.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds.
    pub fn colon_index(&self, i: usize) -> Option<usize> {
        self.entries[i].colon
    }

    /// The value of the attribute with the given raw qualified name.
    pub fn find(&self, name: &str) -> Option<&str> {
        (0..self.len()).find(|&i| self.name(i) == name).map(|i| self.value(i))
    }

    /// Iterates over `(name, value)` pairs in document order.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        (0..self.len()).map(move |i| (self.name(i), self.value(i)))
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.entries.clear();
    }

    fn push(&mut self, name: &str, value: &str) {
        let start = self.buffer.len();
        self.buffer.push_str(name);
        let name_end = self.buffer.len();
        self.buffer.push_str(value);
        self.entries.push(AttrEntry {
            start,
            name_end,
            value_end: self.buffer.len(),
            colon: name.find(':'),
        });
    }
}

/// Receiver for the events produced by an [`EventParser`].
///
/// All callbacks are optional: every method has a default no-op
/// implementation.
#[allow(unused_variables)]
pub trait EventSink {
    /// A complete start tag with all of its attributes. For a self-closing
    /// tag `self_closing` is `true` and a matching [`end_element`] call
    /// follows immediately.
    ///
    /// `attributes` is only valid during this call.
    ///
    /// [`end_element`]: Self::end_element
    fn start_element(
        &mut self,
        name: &str,
        colon_index: Option<usize>,
        attributes: &Attributes,
        self_closing: bool,
        pos: Position,
    ) -> Result<()> {
        Ok(())
    }

    /// An end tag, or the synthesized end of a self-closing tag (reported at
    /// the start tag's position).
    fn end_element(&mut self, name: &str, colon_index: Option<usize>, pos: Position) -> Result<()> {
        Ok(())
    }

    /// Entity-decoded character data.
    fn text(&mut self, content: &str, pos: Position) -> Result<()> {
        Ok(())
    }

    /// Verbatim CDATA content (never entity-decoded).
    fn cdata(&mut self, content: &str, pos: Position) -> Result<()> {
        Ok(())
    }

    /// A comment.
    fn comment(&mut self, content: &str, pos: Position) -> Result<()> {
        Ok(())
    }

    /// A processing instruction.
    fn processing_instruction(&mut self, target: &str, content: &str, pos: Position) -> Result<()> {
        Ok(())
    }

    /// The XML declaration. Always forwarded, regardless of filters.
    fn declaration(
        &mut self,
        version: &str,
        encoding: Option<&str>,
        standalone: Option<bool>,
        pos: Position,
    ) -> Result<()> {
        Ok(())
    }

    /// The document type declaration.
    fn doctype(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        pos: Position,
    ) -> Result<()> {
        Ok(())
    }
}

/// Validating event aggregator between a tokenizer and an [`EventSink`].
///
/// The parser keeps its own state (pending start element, element stack)
/// across chunks; the sink is borrowed per call through [`feed`](Self::feed),
/// which implements [`TokenSink`].
#[derive(Debug, Default)]
pub struct EventParser {
    ignore_whitespace: bool,
    ignore_comments: bool,
    ignore_processing_instructions: bool,
    coerce_cdata_to_text: bool,
    /// Name/position of the start tag being aggregated
    pending_name: String,
    pending_colon: Option<usize>,
    pending_pos: Position,
    attrs: Attributes,
    /// All currently opened elements which didn't have a matching end tag
    /// yet, concatenated. `opened_starts` indexes the start of each name.
    ///
    /// For `<root><inner attr="value">|</inner></root>` with the cursor at
    /// `|` the buffer contains `rootinner` and the starts are `[0, 4]`.
    opened_buffer: String,
    opened_starts: Vec<usize>,
    opened_pos: Vec<Position>,
}

impl EventParser {
    /// Creates an event parser with the default options.
    pub fn new() -> Self {
        Self::with_options(StreamOptions::new())
    }

    /// Creates an event parser from the given options (`track_position` has
    /// no effect here; it belongs to the tokenizer).
    pub fn with_options(options: StreamOptions) -> Self {
        Self {
            ignore_whitespace: options.ignore_whitespace,
            ignore_comments: options.ignore_comments,
            ignore_processing_instructions: options.ignore_processing_instructions,
            coerce_cdata_to_text: options.coerce_cdata_to_text,
            ..Self::default()
        }
    }

    /// Current number of opened, not yet closed elements.
    pub fn depth(&self) -> usize {
        self.opened_starts.len()
    }

    /// Couples this parser with an event sink, yielding the [`TokenSink`]
    /// to pass to [`Tokenizer::process`].
    pub fn feed<'a, S: EventSink>(&'a mut self, sink: &'a mut S) -> Feed<'a, S> {
        Feed { parser: self, sink }
    }

    /// Verifies that every opened element was closed. Call after the
    /// tokenizer's own `finish`.
    pub fn finish<S: EventSink>(&mut self, _sink: &mut S) -> Result<()> {
        if let (Some(&start), Some(&pos)) = (self.opened_starts.last(), self.opened_pos.last()) {
            let name = &self.opened_buffer[start..];
            return Err(Error::syntax(format!("Unclosed element <{}>", name), pos));
        }
        Ok(())
    }

    fn begin_element(&mut self, name: &str, pos: Position) {
        self.pending_name.clear();
        self.pending_name.push_str(name);
        self.pending_colon = name.find(':');
        self.pending_pos = pos;
        self.attrs.clear();
    }

    fn add_attribute(&mut self, name: &str, value: &str) {
        let normalized = normalize_attribute_value(value);
        let decoded = decode_entities(&normalized);
        self.attrs.push(name, &decoded);
    }

    fn finish_element<S: EventSink>(&mut self, self_closing: bool, sink: &mut S) -> Result<()> {
        sink.start_element(
            &self.pending_name,
            self.pending_colon,
            &self.attrs,
            self_closing,
            self.pending_pos,
        )?;
        if self_closing {
            // a self-closing tag never reaches the stack
            sink.end_element(&self.pending_name, self.pending_colon, self.pending_pos)?;
        } else {
            self.opened_starts.push(self.opened_buffer.len());
            self.opened_buffer.push_str(&self.pending_name);
            self.opened_pos.push(self.pending_pos);
        }
        Ok(())
    }

    fn end_element<S: EventSink>(&mut self, name: &str, pos: Position, sink: &mut S) -> Result<()> {
        let start = match self.opened_starts.pop() {
            Some(start) => start,
            None => {
                return Err(Error::syntax(
                    format!("Unexpected closing tag </{}> with no matching opening tag", name),
                    pos,
                ));
            }
        };
        let expected = &self.opened_buffer[start..];
        if expected != name {
            return Err(Error::syntax(
                format!(
                    "Mismatched closing tag: expected </{}> but found </{}>",
                    expected, name
                ),
                pos,
            ));
        }
        self.opened_pos.pop();
        sink.end_element(name, name.find(':'), pos)?;
        self.opened_buffer.truncate(start);
        Ok(())
    }

    fn text<S: EventSink>(&mut self, content: &str, pos: Position, sink: &mut S) -> Result<()> {
        let decoded = decode_entities(content);
        if self.ignore_whitespace && decoded.chars().all(is_whitespace) {
            return Ok(());
        }
        sink.text(&decoded, pos)
    }

    fn cdata<S: EventSink>(&mut self, content: &str, pos: Position, sink: &mut S) -> Result<()> {
        if self.coerce_cdata_to_text {
            sink.text(content, pos)
        } else {
            sink.cdata(content, pos)
        }
    }
}

/// The coupling of an [`EventParser`] with an [`EventSink`], implementing
/// the raw-token contract. Created by [`EventParser::feed`].
pub struct Feed<'a, S> {
    parser: &'a mut EventParser,
    sink: &'a mut S,
}

impl<S: EventSink> TokenSink for Feed<'_, S> {
    fn open_start_tag(&mut self, name: &str, pos: Position) -> Result<()> {
        self.parser.begin_element(name, pos);
        Ok(())
    }

    fn attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.parser.add_attribute(name, value);
        Ok(())
    }

    fn close_start_tag(&mut self, self_closing: bool) -> Result<()> {
        self.parser.finish_element(self_closing, self.sink)
    }

    fn end_tag(&mut self, name: &str, pos: Position) -> Result<()> {
        self.parser.end_element(name, pos, self.sink)
    }

    fn text(&mut self, content: &str, pos: Position) -> Result<()> {
        self.parser.text(content, pos, self.sink)
    }

    fn cdata(&mut self, content: &str, pos: Position) -> Result<()> {
        self.parser.cdata(content, pos, self.sink)
    }

    fn comment(&mut self, content: &str, pos: Position) -> Result<()> {
        if self.parser.ignore_comments {
            return Ok(());
        }
        self.sink.comment(content, pos)
    }

    fn processing_instruction(&mut self, target: &str, content: &str, pos: Position) -> Result<()> {
        if self.parser.ignore_processing_instructions {
            return Ok(());
        }
        self.sink.processing_instruction(target, content, pos)
    }

    fn declaration(
        &mut self,
        version: &str,
        encoding: Option<&str>,
        standalone: Option<bool>,
        pos: Position,
    ) -> Result<()> {
        self.sink.declaration(version, encoding, standalone, pos)
    }

    fn doctype(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        pos: Position,
    ) -> Result<()> {
        self.sink.doctype(name, public_id, system_id, pos)
    }
}

/// A tokenizer and an event parser composed into one push-based parser.
///
/// # Examples
///
/// ```
/// use chunked_xml::parser::{EventSink, StreamOptions, StreamParser};
/// use chunked_xml::tokenizer::Position;
/// use chunked_xml::Result;
///
/// #[derive(Default)]
/// struct TextCollector(String);
/// impl EventSink for TextCollector {
///     fn text(&mut self, content: &str, _pos: Position) -> Result<()> {
///         self.0.push_str(content);
///         Ok(())
///     }
/// }
///
/// let mut collector = TextCollector::default();
/// let mut parser = StreamParser::with_options(
///     StreamOptions::new().ignore_whitespace(true),
/// );
/// for chunk in ["<greeting>Hello ", "&amp; welcome</gree", "ting>"] {
///     parser.process(chunk, &mut collector)?;
/// }
/// parser.finish(&mut collector)?;
/// assert_eq!(collector.0, "Hello & welcome");
/// # chunked_xml::Result::Ok(())
/// ```
#[derive(Debug, Default)]
pub struct StreamParser {
    tokenizer: Tokenizer,
    parser: EventParser,
}

impl StreamParser {
    /// Creates a streaming parser with the default options.
    pub fn new() -> Self {
        Self::with_options(StreamOptions::new())
    }

    /// Creates a streaming parser from the given options.
    pub fn with_options(options: StreamOptions) -> Self {
        Self {
            tokenizer: Tokenizer::with_options(
                TokenizerOptions::new().track_position(options.track_position),
            ),
            parser: EventParser::with_options(options),
        }
    }

    /// Parses one chunk, pushing completed events into `sink`.
    pub fn process<S: EventSink>(&mut self, chunk: &str, sink: &mut S) -> Result<()> {
        let mut feed = self.parser.feed(sink);
        self.tokenizer.process(chunk, &mut feed)
    }

    /// Signals end of input: flushes pending text, verifies the tokenizer
    /// state and the element stack.
    pub fn finish<S: EventSink>(&mut self, sink: &mut S) -> Result<()> {
        {
            let mut feed = self.parser.feed(sink);
            self.tokenizer.finish(&mut feed)?;
        }
        self.parser.finish(sink)
    }

    delegate! {
        to self.tokenizer {
            /// The position of the next character to be consumed.
            pub fn position(&self) -> Position;
        }
        to self.parser {
            /// Current number of opened, not yet closed elements.
            pub fn depth(&self) -> usize;
        }
    }
}
