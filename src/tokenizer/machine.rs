//! The character-driven tokenizer state machine.

use std::borrow::Cow;
use std::mem;

use crate::errors::{Error, Result};

use super::{
    is_name_char, is_name_start_char, is_whitespace, Position, TokenSink, TokenizerOptions,
};

/// Possible tokenizer states.
///
/// `Initial` is both the start state and the only accepting state; every
/// other state has a specific end-of-input error message. The multi-character
/// terminators `-->`, `]]>` and `?>` are matched through dedicated sub-states
/// so that a partial terminator at a chunk boundary resumes correctly and a
/// disproved terminator character is committed back as content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Prolog or element content; accumulates text
    Initial,
    /// Triggered on `<`
    TagOpen,
    /// Inside the name of a start tag
    TagName,
    /// Inside the name of an end tag
    EndTagName,
    /// Inside a start tag, between attributes
    AfterTagName,
    /// After the name of an end tag, before `>`
    AfterEndTagName,
    /// After `/` inside a start tag; only `>` may follow
    ExpectSelfCloseGt,
    /// Inside an attribute name
    AttributeName,
    /// After an attribute name, before `=`
    AfterAttributeName,
    /// After `=`, before the opening quote
    BeforeAttributeValue,
    /// Inside a single-quoted attribute value
    AttributeValueSingle,
    /// Inside a double-quoted attribute value
    AttributeValueDouble,
    /// Triggered on `<!`
    MarkupDeclaration,
    /// Triggered on `<!-`; requires the second `-`
    CommentStart,
    /// Inside comment content
    Comment,
    /// Seen `-` inside a comment
    CommentDash,
    /// Seen `--` inside a comment
    CommentDashDash,
    /// Progressively matching `CDATA[` after `<![`
    CdataStart,
    /// Inside CDATA content
    Cdata,
    /// Seen `]` inside CDATA
    CdataBracket,
    /// Seen `]]` inside CDATA
    CdataBracketBracket,
    /// Inside a processing instruction target
    PiTarget,
    /// Seen `?` directly after a processing instruction target
    PiTargetQuestion,
    /// Inside processing instruction content
    PiContent,
    /// Seen `?` inside processing instruction content
    PiQuestion,
    /// Progressively matching `DOCTYPE` and the whitespace after it
    DoctypeStart,
    /// Inside the DOCTYPE name
    DoctypeName,
    /// After the DOCTYPE name
    DoctypeAfterName,
    /// Progressively matching `PUBLIC` and seeking its opening quote
    DoctypePublic,
    /// Inside the public identifier literal
    DoctypePublicId,
    /// After the public identifier, before a system identifier or `>`
    DoctypeAfterPublicId,
    /// Progressively matching `SYSTEM` and seeking its opening quote
    DoctypeSystem,
    /// Inside the system identifier literal
    DoctypeSystemId,
    /// Inside the internal subset `[...]`
    DoctypeInternalSubset,
    /// Inside a quoted string in the internal subset
    DoctypeInternalSubsetString,
}

/// Cross-chunk accumulator for one unbounded-length construct.
///
/// While scanning only `start` is set; the captured bytes stay in the
/// tokenizer buffer. At a chunk boundary the scanned part moves into
/// `partial` and capture restarts at the head of the next buffer. A finished
/// token therefore costs no allocation when it fits in one chunk, and one
/// allocation plus `partial` growth per crossed boundary otherwise.
#[derive(Debug, Default)]
struct Accum {
    start: Option<usize>,
    partial: String,
    pos: Position,
}

impl Accum {
    #[inline]
    fn is_active(&self) -> bool {
        self.start.is_some() || !self.partial.is_empty()
    }

    #[inline]
    fn begin(&mut self, at: usize, pos: Position) {
        debug_assert!(!self.is_active());
        self.start = Some(at);
        self.pos = pos;
    }

    /// Saves the part captured so far before the buffer is replaced.
    fn save(&mut self, buf: &str) {
        if let Some(start) = self.start {
            self.partial.push_str(&buf[start..]);
            self.start = Some(0);
        }
    }

    /// Closes the accumulator and returns everything captured up to `end`,
    /// minus `strip` trailing bytes (the already-scanned part of a
    /// terminator, always ASCII).
    fn finish<'b>(&mut self, buf: &'b str, end: usize, strip: usize) -> Cow<'b, str> {
        let slice = match self.start.take() {
            Some(start) => &buf[start..end],
            None => "",
        };
        if self.partial.is_empty() {
            Cow::Borrowed(&slice[..slice.len().saturating_sub(strip)])
        } else {
            let mut all = mem::take(&mut self.partial);
            all.push_str(slice);
            all.truncate(all.len().saturating_sub(strip));
            Cow::Owned(all)
        }
    }
}

/// A chunked, push-based XML tokenizer.
///
/// Feed decoded text with [`process`](Self::process) as often as needed, then
/// call [`finish`](Self::finish) exactly once. Tokens are pushed into the
/// given [`TokenSink`] in document order; the emitted sequence is independent
/// of how the input was split into chunks.
///
/// # Examples
///
/// ```
/// use chunked_xml::tokenizer::{Position, TokenSink, Tokenizer};
/// use chunked_xml::Result;
///
/// #[derive(Default)]
/// struct Names(Vec<String>);
/// impl TokenSink for Names {
///     fn open_start_tag(&mut self, name: &str, _pos: Position) -> Result<()> {
///         self.0.push(name.to_string());
///         Ok(())
///     }
/// }
///
/// let mut names = Names::default();
/// let mut tokenizer = Tokenizer::new();
/// // chunk boundaries may fall anywhere, even inside a tag name
/// tokenizer.process("<ro", &mut names)?;
/// tokenizer.process("ot><item/></root>", &mut names)?;
/// tokenizer.finish(&mut names)?;
/// assert_eq!(names.0, ["root", "item"]);
/// # chunked_xml::Result::Ok(())
/// ```
#[derive(Debug)]
pub struct Tokenizer {
    state: State,
    /// Line-ending normalized working buffer: the current chunk, preceded by
    /// whatever a pending `\r` resolved to.
    buf: String,
    cursor: usize,
    track: bool,
    /// Position of the character at `cursor`
    pos: Position,
    /// Position of the `<` that opened the construct being scanned
    markup_pos: Position,
    /// Text, comment/CDATA/PI content, attribute values, DOCTYPE identifiers
    content: Accum,
    /// Tag/attribute/PI-target/DOCTYPE names
    name: Accum,
    /// Finished name waiting for the rest of its construct
    held_name: String,
    held_public: Option<String>,
    held_system: Option<String>,
    /// Progress through `CDATA[`, `DOCTYPE`, `PUBLIC` or `SYSTEM`
    keyword_pos: usize,
    /// Opening quote of the DOCTYPE literal or subset string being scanned
    quote: char,
    subset_depth: usize,
    /// The previous chunk ended in `\r`; normalization is deferred until the
    /// next character shows whether it belongs to a `\r\n` pair.
    pending_cr: bool,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    /// Creates a tokenizer with the default options.
    pub fn new() -> Self {
        Self::with_options(TokenizerOptions::new())
    }

    /// Creates a tokenizer from the given options.
    pub fn with_options(options: TokenizerOptions) -> Self {
        let pos = if options.track_position {
            Position::start()
        } else {
            Position::default()
        };
        Self {
            state: State::Initial,
            buf: String::new(),
            cursor: 0,
            track: options.track_position,
            pos,
            markup_pos: pos,
            content: Accum::default(),
            name: Accum::default(),
            held_name: String::new(),
            held_public: None,
            held_system: None,
            keyword_pos: 0,
            quote: '"',
            subset_depth: 0,
            pending_cr: false,
        }
    }

    /// The position of the next character to be consumed.
    pub fn position(&self) -> Position {
        self.pos
    }

    /// Tokenizes one chunk, pushing every completed token into `sink`.
    ///
    /// A construct left unfinished at the end of the chunk (including a
    /// partially-seen terminator such as `--` of `-->`) is carried over and
    /// resumed by the next call.
    pub fn process<S: TokenSink>(&mut self, chunk: &str, sink: &mut S) -> Result<()> {
        self.begin_chunk(chunk);
        self.run(sink)
    }

    /// Signals end of input: flushes a pending text token and verifies that
    /// no construct was left open. The tokenizer must not be used afterwards.
    pub fn finish<S: TokenSink>(&mut self, sink: &mut S) -> Result<()> {
        if self.pending_cr {
            // a bare CR at the very end of input still normalizes to \n
            self.pending_cr = false;
            self.save_partials();
            self.buf.clear();
            self.buf.push('\n');
            self.cursor = 0;
            self.run(sink)?;
        }
        if self.state != State::Initial {
            return Err(self.eof_error());
        }
        if self.content.is_active() {
            let pos = self.content.pos;
            let text = self.content.finish(&self.buf, self.buf.len(), 0);
            sink.text(&text, pos)?;
        }
        Ok(())
    }

    /// Replaces the working buffer with the normalized chunk, saving the
    /// scanned part of any construct in flight.
    fn begin_chunk(&mut self, chunk: &str) {
        self.save_partials();
        self.buf.clear();
        self.cursor = 0;
        if chunk.is_empty() {
            return;
        }
        let mut rest = chunk;
        if self.pending_cr {
            self.pending_cr = false;
            self.buf.push('\n');
            if let Some(stripped) = rest.strip_prefix('\n') {
                rest = stripped;
            }
        }
        // a trailing CR is withheld so a \r\n pair is never split in two
        let (body, tail_cr) = match rest.as_bytes().last() {
            Some(b'\r') => (&rest[..rest.len() - 1], true),
            _ => (rest, false),
        };
        self.pending_cr = tail_cr;
        normalize_into(&mut self.buf, body);
    }

    fn save_partials(&mut self) {
        self.content.save(&self.buf);
        self.name.save(&self.buf);
    }

    fn run<S: TokenSink>(&mut self, sink: &mut S) -> Result<()> {
        while self.cursor < self.buf.len() {
            self.skim();
            let c = match self.buf[self.cursor..].chars().next() {
                Some(c) => c,
                None => break,
            };
            let at = self.cursor;
            self.step(c, at, sink)?;
            self.cursor = at + c.len_utf8();
            if self.track {
                self.pos.advance(c);
            }
        }
        Ok(())
    }

    /// Batch fast paths: jumps the cursor over runs that cannot change the
    /// state. Observable behavior is identical to stepping char by char.
    fn skim(&mut self) {
        match self.state {
            State::Initial => {
                let start = self.cursor;
                let i = {
                    let hay = &self.buf.as_bytes()[start..];
                    memchr::memchr(b'<', hay).unwrap_or(hay.len())
                };
                if i > 0 {
                    if !self.content.is_active() {
                        self.content.begin(start, self.pos);
                    }
                    self.advance_over(start, start + i);
                    self.cursor = start + i;
                }
            }
            State::Comment => self.skim_until(b"-->"),
            State::Cdata => self.skim_until(b"]]>"),
            State::PiContent if self.content.is_active() => self.skim_until(b"?>"),
            _ => {}
        }
    }

    /// Linear search for a terminator. On a hit the cursor stops right at
    /// the terminator, on a miss it stops `len - 1` characters short of the
    /// buffer end: whatever remains could be the head of a split terminator
    /// and is resumed by the character machine.
    fn skim_until(&mut self, terminator: &[u8]) {
        let start = self.cursor;
        let end = {
            let hay = &self.buf.as_bytes()[start..];
            match memchr::memmem::find(hay, terminator) {
                Some(i) => start + i,
                None => {
                    let mut safe = start + hay.len().saturating_sub(terminator.len() - 1);
                    while !self.buf.is_char_boundary(safe) {
                        safe -= 1;
                    }
                    safe
                }
            }
        };
        if end > start {
            self.advance_over(start, end);
            self.cursor = end;
        }
    }

    /// Position update for a verified region that was skipped in one jump.
    fn advance_over(&mut self, start: usize, end: usize) {
        if !self.track || start == end {
            return;
        }
        let region = &self.buf.as_bytes()[start..end];
        let chars = count_chars(region);
        self.pos.offset += chars;
        match memchr::memrchr(b'\n', region) {
            Some(last) => {
                self.pos.line += memchr::memchr_iter(b'\n', region).count();
                self.pos.column = count_chars(&region[last + 1..]) + 1;
            }
            None => self.pos.column += chars,
        }
    }

    fn error(&self, message: String) -> Error {
        Error::syntax(message, self.pos)
    }

    fn eof_error(&self) -> Error {
        let message = match self.state {
            State::Initial => unreachable!("Initial is the accepting state"),
            State::TagOpen => "Unexpected end of input after '<'",
            State::TagName
            | State::AfterTagName
            | State::ExpectSelfCloseGt
            | State::AttributeName
            | State::AfterAttributeName
            | State::BeforeAttributeValue => "Unexpected end of input in start tag",
            State::AttributeValueSingle | State::AttributeValueDouble => {
                "Unterminated attribute value"
            }
            State::EndTagName | State::AfterEndTagName => "Unexpected end of input in end tag",
            State::MarkupDeclaration => "Unexpected end of input in markup declaration",
            State::CommentStart | State::Comment | State::CommentDash | State::CommentDashDash => {
                "Unterminated comment"
            }
            State::CdataStart
            | State::Cdata
            | State::CdataBracket
            | State::CdataBracketBracket => "Unterminated CDATA section",
            State::PiTarget | State::PiTargetQuestion | State::PiContent | State::PiQuestion => {
                "Unterminated processing instruction"
            }
            State::DoctypeStart
            | State::DoctypeName
            | State::DoctypeAfterName
            | State::DoctypePublic
            | State::DoctypePublicId
            | State::DoctypeAfterPublicId
            | State::DoctypeSystem
            | State::DoctypeSystemId
            | State::DoctypeInternalSubset
            | State::DoctypeInternalSubsetString => "Unterminated DOCTYPE",
        };
        Error::syntax(message, self.pos)
    }

    /// Finishes the name accumulator into `held_name` for constructs whose
    /// name is reported later than it is scanned.
    fn hold_name(&mut self, end: usize) {
        let name = self.name.finish(&self.buf, end, 0);
        self.held_name.clear();
        self.held_name.push_str(&name);
    }

    fn emit_doctype<S: TokenSink>(&mut self, sink: &mut S) -> Result<()> {
        sink.doctype(
            &self.held_name,
            self.held_public.as_deref(),
            self.held_system.as_deref(),
            self.markup_pos,
        )?;
        self.held_public = None;
        self.held_system = None;
        Ok(())
    }

    /// Emits a finished processing instruction, reinterpreting an `xml`
    /// target (ASCII case-insensitive) as the XML declaration.
    fn emit_pi_or_decl<S: TokenSink>(&self, content: &str, sink: &mut S) -> Result<()> {
        if self.held_name.eq_ignore_ascii_case("xml") {
            let version = pseudo_attr(content, "version").unwrap_or("1.0");
            let encoding = pseudo_attr(content, "encoding");
            let standalone = match pseudo_attr(content, "standalone") {
                Some(s) if s.eq_ignore_ascii_case("yes") => Some(true),
                Some(s) if s.eq_ignore_ascii_case("no") => Some(false),
                _ => None,
            };
            sink.declaration(version, encoding, standalone, self.markup_pos)
        } else {
            sink.processing_instruction(&self.held_name, content, self.markup_pos)
        }
    }

    /// One transition of the state machine. `at` is the byte index of `c` in
    /// the working buffer and `self.pos` is its position.
    fn step<S: TokenSink>(&mut self, c: char, at: usize, sink: &mut S) -> Result<()> {
        match self.state {
            State::Initial => {
                if c == '<' {
                    if self.content.is_active() {
                        let pos = self.content.pos;
                        let text = self.content.finish(&self.buf, at, 0);
                        sink.text(&text, pos)?;
                    }
                    self.markup_pos = self.pos;
                    self.state = State::TagOpen;
                } else if !self.content.is_active() {
                    self.content.begin(at, self.pos);
                }
            }

            State::TagOpen => match c {
                '/' => self.state = State::EndTagName,
                '!' => {
                    self.held_public = None;
                    self.held_system = None;
                    self.state = State::MarkupDeclaration;
                }
                '?' => self.state = State::PiTarget,
                _ if is_name_start_char(c) => {
                    self.name.begin(at, self.pos);
                    self.state = State::TagName;
                }
                _ => {
                    return Err(self.error(format!("Unexpected character '{}' after '<'", c)));
                }
            },

            State::TagName => {
                if is_name_char(c) {
                } else if is_whitespace(c) {
                    let name = self.name.finish(&self.buf, at, 0);
                    sink.open_start_tag(&name, self.markup_pos)?;
                    self.state = State::AfterTagName;
                } else if c == '>' {
                    let name = self.name.finish(&self.buf, at, 0);
                    sink.open_start_tag(&name, self.markup_pos)?;
                    sink.close_start_tag(false)?;
                    self.state = State::Initial;
                } else if c == '/' {
                    let name = self.name.finish(&self.buf, at, 0);
                    sink.open_start_tag(&name, self.markup_pos)?;
                    self.state = State::ExpectSelfCloseGt;
                } else {
                    return Err(self.error(format!("Unexpected character '{}' in tag name", c)));
                }
            }

            State::AfterTagName => {
                if is_whitespace(c) {
                } else if c == '>' {
                    sink.close_start_tag(false)?;
                    self.state = State::Initial;
                } else if c == '/' {
                    self.state = State::ExpectSelfCloseGt;
                } else if is_name_start_char(c) {
                    self.name.begin(at, self.pos);
                    self.state = State::AttributeName;
                } else {
                    return Err(self.error(format!("Unexpected character '{}' in tag", c)));
                }
            }

            State::ExpectSelfCloseGt => {
                if c == '>' {
                    sink.close_start_tag(true)?;
                    self.state = State::Initial;
                } else {
                    return Err(self.error(format!(
                        "Expected '>' after '/' in self-closing tag, got '{}'",
                        c
                    )));
                }
            }

            State::AttributeName => {
                if is_name_char(c) {
                } else if c == '=' {
                    self.hold_name(at);
                    self.state = State::BeforeAttributeValue;
                } else if is_whitespace(c) {
                    self.hold_name(at);
                    self.state = State::AfterAttributeName;
                } else {
                    return Err(
                        self.error(format!("Unexpected character '{}' in attribute name", c))
                    );
                }
            }

            State::AfterAttributeName => {
                if is_whitespace(c) {
                } else if c == '=' {
                    self.state = State::BeforeAttributeValue;
                } else {
                    return Err(
                        self.error(format!("Expected '=' after attribute name, got '{}'", c))
                    );
                }
            }

            State::BeforeAttributeValue => {
                if is_whitespace(c) {
                } else if c == '"' {
                    self.content.begin(at + 1, self.pos);
                    self.state = State::AttributeValueDouble;
                } else if c == '\'' {
                    self.content.begin(at + 1, self.pos);
                    self.state = State::AttributeValueSingle;
                } else {
                    return Err(self.error(format!(
                        "Expected quote to start attribute value, got '{}'",
                        c
                    )));
                }
            }

            State::AttributeValueSingle | State::AttributeValueDouble => {
                let quote = if self.state == State::AttributeValueSingle {
                    '\''
                } else {
                    '"'
                };
                if c == quote {
                    let value = self.content.finish(&self.buf, at, 0);
                    sink.attribute(&self.held_name, &value)?;
                    self.state = State::AfterTagName;
                } else if c == '<' {
                    return Err(self.error("'<' not allowed in attribute value".to_string()));
                }
            }

            State::EndTagName => {
                if self.name.is_active() {
                    if is_name_char(c) {
                    } else if c == '>' {
                        let name = self.name.finish(&self.buf, at, 0);
                        sink.end_tag(&name, self.markup_pos)?;
                        self.state = State::Initial;
                    } else if is_whitespace(c) {
                        self.hold_name(at);
                        self.state = State::AfterEndTagName;
                    } else {
                        return Err(
                            self.error(format!("Unexpected character '{}' in end tag", c))
                        );
                    }
                } else if is_name_start_char(c) {
                    self.name.begin(at, self.pos);
                } else {
                    return Err(self.error(format!("Unexpected character '{}' in end tag", c)));
                }
            }

            State::AfterEndTagName => {
                if is_whitespace(c) {
                } else if c == '>' {
                    sink.end_tag(&self.held_name, self.markup_pos)?;
                    self.state = State::Initial;
                } else {
                    return Err(self.error(format!("Unexpected character '{}' in end tag", c)));
                }
            }

            State::MarkupDeclaration => match c {
                '-' => self.state = State::CommentStart,
                '[' => {
                    self.keyword_pos = 0;
                    self.state = State::CdataStart;
                }
                'D' => {
                    self.keyword_pos = 1;
                    self.state = State::DoctypeStart;
                }
                _ => return Err(self.error("Unsupported markup declaration".to_string())),
            },

            State::CommentStart => {
                if c == '-' {
                    self.content.begin(at + 1, self.pos);
                    self.state = State::Comment;
                } else {
                    return Err(self.error(format!("Expected '-' to start comment, got '{}'", c)));
                }
            }

            State::Comment => {
                if c == '-' {
                    self.state = State::CommentDash;
                }
            }

            State::CommentDash => {
                self.state = if c == '-' {
                    State::CommentDashDash
                } else {
                    State::Comment
                };
            }

            State::CommentDashDash => {
                if c == '>' {
                    let content = self.content.finish(&self.buf, at, 2);
                    sink.comment(&content, self.markup_pos)?;
                    self.state = State::Initial;
                } else if c != '-' {
                    // `---x`: the oldest dash is content, the last two are
                    // still a terminator candidate only when c is `-`
                    self.state = State::Comment;
                }
            }

            State::CdataStart => {
                const KEYWORD: &str = "CDATA[";
                if c == KEYWORD.as_bytes()[self.keyword_pos] as char {
                    self.keyword_pos += 1;
                    if self.keyword_pos == KEYWORD.len() {
                        self.content.begin(at + 1, self.pos);
                        self.state = State::Cdata;
                    }
                } else {
                    return Err(self.error(format!("Expected 'CDATA[' after '<![', got '{}'", c)));
                }
            }

            State::Cdata => {
                if c == ']' {
                    self.state = State::CdataBracket;
                }
            }

            State::CdataBracket => {
                self.state = if c == ']' {
                    State::CdataBracketBracket
                } else {
                    State::Cdata
                };
            }

            State::CdataBracketBracket => {
                if c == '>' {
                    let content = self.content.finish(&self.buf, at, 2);
                    sink.cdata(&content, self.markup_pos)?;
                    self.state = State::Initial;
                } else if c != ']' {
                    self.state = State::Cdata;
                }
            }

            State::PiTarget => {
                if self.name.is_active() {
                    if is_name_char(c) {
                    } else if is_whitespace(c) {
                        self.hold_name(at);
                        self.state = State::PiContent;
                    } else if c == '?' {
                        self.hold_name(at);
                        self.state = State::PiTargetQuestion;
                    } else {
                        return Err(self.error(format!(
                            "Unexpected character '{}' in processing instruction target",
                            c
                        )));
                    }
                } else if is_name_start_char(c) {
                    self.name.begin(at, self.pos);
                } else {
                    return Err(self.error(format!(
                        "Unexpected character '{}' in processing instruction target",
                        c
                    )));
                }
            }

            State::PiTargetQuestion => {
                if c == '>' {
                    self.emit_pi_or_decl("", sink)?;
                    self.state = State::Initial;
                } else {
                    return Err(self.error(format!(
                        "Unexpected character '{}' in processing instruction",
                        c
                    )));
                }
            }

            State::PiContent => {
                if !self.content.is_active() {
                    if is_whitespace(c) {
                        // whitespace separating target and body
                        return Ok(());
                    }
                    self.content.begin(at, self.pos);
                }
                if c == '?' {
                    self.state = State::PiQuestion;
                }
            }

            State::PiQuestion => {
                if c == '>' {
                    let content = self.content.finish(&self.buf, at, 1);
                    self.emit_pi_or_decl(&content, sink)?;
                    self.state = State::Initial;
                } else if c != '?' {
                    self.state = State::PiContent;
                }
            }

            State::DoctypeStart => {
                const KEYWORD: &str = "DOCTYPE";
                if self.keyword_pos < KEYWORD.len() {
                    if c == KEYWORD.as_bytes()[self.keyword_pos] as char {
                        self.keyword_pos += 1;
                    } else {
                        return Err(self.error(format!(
                            "Expected DOCTYPE, got <!{}{}",
                            &KEYWORD[..self.keyword_pos],
                            c
                        )));
                    }
                } else if self.keyword_pos == KEYWORD.len() {
                    if is_whitespace(c) {
                        self.keyword_pos += 1;
                    } else {
                        return Err(self.error(format!(
                            "Expected whitespace after DOCTYPE, got '{}'",
                            c
                        )));
                    }
                } else if is_whitespace(c) {
                } else if is_name_start_char(c) {
                    self.name.begin(at, self.pos);
                    self.state = State::DoctypeName;
                } else {
                    return Err(self.error(format!("Unexpected character '{}' in DOCTYPE", c)));
                }
            }

            State::DoctypeName => {
                if is_name_char(c) {
                } else if is_whitespace(c) {
                    self.hold_name(at);
                    self.state = State::DoctypeAfterName;
                } else if c == '>' {
                    self.hold_name(at);
                    self.emit_doctype(sink)?;
                    self.state = State::Initial;
                } else {
                    return Err(
                        self.error(format!("Unexpected character '{}' in DOCTYPE name", c))
                    );
                }
            }

            State::DoctypeAfterName => {
                if is_whitespace(c) {
                } else if c == '>' {
                    self.emit_doctype(sink)?;
                    self.state = State::Initial;
                } else if c == '[' {
                    self.subset_depth = 1;
                    self.state = State::DoctypeInternalSubset;
                } else if c == 'P' {
                    self.keyword_pos = 1;
                    self.state = State::DoctypePublic;
                } else if c == 'S' {
                    self.keyword_pos = 1;
                    self.state = State::DoctypeSystem;
                } else {
                    return Err(self.error(format!("Unexpected character '{}' in DOCTYPE", c)));
                }
            }

            State::DoctypePublic => {
                const KEYWORD: &str = "PUBLIC";
                if self.keyword_pos < KEYWORD.len() {
                    if c == KEYWORD.as_bytes()[self.keyword_pos] as char {
                        self.keyword_pos += 1;
                    } else {
                        return Err(self.error(format!(
                            "Expected PUBLIC, got {}{}",
                            &KEYWORD[..self.keyword_pos],
                            c
                        )));
                    }
                } else if is_whitespace(c) {
                } else if c == '"' || c == '\'' {
                    self.quote = c;
                    self.content.begin(at + 1, self.pos);
                    self.state = State::DoctypePublicId;
                } else {
                    return Err(self.error(format!(
                        "Expected quote to start PUBLIC identifier, got '{}'",
                        c
                    )));
                }
            }

            State::DoctypePublicId => {
                if c == self.quote {
                    let id = self.content.finish(&self.buf, at, 0);
                    self.held_public = Some(id.into_owned());
                    self.state = State::DoctypeAfterPublicId;
                }
            }

            State::DoctypeAfterPublicId => {
                if is_whitespace(c) {
                } else if c == '"' || c == '\'' {
                    self.quote = c;
                    self.content.begin(at + 1, self.pos);
                    self.state = State::DoctypeSystemId;
                } else if c == '>' {
                    self.emit_doctype(sink)?;
                    self.state = State::Initial;
                } else if c == '[' {
                    self.subset_depth = 1;
                    self.state = State::DoctypeInternalSubset;
                } else {
                    return Err(self.error(format!("Unexpected character '{}' in DOCTYPE", c)));
                }
            }

            State::DoctypeSystem => {
                const KEYWORD: &str = "SYSTEM";
                if self.keyword_pos < KEYWORD.len() {
                    if c == KEYWORD.as_bytes()[self.keyword_pos] as char {
                        self.keyword_pos += 1;
                    } else {
                        return Err(self.error(format!(
                            "Expected SYSTEM, got {}{}",
                            &KEYWORD[..self.keyword_pos],
                            c
                        )));
                    }
                } else if is_whitespace(c) {
                } else if c == '"' || c == '\'' {
                    self.quote = c;
                    self.content.begin(at + 1, self.pos);
                    self.state = State::DoctypeSystemId;
                } else {
                    return Err(self.error(format!(
                        "Expected quote to start SYSTEM identifier, got '{}'",
                        c
                    )));
                }
            }

            State::DoctypeSystemId => {
                if c == self.quote {
                    let id = self.content.finish(&self.buf, at, 0);
                    self.held_system = Some(id.into_owned());
                    self.state = State::DoctypeAfterName;
                }
            }

            State::DoctypeInternalSubset => match c {
                '[' => self.subset_depth += 1,
                ']' => {
                    self.subset_depth -= 1;
                    if self.subset_depth == 0 {
                        self.state = State::DoctypeAfterName;
                    }
                }
                '"' | '\'' => {
                    self.quote = c;
                    self.state = State::DoctypeInternalSubsetString;
                }
                _ => {}
            },

            State::DoctypeInternalSubsetString => {
                if c == self.quote {
                    self.state = State::DoctypeInternalSubset;
                }
            }
        }
        Ok(())
    }
}

/// Appends `s` to `out` with `\r\n` and bare `\r` replaced by `\n`.
fn normalize_into(out: &mut String, mut s: &str) {
    loop {
        match memchr::memchr(b'\r', s.as_bytes()) {
            None => {
                out.push_str(s);
                return;
            }
            Some(i) => {
                out.push_str(&s[..i]);
                out.push('\n');
                s = &s[i + 1..];
                if s.as_bytes().first() == Some(&b'\n') {
                    s = &s[1..];
                }
            }
        }
    }
}

/// Counts characters in a region of valid UTF-8 by skipping continuation
/// bytes.
#[inline]
fn count_chars(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| (b & 0xC0) != 0x80).count()
}

/// Looks up one `key="value"` / `key='value'` pseudo-attribute of an XML
/// declaration body.
fn pseudo_attr<'a>(content: &'a str, key: &str) -> Option<&'a str> {
    let mut search = 0;
    while let Some(found) = content[search..].find(key) {
        let start = search + found;
        search = start + key.len();
        if start > 0 && !content[..start].ends_with(is_whitespace) {
            continue;
        }
        let rest = content[search..].trim_start_matches(is_whitespace);
        let rest = match rest.strip_prefix('=') {
            Some(rest) => rest.trim_start_matches(is_whitespace),
            None => continue,
        };
        let mut chars = rest.chars();
        let quote = match chars.next() {
            Some(q @ '"') | Some(q @ '\'') => q,
            _ => continue,
        };
        let value = &rest[1..];
        match value.find(quote) {
            Some(end) => return Some(&value[..end]),
            None => continue,
        }
    }
    None
}
