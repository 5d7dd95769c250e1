//! A module to handle chunked XML tokenization.
//!
//! The [`Tokenizer`] scans decoded text chunks and pushes raw lexical tokens
//! into a [`TokenSink`]. It never looks back across a `process` call: every
//! construct that can straddle a chunk boundary (tag names, attribute values,
//! comments, CDATA sections, processing instructions, DOCTYPE declarations
//! and their multi-character terminators) is carried over in internal state.
//!
//! Raw tokens are exactly what was written in the document: text is not
//! entity-decoded, attribute values are not normalized and qualified names
//! are not split. The [`EventParser`](crate::parser::EventParser) layers
//! well-formedness checks and decoding on top of this contract.

mod machine;

pub use self::machine::Tokenizer;

use crate::errors::Result;

/// A position in the logical (line-ending normalized) input stream.
///
/// `line` and `column` are 1-based character counts; `offset` is the 0-based
/// count of characters consumed. When position tracking is disabled all
/// components are zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    /// 1-based line number
    pub line: usize,
    /// 1-based column number
    pub column: usize,
    /// 0-based character offset from the start of the input
    pub offset: usize,
}

impl Position {
    /// The position of the very first character of a document.
    pub fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// Advances this position over one character of normalized input.
    #[inline]
    pub(crate) fn advance(&mut self, c: char) {
        self.offset += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

/// Configuration for a [`Tokenizer`].
#[derive(Clone, Copy, Debug)]
pub struct TokenizerOptions {
    pub(crate) track_position: bool,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenizerOptions {
    /// Creates the default tokenizer configuration.
    pub fn new() -> Self {
        Self {
            track_position: true,
        }
    }

    /// Changes whether line/column/offset positions are maintained.
    ///
    /// When set to `false` the position bookkeeping is skipped in the hot
    /// path and every reported position (including error positions) is zero.
    ///
    /// (`true` by default)
    pub fn track_position(mut self, val: bool) -> Self {
        self.track_position = val;
        self
    }
}

/// Receiver for the raw tokens found by a [`Tokenizer`].
///
/// All callbacks are optional: every method has a default no-op
/// implementation, so a sink only implements the tokens it cares about.
/// Returning an `Err` from a callback aborts the current `process` call; the
/// tokenizer must not be used afterwards.
#[allow(unused_variables)]
pub trait TokenSink {
    /// The opening `<name` of a start tag. Zero or more [`attribute`] calls
    /// and exactly one [`close_start_tag`] call follow before any other
    /// token.
    ///
    /// [`attribute`]: Self::attribute
    /// [`close_start_tag`]: Self::close_start_tag
    fn open_start_tag(&mut self, name: &str, pos: Position) -> Result<()> {
        Ok(())
    }

    /// One attribute of the currently open start tag. The value is raw:
    /// neither whitespace-normalized nor entity-decoded.
    fn attribute(&mut self, name: &str, value: &str) -> Result<()> {
        Ok(())
    }

    /// The `>` or `/>` finishing the currently open start tag.
    fn close_start_tag(&mut self, self_closing: bool) -> Result<()> {
        Ok(())
    }

    /// An end tag `</name>`.
    fn end_tag(&mut self, name: &str, pos: Position) -> Result<()> {
        Ok(())
    }

    /// Character data between markup. Entities are intact; line endings are
    /// already normalized to `\n`.
    fn text(&mut self, content: &str, pos: Position) -> Result<()> {
        Ok(())
    }

    /// The verbatim content of a `<![CDATA[...]]>` section.
    fn cdata(&mut self, content: &str, pos: Position) -> Result<()> {
        Ok(())
    }

    /// The content of a `<!--...-->` comment.
    fn comment(&mut self, content: &str, pos: Position) -> Result<()> {
        Ok(())
    }

    /// A processing instruction `<?target content?>`. `content` is empty
    /// when the instruction has no body.
    fn processing_instruction(&mut self, target: &str, content: &str, pos: Position) -> Result<()> {
        Ok(())
    }

    /// An XML declaration, recognized as a processing instruction whose
    /// target is `xml` (ASCII case-insensitive). A missing version is
    /// reported as `1.0`.
    fn declaration(
        &mut self,
        version: &str,
        encoding: Option<&str>,
        standalone: Option<bool>,
        pos: Position,
    ) -> Result<()> {
        Ok(())
    }

    /// A `<!DOCTYPE ...>` declaration. Declarations inside the internal
    /// subset are skipped, not reported.
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

/// A function to check whether the character is an XML whitespace
/// (blank, new line, carriage return or tab)
#[inline]
pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\r' | '\n' | '\t')
}

/// Checks whether `c` may start a name.
///
/// ASCII-accurate; every character above `0x7F` is accepted. This is more
/// permissive than the XML 1.0 `NameStartChar` production (which excludes,
/// for example, `U+00D7`), a deliberate trade-off of this non-validating
/// tokenizer.
#[inline]
pub(crate) fn is_name_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':' || c as u32 > 0x7F
}

/// Checks whether `c` may appear in a name after the first character.
///
/// Same permissive non-ASCII fallback as [`is_name_start_char`].
#[inline]
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c) || c.is_ascii_digit() || c == '.' || c == '-'
}
