//! Error management module

use std::fmt;
use std::str::Utf8Error;

use crate::tokenizer::Position;

/// A syntax error in the XML input.
///
/// Carries the stable, human-readable message together with the position of
/// the offending character (or of the token the error was detected on). When
/// position tracking is disabled all position components are zero, but the
/// message prefix is unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlSyntaxError {
    message: String,
    position: Position,
}

impl XmlSyntaxError {
    /// Creates a new syntax error from a message and a position.
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }

    /// The error message without the position suffix.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 1-based line of the offending character (0 when tracking is disabled).
    pub fn line(&self) -> usize {
        self.position.line
    }

    /// 1-based column of the offending character (0 when tracking is disabled).
    pub fn column(&self) -> usize {
        self.position.column
    }

    /// 0-based character offset of the offending character.
    pub fn offset(&self) -> usize {
        self.position.offset
    }

    /// The full position of the offending character.
    pub fn position(&self) -> Position {
        self.position
    }
}

impl fmt::Display for XmlSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}",
            self.message, self.position.line, self.position.column
        )
    }
}

impl std::error::Error for XmlSyntaxError {}

/// The error type used by this crate.
#[derive(Debug)]
pub enum Error {
    /// XML is not well formed or otherwise syntactically invalid
    Syntax(XmlSyntaxError),
    /// IO error while reading from a byte stream
    Io(::std::io::Error),
    /// Input from a byte stream is not valid UTF-8
    Utf8(Utf8Error),
    /// A document contains content that cannot be represented in XML text
    Serialize(String),
}

impl Error {
    /// Shorthand used throughout the tokenizer and parser.
    pub(crate) fn syntax(message: impl Into<String>, position: Position) -> Self {
        Error::Syntax(XmlSyntaxError::new(message, position))
    }
}

impl From<::std::io::Error> for Error {
    /// Creates a new `Error::Io` from the given error
    #[inline]
    fn from(error: ::std::io::Error) -> Error {
        Error::Io(error)
    }
}

impl From<Utf8Error> for Error {
    /// Creates a new `Error::Utf8` from the given error
    #[inline]
    fn from(error: Utf8Error) -> Error {
        Error::Utf8(error)
    }
}

impl From<XmlSyntaxError> for Error {
    /// Creates a new `Error::Syntax` from the given error
    #[inline]
    fn from(error: XmlSyntaxError) -> Error {
        Error::Syntax(error)
    }
}

/// A specialized `Result` type where the error is hard-wired to [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Syntax(e) => write!(f, "{}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Utf8(e) => write!(f, "UTF8 error: {}", e),
            Error::Serialize(msg) => write!(f, "Cannot serialize: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Syntax(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::Utf8(e) => Some(e),
            Error::Serialize(_) => None,
        }
    }
}
