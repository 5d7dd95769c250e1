//! Byte-stream adapters that drive the streaming parser.
//!
//! The parser core consumes decoded text. These adapters read UTF-8 bytes
//! from any [`BufRead`] (or, with the `async` feature, any
//! [`AsyncBufRead`](tokio::io::AsyncBufRead)), decode them chunk by chunk and
//! push each chunk synchronously. A multi-byte sequence split across two read
//! buffers is carried over and completed before the next chunk is fed.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::str::from_utf8;

use crate::errors::{Error, Result};
use crate::parser::{EventSink, StreamOptions, StreamParser};
use crate::tree::{Document, ParseOptions, TreeBuilder};

/// Reads the whole input, pushing events into `sink`.
///
/// # Examples
///
/// ```
/// use chunked_xml::parser::{Attributes, EventSink, StreamOptions};
/// use chunked_xml::tokenizer::Position;
/// use chunked_xml::Result;
///
/// #[derive(Default)]
/// struct Counter(usize);
/// impl EventSink for Counter {
///     fn start_element(
///         &mut self,
///         _name: &str,
///         _colon_index: Option<usize>,
///         _attributes: &Attributes,
///         _self_closing: bool,
///         _pos: Position,
///     ) -> Result<()> {
///         self.0 += 1;
///         Ok(())
///     }
/// }
///
/// let mut counter = Counter::default();
/// let input: &[u8] = b"<a><b/><b/></a>";
/// chunked_xml::reader::read_from(input, StreamOptions::new(), &mut counter)?;
/// assert_eq!(counter.0, 3);
/// # chunked_xml::Result::Ok(())
/// ```
pub fn read_from<R: BufRead, S: EventSink>(
    mut reader: R,
    options: StreamOptions,
    sink: &mut S,
) -> Result<()> {
    let mut parser = StreamParser::with_options(options);
    let mut seam = Utf8Seam::default();
    loop {
        let consumed = {
            let available = match reader.fill_buf() {
                Ok(n) if n.is_empty() => break,
                Ok(n) => n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            };
            seam.feed(available, &mut parser, sink)?;
            available.len()
        };
        reader.consume(consumed);
    }
    seam.finish()?;
    parser.finish(sink)
}

/// Asynchronously reads the whole input, pushing events into `sink`.
///
/// The parsing itself stays synchronous; only the reads await.
#[cfg(feature = "async")]
pub async fn read_from_async<R, S>(mut reader: R, options: StreamOptions, sink: &mut S) -> Result<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
    S: EventSink,
{
    use tokio::io::AsyncBufReadExt;

    let mut parser = StreamParser::with_options(options);
    let mut seam = Utf8Seam::default();
    loop {
        let consumed = {
            let available = match reader.fill_buf().await {
                Ok(n) if n.is_empty() => break,
                Ok(n) => n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            };
            seam.feed(available, &mut parser, sink)?;
            available.len()
        };
        reader.consume(consumed);
    }
    seam.finish()?;
    parser.finish(sink)
}

/// Parses a document tree from a reader.
pub fn parse_reader<R: BufRead>(reader: R, options: &ParseOptions) -> Result<Document> {
    let mut builder = TreeBuilder::new();
    read_from(
        reader,
        StreamOptions::new()
            .ignore_whitespace(options.ignore_whitespace)
            .ignore_comments(options.ignore_comments)
            .track_position(options.track_position),
        &mut builder,
    )?;
    builder.into_document()
}

/// Parses a document tree from a file path.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    let file = File::open(path).map_err(Error::Io)?;
    parse_reader(BufReader::new(file), &ParseOptions::new())
}

/// Carries a UTF-8 sequence that a read buffer boundary cut in half.
#[derive(Debug, Default)]
struct Utf8Seam {
    pending: [u8; 4],
    pending_len: usize,
}

impl Utf8Seam {
    fn feed<S: EventSink>(
        &mut self,
        mut bytes: &[u8],
        parser: &mut StreamParser,
        sink: &mut S,
    ) -> Result<()> {
        if self.pending_len > 0 {
            let want = utf8_len(self.pending[0]);
            let take = (want - self.pending_len).min(bytes.len());
            self.pending[self.pending_len..self.pending_len + take]
                .copy_from_slice(&bytes[..take]);
            self.pending_len += take;
            bytes = &bytes[take..];
            if self.pending_len < want {
                return Ok(());
            }
            let completed = from_utf8(&self.pending[..self.pending_len])?;
            parser.process(completed, sink)?;
            self.pending_len = 0;
        }
        match from_utf8(bytes) {
            Ok(chunk) => parser.process(chunk, sink),
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                parser.process(from_utf8(&bytes[..valid]).unwrap_or(""), sink)?;
                let tail = &bytes[valid..];
                self.pending[..tail.len()].copy_from_slice(tail);
                self.pending_len = tail.len();
                Ok(())
            }
            Err(e) => Err(Error::Utf8(e)),
        }
    }

    /// Fails if the input ended in the middle of a sequence.
    fn finish(&self) -> Result<()> {
        if self.pending_len > 0 {
            from_utf8(&self.pending[..self.pending_len])?;
        }
        Ok(())
    }
}

/// Expected length of the UTF-8 sequence introduced by `first`.
fn utf8_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}
