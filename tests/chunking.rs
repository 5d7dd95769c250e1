//! The callback sequence must be a deterministic function of the input,
//! no matter how the input is split into chunks.

mod common;

use pretty_assertions::assert_eq;

use chunked_xml::{StreamOptions, StreamParser};
use common::EventLog;

static DOCUMENTS: &[&str] = &[
    "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?><root><item id=\"1\">Hello</item></root>",
    "<!DOCTYPE r PUBLIC \"-//X//DTD Y//EN\" \"http://x/y.dtd\"><r/>",
    "<!DOCTYPE r [ <!ENTITY x \"[\" > ] ><r/>",
    "<r>one &amp; two &#x3C;three&gt;</r>",
    "<r><![CDATA[a]] ]>b]]></r>",
    "<r><!-- c --d- --><?pi one ? two??></r>",
    "<a x='1' y=\"2\"><b/><c  z = 'w' /></a>",
    "<ns:a ns:b=\"v\"><ns:c/></ns:a>",
    "<r>line1\r\nline2\rline3\n</r>",
    "<r>\n  <i>täxt</i>\n  <i>ありがとう</i>\n</r>",
    "<a><a><a>deep</a></a></a>",
    "<r a=\"multi\nline\tvalue\"/>",
];

fn run(parser: &mut StreamParser, chunks: &[&str]) -> Vec<String> {
    let mut log = EventLog::default();
    for chunk in chunks {
        parser.process(chunk, &mut log).unwrap();
    }
    parser.finish(&mut log).unwrap();
    assert_eq!(parser.depth(), 0);
    log.0
}

fn options() -> StreamOptions {
    StreamOptions::new().track_position(true)
}

/// Splits every document at every character boundary into two chunks and
/// compares against the single-chunk run.
#[test]
fn every_two_way_split() {
    for document in DOCUMENTS {
        let whole = run(&mut StreamParser::with_options(options()), &[document]);
        for split in 0..=document.len() {
            if !document.is_char_boundary(split) {
                continue;
            }
            let halves = [&document[..split], &document[split..]];
            assert_eq!(
                run(&mut StreamParser::with_options(options()), &halves),
                whole,
                "document {:?} split at {}",
                document,
                split
            );
        }
    }
}

/// Feeds every document one character at a time.
#[test]
fn char_at_a_time() {
    for document in DOCUMENTS {
        let whole = run(&mut StreamParser::with_options(options()), &[document]);
        let mut parser = StreamParser::with_options(options());
        let mut log = EventLog::default();
        for (i, c) in document.char_indices() {
            parser
                .process(&document[i..i + c.len_utf8()], &mut log)
                .unwrap();
        }
        parser.finish(&mut log).unwrap();
        assert_eq!(log.0, whole, "document {:?}", document);
    }
}

/// Empty chunks anywhere must be a no-op.
#[test]
fn empty_chunks_are_ignored() {
    let document = "<r>a\r<b/>c</r>";
    let whole = run(&mut StreamParser::with_options(options()), &[document]);
    let mut parser = StreamParser::with_options(options());
    let mut log = EventLog::default();
    for (i, c) in document.char_indices() {
        parser.process("", &mut log).unwrap();
        parser
            .process(&document[i..i + c.len_utf8()], &mut log)
            .unwrap();
        parser.process("", &mut log).unwrap();
    }
    parser.finish(&mut log).unwrap();
    assert_eq!(log.0, whole);
}

/// Filters behave identically however the input is chunked.
#[test]
fn filters_are_chunking_independent() {
    let document = "<r>\n  <i>x</i>\n  <!--c-->\n  <?p b?>\n  <![CDATA[d]]>\n</r>";
    let options = StreamOptions::new()
        .ignore_whitespace(true)
        .ignore_comments(true)
        .ignore_processing_instructions(true)
        .coerce_cdata_to_text(true);
    let whole = run(&mut StreamParser::with_options(options), &[document]);
    assert_eq!(
        whole,
        [
            "start(r [] self_closing=false)",
            "start(i [] self_closing=false)",
            "text(\"x\")",
            "end(i)",
            "text(\"d\")",
            "end(r)",
        ]
    );
    for split in 0..=document.len() {
        let halves = [&document[..split], &document[split..]];
        assert_eq!(
            run(&mut StreamParser::with_options(options), &halves),
            whole,
            "split at {}",
            split
        );
    }
}
