use criterion::{self, criterion_group, criterion_main, Criterion};

use chunked_xml::escape::{decode_entities, escape_text};
use chunked_xml::{
    Attributes, EventSink, Position, Result, StreamOptions, StreamParser, TokenSink, Tokenizer,
};

static SAMPLE: &str = include_str!("../tests/documents/sample_rss.xml");

static LOREM_IPSUM_TEXT: &str =
    "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor incididunt
ut labore et dolore magna aliqua. Hac habitasse platea dictumst vestibulum rhoncus est pellentesque.
Risus ultricies tristique nulla aliquet enim tortor at. Fermentum odio eu feugiat pretium nibh ipsum.
Volutpat sed cras ornare arcu dui. Scelerisque fermentum dui faucibus in ornare quam. Arcu cursus
euismod quis viverra nibh cras pulvinar mattis. Sed viverra tellus in hac habitasse platea. Quis
commodo odio aenean sed. Cursus in hac habitasse platea dictumst quisque sagittis purus.";

#[derive(Default)]
struct CountTokens(usize);

impl TokenSink for CountTokens {
    fn open_start_tag(&mut self, _name: &str, _pos: Position) -> Result<()> {
        self.0 += 1;
        Ok(())
    }
}

#[derive(Default)]
struct CountEvents(usize);

impl EventSink for CountEvents {
    fn start_element(
        &mut self,
        _name: &str,
        _colon_index: Option<usize>,
        _attributes: &Attributes,
        _self_closing: bool,
        _pos: Position,
    ) -> Result<()> {
        self.0 += 1;
        Ok(())
    }
}

/// Benchmarks the raw tokenizer with and without position tracking.
fn tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");
    group.bench_function("track_position = true", |b| {
        b.iter(|| {
            let mut sink = CountTokens(criterion::black_box(0));
            let mut tokenizer = Tokenizer::with_options(
                chunked_xml::TokenizerOptions::new().track_position(true),
            );
            tokenizer.process(SAMPLE, &mut sink).unwrap();
            tokenizer.finish(&mut sink).unwrap();
            assert_eq!(sink.0, 17, "start tags in ./tests/documents/sample_rss.xml");
        })
    });

    group.bench_function("track_position = false", |b| {
        b.iter(|| {
            let mut sink = CountTokens(criterion::black_box(0));
            let mut tokenizer = Tokenizer::with_options(
                chunked_xml::TokenizerOptions::new().track_position(false),
            );
            tokenizer.process(SAMPLE, &mut sink).unwrap();
            tokenizer.finish(&mut sink).unwrap();
            assert_eq!(sink.0, 17, "start tags in ./tests/documents/sample_rss.xml");
        })
    });
    group.finish();
}

/// Benchmarks the full event pipeline, whole-document versus tiny chunks.
fn stream_events(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_events");
    group.bench_function("single chunk", |b| {
        b.iter(|| {
            let mut sink = CountEvents(criterion::black_box(0));
            let mut parser = StreamParser::with_options(StreamOptions::new());
            parser.process(SAMPLE, &mut sink).unwrap();
            parser.finish(&mut sink).unwrap();
            assert_eq!(sink.0, 17);
        })
    });

    group.bench_function("64 byte chunks", |b| {
        let chunks: Vec<&str> = {
            let mut chunks = Vec::new();
            let mut rest = SAMPLE;
            while !rest.is_empty() {
                let mut mid = rest.len().min(64);
                while !rest.is_char_boundary(mid) {
                    mid -= 1;
                }
                let (head, tail) = rest.split_at(mid);
                chunks.push(head);
                rest = tail;
            }
            chunks
        };
        b.iter(|| {
            let mut sink = CountEvents(criterion::black_box(0));
            let mut parser = StreamParser::with_options(StreamOptions::new());
            for chunk in &chunks {
                parser.process(chunk, &mut sink).unwrap();
            }
            parser.finish(&mut sink).unwrap();
            assert_eq!(sink.0, 17);
        })
    });
    group.finish();
}

/// Benchmarks escaping text using XML rules
fn escaping(c: &mut Criterion) {
    let mut group = c.benchmark_group("escape_text");

    group.bench_function("no_chars_to_escape_long", |b| {
        b.iter(|| {
            criterion::black_box(escape_text(LOREM_IPSUM_TEXT));
        })
    });

    group.bench_function("escaped_chars_short", |b| {
        b.iter(|| {
            criterion::black_box(escape_text("age > 72 && age < 21"));
            criterion::black_box(escape_text("\"what's that?\""));
        })
    });
    group.finish();
}

/// Benchmarks unescaping text encoded using XML rules
fn unescaping(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_entities");

    group.bench_function("no_references_long", |b| {
        b.iter(|| {
            criterion::black_box(decode_entities(LOREM_IPSUM_TEXT));
        })
    });

    group.bench_function("char_reference", |b| {
        b.iter(|| {
            criterion::black_box(decode_entities(
                "prefix &#34;some stuff&#34;,&#x22;more stuff&#x22;",
            ));
            criterion::black_box(decode_entities("&#38;&#60;"));
        })
    });

    group.bench_function("entity_reference", |b| {
        b.iter(|| {
            criterion::black_box(decode_entities("age &gt; 72 &amp;&amp; age &lt; 21"));
            criterion::black_box(decode_entities("&quot;what&apos;s that?&quot;"));
        })
    });
    group.finish();
}

criterion_group!(benches, tokenize, stream_events, escaping, unescaping);
criterion_main!(benches);
