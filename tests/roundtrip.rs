//! Parse → stringify → parse must yield a structurally equal tree.

use pretty_assertions::assert_eq;

use chunked_xml::{parse_str, parse_str_with, stringify, ParseOptions, StringifyOptions};

static DOCUMENTS: &[&str] = &[
    "<r/>",
    "<a><b>text</b><c/>tail</a>",
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?><r><i>1</i></r>",
    "<?xml version=\"1.0\" standalone=\"yes\"?><r/>",
    "<!DOCTYPE r SYSTEM \"r.dtd\"><r/>",
    "<!DOCTYPE r PUBLIC \"-//X//Y\" \"http://x/r.dtd\"><r/>",
    "<r a=\"1\" b=\"two &amp; three\"><c d=\"&lt;&gt;\"/></r>",
    "<r>&lt;not a tag&gt; &amp; more</r>",
    "<r><![CDATA[verbatim <stuff> &amp; raw]]></r>",
    "<r><![CDATA[nested terminator a]]&gt;b]]></r>",
    "<!--prolog--><r><!--inner--><i/></r><!--epilog-->",
    "<r><?target some body?></r>",
    "<ns:r ns:a=\"v\"><ns:c/></ns:r>",
    "<r>mixed <b>bold</b> tail</r>",
];

#[test]
fn compact_roundtrip_is_structurally_equal() {
    for document in DOCUMENTS {
        let first = parse_str(document).unwrap();
        let text = stringify(&first, &StringifyOptions::new()).unwrap();
        let second = parse_str(&text).unwrap();
        assert_eq!(first, second, "document {:?} serialized as {:?}", document, text);
    }
}

/// Compact serialization adds no whitespace, so it reproduces documents that
/// had none to begin with.
#[test]
fn compact_roundtrip_is_textually_stable() {
    for document in DOCUMENTS {
        let first = parse_str(document).unwrap();
        let text = stringify(&first, &StringifyOptions::new()).unwrap();
        let again = stringify(&parse_str(&text).unwrap(), &StringifyOptions::new()).unwrap();
        assert_eq!(text, again, "document {:?}", document);
    }
}

/// Indenting puts every child of a container element on its own line; under
/// `ignore_whitespace` the reparsed tree is still structurally equal as long
/// as no element mixes text with element children (indentation would become
/// part of such mixed text).
#[test]
fn indented_roundtrip_under_ignore_whitespace() {
    let documents = [
        "<r/>",
        "<r>\n  <a>\n    <b>deep text</b>\n  </a>\n  <c x=\"1\"/>\n</r>",
        "<?xml version=\"1.0\"?><r><i>1</i><i>2</i><i>3</i></r>",
        "<!DOCTYPE r SYSTEM \"r.dtd\"><r><leaf/></r>",
        "<r><![CDATA[verbatim <stuff> &amp; raw]]></r>",
        "<!--prolog--><r><!--inner--><i/></r><!--epilog-->",
        "<r><?target some body?></r>",
    ];
    let options = ParseOptions::new().ignore_whitespace(true);
    for document in &documents {
        let first = parse_str_with(document, &options).unwrap();
        let text = stringify(&first, &StringifyOptions::new().indent("  ")).unwrap();
        let second = parse_str_with(&text, &options).unwrap();
        assert_eq!(first, second, "document {:?} serialized as {:?}", document, text);
    }
}

/// The serializer splits CDATA around `]]>` and the parser reads the pieces
/// back; the concatenated CDATA text survives even though the node count
/// does not.
#[test]
fn cdata_with_terminator_survives_as_text() {
    let mut root = chunked_xml::Element::new("r");
    root.children
        .push(chunked_xml::Node::Cdata("a]]>b".to_string()));
    let doc = chunked_xml::Document::new(root);
    let text = stringify(&doc, &StringifyOptions::new()).unwrap();
    let reparsed = parse_str(&text).unwrap();
    assert_eq!(reparsed.root.text_content(), "a]]>b");
}

#[test]
fn attribute_whitespace_survives_via_character_references() {
    let mut root = chunked_xml::Element::new("r");
    root.attributes
        .push(chunked_xml::tree::Attribute::new("a", "tab\there\nand newline"));
    let doc = chunked_xml::Document::new(root);
    let text = stringify(&doc, &StringifyOptions::new()).unwrap();
    assert_eq!(text, "<r a=\"tab&#9;here&#10;and newline\"/>");
    let reparsed = parse_str(&text).unwrap();
    assert_eq!(reparsed.root.attribute("a"), Some("tab\there\nand newline"));
}
