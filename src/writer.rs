//! A module to write documents back to XML text.

use crate::errors::{Error, Result};
use crate::escape::{escape_attribute_value, escape_text};
use crate::tree::{Declaration, Doctype, Document, Element, Node};

/// Configuration for [`stringify`].
#[derive(Clone, Debug)]
pub struct StringifyOptions {
    pub(crate) indent: Option<String>,
    pub(crate) declaration: bool,
}

impl Default for StringifyOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl StringifyOptions {
    /// Creates the default serialization configuration: no indentation, the
    /// declaration is written when the document has one.
    pub fn new() -> Self {
        Self {
            indent: None,
            declaration: true,
        }
    }

    /// Breaks mixed and element content across lines, indenting each level
    /// with the given string.
    ///
    /// (not set by default: output is a single line with no added
    /// whitespace)
    pub fn indent(mut self, val: impl Into<String>) -> Self {
        self.indent = Some(val.into());
        self
    }

    /// Changes whether the XML declaration is written. Even when `true`, a
    /// declaration is only written if the document has one.
    ///
    /// (`true` by default)
    pub fn declaration(mut self, val: bool) -> Self {
        self.declaration = val;
        self
    }
}

/// Serializes a document to XML text.
///
/// Elements with only text/CDATA children are rendered inline; everything
/// else is broken across lines when an indent is configured. CDATA content
/// containing `]]>` is split into multiple sections; comments containing
/// `--` or ending in `-` cannot be represented and fail with
/// [`Error::Serialize`].
///
/// # Examples
///
/// ```
/// use chunked_xml::writer::{stringify, StringifyOptions};
///
/// let doc = chunked_xml::parse_str("<a><b>text</b><c/></a>")?;
/// assert_eq!(
///     stringify(&doc, &StringifyOptions::new().indent("  "))?,
///     "<a>\n  <b>text</b>\n  <c/>\n</a>"
/// );
/// # chunked_xml::Result::Ok(())
/// ```
pub fn stringify(document: &Document, options: &StringifyOptions) -> Result<String> {
    let mut writer = XmlWriter {
        out: String::new(),
        indent: options.indent.as_deref(),
    };
    if options.declaration {
        if let Some(declaration) = &document.declaration {
            writer.write_declaration(declaration);
            writer.break_line(0);
        }
    }
    if let Some(doctype) = &document.doctype {
        writer.write_doctype(doctype);
        writer.break_line(0);
    }
    for node in &document.prolog {
        writer.write_node(node, 0)?;
        writer.break_line(0);
    }
    writer.write_element(&document.root, 0)?;
    for node in &document.epilog {
        writer.break_line(0);
        writer.write_node(node, 0)?;
    }
    Ok(writer.out)
}

impl Document {
    /// Serializes this document, see [`stringify`].
    pub fn to_xml(&self, options: &StringifyOptions) -> Result<String> {
        stringify(self, options)
    }
}

struct XmlWriter<'o> {
    out: String,
    indent: Option<&'o str>,
}

impl XmlWriter<'_> {
    fn break_line(&mut self, depth: usize) {
        if let Some(indent) = self.indent {
            self.out.push('\n');
            for _ in 0..depth {
                self.out.push_str(indent);
            }
        }
    }

    fn write_declaration(&mut self, declaration: &Declaration) {
        self.out.push_str("<?xml version=\"");
        self.out.push_str(&declaration.version);
        self.out.push('"');
        if let Some(encoding) = &declaration.encoding {
            self.out.push_str(" encoding=\"");
            self.out.push_str(encoding);
            self.out.push('"');
        }
        if let Some(standalone) = declaration.standalone {
            self.out.push_str(" standalone=\"");
            self.out.push_str(if standalone { "yes" } else { "no" });
            self.out.push('"');
        }
        self.out.push_str("?>");
    }

    fn write_doctype(&mut self, doctype: &Doctype) {
        self.out.push_str("<!DOCTYPE ");
        self.out.push_str(&doctype.name);
        if let Some(public_id) = &doctype.public_id {
            self.out.push_str(" PUBLIC \"");
            self.out.push_str(public_id);
            self.out.push('"');
        }
        if let Some(system_id) = &doctype.system_id {
            if doctype.public_id.is_none() {
                self.out.push_str(" SYSTEM");
            }
            self.out.push_str(" \"");
            self.out.push_str(system_id);
            self.out.push('"');
        }
        self.out.push('>');
    }

    fn write_node(&mut self, node: &Node, depth: usize) -> Result<()> {
        match node {
            Node::Element(element) => self.write_element(element, depth),
            Node::Text(text) => {
                self.out.push_str(&escape_text(text));
                Ok(())
            }
            Node::Cdata(content) => {
                self.write_cdata(content);
                Ok(())
            }
            Node::Comment(content) => self.write_comment(content),
            Node::ProcessingInstruction { target, content } => {
                self.out.push_str("<?");
                self.out.push_str(target);
                if !content.is_empty() {
                    self.out.push(' ');
                    self.out.push_str(content);
                }
                self.out.push_str("?>");
                Ok(())
            }
        }
    }

    fn write_element(&mut self, element: &Element, depth: usize) -> Result<()> {
        self.out.push('<');
        self.out.push_str(element.name.as_str());
        for attribute in &element.attributes {
            self.out.push(' ');
            self.out.push_str(attribute.name.as_str());
            self.out.push_str("=\"");
            self.out.push_str(&escape_attribute_value(&attribute.value));
            self.out.push('"');
        }
        if element.children.is_empty() {
            self.out.push_str("/>");
            return Ok(());
        }
        self.out.push('>');

        let textual_only = element
            .children
            .iter()
            .all(|child| matches!(child, Node::Text(_) | Node::Cdata(_)));
        if textual_only || self.indent.is_none() {
            for child in &element.children {
                self.write_node(child, depth + 1)?;
            }
        } else {
            for child in &element.children {
                self.break_line(depth + 1);
                self.write_node(child, depth + 1)?;
            }
            self.break_line(depth);
        }

        self.out.push_str("</");
        self.out.push_str(element.name.as_str());
        self.out.push('>');
        Ok(())
    }

    /// CDATA cannot contain its own terminator; `a]]>b` becomes two
    /// adjacent sections `<![CDATA[a]]]]><![CDATA[>b]]>`.
    fn write_cdata(&mut self, content: &str) {
        let mut rest = content;
        while let Some(i) = rest.find("]]>") {
            self.out.push_str("<![CDATA[");
            self.out.push_str(&rest[..i + 2]);
            self.out.push_str("]]>");
            rest = &rest[i + 2..];
        }
        self.out.push_str("<![CDATA[");
        self.out.push_str(rest);
        self.out.push_str("]]>");
    }

    fn write_comment(&mut self, content: &str) -> Result<()> {
        if content.contains("--") {
            return Err(Error::Serialize(
                "comment must not contain '--'".to_string(),
            ));
        }
        if content.ends_with('-') {
            return Err(Error::Serialize(
                "comment must not end with '-'".to_string(),
            ));
        }
        self.out.push_str("<!--");
        self.out.push_str(content);
        self.out.push_str("-->");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{stringify, StringifyOptions};
    use crate::errors::Error;
    use crate::parse_str;
    use crate::tree::{Document, Element, Node};

    fn roundtrip(xml: &str) -> String {
        stringify(&parse_str(xml).unwrap(), &StringifyOptions::new()).unwrap()
    }

    #[test]
    fn compact_output_preserves_structure() {
        let xml = r#"<a on="1"><b>text</b><c/>tail</a>"#;
        assert_eq!(roundtrip(xml), xml);
    }

    #[test]
    fn declaration_and_doctype_are_reemitted() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><!DOCTYPE a SYSTEM "a.dtd"><a/>"#;
        assert_eq!(roundtrip(xml), xml);
    }

    #[test]
    fn declaration_can_be_suppressed() {
        let doc = parse_str("<?xml version=\"1.0\"?><a/>").unwrap();
        let options = StringifyOptions::new().declaration(false);
        assert_eq!(stringify(&doc, &options).unwrap(), "<a/>");
    }

    #[test]
    fn indented_output() {
        let doc = parse_str("<a><b><c>x</c></b><d/></a>").unwrap();
        assert_eq!(
            stringify(&doc, &StringifyOptions::new().indent("  ")).unwrap(),
            "<a>\n  <b>\n    <c>x</c>\n  </b>\n  <d/>\n</a>"
        );
    }

    #[test]
    fn text_and_attribute_escaping() {
        let mut element = Element::new("a");
        element.attributes.push(crate::tree::Attribute::new(
            "v",
            "a<b>&\"c\"'d'\te\nf\rg",
        ));
        element.children.push(Node::Text("1 < 2 & 3 > 2".to_string()));
        let doc = Document::new(element);
        assert_eq!(
            stringify(&doc, &StringifyOptions::new()).unwrap(),
            "<a v=\"a&lt;b&gt;&amp;&quot;c&quot;&apos;d&apos;&#9;e&#10;f&#13;g\">1 &lt; 2 &amp; 3 &gt; 2</a>"
        );
    }

    #[test]
    fn cdata_terminator_is_split() {
        let mut element = Element::new("r");
        element.children.push(Node::Cdata("a]]>b".to_string()));
        let doc = Document::new(element);
        assert_eq!(
            stringify(&doc, &StringifyOptions::new()).unwrap(),
            "<r><![CDATA[a]]]]><![CDATA[>b]]></r>"
        );
    }

    #[test]
    fn unserializable_comments() {
        for content in ["a--b", "ends-with-"] {
            let mut element = Element::new("r");
            element.children.push(Node::Comment(content.to_string()));
            let doc = Document::new(element);
            match stringify(&doc, &StringifyOptions::new()) {
                Err(Error::Serialize(_)) => {}
                other => panic!("expected serialize error, got {:?}", other),
            }
        }
    }

    #[test]
    fn pi_with_and_without_content() {
        let mut element = Element::new("r");
        element.children.push(Node::ProcessingInstruction {
            target: "pi".to_string(),
            content: "body".to_string(),
        });
        element.children.push(Node::ProcessingInstruction {
            target: "empty".to_string(),
            content: String::new(),
        });
        let doc = Document::new(element);
        assert_eq!(
            stringify(&doc, &StringifyOptions::new()).unwrap(),
            "<r><?pi body?><?empty?></r>"
        );
    }
}
