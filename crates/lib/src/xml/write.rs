//! Stable, indented XML serialization.
//!
//! Layout rules:
//! - two spaces of indentation per level, one element per line
//! - an element whose children are all text is written inline
//! - an element without children is self-closed
//!
//! Parsing the output and writing it again yields the same bytes.

use quick_xml::escape::{escape, partial_escape};

use super::types::{XmlElement, XmlNode};

/// Declaration line used for standalone addon descriptors.
pub const STANDALONE_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const INDENT: &str = "  ";

/// Serialize an element tree, terminated by a newline.
pub fn to_string_pretty(root: &XmlElement) -> String {
  let mut out = String::new();
  write_element(&mut out, root, 0);
  out
}

/// Serialize an element tree preceded by a declaration line.
pub fn to_document_string(root: &XmlElement, declaration: &str) -> String {
  let mut out = String::with_capacity(declaration.len() + 1);
  out.push_str(declaration);
  out.push('\n');
  write_element(&mut out, root, 0);
  out
}

fn write_element(out: &mut String, element: &XmlElement, depth: usize) {
  let indent = INDENT.repeat(depth);
  out.push_str(&indent);
  out.push('<');
  out.push_str(&element.name);
  for (key, value) in &element.attributes {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    out.push_str(&escape(value.as_str()));
    out.push('"');
  }

  if element.children.is_empty() {
    out.push_str("/>\n");
    return;
  }

  let inline = element.children.iter().all(|node| matches!(node, XmlNode::Text(_)));
  if inline {
    out.push('>');
    out.push_str(&partial_escape(element.text().as_str()));
  } else {
    out.push_str(">\n");
    for child in &element.children {
      match child {
        XmlNode::Element(el) => write_element(out, el, depth + 1),
        XmlNode::Text(text) => {
          out.push_str(&indent);
          out.push_str(INDENT);
          out.push_str(&partial_escape(text.as_str()));
          out.push('\n');
        }
      }
    }
    out.push_str(&indent);
  }

  out.push_str("</");
  out.push_str(&element.name);
  out.push_str(">\n");
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::xml::parse;

  fn sample() -> XmlElement {
    XmlElement::new("addon")
      .with_attr("id", "repo.test")
      .with_attr("name", "Tom \"T\" & Jerry")
      .with_child(XmlElement::new("requires").with_child(
        XmlElement::new("import")
          .with_attr("addon", "xbmc.addon")
          .with_attr("version", "12.0.0"),
      ))
      .with_child(XmlElement::new("summary").with_text("a < b"))
  }

  #[test]
  fn writes_expected_layout() {
    let expected = r#"<addon id="repo.test" name="Tom &quot;T&quot; &amp; Jerry">
  <requires>
    <import addon="xbmc.addon" version="12.0.0"/>
  </requires>
  <summary>a &lt; b</summary>
</addon>
"#;
    assert_eq!(to_string_pretty(&sample()), expected);
  }

  #[test]
  fn document_starts_with_declaration() {
    let out = to_document_string(&XmlElement::new("addon"), STANDALONE_DECLARATION);
    assert_eq!(out, format!("{}\n<addon/>\n", STANDALONE_DECLARATION));
  }

  #[test]
  fn mixed_content_is_indented() {
    let el = XmlElement::new("p")
      .with_text("lead")
      .with_child(XmlElement::new("b").with_text("bold"));
    assert_eq!(to_string_pretty(&el), "<p>\n  lead\n  <b>bold</b>\n</p>\n");
  }

  #[test]
  fn output_is_a_fixed_point() {
    let once = to_string_pretty(&sample());
    let twice = to_string_pretty(&parse(&once).unwrap());
    assert_eq!(once, twice);

    let mixed = to_string_pretty(&XmlElement::new("p").with_text("x & y").with_child(XmlElement::new("br")));
    assert_eq!(to_string_pretty(&parse(&mixed).unwrap()), mixed);
  }
}
