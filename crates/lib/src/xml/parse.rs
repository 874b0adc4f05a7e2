//! Reading XML documents into [`XmlElement`] trees.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

use super::types::XmlElement;

/// Errors that can occur while parsing XML.
#[derive(Debug, Error)]
pub enum XmlError {
  /// The underlying reader rejected the input.
  #[error("malformed XML at byte {position}: {source}")]
  Syntax {
    position: u64,
    #[source]
    source: quick_xml::Error,
  },

  /// The input is well-formed token by token but not a single-rooted document.
  #[error("malformed XML: {0}")]
  Structure(String),
}

/// Parse a document and return its root element.
///
/// Whitespace around text is trimmed and whitespace-only text is dropped,
/// CDATA sections become text, and comments, processing instructions, the
/// declaration and any doctype are discarded.
pub fn parse(input: &str) -> Result<XmlElement, XmlError> {
  let mut reader = Reader::from_str(input);
  reader.config_mut().trim_text(true);

  let mut stack: Vec<XmlElement> = Vec::new();
  let mut root: Option<XmlElement> = None;

  loop {
    let position = reader.buffer_position() as u64;
    let syntax = |source| XmlError::Syntax { position, source };

    match reader.read_event().map_err(syntax)? {
      Event::Start(start) => stack.push(element_from(&start).map_err(syntax)?),
      Event::Empty(start) => {
        let element = element_from(&start).map_err(syntax)?;
        attach(&mut stack, &mut root, element)?;
      }
      Event::End(_) => {
        let element = stack
          .pop()
          .ok_or_else(|| XmlError::Structure("unexpected closing tag".to_string()))?;
        attach(&mut stack, &mut root, element)?;
      }
      Event::Text(text) => {
        let text = text.unescape().map_err(syntax)?;
        push_text(&mut stack, &text)?;
      }
      Event::CData(data) => {
        let text = String::from_utf8_lossy(&data).into_owned();
        push_text(&mut stack, text.trim())?;
      }
      Event::Eof => break,
      _ => {}
    }
  }

  if let Some(open) = stack.last() {
    return Err(XmlError::Structure(format!("element <{}> is never closed", open.name)));
  }
  root.ok_or_else(|| XmlError::Structure("document has no root element".to_string()))
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement, quick_xml::Error> {
  let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));
  for attr in start.attributes() {
    let attr = attr.map_err(quick_xml::Error::from)?;
    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
    let value = attr.unescape_value()?.into_owned();
    element.attributes.push((key, value));
  }
  Ok(element)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) -> Result<(), XmlError> {
  if let Some(parent) = stack.last_mut() {
    parent.push(element);
    return Ok(());
  }
  if root.is_some() {
    return Err(XmlError::Structure(format!(
      "second root element <{}>",
      element.name
    )));
  }
  *root = Some(element);
  Ok(())
}

fn push_text(stack: &mut [XmlElement], text: &str) -> Result<(), XmlError> {
  if text.is_empty() {
    return Ok(());
  }
  match stack.last_mut() {
    Some(parent) => {
      parent.push_text(text);
      Ok(())
    }
    None => Err(XmlError::Structure("text outside the root element".to_string())),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::xml::XmlNode;

  const ADDON_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<!-- plugin descriptor -->
<addon id="plugin.video.foo" name="Foo &amp; Bar" version="2.0.0" provider-name="me">
  <requires>
    <import addon="xbmc.python" version="2.25.0"/>
  </requires>
  <extension point="xbmc.python.pluginsource" library="main.py">
    <provides>video</provides>
  </extension>
  <extension point="xbmc.addon.metadata">
    <summary lang="en">Watch &lt;foo&gt;</summary>
    <description><![CDATA[Raw <b>text</b>]]></description>
  </extension>
</addon>
"#;

  #[test]
  fn parses_attributes_in_order() {
    let root = parse(ADDON_XML).unwrap();
    assert_eq!(root.name, "addon");
    assert_eq!(
      root.attributes,
      vec![
        ("id".to_string(), "plugin.video.foo".to_string()),
        ("name".to_string(), "Foo & Bar".to_string()),
        ("version".to_string(), "2.0.0".to_string()),
        ("provider-name".to_string(), "me".to_string()),
      ]
    );
  }

  #[test]
  fn parses_nested_elements_and_text() {
    let root = parse(ADDON_XML).unwrap();
    let names: Vec<_> = root.elements().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["requires", "extension", "extension"]);

    let metadata = root.elements().nth(2).unwrap();
    assert_eq!(metadata.find("summary").unwrap().text(), "Watch <foo>");
    assert_eq!(metadata.find("description").unwrap().text(), "Raw <b>text</b>");
  }

  #[test]
  fn drops_whitespace_only_text() {
    let root = parse("<a>\n  <b/>\n</a>").unwrap();
    assert_eq!(root.children, vec![XmlNode::Element(XmlElement::new("b"))]);
  }

  #[test]
  fn rejects_mismatched_tags() {
    assert!(matches!(parse("<a><b></a>"), Err(XmlError::Syntax { .. })));
  }

  #[test]
  fn rejects_unclosed_root() {
    assert!(parse("<a><b/>").is_err());
  }

  #[test]
  fn rejects_empty_and_multi_rooted_documents() {
    assert!(matches!(parse("<?xml version=\"1.0\"?>"), Err(XmlError::Structure(_))));
    assert!(matches!(parse("<a/><b/>"), Err(XmlError::Structure(_))));
  }
}
