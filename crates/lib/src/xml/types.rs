/// A node in an element's child list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
  Element(XmlElement),
  Text(String),
}

/// An XML element with ordered attributes and ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
  pub name: String,
  pub attributes: Vec<(String, String)>,
  pub children: Vec<XmlNode>,
}

impl XmlElement {
  /// Create an element with no attributes or children.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      attributes: Vec::new(),
      children: Vec::new(),
    }
  }

  /// Builder form of [`set_attr`](Self::set_attr).
  pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.set_attr(key, value);
    self
  }

  /// Builder form of [`push_text`](Self::push_text).
  pub fn with_text(mut self, text: impl Into<String>) -> Self {
    self.push_text(text);
    self
  }

  /// Builder form of [`push`](Self::push).
  pub fn with_child(mut self, child: XmlElement) -> Self {
    self.push(child);
    self
  }

  /// Get an attribute value by name.
  pub fn attr(&self, key: &str) -> Option<&str> {
    self
      .attributes
      .iter()
      .find(|(k, _)| k == key)
      .map(|(_, v)| v.as_str())
  }

  /// Set an attribute. An existing attribute keeps its position; a new one is
  /// appended.
  pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
    let key = key.into();
    let value = value.into();
    match self.attributes.iter_mut().find(|(k, _)| *k == key) {
      Some(slot) => slot.1 = value,
      None => self.attributes.push((key, value)),
    }
  }

  /// Append a child element.
  pub fn push(&mut self, child: XmlElement) {
    self.children.push(XmlNode::Element(child));
  }

  /// Append text, merging with a trailing text node if there is one.
  pub fn push_text(&mut self, text: impl Into<String>) {
    let text = text.into();
    if let Some(XmlNode::Text(last)) = self.children.last_mut() {
      last.push_str(&text);
    } else {
      self.children.push(XmlNode::Text(text));
    }
  }

  /// Iterate over child elements, skipping text.
  pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
    self.children.iter().filter_map(|node| match node {
      XmlNode::Element(el) => Some(el),
      XmlNode::Text(_) => None,
    })
  }

  /// First child element with the given name.
  pub fn find(&self, name: &str) -> Option<&XmlElement> {
    self.elements().find(|el| el.name == name)
  }

  /// Concatenated direct text content.
  pub fn text(&self) -> String {
    self
      .children
      .iter()
      .filter_map(|node| match node {
        XmlNode::Text(t) => Some(t.as_str()),
        XmlNode::Element(_) => None,
      })
      .collect()
  }

  /// Remove and return the child element at `index` among child elements.
  pub fn remove_element_at(&mut self, index: usize) -> Option<XmlElement> {
    let position = self
      .children
      .iter()
      .enumerate()
      .filter(|(_, node)| matches!(node, XmlNode::Element(_)))
      .nth(index)
      .map(|(pos, _)| pos)?;

    match self.children.remove(position) {
      XmlNode::Element(el) => Some(el),
      XmlNode::Text(_) => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn set_attr_keeps_position() {
    let mut el = XmlElement::new("addon")
      .with_attr("id", "foo")
      .with_attr("version", "1.0.0")
      .with_attr("name", "Foo");

    el.set_attr("version", "2.0.0");

    let keys: Vec<_> = el.attributes.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["id", "version", "name"]);
    assert_eq!(el.attr("version"), Some("2.0.0"));
  }

  #[test]
  fn push_text_merges_adjacent_text() {
    let el = XmlElement::new("p").with_text("a").with_text("b");
    assert_eq!(el.children, vec![XmlNode::Text("ab".to_string())]);
  }

  #[test]
  fn remove_element_at_skips_text_nodes() {
    let mut root = XmlElement::new("addons")
      .with_text("noise")
      .with_child(XmlElement::new("addon").with_attr("id", "a"))
      .with_child(XmlElement::new("addon").with_attr("id", "b"));

    let removed = root.remove_element_at(1).unwrap();
    assert_eq!(removed.attr("id"), Some("b"));
    assert_eq!(root.elements().count(), 1);
    assert_eq!(root.text(), "noise");
  }
}
