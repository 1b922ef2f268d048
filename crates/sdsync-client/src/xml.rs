//! Minimal XML-to-tree conversion for SOAP responses.
//!
//! Elements are keyed by local name (namespace prefixes stripped) and
//! attributes are ignored. A child element that appears more than once under
//! the same parent becomes a [`XmlValue::List`]; a child that appears once is
//! stored directly. Callers must therefore accept both shapes, which is what
//! [`XmlValue::items`] is for.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed XML: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("document has no root element")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlValue {
    /// Leaf element. Empty elements carry an empty string.
    Text(String),
    Element(BTreeMap<String, XmlValue>),
    List(Vec<XmlValue>),
}

impl XmlValue {
    /// Child element by local name. On a list, looks in the first item.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlValue> {
        match self {
            Self::Element(children) => children.get(name),
            Self::List(items) => items.first().and_then(|item| item.child(name)),
            Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn path(&self, names: &[&str]) -> Option<&XmlValue> {
        names
            .iter()
            .try_fold(self, |node, name| node.child(name))
    }

    /// Text content of a leaf. On a list, the first item's text.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::List(items) => items.first().and_then(XmlValue::text),
            Self::Element(_) => None,
        }
    }

    #[must_use]
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(XmlValue::text)
    }

    /// Treats a single value as a one-element sequence.
    #[must_use]
    pub fn items(&self) -> Vec<&XmlValue> {
        match self {
            Self::List(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    /// Direct children of an element; empty for leaves and lists.
    pub fn children(&self) -> impl Iterator<Item = (&str, &XmlValue)> {
        let map = match self {
            Self::Element(children) => Some(children),
            _ => None,
        };
        map.into_iter()
            .flat_map(|children| children.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Copy of this element without the named child. Leaves and lists are
    /// returned unchanged.
    #[must_use]
    pub fn without(&self, name: &str) -> XmlValue {
        match self {
            Self::Element(children) => Self::Element(
                children
                    .iter()
                    .filter(|(k, _)| k.as_str() != name)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

struct Frame {
    name: String,
    children: BTreeMap<String, XmlValue>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: BTreeMap::new(),
            text: String::new(),
        }
    }

    fn finish(self) -> (String, XmlValue) {
        let value = if self.children.is_empty() {
            XmlValue::Text(self.text)
        } else {
            XmlValue::Element(self.children)
        };
        (self.name, value)
    }

    fn insert(&mut self, name: String, value: XmlValue) {
        match self.children.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                XmlValue::List(items) => items.push(value),
                existing => {
                    let first = std::mem::replace(existing, XmlValue::List(Vec::new()));
                    *existing = XmlValue::List(vec![first, value]);
                }
            },
        }
    }
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Parses a document into a tree whose single top-level entry is the root
/// element.
///
/// # Errors
///
/// Returns [`XmlError`] if the document is malformed, has mismatched or
/// unclosed tags, or has no root element.
pub fn parse_document(xml: &str) -> Result<XmlValue, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack = vec![Frame::new(String::new())];

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(Frame::new(local_name(e.local_name().as_ref()))),
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(XmlError::Empty);
                }
                if let Some(frame) = stack.pop() {
                    let (name, value) = frame.finish();
                    if let Some(parent) = stack.last_mut() {
                        parent.insert(name, value);
                    }
                }
            }
            Event::Empty(e) => {
                if let Some(parent) = stack.last_mut() {
                    parent.insert(
                        local_name(e.local_name().as_ref()),
                        XmlValue::Text(String::new()),
                    );
                }
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Event::CData(e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() > 1 {
        let open = stack.pop().map(|frame| frame.name).unwrap_or_default();
        return Err(XmlError::Unclosed(open));
    }

    let root = stack.pop().map(|frame| frame.children).unwrap_or_default();
    if root.is_empty() {
        return Err(XmlError::Empty);
    }
    Ok(XmlValue::Element(root))
}
