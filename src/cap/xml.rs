//! Minimal element tree over `quick-xml` events.
//!
//! Names are kept exactly as written, prefix included, and namespace
//! declarations are not resolved. CAP feeds in the wild mix `cap:` and
//! bare names and do not always declare the prefix they use.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::DocumentError;

/// One element with its text and child elements. Attributes are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified name as written, e.g. `cap:info`
    pub name: String,
    /// Text and CDATA chunks, each trimmed, joined by single spaces
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn named(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Self::default()
        }
    }

    /// This element followed by all descendants, depth-first
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into<'a>(&'a self, out: &mut Vec<&'a XmlElement>) {
        out.push(self);
        for child in &self.children {
            child.collect_into(out);
        }
    }
}

/// Parse `text` into its first top-level element.
///
/// Returns `Ok(None)` for input without any element.
///
/// # Errors
///
/// [`DocumentError::Markup`] for mismatched end tags or bad escapes and
/// [`DocumentError::Unterminated`] when input ends inside an element.
pub fn parse_tree(text: &str) -> Result<Option<XmlElement>, DocumentError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(XmlElement::named(e.name().as_ref())),
            Event::Empty(e) => attach(&mut stack, &mut root, XmlElement::named(e.name().as_ref())),
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    push_chunk(&mut top.text, &t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    push_chunk(&mut top.text, &String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(DocumentError::Unterminated(open.name));
    }
    Ok(root)
}

// A comment or CDATA section splits text; the split must not fuse tokens
fn push_chunk(text: &mut String, chunk: &str) {
    let chunk = chunk.trim();
    if chunk.is_empty() {
        return;
    }
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(chunk);
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}
