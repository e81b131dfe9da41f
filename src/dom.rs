//! Owned XML tree used by every tool.
//!
//! Documents are parsed with `roxmltree` and copied into a small typed tree:
//! an element has a name, its attributes in document order and its child
//! nodes (elements and text). Lookups by name are explicit query methods
//! returning `Option` or an iterator, so callers decide whether an absent
//! node means "use a default" or "fail the document".
//!
//! Files are decoded according to their byte order mark or XML declaration
//! before parsing, and nesting is capped at [`MAX_DEPTH`] levels.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use quick_xml::Reader;
use quick_xml::encoding::{decode, detect_encoding};
use quick_xml::events::Event;
use roxmltree::{NodeType, ParsingOptions};

use crate::error::{Result, TreeError, ZddxError};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Deepest element nesting accepted, libxml2's default limit
pub const MAX_DEPTH: usize = 256;

/// A parsed document, reduced to its root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified name (`prefix:local` when the element is namespaced)
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// Direct child elements called `name`, in document order.
    pub fn children_named<'a, 'n: 'a>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |element| element.name == name)
    }

    /// First direct child element called `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|element| element.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Text of the first child node, if that node is text.
    pub fn first_text(&self) -> Option<&str> {
        match self.children.first() {
            Some(XmlNode::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Parse a document held in memory.
pub fn parse_document(text: &str) -> std::result::Result<XmlDocument, TreeError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    check_depth(text)?;
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = roxmltree::Document::parse_with_options(text, options)?;

    Ok(XmlDocument {
        root: convert_element(document.root_element()),
    })
}

/// Read and parse a document from disk.
pub fn load_document(path: &Path) -> Result<XmlDocument> {
    let bytes = fs::read(path).map_err(|source| ZddxError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    decode_document(&bytes)
        .and_then(|text| parse_document(&text))
        .map_err(|e| ZddxError::XmlParse {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
}

/// Decode raw file contents.
///
/// A byte order mark (or the UTF-16 form of `<?`) decides first, then the
/// `encoding` of the XML declaration. Without either the content must be
/// UTF-8.
pub fn decode_document(bytes: &[u8]) -> std::result::Result<Cow<'_, str>, TreeError> {
    let (encoding, bom) = match detect_encoding(bytes) {
        Some((encoding, bom)) if bom > 0 || encoding != UTF_8 => (encoding, bom),
        _ => (declared_encoding(bytes).unwrap_or(UTF_8), 0),
    };

    decode(&bytes[bom..], encoding).map_err(|_| TreeError::Undecodable {
        encoding: encoding.name(),
    })
}

fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let mut reader = Reader::from_reader(bytes);
    match reader.read_event() {
        // A UTF-16 label on single-byte content cannot be right
        Ok(Event::Decl(decl)) => decl
            .encoder()
            .filter(|encoding| *encoding != UTF_16LE && *encoding != UTF_16BE),
        _ => None,
    }
}

/// Reject documents nested deeper than [`MAX_DEPTH`] before building a tree.
///
/// The scan is iterative, so any depth is safe to look at. Syntax errors are
/// left for roxmltree to report.
fn check_depth(text: &str) -> std::result::Result<(), TreeError> {
    let mut reader = Reader::from_str(text);
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(TreeError::TooDeep { limit: MAX_DEPTH });
                }
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) | Err(_) => return Ok(()),
            Ok(_) => {}
        }
    }
}

fn convert_element(node: roxmltree::Node<'_, '_>) -> XmlElement {
    let tag = node.tag_name();
    let name = qualified_name(node, tag.namespace(), tag.name());

    let attributes = node
        .attributes()
        .map(|attr| {
            (
                qualified_name(node, attr.namespace(), attr.name()),
                attr.value().to_string(),
            )
        })
        .collect();

    let children = node
        .children()
        .filter_map(|child| match child.node_type() {
            NodeType::Element => Some(XmlNode::Element(convert_element(child))),
            NodeType::Text => child.text().map(|text| XmlNode::Text(text.to_string())),
            _ => None,
        })
        .collect();

    XmlElement {
        name,
        attributes,
        children,
    }
}

fn qualified_name(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    let prefix = match namespace {
        Some(XML_NAMESPACE) => Some("xml"),
        Some(uri) => node.lookup_prefix(uri),
        None => None,
    };

    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
        _ => local.to_string(),
    }
}
