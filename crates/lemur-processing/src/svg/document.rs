//! In-memory SVG tree: parsing and serialization.
//!
//! Parsing uses `quick-xml`, which never resolves DTDs or external entities
//! and performs no I/O of its own.

use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::dimensions::{dimensions_from_attributes, SvgDimensions};
use super::SvgError;

pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Deepest element nesting accepted, root included. Tree walks recurse per
/// level, so this bounds their stack use.
pub const MAX_ELEMENT_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    ProcessingInstruction(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Name without namespace prefix, lowercased.
    pub fn local_name(&self) -> String {
        local_name(&self.name).to_lowercase()
    }

    /// Attribute value by exact (case-insensitive) qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .map(|attr| attr.value.as_str())
    }

    /// Concatenated text of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                Node::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for attr in &self.attributes {
            out.push(' ');
            out.push_str(&attr.name);
            out.push_str("=\"");
            out.push_str(&escape(attr.value.as_str()));
            out.push('"');
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(element) => element.write_to(out),
                Node::Text(text) => out.push_str(&partial_escape(text.as_str())),
                Node::Comment(comment) => {
                    out.push_str("<!--");
                    out.push_str(comment);
                    out.push_str("-->");
                }
                Node::ProcessingInstruction(pi) => {
                    out.push_str("<?");
                    out.push_str(pi);
                    out.push_str("?>");
                }
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

pub(crate) fn local_name(qualified: &str) -> &str {
    qualified.rsplit(':').next().unwrap_or(qualified)
}

/// A parsed document whose root is an `<svg>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgDocument {
    root: Element,
}

impl SvgDocument {
    /// Parse `content` and check the root element.
    pub fn parse(content: &str) -> Result<Self, SvgError> {
        let root = parse_root(content)?;
        if root.local_name() != "svg" {
            tracing::debug!(root = %root.name, "Rejecting XML document without <svg> root");
            return Err(SvgError::NotSvgRoot);
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Serialized document, XML declaration first.
    pub fn to_xml(&self) -> String {
        let mut out = String::from(XML_DECLARATION);
        self.root.write_to(&mut out);
        out
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.to_xml().into_bytes()
    }

    /// Root dimensions: viewBox, then width/height, then the 100x100 fallback.
    pub fn dimensions(&self) -> SvgDimensions {
        dimensions_from_attributes(
            self.root.attribute("viewBox"),
            self.root.attribute("width"),
            self.root.attribute("height"),
        )
    }
}

fn parse_root(content: &str) -> Result<Element, SvgError> {
    let mut reader = Reader::from_str(content);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                if stack.is_empty() && root.is_some() {
                    return Err(SvgError::NotXml);
                }
                check_depth(stack.len())?;
                stack.push(element_from_start(&start)?);
            }
            Ok(Event::Empty(start)) => {
                check_depth(stack.len())?;
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut root, Node::Element(element))?;
            }
            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or(SvgError::NotXml)?;
                attach(&mut stack, &mut root, Node::Element(element))?;
            }
            Ok(Event::Text(text)) => {
                let text = text.unescape().map_err(|_| SvgError::NotXml)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Text(text.into_owned())),
                    None if text.trim().is_empty() => {}
                    None => return Err(SvgError::NotXml),
                }
            }
            Ok(Event::Comment(comment)) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Comment(
                        String::from_utf8_lossy(&comment).into_owned(),
                    ));
                }
            }
            Ok(Event::PI(pi)) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::ProcessingInstruction(
                        String::from_utf8_lossy(&pi).into_owned(),
                    ));
                }
            }
            // CDATA and DOCTYPE are stripped before parsing; whatever survives is dropped.
            Ok(Event::CData(_)) | Ok(Event::DocType(_)) | Ok(Event::Decl(_)) => {}
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    position = reader.buffer_position(),
                    "SVG is not well-formed XML"
                );
                return Err(SvgError::NotXml);
            }
        }
    }

    if !stack.is_empty() {
        return Err(SvgError::NotXml);
    }
    root.ok_or(SvgError::NotXml)
}

fn check_depth(parents: usize) -> Result<(), SvgError> {
    if parents >= MAX_ELEMENT_DEPTH {
        tracing::debug!(max_depth = MAX_ELEMENT_DEPTH, "SVG nesting too deep");
        return Err(SvgError::NotXml);
    }
    Ok(())
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    node: Node,
) -> Result<(), SvgError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }

    match node {
        Node::Element(element) if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        _ => Err(SvgError::NotXml),
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, SvgError> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|_| SvgError::NotXml)?
        .to_string();

    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|_| SvgError::NotXml)?;
        let name = std::str::from_utf8(attr.key.as_ref())
            .map_err(|_| SvgError::NotXml)?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|_| SvgError::NotXml)?
            .into_owned();
        element.attributes.push(Attribute { name, value });
    }
    Ok(element)
}
