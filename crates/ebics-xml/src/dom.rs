use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use ebics_core::EbicsError;

/// One node of the element tree. Whitespace-only text is preserved: received
/// documents must canonicalize to exactly the bytes the bank signed.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its qualified name as written on the wire
/// (e.g. `ds:SignedInfo`), attributes in document order (namespace
/// declarations included) and child nodes.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Leaf element wrapping a single text node.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name).text(text)
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn child(mut self, element: Element) -> Self {
        self.children.push(Node::Element(element));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Direct child elements, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// First direct child with the given local name.
    pub fn first_child(&self, local: &str) -> Option<&Element> {
        self.elements().find(|el| el.local_name() == local)
    }

    /// Depth-first search (self included) for the first element with the
    /// given local name.
    pub fn find(&self, local: &str) -> Option<&Element> {
        if self.local_name() == local {
            return Some(self);
        }
        self.elements().find_map(|el| el.find(local))
    }

    /// All elements with the given local name, in document order.
    pub fn find_all<'a>(&'a self, local: &str) -> Vec<&'a Element> {
        let mut out = Vec::new();
        self.collect_named(local, &mut out);
        out
    }

    fn collect_named<'a>(&'a self, local: &str, out: &mut Vec<&'a Element>) {
        if self.local_name() == local {
            out.push(self);
        }
        for el in self.elements() {
            el.collect_named(local, out);
        }
    }

    /// Concatenated text content of this element's direct text children.
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    // ── Parse / emit ─────────────────────────────────────────────────────────

    /// Parse a complete document, returning its root element.
    pub fn parse(input: &[u8]) -> Result<Element, EbicsError> {
        let mut reader = Reader::from_reader(input);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        let mut buf = Vec::new();

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| EbicsError::MalformedResponse(format!("xml: {e}")))?;
            match event {
                Event::Start(start) => {
                    stack.push(element_from_start(&start)?);
                }
                Event::Empty(start) => {
                    let element = element_from_start(&start)?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| EbicsError::MalformedResponse("unbalanced end tag".into()))?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Event::Text(text) => {
                    let unescaped = text
                        .unescape()
                        .map_err(|e| EbicsError::MalformedResponse(format!("xml text: {e}")))?;
                    if let Some(top) = stack.last_mut() {
                        top.children.push(Node::Text(unescaped.into_owned()));
                    }
                }
                Event::CData(cdata) => {
                    if let Some(top) = stack.last_mut() {
                        let text = String::from_utf8_lossy(cdata.as_ref()).into_owned();
                        top.children.push(Node::Text(text));
                    }
                }
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(EbicsError::MalformedResponse("unclosed element".into()));
        }
        root.ok_or_else(|| EbicsError::MalformedResponse("empty document".into()))
    }

    /// Emit the wire form: XML declaration plus the serialized tree.
    pub fn to_document(&self) -> Result<String, EbicsError> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| EbicsError::CreateRequest(format!("xml decl: {e}")))?;
        write_element(&mut writer, self)?;
        String::from_utf8(writer.into_inner())
            .map_err(|e| EbicsError::CreateRequest(format!("xml encoding: {e}")))
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, EbicsError> {
    let name = String::from_utf8(start.name().as_ref().to_vec())
        .map_err(|e| EbicsError::MalformedResponse(format!("element name: {e}")))?;
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| EbicsError::MalformedResponse(format!("attribute: {e}")))?;
        let key = String::from_utf8(attr.key.as_ref().to_vec())
            .map_err(|e| EbicsError::MalformedResponse(format!("attribute name: {e}")))?;
        let value = attr
            .unescape_value()
            .map_err(|e| EbicsError::MalformedResponse(format!("attribute value: {e}")))?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn close_element(
    element: Element,
    stack: &mut Vec<Element>,
    root: &mut Option<Element>,
) -> Result<(), EbicsError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(EbicsError::MalformedResponse(
                "multiple document elements".into(),
            ))
        }
    }
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), EbicsError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (name, value) in &element.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }
    writer
        .write_event(Event::Start(start))
        .map_err(|e| EbicsError::CreateRequest(format!("xml: {e}")))?;
    for child in &element.children {
        match child {
            Node::Element(el) => write_element(writer, el)?,
            Node::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| EbicsError::CreateRequest(format!("xml: {e}")))?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| EbicsError::CreateRequest(format!("xml: {e}")))
}
