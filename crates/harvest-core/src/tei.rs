//! Minimal namespace-aware element tree for GROBID TEI responses.
//!
//! The tree is built from quick-xml's resolved event stream. Elements live in
//! an arena indexed in start-tag order, which is also document (pre-)order, so
//! "find every `tei:figure` below the root" is a filtered scan of the arena.

use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use thiserror::Error;

/// Namespace URI of every element GROBID emits.
pub const TEI_NS: &str = "http://www.tei-c.org/ns/1.0";

#[derive(Error, Debug)]
pub enum TeiError {
    #[error("XML syntax error at byte {position}: {source}")]
    Syntax {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },
    #[error("no root element found")]
    NoRoot,
    #[error("unclosed element <{0}> at end of input")]
    Unclosed(String),
    #[error("content outside the root element at byte {0}")]
    OutsideRoot(u64),
    #[error("unbound namespace prefix '{0}'")]
    UnboundPrefix(String),
}

#[derive(Debug)]
enum Node {
    Element(usize),
    Text(String),
}

#[derive(Debug)]
struct ElementNode {
    namespace: Option<String>,
    local_name: String,
    children: Vec<Node>,
}

/// A parsed TEI document. The root element is always arena slot 0.
#[derive(Debug)]
pub struct TeiDocument {
    elements: Vec<ElementNode>,
}

impl TeiDocument {
    /// Parse TEI-XML text into a tree.
    ///
    /// Rejects anything that is not a single well-formed element tree.
    pub fn parse(xml: &str) -> Result<Self, TeiError> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().expand_empty_elements = true;

        let mut elements: Vec<ElementNode> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        loop {
            let position = reader.buffer_position() as u64;
            let syntax = |source: quick_xml::Error| TeiError::Syntax { position, source };

            let (namespace, event) = match reader.read_resolved_event() {
                Ok((ResolveResult::Bound(ns), event)) => {
                    (Some(String::from_utf8_lossy(ns.as_ref()).into_owned()), event)
                }
                Ok((ResolveResult::Unbound, event)) => (None, event),
                Ok((ResolveResult::Unknown(prefix), _)) => {
                    return Err(TeiError::UnboundPrefix(
                        String::from_utf8_lossy(&prefix).into_owned(),
                    ));
                }
                Err(e) => return Err(syntax(e)),
            };

            match event {
                Event::Start(ref e) => {
                    if open.is_empty() && !elements.is_empty() {
                        return Err(TeiError::OutsideRoot(position));
                    }
                    let index = elements.len();
                    elements.push(ElementNode {
                        namespace,
                        local_name: String::from_utf8_lossy(e.local_name().as_ref())
                            .into_owned(),
                        children: Vec::new(),
                    });
                    if let Some(&parent) = open.last() {
                        elements[parent].children.push(Node::Element(index));
                    }
                    open.push(index);
                }
                Event::End(_) => {
                    open.pop();
                }
                Event::Text(ref e) => {
                    let text = e.unescape().map_err(syntax)?;
                    push_text(&mut elements, &open, &text, position)?;
                }
                Event::CData(ref e) => {
                    let text = String::from_utf8_lossy(e.as_ref());
                    push_text(&mut elements, &open, &text, position)?;
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions and the
                // doctype carry no element text.
                _ => {}
            }
        }

        if let Some(&index) = open.last() {
            return Err(TeiError::Unclosed(elements[index].local_name.clone()));
        }
        if elements.is_empty() {
            return Err(TeiError::NoRoot);
        }
        Ok(Self { elements })
    }

    pub fn root(&self) -> Element<'_> {
        Element {
            doc: self,
            index: 0,
        }
    }

    /// Every TEI-namespace element named `local_name` strictly below the
    /// root, in document order.
    pub fn find_all<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = Element<'a>> + 'a {
        (1..self.elements.len())
            .map(move |index| Element { doc: self, index })
            .filter(move |el| el.is_tei(local_name))
    }
}

fn push_text(
    elements: &mut [ElementNode],
    open: &[usize],
    text: &str,
    position: u64,
) -> Result<(), TeiError> {
    let Some(&current) = open.last() else {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(TeiError::OutsideRoot(position));
    };
    let children = &mut elements[current].children;
    // Adjacent text and CDATA sections form a single text node.
    if let Some(Node::Text(last)) = children.last_mut() {
        last.push_str(text);
    } else {
        children.push(Node::Text(text.to_string()));
    }
    Ok(())
}

/// Borrowed handle to one element of a [`TeiDocument`].
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    doc: &'a TeiDocument,
    index: usize,
}

impl<'a> Element<'a> {
    fn node(&self) -> &'a ElementNode {
        &self.doc.elements[self.index]
    }

    pub fn local_name(&self) -> &'a str {
        &self.node().local_name
    }

    pub fn namespace(&self) -> Option<&'a str> {
        self.node().namespace.as_deref()
    }

    pub fn is_tei(&self, local_name: &str) -> bool {
        self.namespace() == Some(TEI_NS) && self.local_name() == local_name
    }

    /// All text nodes of this element and its descendants in document order:
    /// an element's leading text, then each child's text followed by the text
    /// that trails that child.
    pub fn itertext(self) -> Vec<&'a str> {
        let mut out = Vec::new();
        let mut stack: Vec<std::slice::Iter<'a, Node>> = vec![self.node().children.iter()];
        while let Some(iter) = stack.last_mut() {
            match iter.next() {
                Some(Node::Text(text)) => out.push(text.as_str()),
                Some(Node::Element(index)) => {
                    stack.push(self.doc.elements[*index].children.iter());
                }
                None => {
                    stack.pop();
                }
            }
        }
        out
    }
}
