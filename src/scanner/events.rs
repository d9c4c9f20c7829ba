//! Markup event stream the scanner folds over.
//!
//! The scanner never touches a DOM: it consumes a flat, document-ordered
//! sequence of start-tag and text events. [`fragment_events`] adapts a
//! parsed fragment into that sequence; tests build events directly.

use scraper::node::Node;
use scraper::Html;

/// One markup event: a start tag with its attribute set, or text data.
#[derive(Debug, Clone)]
pub enum MarkupEvent<'a> {
    StartTag(StartTag<'a>),
    Text(&'a str),
}

/// Attribute view of a start tag.
#[derive(Debug, Clone)]
pub struct StartTag<'a> {
    attributes: Vec<(&'a str, &'a str)>,
}

impl<'a> StartTag<'a> {
    pub fn new(attributes: Vec<(&'a str, &'a str)>) -> Self {
        Self { attributes }
    }

    /// The value of the named attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.attributes
            .iter()
            .find(|(attribute, _)| *attribute == name)
            .map(|(_, value)| *value)
    }

    /// Whether the tag's `class` attribute contains `class` as one of its
    /// whitespace-separated names.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|value| value.split_whitespace().any(|name| name == class))
            .unwrap_or(false)
    }
}

/// Flattens a parsed fragment into document-ordered markup events.
pub fn fragment_events(document: &Html) -> impl Iterator<Item = MarkupEvent<'_>> {
    document
        .root_element()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Element(element) => Some(MarkupEvent::StartTag(StartTag {
                attributes: element.attrs().collect(),
            })),
            Node::Text(text) => Some(MarkupEvent::Text(&**text)),
            _ => None,
        })
}
