//! Minimal XML element tree with element path lookup.
//!
//! Each element keeps its name, attributes, leading text (the text before its
//! first child), children and tail (the text after its end tag). Comments and
//! processing instructions are dropped.

use std::ptr;

use obr_model::{ElementPath, PathStep, Position, Predicate};
use quick_xml::Reader;
use quick_xml::errors::IllFormedError;
use quick_xml::escape::{EscapeError, resolve_predefined_entity};
use quick_xml::events::{BytesStart, Event};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    tail: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tail(&self) -> &str {
        &self.tail
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// This element's text with all descendant text and tails, in document
    /// order.
    pub fn full_text(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.full_text());
            out.push_str(&child.tail);
        }
        out
    }

    /// This element and all of its descendants, in document order.
    pub fn iter(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Elements named `name` in this subtree, in document order.
    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.iter().filter(move |element| element.name == name)
    }

    /// Every element `path` selects from this element, in document order.
    ///
    /// Parent steps and position predicates only see the tree below this
    /// element, so `..` from this element selects nothing.
    pub fn select(&self, path: &ElementPath) -> Vec<&XmlElement> {
        let mut current: Vec<&XmlElement> = vec![self];
        for step in path.steps() {
            let mut next: Vec<&XmlElement> = Vec::new();
            match step {
                PathStep::Child(test) => {
                    for element in current {
                        next.extend(element.children.iter().filter(|c| test.matches(&c.name)));
                    }
                }
                PathStep::Descendant(test) => {
                    for element in current {
                        next.extend(element.iter().skip(1).filter(|e| test.matches(&e.name)));
                    }
                }
                PathStep::SelfNode => next = current,
                PathStep::Parent => {
                    for element in current {
                        if let Some(parent) = self.parent_of(element)
                            && !next.iter().any(|seen| ptr::eq(*seen, parent))
                        {
                            next.push(parent);
                        }
                    }
                }
                PathStep::Filter(predicate) => {
                    next = current
                        .into_iter()
                        .filter(|element| self.satisfies(element, predicate))
                        .collect();
                }
            }
            if next.is_empty() {
                return next;
            }
            current = next;
        }
        current
    }

    /// First element matching `path`, in document order.
    pub fn find(&self, path: &ElementPath) -> Option<&XmlElement> {
        self.select(path).into_iter().next()
    }

    /// Leading text of the first element matching `path`.
    pub fn find_text(&self, path: &ElementPath) -> Option<&str> {
        self.find(path).map(XmlElement::text)
    }

    /// The parent of `child` within this subtree.
    fn parent_of(&self, child: &XmlElement) -> Option<&XmlElement> {
        self.iter()
            .find(|element| element.children.iter().any(|c| ptr::eq(c, child)))
    }

    fn satisfies(&self, element: &XmlElement, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::HasAttribute(name) => element.attribute(name).is_some(),
            Predicate::Attribute {
                name,
                value,
                negated,
            } => match element.attribute(name) {
                Some(actual) => (actual == value.as_str()) != *negated,
                None => false,
            },
            Predicate::HasChild(name) => element.children.iter().any(|c| c.name == *name),
            Predicate::Text {
                child: None,
                value,
                negated,
            } => (element.full_text() == *value) != *negated,
            Predicate::Text {
                child: Some(name),
                value,
                negated,
            } => element
                .children
                .iter()
                .filter(|c| c.name == *name)
                .any(|c| (c.full_text() == *value) != *negated),
            Predicate::Position(position) => self.at_position(element, *position),
        }
    }

    fn at_position(&self, element: &XmlElement, position: Position) -> bool {
        let Some(parent) = self.parent_of(element) else {
            return false;
        };
        let siblings: Vec<&XmlElement> = parent
            .children
            .iter()
            .filter(|c| c.name == element.name)
            .collect();
        let index = match position {
            Position::First(index) => Some(index),
            Position::FromLast(offset) => siblings.len().checked_sub(offset),
        };
        index
            .and_then(|index| siblings.get(index))
            .is_some_and(|sibling| ptr::eq(*sibling, element))
    }
}

/// Depth-first, pre-order walk over an element subtree.
pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        self.stack.extend(element.children.iter().rev());
        Some(element)
    }
}

/// Parses a document into its root element.
///
/// Returns `None` for a document without elements.
pub fn parse_document(xml: &str) -> Result<Option<XmlElement>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(open_element(&start)?),
            Event::Empty(start) => attach(&mut stack, &mut root, open_element(&start)?),
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(text) => append_text(&mut stack, &text.xml_content()?),
            Event::CData(data) => append_text(&mut stack, &data.xml_content()?),
            Event::GeneralRef(reference) => {
                let resolved = match reference.resolve_char_ref()? {
                    Some(ch) => ch.to_string(),
                    None => {
                        let entity = reference.decode()?;
                        resolve_predefined_entity(&entity)
                            .ok_or_else(|| {
                                EscapeError::UnrecognizedEntity(0..entity.len(), entity.to_string())
                            })?
                            .to_string()
                    }
                };
                append_text(&mut stack, &resolved);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(IllFormedError::MissingEndTag(open.name).into());
    }
    Ok(root)
}

fn open_element(start: &BytesStart<'_>) -> Result<XmlElement, quick_xml::Error> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
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

/// Appends to the open element's leading text, or to the tail of its last
/// child once it has one. Text outside the root element is dropped.
fn append_text(stack: &mut [XmlElement], text: &str) {
    let Some(open) = stack.last_mut() else {
        return;
    };
    match open.children.last_mut() {
        Some(child) => child.tail.push_str(text),
        None => open.text.push_str(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<registry>
  <header>
    <name>Acme &amp; Sons</name>
    <contact><phone>555-0100</phone></contact>
    <address>
      <street>12 Main St</street>
      <city><![CDATA[Victoria]]></city>
    </address>
  </header>
  <header>
    <name/>
    <contact><phone>555-0199</phone><phone>555-0200</phone></contact>
  </header>
</registry>"#;

    fn root() -> XmlElement {
        parse_document(REGISTRY).unwrap().unwrap()
    }

    fn path(path: &str) -> ElementPath {
        ElementPath::parse(path).unwrap()
    }

    fn text_at<'a>(element: &'a XmlElement, locator: &str) -> Option<&'a str> {
        element.find_text(&path(locator))
    }

    #[test]
    fn test_records_in_document_order() {
        let root = root();
        let records: Vec<_> = root.elements_named("header").collect();
        assert_eq!(records.len(), 2);
        assert_eq!(text_at(records[0], ".//name"), Some("Acme & Sons"));
    }

    #[test]
    fn test_descendant_search() {
        let root = root();
        let first = root.elements_named("header").next().unwrap();
        assert_eq!(text_at(first, ".//phone"), Some("555-0100"));
        assert_eq!(text_at(first, ".//address/street"), Some("12 Main St"));
        assert_eq!(text_at(first, ".//city"), Some("Victoria"));
        assert_eq!(text_at(first, ".//contact/*"), Some("555-0100"));
        assert_eq!(text_at(first, ".//fax"), None);
    }

    const NAMES: &str = concat!(
        r#"<b><name lang="fr">Acm&#233;</name><name lang="en">Acme</name>"#,
        "<p><q>x</q></p></b>"
    );

    #[test]
    fn test_attribute_predicates() {
        let root = parse_document(NAMES).unwrap().unwrap();
        assert_eq!(text_at(&root, ".//name[@lang='en']"), Some("Acme"));
        assert_eq!(text_at(&root, ".//name[@lang!='en']"), Some("Acmé"));
        assert_eq!(text_at(&root, ".//name[@lang]"), Some("Acmé"));
        assert_eq!(text_at(&root, ".//name[@lang='de']"), None);
        assert_eq!(text_at(&root, ".//q[@lang!='en']"), None);
    }

    #[test]
    fn test_position_predicates() {
        let root = parse_document(NAMES).unwrap().unwrap();
        assert_eq!(text_at(&root, ".//name[2]"), Some("Acme"));
        assert_eq!(text_at(&root, ".//name[1]"), Some("Acmé"));
        assert_eq!(text_at(&root, ".//name[3]"), None);
        assert_eq!(text_at(&root, ".//name[last()]"), Some("Acme"));
        assert_eq!(text_at(&root, ".//name[last()-1]"), Some("Acmé"));
        assert_eq!(text_at(&root, ".//name[last()-2]"), None);
        assert_eq!(text_at(&root, ".//name[@lang='en'][1]"), None);
    }

    #[test]
    fn test_parent_steps() {
        let root = parse_document(NAMES).unwrap().unwrap();
        assert_eq!(text_at(&root, ".//q/../q"), Some("x"));
        assert_eq!(root.find(&path(".//q/..")).map(XmlElement::name), Some("p"));
        assert_eq!(text_at(&root, ".."), None);
    }

    #[test]
    fn test_child_and_text_predicates() {
        let root = root();
        let records: Vec<_> = root.elements_named("header").collect();
        assert_eq!(text_at(&root, ".//header[address]/name"), Some("Acme & Sons"));
        assert_eq!(
            text_at(&root, ".//contact[phone='555-0200']/phone[2]"),
            Some("555-0200")
        );
        assert_eq!(text_at(&root, ".//city[.='Victoria']"), Some("Victoria"));
        assert_eq!(text_at(&root, ".//city[.!='Victoria']"), None);
        assert_eq!(text_at(records[1], ".//contact[fax]/phone"), None);
    }

    #[test]
    fn test_first_match_wins() {
        let root = root();
        let second = root.elements_named("header").nth(1).unwrap();
        assert_eq!(text_at(second, ".//phone"), Some("555-0199"));
        assert_eq!(text_at(second, ".//name"), Some(""));
    }

    #[test]
    fn test_leading_text_and_tails() {
        let root = parse_document("<a>lead<b>inner</b>tail</a>").unwrap().unwrap();
        assert_eq!(root.text(), "lead");
        assert_eq!(root.children()[0].tail(), "tail");
        assert_eq!(root.full_text(), "leadinnertail");
        assert_eq!(text_at(&root, "b"), Some("inner"));
        assert_eq!(text_at(&root, "."), Some("lead"));
    }

    #[test]
    fn test_character_references() {
        let root = parse_document("<a>caf&#233; &#x26; bar</a>").unwrap().unwrap();
        assert_eq!(root.text(), "café & bar");
    }

    #[test]
    fn test_unclosed_element() {
        assert!(parse_document("<a><b>text</b>").is_err());
    }

    #[test]
    fn test_mismatched_end_tag() {
        assert!(parse_document("<a><b>text</c></a>").is_err());
    }

    #[test]
    fn test_no_elements() {
        assert_eq!(parse_document("").unwrap(), None);
    }
}
