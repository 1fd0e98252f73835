//! NeuroML / LEMS XML documents as introspectable components.
//!
//! Every element becomes a component named after its NeuroML class. Its
//! attributes are scalar fields, its text content is a `value` field, and its
//! child elements are grouped by tag into list fields.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Result, WidgetsError};
use crate::introspect::{FieldDescriptor, FieldValue, ID_FIELD, Introspectable, Scalar};
use crate::units;

const ID_TYPE: &str = "NmlId";
const QUANTITY_TYPE: &str = "Nml2Quantity";
const STRING_TYPE: &str = "xs:string";
const TEXT_FIELD: &str = "value";

/// An element of a parsed XML document
#[derive(Debug, Clone, PartialEq)]
pub struct XmlComponent {
    tag: String,
    class_name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<XmlComponent>,
}

impl XmlComponent {
    /// Parse a document and return its root element
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlComponent> = Vec::new();
        let mut root: Option<XmlComponent> = None;

        loop {
            match reader.read_event().map_err(WidgetsError::xml)? {
                Event::Start(e) => stack.push(Self::from_start(&e)?),
                Event::Empty(e) => {
                    let element = Self::from_start(&e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| WidgetsError::Xml {
                        message: "unbalanced closing tag".into(),
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(t) => {
                    if let Some(top) = stack.last_mut() {
                        let text = t.unescape().map_err(WidgetsError::xml)?;
                        top.push_text(&text);
                    }
                }
                Event::CData(c) => {
                    if let Some(top) = stack.last_mut() {
                        let bytes = c.into_inner();
                        top.push_text(&String::from_utf8_lossy(&bytes));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(WidgetsError::Xml {
                message: format!("unclosed element <{}>", stack[stack.len() - 1].tag),
            });
        }
        root.ok_or_else(|| WidgetsError::Xml {
            message: "document has no root element".into(),
        })
    }

    /// Read and parse a file
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|e| WidgetsError::io(path, e))?;
        tracing::debug!("Parsing {}", path.display());
        Self::parse(&xml)
    }

    fn from_start(e: &BytesStart<'_>) -> Result<Self> {
        let tag = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(WidgetsError::xml)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            // namespace declarations and xsi:* are document plumbing
            if key.starts_with("xmlns") || key.contains(':') {
                continue;
            }
            let value = attr.unescape_value().map_err(WidgetsError::xml)?;
            attributes.push((key, value.into_owned()));
        }
        Ok(Self {
            class_name: class_name(&tag),
            tag,
            attributes,
            text: None,
            children: Vec::new(),
        })
    }

    fn push_text(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        match &mut self.text {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(text);
            }
            None => self.text = Some(text.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[XmlComponent] {
        &self.children
    }

    /// Direct children with the given tag
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlComponent> {
        self.children.iter().filter(move |c| c.tag == tag)
    }
}

fn attach(
    stack: &mut [XmlComponent],
    root: &mut Option<XmlComponent>,
    element: XmlComponent,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    } else {
        return Err(WidgetsError::Xml {
            message: format!("second root element <{}>", element.tag),
        });
    }
    Ok(())
}

/// NeuroML class name for an element tag
pub fn class_name(tag: &str) -> String {
    if tag == "neuroml" {
        return "NeuroMLDocument".to_string();
    }
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn attribute_type(name: &str, value: &str) -> &'static str {
    if name == ID_FIELD {
        ID_TYPE
    } else if units::has_unit(value) {
        QUANTITY_TYPE
    } else {
        STRING_TYPE
    }
}

impl Introspectable for XmlComponent {
    fn type_name(&self) -> &str {
        &self.class_name
    }

    fn describe(&self) -> Vec<(String, FieldDescriptor<'_>)> {
        let mut fields: Vec<(String, FieldDescriptor<'_>)> = self
            .attributes
            .iter()
            .map(|(name, value)| {
                (
                    name.clone(),
                    FieldDescriptor::new(
                        attribute_type(name, value),
                        FieldValue::Scalar(Scalar::Text(value.clone())),
                    ),
                )
            })
            .collect();

        if let Some(text) = &self.text {
            fields.push((
                TEXT_FIELD.to_string(),
                FieldDescriptor::new(STRING_TYPE, FieldValue::Scalar(Scalar::Text(text.clone()))),
            ));
        }

        let mut groups: Vec<(&str, Vec<&dyn Introspectable>)> = Vec::new();
        for child in &self.children {
            match groups.iter().position(|(tag, _)| *tag == child.tag) {
                Some(idx) => groups[idx].1.push(child),
                None => groups.push((child.tag.as_str(), vec![child as &dyn Introspectable])),
            }
        }
        for (tag, members) in groups {
            fields.push((
                tag.to_string(),
                FieldDescriptor::new(class_name(tag), FieldValue::ComponentList(members)),
            ));
        }
        fields
    }
}
