//! LEMS simulation descriptors.
//!
//! A [`LemsDocument`] keeps the original file text next to the components it
//! found. Writing streams the original events back out and only rebuilds the
//! start tags of components whose parameters were edited, so comments,
//! includes, and formatting survive a round trip.

use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Result, WidgetsError};

/// Root element of a LEMS file
pub const LEMS_ROOT: &str = "Lems";
/// Component type holding step, length and seed
pub const SIMULATION_TYPE: &str = "Simulation";

const GENERIC_COMPONENT: &str = "Component";
const STRUCTURAL_ELEMENTS: [&str; 7] = [
    "Include",
    "Target",
    "Dimension",
    "Unit",
    "Constant",
    "ComponentType",
    "Assertion",
];

/// A top-level component of a LEMS document
#[derive(Debug, Clone, PartialEq)]
pub struct LemsComponent {
    pub id: Option<String>,
    pub component_type: String,
    parameters: Vec<(String, String)>,
    /// Position among the root's child elements
    ordinal: usize,
    dirty: bool,
}

impl LemsComponent {
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set a parameter, appending it if it did not exist
    pub fn set_parameter(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.parameters.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value,
            None => self.parameters.push((name.to_string(), value)),
        }
        self.dirty = true;
    }

    pub fn is_modified(&self) -> bool {
        self.dirty
    }
}

/// An in-memory LEMS file
#[derive(Debug, Clone)]
pub struct LemsDocument {
    source: String,
    path: Option<PathBuf>,
    components: Vec<LemsComponent>,
}

impl LemsDocument {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut depth = 0usize;
        let mut ordinal = 0usize;
        let mut components = Vec::new();

        loop {
            let event = reader.read_event().map_err(WidgetsError::xml)?;
            let (start, is_empty) = match &event {
                Event::Start(e) => (e, false),
                Event::Empty(e) => (e, true),
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    continue;
                }
                Event::Eof => break,
                _ => continue,
            };

            if depth == 0 {
                let tag = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                if tag != LEMS_ROOT {
                    return Err(WidgetsError::Validation {
                        message: format!("expected <{LEMS_ROOT}> root element, found <{tag}>"),
                    });
                }
            } else if depth == 1 {
                if let Some(component) = component_from_start(start, ordinal)? {
                    components.push(component);
                }
                ordinal += 1;
            }
            if !is_empty {
                depth += 1;
            }
        }

        tracing::debug!("Parsed LEMS document with {} components", components.len());
        Ok(Self {
            source: xml.to_string(),
            path: None,
            components,
        })
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path).map_err(|e| WidgetsError::io(path, e))?;
        let mut doc = Self::parse(&xml)?;
        doc.path = Some(path.to_path_buf());
        Ok(doc)
    }

    /// File the document was read from
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn components(&self) -> &[LemsComponent] {
        &self.components
    }

    /// Last component of the given type; later declarations win
    pub fn component_by_type(&self, component_type: &str) -> Option<&LemsComponent> {
        self.components
            .iter()
            .rev()
            .find(|c| c.component_type == component_type)
    }

    /// Mutable access to the same component [`Self::component_by_type`] returns
    pub fn component_by_type_mut(&mut self, component_type: &str) -> Option<&mut LemsComponent> {
        self.components
            .iter_mut()
            .rev()
            .find(|c| c.component_type == component_type)
    }

    /// The document text with every edited parameter applied
    pub fn to_xml(&self) -> Result<String> {
        let mut reader = Reader::from_str(&self.source);
        let mut writer = Writer::new(Vec::with_capacity(self.source.len()));
        let mut depth = 0usize;
        let mut ordinal = 0usize;

        loop {
            let event = reader.read_event().map_err(WidgetsError::xml)?;
            let event = match event {
                Event::Eof => break,
                Event::End(e) => {
                    depth = depth.saturating_sub(1);
                    Event::End(e)
                }
                Event::Start(e) => {
                    let e = self.patch_child(e, depth, &mut ordinal)?;
                    depth += 1;
                    Event::Start(e)
                }
                Event::Empty(e) => Event::Empty(self.patch_child(e, depth, &mut ordinal)?),
                other => other,
            };
            writer.write_event(event).map_err(WidgetsError::xml)?;
        }

        String::from_utf8(writer.into_inner()).map_err(|e| WidgetsError::Serialization {
            message: e.to_string(),
        })
    }

    /// Serialize the document to `path`
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let xml = self.to_xml()?;
        std::fs::write(path, xml).map_err(|e| WidgetsError::io(path, e))?;
        tracing::info!("Wrote LEMS document to {}", path.display());
        Ok(())
    }

    fn patch_child<'a>(
        &self,
        start: BytesStart<'a>,
        depth: usize,
        ordinal: &mut usize,
    ) -> Result<BytesStart<'a>> {
        if depth != 1 {
            return Ok(start);
        }
        let current = *ordinal;
        *ordinal += 1;

        let Some(component) = self
            .components
            .iter()
            .find(|c| c.ordinal == current && c.dirty)
        else {
            return Ok(start);
        };

        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut patched = BytesStart::new(name);
        let mut written: Vec<String> = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(WidgetsError::xml)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            match component.parameter(&key) {
                Some(value) => {
                    patched.push_attribute((key.as_str(), value));
                    written.push(key);
                }
                None => {
                    let value = attr.unescape_value().map_err(WidgetsError::xml)?;
                    patched.push_attribute((key.as_str(), &*value));
                }
            }
        }
        for (key, value) in &component.parameters {
            if !written.contains(key) {
                patched.push_attribute((key.as_str(), value.as_str()));
            }
        }
        Ok(patched)
    }
}

fn component_from_start(start: &BytesStart<'_>, ordinal: usize) -> Result<Option<LemsComponent>> {
    let tag = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    if STRUCTURAL_ELEMENTS.contains(&tag.as_str()) {
        return Ok(None);
    }

    let mut id = None;
    let mut declared_type = None;
    let mut parameters = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(WidgetsError::xml)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(WidgetsError::xml)?.into_owned();
        match key.as_str() {
            "id" => id = Some(value),
            "type" => declared_type = Some(value),
            _ => parameters.push((key, value)),
        }
    }

    let component_type = if tag == GENERIC_COMPONENT {
        declared_type.ok_or_else(|| WidgetsError::Validation {
            message: format!(
                "<Component> {} has no type attribute",
                id.as_deref().unwrap_or("<anonymous>")
            ),
        })?
    } else {
        tag
    };

    Ok(Some(LemsComponent {
        id,
        component_type,
        parameters,
        ordinal,
        dirty: false,
    }))
}
