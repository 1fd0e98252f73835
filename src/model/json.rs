//! Introspection dumps in JSON.
//!
//! The layout mirrors the introspection contract of the NeuroML object model:
//!
//! ```json
//! {
//!   "class": "Cell",
//!   "members": {
//!     "id":       { "type": "NmlId", "members": "cellA" },
//!     "x":        { "type": "float", "members": 1.5 },
//!     "synapses": { "type": "Synapse", "members": [ { "class": "Synapse", "members": {} } ] }
//!   }
//! }
//! ```
//!
//! Loading is lenient below the root: values that are neither scalars,
//! components, nor lists of components are logged, skipped, and reported
//! back as warnings.

use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{Result, WidgetsError};
use crate::introspect::{FieldDescriptor, FieldValue, Introspectable, Scalar};

const CLASS_KEY: &str = "class";
const MEMBERS_KEY: &str = "members";
const TYPE_KEY: &str = "type";

/// A component read from a JSON introspection dump
#[derive(Debug, Clone, PartialEq)]
pub struct JsonComponent {
    class_name: String,
    fields: Vec<(String, JsonField)>,
}

#[derive(Debug, Clone, PartialEq)]
struct JsonField {
    declared_type: String,
    value: JsonValue,
}

#[derive(Debug, Clone, PartialEq)]
enum JsonValue {
    Empty,
    Scalar(Scalar),
    Component(Box<JsonComponent>),
    List(Vec<JsonComponent>),
}

/// A loaded component with the malformed values that were skipped
#[derive(Debug, Clone)]
pub struct JsonLoad {
    pub component: JsonComponent,
    pub warnings: Vec<String>,
}

impl JsonComponent {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_scalar(
        mut self,
        name: impl Into<String>,
        declared_type: impl Into<String>,
        value: impl Into<Scalar>,
    ) -> Self {
        self.push(name, declared_type, JsonValue::Scalar(value.into()));
        self
    }

    pub fn with_empty(mut self, name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        self.push(name, declared_type, JsonValue::Empty);
        self
    }

    pub fn with_component(
        mut self,
        name: impl Into<String>,
        declared_type: impl Into<String>,
        component: JsonComponent,
    ) -> Self {
        self.push(name, declared_type, JsonValue::Component(Box::new(component)));
        self
    }

    pub fn with_list(
        mut self,
        name: impl Into<String>,
        declared_type: impl Into<String>,
        components: Vec<JsonComponent>,
    ) -> Self {
        self.push(name, declared_type, JsonValue::List(components));
        self
    }

    fn push(
        &mut self,
        name: impl Into<String>,
        declared_type: impl Into<String>,
        value: JsonValue,
    ) {
        self.fields.push((
            name.into(),
            JsonField {
                declared_type: declared_type.into(),
                value,
            },
        ));
    }

    /// Build from an already parsed JSON value
    pub fn from_value(value: &Value) -> Result<JsonLoad> {
        let mut warnings = Vec::new();
        let component = component_from_value(value, "$", &mut warnings)?;
        Ok(JsonLoad {
            component,
            warnings,
        })
    }

    pub fn parse(text: &str) -> Result<JsonLoad> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<JsonLoad> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| WidgetsError::io(path, e))?;
        Self::parse(&text)
    }
}

fn component_from_value(
    value: &Value,
    path: &str,
    warnings: &mut Vec<String>,
) -> Result<JsonComponent> {
    let object = value.as_object().ok_or_else(|| WidgetsError::Validation {
        message: format!("{path}: expected a component object"),
    })?;
    let class_name = object
        .get(CLASS_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| WidgetsError::Validation {
            message: format!("{path}: component has no \"{CLASS_KEY}\""),
        })?;

    let mut component = JsonComponent::new(class_name);
    let members = match object.get(MEMBERS_KEY) {
        None | Some(Value::Null) => return Ok(component),
        Some(Value::Object(members)) => members,
        Some(_) => {
            return Err(WidgetsError::Validation {
                message: format!("{path}: \"{MEMBERS_KEY}\" must be an object"),
            });
        }
    };

    for (name, entry) in members {
        let field_path = format!("{path}.{name}");
        match field_from_entry(entry, &field_path, warnings) {
            Some(field) => component.fields.push((name.clone(), field)),
            None => continue,
        }
    }
    Ok(component)
}

fn field_from_entry(entry: &Value, path: &str, warnings: &mut Vec<String>) -> Option<JsonField> {
    let Some(entry) = entry.as_object() else {
        malformed(warnings, path, "field descriptor is not an object");
        return None;
    };
    let declared_type = entry
        .get(TYPE_KEY)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let value = value_from_members(entry, path, warnings)?;
    Some(JsonField {
        declared_type,
        value,
    })
}

fn value_from_members(
    entry: &Map<String, Value>,
    path: &str,
    warnings: &mut Vec<String>,
) -> Option<JsonValue> {
    let value = match entry.get(MEMBERS_KEY) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => JsonValue::Empty,
        Some(Value::Bool(true)) => JsonValue::Scalar(Scalar::Text("true".to_string())),
        Some(Value::String(s)) => JsonValue::Scalar(Scalar::Text(s.clone())),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => JsonValue::Scalar(Scalar::Integer(i)),
            None => JsonValue::Scalar(Scalar::Float(n.as_f64()?)),
        },
        Some(object @ Value::Object(_)) => match component_from_value(object, path, warnings) {
            Ok(component) => JsonValue::Component(Box::new(component)),
            Err(e) => {
                malformed(warnings, path, &e.to_string());
                return None;
            }
        },
        Some(Value::Array(items)) => {
            let mut components = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                let item_path = format!("{path}[{idx}]");
                match component_from_value(item, &item_path, warnings) {
                    Ok(component) => components.push(component),
                    Err(e) => malformed(warnings, &item_path, &e.to_string()),
                }
            }
            JsonValue::List(components)
        }
    };
    Some(value)
}

fn malformed(warnings: &mut Vec<String>, path: &str, reason: &str) {
    tracing::warn!(field = path, "skipping malformed value: {reason}");
    warnings.push(format!("{path}: {reason}"));
}

impl Introspectable for JsonComponent {
    fn type_name(&self) -> &str {
        &self.class_name
    }

    fn describe(&self) -> Vec<(String, FieldDescriptor<'_>)> {
        self.fields
            .iter()
            .map(|(name, field)| {
                let value = match &field.value {
                    JsonValue::Empty => FieldValue::Empty,
                    JsonValue::Scalar(s) => FieldValue::Scalar(s.clone()),
                    JsonValue::Component(c) => FieldValue::Component(&**c),
                    JsonValue::List(items) => FieldValue::ComponentList(
                        items.iter().map(|c| c as &dyn Introspectable).collect(),
                    ),
                };
                (
                    name.clone(),
                    FieldDescriptor::new(field.declared_type.clone(), value),
                )
            })
            .collect()
    }
}
