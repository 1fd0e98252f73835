//! Bundled introspection sources

pub mod json;
pub mod xml;

pub use json::{JsonComponent, JsonLoad};
pub use xml::XmlComponent;
