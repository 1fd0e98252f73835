//! Explorable views of NeuroML components and LEMS simulations.
//!
//! The centre of the crate is [`projector`], which turns any
//! [`Introspectable`] component into a [`VisualNode`] tree of collapsible
//! sections, tabs, and field lists. [`simulation`] provides the parameter
//! form used to tweak and re-run a LEMS simulation.

pub mod chooser;
pub mod config;
pub mod error;
pub mod introspect;
pub mod lems;
pub mod model;
pub mod projector;
pub mod runner;
pub mod simulation;
pub mod units;
pub mod visual;

pub use error::{Result, WidgetsError};
pub use introspect::{FieldDescriptor, FieldValue, Introspectable, Scalar};
pub use projector::{ProjectionOptions, Projector, project};
pub use visual::{Tab, VisualNode};
