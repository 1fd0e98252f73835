//! Component tree projector.
//!
//! Walks an [`Introspectable`] component depth first and builds the visual
//! tree shown to the user:
//!
//! ```text
//! Section "<Type>: <id>"
//! ├── Leaf  <ul><li>field: value</li>...</ul>  (bullet texts kept on the leaf)
//! ├── TabGroup                      (only when a tabbed declared type was seen)
//! │   ├── "<DeclaredType> (<n>)"   children of list fields of that type
//! │   └── "Other (<n>)"            everything else
//! └── Section ...                   (flat children when there are no tabs)
//! ```
//!
//! Components with nothing to show project to `None` and are pruned from
//! their parent.

use std::collections::HashSet;

use crate::introspect::{
    FieldDescriptor, FieldValue, ID_FIELD, Introspectable, QUANTITY_TYPE_PREFIX, Scalar,
};
use crate::visual::{Tab, VisualNode};

/// Title of the synthetic tab collecting untabbed children
pub const OTHER_TAB: &str = "Other";

/// Knobs for a projection run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionOptions {
    /// List entries expanded individually before the list is summarised
    pub max_list_members: usize,
    /// Declared types whose list children get their own tab
    pub tabbed_types: HashSet<String>,
    /// Deepest nesting level projected below the root; `None` walks everything
    pub max_depth: Option<usize>,
}

impl ProjectionOptions {
    pub fn new(max_list_members: usize) -> Self {
        Self {
            max_list_members,
            ..Default::default()
        }
    }

    pub fn with_tabbed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tabbed_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Guard against cyclic or very deep component graphs
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// Project `component` with the given list limit and tabbed declared types.
///
/// No depth guard is applied; the component graph must be acyclic. Use
/// [`Projector`] with [`ProjectionOptions::with_max_depth`] otherwise.
pub fn project<I, S>(
    component: &dyn Introspectable,
    max_list_members: usize,
    tabbed_type_names: I,
) -> Option<VisualNode>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Projector::new(ProjectionOptions::new(max_list_members).with_tabbed_types(tabbed_type_names))
        .project(component)
}

/// Reusable projector holding its options
#[derive(Debug, Clone)]
pub struct Projector {
    options: ProjectionOptions,
}

/// Per-component accumulation while its fields are walked
#[derive(Default)]
struct Body {
    bullets: Vec<String>,
    accordion: Vec<VisualNode>,
    // insertion order of first appearance
    tabs: Vec<(String, Vec<VisualNode>)>,
}

impl Projector {
    pub fn new(options: ProjectionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ProjectionOptions {
        &self.options
    }

    /// Build the visual tree for `component`, or `None` if it has nothing to show
    pub fn project(&self, component: &dyn Introspectable) -> Option<VisualNode> {
        self.project_at(component, 0)
    }

    fn project_at(&self, component: &dyn Introspectable, depth: usize) -> Option<VisualNode> {
        let mut fields = component.describe();
        let title = match take_id(&mut fields) {
            Some(id) => format!("{}: {}", component.type_name(), id),
            None => component.type_name().to_string(),
        };

        let mut body = Body::default();
        for (name, descriptor) in fields {
            self.project_field(&mut body, &name, descriptor, depth);
        }

        let children = body.assemble();
        if children.is_empty() {
            tracing::trace!(%title, "pruned component with nothing to show");
            return None;
        }
        Some(VisualNode::Section { title, children })
    }

    fn project_field(
        &self,
        body: &mut Body,
        name: &str,
        descriptor: FieldDescriptor<'_>,
        depth: usize,
    ) {
        let FieldDescriptor {
            declared_type,
            value,
        } = descriptor;
        if value.is_empty() {
            return;
        }

        match value {
            FieldValue::Empty => {}
            FieldValue::Scalar(scalar) => {
                body.bullets.push(scalar_bullet(name, &declared_type, &scalar));
            }
            FieldValue::Component(child) => {
                body.accordion.extend(self.project_child(child, depth));
            }
            FieldValue::ComponentList(items) => {
                let limit = self.options.max_list_members;
                let shown = if items.len() > limit {
                    body.bullets
                        .push(format!("{name}: {} members (showing {limit})", items.len()));
                    limit
                } else {
                    items.len()
                };

                let children: Vec<VisualNode> = items
                    .into_iter()
                    .take(shown)
                    .filter_map(|item| self.project_child(item, depth))
                    .collect();

                if self.options.tabbed_types.contains(&declared_type) {
                    body.tab_mut(&declared_type).extend(children);
                } else {
                    body.accordion.extend(children);
                }
            }
        }
    }

    fn project_child(&self, child: &dyn Introspectable, depth: usize) -> Option<VisualNode> {
        let child_depth = depth + 1;
        if let Some(max) = self.options.max_depth
            && child_depth > max
        {
            tracing::debug!(
                component = child.type_name(),
                max_depth = max,
                "depth limit reached, not projecting"
            );
            return None;
        }
        self.project_at(child, child_depth)
    }
}

impl Body {
    fn tab_mut(&mut self, declared_type: &str) -> &mut Vec<VisualNode> {
        let idx = match self.tabs.iter().position(|(name, _)| name == declared_type) {
            Some(idx) => idx,
            None => {
                self.tabs.push((declared_type.to_string(), Vec::new()));
                self.tabs.len() - 1
            }
        };
        &mut self.tabs[idx].1
    }

    fn assemble(self) -> Vec<VisualNode> {
        let mut children = Vec::new();
        if !self.bullets.is_empty() {
            children.push(VisualNode::field_list(self.bullets));
        }

        if self.tabs.is_empty() {
            children.extend(self.accordion);
        } else {
            let mut tabs: Vec<Tab> = self
                .tabs
                .into_iter()
                .map(|(name, nodes)| tab(&name, nodes))
                .collect();
            tabs.push(tab(OTHER_TAB, self.accordion));
            children.push(VisualNode::TabGroup { tabs });
        }
        children
    }
}

fn tab(name: &str, children: Vec<VisualNode>) -> Tab {
    Tab {
        title: format!("{name} ({})", children.len()),
        children,
    }
}

/// Remove a usable `id` field and return its text
fn take_id(fields: &mut Vec<(String, FieldDescriptor<'_>)>) -> Option<String> {
    // numeric zero is a valid id; only empty text is not
    let idx = fields.iter().position(|(name, descriptor)| {
        name == ID_FIELD
            && match &descriptor.value {
                FieldValue::Scalar(Scalar::Text(id)) => !id.is_empty(),
                FieldValue::Scalar(_) => true,
                _ => false,
            }
    })?;
    match fields.remove(idx).1.value {
        FieldValue::Scalar(id) => Some(id.to_string()),
        _ => None,
    }
}

fn scalar_bullet(name: &str, declared_type: &str, value: &Scalar) -> String {
    let text = value.to_string();
    let text = if declared_type.starts_with(QUANTITY_TYPE_PREFIX) {
        escape_underscores(&text)
    } else {
        text
    };
    format!("{name}: {text}")
}

/// Keep unit names like `per_ms` out of markdown/LaTeX math mode
pub fn escape_underscores(text: &str) -> String {
    text.replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::FieldDescriptor;
    use pretty_assertions::assert_eq;

    struct Stub {
        name: &'static str,
        fields: Vec<(&'static str, &'static str, Option<Scalar>)>,
    }

    impl Introspectable for Stub {
        fn type_name(&self) -> &str {
            self.name
        }

        fn describe(&self) -> Vec<(String, FieldDescriptor<'_>)> {
            self.fields
                .iter()
                .map(|(name, ty, value)| {
                    let value = value
                        .clone()
                        .map(FieldValue::Scalar)
                        .unwrap_or(FieldValue::Empty);
                    (name.to_string(), FieldDescriptor::new(*ty, value))
                })
                .collect()
        }
    }

    #[test]
    fn quantity_underscores_are_escaped() {
        let c = Stub {
            name: "HHRate",
            fields: vec![
                ("rate", "Nml2Quantity_pertime", Some("0.1per_ms".into())),
                ("mode", "xs:string", Some("a_b".into())),
            ],
        };
        let node = project(&c, 10, Vec::<String>::new()).unwrap();
        assert_eq!(
            node.children()[0].bullets(),
            vec!["rate: 0.1per\\_ms", "mode: a_b"]
        );
    }

    #[test]
    fn empty_id_is_not_promoted() {
        let c = Stub {
            name: "Cell",
            fields: vec![("id", "NmlId", Some("".into())), ("x", "float", Some(1.0.into()))],
        };
        let node = project(&c, 10, Vec::<String>::new()).unwrap();
        assert_eq!(node.title(), Some("Cell"));
        assert_eq!(node.children()[0].bullets(), vec!["x: 1.0"]);
    }

    #[test]
    fn zero_id_is_promoted_but_zero_fields_are_skipped() {
        let c = Stub {
            name: "Pop",
            fields: vec![
                ("id", "int", Some(0i64.into())),
                ("size", "int", Some(0i64.into())),
                ("w", "float", Some(0.0.into())),
                ("n", "int", Some(4i64.into())),
            ],
        };
        let node = project(&c, 10, Vec::<String>::new()).unwrap();
        assert_eq!(node.title(), Some("Pop: 0"));
        assert_eq!(node.children()[0].bullets(), vec!["n: 4"]);
    }

    #[test]
    fn only_id_projects_to_none() {
        let c = Stub {
            name: "Cell",
            fields: vec![("id", "NmlId", Some("c".into())), ("notes", "xs:string", None)],
        };
        assert!(project(&c, 10, Vec::<String>::new()).is_none());
    }

    #[test]
    fn escape_every_underscore() {
        assert_eq!(escape_underscores("a_b_c"), "a\\_b\\_c");
        assert_eq!(escape_underscores("abc"), "abc");
    }
}
