//! Visual tree handed to the display layer.
//!
//! The tree is a plain data description: HTML leaves, collapsible titled
//! sections and tab containers. It serializes to `kind`-tagged JSON for any
//! notebook-style front end, and renders to standalone HTML or to an
//! indented text outline for terminals.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// One node of the visual tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisualNode {
    /// Raw HTML fragment
    Leaf {
        html: String,
        /// Bullet texts when the fragment is a field list
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        items: Vec<String>,
    },
    /// Collapsible section ("accordion" entry)
    Section {
        title: String,
        children: Vec<VisualNode>,
    },
    /// Tabbed container
    TabGroup { tabs: Vec<Tab> },
}

/// A titled tab of a [`VisualNode::TabGroup`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub title: String,
    pub children: Vec<VisualNode>,
}

const PAGE_STYLE: &str = "\
.nml-section{margin-left:1em}
.nml-tabs{display:flex;gap:1em;align-items:flex-start}
.nml-tab{border:1px solid #ccc;padding:0.5em}
";

static LIST_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<li>(.*?)</li>").expect("list item pattern is valid"));

impl VisualNode {
    pub fn leaf(html: impl Into<String>) -> Self {
        VisualNode::Leaf {
            html: html.into(),
            items: Vec::new(),
        }
    }

    /// `<ul>` leaf of `name: value` bullets; the texts are kept alongside the HTML
    pub fn field_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        let mut html = String::from("<ul>");
        for item in &items {
            let _ = write!(html, "<li>{item}</li>");
        }
        html.push_str("</ul>");
        VisualNode::Leaf { html, items }
    }

    pub fn section(title: impl Into<String>, children: Vec<VisualNode>) -> Self {
        VisualNode::Section {
            title: title.into(),
            children,
        }
    }

    /// Section title, if this is a section
    pub fn title(&self) -> Option<&str> {
        match self {
            VisualNode::Section { title, .. } => Some(title),
            _ => None,
        }
    }

    /// Direct children of a section; empty for leaves and tab groups
    pub fn children(&self) -> &[VisualNode] {
        match self {
            VisualNode::Section { children, .. } => children,
            _ => &[],
        }
    }

    /// Bullet texts of a field-list leaf; raw HTML leaves fall back to their `<li>` items
    pub fn bullets(&self) -> Vec<&str> {
        match self {
            VisualNode::Leaf { items, .. } if !items.is_empty() => {
                items.iter().map(String::as_str).collect()
            }
            VisualNode::Leaf { html, .. } => LIST_ITEM_RE
                .captures_iter(html)
                .filter_map(|c| c.get(1).map(|m| m.as_str()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Number of sections in this subtree, including this node
    pub fn section_count(&self) -> usize {
        match self {
            VisualNode::Leaf { .. } => 0,
            VisualNode::Section { children, .. } => {
                1 + children.iter().map(VisualNode::section_count).sum::<usize>()
            }
            VisualNode::TabGroup { tabs } => tabs
                .iter()
                .flat_map(|t| t.children.iter())
                .map(VisualNode::section_count)
                .sum(),
        }
    }

    /// Render as an HTML fragment
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_html(&mut out, self);
        out
    }

    /// Render as an indented plain-text outline
    pub fn outline(&self) -> String {
        let mut out = String::new();
        write_outline(&mut out, self, 0);
        out
    }
}

/// Wrap a rendered tree in a minimal standalone HTML page
pub fn html_document(root: &VisualNode, page_title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>\n{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(page_title),
        PAGE_STYLE,
        root.to_html()
    )
}

fn write_html(out: &mut String, node: &VisualNode) {
    match node {
        VisualNode::Leaf { html, .. } => out.push_str(html),
        VisualNode::Section { title, children } => {
            let _ = write!(
                out,
                "<details class=\"nml-section\"><summary>{}</summary>",
                escape_html(title)
            );
            for child in children {
                write_html(out, child);
            }
            out.push_str("</details>");
        }
        VisualNode::TabGroup { tabs } => {
            out.push_str("<div class=\"nml-tabs\">");
            for tab in tabs {
                let _ = write!(
                    out,
                    "<div class=\"nml-tab\"><h3>{}</h3>",
                    escape_html(&tab.title)
                );
                for child in &tab.children {
                    write_html(out, child);
                }
                out.push_str("</div>");
            }
            out.push_str("</div>");
        }
    }
}

fn write_outline(out: &mut String, node: &VisualNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match node {
        VisualNode::Leaf { .. } => {
            for bullet in node.bullets() {
                let _ = writeln!(out, "{indent}- {bullet}");
            }
        }
        VisualNode::Section { title, children } => {
            let _ = writeln!(out, "{indent}+ {title}");
            for child in children {
                write_outline(out, child, depth + 1);
            }
        }
        VisualNode::TabGroup { tabs } => {
            for tab in tabs {
                let _ = writeln!(out, "{indent}[{}]", tab.title);
                for child in &tab.children {
                    write_outline(out, child, depth + 1);
                }
            }
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
