//! Shared DOM-removal serializer: `scraper`'s parse tree is read-only, so
//! element removal is done by collecting the `NodeId`s to drop and
//! re-serializing the subtree around them, the same technique the
//! teacher crate uses in its `html_cleaning::remove_elements_from_html`.

use std::collections::HashSet;

use ego_tree::NodeId;
use scraper::{ElementRef, Node};

/// Serialize `element`'s subtree to HTML, skipping any element whose
/// `NodeId` is in `to_remove` (and everything beneath it).
#[must_use]
pub fn serialize_without(element: &ElementRef, to_remove: &HashSet<NodeId>) -> String {
    let mut out = String::new();
    write_node(*element, to_remove, &mut out);
    out
}

fn write_node(element: ElementRef, to_remove: &HashSet<NodeId>, out: &mut String) {
    if to_remove.contains(&element.id()) {
        return;
    }

    let name = element.value().name();
    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        out.push_str(&html_escape_attr(value));
        out.push('"');
    }
    out.push('>');

    if !is_void_element(name) {
        for child in element.children() {
            match child.value() {
                Node::Element(_) => {
                    if let Some(child_elem) = ElementRef::wrap(child) {
                        write_node(child_elem, to_remove, out);
                    }
                }
                Node::Text(text) => out.push_str(&html_escape_text(text)),
                _ => {}
            }
        }
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
}

fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn html_escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn html_escape_attr(s: &str) -> String {
    html_escape_text(s).replace('"', "&quot;")
}

/// Visible text length under `element`, used by the menu-density and
/// largest-div heuristics (spec.md §4.4 steps 2–3).
#[must_use]
pub fn visible_text_len(element: &ElementRef) -> usize {
    element.text().map(str::len).sum()
}
