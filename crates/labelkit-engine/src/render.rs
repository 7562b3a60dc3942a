//! Badge injection.
//!
//! A pass collects a [`RenderPlan`] (which containers were processed and
//! which badges each receives) and [`render_document`] serializes the parsed
//! document with the plan applied. In every processed container, badges
//! from earlier passes are dropped and the new ones are appended as its
//! last children, so re-rendering identical input yields identical output.

use std::collections::HashMap;
use std::fmt::Write as _;

use ego_tree::{NodeId, NodeRef};
use labelkit_core::{Label, LabelPosition};
use scraper::node::{Element, Node};
use scraper::Html;

use crate::colors::{foreground_for, resolve_background};
use crate::dom::BADGE_CLASS;

/// Gap between a badge and the container edge, in pixels.
const EDGE_OFFSET_PX: u32 = 8;
/// Vertical distance between badges stacked at the same position.
const STACK_STEP_PX: u32 = 28;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta",
    "param", "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "noscript", "plaintext",
];

/// A badge ready to be placed.
#[derive(Debug, Clone, PartialEq)]
pub struct Badge {
    pub label_id: String,
    pub text: String,
    pub background: String,
    pub position: LabelPosition,
}

impl Badge {
    #[must_use]
    pub fn from_label(label: &Label) -> Self {
        Self {
            label_id: label.id.clone(),
            text: label.text.clone(),
            background: resolve_background(label.background.as_deref()),
            position: label.position(),
        }
    }
}

/// Containers touched by one pass and the badges each receives.
#[derive(Debug, Default)]
pub struct RenderPlan {
    containers: HashMap<NodeId, Vec<Badge>>,
}

impl RenderPlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `container` as processed so stale badges inside it are removed
    /// even when nothing new is placed there.
    pub fn claim(&mut self, container: NodeId) {
        self.containers.entry(container).or_default();
    }

    pub fn push(&mut self, container: NodeId, badge: Badge) {
        self.containers.entry(container).or_default().push(badge);
    }

    #[must_use]
    pub fn badge_count(&self) -> usize {
        self.containers.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

/// Serializes `doc` to HTML with `plan` applied.
#[must_use]
pub fn render_document(doc: &Html, plan: &RenderPlan) -> String {
    let mut out = String::new();
    write_node(doc.tree.root(), plan, false, false, &mut out);
    out
}

fn write_node(
    node: NodeRef<'_, Node>,
    plan: &RenderPlan,
    strip_badges: bool,
    raw_text: bool,
    out: &mut String,
) {
    match node.value() {
        Node::Document | Node::Fragment => {
            for child in node.children() {
                write_node(child, plan, strip_badges, false, out);
            }
        }
        Node::Doctype(doctype) => {
            let _ = write!(out, "<!DOCTYPE {}>", doctype.name());
        }
        Node::Comment(comment) => {
            let _ = write!(out, "<!--{}-->", &**comment);
        }
        Node::Text(text) => {
            if raw_text {
                out.push_str(text);
            } else {
                escape_into(text, false, out);
            }
        }
        Node::ProcessingInstruction(pi) => {
            let _ = write!(out, "<?{} {}>", &*pi.target, &*pi.data);
        }
        Node::Element(element) => {
            if strip_badges && element.classes().any(|c| c == BADGE_CLASS) {
                return;
            }
            write_element(node, element, plan, strip_badges, out);
        }
    }
}

fn write_element(
    node: NodeRef<'_, Node>,
    element: &Element,
    plan: &RenderPlan,
    strip_badges: bool,
    out: &mut String,
) {
    let name = element.name();
    let badges = plan.containers.get(&node.id());

    out.push('<');
    out.push_str(name);
    for (qual, value) in &element.attrs {
        let local = &*qual.local;
        if badges.is_some() && qual.prefix.is_none() && local == "style" {
            continue;
        }
        match &qual.prefix {
            Some(prefix) => write_attr(&format!("{}:{local}", &**prefix), value, out),
            None => write_attr(local, value, out),
        }
    }
    if badges.is_some() {
        write_attr("style", &positioned_style(element.attr("style")), out);
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    let raw_text = RAW_TEXT_ELEMENTS.contains(&name);
    let strip_children = strip_badges || badges.is_some();
    for child in node.children() {
        write_node(child, plan, strip_children, raw_text, out);
    }

    if let Some(badges) = badges {
        let mut stacked: HashMap<LabelPosition, u32> = HashMap::new();
        for badge in badges {
            let slot = stacked.entry(badge.position).or_insert(0);
            write_badge(badge, *slot, out);
            *slot += 1;
        }
    }

    let _ = write!(out, "</{name}>");
}

/// The container's inline style with `position: relative` appended unless it
/// already declares a non-static position.
fn positioned_style(existing: Option<&str>) -> String {
    let existing = existing.map(str::trim).unwrap_or_default();
    let declared = existing
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .filter(|(prop, _)| prop.trim().eq_ignore_ascii_case("position"))
        .map(|(_, value)| value.trim().to_ascii_lowercase())
        .last();

    match declared {
        Some(position) if position != "static" => existing.to_string(),
        _ if existing.is_empty() => "position: relative;".to_string(),
        _ => {
            let separator = if existing.ends_with(';') { " " } else { "; " };
            format!("{existing}{separator}position: relative;")
        }
    }
}

fn write_badge(badge: &Badge, slot: u32, out: &mut String) {
    let vertical = EDGE_OFFSET_PX + slot * STACK_STEP_PX;
    let placement = match badge.position {
        LabelPosition::TopLeft => format!("top: {vertical}px; left: {EDGE_OFFSET_PX}px;"),
        LabelPosition::TopCenter => {
            format!("top: {vertical}px; left: 50%; transform: translateX(-50%);")
        }
        LabelPosition::TopRight => format!("top: {vertical}px; right: {EDGE_OFFSET_PX}px;"),
        LabelPosition::BottomLeft => format!("bottom: {vertical}px; left: {EDGE_OFFSET_PX}px;"),
        LabelPosition::BottomCenter => {
            format!("bottom: {vertical}px; left: 50%; transform: translateX(-50%);")
        }
        LabelPosition::BottomRight => {
            format!("bottom: {vertical}px; right: {EDGE_OFFSET_PX}px;")
        }
    };
    let style = format!(
        "position: absolute; z-index: 2; {placement} background: {}; color: {}; \
         padding: 4px 8px; border-radius: 4px; font-size: 12px; font-weight: 600; \
         line-height: 1.2; white-space: nowrap; pointer-events: none;",
        badge.background,
        foreground_for(&badge.background),
    );

    out.push_str("<div");
    write_attr(
        "class",
        &format!("{BADGE_CLASS} {BADGE_CLASS}--{}", badge.position),
        out,
    );
    write_attr("data-label-id", &badge.label_id, out);
    write_attr("style", &style, out);
    out.push('>');
    escape_into(&badge.text, false, out);
    out.push_str("</div>");
}

fn write_attr(name: &str, value: &str, out: &mut String) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    escape_into(value, true, out);
    out.push('"');
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
