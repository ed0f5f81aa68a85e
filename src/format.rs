//! Message formatter
//!
//! Turns raw assistant/user text into [`FormattedText`], a sequence of
//! display nodes. The markup understood here is deliberately small:
//! `[label](url)` links, `**bold**`, `1. ` ordered markers, `* ` bullets and
//! newlines. Everything else is literal text.
//!
//! The passes run in a fixed order over an intermediate segment list. Once a
//! pass turns a stretch of text into a node, later passes never look inside
//! it again:
//!
//! 1. links
//! 2. bold
//! 3. ordered list markers
//! 4. bullet markers (start of line only)
//! 5. newlines
//! 6. leading line-break cleanup


use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Visible label used for links that point at a product page
pub const PRODUCT_LINK_LABEL: &str = "View Product";

/// Glyph shown in place of a `* ` bullet prefix
pub const BULLET_GLYPH: &str = "•";

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link pattern"));
static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold pattern"));
static ORDINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+\.) ").expect("valid ordinal pattern"));

/// Marker that opens a list item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ListMarker {
    /// Ordered marker, text preserved (e.g. `"1."`)
    Ordinal(String),
    /// Unordered marker, rendered as [`BULLET_GLYPH`]
    Bullet,
}

/// A single display node
///
/// `Text`, `Bold` and link labels carry literal content. Renderers must
/// escape it; nothing in a node is markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Node {
    Text { value: String },
    Bold { value: String },
    Link { label: String, href: String },
    LineBreak,
    /// Start of a list item; the item's text follows as sibling nodes
    ListItem { marker: ListMarker },
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
        }
    }

    pub fn bold(value: impl Into<String>) -> Self {
        Node::Bold {
            value: value.into(),
        }
    }

    pub fn ordinal(marker: impl Into<String>) -> Self {
        Node::ListItem {
            marker: ListMarker::Ordinal(marker.into()),
        }
    }

    pub fn bullet() -> Self {
        Node::ListItem {
            marker: ListMarker::Bullet,
        }
    }
}

/// Structured, renderer-agnostic message content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormattedText(Vec<Node>);

impl FormattedText {
    pub fn nodes(&self) -> &[Node] {
        &self.0
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.0.iter()
    }

    /// Flatten to unstyled text, one line per line break
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for node in &self.0 {
            match node {
                Node::Text { value } | Node::Bold { value } => out.push_str(value),
                Node::Link { label, href } => {
                    out.push_str(label);
                    out.push_str(" <");
                    out.push_str(href);
                    out.push('>');
                }
                Node::LineBreak => out.push('\n'),
                Node::ListItem {
                    marker: ListMarker::Ordinal(marker),
                } => {
                    out.push_str(marker);
                    out.push(' ');
                }
                Node::ListItem {
                    marker: ListMarker::Bullet,
                } => {
                    out.push_str(BULLET_GLYPH);
                    out.push(' ');
                }
            }
        }
        out
    }
}

impl<'a> IntoIterator for &'a FormattedText {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<Node>> for FormattedText {
    fn from(nodes: Vec<Node>) -> Self {
        Self(nodes)
    }
}

/// Intermediate representation shared by the passes
#[derive(Debug)]
enum Segment {
    /// Text no pass has claimed yet
    Raw(String),
    /// Finished node, opaque to later passes
    Node(Node),
    /// Break introduced by a list marker; merges with an adjacent break
    MarkerBreak,
}

/// Format raw message text into display nodes
///
/// Total and deterministic: unrecognised syntax passes through as text and
/// empty input yields an empty sequence.
pub fn format(raw: &str) -> FormattedText {
    if raw.is_empty() {
        return FormattedText::default();
    }

    let segments = vec![Segment::Raw(raw.to_string())];
    let segments = expand_raw(segments, split_links);
    let segments = expand_raw(segments, split_bold);
    let segments = expand_raw(segments, split_ordinals);
    let segments = split_bullets(segments);
    let segments = expand_raw(segments, split_newlines);

    assemble(segments)
}

/// Apply `pass` to every raw segment, leaving claimed segments untouched
fn expand_raw(segments: Vec<Segment>, pass: fn(&str, &mut Vec<Segment>)) -> Vec<Segment> {
    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment {
            Segment::Raw(text) => pass(&text, &mut out),
            other => out.push(other),
        }
    }
    out
}

/// Split `text` on every match of `re`, letting `claim` emit the replacement
fn split_matches(
    text: &str,
    re: &Regex,
    out: &mut Vec<Segment>,
    claim: impl Fn(&Captures<'_>, &mut Vec<Segment>),
) {
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        push_raw(out, text.get(last..whole.start()).unwrap_or_default());
        claim(&caps, out);
        last = whole.end();
    }
    push_raw(out, text.get(last..).unwrap_or_default());
}

fn push_raw(out: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        out.push(Segment::Raw(text.to_string()));
    }
}

fn capture<'t>(caps: &Captures<'t>, index: usize) -> &'t str {
    caps.get(index).map_or("", |m| m.as_str())
}

fn split_links(text: &str, out: &mut Vec<Segment>) {
    split_matches(text, &LINK_RE, out, |caps, out| {
        let label = capture(caps, 1);
        let href = capture(caps, 2);
        out.push(Segment::Node(Node::Link {
            label: link_label(label, href),
            href: href.to_string(),
        }));
    });
}

/// Links whose label or target is a raw URL get the product label
fn link_label(label: &str, href: &str) -> String {
    if label.trim().starts_with("http") || href.trim().starts_with("http") {
        PRODUCT_LINK_LABEL.to_string()
    } else {
        label.to_string()
    }
}

fn split_bold(text: &str, out: &mut Vec<Segment>) {
    split_matches(text, &BOLD_RE, out, |caps, out| {
        out.push(Segment::Node(Node::bold(capture(caps, 1))));
    });
}

fn split_ordinals(text: &str, out: &mut Vec<Segment>) {
    split_matches(text, &ORDINAL_RE, out, |caps, out| {
        out.push(Segment::MarkerBreak);
        out.push(Segment::Node(Node::ordinal(capture(caps, 1))));
    });
}

/// Bullets only count at the start of a line, so this pass tracks line
/// position across segment boundaries.
fn split_bullets(segments: Vec<Segment>) -> Vec<Segment> {
    let mut out = Vec::with_capacity(segments.len());
    let mut at_line_start = true;

    for segment in segments {
        let Segment::Raw(text) = segment else {
            at_line_start = false;
            out.push(segment);
            continue;
        };

        for (index, line) in text.split_inclusive('\n').enumerate() {
            let line_start = index > 0 || at_line_start;
            match line.strip_prefix("* ") {
                Some(rest) if line_start => {
                    out.push(Segment::MarkerBreak);
                    out.push(Segment::Node(Node::bullet()));
                    push_raw(&mut out, rest);
                }
                _ => push_raw(&mut out, line),
            }
        }
        at_line_start = text.ends_with('\n');
    }
    out
}

fn split_newlines(text: &str, out: &mut Vec<Segment>) {
    let mut lines = text.split('\n');
    if let Some(first) = lines.next() {
        push_raw(out, first);
    }
    for line in lines {
        out.push(Segment::Node(Node::LineBreak));
        push_raw(out, line);
    }
}

fn assemble(segments: Vec<Segment>) -> FormattedText {
    let mut nodes: Vec<Node> = Vec::with_capacity(segments.len());

    for segment in segments {
        match segment {
            Segment::Raw(value) => push_text(&mut nodes, value),
            Segment::Node(Node::Text { value }) => push_text(&mut nodes, value),
            Segment::Node(node) => nodes.push(node),
            Segment::MarkerBreak => {
                if nodes.last() != Some(&Node::LineBreak) {
                    nodes.push(Node::LineBreak);
                }
            }
        }
    }

    if nodes.first() == Some(&Node::LineBreak) {
        nodes.remove(0);
    }
    FormattedText(nodes)
}

fn push_text(nodes: &mut Vec<Node>, value: String) {
    if value.is_empty() {
        return;
    }
    if let Some(Node::Text { value: prev }) = nodes.last_mut() {
        prev.push_str(&value);
    } else {
        nodes.push(Node::Text { value });
    }
}
