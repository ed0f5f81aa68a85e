//! Renderers for formatted messages
//!
//! Node content is literal text, so every renderer escapes it for its target.

use crate::format::{FormattedText, ListMarker, Node, BULLET_GLYPH};
use crate::store::{MessageEntry, RenderedContent, Role};
use crossterm::style::Stylize;
use std::fmt::Write;

/// Render as an HTML fragment
///
/// Links open in a new tab and carry the `product-link` class. Only `http`,
/// `https` and relative targets become anchors; any other scheme is shown as
/// plain text.
pub fn to_html(text: &FormattedText) -> String {
    let mut out = String::new();
    for node in text {
        match node {
            Node::Text { value } => out.push_str(&html_escape(value)),
            Node::Bold { value } => {
                let _ = write!(out, "<strong>{}</strong>", html_escape(value));
            }
            Node::Link { label, href } if !is_safe_href(href) => {
                out.push_str(&html_escape(label));
            }
            Node::Link { label, href } => {
                let _ = write!(
                    out,
                    r#"<a href="{}" target="_blank" rel="noopener noreferrer" class="product-link">{}</a>"#,
                    html_escape(href),
                    html_escape(label)
                );
            }
            Node::LineBreak => out.push_str("<br>"),
            Node::ListItem {
                marker: ListMarker::Ordinal(ordinal),
            } => {
                let _ = write!(out, "<b>{}</b> ", html_escape(ordinal));
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

/// Render with ANSI styling for a terminal
///
/// Links show their label followed by the target, since a terminal cannot
/// make the label clickable on its own.
pub fn to_terminal(text: &FormattedText) -> String {
    let mut out = String::new();
    for node in text {
        match node {
            Node::Text { value } => out.push_str(&strip_control(value)),
            Node::Bold { value } => {
                let _ = write!(out, "{}", strip_control(value).bold());
            }
            Node::Link { label, href } => {
                let _ = write!(
                    out,
                    "{} {}",
                    strip_control(label).cyan().underlined(),
                    format!("<{}>", strip_control(href)).dark_grey()
                );
            }
            Node::LineBreak => out.push('\n'),
            Node::ListItem {
                marker: ListMarker::Ordinal(ordinal),
            } => {
                let _ = write!(out, "{} ", strip_control(ordinal).bold());
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

/// Render one conversation entry, prefixed with its author
pub fn entry_to_terminal(entry: &MessageEntry, assistant: &str) -> String {
    match (&entry.content, entry.role) {
        (RenderedContent::Typing, _) => format!("{assistant} is typing...")
            .dark_grey()
            .italic()
            .to_string(),
        (RenderedContent::Formatted(text), Role::User) => {
            format!("{} {}", "you>".green().bold(), to_terminal(text))
        }
        (RenderedContent::Formatted(text), _) => {
            format!("{} {}", format!("{assistant}>").blue().bold(), to_terminal(text))
        }
    }
}

/// Escape HTML special characters
fn html_escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

/// Whether a link target may be used as an anchor `href`
///
/// Browsers ignore whitespace and control characters inside a scheme, so
/// they are removed before the scheme is read.
fn is_safe_href(href: &str) -> bool {
    let normalized: String = href
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    let scheme_end = normalized.find(|c: char| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(i) if normalized.get(i..=i) == Some(":") => {
            matches!(normalized.get(..i), Some("http" | "https"))
        }
        _ => true,
    }
}

/// Drop control characters (escape sequences included) from backend text
fn strip_control(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\t')
        .collect()
}
