//! Selector candidate generation.
//!
//! Produces ranked selector candidates for an element, most stable first:
//! identity, accessibility/test attributes, semantic class prefixes, then a
//! positional path as the fallback of last resort. Generated class names
//! with hash suffixes are reduced to their semantic prefix so candidates
//! survive a rebuild of the host's bundles.

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};

/// Knobs for candidate generation.
#[derive(Debug, Clone)]
pub struct CandidateOptions {
    /// Longest attribute value still worth embedding in a selector; longer
    /// values tend to be localized text and break on other locales.
    pub max_attr_len: usize,
    /// How many ancestors the positional fallback may climb.
    pub max_path_depth: usize,
}

impl Default for CandidateOptions {
    fn default() -> Self {
        Self {
            max_attr_len: 32,
            max_path_depth: 4,
        }
    }
}

/// Attributes that identify an element for selection purposes, in
/// preference order.
const IDENTITY_ATTRS: &[&str] = &[
    "data-testid",
    "data-test-id",
    "data-list-item-id",
    "aria-label",
    "role",
];

/// Build ranked selector candidates for an element.
pub fn build_candidates(
    doc: &Document,
    element: NodeId,
    options: &CandidateOptions,
) -> Result<Vec<String>> {
    if !doc.is_element(element) {
        return Err(Error::NotAnElement(element));
    }

    let mut candidates: Vec<String> = Vec::new();

    if let Some(id) = doc.element_id(element) {
        if !id.is_empty() {
            push_unique(&mut candidates, id_selector(id));
        }
    }

    for attr in IDENTITY_ATTRS {
        if let Some(value) = doc.attr(element, attr) {
            if !value.is_empty() && value.len() <= options.max_attr_len {
                push_unique(
                    &mut candidates,
                    format!("[{attr}=\"{}\"]", escape_attr_value(value)),
                );
            }
        }
    }

    for class in doc.element_classes(element) {
        match hashed_class_prefix(class) {
            Some(prefix) => push_unique(
                &mut candidates,
                format!("[class*=\"{}\"]", escape_attr_value(prefix)),
            ),
            None if is_css_ident(class) => push_unique(&mut candidates, format!(".{class}")),
            None => push_unique(
                &mut candidates,
                format!("[class~=\"{}\"]", escape_attr_value(class)),
            ),
        }
    }

    if let Some(path) = positional_path(doc, element, options) {
        push_unique(&mut candidates, path);
    }

    Ok(candidates)
}

fn push_unique(candidates: &mut Vec<String>, candidate: String) {
    if !candidates.contains(&candidate) {
        candidates.push(candidate);
    }
}

/// `#id` when the id is a clean identifier, attribute form otherwise.
fn id_selector(id: &str) -> String {
    if is_css_ident(id) {
        format!("#{id}")
    } else {
        format!("[id=\"{}\"]", escape_attr_value(id))
    }
}

fn is_css_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_' || !first.is_ascii()) {
        return false;
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii())
}

fn escape_attr_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Semantic prefix of a generated class name.
///
/// Bundlers emit class tokens shaped `name` + separator + hash
/// (`container_fa432f`, `button__3x9tz`). The prefix up to and including the
/// separator is stable across rebuilds; the hash is not.
fn hashed_class_prefix(class: &str) -> Option<&str> {
    let sep = class.rfind(['_', '-'])?;
    let suffix = &class[sep + 1..];
    let name = &class[..sep];

    if name.is_empty() {
        return None;
    }
    if !(4..=12).contains(&suffix.len()) {
        return None;
    }
    if !suffix.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return None;
    }
    // A real hash mixes in digits; plain words like "content" stay intact.
    if !suffix.chars().any(|ch| ch.is_ascii_digit()) {
        return None;
    }

    Some(&class[..=sep])
}

/// Bounded-depth tag path to an ancestor, positional qualifiers only where
/// same-tag siblings force them.
fn positional_path(doc: &Document, element: NodeId, options: &CandidateOptions) -> Option<String> {
    let mut segments = Vec::new();
    let mut anchor: Option<String> = None;
    let mut current = element;

    for _ in 0..options.max_path_depth {
        let tag = doc.element_name(current)?.to_string();
        let (position, has_same_tag_siblings) = doc.type_position(current);
        let segment = if has_same_tag_siblings {
            format!("{tag}:nth-of-type({position})")
        } else {
            tag
        };
        segments.push(segment);

        let Some(parent) = doc.parent_element(current) else {
            break;
        };
        if let Some(parent_id) = doc.element_id(parent) {
            if !parent_id.is_empty() {
                anchor = Some(id_selector(parent_id));
                break;
            }
        }
        current = parent;
    }

    segments.reverse();
    let path = segments.join(" > ");
    Some(match anchor {
        Some(anchor) => format!("{anchor} > {path}"),
        None => path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn candidates_for(html: &str, tag: &str) -> Vec<String> {
        let doc = parse_html(html);
        let element = doc.find_by_tag(tag).unwrap();
        build_candidates(&doc, element, &CandidateOptions::default()).unwrap()
    }

    #[test]
    fn id_comes_first() {
        let candidates = candidates_for(
            r#"<button id="send-button" class="btn" data-testid="send">go</button>"#,
            "button",
        );
        assert_eq!(candidates[0], "#send-button");
    }

    #[test]
    fn identity_attributes_are_gated_by_length() {
        let long_label = "a".repeat(40);
        let html = format!(r#"<button aria-label="{long_label}" role="tab">x</button>"#);
        let candidates = candidates_for(&html, "button");

        assert!(!candidates.iter().any(|c| c.contains("aria-label")));
        assert!(candidates.contains(&r#"[role="tab"]"#.to_string()));
    }

    #[test]
    fn hashed_classes_become_prefix_selectors() {
        let candidates = candidates_for(
            r#"<div class="container_fa432f message-content">x</div>"#,
            "div",
        );

        assert!(candidates.contains(&r#"[class*="container_"]"#.to_string()));
        // "content" has no digits, so it is kept as a plain class.
        assert!(candidates.contains(&".message-content".to_string()));
    }

    #[test]
    fn positional_fallback_uses_nth_of_type_only_when_needed() {
        let candidates = candidates_for(
            "<section><article>a</article><article>b</article></section>",
            "article",
        );
        let path = candidates.last().unwrap();
        assert!(path.ends_with("article:nth-of-type(1)"), "got {path}");
        assert!(!path.contains("section:nth-of-type"));
    }

    #[test]
    fn positional_path_anchors_at_id_ancestor() {
        let candidates = candidates_for(
            r#"<div id="chat-area"><span>x</span></div>"#,
            "span",
        );
        assert!(
            candidates.contains(&"#chat-area > span".to_string()),
            "got {candidates:?}"
        );
    }

    #[test]
    fn candidates_are_deduplicated_in_first_seen_order() {
        let candidates = candidates_for(r#"<div class="alpha alpha">x</div>"#, "div");
        let alpha_count = candidates.iter().filter(|c| *c == ".alpha").count();
        assert_eq!(alpha_count, 1);
    }

    #[test]
    fn non_ident_id_falls_back_to_attribute_form() {
        let candidates = candidates_for(r#"<div id="1:main">x</div>"#, "div");
        assert_eq!(candidates[0], r#"[id="1:main"]"#);
    }
}
