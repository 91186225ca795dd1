//! Selector scope analysis.
//!
//! Answers "how broadly does this selector hit the current document" and
//! shows a few of the other elements it touches, so a user picking a
//! selector can see what else they are about to style.

use crate::dom::{Document, NodeId, query_all};

use super::selector::{SelectorCache, split_selector_list};

/// Upper bound of the `Targeted` band.
pub const TARGETED_MAX: usize = 5;
/// Upper bound of the `Moderate` band.
pub const MODERATE_MAX: usize = 50;
/// How many non-reference matches to describe.
pub const DEFAULT_SAMPLE_LIMIT: usize = 5;

/// How broadly a selector matches the current document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ScopeClass {
    /// Matches nothing right now.
    NoMatch,
    /// Exactly one element.
    Unique,
    /// 2-5 elements.
    Targeted,
    /// 6-50 elements.
    Moderate,
    /// More than 50 elements.
    Global,
    /// The selector was rejected by the matcher.
    Unknown,
}

impl ScopeClass {
    /// Classify a match count against the fixed thresholds.
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => ScopeClass::NoMatch,
            1 => ScopeClass::Unique,
            n if n <= TARGETED_MAX => ScopeClass::Targeted,
            n if n <= MODERATE_MAX => ScopeClass::Moderate,
            _ => ScopeClass::Global,
        }
    }
}

/// Compact description of a matched element: tag plus the first class or an
/// identity attribute, enough to recognize it in a tooltip.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ElementDescriptor {
    pub tag: String,
    pub hint: Option<String>,
}

impl std::fmt::Display for ElementDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.hint {
            Some(hint) => write!(f, "{}{}", self.tag, hint),
            None => write!(f, "{}", self.tag),
        }
    }
}

/// Attributes that identify an element when it has no class.
const IDENTITY_HINT_ATTRS: &[&str] = &["id", "data-testid", "aria-label", "role"];

/// Describe one element compactly.
pub fn describe_element(doc: &Document, id: NodeId) -> ElementDescriptor {
    let tag = doc
        .element_name(id)
        .map(|n| n.to_string())
        .unwrap_or_else(|| "?".to_string());

    if let Some(class) = doc.element_classes(id).first() {
        return ElementDescriptor {
            tag,
            hint: Some(format!(".{class}")),
        };
    }

    for attr in IDENTITY_HINT_ATTRS {
        if let Some(value) = doc.attr(id, attr) {
            let hint = if *attr == "id" {
                format!("#{value}")
            } else {
                format!("[{attr}={value:?}]")
            };
            return ElementDescriptor {
                tag,
                hint: Some(hint),
            };
        }
    }

    ElementDescriptor { tag, hint: None }
}

/// Result of one scope query. Computed on demand, never cached.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScopeResult {
    pub selector: String,
    pub class: ScopeClass,
    /// Total matches in the document; `None` when the selector is invalid.
    pub match_count: Option<usize>,
    /// Up to `sample_limit` matches other than the reference element.
    pub sample: Vec<ElementDescriptor>,
}

/// Query how broadly `selector_text` matches the document.
///
/// An invalid selector yields `Unknown` with no count; it never escapes as
/// an error.
pub fn analyze_scope(
    doc: &Document,
    selector_text: &str,
    reference: Option<NodeId>,
    sample_limit: usize,
) -> ScopeResult {
    let mut cache = SelectorCache::new();
    let segments = split_selector_list(selector_text);

    let mut compiled = Vec::with_capacity(segments.len());
    for segment in &segments {
        match cache.compile(segment) {
            Ok(selector) => compiled.push(selector.clone()),
            Err(_) => {
                // querySelectorAll semantics: one bad segment poisons the
                // whole list.
                return ScopeResult {
                    selector: selector_text.to_string(),
                    class: ScopeClass::Unknown,
                    match_count: None,
                    sample: Vec::new(),
                };
            }
        }
    }

    if compiled.is_empty() {
        return ScopeResult {
            selector: selector_text.to_string(),
            class: ScopeClass::Unknown,
            match_count: None,
            sample: Vec::new(),
        };
    }

    let matches = query_all(doc, &compiled);
    let count = matches.len();

    let sample = if count > 1 {
        matches
            .iter()
            .filter(|&&id| Some(id) != reference)
            .take(sample_limit)
            .map(|&id| describe_element(doc, id))
            .collect()
    } else {
        Vec::new()
    };

    ScopeResult {
        selector: selector_text.to_string(),
        class: ScopeClass::from_count(count),
        match_count: Some(count),
        sample,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn classification_boundaries_are_monotonic() {
        assert_eq!(ScopeClass::from_count(0), ScopeClass::NoMatch);
        assert_eq!(ScopeClass::from_count(1), ScopeClass::Unique);
        assert_eq!(ScopeClass::from_count(2), ScopeClass::Targeted);
        assert_eq!(ScopeClass::from_count(5), ScopeClass::Targeted);
        assert_eq!(ScopeClass::from_count(6), ScopeClass::Moderate);
        assert_eq!(ScopeClass::from_count(50), ScopeClass::Moderate);
        assert_eq!(ScopeClass::from_count(51), ScopeClass::Global);
    }

    #[test]
    fn unique_match_has_no_sample() {
        let doc = parse_html(r#"<div id="chat"><p class="msg">a</p></div>"#);
        let result = analyze_scope(&doc, ".msg", None, DEFAULT_SAMPLE_LIMIT);
        assert_eq!(result.class, ScopeClass::Unique);
        assert_eq!(result.match_count, Some(1));
        assert!(result.sample.is_empty());
    }

    #[test]
    fn sample_excludes_reference_and_is_bounded() {
        let html: String = (0..8)
            .map(|i| format!(r#"<li class="row" data-n="{i}">x</li>"#))
            .collect();
        let doc = parse_html(&format!("<ul>{html}</ul>"));
        let reference = doc.find_by_tag("li").unwrap();

        let result = analyze_scope(&doc, "li.row", Some(reference), 5);
        assert_eq!(result.class, ScopeClass::Moderate);
        assert_eq!(result.match_count, Some(8));
        assert_eq!(result.sample.len(), 5);
        for descriptor in &result.sample {
            assert_eq!(descriptor.to_string(), "li.row");
        }
    }

    #[test]
    fn invalid_selector_is_unknown_with_no_count() {
        let doc = parse_html("<p>hi</p>");
        let result = analyze_scope(&doc, "p[[", None, DEFAULT_SAMPLE_LIMIT);
        assert_eq!(result.class, ScopeClass::Unknown);
        assert_eq!(result.match_count, None);
    }

    #[test]
    fn selector_list_counts_union() {
        let doc = parse_html(r#"<div class="a">x</div><div class="b">y</div>"#);
        let result = analyze_scope(&doc, ".a, .b", None, DEFAULT_SAMPLE_LIMIT);
        assert_eq!(result.match_count, Some(2));
        assert_eq!(result.class, ScopeClass::Targeted);
    }

    #[test]
    fn descriptor_prefers_class_then_identity_attr() {
        let doc = parse_html(
            r#"<button data-testid="send">s</button><span class="label alt">t</span>"#,
        );
        let button = doc.find_by_tag("button").unwrap();
        let span = doc.find_by_tag("span").unwrap();

        assert_eq!(
            describe_element(&doc, button).to_string(),
            r#"button[data-testid="send"]"#
        );
        assert_eq!(describe_element(&doc, span).to_string(), "span.label");
    }
}
