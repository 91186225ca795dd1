//! Computed-style splitting.
//!
//! Separates an element's resolved style into values that are meaningfully
//! active versus platform defaults, against a fixed property table. The
//! resolved values themselves come from a [`StyleResolver`]; the built-in
//! [`CascadeResolver`] derives them from the flattened rules.

use std::collections::BTreeMap;
use std::time::Instant;

use selectors::context::SelectorCaches;

use crate::dom::{Document, NodeId, element_matches_with_caches};
use crate::error::{Error, Result};

use super::flatten::FlatSnapshot;
use super::selector::{SelectorCache, strip_pseudo_element};
use super::variables::{VariableIndex, collect_variables, substitute};

/// What counts as "uninteresting" for one property.
#[derive(Debug, Clone, Copy)]
pub enum PropertyDefault {
    /// Any of these literal spellings is the platform default.
    Literals(&'static [&'static str]),
    /// Element-dependent or inherited; a resolved value is always worth
    /// showing.
    AlwaysActive,
}

use PropertyDefault::{AlwaysActive, Literals};

/// The fixed property list the differ queries, with default spellings.
pub const DEFAULT_TABLE: &[(&str, PropertyDefault)] = &[
    ("align-items", Literals(&["normal", "stretch"])),
    ("animation-name", Literals(&["none"])),
    ("background-color", Literals(&["rgba(0, 0, 0, 0)", "transparent"])),
    ("background-image", Literals(&["none"])),
    ("border-bottom-style", Literals(&["none"])),
    ("border-left-style", Literals(&["none"])),
    ("border-radius", Literals(&["0", "0px"])),
    ("border-right-style", Literals(&["none"])),
    ("border-top-style", Literals(&["none"])),
    ("bottom", Literals(&["auto"])),
    ("box-shadow", Literals(&["none"])),
    ("box-sizing", Literals(&["content-box"])),
    ("clear", Literals(&["none"])),
    ("color", AlwaysActive),
    ("cursor", Literals(&["auto"])),
    ("display", Literals(&["inline", "block"])),
    ("flex-direction", Literals(&["row"])),
    ("flex-wrap", Literals(&["nowrap"])),
    ("float", Literals(&["none"])),
    ("font-family", AlwaysActive),
    ("font-size", AlwaysActive),
    ("font-style", Literals(&["normal"])),
    ("font-weight", Literals(&["400", "normal"])),
    ("gap", Literals(&["normal", "0px"])),
    ("height", Literals(&["auto"])),
    ("justify-content", Literals(&["normal", "flex-start"])),
    ("left", Literals(&["auto"])),
    ("letter-spacing", Literals(&["normal"])),
    ("line-height", Literals(&["normal"])),
    ("margin-bottom", Literals(&["0", "0px"])),
    ("margin-left", Literals(&["0", "0px"])),
    ("margin-right", Literals(&["0", "0px"])),
    ("margin-top", Literals(&["0", "0px"])),
    ("max-height", Literals(&["none"])),
    ("max-width", Literals(&["none"])),
    ("min-height", Literals(&["auto", "0", "0px"])),
    ("min-width", Literals(&["auto", "0", "0px"])),
    ("opacity", Literals(&["1"])),
    ("outline-style", Literals(&["none"])),
    ("overflow-x", Literals(&["visible"])),
    ("overflow-y", Literals(&["visible"])),
    ("padding-bottom", Literals(&["0", "0px"])),
    ("padding-left", Literals(&["0", "0px"])),
    ("padding-right", Literals(&["0", "0px"])),
    ("padding-top", Literals(&["0", "0px"])),
    ("pointer-events", Literals(&["auto"])),
    ("position", Literals(&["static"])),
    ("right", Literals(&["auto"])),
    ("text-align", Literals(&["start", "left"])),
    ("text-decoration-line", Literals(&["none"])),
    ("text-shadow", Literals(&["none"])),
    ("text-transform", Literals(&["none"])),
    ("top", Literals(&["auto"])),
    ("transform", Literals(&["none"])),
    ("transition-duration", Literals(&["0s"])),
    ("vertical-align", Literals(&["baseline"])),
    ("visibility", Literals(&["visible"])),
    ("white-space", Literals(&["normal"])),
    ("width", Literals(&["auto"])),
    ("word-break", Literals(&["normal"])),
    ("z-index", Literals(&["auto"])),
];

/// CSS-inherited properties: absent on the element, they resolve through the
/// parent chain.
const INHERITED: &[&str] = &[
    "color",
    "cursor",
    "font-family",
    "font-size",
    "font-style",
    "font-weight",
    "letter-spacing",
    "line-height",
    "pointer-events",
    "text-align",
    "text-transform",
    "visibility",
    "white-space",
    "word-break",
];

/// Source of resolved property values; the host's computed-style reader.
pub trait StyleResolver {
    fn resolved_value(&mut self, doc: &Document, element: NodeId, property: &str)
    -> Option<String>;
}

/// An element's resolved style split into active values and defaulted names.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StyleSplit {
    /// Property -> resolved value, for values that differ from the default.
    pub active: BTreeMap<String, String>,
    /// Property names whose resolved value equals a platform default (or is
    /// absent).
    pub defaulted: Vec<String>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub as_of: Instant,
}

/// Split an element's resolved style into active and defaulted buckets.
///
/// Every property in the table lands in exactly one bucket: a value equal to
/// a listed default spelling (or empty/absent) is defaulted, anything else
/// is active.
pub fn split_computed_style(
    doc: &Document,
    element: NodeId,
    resolver: &mut dyn StyleResolver,
    as_of: Instant,
) -> Result<StyleSplit> {
    if !doc.is_element(element) {
        return Err(Error::NotAnElement(element));
    }

    let mut active = BTreeMap::new();
    let mut defaulted = Vec::new();

    for (property, default) in DEFAULT_TABLE {
        let value = resolver
            .resolved_value(doc, element, property)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        match (value, default) {
            (None, _) => defaulted.push(property.to_string()),
            (Some(value), Literals(spellings)) => {
                if spellings.iter().any(|s| value.eq_ignore_ascii_case(s)) {
                    defaulted.push(property.to_string());
                } else {
                    active.insert(property.to_string(), value);
                }
            }
            (Some(value), AlwaysActive) => {
                active.insert(property.to_string(), value);
            }
        }
    }

    Ok(StyleSplit {
        active,
        defaulted,
        as_of,
    })
}

/// Resolved-value reader backed by the flattened rules.
///
/// Declared values are picked by traversal order with `!important` winning
/// over normal declarations; specificity is not ranked (the same documented
/// approximation as the matcher). `var()` references are substituted from
/// the snapshot's variable index, and inherited properties fall back through
/// the parent chain.
pub struct CascadeResolver<'a> {
    snapshot: &'a FlatSnapshot,
    variables: VariableIndex,
    selector_cache: SelectorCache,
}

impl<'a> CascadeResolver<'a> {
    pub fn new(snapshot: &'a FlatSnapshot) -> Self {
        Self {
            snapshot,
            variables: collect_variables(&snapshot.entries),
            selector_cache: SelectorCache::new(),
        }
    }

    /// The value declared directly on this element for `property`, if any.
    fn declared_value(
        &mut self,
        doc: &Document,
        element: NodeId,
        property: &str,
    ) -> Option<String> {
        let snapshot = self.snapshot;
        let mut caches = SelectorCaches::default();
        let mut winner: Option<(bool, String)> = None;

        for entry in &snapshot.entries {
            if !entry.rule.declares_any(&[property]) {
                continue;
            }

            let mut matched = false;
            for segment in self.selector_cache.split(&entry.rule.selector_text) {
                let (base, pseudo) = strip_pseudo_element(&segment);
                // Generated-content rules style the pseudo, not the element.
                if pseudo.is_some() || base.is_empty() {
                    continue;
                }
                if let Ok(selector) = self.selector_cache.compile(base) {
                    if element_matches_with_caches(doc, element, selector, &mut caches) {
                        matched = true;
                        break;
                    }
                }
            }
            if !matched {
                continue;
            }

            for decl in &entry.rule.declarations {
                if !decl.property.eq_ignore_ascii_case(property) {
                    continue;
                }
                match &winner {
                    Some((true, _)) if !decl.important => {}
                    _ => winner = Some((decl.important, decl.value.clone())),
                }
            }
        }

        winner.map(|(_, value)| substitute(&value, &self.variables))
    }
}

impl StyleResolver for CascadeResolver<'_> {
    fn resolved_value(
        &mut self,
        doc: &Document,
        element: NodeId,
        property: &str,
    ) -> Option<String> {
        if let Some(value) = self.declared_value(doc, element, property) {
            return Some(value);
        }

        if INHERITED.contains(&property) {
            let mut current = doc.parent_element(element);
            while let Some(ancestor) = current {
                if let Some(value) = self.declared_value(doc, ancestor, property) {
                    return Some(value);
                }
                current = doc.parent_element(ancestor);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::inspect::origin::OriginRules;
    use crate::sheet::{SheetMeta, StyleSheet};

    fn snapshot_for(css: &str) -> FlatSnapshot {
        let sheets = vec![StyleSheet::parse(SheetMeta::new("app.css"), css)];
        FlatSnapshot::build(&sheets, &OriginRules::default())
    }

    fn split_for(html: &str, css: &str, tag: &str) -> StyleSplit {
        let doc = parse_html(html);
        let element = doc.find_by_tag(tag).unwrap();
        let snapshot = snapshot_for(css);
        let mut resolver = CascadeResolver::new(&snapshot);
        split_computed_style(&doc, element, &mut resolver, snapshot.built_at).unwrap()
    }

    #[test]
    fn default_valued_properties_are_defaulted() {
        let split = split_for(
            r#"<div class="panel">x</div>"#,
            ".panel { opacity: 1; display: flex; }",
            "div",
        );

        assert!(split.defaulted.contains(&"opacity".to_string()));
        assert_eq!(split.active.get("display").map(String::as_str), Some("flex"));
    }

    #[test]
    fn every_property_lands_in_exactly_one_bucket() {
        let split = split_for(
            r#"<div class="panel">x</div>"#,
            ".panel { color: red; margin-top: 8px; }",
            "div",
        );

        assert_eq!(
            split.active.len() + split.defaulted.len(),
            DEFAULT_TABLE.len()
        );
        for name in split.active.keys() {
            assert!(!split.defaulted.contains(name));
        }
    }

    #[test]
    fn important_beats_later_normal_declaration() {
        let split = split_for(
            r#"<div class="panel">x</div>"#,
            r#"
                .panel { color: red !important; }
                .panel { color: blue; }
            "#,
            "div",
        );
        assert_eq!(split.active.get("color").map(String::as_str), Some("red"));
    }

    #[test]
    fn var_references_resolve_in_resolved_values() {
        let split = split_for(
            r#"<div class="panel">x</div>"#,
            r#"
                :root { --accent: #ff0000; }
                .panel { color: var(--accent); }
            "#,
            "div",
        );
        assert_eq!(
            split.active.get("color").map(String::as_str),
            Some("#ff0000")
        );
    }

    #[test]
    fn inherited_properties_walk_the_parent_chain() {
        let split = split_for(
            r#"<div class="outer"><p>text</p></div>"#,
            ".outer { color: teal; }",
            "p",
        );
        assert_eq!(split.active.get("color").map(String::as_str), Some("teal"));
    }

    #[test]
    fn non_inherited_properties_do_not_leak_from_parents() {
        let split = split_for(
            r#"<div class="outer"><p>text</p></div>"#,
            ".outer { margin-top: 20px; }",
            "p",
        );
        assert!(split.defaulted.contains(&"margin-top".to_string()));
    }

    #[test]
    fn pseudo_element_rules_do_not_style_the_element() {
        let split = split_for(
            r#"<div class="panel">x</div>"#,
            ".panel::after { color: red; }",
            "div",
        );
        assert!(!split.active.contains_key("color"));
    }
}
