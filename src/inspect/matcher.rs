//! Rule matching against a live element.
//!
//! Filters the flattened rule list down to the rules that actually apply to
//! one element, restricted to a set of properties of interest. Output order
//! follows stylesheet/rule order, which approximates but does not guarantee
//! true cascade precedence: specificity and `!important` are not ranked
//! here.

use std::time::Instant;

use selectors::context::SelectorCaches;

use crate::dom::{Document, NodeId, element_matches_with_caches};
use crate::error::{Error, Result, SelectorError};

use super::flatten::FlatSnapshot;
use super::origin::Origin;
use super::selector::{SelectorCache, strip_pseudo_element};

/// One requested declaration from a matched rule.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MatchedDeclaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// A rule that applies to the element and declares at least one requested
/// property.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MatchedRule {
    /// Index into the snapshot's flattened entries.
    pub flat_index: usize,
    pub sheet_label: String,
    pub origin: Origin,
    /// The individual selector (base, pseudo-element removed) that matched.
    pub selector: String,
    /// Trailing pseudo-element separated from the matching selector, if any.
    pub pseudo_element: Option<String>,
    /// Only the requested properties, in declaration order.
    pub declarations: Vec<MatchedDeclaration>,
}

/// Everything one matching pass produced, failures included.
///
/// A selector the platform matcher rejects skips only its own rule; it is
/// recorded in `skipped` rather than raised, so batch passes always return
/// partial results.
#[derive(Debug)]
pub struct MatchReport {
    pub matches: Vec<MatchedRule>,
    /// Selectors rejected by the matcher during this pass.
    pub skipped: Vec<SelectorError>,
    /// True when the pass stopped at `max_matches` with rules left unscanned.
    pub truncated: bool,
    /// Build time of the snapshot this report was derived from.
    pub as_of: Instant,
}

/// Find rules applying to `element` that declare at least one of `keys`.
pub fn find_matching_rules(
    doc: &Document,
    element: NodeId,
    snapshot: &FlatSnapshot,
    keys: &[&str],
    max_matches: usize,
    selector_cache: &mut SelectorCache,
) -> Result<MatchReport> {
    if !doc.is_element(element) {
        return Err(Error::NotAnElement(element));
    }

    let mut report = MatchReport {
        matches: Vec::new(),
        skipped: Vec::new(),
        truncated: false,
        as_of: snapshot.built_at,
    };
    let mut caches = SelectorCaches::default();

    for (flat_index, entry) in snapshot.entries.iter().enumerate() {
        if report.matches.len() >= max_matches {
            report.truncated = true;
            break;
        }

        // Cheap prefilter: skip the structural match unless the block sets
        // something we were asked about.
        if !entry.rule.declares_any(keys) {
            continue;
        }

        for segment in selector_cache.split(&entry.rule.selector_text) {
            let (base, pseudo) = strip_pseudo_element(&segment);
            let base = if base.is_empty() { "*" } else { base };

            let matched = match selector_cache.compile(base) {
                Ok(selector) => {
                    element_matches_with_caches(doc, element, selector, &mut caches)
                }
                Err(err) => {
                    report.skipped.push(err.clone());
                    false
                }
            };

            if matched {
                report.matches.push(MatchedRule {
                    flat_index,
                    sheet_label: entry.sheet_label.clone(),
                    origin: entry.origin,
                    selector: base.to_string(),
                    pseudo_element: pseudo.map(|p| p.to_string()),
                    declarations: extract_declarations(entry, keys),
                });
                break;
            }
        }
    }

    Ok(report)
}

fn extract_declarations(
    entry: &super::flatten::FlatRule,
    keys: &[&str],
) -> Vec<MatchedDeclaration> {
    entry
        .rule
        .declarations
        .iter()
        .filter(|decl| keys.iter().any(|key| decl.property.eq_ignore_ascii_case(key)))
        .map(|decl| MatchedDeclaration {
            property: decl.property.clone(),
            value: decl.value.clone(),
            important: decl.important,
        })
        .collect()
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

    #[test]
    fn matches_require_key_and_selector() {
        let doc = parse_html(r#"<p class="msg">hi</p>"#);
        let p = doc.find_by_tag("p").unwrap();
        let snapshot = snapshot_for(
            r#"
                .msg { color: red; padding: 4px; }
                .msg { display: flex; }
                .other { color: blue; }
            "#,
        );

        let report =
            find_matching_rules(&doc, p, &snapshot, &["color"], 10, &mut SelectorCache::new())
                .unwrap();

        // Second rule declares no requested key; third does not match.
        assert_eq!(report.matches.len(), 1);
        let matched = &report.matches[0];
        assert_eq!(matched.selector, ".msg");
        assert_eq!(matched.declarations.len(), 1);
        assert_eq!(matched.declarations[0].property, "color");
        assert_eq!(matched.declarations[0].value, "red");
    }

    #[test]
    fn important_flag_is_reported() {
        let doc = parse_html(r#"<p class="msg">hi</p>"#);
        let p = doc.find_by_tag("p").unwrap();
        let snapshot = snapshot_for(".msg { color: red !important; }");

        let report =
            find_matching_rules(&doc, p, &snapshot, &["color"], 10, &mut SelectorCache::new())
                .unwrap();
        assert!(report.matches[0].declarations[0].important);
    }

    #[test]
    fn pseudo_element_selector_matches_via_base() {
        let doc = parse_html(r#"<p class="msg">hi</p>"#);
        let p = doc.find_by_tag("p").unwrap();
        let snapshot = snapshot_for(".msg::after { content: \"!\"; }");

        let report = find_matching_rules(
            &doc,
            p,
            &snapshot,
            &["content"],
            10,
            &mut SelectorCache::new(),
        )
        .unwrap();

        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].selector, ".msg");
        assert_eq!(report.matches[0].pseudo_element.as_deref(), Some("::after"));
    }

    #[test]
    fn invalid_selector_is_skipped_not_fatal() {
        let doc = parse_html(r#"<p class="msg">hi</p>"#);
        let p = doc.find_by_tag("p").unwrap();
        // `:uninvented` is rejected by the matcher; the pass must survive
        // and still report the valid rule.
        let snapshot = snapshot_for(
            r#"
                .msg:uninvented { color: purple; }
                .msg { color: red; }
            "#,
        );

        let report =
            find_matching_rules(&doc, p, &snapshot, &["color"], 10, &mut SelectorCache::new())
                .unwrap();

        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].selector.contains(":uninvented"));
    }

    #[test]
    fn stops_at_max_matches() {
        let doc = parse_html(r#"<p class="msg">hi</p>"#);
        let p = doc.find_by_tag("p").unwrap();
        let snapshot = snapshot_for(
            r#"
                .msg { color: a; }
                .msg { color: b; }
                .msg { color: c; }
            "#,
        );

        let report =
            find_matching_rules(&doc, p, &snapshot, &["color"], 2, &mut SelectorCache::new())
                .unwrap();

        assert_eq!(report.matches.len(), 2);
        assert!(report.truncated);
    }

    #[test]
    fn non_element_is_an_error() {
        let doc = parse_html("<p>hi</p>");
        let snapshot = snapshot_for(".msg { color: red; }");
        let text = doc.children(doc.find_by_tag("p").unwrap()).next().unwrap();

        let result =
            find_matching_rules(&doc, text, &snapshot, &["color"], 10, &mut SelectorCache::new());
        assert!(matches!(result, Err(Error::NotAnElement(_))));
    }

    #[test]
    fn result_order_follows_rule_order() {
        let doc = parse_html(r#"<p class="msg special">hi</p>"#);
        let p = doc.find_by_tag("p").unwrap();
        let snapshot = snapshot_for(
            r#"
                .special { color: b; }
                .msg { color: a; }
            "#,
        );

        let report =
            find_matching_rules(&doc, p, &snapshot, &["color"], 10, &mut SelectorCache::new())
                .unwrap();
        let order: Vec<_> = report.matches.iter().map(|m| m.flat_index).collect();
        assert_eq!(order, vec![0, 1]);
    }
}
