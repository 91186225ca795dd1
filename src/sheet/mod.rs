//! Stylesheet rule-tree model.
//!
//! The engine consumes the host's rule objects, not raw CSS text; parsing
//! here is the ingestion step that stands in for that rule tree. Each node is
//! classified exactly once at ingestion as either a leaf style rule or a
//! grouping construct, so no later pass has to sniff shapes.

mod parse;

/// Identity of a loaded stylesheet, as reported by the host.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SheetMeta {
    /// Display label (href file name, `<style>` id, or a synthetic name).
    pub label: String,
    /// Source URL for link-loaded sheets.
    pub href: Option<String>,
    /// id attribute of the owning `<style>`/`<link>` node, when present.
    pub owner_id: Option<String>,
    /// Host-assigned label on the owning style element (plugin name etc.).
    pub owner_label: Option<String>,
}

impl SheetMeta {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn with_owner_id(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn with_owner_label(mut self, owner_label: impl Into<String>) -> Self {
        self.owner_label = Some(owner_label.into());
        self
    }
}

/// Body of a loaded stylesheet.
///
/// Cross-origin sheets throw on rule access in the host; they are ingested as
/// `Unreadable` and excluded from every pass (but counted for warnings).
#[derive(Debug, Clone)]
pub enum SheetContent {
    Rules(Vec<RuleNode>),
    Unreadable,
}

/// A loaded stylesheet: identity plus rule tree.
#[derive(Debug, Clone)]
pub struct StyleSheet {
    pub meta: SheetMeta,
    pub content: SheetContent,
}

impl StyleSheet {
    /// Ingest a readable stylesheet from CSS text. Parsing is lenient:
    /// unparseable rules are dropped, never fatal.
    pub fn parse(meta: SheetMeta, css: &str) -> Self {
        Self {
            meta,
            content: SheetContent::Rules(parse::parse_rule_tree(css)),
        }
    }

    /// Record a sheet whose rules the host refused to expose.
    pub fn unreadable(meta: SheetMeta) -> Self {
        Self {
            meta,
            content: SheetContent::Unreadable,
        }
    }

    pub fn is_readable(&self) -> bool {
        matches!(self.content, SheetContent::Rules(_))
    }

    /// Leaf style rules in this sheet, counted through grouping constructs.
    pub fn rule_count(&self) -> usize {
        fn count(nodes: &[RuleNode]) -> usize {
            nodes
                .iter()
                .map(|node| match node {
                    RuleNode::Style(_) => 1,
                    RuleNode::Group(group) => count(&group.rules),
                })
                .sum()
        }
        match &self.content {
            SheetContent::Rules(rules) => count(rules),
            SheetContent::Unreadable => 0,
        }
    }
}

/// One node of the rule tree, tagged at ingestion.
#[derive(Debug, Clone)]
pub enum RuleNode {
    /// Leaf: selector list plus declaration block.
    Style(StyleRule),
    /// Grouping construct holding nested rules.
    Group(GroupRule),
}

/// A selector list plus its declaration block. Never mutated after ingestion.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StyleRule {
    /// Raw selector list text, verbatim from the source.
    pub selector_text: String,
    pub declarations: Vec<Declaration>,
}

impl StyleRule {
    /// Whether the declaration block sets at least one of the given
    /// property names. Cheap prefilter used before structural matching.
    pub fn declares_any(&self, keys: &[&str]) -> bool {
        self.declarations
            .iter()
            .any(|decl| keys.iter().any(|key| decl.property.eq_ignore_ascii_case(key)))
    }
}

/// A single property declaration with its raw value text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Declaration {
    pub property: String,
    /// Raw value text, `!important` stripped.
    pub value: String,
    pub important: bool,
}

impl Declaration {
    /// Whether this declaration defines a custom property (`--name`).
    pub fn is_custom_property(&self) -> bool {
        self.property.starts_with("--")
    }
}

/// Kind of grouping construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum GroupKind {
    Media,
    Supports,
    Layer,
    Container,
}

impl GroupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Media => "media",
            GroupKind::Supports => "supports",
            GroupKind::Layer => "layer",
            GroupKind::Container => "container",
        }
    }
}

/// A grouping construct: condition text plus nested rules.
#[derive(Debug, Clone)]
pub struct GroupRule {
    pub kind: GroupKind,
    /// Raw condition/prelude text (`(max-width: 600px)`, layer name, ...).
    pub condition: String,
    pub rules: Vec<RuleNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_count_recurses_into_groups() {
        let css = r#"
            .a { color: red; }
            @media (max-width: 600px) {
                .b { color: blue; }
                @supports (display: grid) {
                    .c { display: grid; }
                }
            }
        "#;
        let sheet = StyleSheet::parse(SheetMeta::new("test.css"), css);
        assert_eq!(sheet.rule_count(), 3);
    }

    #[test]
    fn unreadable_sheet_counts_zero() {
        let sheet = StyleSheet::unreadable(SheetMeta::new("remote.css"));
        assert!(!sheet.is_readable());
        assert_eq!(sheet.rule_count(), 0);
    }

    #[test]
    fn declares_any_is_case_insensitive() {
        let rule = StyleRule {
            selector_text: ".x".into(),
            declarations: vec![Declaration {
                property: "Color".into(),
                value: "red".into(),
                important: false,
            }],
        };
        assert!(rule.declares_any(&["color"]));
        assert!(!rule.declares_any(&["display"]));
    }
}
