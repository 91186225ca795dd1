//! selectors-crate integration for [`Document`].
//!
//! Supplies the two primitives everything else builds on: "does this element
//! match this selector" and "find every match in the document".

use std::fmt;

use cssparser::match_ignore_ascii_case;
use html5ever::{LocalName, Namespace};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::context::{MatchingContext, SelectorCaches};
use selectors::matching::ElementSelectorFlags;
use selectors::parser::{Selector, SelectorParseErrorKind};
use selectors::{OpaqueElement, SelectorImpl};

use super::{Document, NodeData, NodeId};

/// Selector implementation for the inspector's document snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomSelectors;

/// Identifier string type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct IdentStr(pub String);

impl precomputed_hash::PrecomputedHash for IdentStr {
    fn precomputed_hash(&self) -> u32 {
        let mut h: u32 = 0;
        for byte in self.0.bytes() {
            h = h.wrapping_mul(31).wrapping_add(byte as u32);
        }
        h
    }
}

impl AsRef<str> for IdentStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for IdentStr {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'a> From<&'a str> for IdentStr {
    fn from(s: &'a str) -> Self {
        Self(s.to_string())
    }
}

impl cssparser::ToCss for IdentStr {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(&self.0)
    }
}

/// Wrapper type for LocalName that implements ToCss.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CssLocalName(pub LocalName);

impl precomputed_hash::PrecomputedHash for CssLocalName {
    fn precomputed_hash(&self) -> u32 {
        self.0.precomputed_hash()
    }
}

impl cssparser::ToCss for CssLocalName {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(self.0.as_ref())
    }
}

impl From<String> for CssLocalName {
    fn from(s: String) -> Self {
        Self(LocalName::from(s))
    }
}

impl<'a> From<&'a str> for CssLocalName {
    fn from(s: &'a str) -> Self {
        Self(LocalName::from(s))
    }
}

impl AsRef<str> for CssLocalName {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

/// Wrapper type for Namespace that implements ToCss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CssNamespace(pub Namespace);

impl precomputed_hash::PrecomputedHash for CssNamespace {
    fn precomputed_hash(&self) -> u32 {
        self.0.precomputed_hash()
    }
}

impl cssparser::ToCss for CssNamespace {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(self.0.as_ref())
    }
}

impl From<String> for CssNamespace {
    fn from(s: String) -> Self {
        Self(Namespace::from(s))
    }
}

impl<'a> From<&'a str> for CssNamespace {
    fn from(s: &'a str) -> Self {
        Self(Namespace::from(s))
    }
}

/// Pseudo-element type. The matcher strips generated-content pseudo-elements
/// before compiling, so none survive to this layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PseudoElement {}

impl cssparser::ToCss for PseudoElement {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

impl selectors::parser::PseudoElement for PseudoElement {
    type Impl = DomSelectors;

    fn accepts_state_pseudo_classes(&self) -> bool {
        false
    }

    fn valid_after_slotted(&self) -> bool {
        false
    }
}

/// User-action and link pseudo-classes. They parse (chat-client CSS is full
/// of them) but never match against a static snapshot, except `:link`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NonTSPseudoClass {
    Link,
    Visited,
    Hover,
    Active,
    Focus,
    FocusVisible,
    FocusWithin,
}

impl selectors::parser::NonTSPseudoClass for NonTSPseudoClass {
    type Impl = DomSelectors;

    fn is_active_or_hover(&self) -> bool {
        matches!(self, Self::Hover | Self::Active)
    }

    fn is_user_action_state(&self) -> bool {
        matches!(
            self,
            Self::Hover | Self::Active | Self::Focus | Self::FocusVisible | Self::FocusWithin
        )
    }
}

impl cssparser::ToCss for NonTSPseudoClass {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        match self {
            Self::Link => dest.write_str(":link"),
            Self::Visited => dest.write_str(":visited"),
            Self::Hover => dest.write_str(":hover"),
            Self::Active => dest.write_str(":active"),
            Self::Focus => dest.write_str(":focus"),
            Self::FocusVisible => dest.write_str(":focus-visible"),
            Self::FocusWithin => dest.write_str(":focus-within"),
        }
    }
}

impl<'i> selectors::parser::Parser<'i> for DomSelectors {
    type Impl = DomSelectors;
    type Error = SelectorParseErrorKind<'i>;

    fn parse_non_ts_pseudo_class(
        &self,
        location: cssparser::SourceLocation,
        name: cssparser::CowRcStr<'i>,
    ) -> Result<NonTSPseudoClass, cssparser::ParseError<'i, Self::Error>> {
        let pc = match_ignore_ascii_case! { &name,
            "link" => NonTSPseudoClass::Link,
            "visited" => NonTSPseudoClass::Visited,
            "hover" => NonTSPseudoClass::Hover,
            "active" => NonTSPseudoClass::Active,
            "focus" => NonTSPseudoClass::Focus,
            "focus-visible" => NonTSPseudoClass::FocusVisible,
            "focus-within" => NonTSPseudoClass::FocusWithin,
            _ => {
                return Err(location.new_custom_error(
                    SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name.clone()),
                ));
            }
        };
        Ok(pc)
    }
}

impl SelectorImpl for DomSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = IdentStr;
    type Identifier = IdentStr;
    type LocalName = CssLocalName;
    type NamespaceUrl = CssNamespace;
    type NamespacePrefix = IdentStr;
    type BorrowedLocalName = CssLocalName;
    type BorrowedNamespaceUrl = CssNamespace;
    type NonTSPseudoClass = NonTSPseudoClass;
    type PseudoElement = PseudoElement;
}

/// Reference to an element in the document snapshot, for selector matching.
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    pub doc: &'a Document,
    pub id: NodeId,
}

impl<'a> ElementRef<'a> {
    pub fn new(doc: &'a Document, id: NodeId) -> Self {
        Self { doc, id }
    }
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("id", &self.id)
            .field("name", &self.doc.element_name(self.id))
            .finish()
    }
}

impl selectors::Element for ElementRef<'_> {
    type Impl = DomSelectors;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self)
    }

    fn parent_element(&self) -> Option<Self> {
        let node = self.doc.get(self.id)?;
        if node.parent.is_none() {
            return None;
        }
        if self.doc.is_element(node.parent) {
            Some(Self::new(self.doc, node.parent))
        } else {
            None
        }
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let node = self.doc.get(self.id)?;
        let mut current = node.prev_sibling;
        while current.is_some() {
            if self.doc.is_element(current) {
                return Some(Self::new(self.doc, current));
            }
            current = self.doc.get(current)?.prev_sibling;
        }
        None
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let node = self.doc.get(self.id)?;
        let mut current = node.next_sibling;
        while current.is_some() {
            if self.doc.is_element(current) {
                return Some(Self::new(self.doc, current));
            }
            current = self.doc.get(current)?.next_sibling;
        }
        None
    }

    fn first_element_child(&self) -> Option<Self> {
        for child in self.doc.children(self.id) {
            if self.doc.is_element(child) {
                return Some(Self::new(self.doc, child));
            }
        }
        None
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &CssLocalName) -> bool {
        self.doc
            .element_name(self.id)
            .is_some_and(|n| n == &name.0)
    }

    fn has_namespace(&self, ns: &CssNamespace) -> bool {
        self.doc
            .element_namespace(self.id)
            .is_some_and(|n| n == &ns.0)
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.doc.element_name(self.id) == other.doc.element_name(other.id)
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&CssNamespace>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&IdentStr>,
    ) -> bool {
        let node = match self.doc.get(self.id) {
            Some(n) => n,
            None => return false,
        };

        let attrs = match &node.data {
            NodeData::Element { attrs, .. } => attrs,
            _ => return false,
        };

        for attr in attrs {
            let ns_match = match ns {
                NamespaceConstraint::Any => true,
                NamespaceConstraint::Specific(ns) => attr.name.ns == ns.0,
            };
            if !ns_match {
                continue;
            }

            if attr.name.local != local_name.0 {
                continue;
            }

            return operation.eval_str(&attr.value);
        }
        false
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        match pc {
            NonTSPseudoClass::Link => self.is_link(),
            // Interactive states never hold in a static snapshot.
            _ => false,
        }
    }

    fn match_pseudo_element(
        &self,
        _pe: &PseudoElement,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        false
    }

    fn is_link(&self) -> bool {
        let is_anchor = self
            .doc
            .element_name(self.id)
            .is_some_and(|n| n.as_ref() == "a");
        is_anchor && self.doc.attr(self.id, "href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &IdentStr, case_sensitivity: CaseSensitivity) -> bool {
        let elem_id = match self.doc.element_id(self.id) {
            Some(i) => i,
            None => return false,
        };
        case_sensitivity.eq(elem_id.as_bytes(), id.0.as_bytes())
    }

    fn has_class(&self, name: &IdentStr, case_sensitivity: CaseSensitivity) -> bool {
        self.doc
            .element_classes(self.id)
            .iter()
            .any(|c| case_sensitivity.eq(c.as_bytes(), name.0.as_bytes()))
    }

    fn imported_part(&self, _name: &IdentStr) -> Option<IdentStr> {
        None
    }

    fn is_part(&self, _name: &IdentStr) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        for child in self.doc.children(self.id) {
            let node = match self.doc.get(child) {
                Some(n) => n,
                None => continue,
            };
            match &node.data {
                NodeData::Element { .. } => return false,
                NodeData::Text(t) if !t.trim().is_empty() => return false,
                _ => {}
            }
        }
        true
    }

    fn is_root(&self) -> bool {
        let parent = self.doc.get(self.id).map(|n| n.parent);
        if let Some(parent) = parent {
            if let Some(parent_node) = self.doc.get(parent) {
                return matches!(parent_node.data, NodeData::Document);
            }
        }
        false
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn add_element_unique_hashes(&self, _filter: &mut selectors::bloom::BloomFilter) -> bool {
        false
    }

    fn has_custom_state(&self, _name: &IdentStr) -> bool {
        false
    }
}

/// Check whether one element matches one compiled selector.
pub fn element_matches(doc: &Document, node: NodeId, selector: &Selector<DomSelectors>) -> bool {
    let mut caches = SelectorCaches::default();
    element_matches_with_caches(doc, node, selector, &mut caches)
}

/// Same as [`element_matches`] with shared caches across a batch pass.
pub fn element_matches_with_caches(
    doc: &Document,
    node: NodeId,
    selector: &Selector<DomSelectors>,
    caches: &mut SelectorCaches,
) -> bool {
    if !doc.is_element(node) {
        return false;
    }
    let elem = ElementRef::new(doc, node);
    let mut context = MatchingContext::new(
        selectors::matching::MatchingMode::Normal,
        None,
        caches,
        selectors::context::QuirksMode::NoQuirks,
        selectors::matching::NeedsSelectorFlags::No,
        selectors::matching::MatchingForInvalidation::No,
    );
    selectors::matching::matches_selector(selector, 0, None, &elem, &mut context)
}

/// Every element matching any of the given selectors, in document order.
pub fn query_all(doc: &Document, selectors: &[Selector<DomSelectors>]) -> Vec<NodeId> {
    let mut caches = SelectorCaches::default();
    doc.elements()
        .filter(|&id| {
            selectors
                .iter()
                .any(|sel| element_matches_with_caches(doc, id, sel, &mut caches))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn parse_selector(s: &str) -> Selector<DomSelectors> {
        let mut parser_input = cssparser::ParserInput::new(s);
        let mut parser = cssparser::Parser::new(&mut parser_input);
        Selector::parse(&DomSelectors, &mut parser).expect("selector should parse")
    }

    #[test]
    fn tag_selector() {
        let doc = parse_html("<div><p>Hello</p></div>");
        let p = doc.find_by_tag("p").unwrap();

        assert!(element_matches(&doc, p, &parse_selector("p")));
        assert!(!element_matches(&doc, p, &parse_selector("div")));
    }

    #[test]
    fn class_selector() {
        let doc = parse_html(r#"<p class="intro highlight">Hello</p>"#);
        let p = doc.find_by_tag("p").unwrap();

        assert!(element_matches(&doc, p, &parse_selector(".intro")));
        assert!(element_matches(&doc, p, &parse_selector(".highlight")));
        assert!(element_matches(&doc, p, &parse_selector("p.intro")));
        assert!(!element_matches(&doc, p, &parse_selector(".missing")));
    }

    #[test]
    fn id_selector() {
        let doc = parse_html(r#"<p id="main">Hello</p>"#);
        let p = doc.find_by_tag("p").unwrap();

        assert!(element_matches(&doc, p, &parse_selector("#main")));
        assert!(element_matches(&doc, p, &parse_selector("p#main")));
        assert!(!element_matches(&doc, p, &parse_selector("#other")));
    }

    #[test]
    fn descendant_and_child_selectors() {
        let doc = parse_html("<div><span><p>Hello</p></span></div>");
        let p = doc.find_by_tag("p").unwrap();

        assert!(element_matches(&doc, p, &parse_selector("div p")));
        assert!(element_matches(&doc, p, &parse_selector("span > p")));
        assert!(!element_matches(&doc, p, &parse_selector("div > p")));
    }

    #[test]
    fn attribute_selector() {
        let doc = parse_html(r#"<button data-testid="send">Send</button>"#);
        let button = doc.find_by_tag("button").unwrap();

        assert!(element_matches(
            &doc,
            button,
            &parse_selector(r#"[data-testid="send"]"#)
        ));
        assert!(!element_matches(
            &doc,
            button,
            &parse_selector(r#"[data-testid="cancel"]"#)
        ));
    }

    #[test]
    fn hover_parses_but_never_matches() {
        let doc = parse_html(r#"<a href="/x">link</a>"#);
        let a = doc.find_by_tag("a").unwrap();

        assert!(element_matches(&doc, a, &parse_selector("a:link")));
        assert!(!element_matches(&doc, a, &parse_selector("a:hover")));
    }

    #[test]
    fn query_all_walks_document_order() {
        let doc = parse_html(
            r#"<ul><li class="row">a</li><li class="row">b</li><li>c</li></ul>"#,
        );
        let sel = parse_selector("li.row");
        let found = query_all(&doc, std::slice::from_ref(&sel));
        assert_eq!(found.len(), 2);
    }
}
