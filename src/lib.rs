//! # stylescope
//!
//! CSS introspection and selector verification engine for live documents.
//!
//! stylescope powers an element-inspection tool and a stylesheet-audit tool
//! for a browser-hosted chat client. Given a snapshot of the document and
//! its loaded stylesheets, it can:
//!
//! - flatten every style rule across all sheets (recursing through `@media`,
//!   `@supports`, and `@layer` blocks) into a TTL-cached list
//! - find which rules actually apply to an element, restricted to the
//!   properties you care about
//! - classify how broadly a selector hits the current document
//! - label each sheet's origin (platform, theme, plugin, custom override)
//! - index custom-property definitions and usages, including unused and
//!   missing names
//! - split an element's resolved style into meaningful values versus
//!   platform defaults
//! - generate ranked, stability-ordered selector candidates for an element
//!
//! ## Quick start
//!
//! ```
//! use stylescope::{Inspector, SheetMeta, StyleSheet, parse_html};
//!
//! let doc = parse_html(r#"<div id="chat"><p class="msg">hi</p></div>"#);
//! let mut inspector = Inspector::new(doc);
//! inspector.attach_sheet(StyleSheet::parse(
//!     SheetMeta::new("app.css"),
//!     ".msg { color: var(--accent, red); }",
//! ));
//!
//! let p = inspector.document().find_by_tag("p").unwrap();
//! let report = inspector.find_matching_rules(p, &["color"], 10).unwrap();
//! assert_eq!(report.matches.len(), 1);
//! assert_eq!(report.matches[0].selector, ".msg");
//!
//! let scope = inspector.analyze_scope(".msg", Some(p));
//! assert_eq!(scope.match_count, Some(1));
//! ```
//!
//! ## Staleness
//!
//! The flattened rule list is cached with a TTL (10 s by default) and
//! rebuilt wholesale on expiry; reads inside the window may be up to one TTL
//! old. Derived results carry an `as_of` timestamp so callers can reason
//! about staleness instead of assuming freshness.
//!
//! ## Ordering
//!
//! Matcher output follows stylesheet/rule order. That approximates but does
//! not guarantee cascade precedence: specificity and layer order are not
//! computed.

pub mod dom;
pub mod error;
pub mod inspect;
pub mod sheet;

pub use dom::{Document, NodeId, parse_html};
pub use error::{Error, Result, SelectorError};
pub use inspect::candidates::CandidateOptions;
pub use inspect::computed::{CascadeResolver, StyleResolver, StyleSplit};
pub use inspect::flatten::{FlatRule, FlatSnapshot, RuleCache};
pub use inspect::matcher::{MatchReport, MatchedDeclaration, MatchedRule};
pub use inspect::origin::{Origin, OriginInfo, OriginRules};
pub use inspect::scope::{ElementDescriptor, ScopeClass, ScopeResult};
pub use inspect::selector::{split_selector_list, strip_pseudo_element};
pub use inspect::variables::{VariableDefinition, VariableIndex, VariableUsage};
pub use inspect::{AuditReport, Inspector, InspectorOptions, SheetSummary};
pub use sheet::{Declaration, GroupKind, GroupRule, RuleNode, SheetMeta, StyleRule, StyleSheet};
