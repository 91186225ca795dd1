//! The introspection engine.
//!
//! [`Inspector`] owns the document snapshot, the sheet registry, and the
//! TTL rule cache, and exposes the operations the element-inspection and
//! stylesheet-audit tools are built on. The cache is an explicit member
//! threaded into each pass, never hidden global state.

pub mod candidates;
pub mod computed;
pub mod flatten;
pub mod matcher;
pub mod origin;
pub mod scope;
pub mod selector;
pub mod variables;

use std::time::{Duration, Instant};

use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::sheet::StyleSheet;

use candidates::CandidateOptions;
use computed::{CascadeResolver, StyleSplit};
use flatten::{FlatSnapshot, RuleCache};
use matcher::MatchReport;
use origin::{OriginInfo, OriginRules, classify_origin};
use scope::ScopeResult;
use selector::SelectorCache;
use variables::VariableIndex;

/// Tuning knobs for the engine.
#[derive(Debug, Clone)]
pub struct InspectorOptions {
    /// How long a flattened snapshot stays valid.
    pub cache_ttl: Duration,
    /// How many non-reference matches a scope query describes.
    pub sample_limit: usize,
    pub candidates: CandidateOptions,
}

impl Default for InspectorOptions {
    fn default() -> Self {
        Self {
            cache_ttl: RuleCache::DEFAULT_TTL,
            sample_limit: scope::DEFAULT_SAMPLE_LIMIT,
            candidates: CandidateOptions::default(),
        }
    }
}

/// CSS introspection engine over one document and its stylesheets.
pub struct Inspector {
    doc: Document,
    sheets: Vec<StyleSheet>,
    cache: RuleCache,
    origin_rules: OriginRules,
    options: InspectorOptions,
}

impl Inspector {
    pub fn new(doc: Document) -> Self {
        Self::with_options(doc, InspectorOptions::default())
    }

    pub fn with_options(doc: Document, options: InspectorOptions) -> Self {
        Self {
            doc,
            sheets: Vec::new(),
            cache: RuleCache::with_ttl(options.cache_ttl),
            origin_rules: OriginRules::default(),
            options,
        }
    }

    /// Replace the origin probe data (host update, exotic theme loader).
    pub fn set_origin_rules(&mut self, origin_rules: OriginRules) {
        self.origin_rules = origin_rules;
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn sheets(&self) -> &[StyleSheet] {
        &self.sheets
    }

    /// Register a stylesheet; returns its index.
    ///
    /// The rule cache is deliberately not invalidated: a sheet attached
    /// mid-window becomes visible when the TTL lapses, exactly like the
    /// live host. Call [`Inspector::invalidate_cache`] to force it.
    pub fn attach_sheet(&mut self, sheet: StyleSheet) -> usize {
        self.sheets.push(sheet);
        self.sheets.len() - 1
    }

    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate();
    }

    /// The flattened rule list, rebuilt first when the TTL has lapsed.
    pub fn flat_rules(&mut self) -> &FlatSnapshot {
        self.cache.snapshot(&self.sheets, &self.origin_rules)
    }

    /// Rules applying to `element` that declare at least one of `keys`.
    pub fn find_matching_rules(
        &mut self,
        element: NodeId,
        keys: &[&str],
        max_matches: usize,
    ) -> Result<MatchReport> {
        let snapshot = self.cache.snapshot(&self.sheets, &self.origin_rules);
        let mut selector_cache = SelectorCache::new();
        matcher::find_matching_rules(
            &self.doc,
            element,
            snapshot,
            keys,
            max_matches,
            &mut selector_cache,
        )
    }

    /// How broadly a selector matches the current document.
    pub fn analyze_scope(&self, selector: &str, reference: Option<NodeId>) -> ScopeResult {
        scope::analyze_scope(&self.doc, selector, reference, self.options.sample_limit)
    }

    /// Origin classification for a registered sheet.
    pub fn classify_origin(&self, sheet_index: usize) -> Option<OriginInfo> {
        self.sheets
            .get(sheet_index)
            .map(|sheet| classify_origin(&self.origin_rules, &sheet.meta))
    }

    /// Custom-property definitions and usages across all flattened rules.
    pub fn collect_variables(&mut self) -> VariableIndex {
        let snapshot = self.cache.snapshot(&self.sheets, &self.origin_rules);
        variables::collect_variables(&snapshot.entries)
    }

    /// An element's resolved style split into active and defaulted values.
    pub fn split_computed_style(&mut self, element: NodeId) -> Result<StyleSplit> {
        let snapshot = self.cache.snapshot(&self.sheets, &self.origin_rules);
        let as_of = snapshot.built_at;
        let mut resolver = CascadeResolver::new(snapshot);
        computed::split_computed_style(&self.doc, element, &mut resolver, as_of)
    }

    /// Ranked selector candidates for an element, most stable first.
    pub fn build_candidates(&self, element: NodeId) -> Result<Vec<String>> {
        candidates::build_candidates(&self.doc, element, &self.options.candidates)
    }

    /// Summary of every registered sheet for the audit tool.
    pub fn audit(&mut self) -> AuditReport {
        let snapshot = self.cache.snapshot(&self.sheets, &self.origin_rules);
        let variables = variables::collect_variables(&snapshot.entries);

        let mut summaries: Vec<SheetSummary> = self
            .sheets
            .iter()
            .map(|sheet| SheetSummary {
                label: sheet.meta.label.clone(),
                origin: classify_origin(&self.origin_rules, &sheet.meta),
                readable: sheet.is_readable(),
                rule_count: 0,
                variable_definitions: 0,
            })
            .collect();

        for entry in &snapshot.entries {
            if let Some(summary) = summaries.get_mut(entry.sheet_index) {
                summary.rule_count += 1;
            }
        }
        for definitions in variables.definitions.values() {
            for definition in definitions {
                let sheet_index = snapshot.entries[definition.flat_index].sheet_index;
                if let Some(summary) = summaries.get_mut(sheet_index) {
                    summary.variable_definitions += 1;
                }
            }
        }

        AuditReport {
            total_rules: snapshot.entries.len(),
            unreadable_sheets: snapshot.unreadable_sheets,
            unused_variables: variables.unused().iter().map(|s| s.to_string()).collect(),
            missing_variables: variables.missing().iter().map(|s| s.to_string()).collect(),
            sheets: summaries,
            as_of: snapshot.built_at,
        }
    }
}

/// Per-sheet line of the audit report.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SheetSummary {
    pub label: String,
    pub origin: OriginInfo,
    pub readable: bool,
    pub rule_count: usize,
    pub variable_definitions: usize,
}

/// Whole-document audit summary. Rendering and persistence belong to the
/// consumer; this is just the data.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AuditReport {
    pub sheets: Vec<SheetSummary>,
    pub total_rules: usize,
    pub unreadable_sheets: usize,
    pub unused_variables: Vec<String>,
    pub missing_variables: Vec<String>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub as_of: Instant,
}
