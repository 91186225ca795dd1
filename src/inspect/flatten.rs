//! Rule flattening and the TTL snapshot cache.
//!
//! The flattener walks every readable sheet's rule tree, recursing through
//! grouping constructs, into one flat list in stylesheet/rule order. The
//! list is a wholesale snapshot: it is rebuilt in full when its TTL lapses
//! and never patched in place, trading a bounded staleness window for a
//! trivially correct cache.

use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::sheet::{RuleNode, SheetContent, StyleRule, StyleSheet};

use super::origin::{Origin, OriginRules, classify_origin};

/// One leaf style rule in the flattened order, with its provenance.
#[derive(Debug, Clone)]
pub struct FlatRule {
    /// Index of the source sheet in the registry.
    pub sheet_index: usize,
    /// Display label of the source sheet.
    pub sheet_label: String,
    /// Position within the sheet's flattened output.
    pub rule_index: usize,
    /// Origin hint carried forward from the sheet.
    pub origin: Origin,
    pub rule: StyleRule,
}

/// A flattened view of every readable sheet, valid for one cache epoch.
#[derive(Debug)]
pub struct FlatSnapshot {
    pub entries: Vec<FlatRule>,
    /// Sheets whose rules could not be read, excluded from `entries`.
    /// Callers surface this as a partial-result warning.
    pub unreadable_sheets: usize,
    /// When this snapshot was built. Derived results carry this timestamp
    /// so callers can reason about staleness.
    pub built_at: Instant,
}

impl FlatSnapshot {
    pub fn build(sheets: &[StyleSheet], origin_rules: &OriginRules) -> Self {
        let mut entries = Vec::new();
        let mut unreadable_sheets = 0;

        for (sheet_index, sheet) in sheets.iter().enumerate() {
            match &sheet.content {
                SheetContent::Unreadable => {
                    warn!("skipping unreadable stylesheet {:?}", sheet.meta.label);
                    unreadable_sheets += 1;
                }
                SheetContent::Rules(nodes) => {
                    let origin = classify_origin(origin_rules, &sheet.meta).origin;
                    let mut rule_index = 0;
                    collect(
                        nodes,
                        sheet_index,
                        &sheet.meta.label,
                        origin,
                        &mut rule_index,
                        &mut entries,
                    );
                }
            }
        }

        Self {
            entries,
            unreadable_sheets,
            built_at: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.built_at.elapsed()
    }
}

/// Record leaves, recurse into groups carrying only the origin sheet.
fn collect(
    nodes: &[RuleNode],
    sheet_index: usize,
    sheet_label: &str,
    origin: Origin,
    rule_index: &mut usize,
    entries: &mut Vec<FlatRule>,
) {
    for node in nodes {
        match node {
            RuleNode::Style(rule) => {
                entries.push(FlatRule {
                    sheet_index,
                    sheet_label: sheet_label.to_string(),
                    rule_index: *rule_index,
                    origin,
                    rule: rule.clone(),
                });
                *rule_index += 1;
            }
            RuleNode::Group(group) => {
                collect(
                    &group.rules,
                    sheet_index,
                    sheet_label,
                    origin,
                    rule_index,
                    entries,
                );
            }
        }
    }
}

/// TTL-gated cache over [`FlatSnapshot`].
///
/// Owned by the inspector and threaded into passes as an explicit handle.
/// TTL is the only staleness control: any read past it rebuilds
/// synchronously, an accepted O(total rules) latency spike gated by time
/// rather than change detection.
#[derive(Debug)]
pub struct RuleCache {
    ttl: Duration,
    snapshot: Option<FlatSnapshot>,
}

impl RuleCache {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

    pub fn new() -> Self {
        Self::with_ttl(Self::DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            snapshot: None,
        }
    }

    /// Current snapshot, rebuilt first if missing or past TTL.
    pub fn snapshot(
        &mut self,
        sheets: &[StyleSheet],
        origin_rules: &OriginRules,
    ) -> &FlatSnapshot {
        let expired = self.snapshot.as_ref().is_none_or(|s| s.age() >= self.ttl);
        if expired {
            let snapshot = FlatSnapshot::build(sheets, origin_rules);
            debug!(
                "rebuilt flat rule snapshot: {} rules, {} unreadable sheets",
                snapshot.entries.len(),
                snapshot.unreadable_sheets
            );
            return self.snapshot.insert(snapshot);
        }
        self.snapshot
            .as_ref()
            .expect("cache hit implies a live snapshot")
    }

    /// Drop the snapshot so the next read rebuilds regardless of TTL.
    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }
}

impl Default for RuleCache {
    fn default() -> Self {
        Self::new()
    }
}
