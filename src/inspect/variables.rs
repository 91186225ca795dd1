//! Custom-property tracking.
//!
//! Indexes every `--name: value` definition and every `var(--name, ...)`
//! reference across the flattened rules. Definitions and usages are indexed
//! independently: a name can have usages with no definition ("missing") or
//! definitions nobody references ("unused"), and the audit tool reports
//! both.

use std::collections::BTreeMap;

use super::flatten::FlatRule;

/// One `--name: value` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VariableDefinition {
    /// Name without the `--` sigil.
    pub name: String,
    pub value: String,
    /// Selector of the defining rule.
    pub selector: String,
    pub sheet_label: String,
    pub flat_index: usize,
}

/// One `var(--name)` reference inside a declaration value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VariableUsage {
    /// Name without the `--` sigil.
    pub name: String,
    /// Property whose value contains the reference.
    pub property: String,
    /// The full raw value text containing the reference.
    pub raw_value: String,
    pub selector: String,
    pub sheet_label: String,
    pub flat_index: usize,
}

/// Definitions and usages keyed by variable name. Ordered maps keep audit
/// output deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VariableIndex {
    pub definitions: BTreeMap<String, Vec<VariableDefinition>>,
    pub usages: BTreeMap<String, Vec<VariableUsage>>,
}

impl VariableIndex {
    /// Names defined somewhere but never referenced.
    pub fn unused(&self) -> Vec<&str> {
        self.definitions
            .keys()
            .filter(|name| !self.usages.contains_key(*name))
            .map(|name| name.as_str())
            .collect()
    }

    /// Names referenced somewhere but never defined.
    pub fn missing(&self) -> Vec<&str> {
        self.usages
            .keys()
            .filter(|name| !self.definitions.contains_key(*name))
            .map(|name| name.as_str())
            .collect()
    }

    /// First definition found for a name, in flattened order. The cascade
    /// between multiple definitions is not resolved beyond this.
    pub fn first_definition(&self, name: &str) -> Option<&VariableDefinition> {
        self.definitions.get(name).and_then(|defs| defs.first())
    }
}

/// Index custom-property definitions and usages across flattened rules.
pub fn collect_variables(entries: &[FlatRule]) -> VariableIndex {
    let mut index = VariableIndex::default();

    for (flat_index, entry) in entries.iter().enumerate() {
        for decl in &entry.rule.declarations {
            if let Some(name) = decl.property.strip_prefix("--") {
                if !name.is_empty() {
                    index
                        .definitions
                        .entry(name.to_string())
                        .or_default()
                        .push(VariableDefinition {
                            name: name.to_string(),
                            value: decl.value.clone(),
                            selector: entry.rule.selector_text.clone(),
                            sheet_label: entry.sheet_label.clone(),
                            flat_index,
                        });
                }
            }

            // Every value is scanned, including custom-property values
            // themselves and references to names defined nowhere.
            for name in scan_var_references(&decl.value) {
                index
                    .usages
                    .entry(name.clone())
                    .or_default()
                    .push(VariableUsage {
                        name,
                        property: decl.property.clone(),
                        raw_value: decl.value.clone(),
                        selector: entry.rule.selector_text.clone(),
                        sheet_label: entry.sheet_label.clone(),
                        flat_index,
                    });
            }
        }
    }

    index
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii()
}

/// Every `var(--name ...)` reference in a value, nested fallbacks included.
/// Names are returned without the sigil, in source order.
pub fn scan_var_references(value: &str) -> Vec<String> {
    let mut names = Vec::new();
    let bytes = value.as_bytes();
    let mut i = 0;

    while let Some(offset) = value[i..].find("var(") {
        let start = i + offset;
        // Reject `somevar(`: the match must start on an identifier boundary.
        let preceded_by_ident = start > 0
            && value[..start]
                .chars()
                .next_back()
                .is_some_and(|ch| is_name_char(ch));
        i = start + 4;
        if preceded_by_ident {
            continue;
        }

        // Skip whitespace, then require the `--` sigil.
        let mut j = i;
        while j < bytes.len() && (bytes[j] as char).is_ascii_whitespace() {
            j += 1;
        }
        let rest = &value[j..];
        if let Some(after_sigil) = rest.strip_prefix("--") {
            let name: String = after_sigil.chars().take_while(|&ch| is_name_char(ch)).collect();
            if !name.is_empty() {
                names.push(name);
            }
        }
        // Fallback text is scanned by simply continuing the outer loop:
        // nested references are plain `var(` occurrences further along.
    }

    names
}

/// Expand `var()` references in a value against an index.
///
/// First-found definitions win; a reference with no definition falls back to
/// its fallback clause (itself expanded) or the empty string. Self-referential
/// chains are cut rather than looped.
pub fn substitute(value: &str, index: &VariableIndex) -> String {
    substitute_inner(value, index, &mut Vec::new())
}

fn substitute_inner(value: &str, index: &VariableIndex, stack: &mut Vec<String>) -> String {
    let Some(start) = find_var_start(value) else {
        return value.to_string();
    };

    let head = &value[..start];
    let args_start = start + 4;
    let Some(args_end) = find_matching_close(value, args_start) else {
        // No closing paren: keep the tail as written.
        return value.to_string();
    };

    let args = &value[args_start..args_end];
    let tail = &value[args_end + 1..];

    let (name_text, fallback) = split_args(args);
    let name = name_text.trim().strip_prefix("--").unwrap_or("").to_string();

    let replacement = if name.is_empty() || stack.contains(&name) {
        fallback
            .map(|f| substitute_inner(f, index, stack))
            .unwrap_or_default()
    } else {
        match index.first_definition(&name) {
            Some(def) => {
                stack.push(name);
                let expanded = substitute_inner(&def.value, index, stack);
                stack.pop();
                expanded
            }
            None => fallback
                .map(|f| substitute_inner(f, index, stack))
                .unwrap_or_default(),
        }
    };

    let resolved_tail = substitute_inner(tail, index, stack);
    format!("{head}{replacement}{resolved_tail}")
}

/// Offset of the first `var(` occurrence on an identifier boundary.
fn find_var_start(value: &str) -> Option<usize> {
    let mut i = 0;
    while let Some(offset) = value[i..].find("var(") {
        let start = i + offset;
        let preceded_by_ident = start > 0
            && value[..start]
                .chars()
                .next_back()
                .is_some_and(|ch| is_name_char(ch));
        if !preceded_by_ident {
            return Some(start);
        }
        i = start + 4;
    }
    None
}

/// Index of the `)` matching the paren opened just before `from`.
fn find_matching_close(value: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (pos, ch) in value[from..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + pos);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split `--name, fallback` at the first top-level comma.
fn split_args(args: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    for (pos, ch) in args.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                return (&args[..pos], Some(args[pos + 1..].trim()));
            }
            _ => {}
        }
    }
    (args, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::flatten::FlatSnapshot;
    use crate::inspect::origin::OriginRules;
    use crate::sheet::{SheetMeta, StyleSheet};

    fn entries_for(css: &str) -> Vec<FlatRule> {
        let sheets = vec![StyleSheet::parse(SheetMeta::new("app.css"), css)];
        FlatSnapshot::build(&sheets, &OriginRules::default()).entries
    }

    #[test]
    fn definition_and_two_usages() {
        let entries = entries_for(
            r#"
                :root { --accent: #ff0000; }
                .msg { color: var(--accent); border-color: var(--accent, blue); }
            "#,
        );
        let index = collect_variables(&entries);

        assert_eq!(index.definitions["accent"].len(), 1);
        assert_eq!(index.definitions["accent"][0].value, "#ff0000");
        assert_eq!(index.usages["accent"].len(), 2);
        assert_eq!(index.usages["accent"][0].property, "color");
        assert_eq!(index.usages["accent"][1].property, "border-color");
    }

    #[test]
    fn missing_and_unused_names() {
        let entries = entries_for(
            r#"
                :root { --defined-only: 1px; }
                .msg { width: var(--used-only); }
            "#,
        );
        let index = collect_variables(&entries);

        assert_eq!(index.unused(), vec!["defined-only"]);
        assert_eq!(index.missing(), vec!["used-only"]);
    }

    #[test]
    fn collection_is_idempotent() {
        let entries = entries_for(
            r#"
                :root { --a: 1; --b: var(--a); }
                .x { margin: var(--b, var(--a)); }
            "#,
        );
        assert_eq!(collect_variables(&entries), collect_variables(&entries));
    }

    #[test]
    fn nested_fallback_references_are_recorded() {
        let names = scan_var_references("var(--outer, var(--inner, red))");
        assert_eq!(names, vec!["outer", "inner"]);
    }

    #[test]
    fn non_var_function_is_not_a_reference() {
        assert!(scan_var_references("calc(1px + 2px)").is_empty());
        assert!(scan_var_references("somevar(--x)").is_empty());
        assert_eq!(scan_var_references("calc(var(--x) * 2)"), vec!["x"]);
    }

    #[test]
    fn substitute_resolves_definitions_and_fallbacks() {
        let entries = entries_for(":root { --accent: #ff0000; }");
        let index = collect_variables(&entries);

        assert_eq!(substitute("var(--accent)", &index), "#ff0000");
        assert_eq!(substitute("var(--missing, blue)", &index), "blue");
        assert_eq!(substitute("var(--missing)", &index), "");
        assert_eq!(
            substitute("1px solid var(--accent)", &index),
            "1px solid #ff0000"
        );
    }

    #[test]
    fn substitute_cuts_cycles() {
        let entries = entries_for(":root { --a: var(--b); --b: var(--a); }");
        let index = collect_variables(&entries);
        // The chain terminates; whatever remains must not loop forever.
        assert_eq!(substitute("var(--a, red)", &index), "");
    }
}
