//! Selector list splitting and compilation.
//!
//! Selector text reaches the engine raw. Before anything can be matched it
//! has to be split on top-level commas (respecting quotes, brackets, and
//! function parentheses), have any trailing generated-content pseudo-element
//! separated off, and be compiled through the platform matcher. All three
//! steps live here, with per-pass memoization.

use std::collections::HashMap;

use cssparser::{Parser, ParserInput};
use selectors::parser::Selector;

use crate::dom::DomSelectors;
use crate::error::SelectorError;

/// Split a comma-joined selector list into individual selectors.
///
/// A comma only delimits when it sits outside quotes and at zero bracket and
/// paren depth, so `:not(a, b)` and `[data-x="e,f"]` survive intact.
/// Unbalanced closers clamp depth at zero rather than failing: the split is
/// best-effort and always terminates. Segments are trimmed; empty segments
/// are dropped.
pub fn split_selector_list(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut bracket_depth = 0usize;
    let mut paren_depth = 0usize;

    for ch in text.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' => {
                current.push(ch);
                escaped = true;
            }
            '\'' | '"' => {
                match quote {
                    Some(q) if q == ch => quote = None,
                    None => quote = Some(ch),
                    Some(_) => {}
                }
                current.push(ch);
            }
            '[' if quote.is_none() => {
                bracket_depth += 1;
                current.push(ch);
            }
            ']' if quote.is_none() => {
                bracket_depth = bracket_depth.saturating_sub(1);
                current.push(ch);
            }
            '(' if quote.is_none() => {
                paren_depth += 1;
                current.push(ch);
            }
            ')' if quote.is_none() => {
                paren_depth = paren_depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if quote.is_none() && bracket_depth == 0 && paren_depth == 0 => {
                let segment = current.trim();
                if !segment.is_empty() {
                    segments.push(segment.to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    let segment = current.trim();
    if !segment.is_empty() {
        segments.push(segment.to_string());
    }
    segments
}

/// Single-colon spellings that still mean a generated-content pseudo-element.
const LEGACY_PSEUDO_ELEMENTS: &[&str] = &[
    "before",
    "after",
    "first-line",
    "first-letter",
    "marker",
    "selection",
    "placeholder",
    "backdrop",
];

/// Separate a trailing pseudo-element from its base selector.
///
/// `div.msg::after` becomes (`div.msg`, `Some("::after")`); the legacy
/// one-colon forms are recognized only when they end the selector, so
/// `:hover` and friends stay on the base.
pub fn strip_pseudo_element(selector: &str) -> (&str, Option<&str>) {
    let chars: Vec<(usize, char)> = selector.char_indices().collect();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut bracket_depth = 0usize;
    let mut paren_depth = 0usize;
    let mut split_at: Option<usize> = None;

    let mut i = 0;
    while i < chars.len() {
        let (pos, ch) = chars[i];
        if escaped {
            escaped = false;
            i += 1;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '\'' | '"' => match quote {
                Some(q) if q == ch => quote = None,
                None => quote = Some(ch),
                Some(_) => {}
            },
            '[' if quote.is_none() => bracket_depth += 1,
            ']' if quote.is_none() => bracket_depth = bracket_depth.saturating_sub(1),
            '(' if quote.is_none() => paren_depth += 1,
            ')' if quote.is_none() => paren_depth = paren_depth.saturating_sub(1),
            ':' if quote.is_none() && bracket_depth == 0 && paren_depth == 0 => {
                if matches!(chars.get(i + 1), Some((_, ':'))) {
                    if split_at.is_none() {
                        split_at = Some(pos);
                    }
                    i += 2;
                    continue;
                }
                let rest = &selector[pos + 1..];
                if split_at.is_none()
                    && LEGACY_PSEUDO_ELEMENTS
                        .iter()
                        .any(|p| rest.eq_ignore_ascii_case(p))
                {
                    split_at = Some(pos);
                }
            }
            _ => {}
        }
        i += 1;
    }

    match split_at {
        Some(pos) => {
            let (base, pseudo) = selector.split_at(pos);
            (base.trim_end(), Some(pseudo))
        }
        None => (selector, None),
    }
}

/// Compile one selector (no commas) through the platform matcher.
pub fn compile_selector(text: &str) -> Result<Selector<DomSelectors>, SelectorError> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    Selector::parse(&DomSelectors, &mut parser).map_err(|_| SelectorError::new(text))
}

/// Per-pass memoization of splitting and compilation.
///
/// One cache lives for one analysis pass; rule lists repeat the same selector
/// text constantly, so both maps hit often. Compile failures are memoized
/// too: a selector the matcher rejects once will be rejected every time.
#[derive(Default)]
pub struct SelectorCache {
    split: HashMap<String, Vec<String>>,
    compiled: HashMap<String, Result<Selector<DomSelectors>, SelectorError>>,
}

impl SelectorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a selector list, memoized.
    pub fn split(&mut self, text: &str) -> Vec<String> {
        if let Some(segments) = self.split.get(text) {
            return segments.clone();
        }
        let segments = split_selector_list(text);
        self.split.insert(text.to_string(), segments.clone());
        segments
    }

    /// Compile a single selector, memoized.
    pub fn compile(&mut self, text: &str) -> &Result<Selector<DomSelectors>, SelectorError> {
        if !self.compiled.contains_key(text) {
            let compiled = compile_selector(text);
            self.compiled.insert(text.to_string(), compiled);
        }
        &self.compiled[text]
    }
}
