//! Rule-tree ingestion built on cssparser.
//!
//! One parser type handles both the top level and the inside of grouping
//! constructs, recursing through nested conditional blocks. Selector lists
//! and declaration values are kept as raw text: downstream passes (selector
//! splitting, `var()` scanning, matched-value reporting) need the source
//! spelling, not a typed value model.

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, StyleSheetParser,
};

use super::{Declaration, GroupKind, GroupRule, RuleNode, StyleRule};

/// Parse CSS text into a rule tree. Lenient: anything unparseable is dropped.
pub(super) fn parse_rule_tree(css: &str) -> Vec<RuleNode> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut rules = Vec::new();

    let mut rule_parser = RuleTreeParser { rules: &mut rules };
    for result in StyleSheetParser::new(&mut parser, &mut rule_parser) {
        // Ignore errors - lenient parsing
        let _ = result;
    }

    rules
}

/// Prelude of a recognized at-rule.
pub(super) enum AtPrelude {
    /// A grouping construct with its raw condition text.
    Group(GroupKind, String),
}

/// Parser for rules at the top level and inside grouping constructs.
struct RuleTreeParser<'a> {
    rules: &'a mut Vec<RuleNode>,
}

impl<'i> AtRuleParser<'i> for RuleTreeParser<'_> {
    type Prelude = AtPrelude;
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let kind = if name.eq_ignore_ascii_case("media") {
            GroupKind::Media
        } else if name.eq_ignore_ascii_case("supports") {
            GroupKind::Supports
        } else if name.eq_ignore_ascii_case("layer") {
            GroupKind::Layer
        } else if name.eq_ignore_ascii_case("container") {
            GroupKind::Container
        } else {
            // @font-face, @keyframes, @import, ... carry no style rules the
            // inspector cares about; skip them wholesale.
            return Err(input.new_custom_error(()));
        };

        let start = input.position();
        while input.next().is_ok() {}
        let condition = input.slice_from(start).trim().to_string();

        Ok(AtPrelude::Group(kind, condition))
    }

    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        // `@layer a, b;` declares ordering without containing rules.
        match prelude {
            AtPrelude::Group(GroupKind::Layer, _) => Ok(()),
            AtPrelude::Group(..) => Err(()),
        }
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        let AtPrelude::Group(kind, condition) = prelude;

        let mut nested = Vec::new();
        let mut nested_parser = RuleTreeParser { rules: &mut nested };
        for result in RuleBodyParser::new(input, &mut nested_parser) {
            // Ignore errors - lenient parsing
            let _ = result;
        }

        self.rules.push(RuleNode::Group(GroupRule {
            kind,
            condition,
            rules: nested,
        }));

        Ok(())
    }
}

impl<'i> QualifiedRuleParser<'i> for RuleTreeParser<'_> {
    type Prelude = String;
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        // Keep the selector list as raw text; splitting and compilation
        // happen per analysis pass, where failures stay per-selector.
        let start = input.position();
        while input.next().is_ok() {}
        let selector_text = input.slice_from(start).trim().to_string();
        if selector_text.is_empty() {
            return Err(input.new_custom_error(()));
        }
        Ok(selector_text)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let mut declarations = Vec::new();
        let mut decl_parser = DeclarationBlockParser {
            declarations: &mut declarations,
        };

        for result in RuleBodyParser::new(input, &mut decl_parser) {
            // Ignore errors - lenient parsing
            let _ = result;
        }

        self.rules.push(RuleNode::Style(StyleRule {
            selector_text: prelude,
            declarations,
        }));

        Ok(())
    }
}

impl<'i> DeclarationParser<'i> for RuleTreeParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        _name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        // Declarations directly inside grouping constructs are not valid in
        // the rule trees the host exposes.
        Err(input.new_custom_error(()))
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for RuleTreeParser<'_> {
    fn parse_declarations(&self) -> bool {
        false
    }
    fn parse_qualified(&self) -> bool {
        true
    }
}

/// Parser for the inside of a declaration block.
struct DeclarationBlockParser<'a> {
    declarations: &'a mut Vec<Declaration>,
}

impl<'i> AtRuleParser<'i> for DeclarationBlockParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for DeclarationBlockParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> DeclarationParser<'i> for DeclarationBlockParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let start = input.position();
        while input.next().is_ok() {}
        let raw = input.slice_from(start);
        let (value, important) = split_important(raw);

        self.declarations.push(Declaration {
            property: name.to_string(),
            value: value.to_string(),
            important,
        });

        Ok(())
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for DeclarationBlockParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Split a raw declaration value into (value, important).
fn split_important(raw: &str) -> (&str, bool) {
    let trimmed = raw.trim();
    const MARKER: &str = "important";
    if trimmed.len() > MARKER.len() && trimmed.is_char_boundary(trimmed.len() - MARKER.len()) {
        let (head, tail) = trimmed.split_at(trimmed.len() - MARKER.len());
        if tail.eq_ignore_ascii_case(MARKER) {
            if let Some(stripped) = head.trim_end().strip_suffix('!') {
                return (stripped.trim_end(), true);
            }
        }
    }
    (trimmed, false)
}

#[cfg(test)]
mod tests {
    use super::super::{SheetMeta, StyleSheet};
    use super::*;

    fn parse(css: &str) -> Vec<RuleNode> {
        parse_rule_tree(css)
    }

    fn leaf(node: &RuleNode) -> &StyleRule {
        match node {
            RuleNode::Style(rule) => rule,
            RuleNode::Group(_) => panic!("expected leaf style rule"),
        }
    }

    #[test]
    fn simple_rules_keep_selector_text() {
        let rules = parse(".msg { color: red; } div > span { display: none; }");
        assert_eq!(rules.len(), 2);
        assert_eq!(leaf(&rules[0]).selector_text, ".msg");
        assert_eq!(leaf(&rules[1]).selector_text, "div > span");
    }

    #[test]
    fn declarations_keep_raw_values() {
        let rules = parse(".msg { color: var(--accent, #fff); margin: 0 auto; }");
        let decls = &leaf(&rules[0]).declarations;
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].property, "color");
        assert_eq!(decls[0].value, "var(--accent, #fff)");
        assert_eq!(decls[1].value, "0 auto");
    }

    #[test]
    fn important_is_split_off() {
        let rules = parse(".msg { color: red !important; opacity: 1 ! IMPORTANT ; }");
        let decls = &leaf(&rules[0]).declarations;
        assert_eq!(decls[0].value, "red");
        assert!(decls[0].important);
        assert_eq!(decls[1].value, "1");
        assert!(decls[1].important);
    }

    #[test]
    fn custom_properties_are_declarations() {
        let rules = parse(":root { --accent: #ff0000; }");
        let decls = &leaf(&rules[0]).declarations;
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].property, "--accent");
        assert_eq!(decls[0].value, "#ff0000");
        assert!(decls[0].is_custom_property());
    }

    #[test]
    fn media_blocks_become_groups() {
        let rules = parse("@media (max-width: 600px) { .msg { color: red; } }");
        assert_eq!(rules.len(), 1);
        match &rules[0] {
            RuleNode::Group(group) => {
                assert_eq!(group.kind, GroupKind::Media);
                assert_eq!(group.condition, "(max-width: 600px)");
                assert_eq!(group.rules.len(), 1);
            }
            RuleNode::Style(_) => panic!("expected group"),
        }
    }

    #[test]
    fn groups_nest() {
        let rules = parse(
            "@media screen { @supports (display: grid) { .grid { display: grid; } } }",
        );
        let outer = match &rules[0] {
            RuleNode::Group(g) => g,
            _ => panic!("expected group"),
        };
        let inner = match &outer.rules[0] {
            RuleNode::Group(g) => g,
            _ => panic!("expected nested group"),
        };
        assert_eq!(inner.kind, GroupKind::Supports);
        assert_eq!(inner.rules.len(), 1);
    }

    #[test]
    fn layer_statement_is_skipped_without_error() {
        let rules = parse("@layer base, theme; .msg { color: red; }");
        assert_eq!(rules.len(), 1);
        assert_eq!(leaf(&rules[0]).selector_text, ".msg");
    }

    #[test]
    fn layer_block_is_a_group() {
        let rules = parse("@layer theme { .msg { color: red; } }");
        match &rules[0] {
            RuleNode::Group(group) => {
                assert_eq!(group.kind, GroupKind::Layer);
                assert_eq!(group.condition, "theme");
            }
            RuleNode::Style(_) => panic!("expected group"),
        }
    }

    #[test]
    fn unknown_at_rules_are_skipped() {
        let css = "@font-face { font-family: X; src: url(x.woff); } .msg { color: red; }";
        let sheet = StyleSheet::parse(SheetMeta::new("t"), css);
        assert_eq!(sheet.rule_count(), 1);
    }

    #[test]
    fn split_important_handles_spacing_and_case() {
        assert_eq!(split_important("red !important"), ("red", true));
        assert_eq!(split_important("red ! Important"), ("red", true));
        assert_eq!(split_important("red"), ("red", false));
        assert_eq!(split_important("important"), ("important", false));
        assert_eq!(split_important("\"!important\""), ("\"!important\"", false));
    }
}
