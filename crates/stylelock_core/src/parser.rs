use anyhow::{Result, anyhow};
use lightningcss::rules::{CssRule, CssRuleList};
use lightningcss::rules::style::StyleRule;
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use log::trace;

use crate::dialect::Dialect;

/// Parse raw stylesheet text into a rule tree.
///
/// Parse failures carry the file identity so the caller can surface a
/// useful build error.
pub fn parse_stylesheet<'i>(
    content: &'i str,
    file: &str,
    dialect: Dialect,
) -> Result<StyleSheet<'i>> {
    trace!("Parsing {} as {}", file, dialect);
    let options = ParserOptions {
        filename: file.to_string(),
        error_recovery: dialect.error_recovery(),
        ..ParserOptions::default()
    };
    StyleSheet::parse(content, options)
        .map_err(|e| anyhow!("Failed to parse {}: {}", file, e))
}

/// Invoke `f` for every style rule in the tree, descending through
/// grouping at-rules (`@media`, `@supports`, `@layer`, `@container`,
/// `@scope`) and nested style rules.
///
/// Keyframes blocks are not visited: their stage selectors (`from`, `to`,
/// percentages) are animation stage names, not style selectors.
pub fn for_each_style_rule<'a, 'i, F>(rules: &'a CssRuleList<'i>, f: &mut F)
where
    F: FnMut(&'a StyleRule<'i>),
{
    for rule in &rules.0 {
        match rule {
            CssRule::Style(style) => {
                f(style);
                for_each_style_rule(&style.rules, f);
            }
            CssRule::Nesting(nesting) => {
                f(&nesting.style);
                for_each_style_rule(&nesting.style.rules, f);
            }
            CssRule::Media(media) => for_each_style_rule(&media.rules, f),
            CssRule::Supports(supports) => for_each_style_rule(&supports.rules, f),
            CssRule::Container(container) => for_each_style_rule(&container.rules, f),
            CssRule::LayerBlock(layer) => for_each_style_rule(&layer.rules, f),
            CssRule::MozDocument(doc) => for_each_style_rule(&doc.rules, f),
            CssRule::Scope(scope) => for_each_style_rule(&scope.rules, f),
            CssRule::StartingStyle(starting) => for_each_style_rule(&starting.rules, f),
            CssRule::Keyframes(_) => {}
            // Unknown at-rules (vendor-specific blocks and whatever a
            // preprocessor dialect left behind) keep their body as raw
            // tokens; there are no rule-level selectors to walk.
            CssRule::Unknown(_) => {}
            _ => {}
        }
    }
}

/// Urls of every `@import` rule in the tree, in source order. Imports are
/// only valid before other rules, so a top-level scan is enough.
pub fn import_urls(rules: &CssRuleList) -> Vec<String> {
    rules
        .0
        .iter()
        .filter_map(|rule| match rule {
            CssRule::Import(import) => Some(import.url.to_string()),
            _ => None,
        })
        .collect()
}
