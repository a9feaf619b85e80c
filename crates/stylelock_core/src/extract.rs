use anyhow::Result;
use lightningcss::rules::CssRuleList;
use log::debug;
use std::collections::HashSet;

use crate::dialect::Dialect;
use crate::parser::{for_each_style_rule, parse_stylesheet};
use crate::selector::{ComponentKind, flatten_components};

/// Collect every class name that appears anywhere in a stylesheet.
///
/// Walks every style rule regardless of at-rule nesting and every component
/// of every selector group, including those inside functional
/// pseudo-classes. This is deliberately broader than the contamination
/// walk: a class name nested inside `:not()` in a library file is still a
/// protected class. Duplicates collapse; order is irrelevant.
pub fn extract_class_names(
    content: &str,
    file: &str,
    dialect: Dialect,
) -> Result<HashSet<String>> {
    let sheet = parse_stylesheet(content, file, dialect)?;
    let names = class_names_in(&sheet.rules);
    debug!("Extracted {} class names from {}", names.len(), file);
    Ok(names)
}

/// Same walk over an already parsed rule tree.
pub fn class_names_in(rules: &CssRuleList) -> HashSet<String> {
    let mut names: HashSet<String> = HashSet::new();
    for_each_style_rule(rules, &mut |rule| {
        for selector in &rule.selectors.0 {
            for component in flatten_components(selector) {
                if component.kind == ComponentKind::Class {
                    names.insert(component.value);
                }
            }
        }
    });
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: HashSet<String>) -> Vec<String> {
        let mut v: Vec<String> = names.into_iter().collect();
        v.sort();
        v
    }

    #[test]
    fn test_collects_all_classes() {
        let css = ".btn { color: red } .card .title { color: blue }";
        let names = extract_class_names(css, "lib.css", Dialect::Css).unwrap();
        assert_eq!(sorted(names), vec!["btn", "card", "title"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let css = ".btn { color: red } .btn:hover { color: blue }";
        let names = extract_class_names(css, "lib.css", Dialect::Css).unwrap();
        assert_eq!(sorted(names), vec!["btn"]);
    }

    #[test]
    fn test_classes_inside_at_rules() {
        let css = "@media (min-width: 100px) { .wide { width: 100% } }";
        let names = extract_class_names(css, "lib.css", Dialect::Css).unwrap();
        assert_eq!(sorted(names), vec!["wide"]);
    }

    #[test]
    fn test_classes_inside_pseudo_selectors() {
        let css = ".btn:not(.disabled) { color: red }";
        let names = extract_class_names(css, "lib.css", Dialect::Css).unwrap();
        assert_eq!(sorted(names), vec!["btn", "disabled"]);
    }

    #[test]
    fn test_keyframes_contribute_nothing() {
        let css = "@keyframes fade { from { opacity: 0 } to { opacity: 1 } }";
        let names = extract_class_names(css, "lib.css", Dialect::Css).unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_non_class_selectors_ignored() {
        let css = "div { color: red } #main { color: blue } [hidden] { display: none }";
        let names = extract_class_names(css, "lib.css", Dialect::Css).unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_nested_rules() {
        let css = ".card { .title { color: red } }";
        let names = extract_class_names(css, "lib.css", Dialect::Css).unwrap();
        assert_eq!(sorted(names), vec!["card", "title"]);
    }

    #[test]
    fn test_parse_error_propagates() {
        assert!(extract_class_names(". { color: red }", "broken.css", Dialect::Css).is_err());
    }
}
