use anyhow::Result;
use lightningcss::rules::style::StyleRule;
use lightningcss::rules::{CssRule, CssRuleList};
use log::{debug, trace};
use std::collections::HashSet;

use stylelock_core::{
    ComponentKind, Dialect, flatten_components, has_top_level_class, nest_selector_text,
    parse_stylesheet, selector_text,
};

/// Classify every selector group of a candidate stylesheet against the
/// immutable set and return the distinct dirty group texts in discovery
/// order.
///
/// Nested rules are classified as the selectors they flatten to: each
/// group is combined with every ancestor group (`&` substituted), so an
/// unprotected class anywhere in the chain scopes the whole rule. A
/// flattened group is dirty when it has at least one top-level class
/// component and every class name in its chain is protected: such a rule
/// has no local class scoping it and overrides the shared style everywhere
/// the protected classes appear. Parse failures propagate; a candidate
/// that does not parse is a build error either way.
pub fn detect_dirty_selectors(
    content: &str,
    file: &str,
    dialect: Dialect,
    immutable: &HashSet<String>,
) -> Result<Vec<String>> {
    let sheet = parse_stylesheet(content, file, dialect)?;

    let mut walk = Walk {
        immutable,
        file,
        dirty: Vec::new(),
        seen: HashSet::new(),
        failure: None,
    };
    walk.rules(&sheet.rules, &[]);

    if let Some(e) = walk.failure {
        return Err(e);
    }
    debug!("Found {} dirty selector groups in {}", walk.dirty.len(), file);
    Ok(walk.dirty)
}

/// One selector group flattened against its ancestor rules, carrying what
/// the dirty predicate needs about the whole chain.
#[derive(Debug, Clone)]
struct FlatGroup {
    text: String,
    has_class: bool,
    classes: Vec<String>,
}

struct Walk<'s> {
    immutable: &'s HashSet<String>,
    file: &'s str,
    dirty: Vec<String>,
    seen: HashSet<String>,
    failure: Option<anyhow::Error>,
}

impl Walk<'_> {
    fn rules(&mut self, rules: &CssRuleList, ancestors: &[FlatGroup]) {
        for rule in &rules.0 {
            match rule {
                CssRule::Style(style) => self.style_rule(style, ancestors),
                CssRule::Nesting(nesting) => self.style_rule(&nesting.style, ancestors),
                CssRule::Media(media) => self.rules(&media.rules, ancestors),
                CssRule::Supports(supports) => self.rules(&supports.rules, ancestors),
                CssRule::Container(container) => self.rules(&container.rules, ancestors),
                CssRule::LayerBlock(layer) => self.rules(&layer.rules, ancestors),
                CssRule::MozDocument(doc) => self.rules(&doc.rules, ancestors),
                CssRule::Scope(scope) => self.rules(&scope.rules, ancestors),
                CssRule::StartingStyle(starting) => self.rules(&starting.rules, ancestors),
                // Keyframe stage selectors are animation stage names, not
                // style selectors.
                CssRule::Keyframes(_) => {}
                _ => {}
            }
        }
    }

    fn style_rule(&mut self, style: &StyleRule, ancestors: &[FlatGroup]) {
        let mut flat: Vec<FlatGroup> = Vec::new();
        for group in &style.selectors.0 {
            let text = match selector_text(group) {
                Ok(text) => text,
                Err(e) => {
                    if self.failure.is_none() {
                        self.failure = Some(e);
                    }
                    continue;
                }
            };
            let has_class = has_top_level_class(group);
            let classes: Vec<String> = flatten_components(group)
                .into_iter()
                .filter(|c| c.kind == ComponentKind::Class)
                .map(|c| c.value)
                .collect();

            if ancestors.is_empty() {
                flat.push(FlatGroup { text, has_class, classes });
            } else {
                for ancestor in ancestors {
                    let mut chain = ancestor.classes.clone();
                    chain.extend(classes.iter().cloned());
                    flat.push(FlatGroup {
                        text: nest_selector_text(&ancestor.text, &text),
                        has_class: has_class || ancestor.has_class,
                        classes: chain,
                    });
                }
            }
        }

        for group in &flat {
            if !group.has_class {
                // No top-level class anywhere in the chain; tag and id
                // selectors are outside the protected set's reach.
                continue;
            }
            if group.classes.iter().all(|c| self.immutable.contains(c)) {
                trace!("Dirty selector group in {}: {}", self.file, group.text);
                if self.seen.insert(group.text.clone()) {
                    self.dirty.push(group.text.clone());
                }
            }
        }

        self.rules(&style.rules, &flat);
    }
}
