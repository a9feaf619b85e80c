use anyhow::{Result, anyhow};
use cssparser::ToCss as BasicToCss;
use lightningcss::selector::{Combinator, Component, Selector};
use lightningcss::stylesheet::PrinterOptions;
use lightningcss::traits::ToCss;

/// Kind of a single selector component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Class,
    Id,
    Tag,
    PseudoClass,
    PseudoElement,
    Attribute,
    Combinator,
    Other,
}

/// One typed component of a selector group, e.g. the `.btn` in `.btn:hover`.
#[derive(Debug, Clone)]
pub struct SelectorComponent {
    pub kind: ComponentKind,
    pub value: String,
}

/// Flatten a selector group into its typed components, descending into
/// functional pseudo-classes (`:not()`, `:is()`, `:where()`, `:has()`),
/// `::slotted()` and `:host()` arguments. Class names inside nested
/// selector lists must not be missed when indexing library files.
pub fn flatten_components(selector: &Selector) -> Vec<SelectorComponent> {
    let mut components = Vec::new();
    collect_components(selector, &mut components);
    components
}

/// Whether the group has a class component at its top level (components
/// inside functional pseudo-classes do not count).
pub fn has_top_level_class(selector: &Selector) -> bool {
    selector.iter_raw_match_order().any(|c| matches!(c, Component::Class(_)))
}

/// Canonical text form of one selector group.
pub fn selector_text(selector: &Selector) -> Result<String> {
    ToCss::to_css_string(selector, PrinterOptions::default())
        .map_err(|e| anyhow!("Failed to serialize selector: {}", e))
}

/// Text of a nested selector flattened against its parent: every nesting
/// selector (`&`) is substituted with the parent text. A nested selector
/// as parsed always carries an explicit `&` (relative forms get a leading
/// `& ` descendant), but a missing one falls back to descendant placement.
pub fn nest_selector_text(parent: &str, child: &str) -> String {
    if child.contains('&') {
        child.replace('&', parent)
    } else {
        format!("{} {}", parent, child)
    }
}

fn collect_components(selector: &Selector, out: &mut Vec<SelectorComponent>) {
    for component in selector.iter_raw_match_order() {
        match component {
            Component::Class(name) => {
                out.push(SelectorComponent { kind: ComponentKind::Class, value: name.0.to_string() });
            }
            Component::ID(name) => {
                out.push(SelectorComponent { kind: ComponentKind::Id, value: name.0.to_string() });
            }
            Component::LocalName(local) => {
                out.push(SelectorComponent {
                    kind: ComponentKind::Tag,
                    value: local.name.0.to_string(),
                });
            }
            Component::Combinator(c) => {
                out.push(SelectorComponent {
                    kind: ComponentKind::Combinator,
                    value: combinator_text(*c).to_string(),
                });
            }
            Component::Negation(list)
            | Component::Is(list)
            | Component::Where(list)
            | Component::Has(list) => {
                for inner in list.iter() {
                    collect_components(inner, out);
                }
            }
            Component::Any(_, list) => {
                for inner in list.iter() {
                    collect_components(inner, out);
                }
            }
            Component::Host(Some(inner)) => collect_components(inner, out),
            Component::Slotted(inner) => collect_components(inner, out),
            Component::NonTSPseudoClass(pc) => {
                out.push(SelectorComponent {
                    kind: ComponentKind::PseudoClass,
                    value: BasicToCss::to_css_string(pc),
                });
            }
            Component::PseudoElement(pe) => {
                out.push(SelectorComponent {
                    kind: ComponentKind::PseudoElement,
                    value: BasicToCss::to_css_string(pe),
                });
            }
            Component::AttributeInNoNamespaceExists { local_name, .. } => {
                out.push(SelectorComponent {
                    kind: ComponentKind::Attribute,
                    value: local_name.0.to_string(),
                });
            }
            Component::AttributeInNoNamespace { local_name, .. } => {
                out.push(SelectorComponent {
                    kind: ComponentKind::Attribute,
                    value: local_name.0.to_string(),
                });
            }
            Component::Nesting => {
                out.push(SelectorComponent { kind: ComponentKind::Other, value: "&".to_string() });
            }
            // Structural components (universal, namespaces, nth-child and
            // friends) carry no class names and are not modeled.
            _ => {}
        }
    }
}

fn combinator_text(combinator: Combinator) -> &'static str {
    match combinator {
        Combinator::Descendant => " ",
        Combinator::Child => ">",
        Combinator::NextSibling => "+",
        Combinator::LaterSibling => "~",
        _ => "",
    }
}
