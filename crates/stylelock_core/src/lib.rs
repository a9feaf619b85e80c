//! Core utilities for stylelock checks.
//!
//! This crate provides shared functionality for analyzing project
//! stylesheets, including:
//! - Parsing stylesheets of different dialects into rule trees
//! - Walking style rules across at-rule nesting (keyframes excluded)
//! - A selector grammar adapter exposing typed selector components
//! - Extracting every class name that appears in a stylesheet
//! - Resolving module identifiers (plain stylesheets, Vue style blocks)

mod constants;
mod dialect;
mod extract;
mod module_id;
mod parser;
mod selector;

// Re-export public API
pub use constants::STYLE_SUFFIXES;
pub use dialect::Dialect;
pub use extract::{class_names_in, extract_class_names};
pub use module_id::{ModuleInfo, parse_module_id};
pub use parser::{for_each_style_rule, import_urls, parse_stylesheet};
pub use selector::{
    ComponentKind, SelectorComponent, flatten_components, has_top_level_class, nest_selector_text,
    selector_text,
};
