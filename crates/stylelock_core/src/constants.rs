//! Constants for stylesheet module suffixes.
//!
//! Suffixes carry their leading dot because module identifiers are matched
//! as strings, not parsed as paths (a Vue style block identifier such as
//! `App.vue?type=style&lang.scss` has no meaningful filesystem extension).

/// Suffixes recognized as stylesheet modules by default
pub const STYLE_SUFFIXES: &[&str] = &[
    ".css",     // plain CSS
    ".pcss",    // PostCSS
    ".postcss", // PostCSS (long form)
    ".less",    // Less
    ".scss",    // SCSS
    ".sass",    // Sass (indented)
];
