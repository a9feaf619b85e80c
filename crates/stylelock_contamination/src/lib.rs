//! Style contamination detection for project stylesheets.
//!
//! A stylesheet rule whose selector targets only class names belonging to
//! shared library styles, with no locally-introduced class to scope it,
//! silently overrides the shared style everywhere those classes appear.
//! This crate builds the set of protected ("immutable") class names from
//! configured library stylesheets, caching extraction results per file by
//! content hash, and flags every candidate selector group made up entirely
//! of protected classes.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use stylelock_contamination::{Config, run_contamination_check};
//! use std::io::{BufWriter, Write};
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = Config {
//!     root: Some(std::path::PathBuf::from("/path/to/project")),
//!     config: None,
//!     no_cache: false,
//!     options: Default::default(),
//! };
//!
//! let result = run_contamination_check(cfg)?;
//!
//! if !result.reports.is_empty() {
//!     // Use buffered output for better performance
//!     let mut stdout = BufWriter::new(std::io::stdout());
//!     stylelock_contamination::print_contamination_report(&mut stdout, &result.reports)?;
//!     stdout.flush()?;
//! }
//! # Ok(())
//! # }
//! ```

mod cache;
mod checker;
mod config;
mod detector;
mod index;
mod reporter;
mod types;

// Re-export public API
pub use cache::SelectorCache;
pub use checker::run_contamination_check;
pub use config::{CacheConfig, CheckerOptions, Config, ImmutablesConfig, SelectorRule};
pub use detector::detect_dirty_selectors;
pub use index::build_immutable_index;
pub use reporter::{print_clean_message, print_contamination_report};
pub use types::{CheckResult, FileReport};
