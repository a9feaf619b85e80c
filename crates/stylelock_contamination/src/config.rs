use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{debug, trace};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use stylelock_core::STYLE_SUFFIXES;

#[derive(Debug, Clone, Parser)]
#[command(name = "check")]
#[command(about = "Check project stylesheets for contamination of shared library styles")]
pub struct Config {
    /// Root directory of the project (defaults to git root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Path to the checker config file (defaults to stylelock.json under the root)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Disable the on-disk selector cache for this run
    #[arg(long)]
    pub no_cache: bool,

    #[clap(skip)]
    pub options: CheckerOptions,
}

/// Checker configuration as spelled in `stylelock.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckerOptions {
    /// Whole-check switch; a disabled check always passes. Lets a project
    /// keep the CI invocation in place while rolling the rule out.
    pub enable: bool,
    /// Which class names may not be overridden.
    pub immutables: ImmutablesConfig,
    pub cache: CacheConfig,
    /// Module suffixes recognized as stylesheets; `None` means the defaults.
    pub suffixes: Option<Vec<String>>,
    /// Regex patterns for files the checker skips entirely. A rule matching
    /// third-party dependency directories is always added.
    pub exclude_files: Vec<String>,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        CheckerOptions {
            enable: true,
            immutables: ImmutablesConfig::default(),
            cache: CacheConfig::default(),
            suffixes: None,
            exclude_files: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImmutablesConfig {
    /// Library stylesheet files or directories whose classes are all protected.
    pub libs: Vec<String>,
    /// Explicitly protected class names, unioned into the final set.
    pub selectors: Vec<String>,
    /// Rules removing class names from the protected set.
    pub exclude_selectors: Vec<SelectorRule>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    pub enable: bool,
    pub cache_dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig { enable: true, cache_dir: PathBuf::from("node_modules/.stylelock-cache") }
    }
}

/// An exclusion rule is either an exact class name or a compiled pattern.
/// In the config file a pattern is spelled `/…/`; anything else matches
/// exactly.
#[derive(Debug, Clone)]
pub enum SelectorRule {
    Exact(String),
    Pattern(Regex),
}

impl SelectorRule {
    pub fn parse(raw: &str) -> Result<SelectorRule> {
        if raw.len() > 1
            && let Some(inner) = raw.strip_prefix('/').and_then(|r| r.strip_suffix('/'))
        {
            let re = Regex::new(inner)
                .with_context(|| format!("Invalid exclude selector pattern '{}'", raw))?;
            return Ok(SelectorRule::Pattern(re));
        }
        Ok(SelectorRule::Exact(raw.to_string()))
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            SelectorRule::Exact(name) => name == candidate,
            SelectorRule::Pattern(re) => re.is_match(candidate),
        }
    }
}

impl<'de> Deserialize<'de> for SelectorRule {
    fn deserialize<D>(deserializer: D) -> Result<SelectorRule, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        SelectorRule::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl Config {
    /// Resolve the root directory and load the config file.
    pub fn initialize(&mut self) -> Result<()> {
        let root = if let Some(r) = self.root.take() {
            debug!("Using provided root directory: {:?}", r);
            r.canonicalize().unwrap_or(r)
        } else {
            debug!("No root provided, searching for git root");
            find_git_root()?
        };

        self.options = load_checker_options(&root, self.config.as_deref())?;
        if self.no_cache {
            debug!("Cache disabled on the command line");
            self.options.cache.enable = false;
        }
        self.root = Some(root);
        Ok(())
    }

    pub fn root(&self) -> Result<&PathBuf> {
        self.root.as_ref().ok_or_else(|| anyhow!("Config not initialized"))
    }

    /// Recognized stylesheet suffixes, falling back to the defaults.
    pub fn suffixes(&self) -> Vec<String> {
        self.options
            .suffixes
            .clone()
            .unwrap_or_else(|| STYLE_SUFFIXES.iter().map(|s| s.to_string()).collect())
    }

    /// Compiled file exclusion patterns, always including the implicit
    /// third-party dependency rule.
    pub fn exclude_file_patterns(&self) -> Result<Vec<Regex>> {
        let mut patterns = Vec::with_capacity(self.options.exclude_files.len() + 1);
        for raw in &self.options.exclude_files {
            let re = Regex::new(raw)
                .with_context(|| format!("Invalid excludeFiles pattern '{}'", raw))?;
            patterns.push(re);
        }
        patterns.push(Regex::new(r"[\\/]node_modules[\\/]").expect("static pattern"));
        Ok(patterns)
    }
}

fn load_checker_options(root: &Path, explicit: Option<&Path>) -> Result<CheckerOptions> {
    let path = match explicit {
        Some(p) => {
            if p.is_absolute() { p.to_path_buf() } else { root.join(p) }
        }
        None => {
            let default = root.join("stylelock.json");
            if !default.exists() {
                debug!("No config file at {:?}, using defaults", default);
                return Ok(CheckerOptions::default());
            }
            default
        }
    };

    trace!("Reading checker config from {:?}", path);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

pub(crate) fn find_git_root() -> Result<PathBuf> {
    debug!("Searching for git root");
    let mut current_dir = env::current_dir()?;
    trace!("Starting search from: {:?}", current_dir);

    loop {
        let git_dir = current_dir.join(".git");
        trace!("Checking for .git at: {:?}", git_dir);
        if git_dir.exists() {
            debug!("Found git root at: {:?}", current_dir);
            return Ok(current_dir);
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => {
                debug!("Could not find .git directory in any parent folder");
                return Err(anyhow!("Could not find .git directory in any parent folder"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_selector_rule_exact() {
        let rule = SelectorRule::parse("btn").unwrap();
        assert!(rule.matches("btn"));
        assert!(!rule.matches("btn-primary"));
    }

    #[test]
    fn test_selector_rule_pattern() {
        let rule = SelectorRule::parse("/^el-/").unwrap();
        assert!(rule.matches("el-button"));
        assert!(!rule.matches("btn"));
    }

    #[test]
    fn test_selector_rule_lone_slash_is_exact() {
        let rule = SelectorRule::parse("/").unwrap();
        assert!(matches!(rule, SelectorRule::Exact(_)));
    }

    #[test]
    fn test_selector_rule_bad_pattern_errors() {
        assert!(SelectorRule::parse("/[/").is_err());
    }

    #[test]
    fn test_options_file_parsing() {
        let json = r#"
{
  "immutables": {
    "libs": ["src/styles"],
    "selectors": ["btn"],
    "excludeSelectors": ["card", "/^el-/"]
  },
  "cache": { "enable": false, "cacheDir": ".cache" },
  "excludeFiles": ["vendor"]
}
"#;
        let options: CheckerOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.immutables.libs, vec!["src/styles"]);
        assert_eq!(options.immutables.selectors, vec!["btn"]);
        assert_eq!(options.immutables.exclude_selectors.len(), 2);
        assert!(!options.cache.enable);
        assert_eq!(options.cache.cache_dir, PathBuf::from(".cache"));
        assert_eq!(options.exclude_files, vec!["vendor"]);
        assert!(options.suffixes.is_none());
    }

    #[test]
    fn test_options_defaults() {
        let options: CheckerOptions = serde_json::from_str("{}").unwrap();
        assert!(options.immutables.libs.is_empty());
        assert!(options.cache.enable);
        assert_eq!(options.cache.cache_dir, PathBuf::from("node_modules/.stylelock-cache"));
    }

    #[test]
    fn test_load_checker_options_missing_default_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let options = load_checker_options(temp_dir.path(), None).unwrap();
        assert!(options.immutables.libs.is_empty());
    }

    #[test]
    fn test_load_checker_options_missing_explicit_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let explicit = temp_dir.path().join("nope.json");
        assert!(load_checker_options(temp_dir.path(), Some(&explicit)).is_err());
    }

    #[test]
    fn test_exclude_file_patterns_include_node_modules() {
        let cfg = Config { root: None, config: None, no_cache: false, options: Default::default() };
        let patterns = cfg.exclude_file_patterns().unwrap();
        assert!(patterns.iter().any(|re| re.is_match("/a/node_modules/b.css")));
    }
}
