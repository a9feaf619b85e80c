use anyhow::{Context, Result, bail};
use ignore::WalkBuilder;
use log::{debug, info, trace};
use rayon::prelude::*;
use regex::Regex;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use stylelock_core::{Dialect, parse_module_id, parse_stylesheet};

use crate::{
    cache::SelectorCache,
    config::Config,
    detector::detect_dirty_selectors,
    index::{build_immutable_index, local_import_targets, resolve_path},
    types::{CheckResult, FileReport},
};

/// Run the contamination check over a whole project: build the immutable
/// selector index once, then check every candidate stylesheet module
/// against it.
pub fn run_contamination_check(mut cfg: Config) -> Result<CheckResult> {
    info!("Starting style contamination check");

    cfg.initialize()?;
    if !cfg.options.enable {
        info!("Contamination check is disabled by configuration");
        return Ok(CheckResult { reports: Vec::new(), files_checked: 0, immutable_classes: 0 });
    }
    let root = cfg.root()?.clone();
    info!("Using root directory: {}", root.display());

    let suffixes = cfg.suffixes();
    let exclude_files = cfg.exclude_file_patterns()?;

    // One cache per build: loaded before index construction, stored once
    // afterwards. Per-file extraction failures still leave a persistable
    // cache behind.
    let cache_dir = resolve_path(&root, &cfg.options.cache.cache_dir);
    let cache = SelectorCache::new(cache_dir);
    let cache_enabled = cfg.options.cache.enable;
    if cache_enabled {
        cache.load()?;
        debug!("Loaded {} cache entries", cache.len());
    }

    let immutable = build_immutable_index(&root, &cfg.options.immutables, &suffixes, &cache)?;
    if cache_enabled {
        cache.store()?;
    }
    info!("Immutable selector set contains {} class names", immutable.len());

    let lib_roots: Vec<PathBuf> = cfg
        .options
        .immutables
        .libs
        .iter()
        .map(|lib| resolve_path(&root, Path::new(lib)))
        .collect();

    let candidates = collect_candidates(&root, &suffixes, &exclude_files, &lib_roots)?;
    info!("Checking {} candidate stylesheet modules", candidates.len());

    let reports: Vec<Option<FileReport>> = candidates
        .par_iter()
        .map(|file| check_candidate(&root, file, &suffixes, &immutable))
        .collect::<Result<Vec<Option<FileReport>>>>()?;
    let reports: Vec<FileReport> = reports.into_iter().flatten().collect();

    info!("Contamination check complete. {} files contaminated", reports.len());
    Ok(CheckResult { reports, files_checked: candidates.len(), immutable_classes: immutable.len() })
}

fn check_candidate(
    root: &Path,
    file: &Path,
    suffixes: &[String],
    immutable: &HashSet<String>,
) -> Result<Option<FileReport>> {
    let id = file.to_string_lossy();
    let Some(module) = parse_module_id(&id, suffixes) else {
        return Ok(None);
    };
    if module.scoped {
        trace!("Skipping scoped module: {}", id);
        return Ok(None);
    }

    let mut dirty: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    detect_through_imports(
        file,
        &module.filename,
        module.dialect,
        immutable,
        &mut visited,
        &mut seen,
        &mut dirty,
    )?;
    if dirty.is_empty() {
        return Ok(None);
    }

    let rel = file.strip_prefix(root).unwrap_or(file).to_string_lossy().to_string();
    Ok(Some(FileReport { file: rel, dirty_selectors: dirty }))
}

/// Check a candidate and, transitively, every local stylesheet it
/// `@import`s: imported rules land in the importing module, so their dirty
/// selectors count against it. Remote urls are skipped; a missing or
/// unparsable import target is a build error like any other candidate
/// failure.
fn detect_through_imports(
    file: &Path,
    display_name: &str,
    dialect: Dialect,
    immutable: &HashSet<String>,
    visited: &mut HashSet<PathBuf>,
    seen: &mut HashSet<String>,
    dirty: &mut Vec<String>,
) -> Result<()> {
    if !visited.insert(file.canonicalize().unwrap_or_else(|_| file.to_path_buf())) {
        return Ok(());
    }

    let content =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    // Trim before parsing to cut down the work for the rule tree.
    let content = content.trim();
    for selector in detect_dirty_selectors(content, display_name, dialect, immutable)? {
        if seen.insert(selector.clone()) {
            dirty.push(selector);
        }
    }

    let sheet = parse_stylesheet(content, display_name, dialect)?;
    for target in local_import_targets(&sheet.rules, file) {
        if !target.is_file() {
            bail!("Import target {} of {} does not exist", target.display(), file.display());
        }
        let name = target.to_string_lossy().to_string();
        detect_through_imports(
            &target,
            &name,
            Dialect::for_path(&target),
            immutable,
            visited,
            seen,
            dirty,
        )?;
    }
    Ok(())
}

/// Collect candidate stylesheet modules under the root, skipping excluded
/// files and the configured library stylesheets themselves.
fn collect_candidates(
    root: &Path,
    suffixes: &[String],
    exclude_files: &[Regex],
    lib_roots: &[PathBuf],
) -> Result<Vec<PathBuf>> {
    debug!("Walking directory tree from root: {}", root.display());
    let mut files: Vec<PathBuf> = Vec::new();
    let walker = WalkBuilder::new(root).hidden(false).ignore(true).git_ignore(true).build();

    for res in walker {
        let dent = res?;
        let p = dent.path();
        if !p.is_file() {
            continue;
        }

        let path_str = p.to_string_lossy();
        if !suffixes.iter().any(|suffix| path_str.ends_with(suffix.as_str())) {
            continue;
        }
        if exclude_files.iter().any(|re| re.is_match(&path_str)) {
            trace!("Skipping excluded file: {}", path_str);
            continue;
        }
        if lib_roots.iter().any(|lib| p.starts_with(lib)) {
            trace!("Skipping library stylesheet: {}", path_str);
            continue;
        }

        files.push(p.to_path_buf());
    }

    debug!("Collected {} candidate files", files.len());
    Ok(files)
}
