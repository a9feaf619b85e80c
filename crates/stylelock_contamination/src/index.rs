use anyhow::{Context, Result, bail};
use ignore::WalkBuilder;
use lightningcss::rules::CssRuleList;
use log::{debug, info, trace, warn};
use rayon::prelude::*;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use stylelock_core::{Dialect, class_names_in, import_urls, parse_stylesheet};

use crate::cache::SelectorCache;
use crate::config::{ImmutablesConfig, SelectorRule};

/// Build the immutable selector set: every class name appearing in the
/// configured library stylesheets (minus the exclusion rules), unioned with
/// the explicitly configured class names. Library files are indexed to
/// their `@import` closure: a class reachable only through an import is
/// still a protected class, even when the imported file lives outside the
/// configured library paths.
///
/// Files are extracted in parallel with per-file failure isolation: an
/// unreadable or unparsable file is logged and contributes no class names,
/// it never aborts the batch. A configured library path that does not
/// exist is a configuration error and fails fast. The caller persists the
/// cache afterwards.
pub fn build_immutable_index(
    root: &Path,
    immutables: &ImmutablesConfig,
    suffixes: &[String],
    cache: &SelectorCache,
) -> Result<HashSet<String>> {
    let mut frontier: Vec<PathBuf> = Vec::new();
    for lib in &immutables.libs {
        let path = resolve_path(root, Path::new(lib));
        frontier.extend(collect_style_files(&path, suffixes)?);
    }
    info!("Indexing {} library stylesheet files", frontier.len());

    let mut set: HashSet<String> = immutables.selectors.iter().cloned().collect();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    while !frontier.is_empty() {
        frontier.retain(|file| {
            visited.insert(file.canonicalize().unwrap_or_else(|_| file.clone()))
        });

        let per_file: Vec<(Vec<String>, Vec<PathBuf>)> = frontier
            .par_iter()
            .map(|file| {
                match index_library_file(file, &immutables.exclude_selectors, cache) {
                    Ok(result) => result,
                    Err(e) => {
                        warn!("Skipping library file {}: {}", file.display(), e);
                        (Vec::new(), Vec::new())
                    }
                }
            })
            .collect();

        frontier = Vec::new();
        for (class_names, imports) in per_file {
            set.extend(class_names);
            frontier.extend(imports);
        }
    }

    debug!("Immutable selector set contains {} class names", set.len());
    Ok(set)
}

fn index_library_file(
    file: &Path,
    exclude: &[SelectorRule],
    cache: &SelectorCache,
) -> Result<(Vec<String>, Vec<PathBuf>)> {
    if let Some(cached) = cache.get(file) {
        trace!("Cache hit for {}", file.display());
        return Ok(cached);
    }

    trace!("Extracting class names from {}", file.display());
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let sheet = parse_stylesheet(&content, &file.to_string_lossy(), Dialect::for_path(file))?;

    let class_names: Vec<String> = class_names_in(&sheet.rules)
        .into_iter()
        .filter(|name| !exclude.iter().any(|rule| rule.matches(name)))
        .collect();

    let mut imports: Vec<PathBuf> = Vec::new();
    for target in local_import_targets(&sheet.rules, file) {
        if target.is_file() {
            imports.push(target);
        } else {
            warn!("Import target {} of {} does not exist", target.display(), file.display());
        }
    }

    cache.insert(file, class_names.clone(), imports.clone())?;
    Ok((class_names, imports))
}

/// Resolve the local `@import` targets of a parsed stylesheet against the
/// importing file. Remote urls cannot be resolved and are skipped.
pub(crate) fn local_import_targets(rules: &CssRuleList, file: &Path) -> Vec<PathBuf> {
    let parent = file.parent().unwrap_or_else(|| Path::new("."));
    import_urls(rules)
        .into_iter()
        .filter(|url| {
            if is_remote_url(url) {
                trace!("Ignoring remote import {} in {}", url, file.display());
                return false;
            }
            true
        })
        .map(|url| parent.join(url))
        .collect()
}

fn is_remote_url(url: &str) -> bool {
    url.contains("://") || url.starts_with("//") || url.starts_with("data:")
}

/// Expand a configured library path to a flat list of stylesheet files.
/// Files are taken as configured; directories are enumerated recursively
/// and filtered by suffix.
fn collect_style_files(path: &Path, suffixes: &[String]) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        bail!("Configured library path {} does not exist", path.display());
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = Vec::new();
    // Library directories are walked as-is: ignore files of the host
    // project must not hide shared styles.
    let walker = WalkBuilder::new(path).standard_filters(false).build();
    for res in walker {
        let dent = res?;
        let p = dent.path();
        if !p.is_file() {
            continue;
        }
        let name = p.to_string_lossy();
        if suffixes.iter().any(|suffix| name.ends_with(suffix.as_str())) {
            trace!("Found library stylesheet: {}", p.display());
            files.push(p.to_path_buf());
        }
    }
    Ok(files)
}

pub(crate) fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() { path.to_path_buf() } else { root.join(path) }
}
