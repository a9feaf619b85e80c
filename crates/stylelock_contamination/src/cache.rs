use anyhow::{Context, Result};
use dashmap::DashMap;
use log::{debug, trace};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

/// One persisted extraction result: the class names of a library file and
/// the local stylesheets it `@import`s. An entry is only trusted while its
/// stored hash equals the current digest of the source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    path: PathBuf,
    hash: String,
    class_names: Vec<String>,
    imports: Vec<PathBuf>,
}

/// Persistent, file-identity-keyed store of extracted class names.
///
/// One cache instance lives for one build: loaded before index
/// construction, appended to concurrently while library files are
/// extracted, stored once afterwards. On disk the store is flat: one JSON
/// entry file per cached source, named by the digest of the source path so
/// the mapping stays collision free for any path shape (the source path
/// itself is stored inside the entry).
pub struct SelectorCache {
    dir: PathBuf,
    entries: DashMap<PathBuf, CacheEntry>,
}

impl SelectorCache {
    pub fn new(dir: PathBuf) -> Self {
        SelectorCache { dir, entries: DashMap::new() }
    }

    pub fn get(&self, file: &Path) -> Option<(Vec<String>, Vec<PathBuf>)> {
        self.entries.get(file).map(|entry| (entry.class_names.clone(), entry.imports.clone()))
    }

    /// Record the extraction result for `file`, computing the content
    /// digest at insert time.
    pub fn insert(&self, file: &Path, class_names: Vec<String>, imports: Vec<PathBuf>) -> Result<()> {
        let hash = hash_file(file)?;
        trace!("Caching {} class names for {}", class_names.len(), file.display());
        self.entries.insert(
            file.to_path_buf(),
            CacheEntry { path: file.to_path_buf(), hash, class_names, imports },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read every persisted entry, revalidating each against the current
    /// content of its source file. Stale, malformed and orphaned entries
    /// count as absent; their extraction simply reruns.
    pub fn load(&self) -> Result<()> {
        if !self.dir.exists() {
            debug!("No cache directory at {:?}", self.dir);
            return Ok(());
        }

        let mut files: Vec<PathBuf> = Vec::new();
        for dent in fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read cache directory {}", self.dir.display()))?
        {
            let path = dent?.path();
            if path.is_file() {
                files.push(path);
            }
        }

        let entries: Vec<CacheEntry> =
            files.par_iter().filter_map(|path| read_entry(path)).collect();

        debug!("Loaded {} valid cache entries from {:?}", entries.len(), self.dir);
        for entry in entries {
            self.entries.insert(entry.path.clone(), entry);
        }
        Ok(())
    }

    /// Serialize every in-memory entry back to the cache directory,
    /// creating it recursively if absent. Entry files with no live entry
    /// (their source was deleted or changed) are pruned so the directory
    /// does not grow without bound.
    pub fn store(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create cache directory {}", self.dir.display()))?;

        let mut live: HashSet<String> = HashSet::new();
        for entry in self.entries.iter() {
            let name = entry_file_name(entry.key());
            let target = self.dir.join(&name);
            let content = serde_json::to_string(entry.value())?;
            fs::write(&target, content)
                .with_context(|| format!("Failed to write cache entry {}", target.display()))?;
            live.insert(name);
        }

        for dent in fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read cache directory {}", self.dir.display()))?
        {
            let path = dent?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.ends_with(".json") && !live.contains(name) {
                trace!("Pruning stale cache entry {}", path.display());
                let _ = fs::remove_file(&path);
            }
        }

        debug!("Stored {} cache entries to {:?}", self.entries.len(), self.dir);
        Ok(())
    }
}

fn read_entry(path: &Path) -> Option<CacheEntry> {
    let content = fs::read_to_string(path).ok()?;
    let entry: CacheEntry = match serde_json::from_str(&content) {
        Ok(entry) => entry,
        Err(e) => {
            debug!("Discarding malformed cache entry {}: {}", path.display(), e);
            return None;
        }
    };
    match hash_file(&entry.path) {
        Ok(current) if current == entry.hash => Some(entry),
        Ok(_) => {
            trace!("Cache entry for {} is stale", entry.path.display());
            None
        }
        Err(_) => {
            trace!("Source file {} is gone, dropping cache entry", entry.path.display());
            None
        }
    }
}

/// Streaming content digest of a file.
pub(crate) fn hash_file(path: &Path) -> Result<String> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open {} for hashing", path.display()))?;
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut BufReader::new(file), &mut hasher)
        .with_context(|| format!("Failed to hash {}", path.display()))?;
    Ok(hasher.finalize().to_hex().to_string())
}

fn entry_file_name(source: &Path) -> String {
    let digest = blake3::hash(source.to_string_lossy().as_bytes());
    format!("{}.json", digest.to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_get_and_insert() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("lib.css");
        fs::write(&source, ".btn {}").unwrap();

        let cache = SelectorCache::new(temp_dir.path().join("cache"));
        assert!(cache.get(&source).is_none());

        cache.insert(&source, names(&["btn"]), Vec::new()).unwrap();
        assert_eq!(cache.get(&source).unwrap().0, names(&["btn"]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("lib.css");
        fs::write(&source, ".btn {}").unwrap();
        let cache_dir = temp_dir.path().join("cache");

        {
            let cache = SelectorCache::new(cache_dir.clone());
            cache
                .insert(&source, names(&["btn"]), vec![temp_dir.path().join("base.css")])
                .unwrap();
            cache.store().unwrap();
        }

        let cache = SelectorCache::new(cache_dir);
        cache.load().unwrap();
        let (class_names, imports) = cache.get(&source).unwrap();
        assert_eq!(class_names, names(&["btn"]));
        assert_eq!(imports, vec![temp_dir.path().join("base.css")]);
    }

    #[test]
    fn test_invalidation_on_content_change() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("lib.css");
        fs::write(&source, ".btn {}").unwrap();
        let cache_dir = temp_dir.path().join("cache");

        {
            let cache = SelectorCache::new(cache_dir.clone());
            cache.insert(&source, names(&["btn"]), Vec::new()).unwrap();
            cache.store().unwrap();
        }

        fs::write(&source, ".card {}").unwrap();

        let cache = SelectorCache::new(cache_dir);
        cache.load().unwrap();
        assert!(cache.get(&source).is_none());
    }

    #[test]
    fn test_missing_source_drops_entry() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("lib.css");
        fs::write(&source, ".btn {}").unwrap();
        let cache_dir = temp_dir.path().join("cache");

        {
            let cache = SelectorCache::new(cache_dir.clone());
            cache.insert(&source, names(&["btn"]), Vec::new()).unwrap();
            cache.store().unwrap();
        }

        fs::remove_file(&source).unwrap();

        let cache = SelectorCache::new(cache_dir);
        cache.load().unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_store_prunes_entries_for_deleted_sources() {
        let temp_dir = TempDir::new().unwrap();
        let kept = temp_dir.path().join("kept.css");
        let gone = temp_dir.path().join("gone.css");
        fs::write(&kept, ".a {}").unwrap();
        fs::write(&gone, ".b {}").unwrap();
        let cache_dir = temp_dir.path().join("cache");

        {
            let cache = SelectorCache::new(cache_dir.clone());
            cache.insert(&kept, names(&["a"]), Vec::new()).unwrap();
            cache.insert(&gone, names(&["b"]), Vec::new()).unwrap();
            cache.store().unwrap();
        }
        assert_eq!(fs::read_dir(&cache_dir).unwrap().count(), 2);

        fs::remove_file(&gone).unwrap();

        // Loading drops the entry for the deleted source; storing must
        // sweep its file too instead of letting the directory grow.
        let cache = SelectorCache::new(cache_dir.clone());
        cache.load().unwrap();
        cache.store().unwrap();

        assert_eq!(fs::read_dir(&cache_dir).unwrap().count(), 1);
        let cache = SelectorCache::new(cache_dir);
        cache.load().unwrap();
        assert!(cache.get(&kept).is_some());
    }

    #[test]
    fn test_malformed_entry_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let cache_dir = temp_dir.path().join("cache");
        fs::create_dir_all(&cache_dir).unwrap();
        fs::write(cache_dir.join("garbage.json"), "not json at all").unwrap();

        let cache = SelectorCache::new(cache_dir);
        cache.load().unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_without_directory() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SelectorCache::new(temp_dir.path().join("missing"));
        cache.load().unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_file_names_differ_per_path() {
        assert_ne!(
            entry_file_name(Path::new("/a/b.css")),
            entry_file_name(Path::new("/a/c.css"))
        );
        // Paths that a separator-substitution scheme would conflate stay
        // distinct under the digest encoding.
        assert_ne!(
            entry_file_name(Path::new("/a___b/c.css")),
            entry_file_name(Path::new("/a/b/c.css"))
        );
    }

    #[test]
    fn test_insert_missing_file_errors() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SelectorCache::new(temp_dir.path().join("cache"));
        assert!(cache.insert(&temp_dir.path().join("nope.css"), names(&[]), Vec::new()).is_err());
    }
}
