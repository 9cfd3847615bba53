//! Mapping from game identifiers to disc images on disk.
//!
//! Save scanning only needs to ask "is there a disc for this id, and
//! where?", which is what [`DiscLookup`] expresses. [`DiscMap`] is the
//! persisted implementation: a JSON object of `"ULUS10565": "/path/game.iso"`
//! pairs that [`scan_disc_images`] results are merged into.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::Result;
use crate::id::GameId;
use crate::resolver::{DiscImageKind, Resolution, Resolver};

/// Read-only access to an id → disc image mapping.
pub trait DiscLookup {
    /// Path of the disc image for `id`, if one is known.
    fn disc_path(&self, id: &GameId) -> Option<&Path>;

    /// Whether a disc image is known for `id`.
    fn has_disc(&self, id: &GameId) -> bool {
        self.disc_path(id).is_some()
    }
}

impl DiscLookup for HashMap<String, PathBuf> {
    fn disc_path(&self, id: &GameId) -> Option<&Path> {
        self.get(id.as_str()).map(PathBuf::as_path)
    }
}

impl DiscLookup for BTreeMap<GameId, PathBuf> {
    fn disc_path(&self, id: &GameId) -> Option<&Path> {
        self.get(id).map(PathBuf::as_path)
    }
}

/// Ids added and changed by [`DiscMap::merge`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Ids that were not in the map before.
    pub added: Vec<GameId>,
    /// Ids whose path changed.
    pub updated: Vec<GameId>,
}

/// Result of [`DiscMap::verify`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Ids whose disc image still exists.
    pub valid: Vec<GameId>,
    /// Ids whose disc image is gone.
    pub missing: Vec<GameId>,
}

/// Persisted id → disc image map, ordered by id.
///
/// Deserializing keeps every entry whose key is a well-formed [`GameId`]
/// and drops the rest with a warning, so one hand-edited key does not
/// discard the whole file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, PathBuf>", into = "BTreeMap<String, PathBuf>")]
pub struct DiscMap {
    entries: BTreeMap<GameId, PathBuf>,
}

impl DiscMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a map from a JSON file. A missing file is an empty map.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let map: Self = serde_json::from_slice(&fs::read(path)?)?;
        tracing::debug!(path = %path.display(), entries = map.len(), "loaded disc map");
        Ok(map)
    }

    /// Write the map as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        tracing::info!(path = %path.display(), entries = self.len(), "saved disc map");
        Ok(())
    }

    /// Copy an existing map file to `<path>.backup`, then [`save`](Self::save).
    pub fn save_with_backup(&self, path: &Path) -> Result<()> {
        if path.exists() {
            let mut backup = path.as_os_str().to_owned();
            backup.push(".backup");
            fs::copy(path, &backup)?;
        }
        self.save(path)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Path for `id`.
    pub fn get(&self, id: &GameId) -> Option<&Path> {
        self.entries.get(id).map(PathBuf::as_path)
    }

    /// Insert or replace the path for `id`, returning the old one.
    pub fn insert(&mut self, id: GameId, path: PathBuf) -> Option<PathBuf> {
        self.entries.insert(id, path)
    }

    /// Remove `id`, returning its path.
    pub fn remove(&mut self, id: &GameId) -> Option<PathBuf> {
        self.entries.remove(id)
    }

    /// Iterate in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&GameId, &Path)> {
        self.entries.iter().map(|(id, p)| (id, p.as_path()))
    }

    /// Merge newly found images, overwriting paths for known ids.
    pub fn merge(&mut self, found: impl IntoIterator<Item = (GameId, PathBuf)>) -> MergeReport {
        let mut report = MergeReport::default();
        for (id, path) in found {
            match self.entries.get(&id) {
                None => report.added.push(id.clone()),
                Some(old) if *old != path => report.updated.push(id.clone()),
                Some(_) => {}
            }
            self.entries.insert(id, path);
        }
        if !report.added.is_empty() || !report.updated.is_empty() {
            tracing::info!(
                added = report.added.len(),
                updated = report.updated.len(),
                "merged disc images"
            );
        }
        report
    }

    /// Split ids by whether their disc image still exists.
    pub fn verify(&self) -> Verification {
        let mut out = Verification::default();
        for (id, path) in &self.entries {
            if path.exists() {
                out.valid.push(id.clone());
            } else {
                out.missing.push(id.clone());
            }
        }
        out
    }
}

impl DiscLookup for DiscMap {
    fn disc_path(&self, id: &GameId) -> Option<&Path> {
        self.get(id)
    }
}

impl From<BTreeMap<String, PathBuf>> for DiscMap {
    fn from(raw: BTreeMap<String, PathBuf>) -> Self {
        let mut entries = BTreeMap::new();
        for (key, path) in raw {
            match key.parse::<GameId>() {
                Ok(id) => {
                    entries.insert(id, path);
                }
                Err(_) => {
                    tracing::warn!(%key, path = %path.display(), "skipping disc map entry");
                }
            }
        }
        Self { entries }
    }
}

impl From<DiscMap> for BTreeMap<String, PathBuf> {
    fn from(map: DiscMap) -> Self {
        map.entries
            .into_iter()
            .map(|(id, path)| (id.into(), path))
            .collect()
    }
}

impl FromIterator<(GameId, PathBuf)> for DiscMap {
    fn from_iter<I: IntoIterator<Item = (GameId, PathBuf)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Find disc images under `root` and resolve their ids.
///
/// `root` may also be a single image file. Files whose id cannot be
/// resolved, or that fail to open, are logged and left out; a missing
/// `root` yields an empty map. When two images resolve to the same id the
/// one visited last wins.
pub fn scan_disc_images(
    root: &Path,
    recursive: bool,
    resolver: &Resolver,
) -> BTreeMap<GameId, PathBuf> {
    let mut found = BTreeMap::new();
    if !root.exists() {
        tracing::warn!(path = %root.display(), "disc image path does not exist");
        return found;
    }

    let walker = WalkDir::new(root)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || DiscImageKind::from_path(path).is_none() {
            continue;
        }
        match resolver.resolve(path) {
            Ok(Resolution::Resolved { id, .. }) => {
                let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
                tracing::debug!(%id, path = %path.display(), "found disc image");
                found.insert(id, path);
            }
            Ok(Resolution::Unresolved) => {
                tracing::warn!(path = %path.display(), "could not extract disc id");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to probe disc image");
            }
        }
    }

    tracing::info!(root = %root.display(), count = found.len(), "disc image scan complete");
    found
}
