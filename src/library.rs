//! Save library scanning for PPSSPP and Snes9x.
//!
//! The scanners walk one directory level, decode what they find with the
//! format parsers and identity resolver, and return display records. A
//! single unreadable or unrecognised item is logged and skipped; it never
//! aborts the scan.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

use crate::disc_map::DiscLookup;
use crate::formats::psf::{KEY_SAVEDATA_TITLE, KEY_TITLE, Psf};
use crate::id::GameId;
use crate::resolver::Resolver;
use crate::{Error, Result};

/// Metadata file inside every PSP save folder.
pub const PARAM_SFO: &str = "PARAM.SFO";
/// Icon inside a PSP save folder.
pub const ICON0: &str = "ICON0.PNG";
/// Extension of PPSSPP save states.
pub const PPSSPP_STATE_EXT: &str = "ppst";
/// Title used when `PARAM.SFO` has no `TITLE`.
pub const DEFAULT_TITLE: &str = "PPSSPP Game";
/// Snes9x battery save extensions.
pub const SNES_SAVE_EXTS: [&str; 2] = ["srm", "sav"];
/// Number of Snes9x save state slots (`.000`-`.009`).
pub const SNES_STATE_SLOTS: u8 = 10;

/// A save state file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveState {
    /// File name.
    pub filename: String,
    /// Full path.
    pub path: PathBuf,
    /// Slot number for Snes9x states.
    pub slot: Option<u8>,
    /// Last modification time.
    pub modified: SystemTime,
    /// Size in bytes.
    pub size: u64,
}

/// One PSP save folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PspSave {
    /// Resolved game id, or the folder name when none could be resolved.
    pub key: String,
    /// Resolved game id.
    pub game_id: Option<GameId>,
    /// `TITLE` from `PARAM.SFO`.
    pub title: String,
    /// `SAVEDATA_TITLE` from `PARAM.SFO`.
    pub save_title: String,
    /// The save folder.
    pub folder: PathBuf,
    /// `ICON0.PNG`, when present.
    pub icon: Option<PathBuf>,
    /// Disc image for the game, from the injected lookup.
    pub disc: Option<PathBuf>,
    /// PPSSPP save states for the game, newest first.
    pub save_states: Vec<SaveState>,
}

/// One Snes9x battery save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnesSave {
    /// Game name (file stem).
    pub name: String,
    /// The save file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    /// Human readable SRAM size.
    pub save_type: String,
    /// Save states for the game, newest first.
    pub save_states: Vec<SaveState>,
}

/// Describe an SRAM dump by its size.
pub fn describe_sram(size: u64) -> String {
    match size {
        2048 => "2KB SRAM".to_owned(),
        8192 => "8KB SRAM".to_owned(),
        32768 => "32KB SRAM".to_owned(),
        65536 => "64KB SRAM".to_owned(),
        131072 => "128KB SRAM".to_owned(),
        n => format!("{n} bytes"),
    }
}

/// Scan a PPSSPP `SAVEDATA` directory.
///
/// Every sub-directory holding a `PARAM.SFO` becomes a [`PspSave`]. The
/// game id comes from `resolver`; the folder name stands in when it does
/// not resolve. Save states are looked up in `savestate_dir` when given.
pub fn scan_psp_saves(
    savedata_dir: &Path,
    savestate_dir: Option<&Path>,
    resolver: &Resolver,
    discs: &dyn DiscLookup,
) -> Vec<PspSave> {
    let mut saves = Vec::new();
    if !savedata_dir.is_dir() {
        tracing::warn!(path = %savedata_dir.display(), "SAVEDATA directory not found");
        return saves;
    }

    for entry in children(savedata_dir) {
        if !entry.file_type().is_dir() || !entry.path().join(PARAM_SFO).is_file() {
            continue;
        }
        match read_psp_save(entry.path(), savestate_dir, resolver, discs) {
            Ok(save) => saves.push(save),
            Err(Error::NoContainer) => {
                tracing::debug!(path = %entry.path().display(), "not a PSF container");
            }
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "skipping folder");
            }
        }
    }

    tracing::info!(count = saves.len(), "PSP save scan complete");
    saves
}

/// Build the record for one PSP save folder.
pub fn read_psp_save(
    folder: &Path,
    savestate_dir: Option<&Path>,
    resolver: &Resolver,
    discs: &dyn DiscLookup,
) -> Result<PspSave> {
    let psf = Psf::parse(&fs::read(folder.join(PARAM_SFO))?)?;
    let game_id = resolver.resolve(folder)?.into_id();
    let folder_name = folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let key = game_id
        .as_ref()
        .map_or(folder_name, |id| id.as_str().to_owned());

    let icon = Some(folder.join(ICON0)).filter(|p| p.is_file());
    let disc = game_id
        .as_ref()
        .and_then(|id| discs.disc_path(id))
        .map(Path::to_path_buf);
    let save_states = match savestate_dir {
        Some(dir) => ppsspp_states(dir, &key),
        None => Vec::new(),
    };

    Ok(PspSave {
        title: psf.text_or(KEY_TITLE, DEFAULT_TITLE),
        save_title: psf.text_or(KEY_SAVEDATA_TITLE, ""),
        key,
        game_id,
        folder: folder.to_path_buf(),
        icon,
        disc,
        save_states,
    })
}

/// PPSSPP states for `key` (`<key>*.ppst`), newest first.
pub fn ppsspp_states(savestate_dir: &Path, key: &str) -> Vec<SaveState> {
    let mut states: Vec<_> = children(savestate_dir)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy();
            name.starts_with(key) && has_extension(e.path(), PPSSPP_STATE_EXT)
        })
        .filter_map(|e| save_state(e.path(), None))
        .collect();
    newest_first(&mut states);
    states
}

/// Scan a Snes9x save directory for `.srm` / `.sav` files.
pub fn scan_snes_saves(save_dir: &Path) -> Vec<SnesSave> {
    let mut saves = Vec::new();
    if !save_dir.is_dir() {
        tracing::warn!(path = %save_dir.display(), "Snes9x save directory not found");
        return saves;
    }

    for entry in children(save_dir) {
        let path = entry.path();
        let is_save = SNES_SAVE_EXTS.iter().any(|ext| has_extension(path, ext));
        if !entry.file_type().is_file() || !is_save {
            continue;
        }
        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping save file");
                continue;
            }
        };
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let save_states = snes9x_states(save_dir, &name);
        saves.push(SnesSave {
            save_type: describe_sram(size),
            path: path.to_path_buf(),
            name,
            size,
            save_states,
        });
    }

    tracing::info!(count = saves.len(), "SNES save scan complete");
    saves
}

/// Snes9x states `<name>.000`-`<name>.009` in `dir`, newest first.
pub fn snes9x_states(dir: &Path, name: &str) -> Vec<SaveState> {
    let mut states: Vec<_> = (0..SNES_STATE_SLOTS)
        .filter_map(|slot| save_state(&dir.join(format!("{name}.{slot:03}")), Some(slot)))
        .collect();
    newest_first(&mut states);
    states
}

fn save_state(path: &Path, slot: Option<u8>) -> Option<SaveState> {
    let meta = fs::metadata(path).ok().filter(|m| m.is_file())?;
    Some(SaveState {
        filename: path.file_name()?.to_string_lossy().into_owned(),
        path: path.to_path_buf(),
        slot,
        modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        size: meta.len(),
    })
}

fn newest_first(states: &mut [SaveState]) {
    states.sort_by(|a, b| b.modified.cmp(&a.modified));
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
}

/// Immediate children of `dir`, sorted by name; unreadable entries are
/// logged and dropped.
fn children(dir: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| {
            entry
                .map_err(|e| tracing::warn!(error = %e, "skipping unreadable directory entry"))
                .ok()
        })
}
