//! Emulator "recent files" lists.
//!
//! Both emulators keep their recently opened games in an INI-style config:
//!
//! * PPSSPP `ppsspp.ini` - `RecentIso0 = D:\PSP\game.iso` lines plus a
//!   `CurrentDirectory` key.
//! * Snes9x `snes9x.conf` - `ROM0="C:\SNES\Super Metroid.sfc"` lines in a
//!   `[RecentFiles]` section plus `ROMDirectory` / `InitialDirectory`.
//!
//! Lines beginning with `#` or `;` and blank lines are ignored. Bytes that
//! are not UTF-8 are replaced rather than rejected, since these files are
//! often written in the host's legacy code page.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;

use crate::id::GameId;
use crate::resolver::Resolver;
use crate::{Error, Result};

/// Recent games from `ppsspp.ini`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PpssppRecent {
    /// `RecentIso*` values, in file order.
    pub recent_isos: Vec<PathBuf>,
    /// `CurrentDirectory`, the file browser's last directory.
    pub current_directory: Option<PathBuf>,
}

/// Recent games from `snes9x.conf`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Snes9xRecent {
    /// `ROM*` values from `[RecentFiles]`, in file order.
    pub recent_roms: Vec<PathBuf>,
    /// `ROMDirectory` or `InitialDirectory`, whichever came last.
    pub rom_directory: Option<PathBuf>,
}

/// Parse a `ppsspp.ini` from `reader`.
pub fn parse_ppsspp_ini<R: Read>(reader: R) -> Result<PpssppRecent> {
    let mut out = PpssppRecent::default();
    for_each_pair(reader, |_section, key, value| {
        if key.starts_with("RecentIso") {
            if !value.is_empty() {
                out.recent_isos.push(PathBuf::from(value));
            }
        } else if key == "CurrentDirectory" && !value.is_empty() {
            out.current_directory = Some(PathBuf::from(value));
        }
    })?;
    Ok(out)
}

/// Parse a `snes9x.conf` from `reader`.
pub fn parse_snes9x_conf<R: Read>(reader: R) -> Result<Snes9xRecent> {
    let mut out = Snes9xRecent::default();
    for_each_pair(reader, |section, key, value| {
        let value = value.trim_matches('"');
        if value.is_empty() {
            return;
        }
        if section == Some("RecentFiles") && key.starts_with("ROM") {
            out.recent_roms.push(PathBuf::from(value));
        } else if key == "ROMDirectory" || key == "InitialDirectory" {
            out.rom_directory = Some(PathBuf::from(value));
        }
    })?;
    Ok(out)
}

/// Map recent PPSSPP images that still exist to their resolved ids.
///
/// Images that are gone, or whose id cannot be resolved, are left out.
pub fn recent_disc_map(recent: &PpssppRecent, resolver: &Resolver) -> BTreeMap<GameId, PathBuf> {
    let mut map = BTreeMap::new();
    for iso in recent.recent_isos.iter().filter(|p| p.is_file()) {
        match resolver.resolve(iso) {
            Ok(resolution) => {
                if let Some(id) = resolution.into_id() {
                    map.insert(id, iso.clone());
                }
            }
            Err(e) => {
                tracing::warn!(path = %iso.display(), error = %e, "failed to resolve recent game");
            }
        }
    }
    map
}

/// Call `f(section, key, value)` for every `key = value` line.
fn for_each_pair<R, F>(reader: R, mut f: F) -> Result<()>
where
    R: Read,
    F: FnMut(Option<&str>, &str, &str),
{
    let mut section: Option<String> = None;
    for line in BufReader::new(reader).split(b'\n') {
        let line = line.map_err(Error::Io)?;
        let line = String::from_utf8_lossy(&line);
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = Some(name.to_owned());
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        f(section.as_deref(), key.trim(), value.trim());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn ppsspp_recent_list() {
        let ini = "\
[General]
CurrentDirectory = D:/PSP
; comment
[Recent]
RecentIso0 = D:/PSP/God of War [ULUS-10565].iso
RecentIso1 =
RecentIso2 = D:/PSP/Patapon.cso
";
        let recent = parse_ppsspp_ini(ini.as_bytes()).unwrap();
        assert_eq!(recent.current_directory, Some(PathBuf::from("D:/PSP")));
        assert_eq!(
            recent.recent_isos,
            [
                PathBuf::from("D:/PSP/God of War [ULUS-10565].iso"),
                PathBuf::from("D:/PSP/Patapon.cso"),
            ]
        );
    }

    #[test]
    fn snes9x_recent_list() {
        let conf = "\
# Snes9x
InitialDirectory = \"C:/SNES\"
[RecentFiles]
ROM0=\"C:/SNES/Super Metroid.sfc\"
ROM1=\"\"
ROM2=C:/SNES/Chrono Trigger.smc
[Sound]
ROM9=not a recent file
";
        let recent = parse_snes9x_conf(conf.as_bytes()).unwrap();
        assert_eq!(recent.rom_directory, Some(PathBuf::from("C:/SNES")));
        assert_eq!(
            recent.recent_roms,
            [
                PathBuf::from("C:/SNES/Super Metroid.sfc"),
                PathBuf::from("C:/SNES/Chrono Trigger.smc"),
            ]
        );
    }

    #[test]
    fn tolerates_non_utf8() {
        let mut ini = b"RecentIso0 = D:/Jeux/".to_vec();
        ini.push(0xE9);
        ini.extend_from_slice(b".iso\r\n");
        let recent = parse_ppsspp_ini(&ini[..]).unwrap();
        assert_eq!(recent.recent_isos.len(), 1);
    }

    #[test]
    fn recent_map_keeps_existing_resolvable_images() {
        let dir = tempfile::tempdir().unwrap();
        let known = dir.path().join("Daxter (ULUS10042).cso");
        let unknown = dir.path().join("homebrew.cso");
        fs::write(&known, b"CISO").unwrap();
        fs::write(&unknown, b"CISO").unwrap();

        let recent = PpssppRecent {
            recent_isos: vec![known.clone(), unknown, dir.path().join("NPJH50465.iso")],
            current_directory: None,
        };
        let map = recent_disc_map(&recent, &Resolver::new());
        assert_eq!(map.len(), 1);
        assert_eq!(map.values().next(), Some(&known));
    }
}
