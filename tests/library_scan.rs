use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use savehall::disc_map::{DiscMap, scan_disc_images};
use savehall::formats::psf::{FORMAT_TEXT, FORMAT_U32, Psf};
use savehall::formats::snapshot::Snapshot;
use savehall::library::{DEFAULT_TITLE, scan_psp_saves, scan_snes_saves};
use savehall::recent::{parse_ppsspp_ini, recent_disc_map};
use savehall::resolver::Resolver;
use savehall::{Error, GameId};

fn param_sfo(entries: &[(&str, u16, &[u8])]) -> Vec<u8> {
    let mut keys = Vec::new();
    let mut values = Vec::new();
    let mut index = Vec::new();
    for (key, format, value) in entries {
        index.extend_from_slice(&(keys.len() as u16).to_le_bytes());
        index.extend_from_slice(&format.to_le_bytes());
        index.extend_from_slice(&(value.len() as u32).to_le_bytes());
        index.extend_from_slice(&(value.len() as u32).to_le_bytes());
        index.extend_from_slice(&(values.len() as u32).to_le_bytes());
        keys.extend_from_slice(key.as_bytes());
        keys.push(0);
        values.extend_from_slice(value);
    }
    let key_table = 20 + index.len();
    let data_table = key_table + keys.len();

    let mut out = b"\0PSF".to_vec();
    out.extend_from_slice(&0x0101u32.to_le_bytes());
    out.extend_from_slice(&(key_table as u32).to_le_bytes());
    out.extend_from_slice(&(data_table as u32).to_le_bytes());
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    out.extend(index);
    out.extend(keys);
    out.extend(values);
    out
}

fn snapshot_with_preview(width: u16, height: u16, pixels: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&width.to_le_bytes());
    body.extend_from_slice(&height.to_le_bytes());
    body.extend_from_slice(&[0; 4]);
    body.extend_from_slice(pixels);

    let mut data = b"SNES9X:\n".to_vec();
    data.extend_from_slice(b"NAM:000004:rom\0");
    data.extend_from_slice(b"SHO:------:");
    data.extend_from_slice(&(body.len() as u32).to_be_bytes());
    data.extend(body);
    data
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

fn write(path: &Path, data: &[u8]) -> PathBuf {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, data).unwrap();
    path.to_path_buf()
}

#[test]
fn psp_library_end_to_end() {
    let root = tempfile::tempdir().unwrap();
    let savedata = root.path().join("PSP").join("SAVEDATA");
    let states = root.path().join("PSP").join("PPSSPP_STATE");
    let games = root.path().join("games");

    write(
        &savedata.join("ULUS10565SAVE00").join("PARAM.SFO"),
        &param_sfo(&[
            ("SAVEDATA_TITLE", FORMAT_TEXT, b"Chapter 3\0"),
            ("TITLE", FORMAT_TEXT, b"God of War\0\0\0"),
        ]),
    );
    write(&savedata.join("ULUS10565SAVE00").join("ICON0.PNG"), b"\x89PNG");
    write(
        &savedata.join("homebrew").join("PARAM.SFO"),
        &param_sfo(&[("PARENTAL_LEVEL", FORMAT_U32, &1u32.to_le_bytes())]),
    );
    write(&savedata.join("broken").join("PARAM.SFO"), b"not a container");
    write(&states.join("ULUS10565_1.00_0.ppst"), b"state");
    write(&games.join("God of War [ULUS-10565].cso"), b"CISO");

    let discs: DiscMap = scan_disc_images(&games, true, &Resolver::new())
        .into_iter()
        .collect();
    assert_eq!(discs.len(), 1);

    let saves = scan_psp_saves(&savedata, Some(&states), &Resolver::new(), &discs);
    assert_eq!(saves.len(), 2);

    let gow = saves.iter().find(|s| s.key == "ULUS10565").unwrap();
    assert_eq!(gow.title, "God of War");
    assert_eq!(gow.save_title, "Chapter 3");
    assert!(gow.icon.is_some());
    assert!(gow.disc.is_some());
    assert_eq!(gow.save_states.len(), 1);

    let homebrew = saves.iter().find(|s| s.key == "homebrew").unwrap();
    assert_eq!(homebrew.game_id, None);
    assert_eq!(homebrew.title, DEFAULT_TITLE);
    assert_eq!(homebrew.save_title, "");
    assert_eq!(homebrew.disc, None);
}

#[test]
fn snes_library_end_to_end() {
    let root = tempfile::tempdir().unwrap();
    write(&root.path().join("Super Metroid.srm"), &[0; 8192]);
    let pixels: Vec<u8> = (0..12).collect();
    let state = write(
        &root.path().join("Super Metroid.000"),
        &gzip(&snapshot_with_preview(2, 2, &pixels)),
    );

    let saves = scan_snes_saves(root.path());
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].name, "Super Metroid");
    assert_eq!(saves[0].save_type, "8KB SRAM");
    assert_eq!(saves[0].save_states.len(), 1);
    assert_eq!(saves[0].save_states[0].slot, Some(0));

    let image = Snapshot::extract_preview(&fs::read(state).unwrap())
        .unwrap()
        .unwrap();
    assert_eq!((image.width, image.height), (2, 2));
    assert_eq!(image.pixel(1, 1), Some([9, 10, 11]));
}

#[test]
fn psf_with_foreign_prefix() {
    let mut data = b"SOME VENDOR HEADER".to_vec();
    data.extend(param_sfo(&[("TITLE", FORMAT_TEXT, b"Patapon\0")]));
    let psf = Psf::parse(&data).unwrap();
    assert_eq!(psf.title(), Some("Patapon"));
    assert!(matches!(Psf::parse(b"PSF without nul"), Err(Error::NoContainer)));
}

#[test]
fn recent_isos_feed_the_disc_map() {
    let root = tempfile::tempdir().unwrap();
    let iso = write(&root.path().join("NPJH-50465").join("game.iso"), b"");
    let ini = format!(
        "[Recent]\nRecentIso0 = {}\nRecentIso1 = {}\n",
        iso.display(),
        root.path().join("gone.iso").display()
    );

    let recent = parse_ppsspp_ini(ini.as_bytes()).unwrap();
    let found = recent_disc_map(&recent, &Resolver::new());

    let mut map = DiscMap::new();
    let report = map.merge(found);
    assert_eq!(report.added, ["NPJH50465".parse::<GameId>().unwrap()]);
    assert!(map.verify().missing.is_empty());
}
