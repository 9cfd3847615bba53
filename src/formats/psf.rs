//! PSF (PlayStation System File) - key/value metadata container.
//!
//! Every PSP save folder carries a `PARAM.SFO` in this format; the fields
//! used for display are `TITLE` and `SAVEDATA_TITLE`.
//!
//! ## Layout
//! ```text
//! [0x00] Magic "\0PSF"            (4 bytes)
//! [0x04] Version (0x00000101)     (u32 LE)
//! [0x08] KeyTableOffset           (u32 LE) - relative to the magic
//! [0x0C] DataTableOffset          (u32 LE) - relative to the magic
//! [0x10] EntryCount               (u32 LE)
//! [0x14] Index table              (EntryCount × 0x10 bytes)
//! [...]  Key table                (null-terminated ASCII keys)
//! [...]  Data table               (values)
//! ```
//!
//! ## Index Entry (0x10 bytes)
//! ```text
//! [0x00] KeyOffset   - into the key table  (u16 LE)
//! [0x02] Format                            (u16 LE)
//!         0x0204 = null-terminated UTF-8 text
//!         0x0404 = u32
//! [0x04] Length      - used bytes          (u32 LE)
//! [0x08] MaxLength   - reserved bytes      (u32 LE)
//! [0x0C] DataOffset  - into the data table (u32 LE)
//! ```
//!
//! ## Notes
//! * The container is not always at offset 0: some files prepend their own
//!   header, so the parser searches for the signature.
//! * Decoding is best-effort. An entry whose key or value falls outside the
//!   buffer is dropped and counted in [`Psf::skipped`]; the rest of the
//!   table is still decoded.

use std::io::Read;

use crate::utils::{find, le_u16_at, le_u32_at, null_string, slice_at, until_nul};
use crate::{Error, Result};

/// Magic plus the first version byte; what the parser searches for.
pub const PSF_SIGNATURE: &[u8; 5] = b"\0PSF\x01";

/// Format tag of null-terminated UTF-8 text values.
pub const FORMAT_TEXT: u16 = 0x0204;
/// Format tag of 32-bit unsigned integer values.
pub const FORMAT_U32: u16 = 0x0404;

const HEADER_SIZE: usize = 0x14;
const ENTRY_SIZE: usize = 0x10;

/// Key of the game title.
pub const KEY_TITLE: &str = "TITLE";
/// Key of the per-save title.
pub const KEY_SAVEDATA_TITLE: &str = "SAVEDATA_TITLE";

/// A decoded PSF value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PsfValue {
    /// Text, cut at the first null byte.
    Text(String),
    /// A little-endian `u32`.
    Integer(u32),
    /// Anything else, kept verbatim.
    Binary(Vec<u8>),
}

impl PsfValue {
    /// Returns the text if this is a [`PsfValue::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PsfValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is a [`PsfValue::Integer`].
    pub fn as_integer(&self) -> Option<u32> {
        match self {
            PsfValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Lower-case hex rendering of opaque values (text and integers render
    /// as themselves).
    pub fn to_hex(&self) -> String {
        match self {
            PsfValue::Text(s) => s.clone(),
            PsfValue::Integer(v) => v.to_string(),
            PsfValue::Binary(b) => b.iter().map(|b| format!("{b:02x}")).collect(),
        }
    }
}

/// One key/value pair from the index table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsfEntry {
    /// Key name from the key table.
    pub key: String,
    /// Raw format tag from the index entry.
    pub format: u16,
    /// Decoded value.
    pub value: PsfValue,
}

/// A decoded PSF container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Psf {
    /// Version field from the header (normally `0x101`).
    pub version: u32,
    /// Entries in declaration order; keys are unique.
    pub entries: Vec<PsfEntry>,
    skipped: usize,
}

impl Psf {
    /// Decode a PSF container from `data`.
    ///
    /// Returns [`Error::NoContainer`] when the signature does not occur in
    /// `data` and [`Error::Truncated`] when the header after it is cut
    /// short. Nothing else fails: malformed entries are skipped.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let base = find(data, PSF_SIGNATURE).ok_or(Error::NoContainer)?;
        let psf = &data[base..];
        if psf.len() < HEADER_SIZE {
            return Err(Error::Truncated);
        }

        let header = |off| le_u32_at(psf, off).ok_or(Error::Truncated);
        let version = header(0x04)?;
        let key_table = header(0x08)? as usize;
        let data_table = header(0x0C)? as usize;
        let entry_count = header(0x10)? as usize;

        let mut entries: Vec<PsfEntry> = Vec::new();
        let mut skipped = 0;

        for index in 0..entry_count {
            let at = HEADER_SIZE + index * ENTRY_SIZE;
            let Some(raw) = read_index_entry(psf, at) else {
                // The index table runs off the end; every later entry would too.
                skipped += entry_count - index;
                tracing::debug!(
                    index,
                    remaining = entry_count - index,
                    "psf index table truncated"
                );
                break;
            };

            let entry = match resolve_entry(psf, key_table, data_table, &raw) {
                Ok(entry) => entry,
                Err(e) => {
                    skipped += 1;
                    tracing::debug!(index, error = %e, "skipping psf entry");
                    continue;
                }
            };

            match entries.iter_mut().find(|e| e.key == entry.key) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        }

        tracing::debug!(
            offset = base,
            entries = entries.len(),
            skipped,
            "decoded psf container"
        );

        Ok(Self {
            version,
            entries,
            skipped,
        })
    }

    /// Read everything from `r` and decode it with [`Psf::parse`].
    pub fn read<R: Read>(r: &mut R) -> Result<Self> {
        let mut data = Vec::new();
        r.read_to_end(&mut data)?;
        Self::parse(&data)
    }

    /// Number of index entries that could not be decoded.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&PsfValue> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    /// Look up a text value by key.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PsfValue::as_text)
    }

    /// Look up an integer value by key.
    pub fn integer(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(PsfValue::as_integer)
    }

    /// Text value for `key`, or `default` when it is absent or not text.
    pub fn text_or(&self, key: &str, default: &str) -> String {
        self.text(key).unwrap_or(default).to_owned()
    }

    /// The `TITLE` field.
    pub fn title(&self) -> Option<&str> {
        self.text(KEY_TITLE)
    }

    /// The `SAVEDATA_TITLE` field.
    pub fn save_title(&self) -> Option<&str> {
        self.text(KEY_SAVEDATA_TITLE)
    }
}

struct IndexEntry {
    key_offset: u16,
    format: u16,
    length: u32,
    data_offset: u32,
}

fn read_index_entry(psf: &[u8], at: usize) -> Option<IndexEntry> {
    slice_at(psf, at, ENTRY_SIZE)?;
    Some(IndexEntry {
        key_offset: le_u16_at(psf, at)?,
        format: le_u16_at(psf, at + 2)?,
        length: le_u32_at(psf, at + 4)?,
        // at + 8 is the reserved max length
        data_offset: le_u32_at(psf, at + 12)?,
    })
}

fn resolve_entry(
    psf: &[u8],
    key_table: usize,
    data_table: usize,
    raw: &IndexEntry,
) -> Result<PsfEntry> {
    let key_at = key_table
        .checked_add(raw.key_offset as usize)
        .ok_or(Error::InvalidRange)?;
    let key = null_string(psf, key_at)?;

    let value_at = data_table
        .checked_add(raw.data_offset as usize)
        .ok_or(Error::InvalidRange)?;
    let bytes = slice_at(psf, value_at, raw.length as usize).ok_or(Error::InvalidRange)?;

    let value = match (raw.format, bytes) {
        (FORMAT_TEXT, _) => {
            PsfValue::Text(String::from_utf8_lossy(until_nul(bytes)).into_owned())
        }
        (FORMAT_U32, &[a, b, c, d]) => PsfValue::Integer(u32::from_le_bytes([a, b, c, d])),
        _ => PsfValue::Binary(bytes.to_vec()),
    };

    Ok(PsfEntry {
        key,
        format: raw.format,
        value,
    })
}
