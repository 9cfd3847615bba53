//! Game identity resolution for save folders and disc images.
//!
//! A [`Resolver`] runs an ordered list of [`Strategy`]s against a path and
//! stops at the first one that yields a [`GameId`]:
//!
//! 1. [`Strategy::FileName`] - the file or folder's own name
//!    (`ULUS10565SAVE00`, `Daxter [ULUS-10565].cso`).
//! 2. [`Strategy::ParentDir`] - the name of the directory containing it
//!    (`ULUS10565/game.iso`).
//! 3. [`Strategy::HeaderProbe`] - bytes inside an uncompressed `.iso`:
//!    the application-use field of the primary volume descriptor at
//!    `0x8373`, then the first KiB of the image.
//!
//! The header probe never runs for directories or for compressed and
//! packaged images (`.cso`, `.pbp`); their bytes do not hold plain text.
//! Probing reads only the two bounded windows above and closes the file
//! before returning.
//!
//! Resolution never invents an identifier. When every strategy fails the
//! result is [`Resolution::Unresolved`] and the caller chooses a fallback.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use crate::Result;
use crate::id::{GameId, recognize};
use crate::utils::read_bounded;

/// Offset of the disc id inside a PSP UMD image (PVD application-use area).
pub const HEADER_PROBE_OFFSET: u64 = 0x8373;
/// Bytes read at [`HEADER_PROBE_OFFSET`]; enough for `ULUS-10565`.
pub const HEADER_PROBE_LEN: u64 = 10;
/// Bytes read from the start of the image for the fallback probe.
pub const LEADING_PROBE_LEN: u64 = 1024;

/// Disc image container formats, by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscImageKind {
    /// Plain ISO 9660 image.
    Iso,
    /// CISO block-compressed image.
    Cso,
    /// PSP EBOOT package.
    Pbp,
}

impl DiscImageKind {
    /// Every supported kind.
    pub const ALL: [DiscImageKind; 3] = [
        DiscImageKind::Iso,
        DiscImageKind::Cso,
        DiscImageKind::Pbp,
    ];

    /// Classify `path` by its extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(OsStr::to_str)?;
        Self::ALL
            .into_iter()
            .find(|kind| ext.eq_ignore_ascii_case(kind.extension()))
    }

    /// Extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            DiscImageKind::Iso => "iso",
            DiscImageKind::Cso => "cso",
            DiscImageKind::Pbp => "pbp",
        }
    }

    /// Whether the image stores the disc's bytes verbatim and can be probed.
    pub fn is_uncompressed(self) -> bool {
        matches!(self, DiscImageKind::Iso)
    }
}

/// One way of deriving a [`GameId`] from a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Match the item's own name.
    FileName,
    /// Match the parent directory's name.
    ParentDir,
    /// Read the id out of an uncompressed disc image.
    HeaderProbe,
}

/// Outcome of [`Resolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An identifier was found.
    Resolved {
        /// The canonical identifier.
        id: GameId,
        /// The strategy that produced it.
        strategy: Strategy,
    },
    /// No strategy produced an identifier.
    Unresolved,
}

impl Resolution {
    /// The identifier, if resolved.
    pub fn id(&self) -> Option<&GameId> {
        match self {
            Resolution::Resolved { id, .. } => Some(id),
            Resolution::Unresolved => None,
        }
    }

    /// The strategy that succeeded, if any.
    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            Resolution::Resolved { strategy, .. } => Some(*strategy),
            Resolution::Unresolved => None,
        }
    }

    /// Consume the resolution, keeping only the identifier.
    pub fn into_id(self) -> Option<GameId> {
        match self {
            Resolution::Resolved { id, .. } => Some(id),
            Resolution::Unresolved => None,
        }
    }
}

/// Stateless identity resolver with a fixed strategy order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolver {
    strategies: Vec<Strategy>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            strategies: vec![Strategy::FileName, Strategy::ParentDir, Strategy::HeaderProbe],
        }
    }
}

impl Resolver {
    /// Resolver running file name, parent directory, then header probe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver running exactly `strategies`, in the given order.
    pub fn with_strategies(strategies: impl IntoIterator<Item = Strategy>) -> Self {
        Self {
            strategies: strategies.into_iter().collect(),
        }
    }

    /// The strategies in the order they are tried.
    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Resolve the identity of the file or directory at `path`.
    ///
    /// Only an I/O failure while probing a disc image is an error; paths
    /// that simply carry no identifier resolve to
    /// [`Resolution::Unresolved`].
    pub fn resolve(&self, path: &Path) -> Result<Resolution> {
        for &strategy in &self.strategies {
            if let Some(id) = self.apply(strategy, path)? {
                tracing::debug!(path = %path.display(), %id, ?strategy, "resolved game id");
                return Ok(Resolution::Resolved { id, strategy });
            }
        }
        tracing::debug!(path = %path.display(), "could not resolve game id");
        Ok(Resolution::Unresolved)
    }

    fn apply(&self, strategy: Strategy, path: &Path) -> Result<Option<GameId>> {
        match strategy {
            Strategy::FileName => Ok(path
                .file_name()
                .and_then(|name| recognize(&name.to_string_lossy()))),
            Strategy::ParentDir => Ok(path
                .parent()
                .and_then(Path::file_name)
                .and_then(|name| recognize(&name.to_string_lossy()))),
            Strategy::HeaderProbe => {
                let probeable =
                    DiscImageKind::from_path(path).is_some_and(DiscImageKind::is_uncompressed);
                if !probeable || path.is_dir() {
                    return Ok(None);
                }
                let mut file = File::open(path)?;
                probe_header(&mut file)
            }
        }
    }
}

/// Look for an identifier inside raw disc image bytes.
///
/// Tries the fixed descriptor offset first, then the first KiB. Both
/// windows are decoded as lossy text and searched with [`recognize`], so
/// `ULUS-10565` and `ULUS10565` are accepted alike. Images shorter than a
/// window are probed with whatever bytes exist.
pub fn probe_header<R: Read + Seek>(r: &mut R) -> Result<Option<GameId>> {
    for (offset, len) in [(HEADER_PROBE_OFFSET, HEADER_PROBE_LEN), (0, LEADING_PROBE_LEN)] {
        let window = read_bounded(r, offset, len)?;
        if let Some(id) = recognize(&String::from_utf8_lossy(&window)) {
            return Ok(Some(id));
        }
    }
    Ok(None)
}
