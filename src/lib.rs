//! **savehall** - a library for browsing emulator save data.
//!
//! Decodes the metadata PSP save folders carry, pulls preview screenshots
//! out of Snes9x snapshots, and works out which game a save folder or disc
//! image belongs to.
//!
//! # Modules
//! | Module | Purpose |
//! |--------|---------|
//! | [`formats::psf`]      | PSF / `PARAM.SFO` - save folder metadata |
//! | [`formats::snapshot`] | Snes9x snapshot - embedded preview image |
//! | [`id`]                | PSP game identifiers (`ULUS10565`) |
//! | [`resolver`]          | Game identity from names, parents and disc headers |
//! | [`disc_map`]          | Persisted id → disc image map and disc scanning |
//! | [`library`]           | PPSSPP and Snes9x save directory scanning |
//! | [`recent`]            | Emulator recently-opened lists |
//! | [`config`]            | Persisted emulator locations |
//! | [`image`]             | RGB rasters and optional PNG encoding |
//! | [`compression`]       | gzip handling for compressed snapshots |

pub mod compression;
pub mod config;
pub mod disc_map;
pub mod error;
pub mod formats;
pub mod id;
pub mod image;
pub mod library;
pub mod recent;
pub mod resolver;
mod utils;

pub use error::{Error, Result};
pub use id::GameId;
