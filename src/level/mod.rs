//! Level data: the binary container, the raw-code loader and a small
//! textual syntax for tests and demos.

pub mod ascii;
mod loader;
mod raw;

use glam::Vec2;
use std::io;
use thiserror::Error;

pub use loader::{AREA_TILE_BASE, BLOCKING_STATICS, build_map};
pub use raw::{HEADER_SIZE, LEVEL_MAGIC, LevelHeader, RawLevel};

use crate::{
    sim::SpriteVisual,
    world::{Camera, MapError, TileMap},
};

/// A sprite entity to create when the level starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteSpawn {
    pub pos: Vec2,
    pub visual: SpriteVisual,
    pub blocking: bool,
}

/// Everything a level file describes, in runtime form.
#[derive(Clone, Debug)]
pub struct LoadedLevel {
    pub map: TileMap,
    pub spawns: Vec<SpriteSpawn>,
    /// Player start, if the level has one.
    pub player: Option<Camera>,
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("not a level file (magic {0:?})")]
    BadMagic([u8; 4]),

    #[error("level header: {0}")]
    Header(#[from] bincode::error::DecodeError),

    #[error("level header: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("{plane} plane truncated: expected {expected} words")]
    Truncated { plane: &'static str, expected: usize },

    #[error("unknown map code {code} at ({x}, {y})")]
    UnknownCode { x: i32, y: i32, code: u16 },

    #[error("line {line}: unexpected character {ch:?} in column {column}")]
    BadChar { line: usize, column: usize, ch: char },

    #[error("line {line} is {len} tiles wide, expected {expected}")]
    RaggedRow {
        line: usize,
        len: usize,
        expected: usize,
    },

    #[error(transparent)]
    Map(#[from] MapError),
}
