//! Wall-plane tile codes.
//!
//! The integer layout is the save-game / level-data contract and must not
//! change:
//!
//! ```text
//!   0                      empty
//!   0x80 | 0x40 | pic      push-wall track, pic in the low 6 bits
//!   0x80 | index           door, index into the door table (low 7 bits)
//!   1 ..= 0x7f             solid wall picture
//! ```
//!
//! The rest of the crate branches on [`Tile`], produced by
//! [`TileCode::decode`]; the hot path may still compare raw codes.

use bitflags::bitflags;
use thiserror::Error;

use super::{
    geometry::Axis,
    texture::{DOOR_JAMB_TEXTURE, TextureId},
};

pub type DoorIndex = u8;

bitflags! {
    /// Marker bits of a tile code.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TileBits: u16 {
        const SPECIAL = 0x0080;
        const SLIDING = 0x0040;
    }
}

pub const DOOR_INDEX_MASK: u16 = 0x007f;
pub const PUSHWALL_PIC_MASK: u16 = 0x003f;

/// Doors are addressed by 7 bits, but bit 6 doubles as the sliding
/// marker, so only the low 64 indices are encodable.
pub const MAX_DOORS: usize = 64;

/// Highest picture a solid wall may carry (`SPECIAL` must stay clear).
pub const MAX_WALL_PIC: u16 = 0x7f;

/// Highest picture a push-wall track may carry.
pub const MAX_PUSHWALL_PIC: u16 = PUSHWALL_PIC_MASK;

/// Raw, bit-packed wall-plane value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TileCode(pub u16);

/// Wall picture number; one picture owns two textures, the lighter one
/// for north/south faces and the darker one for east/west faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WallPic(pub u16);

impl WallPic {
    /// Texture for a face lying on `axis` grid lines.
    #[inline]
    pub fn texture(self, axis: Axis) -> TextureId {
        let base = self.0.saturating_sub(1).saturating_mul(2);
        match axis {
            Axis::Horizontal => base,
            Axis::Vertical => base.saturating_add(1),
        }
    }
}

/// Decoded meaning of a tile code; exactly one variant applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    Empty,
    Solid { pic: WallPic },
    Door { index: DoorIndex },
    PushWall { pic: WallPic },
}

/// Coarse classification, handy for sets and logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileKind {
    Empty,
    Solid,
    Door,
    PushWall,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TileError {
    #[error("wall picture {0} outside 1..=127")]
    WallPic(u16),

    #[error("push-wall picture {0} outside 1..=63")]
    PushWallPic(u16),

    #[error("door index {0} exceeds the 64-entry door table")]
    DoorIndex(DoorIndex),
}

impl TileCode {
    pub const EMPTY: TileCode = TileCode(0);

    /// Total decode: every 16-bit value maps to exactly one [`Tile`].
    #[inline]
    pub fn decode(self) -> Tile {
        if self.0 == 0 {
            return Tile::Empty;
        }
        let bits = TileBits::from_bits_truncate(self.0);
        if !bits.contains(TileBits::SPECIAL) {
            return Tile::Solid {
                pic: WallPic(self.0),
            };
        }
        if bits.contains(TileBits::SLIDING) {
            Tile::PushWall {
                pic: WallPic(self.0 & PUSHWALL_PIC_MASK),
            }
        } else {
            Tile::Door {
                index: (self.0 & DOOR_INDEX_MASK) as DoorIndex,
            }
        }
    }

    #[inline]
    pub fn kind(self) -> TileKind {
        self.decode().kind()
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Solid walls hide the faces of their neighbours; nothing else does.
    #[inline]
    pub fn is_solid(self) -> bool {
        self.0 != 0 && self.0 & TileBits::SPECIAL.bits() == 0
    }
}

impl Tile {
    /// Inverse of [`TileCode::decode`] for values inside the code space.
    pub fn encode(self) -> Result<TileCode, TileError> {
        match self {
            Tile::Empty => Ok(TileCode::EMPTY),
            Tile::Solid { pic } => {
                if pic.0 == 0 || pic.0 > MAX_WALL_PIC {
                    return Err(TileError::WallPic(pic.0));
                }
                Ok(TileCode(pic.0))
            }
            Tile::Door { index } => {
                if index as usize >= MAX_DOORS {
                    return Err(TileError::DoorIndex(index));
                }
                Ok(TileCode(TileBits::SPECIAL.bits() | index as u16))
            }
            Tile::PushWall { pic } => {
                if pic.0 == 0 || pic.0 > MAX_PUSHWALL_PIC {
                    return Err(TileError::PushWallPic(pic.0));
                }
                Ok(TileCode((TileBits::SPECIAL | TileBits::SLIDING).bits() | pic.0))
            }
        }
    }

    pub fn kind(self) -> TileKind {
        match self {
            Tile::Empty => TileKind::Empty,
            Tile::Solid { .. } => TileKind::Solid,
            Tile::Door { .. } => TileKind::Door,
            Tile::PushWall { .. } => TileKind::PushWall,
        }
    }
}

/// Texture for the face of a solid wall that looks onto `neighbour`.
///
/// Faces next to a door show the door frame instead of the wall picture.
#[inline]
pub fn wall_face_texture(pic: WallPic, axis: Axis, neighbour: Option<TileCode>) -> TextureId {
    match neighbour.map(TileCode::decode) {
        Some(Tile::Door { .. }) => DOOR_JAMB_TEXTURE + (axis == Axis::Vertical) as TextureId,
        _ => pic.texture(axis),
    }
}
