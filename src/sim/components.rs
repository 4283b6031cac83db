use glam::Vec2;

use crate::world::TextureId;

/// Map-plane position in tile units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub Vec2);

/// How a sprite entity is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteVisual {
    pub texture: TextureId,
    /// Cloaked actors are blended instead of drawn opaque.
    pub translucent: bool,
}

/// Marks an entity that keeps doors from closing on it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blocking;
