mod camera;
mod geometry;
mod map;
mod texture;
mod tile;

pub use camera::{
    ANGLE_90, ANGLE_180, ANGLE_270, Camera, FINE_ANGLES, fine_to_radians, normalize_angle,
};

pub use geometry::{Axis, Dir, Rect, TileCoord};

pub use map::{
    Door, DoorLock, DoorOrientation, MAX_MAP_SIZE, MapError, PushWall, TileMap,
};

pub use texture::{
    DOOR_JAMB_TEXTURE, DOOR_TEXTURE_BASE, NO_TEXTURE, Palette, SPRITE_TEXTURE_BASE,
    TRANSPARENT_TEXEL, Texture, TextureBank, TextureError, TextureId, TextureSource,
};

pub use tile::{
    DoorIndex, MAX_DOORS, MAX_PUSHWALL_PIC, MAX_WALL_PIC, Tile, TileBits, TileCode, TileError,
    TileKind, WallPic, wall_face_texture,
};
