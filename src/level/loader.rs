//! Raw plane codes → runtime [`TileMap`] plus spawns.
//!
//! ```text
//!   plane 0    1 ..= 63    wall picture
//!              90 ..= 101  door: even = vertical, odd = horizontal
//!                          90/91 plain, 92/93 gold, 94/95 silver,
//!                          100/101 elevator
//!              106 ..      floor (area = code - 106)
//!   plane 1    19 ..= 22   player start facing N, E, S, W
//!              23 ..= 70   static decoration
//!              98          pushable wall marker
//! ```

use log::{info, warn};

use super::{LevelError, LoadedLevel, RawLevel, SpriteSpawn};
use crate::{
    sim::SpriteVisual,
    world::{
        ANGLE_90, ANGLE_180, ANGLE_270, Camera, DoorLock, DoorOrientation, MAX_MAP_SIZE,
        MapError, SPRITE_TEXTURE_BASE, Tile, TileCode, TileCoord, TileMap, WallPic,
    },
};

/// First floor code; everything at or above is open space.
pub const AREA_TILE_BASE: u16 = 106;

const PUSHABLE_MARKER: u16 = 98;
const FIRST_STATIC: u16 = 23;
const LAST_STATIC: u16 = 70;

/// Static decorations the player cannot walk through.
pub const BLOCKING_STATICS: [u16; 21] = [
    24, 25, 26, 28, 30, 31, 33, 34, 35, 36, 39, 40, 41, 45, 58, 59, 60, 62, 63, 68, 69,
];

enum Plane0 {
    Wall(WallPic),
    Door(DoorOrientation, DoorLock),
    Floor(u16),
}

fn classify(code: u16) -> Option<Plane0> {
    match code {
        1..=63 => Some(Plane0::Wall(WallPic(code))),
        90..=95 | 100 | 101 => {
            let orientation = if code % 2 == 0 {
                DoorOrientation::Vertical
            } else {
                DoorOrientation::Horizontal
            };
            let lock = match (code - 90) / 2 {
                0 => DoorLock::Normal,
                1 => DoorLock::Gold,
                2 => DoorLock::Silver,
                _ => DoorLock::Elevator,
            };
            Some(Plane0::Door(orientation, lock))
        }
        AREA_TILE_BASE.. => Some(Plane0::Floor(code - AREA_TILE_BASE)),
        _ => None,
    }
}

impl RawLevel {
    /// Decode both planes; see [`build_map`].
    pub fn build(&self) -> Result<LoadedLevel, LevelError> {
        build_map(
            self.name(),
            self.header.width as usize,
            self.header.height as usize,
            &self.walls,
            &self.objects,
        )
    }
}

/// Convert raw planes into a validated [`TileMap`], the sprite spawns and
/// the player start.  Doors get table entries in row-major order.
pub fn build_map(
    name: &str,
    width: usize,
    height: usize,
    walls: &[u16],
    objects: &[u16],
) -> Result<LoadedLevel, LevelError> {
    check_planes(width, height, walls, objects)?;

    let mut codes = Vec::with_capacity(walls.len());
    let mut areas = Vec::with_capacity(walls.len());
    let mut doors = Vec::new();

    for (i, &raw) in walls.iter().enumerate() {
        let t = tile_at(i, width);
        match classify(raw) {
            Some(Plane0::Wall(pic)) => {
                codes.push(Tile::Solid { pic }.encode().map_err(MapError::from)?);
                areas.push(0);
            }
            Some(Plane0::Door(orientation, lock)) => {
                codes.push(TileCode::EMPTY);
                areas.push(0);
                doors.push((t, orientation, lock));
            }
            Some(Plane0::Floor(area)) => {
                codes.push(TileCode::EMPTY);
                areas.push(area);
            }
            None => {
                return Err(LevelError::UnknownCode {
                    x: t.x,
                    y: t.y,
                    code: raw,
                });
            }
        }
    }

    let mut map = TileMap::new(name, width, height, codes, areas)?;
    for (t, orientation, lock) in doors {
        map.add_door(t, orientation, lock)?;
    }

    let mut spawns = Vec::new();
    let mut player = None;
    for (i, &obj) in objects.iter().enumerate() {
        let t = tile_at(i, width);
        match obj {
            0 => {}
            19..=22 => {
                let angle = [ANGLE_90, 0, ANGLE_270, ANGLE_180][(obj - 19) as usize];
                player = Some(Camera::new(t.center(), angle));
            }
            PUSHABLE_MARKER => {
                if map.code(t).is_some_and(TileCode::is_solid) {
                    map.mark_pushable(t);
                } else {
                    warn!("pushable marker on non-wall tile {t:?}, ignored");
                }
            }
            FIRST_STATIC..=LAST_STATIC => spawns.push(SpriteSpawn {
                pos: t.center(),
                visual: SpriteVisual {
                    texture: SPRITE_TEXTURE_BASE + (obj - FIRST_STATIC),
                    translucent: false,
                },
                blocking: BLOCKING_STATICS.contains(&obj),
            }),
            _ => {}
        }
    }

    map.validate()?;
    info!(
        "level `{name}` {width}x{height}: {} doors, {} sprites",
        map.doors().len(),
        spawns.len()
    );
    Ok(LoadedLevel {
        map,
        spawns,
        player,
    })
}

/// Size and plane lengths, checked before any tile is addressed.
fn check_planes(
    width: usize,
    height: usize,
    walls: &[u16],
    objects: &[u16],
) -> Result<(), MapError> {
    if !(3..=MAX_MAP_SIZE).contains(&width) || !(3..=MAX_MAP_SIZE).contains(&height) {
        return Err(MapError::BadSize { width, height });
    }
    let expected = width * height;
    for (plane, len) in [("wall", walls.len()), ("object", objects.len())] {
        if len != expected {
            return Err(MapError::PlaneLength {
                plane,
                len,
                expected,
            });
        }
    }
    Ok(())
}

#[inline]
fn tile_at(i: usize, width: usize) -> TileCoord {
    TileCoord::new((i % width) as i32, (i / width) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 4x3, door (code 92: gold, vertical) at (1, 1), floor at (2, 1)
    const WALLS: [u16; 12] = [1, 1, 1, 1, 1, 92, 107, 1, 1, 1, 1, 1];

    #[test]
    fn doors_spawns_and_player() {
        let mut objects = [0u16; 12];
        objects[6] = 21; // player facing south
        objects[3] = PUSHABLE_MARKER;
        let level = build_map("t", 4, 3, &WALLS, &objects).unwrap();

        let door = &level.map.doors()[0];
        assert_eq!(door.tile, TileCoord::new(1, 1));
        assert_eq!(door.orientation, DoorOrientation::Vertical);
        assert_eq!(door.lock, DoorLock::Gold);
        assert_eq!(level.map.area(TileCoord::new(2, 1)), Some(1));
        assert!(level.map.is_pushable(TileCoord::new(3, 0)));

        let cam = level.player.unwrap();
        assert_eq!(cam.angle(), ANGLE_270);
        assert_eq!(cam.tile(), TileCoord::new(2, 1));
    }

    #[test]
    fn statics_become_sprites() {
        let mut objects = [0u16; 12];
        objects[6] = 24;
        let level = build_map("t", 4, 3, &WALLS, &objects).unwrap();
        assert_eq!(level.spawns.len(), 1);
        assert!(level.spawns[0].blocking);
        assert_eq!(level.spawns[0].visual.texture, SPRITE_TEXTURE_BASE + 1);
    }

    #[test]
    fn unknown_code_is_reported_with_position() {
        let mut walls = WALLS;
        walls[6] = 70;
        let err = build_map("t", 4, 3, &walls, &[0; 12]).unwrap_err();
        assert!(matches!(err, LevelError::UnknownCode { x: 2, y: 1, code: 70 }));
    }

    #[test]
    fn zero_width_is_rejected_before_decoding() {
        let err = build_map("z", 0, 3, &[1, 1, 1], &[0, 0, 0]).unwrap_err();
        assert!(matches!(
            err,
            LevelError::Map(MapError::BadSize { width: 0, height: 3 })
        ));
    }

    #[test]
    fn short_object_plane_is_rejected() {
        let err = build_map("t", 4, 3, &WALLS, &[0; 5]).unwrap_err();
        assert!(matches!(
            err,
            LevelError::Map(MapError::PlaneLength { plane: "object", len: 5, expected: 12 })
        ));
    }

    #[test]
    fn open_border_fails_validation() {
        let mut walls = WALLS;
        walls[0] = 107;
        let err = build_map("t", 4, 3, &walls, &[0; 12]).unwrap_err();
        assert!(matches!(err, LevelError::Map(MapError::OpenBorder { x: 0, y: 0 })));
    }
}
