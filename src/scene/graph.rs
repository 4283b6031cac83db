use std::collections::HashMap;

use log::{debug, info, warn};
use smallvec::{SmallVec, smallvec};

use super::{
    buffer::{QUADS_PER_SLOT, SceneBuffers, SlotId},
    object::{
        ObjectKind, SceneObject, Side, box_face, door_faces, door_halves, rect_plane,
    },
};
use crate::world::{
    Axis, Dir, DoorIndex, MapError, PushWall, Rect, TextureId, Tile, TileCoord, TileMap, WallPic,
    wall_face_texture,
};

/// Tiles whose wall faces may change together.
type TileList = SmallVec<[TileCoord; 16]>;

/// Tile-keyed arena of persistent scene objects.
///
/// Objects are created on level load and rewritten only by the world
/// events that affect them; each owns exactly one slot of
/// [`SceneBuffers`] for its whole life.
#[derive(Debug, Default)]
pub struct SceneGraph {
    buffers: SceneBuffers,
    walls: HashMap<TileCoord, SceneObject>,
    doors: HashMap<TileCoord, SceneObject>,
    pushwalls: HashMap<TileCoord, SceneObject>,
    door_tiles: Vec<TileCoord>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /*──────────────────────────── queries ────────────────────────────*/

    pub fn buffers(&self) -> &SceneBuffers {
        &self.buffers
    }

    pub fn buffers_mut(&mut self) -> &mut SceneBuffers {
        &mut self.buffers
    }

    pub fn object(&self, kind: ObjectKind, t: TileCoord) -> Option<&SceneObject> {
        match kind {
            ObjectKind::Wall => self.walls.get(&t),
            ObjectKind::Door => self.doors.get(&t),
            ObjectKind::PushWall => self.pushwalls.get(&t),
        }
    }

    pub fn wall(&self, t: TileCoord) -> Option<&SceneObject> {
        self.walls.get(&t)
    }

    pub fn door(&self, t: TileCoord) -> Option<&SceneObject> {
        self.doors.get(&t)
    }

    /// Push-wall objects are keyed by their current origin tile.
    pub fn pushwall(&self, origin: TileCoord) -> Option<&SceneObject> {
        self.pushwalls.get(&origin)
    }

    pub fn door_tile(&self, index: DoorIndex) -> Option<TileCoord> {
        self.door_tiles.get(index as usize).copied()
    }

    pub fn object_count(&self) -> usize {
        self.walls.len() + self.doors.len() + self.pushwalls.len()
    }

    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.walls
            .values()
            .chain(self.doors.values())
            .chain(self.pushwalls.values())
    }

    /*────────────────────────── level load ───────────────────────────*/

    /// Validate `map` and rebuild every object from scratch.  On error
    /// the graph keeps its previous contents.
    pub fn on_level_load(&mut self, map: &TileMap) -> Result<(), MapError> {
        map.validate()?;
        self.clear();

        self.door_tiles = map.doors().iter().map(|d| d.tile).collect();
        for t in map.coords() {
            match map.tile(t) {
                Tile::Empty => {}
                Tile::Solid { .. } => self.insert_wall(map, t),
                Tile::Door { index } => self.insert_door(map, t, index),
                Tile::PushWall { .. } => {
                    if let Some(pw) = map.pushwalls().iter().find(|p| p.origin == t) {
                        let slot = self.buffers.alloc();
                        self.place_pushwall(pw, slot);
                    }
                }
            }
        }

        info!(
            "scene for `{}`: {} walls, {} doors, {} push-walls, {} slots",
            map.name(),
            self.walls.len(),
            self.doors.len(),
            self.pushwalls.len(),
            self.buffers.capacity()
        );
        Ok(())
    }

    fn clear(&mut self) {
        self.buffers.reset();
        self.walls.clear();
        self.doors.clear();
        self.pushwalls.clear();
        self.door_tiles.clear();
    }

    /*─────────────────────────── world events ──────────────────────────*/

    /// Rewrite door `index`'s halves from its current openness.
    pub fn on_door_moved(&mut self, map: &TileMap, index: DoorIndex) {
        let (Some(t), Some(door)) = (self.door_tile(index), map.door(index)) else {
            debug!("door {index} moved but is not in the scene");
            return;
        };
        let Some(mut obj) = self.doors.remove(&t) else {
            debug!("door {index} at {t:?} has no scene object");
            return;
        };
        self.write_door(&mut obj, door.orientation.axis(), door.openness, door.texture());
        self.doors.insert(t, obj);
    }

    /// A push-wall advanced.  `(x, y)` is the origin it was keyed by before
    /// this step; on the first step that is still a wall object, which is
    /// converted in place and keeps its slot.
    pub fn on_pushwall_step(&mut self, map: &TileMap, x: i32, y: i32) {
        let key = TileCoord::new(x, y);
        let Some(pw) = find_pushwall(map, key) else {
            debug!("push-wall step at {key:?} with no moving wall");
            return;
        };

        let slot = match self.pushwalls.remove(&key) {
            Some(obj) => obj.slot,
            None => match self.walls.remove(&key) {
                Some(obj) => obj.slot,
                None => {
                    warn!("push-wall at {key:?} had no scene object; allocating");
                    self.buffers.alloc()
                }
            },
        };
        self.place_pushwall(pw, slot);

        let mut touched: TileList = smallvec![key, pw.origin, pw.ahead()];
        touched.dedup();
        self.refresh_around(map, &touched);
    }

    /// A push-wall stopped: its object is destroyed and a wall object is
    /// created at the resting tile.
    pub fn on_pushwall_reached_wall(
        &mut self,
        map: &TileMap,
        old_x: i32,
        old_y: i32,
        new_x: i32,
        new_y: i32,
    ) {
        let old = TileCoord::new(old_x, old_y);
        let new = TileCoord::new(new_x, new_y);

        match self.pushwalls.remove(&old) {
            Some(obj) => self.buffers.free(obj.slot),
            None => debug!("push-wall at {old:?} already gone"),
        }
        if let Some(obj) = self.walls.remove(&new) {
            self.buffers.free(obj.slot);
        }

        match map.tile(new) {
            Tile::Solid { .. } => self.insert_wall(map, new),
            other => warn!("push-wall came to rest at {new:?} but the tile is {other:?}"),
        }
        let touched: TileList = smallvec![old, new];
        self.refresh_around(map, &touched);
    }

    /// Re-select the textures of the wall at `(x, y)`; geometry is kept.
    pub fn on_wall_switch_toggled(&mut self, map: &TileMap, x: i32, y: i32) {
        let t = TileCoord::new(x, y);
        let Tile::Solid { pic } = map.tile(t) else {
            debug!("switch toggled on non-wall tile {t:?}");
            return;
        };
        let Some(obj) = self.walls.get_mut(&t) else {
            debug!("switch toggled at {t:?} with no wall object");
            return;
        };
        for side in obj.sides.iter_mut() {
            side.texture = wall_texture(map, t, pic, side.facing);
        }
    }

    /*──────────────────────── object builders ────────────────────────*/

    fn insert_wall(&mut self, map: &TileMap, t: TileCoord) {
        let slot = self.buffers.alloc();
        let mut obj = SceneObject {
            kind: ObjectKind::Wall,
            tile: t,
            slot,
            sides: SmallVec::new(),
        };
        self.write_wall(map, &mut obj);
        self.walls.insert(t, obj);
    }

    fn insert_door(&mut self, map: &TileMap, t: TileCoord, index: DoorIndex) {
        let Some(door) = map.door(index) else {
            return;
        };
        let slot = self.buffers.alloc();
        let mut obj = SceneObject {
            kind: ObjectKind::Door,
            tile: t,
            slot,
            sides: SmallVec::new(),
        };
        self.write_door(&mut obj, door.orientation.axis(), door.openness, door.texture());
        self.doors.insert(t, obj);
    }

    /// One quad per compass side; faces against solid neighbours stay
    /// inactive and zeroed.
    fn write_wall(&mut self, map: &TileMap, obj: &mut SceneObject) {
        let t = obj.tile;
        let Tile::Solid { pic } = map.tile(t) else {
            return;
        };
        let rect = Rect::tile(t);
        obj.sides.clear();
        for (q, dir) in Dir::ALL.into_iter().enumerate() {
            let active = !map.hides_face(t.step(dir));
            obj.sides.push(Side {
                active,
                texture: wall_texture(map, t, pic, dir),
                facing: dir,
                plane: rect_plane(&rect, dir),
                first_quad: q as u8,
                quad_count: 1,
            });
            if active {
                self.buffers.write_quad(obj.slot, q, &box_face(&rect, dir));
            } else {
                self.buffers.clear_quad(obj.slot, q);
            }
        }
    }

    /// Two faces, each made of two sliding halves.
    fn write_door(
        &mut self,
        obj: &mut SceneObject,
        axis: Axis,
        openness: f32,
        texture: TextureId,
    ) {
        let t = obj.tile;
        let plane = match axis {
            Axis::Vertical => t.x as f32 + 0.5,
            Axis::Horizontal => t.y as f32 + 0.5,
        };
        obj.sides.clear();
        for (i, facing) in door_faces(axis).into_iter().enumerate() {
            let first = i * 2;
            obj.sides.push(Side {
                active: openness < 1.0,
                texture,
                facing,
                plane,
                first_quad: first as u8,
                quad_count: 2,
            });
            for (k, half) in door_halves(t, axis, facing, openness).iter().enumerate() {
                match half {
                    Some(q) => self.buffers.write_quad(obj.slot, first + k, q),
                    None => self.buffers.clear_quad(obj.slot, first + k),
                }
            }
        }
    }

    /// (Re)build the push-wall object for `pw` in `slot`, keyed by origin.
    fn place_pushwall(&mut self, pw: &PushWall, slot: SlotId) {
        let block = pw.block();
        let mut sides = SmallVec::new();
        for (q, dir) in Dir::ALL.into_iter().enumerate() {
            sides.push(Side {
                active: true,
                texture: pw.pic.texture(dir.face_axis()),
                facing: dir,
                plane: rect_plane(&block, dir),
                first_quad: q as u8,
                quad_count: 1,
            });
            self.buffers.write_quad(slot, q, &box_face(&block, dir));
        }
        debug_assert_eq!(sides.len(), QUADS_PER_SLOT);
        self.pushwalls.insert(
            pw.origin,
            SceneObject {
                kind: ObjectKind::PushWall,
                tile: pw.origin,
                slot,
                sides,
            },
        );
    }

    /// Rebuild wall objects on and around `tiles` whose exposure may have
    /// changed.
    fn refresh_around(&mut self, map: &TileMap, tiles: &[TileCoord]) {
        let mut seen: TileList = SmallVec::new();
        for &t in tiles {
            for n in std::iter::once(t).chain(Dir::ALL.into_iter().map(|d| t.step(d))) {
                if seen.contains(&n) {
                    continue;
                }
                seen.push(n);
                let Some(mut obj) = self.walls.remove(&n) else {
                    continue;
                };
                if let Tile::Solid { .. } = map.tile(n) {
                    self.write_wall(map, &mut obj);
                    self.walls.insert(n, obj);
                } else {
                    // a push-wall left before its step events were applied
                    debug!("dropping wall object at {n:?}, tile is no longer solid");
                    self.buffers.free(obj.slot);
                }
            }
        }
    }
}

/// The moving wall that was keyed at `key`: either still there, or one
/// tile further along its track.
fn find_pushwall(map: &TileMap, key: TileCoord) -> Option<&PushWall> {
    map.pushwalls()
        .iter()
        .find(|p| p.origin == key || p.origin.step(p.dir.opposite()) == key)
}

#[inline]
fn wall_texture(map: &TileMap, t: TileCoord, pic: WallPic, dir: Dir) -> TextureId {
    wall_face_texture(pic, dir.face_axis(), map.code(t.step(dir)))
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
