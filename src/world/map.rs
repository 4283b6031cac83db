use std::collections::BTreeSet;

use glam::Vec2;
use thiserror::Error;

use super::{
    geometry::{Axis, Dir, Rect, TileCoord},
    texture::{DOOR_TEXTURE_BASE, TextureId},
    tile::{DoorIndex, MAX_DOORS, Tile, TileCode, TileError, WallPic},
};

/// Largest map edge accepted by the loader.
pub const MAX_MAP_SIZE: usize = 256;

/// Plane a door slab lies on.
///
/// A `Vertical` door spans north–south and is walked through east–west,
/// so rays meet it on vertical grid-line crossings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DoorOrientation {
    Vertical,
    Horizontal,
}

impl DoorOrientation {
    /// Grid-line family the door plane is parallel to.
    #[inline]
    pub fn axis(self) -> Axis {
        match self {
            DoorOrientation::Vertical => Axis::Vertical,
            DoorOrientation::Horizontal => Axis::Horizontal,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DoorLock {
    Normal = 0,
    Gold = 1,
    Silver = 2,
    Elevator = 3,
}

/// One door-table entry.  `openness` is written by the simulation only.
#[derive(Clone, Debug, PartialEq)]
pub struct Door {
    pub tile: TileCoord,
    pub orientation: DoorOrientation,
    pub lock: DoorLock,
    /// 0.0 closed … 1.0 fully open.
    pub openness: f32,
}

impl Door {
    pub fn new(tile: TileCoord, orientation: DoorOrientation, lock: DoorLock) -> Self {
        Self {
            tile,
            orientation,
            lock,
            openness: 0.0,
        }
    }

    /// Face texture; the darker variant is used on vertical doors.
    #[inline]
    pub fn texture(&self) -> TextureId {
        DOOR_TEXTURE_BASE
            + 2 * self.lock as TextureId
            + (self.orientation == DoorOrientation::Vertical) as TextureId
    }
}

/// A wall block sliding out of its slot.
///
/// The block covers the unit square of `origin` displaced by
/// `slide * dir`; both `origin` and `origin + dir` carry a push-wall track
/// code while it moves.
#[derive(Clone, Debug, PartialEq)]
pub struct PushWall {
    pub origin: TileCoord,
    pub dir: Dir,
    /// 0.0 ..< 1.0 of a tile along `dir`.
    pub slide: f32,
    pub pic: WallPic,
}

impl PushWall {
    /// World-space square currently covered by the block.
    pub fn block(&self) -> Rect {
        let min = self.origin.origin() + self.dir.delta().as_vec2() * self.slide;
        Rect::new(min, min + Vec2::ONE)
    }

    /// The tile the block is sliding into.
    #[inline]
    pub fn ahead(&self) -> TileCoord {
        self.origin.step(self.dir)
    }

    #[inline]
    pub fn covers(&self, t: TileCoord) -> bool {
        t == self.origin || t == self.ahead()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum MapError {
    #[error("map size {width}x{height} outside 3..=256")]
    BadSize { width: usize, height: usize },

    #[error("{plane} plane has {len} tiles, expected {expected}")]
    PlaneLength {
        plane: &'static str,
        len: usize,
        expected: usize,
    },

    #[error("border tile ({x}, {y}) is not a solid wall")]
    OpenBorder { x: i32, y: i32 },

    #[error("tile ({x}, {y}) references door {index} which is not in the door table")]
    UnknownDoor { x: i32, y: i32, index: DoorIndex },

    #[error("door {index} is registered at ({x}, {y}) but the tile code disagrees")]
    DoorMismatch { x: i32, y: i32, index: DoorIndex },

    #[error("tile ({x}, {y}) carries a push-wall track code with no moving wall")]
    StrayPushWall { x: i32, y: i32 },

    #[error("door table is full (64 entries)")]
    TooManyDoors,

    #[error("tile ({x}, {y}) is not a pushable wall with free space behind it")]
    CannotPush { x: i32, y: i32 },

    #[error("tile ({x}, {y}) outside the map")]
    OutOfBounds { x: i32, y: i32 },

    #[error(transparent)]
    Tile(#[from] TileError),
}

/// The authoritative tile grid.
///
/// Two parallel planes: `walls` (tile codes) and `areas` (area/trigger
/// metadata, opaque to the renderer), plus the door table, the pushable
/// markers and the push-walls currently in motion.
#[derive(Clone, Debug)]
pub struct TileMap {
    name: String,
    width: usize,
    height: usize,
    walls: Vec<TileCode>,
    areas: Vec<u16>,
    doors: Vec<Door>,
    pushables: BTreeSet<TileCoord>,
    pushwalls: Vec<PushWall>,
}

impl TileMap {
    /// Build a map from its two planes; the result is *not* validated,
    /// see [`TileMap::validate`].
    pub fn new(
        name: impl Into<String>,
        width: usize,
        height: usize,
        walls: Vec<TileCode>,
        areas: Vec<u16>,
    ) -> Result<Self, MapError> {
        if !(3..=MAX_MAP_SIZE).contains(&width) || !(3..=MAX_MAP_SIZE).contains(&height) {
            return Err(MapError::BadSize { width, height });
        }
        let expected = width * height;
        if walls.len() != expected {
            return Err(MapError::PlaneLength {
                plane: "wall",
                len: walls.len(),
                expected,
            });
        }
        if areas.len() != expected {
            return Err(MapError::PlaneLength {
                plane: "area",
                len: areas.len(),
                expected,
            });
        }
        Ok(Self {
            name: name.into(),
            width,
            height,
            walls,
            areas,
            doors: Vec::new(),
            pushables: BTreeSet::new(),
            pushwalls: Vec::new(),
        })
    }

    /*──────────────────────────── queries ────────────────────────────*/

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, t: TileCoord) -> bool {
        t.x >= 0 && t.y >= 0 && (t.x as usize) < self.width && (t.y as usize) < self.height
    }

    #[inline]
    fn index(&self, t: TileCoord) -> Option<usize> {
        self.in_bounds(t)
            .then(|| t.y as usize * self.width + t.x as usize)
    }

    /// Raw code at `t`; `None` outside the map.
    #[inline]
    pub fn code(&self, t: TileCoord) -> Option<TileCode> {
        self.index(t).map(|i| self.walls[i])
    }

    /// Decoded tile; out-of-map cells read as solid so rays and faces
    /// treat the outside like an unbroken border.
    #[inline]
    pub fn tile(&self, t: TileCoord) -> Tile {
        match self.code(t) {
            Some(c) => c.decode(),
            None => Tile::Solid { pic: WallPic(1) },
        }
    }

    /// True if a neighbour at `t` hides the adjoining face.
    #[inline]
    pub fn hides_face(&self, t: TileCoord) -> bool {
        self.code(t).is_none_or(TileCode::is_solid)
    }

    pub fn area(&self, t: TileCoord) -> Option<u16> {
        self.index(t).map(|i| self.areas[i])
    }

    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    pub fn door(&self, index: DoorIndex) -> Option<&Door> {
        self.doors.get(index as usize)
    }

    /// Openness of door `index`; unknown doors read as closed.
    #[inline]
    pub fn door_openness(&self, index: DoorIndex) -> f32 {
        self.door(index).map_or(0.0, |d| d.openness)
    }

    pub fn pushwalls(&self) -> &[PushWall] {
        &self.pushwalls
    }

    /// Moving wall whose track includes `t`.
    pub fn pushwall_at(&self, t: TileCoord) -> Option<&PushWall> {
        self.pushwalls.iter().find(|p| p.covers(t))
    }

    /// Slide fraction of the wall moving through `t`, if any.
    pub fn pushwall_slide(&self, t: TileCoord) -> Option<f32> {
        self.pushwall_at(t).map(|p| p.slide)
    }

    pub fn is_pushable(&self, t: TileCoord) -> bool {
        self.pushables.contains(&t)
    }

    /// Every tile coordinate, row-major.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (0..self.height as i32)
            .flat_map(move |y| (0..self.width as i32).map(move |x| TileCoord::new(x, y)))
    }

    /*────────────────────────── validation ───────────────────────────*/

    /// Reject maps the renderer cannot trace safely.
    pub fn validate(&self) -> Result<(), MapError> {
        for t in self.coords() {
            let on_border = t.x == 0
                || t.y == 0
                || t.x as usize == self.width - 1
                || t.y as usize == self.height - 1;
            let tile = self.tile(t);

            if on_border && !matches!(tile, Tile::Solid { .. }) {
                return Err(MapError::OpenBorder { x: t.x, y: t.y });
            }
            match tile {
                Tile::Door { index } => match self.door(index) {
                    None => {
                        return Err(MapError::UnknownDoor {
                            x: t.x,
                            y: t.y,
                            index,
                        });
                    }
                    Some(d) if d.tile != t => {
                        return Err(MapError::DoorMismatch {
                            x: t.x,
                            y: t.y,
                            index,
                        });
                    }
                    Some(_) => {}
                },
                Tile::PushWall { .. } if self.pushwall_at(t).is_none() => {
                    return Err(MapError::StrayPushWall { x: t.x, y: t.y });
                }
                _ => {}
            }
        }
        for (i, d) in self.doors.iter().enumerate() {
            let ok = matches!(self.tile(d.tile), Tile::Door { index } if index as usize == i);
            if !ok {
                return Err(MapError::DoorMismatch {
                    x: d.tile.x,
                    y: d.tile.y,
                    index: i as DoorIndex,
                });
            }
        }
        Ok(())
    }

    /*──────────── mutation (level builder and simulation only) ───────────*/

    pub fn set_code(&mut self, t: TileCoord, code: TileCode) -> Result<(), MapError> {
        let i = self
            .index(t)
            .ok_or(MapError::OutOfBounds { x: t.x, y: t.y })?;
        self.walls[i] = code;
        Ok(())
    }

    /// Register a door at `t` and stamp its code into the wall plane.
    pub fn add_door(
        &mut self,
        t: TileCoord,
        orientation: DoorOrientation,
        lock: DoorLock,
    ) -> Result<DoorIndex, MapError> {
        if self.doors.len() >= MAX_DOORS {
            return Err(MapError::TooManyDoors);
        }
        let index = self.doors.len() as DoorIndex;
        let code = Tile::Door { index }.encode()?;
        self.set_code(t, code)?;
        self.doors.push(Door::new(t, orientation, lock));
        Ok(index)
    }

    pub fn mark_pushable(&mut self, t: TileCoord) {
        self.pushables.insert(t);
    }

    pub fn set_door_openness(&mut self, index: DoorIndex, openness: f32) {
        if let Some(d) = self.doors.get_mut(index as usize) {
            d.openness = openness.clamp(0.0, 1.0);
        }
    }

    /// Turn the pushable wall at `t` into a moving block heading `dir`.
    pub fn start_pushwall(&mut self, t: TileCoord, dir: Dir) -> Result<(), MapError> {
        let ahead = t.step(dir);
        let pic = match self.tile(t) {
            Tile::Solid { pic } if self.is_pushable(t) && self.code(ahead) == Some(TileCode::EMPTY) => pic,
            _ => return Err(MapError::CannotPush { x: t.x, y: t.y }),
        };
        let track = Tile::PushWall { pic }.encode()?;
        self.set_code(t, track)?;
        self.set_code(ahead, track)?;
        self.pushables.remove(&t);
        self.pushwalls.push(PushWall {
            origin: t,
            dir,
            slide: 0.0,
            pic,
        });
        Ok(())
    }

    pub fn pushwall_mut(&mut self, origin: TileCoord) -> Option<&mut PushWall> {
        self.pushwalls.iter_mut().find(|p| p.origin == origin)
    }

    /// Move the track one tile forward: `origin` empties, the block now
    /// sits fully in the old `ahead` tile.  When `extend` is set the next
    /// tile becomes track as well.
    pub fn advance_pushwall(&mut self, origin: TileCoord, extend: bool) -> Result<TileCoord, MapError> {
        let (pic, dir) = match self.pushwall_mut(origin) {
            Some(p) => (p.pic, p.dir),
            None => return Err(MapError::StrayPushWall { x: origin.x, y: origin.y }),
        };
        let next = origin.step(dir);
        self.set_code(origin, TileCode::EMPTY)?;
        if extend {
            let track = Tile::PushWall { pic }.encode()?;
            self.set_code(next.step(dir), track)?;
        }
        if let Some(p) = self.pushwall_mut(origin) {
            p.origin = next;
            p.slide = 0.0;
        }
        Ok(next)
    }

    /// Bring the wall moving from `origin` to rest as a solid wall on its
    /// current origin tile.
    pub fn settle_pushwall(&mut self, origin: TileCoord) -> Result<(), MapError> {
        let pos = self
            .pushwalls
            .iter()
            .position(|p| p.origin == origin)
            .ok_or(MapError::StrayPushWall { x: origin.x, y: origin.y })?;
        let pw = self.pushwalls.remove(pos);
        let solid = Tile::Solid { pic: pw.pic }.encode()?;
        self.set_code(pw.origin, solid)?;
        if self.code(pw.ahead()).is_some_and(|c| c.decode() == (Tile::PushWall { pic: pw.pic })) {
            self.set_code(pw.ahead(), TileCode::EMPTY)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 5×5 box with a hollow 3×3 centre.
    fn boxed() -> TileMap {
        let (w, h) = (5, 5);
        let mut walls = vec![TileCode(1); w * h];
        for y in 1..4 {
            for x in 1..4 {
                walls[y * w + x] = TileCode::EMPTY;
            }
        }
        TileMap::new("box", w, h, walls, vec![0; w * h]).unwrap()
    }

    #[test]
    fn closed_box_validates() {
        assert_eq!(boxed().validate(), Ok(()));
    }

    #[test]
    fn open_border_rejected() {
        let mut m = boxed();
        m.set_code(TileCoord::new(0, 2), TileCode::EMPTY).unwrap();
        assert_eq!(m.validate(), Err(MapError::OpenBorder { x: 0, y: 2 }));
    }

    #[test]
    fn plane_length_checked() {
        let err = TileMap::new("bad", 4, 4, vec![TileCode(1); 15], vec![0; 16]).unwrap_err();
        assert_eq!(
            err,
            MapError::PlaneLength {
                plane: "wall",
                len: 15,
                expected: 16
            }
        );
    }

    #[test]
    fn stray_door_code_rejected() {
        let mut m = boxed();
        m.set_code(TileCoord::new(2, 2), TileCode(0x83)).unwrap();
        assert_eq!(
            m.validate(),
            Err(MapError::UnknownDoor { x: 2, y: 2, index: 3 })
        );
    }

    #[test]
    fn door_registration_round_trip() {
        let mut m = boxed();
        let t = TileCoord::new(2, 2);
        let idx = m.add_door(t, DoorOrientation::Vertical, DoorLock::Gold).unwrap();
        assert_eq!(m.tile(t), Tile::Door { index: idx });
        assert_eq!(m.door(idx).unwrap().texture(), DOOR_TEXTURE_BASE + 3);
        m.set_door_openness(idx, 2.0);
        assert_eq!(m.door_openness(idx), 1.0);
        assert_eq!(m.validate(), Ok(()));
    }

    #[test]
    fn outside_reads_solid() {
        let m = boxed();
        assert!(matches!(m.tile(TileCoord::new(-1, 0)), Tile::Solid { .. }));
        assert!(m.hides_face(TileCoord::new(9, 9)));
        assert!(!m.hides_face(TileCoord::new(2, 2)));
    }

    #[test]
    fn pushwall_lifecycle() {
        let mut m = boxed();
        let start = TileCoord::new(2, 2);
        m.set_code(start, TileCode(4)).unwrap();
        assert!(m.start_pushwall(start, Dir::East).is_err(), "not pushable yet");
        m.mark_pushable(start);
        m.start_pushwall(start, Dir::East).unwrap();

        assert_eq!(m.tile(start), Tile::PushWall { pic: WallPic(4) });
        assert_eq!(m.tile(start.step(Dir::East)), Tile::PushWall { pic: WallPic(4) });
        assert_eq!(m.validate(), Ok(()));

        let next = m.advance_pushwall(start, false).unwrap();
        assert_eq!(next, TileCoord::new(3, 2));
        assert_eq!(m.tile(start), Tile::Empty);

        m.settle_pushwall(next).unwrap();
        assert_eq!(m.tile(next), Tile::Solid { pic: WallPic(4) });
        assert!(m.pushwalls().is_empty());
        assert_eq!(m.validate(), Ok(()));
    }

    #[test]
    fn pushwall_block_follows_slide() {
        let pw = PushWall {
            origin: TileCoord::new(2, 3),
            dir: Dir::North,
            slide: 0.25,
            pic: WallPic(1),
        };
        let b = pw.block();
        assert_eq!(b.min, glam::vec2(2.0, 2.75));
        assert_eq!(b.max, glam::vec2(3.0, 3.75));
        assert!(pw.covers(TileCoord::new(2, 2)));
    }
}
