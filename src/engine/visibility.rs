use bitflags::bitflags;
use hecs::{Entity, World};

use super::{
    raycast::{Hit, HitKind},
    tables::MIN_DIST,
};
use crate::{
    sim::{Position, SpriteVisual},
    world::{Camera, TileCoord},
};

bitflags! {
    /// What touched a tile during the current frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct VisMarks: u8 {
        const PASSED   = 1 << 0;
        const WALL     = 1 << 1;
        const DOOR     = 1 << 2;
        const PUSHWALL = 1 << 3;
    }
}

/// Per-frame visibility sets.
///
/// A dense mark grid answers "was this tile touched" in O(1); the ordered
/// lists keep first-touch order so draw lists come out deterministic.
#[derive(Clone, Debug, Default)]
pub struct VisibilityCollector {
    width: usize,
    height: usize,
    marks: Vec<VisMarks>,
    walls: Vec<TileCoord>,
    doors: Vec<TileCoord>,
    pushwalls: Vec<TileCoord>,
    sprites: Vec<Entity>,
}

impl VisibilityCollector {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            marks: vec![VisMarks::empty(); width * height],
            ..Default::default()
        }
    }

    /// Re-dimension for a new level; also clears.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.marks.clear();
        self.marks.resize(width * height, VisMarks::empty());
        self.clear_lists();
    }

    /// Forget everything recorded by the previous frame.
    pub fn begin_frame(&mut self) {
        self.marks.fill(VisMarks::empty());
        self.clear_lists();
    }

    fn clear_lists(&mut self) {
        self.walls.clear();
        self.doors.clear();
        self.pushwalls.clear();
        self.sprites.clear();
    }

    #[inline]
    fn slot(&self, t: TileCoord) -> Option<usize> {
        (t.x >= 0 && t.y >= 0 && (t.x as usize) < self.width && (t.y as usize) < self.height)
            .then(|| t.y as usize * self.width + t.x as usize)
    }

    /// Set `mark` on `t`; true if it was not set before.
    #[inline]
    fn mark(&mut self, t: TileCoord, mark: VisMarks) -> bool {
        match self.slot(t) {
            Some(i) if !self.marks[i].contains(mark) => {
                self.marks[i] |= mark;
                true
            }
            _ => false,
        }
    }

    pub fn marks(&self, t: TileCoord) -> VisMarks {
        self.slot(t).map_or(VisMarks::empty(), |i| self.marks[i])
    }

    /// The ray crossed `t` without stopping.
    #[inline]
    pub fn mark_passed(&mut self, t: TileCoord) {
        self.mark(t, VisMarks::PASSED);
    }

    /// A ray entered door tile `t`, whether or not it got through.
    pub fn mark_door(&mut self, t: TileCoord) {
        if self.mark(t, VisMarks::DOOR) {
            self.doors.push(t);
        }
    }

    /// Record the terminal hit of a column.
    pub fn record_hit(&mut self, hit: &Hit) {
        match hit.kind {
            HitKind::Solid => {
                if self.mark(hit.tile, VisMarks::WALL) {
                    self.walls.push(hit.tile);
                }
            }
            HitKind::Door { .. } => self.mark_door(hit.tile),
            HitKind::PushWall { origin } => {
                if self.mark(origin, VisMarks::PUSHWALL) {
                    self.pushwalls.push(origin);
                }
            }
        }
    }

    /// Collect sprites standing on tiles the rays reached and lying in
    /// front of the eye plane.  Call after every column is cast.
    pub fn cull_sprites(&mut self, world: &World, view: &Camera) {
        self.sprites.clear();
        let reach = VisMarks::PASSED | VisMarks::DOOR;
        for (e, (pos, _)) in world.query::<(&Position, &SpriteVisual)>().iter() {
            let seen = self.marks(TileCoord::containing(pos.0)).intersects(reach);
            if seen && view.to_cam(pos.0).y > MIN_DIST {
                self.sprites.push(e);
            }
        }
    }

    pub fn walls(&self) -> &[TileCoord] {
        &self.walls
    }

    pub fn doors(&self) -> &[TileCoord] {
        &self.doors
    }

    /// Push-wall origins.
    pub fn pushwalls(&self) -> &[TileCoord] {
        &self.pushwalls
    }

    pub fn sprites(&self) -> &[Entity] {
        &self.sprites
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
