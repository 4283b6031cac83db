//! Per-column grid traversal.
//!
//! The walk follows the classic two-intercept DDA: `xintercept` tracks
//! where the ray meets the next horizontal grid line, `yintercept` where
//! it meets the next vertical one.  Each iteration processes whichever
//! crossing comes first; on an exact corner the vertical crossing wins.
//!
//! ```text
//!        quadrant   x step   y step   xstep (dx per y tile)   ystep (dy per x tile)
//!        0  E→N       +1       -1      tan[899 - a]            -tan[a]
//!        1  N→W       -1       -1     -tan[a - 900]            -tan[1799 - a]
//!        2  W→S       -1       +1     -tan[2699 - a]            tan[a - 1800]
//!        3  S→E       +1       +1      tan[a - 2700]            tan[3599 - a]
//! ```

use glam::{Vec2, vec2};
use log::error;

use super::{
    tables::{MIN_DIST, ViewTables},
    visibility::VisibilityCollector,
};
use crate::world::{
    ANGLE_90, ANGLE_180, ANGLE_270, Axis, Camera, DOOR_TEXTURE_BASE, DoorIndex, DoorOrientation,
    FINE_ANGLES, Rect, TextureId, Tile, TileCode, TileCoord, TileMap, WallPic, normalize_angle,
    wall_face_texture,
};

const U_MAX: f32 = 1.0 - f32::EPSILON;

/// What a column terminated on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitKind {
    Solid,
    Door { index: DoorIndex },
    /// Keyed by the push-wall's current origin tile.
    PushWall { origin: TileCoord },
}

/// Terminal intersection of one screen column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub column: usize,
    pub kind: HitKind,
    /// Tile containing the intersected surface.
    pub tile: TileCoord,
    /// Grid-line family of the surface that was hit.
    pub face: Axis,
    /// Exact intercept on the map plane.
    pub point: Vec2,
    /// Texture column, `[0, 1)`, left to right as seen by the viewer.
    pub u: f32,
    pub texture: TextureId,
    /// Distance from the eye plane, never below [`MIN_DIST`].
    pub distance: f32,
    /// Grid-line crossings taken.
    pub steps: u32,
}

/// DDA state tags.  `entry` is set when the state was entered from the
/// other axis, whose check already established the ordering.
#[derive(Clone, Copy, Debug)]
enum RayState {
    CheckVertical { entry: bool },
    CheckHorizontal { entry: bool },
    ResolveVerticalHit(TileCoord, TileCode),
    ResolveHorizontalHit(TileCoord, TileCode),
    Done(Hit),
}

/// Door half lookup: `Some(u)` if the door blocks lateral fraction `f`.
///
/// The halves slide apart from the centre, so the gap is
/// `[0.5 - h, 0.5 + h)` with `h = openness / 2`.  `f == 0.5` belongs to
/// the upper half: blocked when closed, open as soon as `openness > 0`.
#[inline]
pub fn door_intercept(f: f32, openness: f32) -> Option<f32> {
    let h = openness.clamp(0.0, 1.0) * 0.5;
    if f < 0.5 {
        (f < 0.5 - h).then_some(f + h)
    } else {
        (f >= 0.5 + h).then_some(f - h)
    }
}

/// Ephemeral per-column walk state.
struct Ray {
    column: usize,
    origin: Vec2,
    forward: Vec2,
    xtilestep: i32,
    ytilestep: i32,
    xstep: f32,
    ystep: f32,
    xtile: i32,
    ytile: i32,
    xintercept: f32,
    yintercept: f32,
    steps: u32,
}

impl Ray {
    fn new(column: usize, view: &Camera, tables: &ViewTables) -> Self {
        let a = normalize_angle(view.angle() + tables.pixel_angle(column));
        let tan = |i| tables.tangent(i);

        let (xtilestep, ytilestep, xstep, ystep) = match a / ANGLE_90 {
            0 => (1, -1, tan(ANGLE_90 - 1 - a), -tan(a)),
            1 => (-1, -1, -tan(a - ANGLE_90), -tan(ANGLE_180 - 1 - a)),
            2 => (-1, 1, -tan(ANGLE_270 - 1 - a), tan(a - ANGLE_180)),
            _ => (1, 1, tan(a - ANGLE_270), tan(FINE_ANGLES - 1 - a)),
        };

        let p = view.pos();
        let focal = view.tile();
        let xpartial = if xtilestep > 0 {
            (focal.x + 1) as f32 - p.x
        } else {
            p.x - focal.x as f32
        };
        let ypartial = if ytilestep > 0 {
            (focal.y + 1) as f32 - p.y
        } else {
            p.y - focal.y as f32
        };

        Self {
            column,
            origin: p,
            forward: view.forward(),
            xtilestep,
            ytilestep,
            xstep,
            ystep,
            xtile: focal.x + xtilestep,
            ytile: focal.y + ytilestep,
            xintercept: p.x + xstep * ypartial,
            yintercept: p.y + ystep * xpartial,
            steps: 0,
        }
    }

    /// `x` of the vertical line crossed when entering `xtile`.
    #[inline]
    fn vertical_line(&self) -> f32 {
        (self.xtile + (self.xtilestep < 0) as i32) as f32
    }

    /// `y` of the horizontal line crossed when entering `ytile`.
    #[inline]
    fn horizontal_line(&self) -> f32 {
        (self.ytile + (self.ytilestep < 0) as i32) as f32
    }

    /// Direction per unit of x travel.
    #[inline]
    fn dir_per_x(&self) -> Vec2 {
        vec2(self.xtilestep as f32, self.ystep)
    }

    /// Direction per unit of y travel.
    #[inline]
    fn dir_per_y(&self) -> Vec2 {
        vec2(self.xstep, self.ytilestep as f32)
    }

    #[inline]
    fn advance_vertical(&mut self) {
        self.xtile += self.xtilestep;
        self.yintercept += self.ystep;
    }

    #[inline]
    fn advance_horizontal(&mut self) {
        self.ytile += self.ytilestep;
        self.xintercept += self.xstep;
    }

    fn hit(
        &self,
        kind: HitKind,
        tile: TileCoord,
        face: Axis,
        point: Vec2,
        u: f32,
        texture: TextureId,
    ) -> Hit {
        Hit {
            column: self.column,
            kind,
            tile,
            face,
            point,
            u: u.clamp(0.0, U_MAX),
            texture,
            distance: (point - self.origin).dot(self.forward).max(MIN_DIST),
            steps: self.steps,
        }
    }
}

/// Casts one ray per screen column through a [`TileMap`].
pub struct RayCaster<'a> {
    map: &'a TileMap,
    tables: &'a ViewTables,
}

impl<'a> RayCaster<'a> {
    pub fn new(map: &'a TileMap, tables: &'a ViewTables) -> Self {
        Self { map, tables }
    }

    /// Crossing budget; a bordered map is crossed in fewer.
    #[inline]
    fn step_bound(&self) -> u32 {
        (self.map.width() + self.map.height() + 2) as u32
    }

    /// Trace `column` from `view`, feeding every touched tile into `vis`.
    /// Always returns a hit.
    pub fn cast_column(&self, column: usize, view: &Camera, vis: &mut VisibilityCollector) -> Hit {
        let ray = Ray::new(column, view, self.tables);
        let focal = view.tile();
        vis.mark_passed(focal);

        if let Some(hit) = self.focal_pushwall(&ray, focal) {
            vis.record_hit(&hit);
            return hit;
        }
        self.trace(ray, vis)
    }

    /// DDA dispatch loop.
    fn trace(&self, mut ray: Ray, vis: &mut VisibilityCollector) -> Hit {
        let column = ray.column;
        let bound = self.step_bound();
        let mut state = RayState::CheckVertical { entry: false };

        let hit = loop {
            state = match state {
                RayState::CheckVertical { entry } => {
                    if !entry {
                        let line = ray.horizontal_line();
                        let horizontal_first = if ray.ytilestep > 0 {
                            ray.yintercept > line
                        } else {
                            ray.yintercept < line
                        };
                        if horizontal_first {
                            state = RayState::CheckHorizontal { entry: true };
                            continue;
                        }
                    }
                    ray.steps += 1;
                    let tile = TileCoord::new(ray.xtile, ray.ytile - ray.ytilestep);
                    match self.map.code(tile) {
                        None => RayState::Done(self.border_hit(&ray, tile, Axis::Vertical)),
                        Some(code) if code.is_empty() => {
                            vis.mark_passed(tile);
                            ray.advance_vertical();
                            RayState::CheckVertical { entry: false }
                        }
                        Some(code) => RayState::ResolveVerticalHit(tile, code),
                    }
                }

                RayState::CheckHorizontal { entry } => {
                    if !entry {
                        let line = ray.vertical_line();
                        let vertical_first = if ray.xtilestep > 0 {
                            ray.xintercept >= line
                        } else {
                            ray.xintercept <= line
                        };
                        if vertical_first {
                            state = RayState::CheckVertical { entry: true };
                            continue;
                        }
                    }
                    ray.steps += 1;
                    let tile = TileCoord::new(ray.xtile - ray.xtilestep, ray.ytile);
                    match self.map.code(tile) {
                        None => RayState::Done(self.border_hit(&ray, tile, Axis::Horizontal)),
                        Some(code) if code.is_empty() => {
                            vis.mark_passed(tile);
                            ray.advance_horizontal();
                            RayState::CheckHorizontal { entry: false }
                        }
                        Some(code) => RayState::ResolveHorizontalHit(tile, code),
                    }
                }

                RayState::ResolveVerticalHit(tile, code) => {
                    match self.resolve(&ray, tile, code, Axis::Vertical, vis) {
                        Some(hit) => RayState::Done(hit),
                        None => {
                            ray.advance_vertical();
                            RayState::CheckVertical { entry: false }
                        }
                    }
                }

                RayState::ResolveHorizontalHit(tile, code) => {
                    match self.resolve(&ray, tile, code, Axis::Horizontal, vis) {
                        Some(hit) => RayState::Done(hit),
                        None => {
                            ray.advance_horizontal();
                            RayState::CheckHorizontal { entry: false }
                        }
                    }
                }

                RayState::Done(hit) => break hit,
            };

            if ray.steps > bound {
                debug_assert!(false, "column {column} exceeded {bound} grid crossings");
                error!(
                    "column {column} exceeded {bound} grid crossings at {:?}; forcing a solid hit",
                    (ray.xtile, ray.ytile)
                );
                let tile = TileCoord::new(ray.xtile, ray.ytile - ray.ytilestep);
                break self.border_hit(&ray, tile, Axis::Vertical);
            }
        };

        vis.record_hit(&hit);
        hit
    }

    /*──────────────────────── tile dispatch ─────────────────────────*/

    /// Resolve a non-empty tile entered across a line of `axis`.
    /// `None` means the ray continues.
    fn resolve(
        &self,
        ray: &Ray,
        tile: TileCoord,
        code: TileCode,
        axis: Axis,
        vis: &mut VisibilityCollector,
    ) -> Option<Hit> {
        match code.decode() {
            Tile::Empty => {
                vis.mark_passed(tile);
                None
            }
            Tile::Solid { pic } => Some(self.solid_hit(ray, tile, pic, axis)),
            Tile::Door { index } => {
                vis.mark_door(tile);
                let hit = self.door_hit(ray, tile, index, axis);
                if hit.is_none() {
                    vis.mark_passed(tile);
                }
                hit
            }
            Tile::PushWall { pic } => {
                let Some(pw) = self.map.pushwall_at(tile) else {
                    return Some(self.solid_hit(ray, tile, pic, axis));
                };
                let (from, dir) = match axis {
                    Axis::Vertical => (vec2(ray.vertical_line(), ray.yintercept), ray.dir_per_x()),
                    Axis::Horizontal => {
                        (vec2(ray.xintercept, ray.horizontal_line()), ray.dir_per_y())
                    }
                };
                let hit = self.pushwall_hit(ray, tile, pw.origin, pw.block(), pw.pic, from, dir, axis);
                if hit.is_none() {
                    vis.mark_passed(tile);
                }
                hit
            }
        }
    }

    fn solid_hit(&self, ray: &Ray, tile: TileCoord, pic: WallPic, axis: Axis) -> Hit {
        let (point, u, came_from) = match axis {
            Axis::Vertical => {
                let f = ray.yintercept - tile.y as f32;
                let u = if ray.xtilestep > 0 { f } else { 1.0 - f };
                let from = TileCoord::new(tile.x - ray.xtilestep, tile.y);
                (vec2(ray.vertical_line(), ray.yintercept), u, from)
            }
            Axis::Horizontal => {
                let f = ray.xintercept - tile.x as f32;
                let u = if ray.ytilestep < 0 { f } else { 1.0 - f };
                let from = TileCoord::new(tile.x, tile.y - ray.ytilestep);
                (vec2(ray.xintercept, ray.horizontal_line()), u, from)
            }
        };
        let texture = wall_face_texture(pic, axis, self.map.code(came_from));
        ray.hit(HitKind::Solid, tile, axis, point, u, texture)
    }

    /// Outside the map everything is wall.
    fn border_hit(&self, ray: &Ray, tile: TileCoord, axis: Axis) -> Hit {
        self.solid_hit(ray, tile, WallPic(1), axis)
    }

    /// Door test at the slab's mid-plane.
    fn door_hit(&self, ray: &Ray, tile: TileCoord, index: DoorIndex, axis: Axis) -> Option<Hit> {
        let (orientation, openness, texture) = match self.map.door(index) {
            Some(d) => (d.orientation, d.openness, d.texture()),
            // unregistered index: a closed door across the crossing
            None => {
                let o = match axis {
                    Axis::Vertical => DoorOrientation::Vertical,
                    Axis::Horizontal => DoorOrientation::Horizontal,
                };
                (o, 0.0, DOOR_TEXTURE_BASE)
            }
        };

        let (point, f) = match (axis, orientation) {
            (Axis::Vertical, DoorOrientation::Vertical) => {
                let x = ray.vertical_line() + 0.5 * ray.xtilestep as f32;
                let y = ray.yintercept + 0.5 * ray.ystep;
                (vec2(x, y), y - tile.y as f32)
            }
            (Axis::Horizontal, DoorOrientation::Horizontal) => {
                let y = ray.horizontal_line() + 0.5 * ray.ytilestep as f32;
                let x = ray.xintercept + 0.5 * ray.xstep;
                (vec2(x, y), x - tile.x as f32)
            }
            // entered through a jamb side: intersect the plane directly
            (Axis::Vertical, DoorOrientation::Horizontal) => {
                let plane = tile.y as f32 + 0.5;
                let t = (plane - ray.yintercept) / ray.ystep;
                if !(0.0..=1.0).contains(&t) {
                    return None;
                }
                let x = ray.vertical_line() + t * ray.xtilestep as f32;
                (vec2(x, plane), x - tile.x as f32)
            }
            (Axis::Horizontal, DoorOrientation::Vertical) => {
                let plane = tile.x as f32 + 0.5;
                let t = (plane - ray.xintercept) / ray.xstep;
                if !(0.0..=1.0).contains(&t) {
                    return None;
                }
                let y = ray.horizontal_line() + t * ray.ytilestep as f32;
                (vec2(plane, y), y - tile.y as f32)
            }
        };

        // left the tile before reaching the plane
        if !(0.0..1.0).contains(&f) {
            return None;
        }
        let u = door_intercept(f, openness)?;
        Some(ray.hit(
            HitKind::Door { index },
            tile,
            orientation.axis(),
            point,
            u,
            texture,
        ))
    }

    /// Entry into the part of a sliding block that lies inside `tile`.
    #[allow(clippy::too_many_arguments)]
    fn pushwall_hit(
        &self,
        ray: &Ray,
        tile: TileCoord,
        origin: TileCoord,
        block: Rect,
        pic: WallPic,
        from: Vec2,
        dir: Vec2,
        entry_axis: Axis,
    ) -> Option<Hit> {
        let region = block.intersect(&Rect::tile(tile))?;
        let (t, axis) = region.ray_entry(from, dir, entry_axis)?;
        let point = from + dir * t;
        let u = match axis {
            Axis::Vertical => {
                let f = point.y - block.min.y;
                if dir.x > 0.0 { f } else { 1.0 - f }
            }
            Axis::Horizontal => {
                let f = point.x - block.min.x;
                if dir.y < 0.0 { f } else { 1.0 - f }
            }
        };
        Some(ray.hit(
            HitKind::PushWall { origin },
            tile,
            axis,
            point,
            u,
            pic.texture(axis),
        ))
    }

    /// A block sliding through the viewer's own tile is met before any
    /// grid crossing.
    fn focal_pushwall(&self, ray: &Ray, focal: TileCoord) -> Option<Hit> {
        let Tile::PushWall { .. } = self.map.code(focal)?.decode() else {
            return None;
        };
        let pw = self.map.pushwall_at(focal)?;
        let hit = self.pushwall_hit(
            ray,
            focal,
            pw.origin,
            pw.block(),
            pw.pic,
            ray.origin,
            ray.dir_per_x(),
            Axis::Vertical,
        )?;
        // standing inside the block: look through it
        (hit.point != ray.origin).then_some(hit)
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tables::RenderConfig;
    use crate::level::ascii;
    use crate::world::{Dir, Tile};

    fn tables(width: usize) -> ViewTables {
        ViewTables::new(&RenderConfig {
            width,
            height: 8,
            fov_degrees: 90.0,
        })
        .unwrap()
    }

    fn cast(map: &TileMap, view: &Camera, width: usize, column: usize) -> Hit {
        let t = tables(width);
        let mut vis = VisibilityCollector::new(map.width(), map.height());
        RayCaster::new(map, &t).cast_column(column, view, &mut vis)
    }

    #[test]
    fn door_intercept_tie_break() {
        // closed: every fraction blocks
        assert_eq!(door_intercept(0.5, 0.0), Some(0.5));
        assert_eq!(door_intercept(0.0, 0.0), Some(0.0));
        // any opening frees the centre line
        assert_eq!(door_intercept(0.5, 0.01), None);
        // half open: gap is [0.25, 0.75)
        assert_eq!(door_intercept(0.2, 0.5), Some(0.45));
        assert_eq!(door_intercept(0.25, 0.5), None);
        assert_eq!(door_intercept(0.74, 0.5), None);
        assert_eq!(door_intercept(0.75, 0.5), Some(0.5));
        // fully open: nothing blocks
        assert_eq!(door_intercept(0.0, 1.0), None);
        assert_eq!(door_intercept(0.999, 1.0), None);
    }

    #[test]
    fn straight_ahead_hits_east_wall() {
        let level = ascii::parse(
            "#####\n\
             #...#\n\
             #####\n",
        )
        .unwrap();
        let view = Camera::new(vec2(1.5, 1.5), 0);
        let hit = cast(&level.map, &view, 1, 0);
        assert_eq!(hit.kind, HitKind::Solid);
        assert_eq!(hit.tile, TileCoord::new(4, 1));
        assert_eq!(hit.face, Axis::Vertical);
        assert!((hit.point.x - 4.0).abs() < 1e-5);
        assert!((hit.distance - 2.5).abs() < 1e-3);
        // west-facing face: u runs with y
        assert!((hit.u - 0.5).abs() < 1e-2);
        assert_eq!(hit.texture, WallPic(1).texture(Axis::Vertical));
    }

    #[test]
    fn every_quadrant_terminates_on_the_border() {
        let level = ascii::parse(
            "######\n\
             #....#\n\
             #....#\n\
             #....#\n\
             ######\n",
        )
        .unwrap();
        let t = tables(4);
        let rc = RayCaster::new(&level.map, &t);
        let mut vis = VisibilityCollector::new(level.map.width(), level.map.height());
        for a in (0..FINE_ANGLES).step_by(7) {
            let view = Camera::new(vec2(2.3, 2.6), a);
            for c in 0..4 {
                let hit = rc.cast_column(c, &view, &mut vis);
                assert_eq!(hit.kind, HitKind::Solid, "angle {a}");
                assert!(level.map.tile(hit.tile) != Tile::Empty, "angle {a}");
                assert!((0.0..1.0).contains(&hit.u));
                assert!(hit.steps <= 10);
            }
        }
    }

    #[test]
    fn exact_corner_prefers_vertical_crossing() {
        // (2,3) is reached across x = 2, (1,2) across y = 3; a perfect
        // diagonal meets both lines at the same corner.
        let level = ascii::parse(
            "#####\n\
             #...#\n\
             #.#.#\n\
             #.#.#\n\
             #####\n",
        )
        .unwrap();
        let t = tables(1);
        let mut ray = Ray::new(0, &Camera::new(vec2(1.5, 3.5), 450), &t);
        ray.xstep = 1.0;
        ray.ystep = -1.0;
        ray.xintercept = 2.0;
        ray.yintercept = 3.0;

        let mut vis = VisibilityCollector::new(level.map.width(), level.map.height());
        let hit = RayCaster::new(&level.map, &t).trace(ray, &mut vis);
        assert_eq!(hit.tile, TileCoord::new(2, 3));
        assert_eq!(hit.face, Axis::Vertical);
        assert_eq!(hit.point, vec2(2.0, 3.0));
    }

    #[test]
    fn jamb_texture_next_to_door() {
        let mut level = ascii::parse(
            "#####\n\
             #.|.#\n\
             #####\n",
        )
        .unwrap();
        level.map.set_door_openness(0, 1.0);
        // looking north from inside the open door tile
        let view = Camera::new(vec2(2.5, 1.5), ANGLE_90);
        let hit = cast(&level.map, &view, 1, 0);
        assert_eq!(hit.tile, TileCoord::new(2, 0));
        assert_eq!(hit.face, Axis::Horizontal);
        assert_eq!(hit.texture, crate::world::DOOR_JAMB_TEXTURE);
    }

    #[test]
    fn closed_door_blocks_at_mid_plane() {
        let level = ascii::parse(
            "######\n\
             #.|..#\n\
             ######\n",
        )
        .unwrap();
        let view = Camera::new(vec2(1.5, 1.5), 0);
        let hit = cast(&level.map, &view, 1, 0);
        assert_eq!(hit.kind, HitKind::Door { index: 0 });
        assert_eq!(hit.tile, TileCoord::new(2, 1));
        assert!((hit.point.x - 2.5).abs() < 1e-5);
        assert_eq!(hit.face, Axis::Vertical);
    }

    #[test]
    fn pushwall_hit_tracks_slide() {
        let mut level = ascii::parse(
            "#######\n\
             #.P...#\n\
             #######\n",
        )
        .unwrap();
        let start = TileCoord::new(2, 1);
        level.map.start_pushwall(start, Dir::East).unwrap();
        let view = Camera::new(vec2(1.5, 1.5), 0);

        for (slide, face_x) in [(0.0, 2.0), (0.4, 2.4), (0.9, 2.9)] {
            if let Some(pw) = level.map.pushwall_mut(start) {
                pw.slide = slide;
            }
            let hit = cast(&level.map, &view, 1, 0);
            assert_eq!(hit.kind, HitKind::PushWall { origin: start });
            assert!((hit.point.x - face_x).abs() < 1e-4, "slide {slide}");
            assert_eq!(hit.face, Axis::Vertical);
        }
    }
}
