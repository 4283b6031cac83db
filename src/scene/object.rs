use glam::Vec2;
use smallvec::SmallVec;

use super::buffer::{Quad, SHADE_HORIZONTAL, SHADE_VERTICAL, SceneVertex, SlotId};
use crate::world::{Axis, Dir, Rect, TextureId, TileCoord};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Wall,
    Door,
    PushWall,
}

/// One oriented face of a scene object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Side {
    pub active: bool,
    pub texture: TextureId,
    /// Outward normal.
    pub facing: Dir,
    /// Coordinate of the face plane on its axis (`x` for east/west faces,
    /// `y` for north/south faces).
    pub plane: f32,
    pub first_quad: u8,
    pub quad_count: u8,
}

impl Side {
    /// True if `eye` is on the outward side of the face plane.
    #[inline]
    pub fn faces(&self, eye: Vec2) -> bool {
        match self.facing {
            Dir::North => eye.y < self.plane,
            Dir::South => eye.y > self.plane,
            Dir::West => eye.x < self.plane,
            Dir::East => eye.x > self.plane,
        }
    }
}

/// Persistent renderable for one occupied tile.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    pub kind: ObjectKind,
    pub tile: TileCoord,
    pub slot: SlotId,
    pub sides: SmallVec<[Side; 4]>,
}

impl SceneObject {
    pub fn active_sides(&self) -> impl Iterator<Item = (usize, &Side)> {
        self.sides.iter().enumerate().filter(|(_, s)| s.active)
    }
}

/*──────────────────────────── quad builders ───────────────────────────*/

#[inline]
pub fn shade(axis: Axis) -> f32 {
    match axis {
        Axis::Horizontal => SHADE_HORIZONTAL,
        Axis::Vertical => SHADE_VERTICAL,
    }
}

/// Unit-height quad from `a` (left, as seen from outside) to `b`.
///
/// Vertex order is `a_bottom, b_bottom, b_top, a_top`.
pub fn face_quad(a: Vec2, b: Vec2, ua: f32, ub: f32, shade: f32) -> Quad {
    let v = |p: Vec2, h: f32, u: f32, t: f32| SceneVertex {
        position: [p.x, h, p.y],
        uv: [u, t],
        shade,
    };
    [
        v(a, 0.0, ua, 1.0),
        v(b, 0.0, ub, 1.0),
        v(b, 1.0, ub, 0.0),
        v(a, 1.0, ua, 0.0),
    ]
}

/// Face endpoints of `rect` on side `dir`, left then right.
pub fn rect_edge(rect: &Rect, dir: Dir) -> (Vec2, Vec2) {
    let (lo, hi) = (rect.min, rect.max);
    match dir {
        Dir::North => (Vec2::new(hi.x, lo.y), lo),
        Dir::South => (Vec2::new(lo.x, hi.y), hi),
        Dir::East => (hi, Vec2::new(hi.x, lo.y)),
        Dir::West => (lo, Vec2::new(lo.x, hi.y)),
    }
}

/// Plane coordinate of side `dir` of `rect`.
pub fn rect_plane(rect: &Rect, dir: Dir) -> f32 {
    match dir {
        Dir::North => rect.min.y,
        Dir::South => rect.max.y,
        Dir::West => rect.min.x,
        Dir::East => rect.max.x,
    }
}

/// Full-width textured face of `rect`.
pub fn box_face(rect: &Rect, dir: Dir) -> Quad {
    let (a, b) = rect_edge(rect, dir);
    face_quad(a, b, 0.0, 1.0, shade(dir.face_axis()))
}

/// Outward faces of a door slab lying on `axis` grid lines.
pub fn door_faces(axis: Axis) -> [Dir; 2] {
    match axis {
        Axis::Vertical => [Dir::West, Dir::East],
        Axis::Horizontal => [Dir::North, Dir::South],
    }
}

/// The two sliding halves of a door face, `None` when fully retracted.
///
/// Lateral fraction `f` runs along `+y` for vertical doors and `+x` for
/// horizontal ones; `u` follows the same fraction on both faces so the
/// texture lines up with what a ray reports.
pub fn door_halves(tile: TileCoord, axis: Axis, facing: Dir, openness: f32) -> [Option<Quad>; 2] {
    let h = openness.clamp(0.0, 1.0) * 0.5;
    let at = |f: f32| match axis {
        Axis::Vertical => Vec2::new(tile.x as f32 + 0.5, tile.y as f32 + f),
        Axis::Horizontal => Vec2::new(tile.x as f32 + f, tile.y as f32 + 0.5),
    };
    // east and north faces see +f on their left
    let reversed = matches!(facing, Dir::East | Dir::North);
    let half = |f0: f32, f1: f32, u0: f32, u1: f32| {
        if f1 - f0 <= 0.0 {
            return None;
        }
        let s = shade(axis);
        Some(if reversed {
            face_quad(at(f1), at(f0), u1, u0, s)
        } else {
            face_quad(at(f0), at(f1), u0, u1, s)
        })
    };
    [
        half(0.0, 0.5 - h, h, 0.5),
        half(0.5 + h, 1.0, 0.5, 1.0 - h),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    #[test]
    fn box_face_runs_left_to_right_from_outside() {
        let r = Rect::tile(TileCoord::new(2, 1));
        // west face seen from x < 2: left is north (y = 1)
        let q = box_face(&r, Dir::West);
        assert_eq!(q[0].position, [2.0, 0.0, 1.0]);
        assert_eq!(q[1].position, [2.0, 0.0, 2.0]);
        assert_eq!(q[2].uv, [1.0, 0.0]);
        assert_eq!(q[0].shade, SHADE_VERTICAL);
        // south face: left is west
        let q = box_face(&r, Dir::South);
        assert_eq!(q[0].position, [2.0, 0.0, 2.0]);
        assert_eq!(q[1].position, [3.0, 0.0, 2.0]);
        assert_eq!(q[0].shade, SHADE_HORIZONTAL);
    }

    #[test]
    fn side_facing_test() {
        let s = Side {
            active: true,
            texture: 0,
            facing: Dir::West,
            plane: 2.0,
            first_quad: 3,
            quad_count: 1,
        };
        assert!(s.faces(vec2(1.5, 1.5)));
        assert!(!s.faces(vec2(2.5, 1.5)));
        assert!(!s.faces(vec2(2.0, 1.5)));
    }

    #[test]
    fn closed_door_halves_meet_in_the_middle() {
        let [lo, hi] = door_halves(TileCoord::new(3, 4), Axis::Vertical, Dir::West, 0.0);
        let (lo, hi) = (lo.unwrap(), hi.unwrap());
        assert_eq!(lo[0].position, [3.5, 0.0, 4.0]);
        assert_eq!(lo[1].position, [3.5, 0.0, 4.5]);
        assert_eq!(hi[0].position, [3.5, 0.0, 4.5]);
        assert_eq!(lo[1].uv[0], 0.5);
        assert_eq!(hi[0].uv[0], 0.5);
    }

    #[test]
    fn half_open_door_u_is_shifted_by_half_the_opening() {
        let [lo, hi] = door_halves(TileCoord::new(0, 0), Axis::Horizontal, Dir::South, 0.5);
        let (lo, hi) = (lo.unwrap(), hi.unwrap());
        // lower half covers x in [0, 0.25] showing u in [0.25, 0.5]
        assert_eq!(lo[0].position[0], 0.0);
        assert_eq!(lo[1].position[0], 0.25);
        assert_eq!(lo[0].uv[0], 0.25);
        assert_eq!(hi[1].uv[0], 0.75);
    }

    #[test]
    fn open_door_has_no_halves() {
        let halves = door_halves(TileCoord::new(0, 0), Axis::Vertical, Dir::East, 1.0);
        assert!(halves.iter().all(Option::is_none));
    }
}
