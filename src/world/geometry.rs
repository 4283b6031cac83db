use glam::{IVec2, Vec2, vec2};

/// Integer coordinate of one map cell.  `x` grows east, `y` grows south.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell that contains the world point `p`.
    #[inline]
    pub fn containing(p: Vec2) -> Self {
        Self::new(p.x.floor() as i32, p.y.floor() as i32)
    }

    /// Neighbour one tile away in `dir`.
    #[inline]
    pub fn step(self, dir: Dir) -> Self {
        let d = dir.delta();
        Self::new(self.x + d.x, self.y + d.y)
    }

    /// North-west corner in world units.
    #[inline]
    pub fn origin(self) -> Vec2 {
        vec2(self.x as f32, self.y as f32)
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        self.origin() + Vec2::splat(0.5)
    }
}

impl From<(i32, i32)> for TileCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Which family of grid lines a ray crossed.
///
/// * `Vertical`   – a line `x = const`; the face hit points east or west.
/// * `Horizontal` – a line `y = const`; the face hit points north or south.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// Compass direction on the map plane (north is `-y`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dir {
    North,
    East,
    South,
    West,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::North, Dir::East, Dir::South, Dir::West];

    #[inline]
    pub fn delta(self) -> IVec2 {
        match self {
            Dir::North => IVec2::new(0, -1),
            Dir::East => IVec2::new(1, 0),
            Dir::South => IVec2::new(0, 1),
            Dir::West => IVec2::new(-1, 0),
        }
    }

    #[inline]
    pub fn opposite(self) -> Dir {
        match self {
            Dir::North => Dir::South,
            Dir::East => Dir::West,
            Dir::South => Dir::North,
            Dir::West => Dir::East,
        }
    }

    /// Grid-line family a face pointing this way lies on.
    #[inline]
    pub fn face_axis(self) -> Axis {
        match self {
            Dir::North | Dir::South => Axis::Horizontal,
            Dir::East | Dir::West => Axis::Vertical,
        }
    }

    /// Stable 0‥3 index (N, E, S, W) used for per-side arrays.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Axis-aligned rectangle on the map plane, `min` inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn tile(t: TileCoord) -> Self {
        Self::new(t.origin(), t.origin() + Vec2::ONE)
    }

    /// Overlap of two rectangles, `None` when they only touch or miss.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        (min.x < max.x && min.y < max.y).then_some(Rect::new(min, max))
    }

    /// Slab test for the half-line `from + t * dir`, `t >= 0`.
    ///
    /// Returns the entry parameter and the grid-line family of the face
    /// that was entered first.  A start point already on or inside the
    /// rectangle reports `t = 0` on `entry_axis`.
    pub fn ray_entry(&self, from: Vec2, dir: Vec2, entry_axis: Axis) -> Option<(f32, Axis)> {
        let (tx0, tx1) = slab(from.x, dir.x, self.min.x, self.max.x)?;
        let (ty0, ty1) = slab(from.y, dir.y, self.min.y, self.max.y)?;

        let (t_enter, axis) = if tx0 > ty0 {
            (tx0, Axis::Vertical)
        } else {
            (ty0, Axis::Horizontal)
        };
        let t_exit = tx1.min(ty1);

        if t_exit < 0.0 || t_enter > t_exit {
            return None;
        }
        if t_enter <= 0.0 {
            return Some((0.0, entry_axis));
        }
        Some((t_enter, axis))
    }
}

/// Entry / exit parameters of a ray against the slab `[lo, hi]`.
fn slab(origin: f32, dir: f32, lo: f32, hi: f32) -> Option<(f32, f32)> {
    if dir == 0.0 {
        return (lo..=hi)
            .contains(&origin)
            .then_some((f32::NEG_INFINITY, f32::INFINITY));
    }
    let a = (lo - origin) / dir;
    let b = (hi - origin) / dir;
    Some((a.min(b), a.max(b)))
}
