use glam::{Vec2, vec2};

use super::geometry::TileCoord;

/// Fine angle units per full turn.
pub const FINE_ANGLES: i32 = 3600;
pub const ANGLE_90: i32 = FINE_ANGLES / 4;
pub const ANGLE_180: i32 = ANGLE_90 * 2;
pub const ANGLE_270: i32 = ANGLE_90 * 3;

/// Radians of a fine angle.
#[inline]
pub fn fine_to_radians(angle: i32) -> f32 {
    angle as f32 * std::f32::consts::TAU / FINE_ANGLES as f32
}

/// Wrap any fine angle into `[0, FINE_ANGLES)`.
#[inline]
pub fn normalize_angle(angle: i32) -> i32 {
    angle.rem_euclid(FINE_ANGLES)
}

/// Player view-point on the map plane.
///
/// * `pos` is in tile units, `x` east and `y` south.
/// * `angle` is a fine angle: 0 = east, counter-clockwise, so 900 looks
///   north (towards `-y`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pos: Vec2,
    angle: i32,
}

impl Camera {
    pub fn new(pos: Vec2, angle: i32) -> Self {
        Self {
            pos,
            angle: normalize_angle(angle),
        }
    }

    /// Same as [`Camera::new`] with the heading given in degrees.
    pub fn from_degrees(pos: Vec2, degrees: f32) -> Self {
        let fine = (degrees * FINE_ANGLES as f32 / 360.0).round() as i32;
        Self::new(pos, fine)
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn set_pos(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    /// Heading in fine units, `[0, FINE_ANGLES)`.
    #[inline]
    pub fn angle(&self) -> i32 {
        self.angle
    }

    /// Tile the eye is standing in.
    #[inline]
    pub fn tile(&self) -> TileCoord {
        TileCoord::containing(self.pos)
    }

    /// Transform a map point `p` into camera-local coords:
    ///  .x = lateral offset (+ right)
    ///  .y = depth along forward axis
    #[inline]
    pub fn to_cam(&self, p: Vec2) -> Vec2 {
        let d = p - self.pos;
        vec2(d.dot(self.right()), d.dot(self.forward()))
    }

    /// Distance of `p` from the eye plane; what column heights scale by.
    #[inline]
    pub fn perp_distance(&self, p: Vec2) -> f32 {
        (p - self.pos).dot(self.forward())
    }

    /*──────────────────────── derived vectors ───────────────────────*/

    /// Unit vector pointing where the camera looks.  North is `-y`, so
    /// the sine is negated.
    #[inline(always)]
    pub fn forward(self) -> Vec2 {
        let (s, c) = fine_to_radians(self.angle).sin_cos();
        vec2(c, -s)
    }

    /// Unit vector pointing to the camera's right.
    #[inline(always)]
    pub fn right(self) -> Vec2 {
        self.forward().perp()
    }

    /*──────────────────────── movement helpers ──────────────────────*/

    /// Move by `forward` units and `side` (strafe, + right).
    pub fn step(&mut self, forward: f32, side: f32) {
        self.pos += self.forward() * forward + self.right() * side;
    }

    /// Rotate by `delta` fine units (positive = turn left).
    pub fn turn(&mut self, delta: i32) {
        self.angle = normalize_angle(self.angle + delta);
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
