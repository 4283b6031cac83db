//! View-dependent lookup tables, built once per viewport.

use thiserror::Error;

use crate::world::{ANGLE_90, FINE_ANGLES, fine_to_radians};

/// Closest a wall may be for projection purposes.
pub const MIN_DIST: f32 = 0.34;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    /// Horizontal field of view.
    pub fov_degrees: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 200,
            fov_degrees: 90.0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("viewport {width}x{height} must be non-empty")]
    EmptyViewport { width: usize, height: usize },

    #[error("field of view {0}° outside (0, 180)")]
    BadFov(f32),
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyViewport {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::BadFov(self.fov_degrees));
        }
        Ok(())
    }
}

/// Immutable tables shared by every column of a frame.
///
/// * `fine_tangent[i] = tan((i + 0.5) · 2π / FINE_ANGLES)` for one
///   quadrant; the half-step offset keeps every entry finite and non-zero.
/// * `pixel_angle[c]` is the fine angle between the view direction and the
///   ray through the centre of column `c`; left columns are positive.
#[derive(Clone, Debug)]
pub struct ViewTables {
    width: usize,
    height: usize,
    focal: f32,
    fine_tangent: Vec<f32>,
    pixel_angle: Vec<i32>,
}

impl ViewTables {
    pub fn new(cfg: &RenderConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;

        let half_w = cfg.width as f32 * 0.5;
        let focal = half_w / (cfg.fov_degrees.to_radians() * 0.5).tan();

        let half_step = fine_to_radians(1) * 0.5;
        let fine_tangent = (0..ANGLE_90)
            .map(|i| (fine_to_radians(i) + half_step).tan())
            .collect();

        let per_radian = FINE_ANGLES as f32 / std::f32::consts::TAU;
        let pixel_angle = (0..cfg.width)
            .map(|c| {
                let offset = half_w - (c as f32 + 0.5);
                ((offset / focal).atan() * per_radian).round() as i32
            })
            .collect();

        Ok(Self {
            width: cfg.width,
            height: cfg.height,
            focal,
            fine_tangent,
            pixel_angle,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixels per tile at unit distance.
    #[inline]
    pub fn focal(&self) -> f32 {
        self.focal
    }

    /// Tangent of quadrant-relative fine angle `i` (`0..ANGLE_90`).
    #[inline]
    pub fn tangent(&self, i: i32) -> f32 {
        self.fine_tangent[i.clamp(0, ANGLE_90 - 1) as usize]
    }

    /// Angular offset of `column`; out-of-range columns clamp to the edge.
    #[inline]
    pub fn pixel_angle(&self, column: usize) -> i32 {
        self.pixel_angle[column.min(self.width - 1)]
    }

    /// Screen height in pixels of a wall slice at perpendicular `dist`.
    #[inline]
    pub fn column_height(&self, dist: f32) -> f32 {
        self.focal / dist.max(MIN_DIST)
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(RenderConfig::default().validate(), Ok(()));
    }

    #[test]
    fn bad_configs_rejected() {
        let cfg = RenderConfig {
            width: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyViewport { .. })));
        let cfg = RenderConfig {
            fov_degrees: 180.0,
            ..Default::default()
        };
        assert_eq!(ViewTables::new(&cfg).unwrap_err(), ConfigError::BadFov(180.0));
    }

    #[test]
    fn focal_at_90_deg() {
        let t = ViewTables::new(&RenderConfig {
            width: 640,
            height: 400,
            fov_degrees: 90.0,
        })
        .unwrap();
        assert!((t.focal() - 320.0).abs() < 1e-2);
    }

    #[test]
    fn pixel_angles_are_symmetric_and_bounded() {
        let t = ViewTables::new(&RenderConfig::default()).unwrap();
        let w = t.width();
        for c in 0..w / 2 {
            assert_eq!(t.pixel_angle(c), -t.pixel_angle(w - 1 - c));
        }
        assert!(t.pixel_angle(0) > 0 && t.pixel_angle(0) < 450);
        assert!(t.pixel_angle(0) > t.pixel_angle(1));
    }

    #[test]
    fn tangent_table_endpoints() {
        let t = ViewTables::new(&RenderConfig::default()).unwrap();
        assert!(t.tangent(0) > 0.0 && t.tangent(0) < 0.001);
        assert!(t.tangent(450) > 1.0 && t.tangent(449) < 1.0);
        assert!(t.tangent(ANGLE_90 - 1) > 1000.0);
    }
}
