//! ---------------------------------------------------------------------------
//! Classic software (CPU) column renderer
//!
//! * Fills a `Vec<u32>` frame-buffer in **0x00RRGGBB** format.
//! * Walls come straight from the per-column hits; their distances form a
//!   one-dimensional depth buffer.
//! * Sprites are drawn far to near from the draw lists, clipped against
//!   that depth buffer.
//! ---------------------------------------------------------------------------

use super::{FrameView, Presenter, Rgba};
use crate::{
    engine::{DrawLists, DrawTarget, Hit, MIN_DIST, ViewTables},
    scene::SceneBuffers,
    world::{TRANSPARENT_TEXEL, Texture, TextureSource},
};

pub const CEILING_COLOR: Rgba = 0x00_38_38_38;
pub const FLOOR_COLOR: Rgba = 0x00_70_70_70;

/// Wolfenstein-style column renderer.
#[derive(Default)]
pub struct Software {
    scratch: Vec<Rgba>,
    /// Wall distance per column; sprites behind it are hidden.
    depth: Vec<f32>,
    width: usize,
    height: usize,
}

impl Software {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.scratch
    }
}

/*──────────────────────── Presenter trait impl ───────────────────────*/
impl Presenter for Software {
    fn begin_frame(&mut self, w: usize, h: usize) {
        if w != self.width || h != self.height {
            self.width = w;
            self.height = h;
            self.scratch.resize(w * h, 0);
            self.depth.resize(w, f32::INFINITY);
        }

        let half = (h / 2) * w;
        self.scratch[..half].fill(CEILING_COLOR);
        self.scratch[half..].fill(FLOOR_COLOR);
        self.depth.fill(f32::INFINITY);
    }

    fn present(
        &mut self,
        frame: &FrameView,
        lists: &DrawLists,
        _buffers: &SceneBuffers,
        textures: &dyn TextureSource,
    ) {
        for hit in frame.hits {
            self.draw_wall_column(hit, frame.tables, textures);
        }

        for item in lists.sprites.iter().flat_map(|b| b.items.iter()) {
            let DrawTarget::Sprite {
                pos, translucent, ..
            } = item.target
            else {
                continue;
            };
            let Some(tex) = textures.fetch_texture(item.texture) else {
                continue;
            };
            let cam = frame.camera.to_cam(pos);
            if cam.y <= MIN_DIST {
                continue;
            }
            let sprite = SpriteRect::project(cam.x, cam.y, frame.tables);
            self.draw_sprite(&sprite, tex, translucent, textures);
        }
    }

    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        submit(&self.scratch, self.width, self.height);
    }
}

/*──────────────────────── helper structs ─────────────────────────────*/

/// Screen-space square of a billboard.
#[derive(Clone, Copy, Debug)]
struct SpriteRect {
    x0: f32,
    y0: f32,
    size: f32,
    depth: f32,
}

impl SpriteRect {
    fn project(lateral: f32, depth: f32, tables: &ViewTables) -> Self {
        let size = tables.column_height(depth);
        let half_w = tables.width() as f32 * 0.5;
        let half_h = tables.height() as f32 * 0.5;
        let cx = half_w + lateral * tables.focal() / depth;
        Self {
            x0: cx - size * 0.5,
            y0: half_h - size * 0.5,
            size,
            depth,
        }
    }
}

#[inline]
fn blend_half(a: Rgba, b: Rgba) -> Rgba {
    ((a & 0x00_fe_fe_fe) >> 1) + ((b & 0x00_fe_fe_fe) >> 1)
}

/// Pixel rows covered by a span of `size` pixels starting at `top`.
#[inline]
fn rows(top: f32, size: f32, height: usize) -> std::ops::Range<usize> {
    let y0 = top.max(0.0) as usize;
    let y1 = ((top + size).ceil().max(0.0) as usize).min(height);
    y0..y1.max(y0)
}

/*──────────────────────── column rendering ───────────────────────────*/

impl Software {
    fn draw_wall_column(&mut self, hit: &Hit, tables: &ViewTables, textures: &dyn TextureSource) {
        let x = hit.column;
        if x >= self.width {
            return;
        }
        self.depth[x] = hit.distance;

        let Some(tex) = textures.fetch_texture(hit.texture) else {
            return;
        };
        let size = tables.column_height(hit.distance);
        let top = self.height as f32 * 0.5 - size * 0.5;
        for y in rows(top, size, self.height) {
            let v = (y as f32 + 0.5 - top) / size;
            let ty = (v * tex.h as f32) as usize;
            self.scratch[y * self.width + x] = textures.color(tex.texel(hit.u, ty));
        }
    }

    fn draw_sprite(
        &mut self,
        s: &SpriteRect,
        tex: &Texture,
        translucent: bool,
        textures: &dyn TextureSource,
    ) {
        let cols = rows(s.x0, s.size, self.width);
        let ys = rows(s.y0, s.size, self.height);
        for x in cols {
            if s.depth >= self.depth[x] {
                continue;
            }
            let u = (x as f32 + 0.5 - s.x0) / s.size;
            for y in ys.clone() {
                let v = (y as f32 + 0.5 - s.y0) / s.size;
                let texel = tex.texel(u, (v * tex.h as f32) as usize);
                if texel == TRANSPARENT_TEXEL {
                    continue;
                }
                let color = textures.color(texel);
                let px = &mut self.scratch[y * self.width + x];
                *px = if translucent {
                    blend_half(*px, color)
                } else {
                    color
                };
            }
        }
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
