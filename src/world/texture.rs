// Format-agnostic repository of textures decoded by the asset loader.
// The ray caster, scene graph and presenters interact through `TextureId`
// only; ids follow a fixed layout so level data never stores names.

use std::collections::HashMap;
use std::ops::{Index, IndexMut};

/// Runtime handle for a texture.
///
/// ```text
///   0   ..  256   wall pictures, two per picture (N/S face, E/W face)
///   256 ..  264   door faces, two per door kind
///   264 ..  266   door jambs (N/S face, E/W face)
///   512 ..        sprites
/// ```
pub type TextureId = u16;

pub const DOOR_TEXTURE_BASE: TextureId = 256;
pub const DOOR_JAMB_TEXTURE: TextureId = 264;
pub const SPRITE_TEXTURE_BASE: TextureId = 512;

/// Sentinel id that never names a stored texture.
pub const NO_TEXTURE: TextureId = TextureId::MAX;

/// Palette index treated as fully transparent in sprite textures.
pub const TRANSPARENT_TEXEL: u8 = 0xff;

/// CPU-side storage: 8-bit palette indices in row-major order.
/// The loader fills the pixel vector; a GPU presenter may upload it and
/// drop the CPU copy.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub name: String,
    pub w: usize,
    pub h: usize,
    pub pixels: Vec<u8>,
}

impl Texture {
    /// Texel at normalised `u`, integer row `y`; `u` is clamped.
    #[inline]
    pub fn texel(&self, u: f32, y: usize) -> u8 {
        let x = ((u * self.w as f32) as usize).min(self.w - 1);
        self.pixels[y.min(self.h - 1) * self.w + x]
    }

    /// Solid-colour square, used by tests and the demo viewer.
    pub fn solid(name: &str, size: usize, index: u8) -> Self {
        Texture {
            name: name.to_string(),
            w: size,
            h: size,
            pixels: vec![index; size * size],
        }
    }
}

/// Convenience checkerboard 8×8 (dark/light grey).
impl Default for Texture {
    fn default() -> Self {
        const LIGHT_IDX: u8 = 8;
        const DARK_IDX: u8 = 16;
        let mut pix = vec![0u8; 8 * 8];
        for y in 0..8 {
            for x in 0..8 {
                pix[y * 8 + x] = if (x ^ y) & 1 == 0 {
                    LIGHT_IDX
                } else {
                    DARK_IDX
                };
            }
        }
        Texture {
            name: "CHECKER".to_string(),
            w: 8,
            h: 8,
            pixels: pix,
        }
    }
}

/// Things that can go wrong when using the bank.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextureError {
    /// Attempted to insert a second texture under an occupied id.
    #[error("texture id {0} already present in bank")]
    Duplicate(TextureId),

    /// Requested id has no texture.
    #[error("texture id {0} not loaded")]
    BadId(TextureId),

    #[error("texture `{name}` has {len} pixels, expected {w}x{h}")]
    BadSize {
        name: String,
        w: usize,
        h: usize,
        len: usize,
    },
}

/// Narrow collaborator interface: "fetch texture for id".
pub trait TextureSource {
    fn fetch_texture(&self, id: TextureId) -> Option<&Texture>;

    /// 0x00RRGGBB colour of palette index `texel`.
    fn color(&self, texel: u8) -> u32;
}

pub struct Palette(pub [u32; 256]);
impl Default for Palette {
    fn default() -> Self {
        // grey ramp until a real palette is installed
        let mut p = [0u32; 256];
        for (i, c) in p.iter_mut().enumerate() {
            let v = i as u32;
            *c = (v << 16) | (v << 8) | v;
        }
        Palette(p)
    }
}
impl Index<usize> for Palette {
    type Output = u32;
    fn index(&self, idx: usize) -> &u32 {
        &self.0[idx]
    }
}
impl IndexMut<usize> for Palette {
    fn index_mut(&mut self, idx: usize) -> &mut u32 {
        &mut self.0[idx]
    }
}

/// A palette-aware cache of textures keyed by the fixed id layout.
///
/// * Does **not** know about asset files; that's the loader's job.
/// * Holds a *missing* texture used by callers that prefer a visible
///   checkerboard over skipping.
///
/// **Thread-safety:** access `TextureBank` from a single thread or wrap it
/// in `RwLock`; the struct itself is not `Sync`-shared by the engine.
pub struct TextureBank {
    data: HashMap<TextureId, Texture>,
    missing: Texture,
    palette: Palette,
}

impl TextureBank {
    /// Create an empty bank with a mandatory fallback texture.
    pub fn new(missing_tex: Texture) -> Self {
        Self {
            data: HashMap::new(),
            missing: missing_tex,
            palette: Palette::default(),
        }
    }

    pub fn default_with_checker() -> Self {
        Self::new(Texture::default())
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Number of textures stored (the fallback is not counted).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow a texture by id.
    pub fn texture(&self, id: TextureId) -> Result<&Texture, TextureError> {
        self.data.get(&id).ok_or(TextureError::BadId(id))
    }

    /// Fallback-safe query: unknown ids resolve to the checkerboard.
    pub fn texture_or_missing(&self, id: TextureId) -> &Texture {
        self.data.get(&id).unwrap_or(&self.missing)
    }

    /// Insert a texture under `id`.
    ///
    /// * Fails if the id is taken (`Duplicate`) or the pixel count does
    ///   not match the declared size (`BadSize`).
    pub fn insert(&mut self, id: TextureId, tex: Texture) -> Result<(), TextureError> {
        if tex.pixels.len() != tex.w * tex.h || tex.w == 0 || tex.h == 0 {
            return Err(TextureError::BadSize {
                name: tex.name,
                w: tex.w,
                h: tex.h,
                len: tex.pixels.len(),
            });
        }
        if self.data.contains_key(&id) {
            return Err(TextureError::Duplicate(id));
        }
        self.data.insert(id, tex);
        Ok(())
    }
}

impl TextureSource for TextureBank {
    fn fetch_texture(&self, id: TextureId) -> Option<&Texture> {
        self.data.get(&id)
    }

    fn color(&self, texel: u8) -> u32 {
        self.palette[texel as usize]
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
