//! Presentation layer.
//!
//! *The core never touches a pixel buffer.*  Each frame it hands a
//! [`Presenter`] the column hits, the compiled [`DrawLists`] and the
//! persistent [`SceneBuffers`]; what the presenter does with them is its
//! own business.
//!
//! * [`software::Software`] draws textured columns from the hits and
//!   sprites from the draw lists into a CPU frame-buffer.
//! * [`recorder::Recorder`] mirrors the scene buffers through their dirty
//!   ranges and records one indexed draw per item, the way a GPU back-end
//!   would submit them.
//!
//! The blanket [`PresenterExt`] adds a one-line `draw_frame`.

use hecs::World;

use crate::{
    engine::{DrawLists, Hit, ViewTables},
    scene::SceneBuffers,
    world::{Camera, TextureSource},
};

/// Pixel format of the software frame-buffer (0x00RRGGBB).
pub type Rgba = u32;

/// Per-frame state a presenter may read.
#[derive(Clone, Copy)]
pub struct FrameView<'a> {
    pub camera: &'a Camera,
    pub tables: &'a ViewTables,
    /// One entry per screen column, left to right.
    pub hits: &'a [Hit],
    pub world: &'a World,
}

pub trait Presenter {
    /// (Re)allocate scratch for the requested resolution and clear it.
    fn begin_frame(&mut self, width: usize, height: usize);

    /// Draw everything for this frame.  Items whose texture is missing
    /// from `textures` are skipped.
    fn present(
        &mut self,
        frame: &FrameView,
        lists: &DrawLists,
        buffers: &SceneBuffers,
        textures: &dyn TextureSource,
    );

    /// Finish the frame and **loan** the finished buffer to `submit`.
    ///
    /// Presenters without a CPU buffer call `submit(&[], width, height)`.
    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize);
}

pub trait PresenterExt: Presenter {
    fn draw_frame<F>(
        &mut self,
        frame: &FrameView,
        lists: &DrawLists,
        buffers: &SceneBuffers,
        textures: &dyn TextureSource,
        submit: F,
    ) where
        F: FnOnce(&[Rgba], usize, usize),
    {
        self.begin_frame(frame.tables.width(), frame.tables.height());
        self.present(frame, lists, buffers, textures);
        self.end_frame(submit);
    }
}
impl<T: Presenter + ?Sized> PresenterExt for T {}

pub mod recorder;
pub mod software;
