//! Buffer-mirroring presenter.
//!
//! Keeps its own copy of the scene vertex/index buffers, updated only
//! through [`SceneBuffers::dirty_ranges`], and turns each draw item into
//! an indexed draw command.  It is what a GPU back-end does minus the
//! device, which makes it handy for tests and for measuring upload
//! traffic.

use std::ops::Range;

use super::{FrameView, Presenter, Rgba};
use crate::{
    engine::{DrawLists, DrawTarget},
    scene::{SceneBuffers, SceneVertex},
    world::{TextureId, TextureSource},
};

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Indexed triangles out of the mirrored scene buffers.
    Indexed {
        texture: TextureId,
        indices: Range<u32>,
    },
    Billboard {
        texture: TextureId,
        pos: glam::Vec2,
        translucent: bool,
    },
}

#[derive(Debug, Default)]
pub struct Recorder {
    vertices: Vec<SceneVertex>,
    indices: Vec<u32>,
    commands: Vec<DrawCommand>,
    /// Vertex ranges copied during the last frame.
    uploads: Vec<Range<usize>>,
    width: usize,
    height: usize,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn uploads(&self) -> &[Range<usize>] {
        &self.uploads
    }

    /// Vertices uploaded in the last frame.
    pub fn uploaded_vertices(&self) -> usize {
        self.uploads.iter().map(|r| r.len()).sum()
    }

    pub fn vertices(&self) -> &[SceneVertex] {
        &self.vertices
    }

    fn sync(&mut self, buffers: &SceneBuffers) {
        let src = buffers.vertices();
        if self.vertices.len() != src.len() {
            self.vertices.resize(src.len(), SceneVertex::default());
        }
        if self.indices.len() != buffers.indices().len() {
            self.indices.clear();
            self.indices.extend_from_slice(buffers.indices());
        }
        for r in buffers.dirty_ranges() {
            self.vertices[r.clone()].copy_from_slice(&src[r.clone()]);
            self.uploads.push(r);
        }
    }
}

impl Presenter for Recorder {
    fn begin_frame(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.commands.clear();
        self.uploads.clear();
    }

    fn present(
        &mut self,
        _frame: &FrameView,
        lists: &DrawLists,
        buffers: &SceneBuffers,
        textures: &dyn TextureSource,
    ) {
        self.sync(buffers);
        for item in lists.items() {
            if textures.fetch_texture(item.texture).is_none() {
                continue;
            }
            self.commands.push(match &item.target {
                DrawTarget::Side { indices, .. } => DrawCommand::Indexed {
                    texture: item.texture,
                    indices: indices.clone(),
                },
                DrawTarget::Sprite {
                    pos, translucent, ..
                } => DrawCommand::Billboard {
                    texture: item.texture,
                    pos: *pos,
                    translucent: *translucent,
                },
            });
        }
    }

    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        submit(&[], self.width, self.height);
    }
}
