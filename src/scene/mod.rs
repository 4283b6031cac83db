//! Persistent, incrementally updated wall geometry.

mod buffer;
mod graph;
mod object;

pub use buffer::{
    INDICES_PER_QUAD, INDICES_PER_SLOT, QUADS_PER_SLOT, Quad, SHADE_HORIZONTAL, SHADE_VERTICAL,
    SceneBuffers, SceneVertex, SlotId, VERTS_PER_QUAD, VERTS_PER_SLOT,
};
pub use graph::SceneGraph;
pub use object::{ObjectKind, SceneObject, Side};
