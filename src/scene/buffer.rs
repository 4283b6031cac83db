//! Shared vertex / index storage for scene objects.
//!
//! Every object owns one fixed-size slot of [`VERTS_PER_SLOT`] vertices.
//! The index pattern of a slot depends only on its position, so the index
//! buffer never changes once a slot exists; only vertex contents are
//! rewritten, and every write is remembered as a dirty slot until the
//! presenter has uploaded it.

use std::{collections::BTreeSet, ops::Range};

use bytemuck::{Pod, Zeroable};
use log::error;

pub const QUADS_PER_SLOT: usize = 4;
pub const VERTS_PER_QUAD: usize = 4;
pub const INDICES_PER_QUAD: usize = 6;
pub const VERTS_PER_SLOT: usize = QUADS_PER_SLOT * VERTS_PER_QUAD;
pub const INDICES_PER_SLOT: usize = QUADS_PER_SLOT * INDICES_PER_QUAD;

/// Brightness of faces on horizontal grid lines (north / south).
pub const SHADE_HORIZONTAL: f32 = 1.0;
/// East / west faces are drawn darker.
pub const SHADE_VERTICAL: f32 = 0.75;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SceneVertex {
    /// x, height, y in tile units.
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub shade: f32,
}

pub type Quad = [SceneVertex; VERTS_PER_QUAD];

/// Handle of one vertex slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u32);

impl SlotId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Vertex range covered by this slot.
    #[inline]
    pub fn vertex_range(self) -> Range<usize> {
        let start = self.index() * VERTS_PER_SLOT;
        start..start + VERTS_PER_SLOT
    }
}

#[derive(Clone, Debug, Default)]
pub struct SceneBuffers {
    vertices: Vec<SceneVertex>,
    indices: Vec<u32>,
    live: Vec<bool>,
    free: Vec<SlotId>,
    dirty: BTreeSet<SlotId>,
}

impl SceneBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every slot; used before a level rebuild.
    pub fn reset(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.live.clear();
        self.free.clear();
        self.dirty.clear();
    }

    /// Hand out a zeroed slot, recycling freed ones first.
    pub fn alloc(&mut self) -> SlotId {
        if let Some(slot) = self.free.pop() {
            self.live[slot.index()] = true;
            return slot;
        }
        let slot = SlotId(self.live.len() as u32);
        self.live.push(true);
        self.vertices
            .resize(self.vertices.len() + VERTS_PER_SLOT, SceneVertex::zeroed());

        let base = slot.index() * VERTS_PER_SLOT;
        for q in 0..QUADS_PER_SLOT {
            let v = (base + q * VERTS_PER_QUAD) as u32;
            self.indices
                .extend_from_slice(&[v, v + 1, v + 2, v, v + 2, v + 3]);
        }
        self.dirty.insert(slot);
        slot
    }

    /// Return `slot` to the free list, zeroing its vertices.
    pub fn free(&mut self, slot: SlotId) {
        if !self.is_live(slot) {
            debug_assert!(false, "double free of scene slot {slot:?}");
            error!("ignoring double free of scene slot {slot:?}");
            return;
        }
        self.vertices[slot.vertex_range()].fill(SceneVertex::zeroed());
        self.live[slot.index()] = false;
        self.free.push(slot);
        self.dirty.insert(slot);
    }

    #[inline]
    pub fn is_live(&self, slot: SlotId) -> bool {
        self.live.get(slot.index()).copied().unwrap_or(false)
    }

    /// Slots currently owned by an object.
    pub fn live_count(&self) -> usize {
        self.live.iter().filter(|l| **l).count()
    }

    /// Slots ever allocated, live or free.
    pub fn capacity(&self) -> usize {
        self.live.len()
    }

    pub fn write_quad(&mut self, slot: SlotId, quad: usize, verts: &Quad) {
        debug_assert!(self.is_live(slot) && quad < QUADS_PER_SLOT);
        if !self.is_live(slot) || quad >= QUADS_PER_SLOT {
            return;
        }
        let start = slot.index() * VERTS_PER_SLOT + quad * VERTS_PER_QUAD;
        self.vertices[start..start + VERTS_PER_QUAD].copy_from_slice(verts);
        self.dirty.insert(slot);
    }

    pub fn clear_quad(&mut self, slot: SlotId, quad: usize) {
        self.write_quad(slot, quad, &[SceneVertex::zeroed(); VERTS_PER_QUAD]);
    }

    pub fn slot_vertices(&self, slot: SlotId) -> &[SceneVertex] {
        self.vertices
            .get(slot.vertex_range())
            .unwrap_or(&[])
    }

    pub fn vertices(&self) -> &[SceneVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Raw vertex bytes for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Index range of `count` quads starting at `first` inside `slot`.
    #[inline]
    pub fn index_range(slot: SlotId, first: usize, count: usize) -> Range<u32> {
        let start = (slot.index() * INDICES_PER_SLOT + first * INDICES_PER_QUAD) as u32;
        start..start + (count * INDICES_PER_QUAD) as u32
    }

    /// Vertex ranges written since the last [`SceneBuffers::clear_dirty`],
    /// adjacent slots merged.
    pub fn dirty_ranges(&self) -> Vec<Range<usize>> {
        let mut out: Vec<Range<usize>> = Vec::new();
        for slot in &self.dirty {
            let r = slot.vertex_range();
            match out.last_mut() {
                Some(last) if last.end == r.start => last.end = r.end,
                _ => out.push(r),
            }
        }
        out
    }

    pub fn is_dirty(&self, slot: SlotId) -> bool {
        self.dirty.contains(&slot)
    }

    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    fn marked_quad(x: f32) -> Quad {
        [SceneVertex {
            position: [x, 0.0, 0.0],
            uv: [0.0, 0.0],
            shade: 1.0,
        }; VERTS_PER_QUAD]
    }

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<SceneVertex>(), 24);
        let mut b = SceneBuffers::new();
        b.alloc();
        assert_eq!(b.vertex_bytes().len(), 24 * VERTS_PER_SLOT);
        assert_eq!(b.index_bytes().len(), 4 * INDICES_PER_SLOT);
    }

    #[test]
    fn index_pattern_is_two_triangles_per_quad() {
        let mut b = SceneBuffers::new();
        b.alloc();
        let s1 = b.alloc();
        let r = SceneBuffers::index_range(s1, 1, 1);
        let idx = &b.indices()[r.start as usize..r.end as usize];
        assert_eq!(idx, &[20, 21, 22, 20, 22, 23]);
    }

    #[test]
    fn freed_slots_are_zeroed_and_reused() {
        let mut b = SceneBuffers::new();
        let a = b.alloc();
        let c = b.alloc();
        b.write_quad(a, 2, &marked_quad(5.0));
        b.free(a);
        assert!(b.slot_vertices(a).iter().all(|v| *v == SceneVertex::zeroed()));
        assert_eq!(b.live_count(), 1);

        let again = b.alloc();
        assert_eq!(again, a);
        assert_ne!(again, c);
        assert_eq!(b.capacity(), 2);
    }

    #[test]
    fn dirty_ranges_merge_adjacent_slots() {
        let mut b = SceneBuffers::new();
        let s0 = b.alloc();
        let _s1 = b.alloc();
        let s2 = b.alloc();
        b.clear_dirty();
        assert!(b.dirty_ranges().is_empty());

        b.write_quad(s0, 0, &marked_quad(1.0));
        b.write_quad(s2, 0, &marked_quad(2.0));
        assert_eq!(b.dirty_ranges(), vec![0..16, 32..48]);

        b.write_quad(SlotId(1), 3, &marked_quad(3.0));
        assert_eq!(b.dirty_ranges(), vec![0..48]);
    }
}
