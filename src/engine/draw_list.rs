//! Per-frame draw lists: visible sides grouped by texture, sprites in
//! back-to-front order.

use std::{collections::BTreeMap, ops::Range};

use glam::Vec2;
use hecs::{Entity, World};
use log::debug;

use super::visibility::VisibilityCollector;
use crate::{
    scene::{ObjectKind, SceneBuffers, SceneGraph},
    sim::{Position, SpriteVisual},
    world::{Camera, TextureId, TileCoord},
};

#[derive(Clone, Debug, PartialEq)]
pub enum DrawTarget {
    Side {
        kind: ObjectKind,
        tile: TileCoord,
        side: usize,
        /// Range into [`SceneBuffers::indices`].
        indices: Range<u32>,
    },
    Sprite {
        entity: Entity,
        pos: Vec2,
        dist_sq: f32,
        translucent: bool,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawItem {
    pub texture: TextureId,
    pub target: DrawTarget,
}

/// Items sharing one texture bind.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawBatch {
    pub texture: TextureId,
    pub items: Vec<DrawItem>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawLists {
    pub walls: Vec<DrawBatch>,
    pub doors: Vec<DrawBatch>,
    pub pushwalls: Vec<DrawBatch>,
    /// Farthest first; consecutive items with one texture share a batch.
    pub sprites: Vec<DrawBatch>,
}

impl DrawLists {
    /// Number of items across all batches of `batches`.
    pub fn count(batches: &[DrawBatch]) -> usize {
        batches.iter().map(|b| b.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.walls.is_empty()
            && self.doors.is_empty()
            && self.pushwalls.is_empty()
            && self.sprites.is_empty()
    }

    /// Every item in submission order: walls, doors, push-walls, sprites.
    pub fn items(&self) -> impl Iterator<Item = &DrawItem> {
        [&self.walls, &self.doors, &self.pushwalls, &self.sprites]
            .into_iter()
            .flatten()
            .flat_map(|b| b.items.iter())
    }
}

/// Stateless: output depends only on its inputs, so compiling twice
/// without a new trace gives identical lists.
pub struct DrawListCompiler;

impl DrawListCompiler {
    pub fn compile(
        vis: &VisibilityCollector,
        scene: &SceneGraph,
        world: &World,
        view: &Camera,
    ) -> DrawLists {
        let eye = view.pos();
        DrawLists {
            walls: side_batches(scene, ObjectKind::Wall, vis.walls(), eye),
            doors: side_batches(scene, ObjectKind::Door, vis.doors(), eye),
            pushwalls: side_batches(scene, ObjectKind::PushWall, vis.pushwalls(), eye),
            sprites: sprite_batches(world, vis.sprites(), eye),
        }
    }
}

fn side_batches(
    scene: &SceneGraph,
    kind: ObjectKind,
    tiles: &[TileCoord],
    eye: Vec2,
) -> Vec<DrawBatch> {
    let mut grouped: BTreeMap<TextureId, Vec<DrawItem>> = BTreeMap::new();

    for &tile in tiles {
        let Some(obj) = scene.object(kind, tile) else {
            debug!("dropping stale {kind:?} at {tile:?}");
            continue;
        };
        if !scene.buffers().is_live(obj.slot) {
            debug_assert!(false, "{kind:?} at {tile:?} references a freed slot");
            debug!("dropping {kind:?} at {tile:?} with freed slot");
            continue;
        }
        for (i, side) in obj.active_sides() {
            if !side.faces(eye) {
                continue;
            }
            grouped.entry(side.texture).or_default().push(DrawItem {
                texture: side.texture,
                target: DrawTarget::Side {
                    kind,
                    tile,
                    side: i,
                    indices: SceneBuffers::index_range(
                        obj.slot,
                        side.first_quad as usize,
                        side.quad_count as usize,
                    ),
                },
            });
        }
    }

    grouped
        .into_iter()
        .map(|(texture, items)| DrawBatch { texture, items })
        .collect()
}

fn sprite_batches(world: &World, sprites: &[Entity], eye: Vec2) -> Vec<DrawBatch> {
    let mut items: Vec<DrawItem> = Vec::with_capacity(sprites.len());
    for &entity in sprites {
        let (Ok(pos), Ok(visual)) = (
            world.get::<&Position>(entity),
            world.get::<&SpriteVisual>(entity),
        ) else {
            debug!("dropping stale sprite {entity:?}");
            continue;
        };
        items.push(DrawItem {
            texture: visual.texture,
            target: DrawTarget::Sprite {
                entity,
                pos: pos.0,
                dist_sq: pos.0.distance_squared(eye),
                translucent: visual.translucent,
            },
        });
    }

    items.sort_by(|a, b| {
        let key = |it: &DrawItem| match it.target {
            DrawTarget::Sprite {
                entity, dist_sq, ..
            } => (dist_sq, entity.to_bits().get()),
            DrawTarget::Side { .. } => (0.0, 0),
        };
        let (da, ea) = key(a);
        let (db, eb) = key(b);
        db.total_cmp(&da).then(ea.cmp(&eb))
    });

    let mut batches: Vec<DrawBatch> = Vec::new();
    for item in items {
        match batches.last_mut() {
            Some(b) if b.texture == item.texture => b.items.push(item),
            _ => batches.push(DrawBatch {
                texture: item.texture,
                items: vec![item],
            }),
        }
    }
    batches
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SPRITE_TEXTURE_BASE;
    use glam::vec2;

    fn sprite(world: &mut World, x: f32, texture: TextureId) -> Entity {
        world.spawn((
            Position(vec2(x, 1.5)),
            SpriteVisual {
                texture,
                translucent: false,
            },
        ))
    }

    #[test]
    fn sprites_sorted_far_to_near_and_merged_by_texture() {
        let mut world = World::new();
        let a = sprite(&mut world, 3.5, SPRITE_TEXTURE_BASE);
        let b = sprite(&mut world, 5.5, SPRITE_TEXTURE_BASE);
        let c = sprite(&mut world, 4.5, SPRITE_TEXTURE_BASE + 1);
        let d = sprite(&mut world, 2.5, SPRITE_TEXTURE_BASE + 1);

        let batches = sprite_batches(&world, &[a, b, c, d], vec2(1.5, 1.5));
        let order: Vec<Entity> = batches
            .iter()
            .flat_map(|b| b.items.iter())
            .map(|it| match it.target {
                DrawTarget::Sprite { entity, .. } => entity,
                DrawTarget::Side { .. } => unreachable!(),
            })
            .collect();
        assert_eq!(order, vec![b, c, a, d]);
        // b | c | a | d alternate textures: no merging possible
        assert_eq!(batches.len(), 4);
    }

    #[test]
    fn equal_distance_sprites_keep_entity_order_and_share_a_batch() {
        let mut world = World::new();
        let a = sprite(&mut world, 3.5, SPRITE_TEXTURE_BASE);
        let b = sprite(&mut world, 3.5, SPRITE_TEXTURE_BASE);
        let batches = sprite_batches(&world, &[b, a], vec2(1.5, 1.5));
        assert_eq!(batches.len(), 1);
        let first = &batches[0].items[0].target;
        assert!(matches!(first, DrawTarget::Sprite { entity, .. } if *entity == a));
    }

    #[test]
    fn despawned_sprite_is_dropped() {
        let mut world = World::new();
        let a = sprite(&mut world, 3.5, SPRITE_TEXTURE_BASE);
        let gone = sprite(&mut world, 4.5, SPRITE_TEXTURE_BASE);
        world.despawn(gone).unwrap();
        let batches = sprite_batches(&world, &[a, gone], vec2(1.5, 1.5));
        assert_eq!(DrawLists::count(&batches), 1);
    }
}
