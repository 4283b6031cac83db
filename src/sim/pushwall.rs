use log::debug;

use super::WorldEvent;
use crate::world::{Dir, MapError, TileCode, TileCoord, TileMap};

/// Slide gained per tic; one tile takes 128 tics.
pub const PUSHWALL_SPEED: f32 = 1.0 / 128.0;
/// A pushed wall travels at most this many tiles.
pub const PUSHWALL_MAX_TILES: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Mover {
    origin: TileCoord,
    dir: Dir,
    moved: u32,
}

/// Drives the push-walls currently in motion.
#[derive(Clone, Debug, Default)]
pub struct PushWallMover {
    active: Vec<Mover>,
}

impl PushWallMover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    /// Start pushing the wall at `t` towards `dir`.
    pub fn push(
        &mut self,
        map: &mut TileMap,
        t: TileCoord,
        dir: Dir,
        events: &mut Vec<WorldEvent>,
    ) -> Result<(), MapError> {
        map.start_pushwall(t, dir)?;
        debug!("push-wall at {t:?} starts moving {dir:?}");
        self.active.push(Mover {
            origin: t,
            dir,
            moved: 0,
        });
        events.push(WorldEvent::PushWallStep { x: t.x, y: t.y });
        Ok(())
    }

    pub fn tick(&mut self, map: &mut TileMap, events: &mut Vec<WorldEvent>) -> Result<(), MapError> {
        let mut finished = Vec::new();
        for (i, m) in self.active.iter_mut().enumerate() {
            let old = m.origin;
            let Some(pw) = map.pushwall_mut(old) else {
                finished.push(i);
                continue;
            };
            pw.slide += PUSHWALL_SPEED;
            if pw.slide < 1.0 {
                events.push(WorldEvent::PushWallStep { x: old.x, y: old.y });
                continue;
            }

            m.moved += 1;
            let beyond = old.step(m.dir).step(m.dir);
            let extend =
                m.moved < PUSHWALL_MAX_TILES && map.code(beyond) == Some(TileCode::EMPTY);
            let next = map.advance_pushwall(old, extend)?;
            if extend {
                m.origin = next;
                events.push(WorldEvent::PushWallStep { x: old.x, y: old.y });
            } else {
                map.settle_pushwall(next)?;
                debug!("push-wall from {old:?} came to rest at {next:?}");
                events.push(WorldEvent::PushWallReachedWall {
                    old_x: old.x,
                    old_y: old.y,
                    new_x: next.x,
                    new_y: next.y,
                });
                finished.push(i);
            }
        }
        for i in finished.into_iter().rev() {
            self.active.swap_remove(i);
        }
        Ok(())
    }
}
