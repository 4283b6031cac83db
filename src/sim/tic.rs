use hecs::{Entity, World};
use log::debug;
use std::time::{Duration, Instant};

use super::{
    WorldEvent,
    components::{Blocking, Position, SpriteVisual},
    doors::DoorThinker,
    pushwall::PushWallMover,
};
use crate::{
    level::LoadedLevel,
    world::{Dir, DoorIndex, MapError, Tile, TileCoord, TileMap, WallPic},
};

pub const SIM_HZ: u32 = 70;
const TIC: Duration = Duration::from_micros(1_000_000 / SIM_HZ as u64);

/// Wall pictures that flip into each other when used.
const SWITCH_PAIRS: [(u16, u16); 1] = [(21, 22)];

/// Owns the ECS world and drives the map animations at a fixed tic rate.
///
/// Every mutation of door openness or push-wall slide happens here; the
/// returned [`WorldEvent`]s tell the renderer what changed.
pub struct TicRunner {
    world: World,
    doors: DoorThinker,
    pushwalls: PushWallMover,
    pending: Vec<WorldEvent>,
    last: Instant,
    tics: u64,
}

impl Default for TicRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TicRunner {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            doors: DoorThinker::default(),
            pushwalls: PushWallMover::new(),
            pending: Vec::new(),
            last: Instant::now(),
            tics: 0,
        }
    }

    #[inline]
    pub fn world(&self) -> &World {
        &self.world
    }

    #[inline]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Tics simulated so far.
    pub fn tics(&self) -> u64 {
        self.tics
    }

    /// Reset for `level`: fresh door state and one entity per spawn.
    pub fn load(&mut self, level: &LoadedLevel) {
        self.world.clear();
        self.doors = DoorThinker::new(level.map.doors().len());
        self.pushwalls = PushWallMover::new();
        self.pending.clear();
        for s in &level.spawns {
            if s.blocking {
                self.world.spawn((Position(s.pos), s.visual, Blocking));
            } else {
                self.spawn_sprite(s.pos, s.visual);
            }
        }
        debug!("sim loaded {} sprites", level.spawns.len());
    }

    pub fn spawn_sprite(&mut self, pos: glam::Vec2, visual: SpriteVisual) -> Entity {
        self.world.spawn((Position(pos), visual))
    }

    /*──────────────────────────── actions ────────────────────────────*/

    pub fn operate_door(&mut self, index: DoorIndex) -> bool {
        self.doors.operate(index)
    }

    pub fn push_wall(&mut self, map: &mut TileMap, t: TileCoord, dir: Dir) -> Result<(), MapError> {
        self.pushwalls.push(map, t, dir, &mut self.pending)
    }

    /// Flip a switch picture; `false` if `t` is not a switch.
    pub fn toggle_switch(&mut self, map: &mut TileMap, t: TileCoord) -> Result<bool, MapError> {
        let Tile::Solid { pic } = map.tile(t) else {
            return Ok(false);
        };
        let flipped = SWITCH_PAIRS.iter().find_map(|&(up, down)| match pic.0 {
            p if p == up => Some(down),
            p if p == down => Some(up),
            _ => None,
        });
        let Some(next) = flipped else {
            return Ok(false);
        };
        map.set_code(t, Tile::Solid { pic: WallPic(next) }.encode()?)?;
        self.pending
            .push(WorldEvent::WallSwitchToggled { x: t.x, y: t.y });
        Ok(true)
    }

    /// The player at `from` uses whatever is in front of them.
    pub fn use_facing(&mut self, map: &mut TileMap, from: TileCoord, dir: Dir) -> Result<bool, MapError> {
        let t = from.step(dir);
        match map.tile(t) {
            Tile::Door { index } => Ok(self.operate_door(index)),
            Tile::Solid { .. } if map.is_pushable(t) => {
                self.push_wall(map, t, dir)?;
                Ok(true)
            }
            Tile::Solid { .. } => self.toggle_switch(map, t),
            _ => Ok(false),
        }
    }

    /*──────────────────────────── stepping ───────────────────────────*/

    /// Run `n` tics and return the events they produced, preceded by any
    /// raised by actions since the last call.
    pub fn run_tics(&mut self, map: &mut TileMap, n: u32) -> Result<Vec<WorldEvent>, MapError> {
        let mut events = std::mem::take(&mut self.pending);
        for _ in 0..n {
            self.tick(map, &mut events)?;
        }
        Ok(events)
    }

    /// Advance enough tics to synchronise simulation with real time.
    pub fn pump(&mut self, map: &mut TileMap) -> Result<Vec<WorldEvent>, MapError> {
        let mut n = 0;
        while self.last.elapsed() >= TIC {
            self.last += TIC;
            n += 1;
        }
        self.run_tics(map, n)
    }

    fn tick(&mut self, map: &mut TileMap, events: &mut Vec<WorldEvent>) -> Result<(), MapError> {
        let world = &self.world;
        let occupied = |t: TileCoord| {
            world
                .query::<(&Position, &Blocking)>()
                .iter()
                .any(|(_, (p, _))| TileCoord::containing(p.0) == t)
        };
        self.doors.tick(map, occupied, events);
        self.pushwalls.tick(map, events)?;
        self.tics += 1;
        Ok(())
    }
}
