use log::debug;

use super::WorldEvent;
use crate::world::{DoorIndex, TileCoord, TileMap};

/// Openness gained or lost per tic; a door takes 64 tics to open.
pub const DOOR_SPEED: f32 = 1.0 / 64.0;
/// Tics a fully open door waits before closing by itself.
pub const DOOR_HOLD_TICS: u32 = 300;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoorAction {
    Closed,
    Opening,
    Open { hold: u32 },
    Closing,
}

/// Animation state for every entry of the door table.
#[derive(Clone, Debug, Default)]
pub struct DoorThinker {
    actions: Vec<DoorAction>,
}

impl DoorThinker {
    pub fn new(count: usize) -> Self {
        Self {
            actions: vec![DoorAction::Closed; count],
        }
    }

    pub fn action(&self, index: DoorIndex) -> Option<DoorAction> {
        self.actions.get(index as usize).copied()
    }

    /// Player "use": closed or closing doors open, open doors close.
    /// Returns false for unknown doors and doors already opening.
    pub fn operate(&mut self, index: DoorIndex) -> bool {
        let Some(a) = self.actions.get_mut(index as usize) else {
            return false;
        };
        *a = match *a {
            DoorAction::Closed | DoorAction::Closing => DoorAction::Opening,
            DoorAction::Open { .. } => DoorAction::Closing,
            DoorAction::Opening => return false,
        };
        debug!("door {index} -> {a:?}");
        true
    }

    /// Advance every door one tic.  `occupied(tile)` keeps a door from
    /// closing on whatever stands in it.
    pub fn tick(
        &mut self,
        map: &mut TileMap,
        occupied: impl Fn(TileCoord) -> bool,
        events: &mut Vec<WorldEvent>,
    ) {
        for (i, action) in self.actions.iter_mut().enumerate() {
            let index = i as DoorIndex;
            let openness = map.door_openness(index);
            match *action {
                DoorAction::Closed => {}
                DoorAction::Opening => {
                    let next = (openness + DOOR_SPEED).min(1.0);
                    map.set_door_openness(index, next);
                    events.push(WorldEvent::DoorMoved { index });
                    if next >= 1.0 {
                        *action = DoorAction::Open {
                            hold: DOOR_HOLD_TICS,
                        };
                    }
                }
                DoorAction::Open { hold } => {
                    *action = if hold > 1 {
                        DoorAction::Open { hold: hold - 1 }
                    } else {
                        DoorAction::Closing
                    };
                }
                DoorAction::Closing => {
                    let blocked = map.door(index).is_some_and(|d| occupied(d.tile));
                    if blocked {
                        *action = DoorAction::Opening;
                        continue;
                    }
                    let next = (openness - DOOR_SPEED).max(0.0);
                    map.set_door_openness(index, next);
                    events.push(WorldEvent::DoorMoved { index });
                    if next <= 0.0 {
                        *action = DoorAction::Closed;
                    }
                }
            }
        }
    }
}
