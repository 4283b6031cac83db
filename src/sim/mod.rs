mod components;
mod doors;
mod pushwall;
mod tic;

pub use components::{Blocking, Position, SpriteVisual};
pub use doors::{DOOR_HOLD_TICS, DOOR_SPEED, DoorAction, DoorThinker};
pub use pushwall::{PUSHWALL_MAX_TILES, PUSHWALL_SPEED, PushWallMover};
pub use tic::{SIM_HZ, TicRunner};

use crate::world::DoorIndex;

/// Map changes the renderer has to mirror, emitted by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorldEvent {
    DoorMoved {
        index: DoorIndex,
    },
    /// The push-wall keyed at `(x, y)` moved; it may now be keyed one tile
    /// further along its track.
    PushWallStep {
        x: i32,
        y: i32,
    },
    PushWallReachedWall {
        old_x: i32,
        old_y: i32,
        new_x: i32,
        new_y: i32,
    },
    WallSwitchToggled {
        x: i32,
        y: i32,
    },
}
