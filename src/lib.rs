//! Tile-grid ray casting core for a Wolfenstein-style renderer.
//!
//! * [`world`]    – tile codes, the map, camera and textures.
//! * [`engine`]   – per-column DDA, visibility sets, draw lists.
//! * [`scene`]    – persistent wall geometry updated by world events.
//! * [`sim`]      – 70 Hz door and push-wall animation over `hecs`.
//! * [`level`]    – level files and the ASCII test syntax.
//! * [`renderer`] – presenters consuming a compiled frame.

pub mod engine;
pub mod level;
pub mod renderer;
pub mod scene;
pub mod sim;
pub mod world;
