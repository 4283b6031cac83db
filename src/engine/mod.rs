//! Per-frame pipeline: ray casting, visibility, draw-list compilation.

pub mod draw_list;
pub mod frame;
pub mod raycast;
pub mod tables;
pub mod visibility;

pub use draw_list::{DrawBatch, DrawItem, DrawListCompiler, DrawLists, DrawTarget};
pub use frame::{Engine, EngineError};
pub use raycast::{Hit, HitKind, RayCaster, door_intercept};
pub use tables::{ConfigError, MIN_DIST, RenderConfig, ViewTables};
pub use visibility::{VisMarks, VisibilityCollector};
