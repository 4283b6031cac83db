//! Frame driver tying the ray caster, the visibility sets and the scene
//! graph together.
//!
//! ```text
//!   sim events ─▶ apply ─▶ SceneGraph (buffers)
//!   begin_frame ─▶ cast_all ─▶ cull_sprites ─▶ compile_draw_lists ─▶ Presenter
//! ```

use hecs::World;
use log::{debug, info};
use thiserror::Error;

use super::{
    draw_list::{DrawListCompiler, DrawLists},
    raycast::{Hit, RayCaster},
    tables::{ConfigError, RenderConfig, ViewTables},
    visibility::VisibilityCollector,
};
use crate::{
    renderer::{FrameView, Presenter, Rgba},
    scene::SceneGraph,
    sim::WorldEvent,
    world::{Camera, DoorIndex, MapError, TextureSource, TileMap},
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Map(#[from] MapError),
}

pub struct Engine {
    config: RenderConfig,
    tables: ViewTables,
    map: TileMap,
    pub camera: Camera,
    vis: VisibilityCollector,
    scene: SceneGraph,
    hits: Vec<Hit>,
}

impl Engine {
    /// Build the view tables and the scene for `map`.
    pub fn new(config: RenderConfig, map: TileMap, camera: Camera) -> Result<Self, EngineError> {
        let tables = ViewTables::new(&config)?;
        let mut scene = SceneGraph::new();
        scene.on_level_load(&map)?;
        info!(
            "engine: {}x{} view, level `{}`",
            config.width,
            config.height,
            map.name()
        );
        Ok(Self {
            config,
            tables,
            vis: VisibilityCollector::new(map.width(), map.height()),
            map,
            camera,
            scene,
            hits: Vec::with_capacity(config.width),
        })
    }

    /*──────────────────────────── accessors ──────────────────────────*/

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn tables(&self) -> &ViewTables {
        &self.tables
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    /// The simulation writes door openness and push-wall slide through
    /// this; report the changes with [`Engine::apply`].
    pub fn map_mut(&mut self) -> &mut TileMap {
        &mut self.map
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn visibility(&self) -> &VisibilityCollector {
        &self.vis
    }

    /// Hits of the last [`Engine::cast_all`], one per column.
    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    /*──────────────────────────── map events ─────────────────────────*/

    /// Replace the level.  On error the previous level is left in place.
    pub fn on_level_load(&mut self, map: TileMap) -> Result<(), MapError> {
        self.scene.on_level_load(&map)?;
        self.vis.resize(map.width(), map.height());
        self.hits.clear();
        info!(
            "engine: level `{}` ready, {} doors, {} push-walls",
            map.name(),
            map.doors().len(),
            map.pushwalls().len()
        );
        self.map = map;
        Ok(())
    }

    pub fn on_door_moved(&mut self, index: DoorIndex) {
        self.scene.on_door_moved(&self.map, index);
    }

    pub fn on_pushwall_step(&mut self, x: i32, y: i32) {
        self.scene.on_pushwall_step(&self.map, x, y);
    }

    pub fn on_pushwall_reached_wall(&mut self, old_x: i32, old_y: i32, new_x: i32, new_y: i32) {
        self.scene
            .on_pushwall_reached_wall(&self.map, old_x, old_y, new_x, new_y);
    }

    pub fn on_wall_switch_toggled(&mut self, x: i32, y: i32) {
        self.scene.on_wall_switch_toggled(&self.map, x, y);
    }

    /// Route one simulation event to its mutator.
    pub fn apply(&mut self, event: WorldEvent) {
        debug!("engine: {event:?}");
        match event {
            WorldEvent::DoorMoved { index } => self.on_door_moved(index),
            WorldEvent::PushWallStep { x, y } => self.on_pushwall_step(x, y),
            WorldEvent::PushWallReachedWall {
                old_x,
                old_y,
                new_x,
                new_y,
            } => self.on_pushwall_reached_wall(old_x, old_y, new_x, new_y),
            WorldEvent::WallSwitchToggled { x, y } => self.on_wall_switch_toggled(x, y),
        }
    }

    /*──────────────────────────── frame steps ────────────────────────*/

    pub fn begin_frame(&mut self) {
        self.vis.begin_frame();
        self.hits.clear();
    }

    /// Trace a single column from `view`.
    pub fn cast_column(&mut self, column: usize, view: &Camera) -> Hit {
        RayCaster::new(&self.map, &self.tables).cast_column(column, view, &mut self.vis)
    }

    /// Trace every column from the engine camera, left to right.
    pub fn cast_all(&mut self) -> &[Hit] {
        let caster = RayCaster::new(&self.map, &self.tables);
        self.hits.clear();
        for column in 0..self.tables.width() {
            let hit = caster.cast_column(column, &self.camera, &mut self.vis);
            self.hits.push(hit);
        }
        &self.hits
    }

    pub fn cull_sprites(&mut self, world: &World) {
        self.vis.cull_sprites(world, &self.camera);
    }

    pub fn compile_draw_lists(&self, world: &World) -> DrawLists {
        DrawListCompiler::compile(&self.vis, &self.scene, world, &self.camera)
    }

    /// Whole frame: trace, cull, compile, present.  Buffer dirty ranges
    /// are consumed by the presenter and reset afterwards.
    pub fn render_frame<P, F>(
        &mut self,
        presenter: &mut P,
        world: &World,
        textures: &dyn TextureSource,
        submit: F,
    ) -> DrawLists
    where
        P: Presenter + ?Sized,
        F: FnOnce(&[Rgba], usize, usize),
    {
        self.begin_frame();
        self.cast_all();
        self.cull_sprites(world);
        let lists = self.compile_draw_lists(world);

        let frame = FrameView {
            camera: &self.camera,
            tables: &self.tables,
            hits: &self.hits,
            world,
        };
        presenter.begin_frame(self.tables.width(), self.tables.height());
        presenter.present(&frame, &lists, self.scene.buffers(), textures);
        presenter.end_frame(submit);

        self.scene.buffers_mut().clear_dirty();
        lists
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
