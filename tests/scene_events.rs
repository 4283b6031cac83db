//! Simulation events flowing into the scene graph through the engine.

use hecs::World;
use yawolf_rs::{
    engine::{DrawListCompiler, DrawLists, Engine, RenderConfig},
    level::ascii,
    scene::SceneVertex,
    sim::{TicRunner, WorldEvent},
    world::{Dir, TileCoord},
};

fn setup(src: &str) -> (Engine, TicRunner) {
    let level = ascii::parse(src).unwrap();
    let mut sim = TicRunner::new();
    sim.load(&level);
    let camera = level.player.unwrap();
    let config = RenderConfig {
        width: 32,
        height: 16,
        fov_degrees: 90.0,
    };
    (Engine::new(config, level.map, camera).unwrap(), sim)
}

/// One tic, its events applied before the next.
fn step(engine: &mut Engine, sim: &mut TicRunner) -> Vec<WorldEvent> {
    let events = sim.run_tics(engine.map_mut(), 1).unwrap();
    for &e in &events {
        engine.apply(e);
    }
    events
}

fn trace(engine: &mut Engine, world: &World) -> DrawLists {
    engine.begin_frame();
    engine.cast_all();
    engine.cull_sprites(world);
    engine.compile_draw_lists(world)
}

fn changed_vertices(before: &[SceneVertex], after: &[SceneVertex]) -> Vec<usize> {
    before
        .iter()
        .zip(after)
        .enumerate()
        .filter(|(_, (b, a))| b != a)
        .map(|(i, _)| i)
        .collect()
}

#[test]
fn door_step_rewrites_only_the_door_slot() {
    let (mut engine, mut sim) = setup(
        "#####\n\
         #>|.#\n\
         #####\n",
    );
    let door = engine.scene().door(TileCoord::new(2, 1)).unwrap().slot;
    let before = engine.scene().buffers().vertices().to_vec();

    assert!(sim.operate_door(0));
    let events = step(&mut engine, &mut sim);
    assert_eq!(events, vec![WorldEvent::DoorMoved { index: 0 }]);

    let after = engine.scene().buffers().vertices();
    assert_eq!(before.len(), after.len());
    let changed = changed_vertices(&before, after);
    assert!(!changed.is_empty());
    let range = door.vertex_range();
    assert!(changed.iter().all(|i| range.contains(i)), "{changed:?}");
}

#[test]
fn pushwall_cycle_reuses_its_slot() {
    let (mut engine, mut sim) = setup(
        "#######\n\
         #>P...#\n\
         #######\n",
    );
    let start = TileCoord::new(2, 1);
    let slot = engine.scene().wall(start).unwrap().slot;
    let live = engine.scene().buffers().live_count();

    assert!(sim.use_facing(engine.map_mut(), TileCoord::new(1, 1), Dir::East).unwrap());

    let mut arrived = false;
    for _ in 0..400 {
        let events = step(&mut engine, &mut sim);
        if events
            .iter()
            .any(|e| matches!(e, WorldEvent::PushWallReachedWall { .. }))
        {
            arrived = true;
            break;
        }
        assert_eq!(engine.scene().buffers().live_count(), live);
    }
    assert!(arrived);

    let scene = engine.scene();
    assert!(engine.map().pushwalls().is_empty());
    assert_eq!(scene.buffers().live_count(), live);
    assert!(scene.wall(start).is_none());
    assert!(scene.wall(TileCoord::new(3, 1)).is_none());
    assert!(scene.pushwall(start).is_none());
    assert!(scene.pushwall(TileCoord::new(3, 1)).is_none());
    assert_eq!(scene.wall(TileCoord::new(4, 1)).unwrap().slot, slot);
}

#[test]
fn compiling_twice_gives_identical_lists() {
    let (mut engine, _sim) = setup(ascii::DEMO);
    let world = World::new();
    let first = trace(&mut engine, &world);
    let second = engine.compile_draw_lists(&world);
    assert!(!first.walls.is_empty());
    assert_eq!(first, second);
}

#[test]
fn switch_changes_textures_but_no_vertices() {
    let (mut engine, mut sim) = setup(
        "#####\n\
         #.>.#\n\
         ##S##\n\
         #####\n",
    );
    let switch = TileCoord::new(2, 2);
    let sides = engine.scene().wall(switch).unwrap().sides.clone();
    let before = engine.scene().buffers().vertices().to_vec();

    assert!(sim.use_facing(engine.map_mut(), TileCoord::new(2, 1), Dir::South).unwrap());
    let events = step(&mut engine, &mut sim);
    assert_eq!(events, vec![WorldEvent::WallSwitchToggled { x: 2, y: 2 }]);

    assert_eq!(engine.scene().buffers().vertices(), &before[..]);
    let after = &engine.scene().wall(switch).unwrap().sides;
    let north = Dir::North.index();
    assert_ne!(sides[north].texture, after[north].texture);
}

#[test]
fn stale_pushwall_is_dropped_from_lists() {
    let (mut engine, mut sim) = setup(
        "#######\n\
         #>P...#\n\
         #######\n",
    );
    let world = World::new();
    let start = TileCoord::new(2, 1);

    sim.use_facing(engine.map_mut(), TileCoord::new(1, 1), Dir::East).unwrap();
    for _ in 0..10 {
        step(&mut engine, &mut sim);
    }
    let lists = trace(&mut engine, &world);
    assert_eq!(engine.visibility().pushwalls(), &[start]);
    assert_eq!(DrawLists::count(&lists.pushwalls), 1);

    while !engine.map().pushwalls().is_empty() {
        step(&mut engine, &mut sim);
    }
    let stale = DrawListCompiler::compile(
        engine.visibility(),
        engine.scene(),
        &world,
        &engine.camera,
    );
    assert!(stale.pushwalls.is_empty());
}
