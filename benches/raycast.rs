use criterion::{Criterion, black_box, criterion_group, criterion_main};
use hecs::World;

use yawolf_rs::{
    engine::{Engine, RenderConfig},
    level::ascii,
    world::ANGLE_90,
};

fn demo_engine(width: usize) -> Engine {
    let level = ascii::parse(ascii::DEMO).expect("demo map");
    let camera = level.player.expect("demo player start");
    let config = RenderConfig {
        width,
        height: width * 5 / 8,
        fov_degrees: 90.0,
    };
    Engine::new(config, level.map, camera).expect("engine")
}

fn raycast_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("raycast");

    for width in [320usize, 640, 1280] {
        let mut engine = demo_engine(width);
        group.bench_function(format!("cast_all_{width}"), |b| {
            b.iter(|| {
                engine.begin_frame();
                black_box(engine.cast_all().len())
            })
        });
    }

    let mut engine = demo_engine(640);
    let world = World::new();
    group.bench_function("frame_lists_640", |b| {
        b.iter(|| {
            engine.camera.turn(ANGLE_90 / 128);
            engine.begin_frame();
            engine.cast_all();
            engine.cull_sprites(&world);
            black_box(engine.compile_draw_lists(&world))
        })
    });
    group.finish();
}

criterion_group!(benches, raycast_benchmark);
criterion_main!(benches);
