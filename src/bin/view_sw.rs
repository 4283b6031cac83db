//! Software ray-cast viewer.
//!
//! ```bash
//! cargo run --release -- [level.ywm] [--width 640 --height 400 --fov 90]
//! ```
//!
//! Controls ↑/↓ or W/S = move ←/→ = turn A/D = strafe Space = use Esc = quit

use anyhow::Context;
use clap::Parser;
use glam::Vec2;
use log::info;
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use yawolf_rs::{
    engine::{Engine, RenderConfig},
    level::{LoadedLevel, RawLevel, ascii},
    renderer::software::Software,
    sim::{Blocking, Position, TicRunner},
    world::{
        ANGLE_90, Axis, DOOR_JAMB_TEXTURE, DOOR_TEXTURE_BASE, Dir, Palette, SPRITE_TEXTURE_BASE,
        TRANSPARENT_TEXEL, Texture, TextureBank, Tile, TileCoord, TileMap, WallPic, normalize_angle,
    },
};

const MOVE_STEP: f32 = 0.06;
const TURN_STEP: i32 = 30;
/// Keep the eye this far from walls.
const BODY_RADIUS: f32 = 0.25;

#[derive(Parser, Debug)]
#[command(about = "Wolfenstein-style software viewer")]
struct Args {
    /// Level file; the built-in demo map when omitted.
    level: Option<PathBuf>,

    #[arg(long, default_value_t = 640)]
    width: usize,

    #[arg(long, default_value_t = 400)]
    height: usize,

    /// Horizontal field of view in degrees.
    #[arg(long, default_value_t = 90.0)]
    fov: f32,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let level: LoadedLevel = match &args.level {
        Some(path) => RawLevel::from_file(path)
            .and_then(|raw| raw.build())
            .with_context(|| format!("loading {}", path.display()))?,
        None => ascii::parse(ascii::DEMO)?,
    };
    let camera = level.player.context("level has no player start")?;

    let mut sim = TicRunner::new();
    sim.load(&level);
    let player = sim.world_mut().spawn((Position(camera.pos()), Blocking));

    let config = RenderConfig {
        width: args.width,
        height: args.height,
        fov_degrees: args.fov,
    };
    let mut engine = Engine::new(config, level.map, camera)?;
    let bank = demo_bank()?;
    let mut presenter = Software::new();

    let mut win = Window::new(
        "yawolf software render",
        args.width,
        args.height,
        WindowOptions::default(),
    )?;
    win.set_target_fps(70);

    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let t0 = Instant::now();

        /* --------------- input ----------------------------------------- */
        let mut forward = 0.0;
        let mut side = 0.0;
        if win.is_key_down(Key::Up) || win.is_key_down(Key::W) {
            forward += MOVE_STEP;
        }
        if win.is_key_down(Key::Down) || win.is_key_down(Key::S) {
            forward -= MOVE_STEP;
        }
        if win.is_key_down(Key::A) {
            side -= MOVE_STEP;
        }
        if win.is_key_down(Key::D) {
            side += MOVE_STEP;
        }
        if win.is_key_down(Key::Left) {
            engine.camera.turn(TURN_STEP);
        }
        if win.is_key_down(Key::Right) {
            engine.camera.turn(-TURN_STEP);
        }

        let mut next = engine.camera;
        next.step(forward, side);
        if walkable(engine.map(), next.pos()) {
            engine.camera = next;
        }
        if let Ok(mut pos) = sim.world_mut().get::<&mut Position>(player) {
            pos.0 = engine.camera.pos();
        }

        if win.is_key_pressed(Key::Space, KeyRepeat::No) {
            let from = engine.camera.tile();
            let dir = facing(engine.camera.angle());
            sim.use_facing(engine.map_mut(), from, dir)?;
        }

        /* --------------- simulate & draw ------------------------------- */
        for event in sim.pump(engine.map_mut())? {
            engine.apply(event);
        }

        let mut shown = Ok(());
        engine.render_frame(&mut presenter, sim.world(), &bank, |fb, w, h| {
            acc_time += t0.elapsed();
            acc_frames += 1;
            shown = win.update_with_buffer(fb, w, h);
        });
        shown?;

        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames.max(1) as f64;
            info!("avg frame: {avg_ms:.2} ms ({:.1} FPS), {} tics", 1000.0 / avg_ms, sim.tics());
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}

/// Nearest cardinal direction for a fine angle.
fn facing(angle: i32) -> Dir {
    match normalize_angle(angle + ANGLE_90 / 2) / ANGLE_90 {
        0 => Dir::East,
        1 => Dir::North,
        2 => Dir::West,
        _ => Dir::South,
    }
}

fn walkable(map: &TileMap, p: Vec2) -> bool {
    let corners = [
        Vec2::new(-BODY_RADIUS, -BODY_RADIUS),
        Vec2::new(BODY_RADIUS, -BODY_RADIUS),
        Vec2::new(-BODY_RADIUS, BODY_RADIUS),
        Vec2::new(BODY_RADIUS, BODY_RADIUS),
    ];
    corners.iter().all(|&c| {
        let t = TileCoord::containing(p + c);
        match map.tile(t) {
            Tile::Empty => true,
            Tile::Door { index } => map.door_openness(index) >= 1.0,
            _ => false,
        }
    })
}

/*──────────────────────────── textures ────────────────────────────*/

const TEX_SIZE: usize = 16;

/// Bordered square; `edge` outlines, `fill` inside.
fn framed(name: &str, fill: u8, edge: u8) -> Texture {
    let mut t = Texture::solid(name, TEX_SIZE, fill);
    for i in 0..TEX_SIZE {
        for (x, y) in [(i, 0), (i, TEX_SIZE - 1), (0, i), (TEX_SIZE - 1, i)] {
            t.pixels[y * TEX_SIZE + x] = edge;
        }
    }
    t
}

/// Diamond on a transparent background.
fn diamond(name: &str, fill: u8) -> Texture {
    let mut t = Texture::solid(name, TEX_SIZE, TRANSPARENT_TEXEL);
    let c = TEX_SIZE as i32 / 2;
    for y in 0..TEX_SIZE as i32 {
        for x in 0..TEX_SIZE as i32 {
            if (x - c).abs() + (y - c).abs() < c {
                t.pixels[(y * TEX_SIZE as i32 + x) as usize] = fill;
            }
        }
    }
    t
}

fn demo_bank() -> anyhow::Result<TextureBank> {
    let mut palette = Palette::default();
    for i in 0..255usize {
        let r = (i * 53 % 256) as u32;
        let g = (i * 97 % 256) as u32;
        let b = (i * 151 % 256) as u32;
        palette[i] = (r << 16) | (g << 8) | b;
    }
    let mut bank = TextureBank::default_with_checker();
    bank.set_palette(palette);

    for pic in 1..=63u16 {
        let base = (pic * 3) as u8;
        for (axis, shade) in [(Axis::Horizontal, 0), (Axis::Vertical, 1)] {
            let id = WallPic(pic).texture(axis);
            bank.insert(id, framed("WALL", base + shade, 1))?;
        }
    }
    for kind in 0..4u16 {
        for side in 0..2u16 {
            let id = DOOR_TEXTURE_BASE + kind * 2 + side;
            bank.insert(id, framed("DOOR", 200 + (kind * 2 + side) as u8, 2))?;
        }
    }
    bank.insert(DOOR_JAMB_TEXTURE, framed("JAMB", 40, 40))?;
    bank.insert(DOOR_JAMB_TEXTURE + 1, framed("JAMB", 41, 41))?;
    for i in 0..48u16 {
        bank.insert(SPRITE_TEXTURE_BASE + i, diamond("DECO", 100 + i as u8))?;
    }
    Ok(bank)
}
