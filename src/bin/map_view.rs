//! Top-down 2-D map viewer with the ray fan overlaid.
//!
//! ```bash
//! cargo run --release --bin map_view -- [level.ywm] [--rays 64]
//! ```
//!
//! Controls ←/→ = turn ↑/↓ = move Esc = quit

use anyhow::Context;
use clap::Parser;
use minifb::{Key, Window, WindowOptions};
use std::path::PathBuf;

use yawolf_rs::{
    engine::{HitKind, RayCaster, RenderConfig, ViewTables, VisMarks, VisibilityCollector},
    level::{RawLevel, ascii},
    world::{Tile, TileCoord, TileMap},
};

const WIDTH: usize = 1024;
const HEIGHT: usize = 768;

#[derive(Parser, Debug)]
#[command(about = "Top-down map and ray viewer")]
struct Args {
    /// Level file; the built-in demo map when omitted.
    level: Option<PathBuf>,

    /// Rays cast across the field of view.
    #[arg(long, default_value_t = 64)]
    rays: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let level = match &args.level {
        Some(path) => RawLevel::from_file(path)
            .and_then(|raw| raw.build())
            .with_context(|| format!("loading {}", path.display()))?,
        None => ascii::parse(ascii::DEMO)?,
    };
    let map = level.map;
    let mut camera = level.player.context("level has no player start")?;
    println!("{}", map.name());

    let tables = ViewTables::new(&RenderConfig {
        width: args.rays,
        ..Default::default()
    })?;
    let caster = RayCaster::new(&map, &tables);
    let mut vis = VisibilityCollector::new(map.width(), map.height());

    // ─────────── map‑space → screen‑space transform ────────────
    let scale = (WIDTH as f32 / map.width() as f32).min(HEIGHT as f32 / map.height() as f32) * 0.9;
    let off_x = (WIDTH as f32 - map.width() as f32 * scale) / 2.0;
    let off_y = (HEIGHT as f32 - map.height() as f32 * scale) / 2.0;
    let to_screen = |x: f32, y: f32| -> (i32, i32) {
        ((x * scale + off_x) as i32, (y * scale + off_y) as i32)
    };

    let mut buffer = vec![0u32; WIDTH * HEIGHT];
    let mut window = Window::new("yawolf map", WIDTH, HEIGHT, WindowOptions::default())?;
    window.set_target_fps(35);

    while window.is_open() && !window.is_key_down(Key::Escape) {
        if window.is_key_down(Key::Left) {
            camera.turn(30);
        }
        if window.is_key_down(Key::Right) {
            camera.turn(-30);
        }
        let mut next = camera;
        if window.is_key_down(Key::Up) {
            next.step(0.05, 0.0);
        }
        if window.is_key_down(Key::Down) {
            next.step(-0.05, 0.0);
        }
        if map.tile(next.tile()) == Tile::Empty {
            camera = next;
        }

        vis.begin_frame();
        let hits: Vec<_> = (0..tables.width())
            .map(|c| caster.cast_column(c, &camera, &mut vis))
            .collect();

        // ─────────── rasterise tiles ────────────
        buffer.fill(0);
        for t in map.coords() {
            let colour = tile_colour(&map, t, vis.marks(t));
            let (x0, y0) = to_screen(t.x as f32, t.y as f32);
            let (x1, y1) = to_screen(t.x as f32 + 1.0, t.y as f32 + 1.0);
            fill_rect(&mut buffer, x0, y0, x1 - 1, y1 - 1, colour);
        }

        // ─────────── ray fan ────────────
        let (ex, ey) = to_screen(camera.pos().x, camera.pos().y);
        for hit in &hits {
            let (hx, hy) = to_screen(hit.point.x, hit.point.y);
            let colour = match hit.kind {
                HitKind::Solid => 0x00_FFFF00,
                HitKind::Door { .. } => 0x00_00FFFF,
                HitKind::PushWall { .. } => 0x00_FF00FF,
            };
            draw_line(&mut buffer, WIDTH, HEIGHT, ex, ey, hx, hy, colour);
        }

        window.update_with_buffer(&buffer, WIDTH, HEIGHT)?;
    }
    Ok(())
}

fn tile_colour(map: &TileMap, t: TileCoord, marks: VisMarks) -> u32 {
    let base = match map.tile(t) {
        Tile::Empty => 0x00_202020,
        Tile::Solid { .. } if map.is_pushable(t) => 0x00_705070,
        Tile::Solid { .. } => 0x00_606060,
        Tile::Door { .. } => 0x00_306090,
        Tile::PushWall { .. } => 0x00_904090,
    };
    if marks.contains(VisMarks::PASSED) {
        base + 0x00_203020
    } else {
        base
    }
}

fn fill_rect(buf: &mut [u32], x0: i32, y0: i32, x1: i32, y1: i32, colour: u32) {
    for y in y0.max(0)..=y1.min(HEIGHT as i32 - 1) {
        for x in x0.max(0)..=x1.min(WIDTH as i32 - 1) {
            buf[y as usize * WIDTH + x as usize] = colour;
        }
    }
}

/// Integer Bresenham line‑drawing algorithm.
#[allow(clippy::too_many_arguments)]
fn draw_line(
    buf: &mut [u32],
    w: usize,
    h: usize,
    mut x0: i32,
    mut y0: i32,
    x1: i32,
    y1: i32,
    colour: u32,
) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if (0..w as i32).contains(&x0) && (0..h as i32).contains(&y0) {
            buf[y0 as usize * w + x0 as usize] = colour;
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
