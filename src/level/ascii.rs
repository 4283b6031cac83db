//! Text maps for tests, benches and the demo viewer.
//!
//! ```text
//!   #  wall (picture 1)        1-9  wall with that picture
//!   .  floor                   S    switch wall (picture 21)
//!   |  vertical door           -    horizontal door
//!   P  pushable wall           o    decoration   O  blocking decoration
//!   ^ > v <  player start facing north, east, south, west
//! ```
//!
//! Leading and trailing whitespace of each line is ignored, as are blank
//! lines.

use super::{LevelError, LoadedLevel, SpriteSpawn};
use crate::{
    sim::SpriteVisual,
    world::{
        ANGLE_90, ANGLE_180, ANGLE_270, Camera, DoorLock, DoorOrientation, MapError,
        SPRITE_TEXTURE_BASE, Tile, TileCode, TileCoord, TileMap, WallPic,
    },
};

/// Small level with one of everything, used by the viewers and benches.
pub const DEMO: &str = "
    ################
    #>.....#.......#
    #......|...o...#
    #..O...#.......#
    ####-###...2...#
    #......#.......#
    #..o...P.......#
    #......#...S...#
    #......#########
    #..............#
    #......o.......#
    ################
";

enum Cell {
    Floor,
    Wall(u16),
    Door(DoorOrientation),
    Pushable,
}

pub fn parse(src: &str) -> Result<LoadedLevel, LevelError> {
    let rows: Vec<(usize, &str)> = src
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
        .collect();
    let width = rows.first().map_or(0, |(_, l)| l.chars().count());
    let height = rows.len();

    let mut codes = Vec::with_capacity(width * height);
    let mut doors = Vec::new();
    let mut pushables = Vec::new();
    let mut spawns = Vec::new();
    let mut player = None;

    for (y, &(line, row)) in rows.iter().enumerate() {
        let len = row.chars().count();
        if len != width {
            return Err(LevelError::RaggedRow {
                line,
                len,
                expected: width,
            });
        }
        for (x, ch) in row.chars().enumerate() {
            let t = TileCoord::new(x as i32, y as i32);
            let cell = match ch {
                '.' => Cell::Floor,
                '#' => Cell::Wall(1),
                '1'..='9' => Cell::Wall(ch as u16 - '0' as u16),
                'S' => Cell::Wall(21),
                'P' => Cell::Pushable,
                '|' => Cell::Door(DoorOrientation::Vertical),
                '-' => Cell::Door(DoorOrientation::Horizontal),
                'o' | 'O' => {
                    spawns.push(SpriteSpawn {
                        pos: t.center(),
                        visual: SpriteVisual {
                            texture: SPRITE_TEXTURE_BASE + (ch == 'O') as u16,
                            translucent: false,
                        },
                        blocking: ch == 'O',
                    });
                    Cell::Floor
                }
                '^' | '>' | 'v' | '<' => {
                    let angle = match ch {
                        '^' => ANGLE_90,
                        '>' => 0,
                        'v' => ANGLE_270,
                        _ => ANGLE_180,
                    };
                    player = Some(Camera::new(t.center(), angle));
                    Cell::Floor
                }
                _ => {
                    return Err(LevelError::BadChar {
                        line,
                        column: x + 1,
                        ch,
                    });
                }
            };
            let code = match cell {
                Cell::Floor => TileCode::EMPTY,
                Cell::Wall(pic) => wall(pic)?,
                Cell::Pushable => {
                    pushables.push(t);
                    wall(1)?
                }
                Cell::Door(orientation) => {
                    doors.push((t, orientation));
                    TileCode::EMPTY
                }
            };
            codes.push(code);
        }
    }

    let areas = vec![0; codes.len()];
    let mut map = TileMap::new("ascii", width, height, codes, areas)?;
    for (t, orientation) in doors {
        map.add_door(t, orientation, DoorLock::Normal)?;
    }
    for t in pushables {
        map.mark_pushable(t);
    }
    map.validate()?;

    Ok(LoadedLevel {
        map,
        spawns,
        player,
    })
}

fn wall(pic: u16) -> Result<TileCode, MapError> {
    Ok(Tile::Solid { pic: WallPic(pic) }.encode()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_with_everything() {
        let level = parse(
            "
            #######
            #>.|.o#
            #2.P.O#
            ###-###
            #.....#
            #######
            ",
        )
        .unwrap();
        let map = &level.map;
        assert_eq!((map.width(), map.height()), (7, 6));
        assert_eq!(map.tile(TileCoord::new(1, 2)), Tile::Solid { pic: WallPic(2) });
        assert_eq!(map.doors().len(), 2);
        assert_eq!(map.doors()[0].orientation, DoorOrientation::Vertical);
        assert_eq!(map.doors()[1].tile, TileCoord::new(3, 3));
        assert!(map.is_pushable(TileCoord::new(3, 2)));
        assert_eq!(level.spawns.len(), 2);
        assert!(level.spawns[1].blocking);
        assert_eq!(level.player.unwrap().angle(), 0);
    }

    #[test]
    fn demo_map_parses() {
        let level = parse(DEMO).unwrap();
        assert_eq!((level.map.width(), level.map.height()), (16, 12));
        assert_eq!(level.map.doors().len(), 2);
        assert!(level.map.is_pushable(TileCoord::new(7, 6)));
        assert_eq!(level.spawns.len(), 4);
        assert!(level.player.is_some());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = parse("###\n#.##\n###\n").unwrap_err();
        assert!(matches!(
            err,
            LevelError::RaggedRow {
                line: 2,
                len: 4,
                expected: 3
            }
        ));
    }

    #[test]
    fn unknown_character() {
        let err = parse("###\n#x#\n###\n").unwrap_err();
        assert!(matches!(err, LevelError::BadChar { line: 2, column: 2, ch: 'x' }));
    }

    #[test]
    fn empty_input_is_a_size_error() {
        assert!(matches!(
            parse("\n\n").unwrap_err(),
            LevelError::Map(MapError::BadSize { width: 0, height: 0 })
        ));
    }
}
