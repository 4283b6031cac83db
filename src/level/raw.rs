//! # Level container
//!
//! ```text
//!   offset  size
//!   0       24      header (bincode, fixed-int, little endian)
//!   24      2·w·h   plane 0: walls, doors and floor areas
//!   ..      2·w·h   plane 1: objects
//! ```

use bincode::{Decode, Encode, config, decode_from_slice, encode_to_vec};
use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use std::{fs, io::Cursor, path::Path};

use super::LevelError;

pub const LEVEL_MAGIC: [u8; 4] = *b"YWMP";
pub const HEADER_SIZE: usize = 24;

/// Fixed-size file header.
#[derive(Clone, Copy, Debug, Decode, Encode, PartialEq, Eq)]
pub struct LevelHeader {
    pub magic: [u8; 4],
    pub width: u16,
    pub height: u16,
    /// NUL-padded level name.
    pub name: [u8; 16],
}

impl LevelHeader {
    pub fn new(name: &str, width: u16, height: u16) -> Self {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let n = bytes.len().min(buf.len());
        buf[..n].copy_from_slice(&bytes[..n]);
        Self {
            magic: LEVEL_MAGIC,
            width,
            height,
            name: buf,
        }
    }

    /// Name up to the first NUL.
    pub fn name_str(&self) -> &str {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.name.len());
        std::str::from_utf8(&self.name[..end]).unwrap_or("?")
    }

    fn tiles(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Undecoded level: header plus the two planes of raw codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawLevel {
    pub header: LevelHeader,
    pub walls: Vec<u16>,
    pub objects: Vec<u16>,
}

impl RawLevel {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LevelError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LevelError> {
        let cfg = config::standard()
            .with_fixed_int_encoding()
            .with_little_endian();
        let (header, read) = decode_from_slice::<LevelHeader, _>(bytes, cfg)?;
        if header.magic != LEVEL_MAGIC {
            return Err(LevelError::BadMagic(header.magic));
        }

        let n = header.tiles();
        let mut cur = Cursor::new(&bytes[read..]);
        let walls = read_plane(&mut cur, n, "wall")?;
        let objects = read_plane(&mut cur, n, "object")?;
        Ok(Self {
            header,
            walls,
            objects,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, LevelError> {
        let cfg = config::standard()
            .with_fixed_int_encoding()
            .with_little_endian();
        let mut out = encode_to_vec(self.header, cfg)?;
        out.reserve((self.walls.len() + self.objects.len()) * 2);
        for &w in self.walls.iter().chain(&self.objects) {
            out.write_u16::<LE>(w)?;
        }
        Ok(out)
    }

    pub fn name(&self) -> &str {
        self.header.name_str()
    }
}

fn read_plane(
    cur: &mut Cursor<&[u8]>,
    n: usize,
    plane: &'static str,
) -> Result<Vec<u16>, LevelError> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let w = cur
            .read_u16::<LE>()
            .map_err(|_| LevelError::Truncated { plane, expected: n })?;
        out.push(w);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> RawLevel {
        RawLevel {
            header: LevelHeader::new("E1M1", 3, 3),
            walls: vec![1, 1, 1, 1, 107, 1, 1, 1, 1],
            objects: vec![0, 0, 0, 0, 20, 0, 0, 0, 0],
        }
    }

    #[test]
    fn header_is_24_bytes_and_little_endian() {
        let bytes = tiny().to_bytes().unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE + 2 * 9 * 2);
        assert_eq!(&bytes[..4], b"YWMP");
        assert_eq!(&bytes[4..8], &[3, 0, 3, 0]);
        assert_eq!(&bytes[8..12], b"E1M1");
        // centre floor tile, code 107
        assert_eq!(&bytes[HEADER_SIZE + 8..HEADER_SIZE + 10], &[107, 0]);
    }

    #[test]
    fn parse_back_file_image() {
        let raw = RawLevel::from_bytes(&tiny().to_bytes().unwrap()).unwrap();
        assert_eq!(raw.name(), "E1M1");
        assert_eq!(raw.objects[4], 20);
    }

    #[test]
    fn wrong_magic_rejected() {
        let mut bytes = tiny().to_bytes().unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            RawLevel::from_bytes(&bytes),
            Err(LevelError::BadMagic(m)) if &m == b"XWMP"
        ));
    }

    #[test]
    fn truncated_object_plane() {
        let mut bytes = tiny().to_bytes().unwrap();
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(
            RawLevel::from_bytes(&bytes),
            Err(LevelError::Truncated { plane: "object", expected: 9 })
        ));
    }

    #[test]
    fn short_header_is_a_decode_error() {
        assert!(matches!(
            RawLevel::from_bytes(b"YWMP\x03\x00"),
            Err(LevelError::Header(_))
        ));
    }
}
