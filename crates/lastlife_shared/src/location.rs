//! # World Coordinates
//!
//! [`Location`] is a precise position inside a named world, as reported by
//! the host for deaths and teleports. [`BlockPos`] is the integer block that
//! contains it, which is what the world model is queried with.

use serde::{Deserialize, Serialize};

use crate::codec::{ByteReader, ByteWriter, CodecResult};

/// Integer block coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate (height).
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Creates a new block position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Same column, different height.
    #[inline]
    #[must_use]
    pub const fn with_y(self, y: i32) -> Self {
        Self { x: self.x, y, z: self.z }
    }

    /// The block directly above.
    #[inline]
    #[must_use]
    pub const fn up(self) -> Self {
        self.offset(0, 1, 0)
    }

    /// The block directly below.
    #[inline]
    #[must_use]
    pub const fn down(self) -> Self {
        self.offset(0, -1, 0)
    }

    /// Offsets by the given deltas.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }
}

/// A precise position in a named world, with view direction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Name of the world (dimension) this location belongs to.
    pub world: String,
    /// X coordinate.
    pub x: f64,
    /// Y coordinate (height).
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
    /// Horizontal view angle in degrees.
    pub yaw: f32,
    /// Vertical view angle in degrees.
    pub pitch: f32,
}

impl Location {
    /// Creates a location facing straight ahead.
    #[must_use]
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Sets the view direction.
    #[must_use]
    pub fn facing(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }

    /// The block containing this location.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn block_pos(&self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }

    /// The integer block height of this location.
    #[must_use]
    pub fn block_y(&self) -> i32 {
        self.block_pos().y
    }

    /// Same world, x, z and view direction, standing on the bottom of block
    /// row `y`.
    #[must_use]
    pub fn at_block_y(&self, y: i32) -> Self {
        Self {
            y: f64::from(y),
            ..self.clone()
        }
    }

    /// Squared distance to another location in the same world.
    ///
    /// Returns `None` if the worlds differ.
    #[must_use]
    pub fn distance_squared(&self, other: &Self) -> Option<f64> {
        if self.world != other.world {
            return None;
        }
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        Some(dx * dx + dy * dy + dz * dz)
    }

    /// Appends this location to a record buffer.
    pub fn encode(&self, writer: &mut ByteWriter) {
        writer.put_str(&self.world);
        writer.put_f64(self.x);
        writer.put_f64(self.y);
        writer.put_f64(self.z);
        writer.put_f32(self.yaw);
        writer.put_f32(self.pitch);
    }

    /// Reads a location written by [`Location::encode`].
    ///
    /// # Errors
    ///
    /// Returns a codec error if the buffer is short or the world name is not
    /// UTF-8.
    pub fn decode(reader: &mut ByteReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            world: reader.get_str()?,
            x: reader.get_f64()?,
            y: reader.get_f64()?,
            z: reader.get_f64()?,
            yaw: reader.get_f32()?,
            pitch: reader.get_f32()?,
        })
    }

    /// Encodes into a standalone buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(48 + self.world.len());
        self.encode(&mut writer);
        writer.into_inner()
    }

    /// Decodes a standalone buffer produced by [`Location::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns a codec error on malformed input.
    pub fn from_bytes(bytes: &[u8]) -> CodecResult<Self> {
        Self::decode(&mut ByteReader::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_pos_floors_negative() {
        let loc = Location::new("world", -0.5, -63.2, 15.99);
        assert_eq!(loc.block_pos(), BlockPos::new(-1, -64, 15));
    }

    #[test]
    fn test_at_block_y_keeps_column() {
        let loc = Location::new("world", 3.5, 80.0, -2.5).facing(90.0, 10.0);
        let moved = loc.at_block_y(65);
        assert_eq!(moved.block_pos(), BlockPos::new(3, 65, -3));
        assert!((moved.yaw - 90.0).abs() < f32::EPSILON);
        assert_eq!(moved.world, "world");
    }

    #[test]
    fn test_distance_other_world() {
        let a = Location::new("world", 0.0, 0.0, 0.0);
        let b = Location::new("world_nether", 0.0, 0.0, 0.0);
        assert_eq!(a.distance_squared(&b), None);
        let c = Location::new("world", 3.0, 4.0, 0.0);
        assert_eq!(a.distance_squared(&c), Some(25.0));
    }

    #[test]
    fn test_bytes_survive() {
        let loc = Location::new("world_the_end", 100.25, 64.0, -7.75).facing(45.0, -30.0);
        let decoded = Location::from_bytes(&loc.to_bytes()).unwrap();
        assert_eq!(decoded, loc);
    }

    #[test]
    fn test_decode_truncated() {
        let bytes = Location::new("w", 1.0, 2.0, 3.0).to_bytes();
        assert!(Location::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn test_block_neighbours() {
        let pos = BlockPos::new(1, 2, 3);
        assert_eq!(pos.up(), BlockPos::new(1, 3, 3));
        assert_eq!(pos.down(), BlockPos::new(1, 1, 3));
        assert_eq!(pos.with_y(-64), BlockPos::new(1, -64, 3));
    }
}
