//! # Column Queries
//!
//! The resolver only ever asks two questions of a world: "what is at this
//! block" and "what is the highest non-empty block of this column". Both
//! are behind [`ColumnQuery`] so any host world can answer them.
//!
//! [`VoxelWorld`] is the in-memory implementation: chunks of 16x16 columns
//! spanning the full world height, each with a height map.
//!
//! ## Out-of-range Reads
//!
//! | position | material |
//! |---|---|
//! | below the floor | `VoidAir` |
//! | at or above the ceiling | `Air` |
//! | inside a chunk that was never created | `VoidAir` |

use std::collections::HashMap;

use lastlife_shared::{BlockPos, WORLD_CEILING_Y, WORLD_FLOOR_Y};
use parking_lot::RwLock;

use crate::material::Material;

/// Chunk width/depth in blocks.
pub const CHUNK_SIZE: usize = 16;

/// Height-map marker for a column with no non-empty block.
const EMPTY_COLUMN: i16 = i16::MIN;

/// Read access to a world's blocks, one column at a time.
pub trait ColumnQuery: Send + Sync {
    /// Material of the block at `pos`.
    fn block_at(&self, pos: BlockPos) -> Material;

    /// Height of the highest non-empty block in the column, if any.
    fn highest_block_y(&self, x: i32, z: i32) -> Option<i32>;

    /// Lowest representable block height.
    fn min_height(&self) -> i32;

    /// One past the highest representable block height.
    fn max_height(&self) -> i32;
}

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not blocks).
    pub x: i32,
    /// Z coordinate (in chunks, not blocks).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk containing the given block column.
    #[allow(clippy::cast_possible_wrap)]
    #[inline]
    #[must_use]
    pub const fn from_block(block_x: i32, block_z: i32) -> Self {
        Self {
            x: block_x.div_euclid(CHUNK_SIZE as i32),
            z: block_z.div_euclid(CHUNK_SIZE as i32),
        }
    }
}

/// Local (in-chunk) column index of a block column.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
#[inline]
const fn local(block_x: i32, block_z: i32) -> (usize, usize) {
    (
        block_x.rem_euclid(CHUNK_SIZE as i32) as usize,
        block_z.rem_euclid(CHUNK_SIZE as i32) as usize,
    )
}

/// A 16x16 stack of columns covering the world's height range.
#[derive(Clone, Debug)]
pub struct Chunk {
    /// Chunk position in the world.
    pub coord: ChunkCoord,
    /// Lowest block height stored.
    min_y: i32,
    /// Number of block rows.
    height: usize,
    /// Material ids, indexed as `[y][z][x]`.
    blocks: Box<[u16]>,
    /// Highest non-empty block per column (indexed as `[z][x]`).
    height_map: [[i16; CHUNK_SIZE]; CHUNK_SIZE],
}

impl Chunk {
    /// Creates an all-air chunk spanning `min_y..max_y`.
    #[allow(clippy::cast_sign_loss)]
    #[must_use]
    pub fn new(coord: ChunkCoord, min_y: i32, max_y: i32) -> Self {
        let height = (max_y - min_y).max(0) as usize;
        Self {
            coord,
            min_y,
            height,
            blocks: vec![Material::Air.id(); height * CHUNK_SIZE * CHUNK_SIZE].into_boxed_slice(),
            height_map: [[EMPTY_COLUMN; CHUNK_SIZE]; CHUNK_SIZE],
        }
    }

    #[allow(clippy::cast_sign_loss)]
    fn index(&self, lx: usize, y: i32, lz: usize) -> Option<usize> {
        let row = y - self.min_y;
        if row < 0 || row as usize >= self.height {
            return None;
        }
        Some((row as usize * CHUNK_SIZE + lz) * CHUNK_SIZE + lx)
    }

    /// Gets a block at local column `(lx, lz)` and absolute height `y`.
    ///
    /// Returns `Air` outside the stored height range.
    #[must_use]
    pub fn get(&self, lx: usize, y: i32, lz: usize) -> Material {
        if lx >= CHUNK_SIZE || lz >= CHUNK_SIZE {
            return Material::Air;
        }
        self.index(lx, y, lz)
            .and_then(|i| Material::from_id(self.blocks[i]))
            .unwrap_or(Material::Air)
    }

    /// Sets a block at local column `(lx, lz)` and absolute height `y`.
    ///
    /// Writes outside the stored range are ignored.
    #[allow(clippy::cast_possible_truncation)]
    pub fn set(&mut self, lx: usize, y: i32, lz: usize, material: Material) {
        if lx >= CHUNK_SIZE || lz >= CHUNK_SIZE {
            return;
        }
        let Some(i) = self.index(lx, y, lz) else {
            return;
        };
        self.blocks[i] = material.id();

        let top = self.height_map[lz][lx];
        if !material.is_empty() {
            if top == EMPTY_COLUMN || y > i32::from(top) {
                self.height_map[lz][lx] = y as i16;
            }
        } else if i32::from(top) == y {
            self.height_map[lz][lx] = self.scan_top(lx, lz, y - 1);
        }
    }

    /// Rescans a column downward from `start_y` for the new top.
    #[allow(clippy::cast_possible_truncation)]
    fn scan_top(&self, lx: usize, lz: usize, start_y: i32) -> i16 {
        let mut y = start_y;
        while y >= self.min_y {
            if !self.get(lx, y, lz).is_empty() {
                return y as i16;
            }
            y -= 1;
        }
        EMPTY_COLUMN
    }

    /// Highest non-empty block of a local column.
    #[must_use]
    pub fn top(&self, lx: usize, lz: usize) -> Option<i32> {
        if lx >= CHUNK_SIZE || lz >= CHUNK_SIZE {
            return None;
        }
        match self.height_map[lz][lx] {
            EMPTY_COLUMN => None,
            y => Some(i32::from(y)),
        }
    }
}

/// A named, in-memory voxel world.
#[derive(Clone, Debug)]
pub struct VoxelWorld {
    name: String,
    min_y: i32,
    max_y: i32,
    chunks: HashMap<ChunkCoord, Chunk>,
}

impl VoxelWorld {
    /// Creates an empty world with the regular height range.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_bounds(name, WORLD_FLOOR_Y, WORLD_CEILING_Y)
    }

    /// Creates an empty world spanning `min_y..max_y`.
    #[must_use]
    pub fn with_bounds(name: impl Into<String>, min_y: i32, max_y: i32) -> Self {
        Self {
            name: name.into(),
            min_y,
            max_y: max_y.max(min_y),
            chunks: HashMap::new(),
        }
    }

    /// World name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of chunks created so far.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true if the chunk containing the column exists.
    #[must_use]
    pub fn is_column_loaded(&self, x: i32, z: i32) -> bool {
        self.chunks.contains_key(&ChunkCoord::from_block(x, z))
    }

    /// Creates the chunk containing the column (all air) if it is missing.
    pub fn load_column(&mut self, x: i32, z: i32) {
        let coord = ChunkCoord::from_block(x, z);
        let (min_y, max_y) = (self.min_y, self.max_y);
        self.chunks
            .entry(coord)
            .or_insert_with(|| Chunk::new(coord, min_y, max_y));
    }

    /// Sets one block, creating its chunk on demand.
    pub fn set_block(&mut self, pos: BlockPos, material: Material) {
        if pos.y < self.min_y || pos.y >= self.max_y {
            return;
        }
        let coord = ChunkCoord::from_block(pos.x, pos.z);
        let (min_y, max_y) = (self.min_y, self.max_y);
        let chunk = self
            .chunks
            .entry(coord)
            .or_insert_with(|| Chunk::new(coord, min_y, max_y));
        let (lx, lz) = local(pos.x, pos.z);
        chunk.set(lx, pos.y, lz, material);
    }

    /// Fills `from_y..=to_y` of one column with a material.
    pub fn fill_column(&mut self, x: i32, z: i32, from_y: i32, to_y: i32, material: Material) {
        self.load_column(x, z);
        for y in from_y..=to_y {
            self.set_block(BlockPos::new(x, y, z), material);
        }
    }

    /// Fills the inclusive box between two corners.
    pub fn fill(&mut self, min: BlockPos, max: BlockPos, material: Material) {
        for x in min.x..=max.x {
            for z in min.z..=max.z {
                self.fill_column(x, z, min.y, max.y, material);
            }
        }
    }
}

impl ColumnQuery for VoxelWorld {
    fn block_at(&self, pos: BlockPos) -> Material {
        if pos.y < self.min_y {
            return Material::VoidAir;
        }
        if pos.y >= self.max_y {
            return Material::Air;
        }
        let (lx, lz) = local(pos.x, pos.z);
        self.chunks
            .get(&ChunkCoord::from_block(pos.x, pos.z))
            .map_or(Material::VoidAir, |chunk| chunk.get(lx, pos.y, lz))
    }

    fn highest_block_y(&self, x: i32, z: i32) -> Option<i32> {
        let (lx, lz) = local(x, z);
        self.chunks
            .get(&ChunkCoord::from_block(x, z))
            .and_then(|chunk| chunk.top(lx, lz))
    }

    fn min_height(&self) -> i32 {
        self.min_y
    }

    fn max_height(&self) -> i32 {
        self.max_y
    }
}

/// Worlds shared with the host are read under a short-lived read lock.
impl ColumnQuery for RwLock<VoxelWorld> {
    fn block_at(&self, pos: BlockPos) -> Material {
        self.read().block_at(pos)
    }

    fn highest_block_y(&self, x: i32, z: i32) -> Option<i32> {
        self.read().highest_block_y(x, z)
    }

    fn min_height(&self) -> i32 {
        self.read().min_height()
    }

    fn max_height(&self) -> i32 {
        self.read().max_height()
    }
}
