//! In-memory chunked voxel world.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use hashbrown::HashMap;
use timber_blocks::Material;

use crate::host::{World, WorldId};
use crate::pos::BlockPos;

pub const CHUNK_SIZE: i32 = 16;
pub const DEFAULT_MIN_Y: i32 = -64;
pub const DEFAULT_MAX_Y: i32 = 320;

type ChunkKey = (i32, i32, i32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemDrop {
    pub pos: BlockPos,
    pub item: Material,
}

#[derive(Default, Debug, Clone, Copy)]
pub struct VoxelWorldStats {
    pub chunk_entries: usize,
    pub solid_blocks: usize,
    pub blocks_broken: u64,
    pub drops: usize,
}

/// Sparse world: only non-air blocks are stored, bucketed per chunk. Anything
/// not stored (including positions outside `[min_y, max_y)`) reads as air.
pub struct VoxelWorld {
    id: WorldId,
    name: String,
    min_y: i32,
    max_y: i32,
    chunks: RwLock<HashMap<ChunkKey, HashMap<BlockPos, Material>>>,
    drops: Mutex<Vec<ItemDrop>>,
    broken: AtomicU64,
}

impl VoxelWorld {
    pub fn new(id: WorldId, name: impl Into<String>) -> Self {
        Self::with_height(id, name, DEFAULT_MIN_Y, DEFAULT_MAX_Y)
    }

    pub fn with_height(id: WorldId, name: impl Into<String>, min_y: i32, max_y: i32) -> Self {
        Self {
            id,
            name: name.into(),
            min_y,
            max_y: max_y.max(min_y),
            chunks: RwLock::new(HashMap::new()),
            drops: Mutex::new(Vec::new()),
            broken: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn in_bounds(&self, pos: BlockPos) -> bool {
        pos.y >= self.min_y && pos.y < self.max_y
    }

    #[inline]
    fn chunk_key(pos: BlockPos) -> ChunkKey {
        pos.chunk_key(CHUNK_SIZE, CHUNK_SIZE, CHUNK_SIZE)
    }

    fn read_chunks(&self) -> RwLockReadGuard<'_, HashMap<ChunkKey, HashMap<BlockPos, Material>>> {
        self.chunks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_chunks(&self) -> RwLockWriteGuard<'_, HashMap<ChunkKey, HashMap<BlockPos, Material>>> {
        self.chunks.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_drops(&self) -> MutexGuard<'_, Vec<ItemDrop>> {
        self.drops.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Place a block without any drop bookkeeping. Returns `false` outside the
    /// build height.
    pub fn set(&self, pos: BlockPos, material: Material) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        let key = Self::chunk_key(pos);
        let mut chunks = self.write_chunks();
        if material.is_air() {
            if let Some(chunk) = chunks.get_mut(&key) {
                chunk.remove(&pos);
                if chunk.is_empty() {
                    chunks.remove(&key);
                }
            }
        } else {
            chunks.entry(key).or_default().insert(pos, material);
        }
        true
    }

    /// Fill the inclusive box spanned by `a` and `b`.
    pub fn fill(&self, a: BlockPos, b: BlockPos, material: Material) -> usize {
        let mut placed = 0;
        for x in a.x.min(b.x)..=a.x.max(b.x) {
            for y in a.y.min(b.y)..=a.y.max(b.y) {
                for z in a.z.min(b.z)..=a.z.max(b.z) {
                    if self.set(BlockPos::new(x, y, z), material) {
                        placed += 1;
                    }
                }
            }
        }
        placed
    }

    pub fn count_where(&self, pred: impl Fn(Material) -> bool) -> usize {
        self.read_chunks()
            .values()
            .flat_map(|chunk| chunk.values())
            .filter(|m| pred(**m))
            .count()
    }

    /// Sorted positions of every stored block matching `pred`.
    pub fn positions_where(&self, pred: impl Fn(Material) -> bool) -> Vec<BlockPos> {
        let mut out: Vec<BlockPos> = self
            .read_chunks()
            .values()
            .flat_map(|chunk| chunk.iter())
            .filter(|(_, m)| pred(**m))
            .map(|(p, _)| *p)
            .collect();
        out.sort();
        out
    }

    pub fn drops(&self) -> Vec<ItemDrop> {
        self.lock_drops().clone()
    }

    pub fn stats(&self) -> VoxelWorldStats {
        let (chunk_entries, solid_blocks) = {
            let chunks = self.read_chunks();
            (chunks.len(), chunks.values().map(|c| c.len()).sum())
        };
        VoxelWorldStats {
            chunk_entries,
            solid_blocks,
            blocks_broken: self.broken.load(Ordering::Relaxed),
            drops: self.lock_drops().len(),
        }
    }
}

impl World for VoxelWorld {
    fn id(&self) -> WorldId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn material_at(&self, pos: BlockPos) -> Material {
        if !self.in_bounds(pos) {
            return Material::Air;
        }
        self.read_chunks()
            .get(&Self::chunk_key(pos))
            .and_then(|chunk| chunk.get(&pos).copied())
            .unwrap_or(Material::Air)
    }

    fn break_naturally(&self, pos: BlockPos) -> Option<Material> {
        if !self.in_bounds(pos) {
            return None;
        }
        let key = Self::chunk_key(pos);
        // Check-and-clear under one write lock so overlapping breaks of the same
        // block resolve to a single winner.
        let removed = {
            let mut chunks = self.write_chunks();
            let chunk = chunks.get_mut(&key)?;
            let removed = chunk.remove(&pos);
            if chunk.is_empty() {
                chunks.remove(&key);
            }
            removed
        }?;
        self.broken.fetch_add(1, Ordering::Relaxed);
        if let Some(item) = removed.drop_item() {
            self.lock_drops().push(ItemDrop { pos, item });
        }
        log::trace!(target: "timber::world", "{} broke {} at {}", self.name, removed, pos);
        Some(removed)
    }
}
