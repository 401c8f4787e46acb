//! Narrow host surfaces: just the world queries and mutations felling needs.
use std::fmt;
use std::sync::Arc;

use timber_blocks::Material;

use crate::pos::BlockPos;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(pub u32);

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world#{}", self.0)
    }
}

/// Handle to one block position inside one world. Carries no block state; the
/// owning [`World`] is asked every time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockRef {
    pub world: WorldId,
    pub pos: BlockPos,
}

impl BlockRef {
    #[inline]
    pub const fn new(world: WorldId, pos: BlockPos) -> Self {
        Self { world, pos }
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.world, self.pos)
    }
}

pub trait World: Send + Sync {
    fn id(&self) -> WorldId;

    fn name(&self) -> &str;

    /// Material at `pos`. Positions the world cannot resolve (unloaded, outside
    /// the build height) read as air.
    fn material_at(&self, pos: BlockPos) -> Material;

    /// Break the block as if a player mined it, spawning its drops. Returns the
    /// material that was removed, or `None` if the position already held air.
    fn break_naturally(&self, pos: BlockPos) -> Option<Material>;

    #[inline]
    fn block_at(&self, pos: BlockPos) -> BlockRef {
        BlockRef::new(self.id(), pos)
    }
}

pub trait Server: Send + Sync {
    /// Loaded worlds in load order; index 0 is the primary world.
    fn worlds(&self) -> Vec<Arc<dyn World>>;

    fn world(&self, id: WorldId) -> Option<Arc<dyn World>> {
        self.worlds().into_iter().find(|w| w.id() == id)
    }

    fn primary_world(&self) -> Option<Arc<dyn World>> {
        self.worlds().into_iter().next()
    }
}
