use std::sync::Arc;

use crate::host::{Server, World, WorldId};
use crate::voxel::VoxelWorld;

/// Server that owns a fixed list of in-memory worlds.
#[derive(Default)]
pub struct LocalServer {
    worlds: Vec<Arc<VoxelWorld>>,
}

impl LocalServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a world with the next free id.
    pub fn create_world(&mut self, name: impl Into<String>, min_y: i32, max_y: i32) -> Arc<VoxelWorld> {
        let id = WorldId(self.worlds.len() as u32);
        let world = Arc::new(VoxelWorld::with_height(id, name, min_y, max_y));
        self.worlds.push(world.clone());
        world
    }

    pub fn voxel_world(&self, id: WorldId) -> Option<&Arc<VoxelWorld>> {
        self.worlds.iter().find(|w| w.id() == id)
    }

    pub fn voxel_worlds(&self) -> &[Arc<VoxelWorld>] {
        &self.worlds
    }
}

impl Server for LocalServer {
    fn worlds(&self) -> Vec<Arc<dyn World>> {
        self.worlds
            .iter()
            .map(|w| w.clone() as Arc<dyn World>)
            .collect()
    }

    fn world(&self, id: WorldId) -> Option<Arc<dyn World>> {
        self.voxel_world(id).map(|w| w.clone() as Arc<dyn World>)
    }
}
