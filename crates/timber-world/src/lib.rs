//! World surface consumed by the felling logic, plus an in-memory voxel world.
#![forbid(unsafe_code)]

pub mod host;
pub mod pos;
pub mod server;
pub mod trees;
pub mod voxel;

pub use host::{BlockRef, Server, World, WorldId};
pub use pos::BlockPos;
pub use server::LocalServer;
pub use trees::{TreeSpec, plant_tree};
pub use voxel::{ItemDrop, VoxelWorld, VoxelWorldStats};
