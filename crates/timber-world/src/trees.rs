use serde::{Deserialize, Serialize};
use timber_blocks::{Material, Species};

use crate::host::World;
use crate::pos::BlockPos;
use crate::voxel::VoxelWorld;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TreeSpec {
    #[serde(default = "default_species")]
    pub species: Species,
    pub x: i32,
    pub z: i32,
    #[serde(default = "default_height")]
    pub height: i32,
    #[serde(default)]
    pub stripped: bool,
    #[serde(default = "default_leaf_radius")]
    pub leaf_radius: i32,
    /// Adds a log diagonally off the trunk below the canopy, connected only
    /// through an edge of the 3x3x3 neighborhood.
    #[serde(default)]
    pub branch: bool,
}
fn default_species() -> Species {
    Species::Oak
}
fn default_height() -> i32 {
    5
}
fn default_leaf_radius() -> i32 {
    2
}

pub const MAX_LEAF_RADIUS: i32 = 8;

impl TreeSpec {
    pub fn new(species: Species, x: i32, z: i32, height: i32) -> Self {
        Self {
            species,
            x,
            z,
            height,
            stripped: false,
            leaf_radius: default_leaf_radius(),
            branch: false,
        }
    }

    /// Check that the trunk and its canopy box fit inside `min_y..max_y` and
    /// the coordinate range when planted on `ground_y`.
    pub fn validate(&self, ground_y: i32, min_y: i32, max_y: i32) -> Result<(), String> {
        if self.height < 1 {
            return Err(format!("tree at ({}, {}): height must be at least 1", self.x, self.z));
        }
        if !(0..=MAX_LEAF_RADIUS).contains(&self.leaf_radius) {
            return Err(format!(
                "tree at ({}, {}): leaf_radius must be within 0..={MAX_LEAF_RADIUS}",
                self.x, self.z
            ));
        }
        let reach = self.leaf_radius.max(1);
        let fits_xz = [self.x, self.z]
            .iter()
            .all(|c| c.checked_sub(reach).is_some() && c.checked_add(reach).is_some());
        let canopy_top = ground_y
            .checked_add(self.height)
            .and_then(|top| top.checked_add(2));
        match canopy_top {
            Some(top) if fits_xz && ground_y >= min_y && top < max_y => Ok(()),
            _ => Err(format!(
                "tree at ({}, {}) with height {} does not fit in the world",
                self.x, self.z, self.height
            )),
        }
    }

    pub fn log_material(&self) -> Material {
        if self.stripped {
            Material::StrippedLog(self.species)
        } else {
            Material::Log(self.species)
        }
    }
}

/// Plant a tree standing on `ground_y`: a dirt block under the trunk, the trunk
/// itself, an optional branch and a leaf canopy that never overwrites logs.
/// Cells outside the coordinate range are skipped. Returns the positions of
/// every log placed.
pub fn plant_tree(world: &VoxelWorld, ground_y: i32, spec: &TreeSpec) -> Vec<BlockPos> {
    let mut logs = Vec::new();
    let log = spec.log_material();
    let base = BlockPos::new(spec.x, ground_y, spec.z);
    world.set(base, Material::Dirt);
    let height = spec.height.max(1);
    let mut top = base;
    for y in 1..=height {
        let Some(p) = base.checked_offset(0, y, 0) else {
            break;
        };
        if !world.in_bounds(p) {
            break;
        }
        if world.set(p, log) {
            logs.push(p);
        }
        top = p;
    }
    if spec.branch && spec.height >= 3 {
        if let Some(p) = top.checked_offset(1, -1, 1) {
            if world.set(p, log) {
                logs.push(p);
            }
        }
    }

    let leaf_r = spec.leaf_radius.clamp(0, MAX_LEAF_RADIUS);
    let leaves = Material::Leaves(spec.species);
    for dy in -2..=2 {
        let rad = if dy <= -2 || dy >= 2 { leaf_r - 1 } else { leaf_r };
        let extra = if dy >= 1 { 0 } else { 1 };
        for dx in -leaf_r..=leaf_r {
            for dz in -leaf_r..=leaf_r {
                if dx == 0 && dz == 0 && dy <= 0 {
                    continue;
                }
                if dx.abs() + dz.abs() > rad + extra {
                    continue;
                }
                let Some(p) = top.checked_offset(dx, dy, dz) else {
                    continue;
                };
                if world.material_at(p).is_air() {
                    world.set(p, leaves);
                }
            }
        }
    }
    log::debug!(
        target: "timber::world",
        "planted {} tree at ({}, {}) with {} logs",
        spec.species,
        spec.x,
        spec.z,
        logs.len()
    );
    logs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::WorldId;
    use timber_blocks::is_wooden_log;

    #[test]
    fn trunk_is_vertical_and_sits_on_dirt() {
        let w = VoxelWorld::with_height(WorldId(0), "t", 0, 64);
        let logs = plant_tree(&w, 10, &TreeSpec::new(Species::Spruce, 4, -2, 6));
        assert_eq!(logs.len(), 6);
        assert!(logs.iter().all(|p| p.x == 4 && p.z == -2));
        assert_eq!(w.count_where(is_wooden_log), 6);
        assert_eq!(w.count_where(|m| m == Material::Dirt), 1);
        assert!(w.count_where(|m| m == Material::Leaves(Species::Spruce)) > 0);
    }

    #[test]
    fn branch_is_diagonal_to_the_trunk() {
        let w = VoxelWorld::with_height(WorldId(0), "t", 0, 64);
        let mut spec = TreeSpec::new(Species::Oak, 0, 0, 5);
        spec.branch = true;
        spec.stripped = true;
        let logs = plant_tree(&w, 0, &spec);
        assert_eq!(logs.len(), 6);
        assert!(logs.contains(&BlockPos::new(1, 4, 1)));
        assert_eq!(w.count_where(|m| m == Material::StrippedLog(Species::Oak)), 6);
    }

    #[test]
    fn planting_at_the_coordinate_edge_skips_overflowing_cells() {
        let w = VoxelWorld::with_height(WorldId(0), "t", 0, 64);
        let mut spec = TreeSpec::new(Species::Birch, i32::MAX, i32::MIN, 4);
        spec.branch = true;
        let logs = plant_tree(&w, 10, &spec);
        assert_eq!(logs.len(), 4);
        assert!(w.count_where(|m| m == Material::Leaves(Species::Birch)) > 0);
    }

    #[test]
    fn trunk_stops_at_build_height() {
        let w = VoxelWorld::with_height(WorldId(0), "t", 0, 16);
        let logs = plant_tree(&w, 10, &TreeSpec::new(Species::Oak, 0, 0, i32::MAX));
        assert_eq!(logs.len(), 5);
    }

    #[test]
    fn validate_rejects_trees_that_leave_the_world() {
        assert!(TreeSpec::new(Species::Oak, 0, 0, 5).validate(64, -64, 320).is_ok());
        assert!(TreeSpec::new(Species::Oak, i32::MAX, 0, 5).validate(64, -64, 320).is_err());
        assert!(TreeSpec::new(Species::Oak, 0, i32::MIN, 5).validate(64, -64, 320).is_err());
        assert!(TreeSpec::new(Species::Oak, 0, 0, i32::MAX).validate(64, -64, 320).is_err());
        assert!(TreeSpec::new(Species::Oak, 0, 0, 300).validate(64, -64, 320).is_err());
        assert!(TreeSpec::new(Species::Oak, 0, 0, 0).validate(64, -64, 320).is_err());
        let mut wide = TreeSpec::new(Species::Oak, 0, 0, 5);
        wide.leaf_radius = 1000;
        assert!(wide.validate(64, -64, 320).is_err());
    }
}
