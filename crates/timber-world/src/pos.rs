use std::fmt;

/// Integer block coordinate in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Offset position, or `None` when any axis would leave the `i32` range.
    #[inline]
    pub fn checked_offset(self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
            z: self.z.checked_add(dz)?,
        })
    }

    /// The 3x3x3 cube centered on this position, the center included.
    /// Offsets that overflow the coordinate range are skipped.
    pub fn cube_neighborhood(self) -> impl Iterator<Item = BlockPos> {
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| {
                (-1..=1).filter_map(move |dz| self.checked_offset(dx, dy, dz))
            })
        })
    }

    #[inline]
    pub fn chunk_key(self, sx: i32, sy: i32, sz: i32) -> (i32, i32, i32) {
        (
            self.x.div_euclid(sx),
            self.y.div_euclid(sy),
            self.z.div_euclid(sz),
        )
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighborhood_is_27_unique_positions() {
        let center = BlockPos::new(5, -3, 12);
        let mut all: Vec<_> = center.cube_neighborhood().collect();
        assert_eq!(all.len(), 27);
        assert!(all.contains(&center));
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 27);
    }

    #[test]
    fn neighborhood_at_coordinate_limit_skips_overflow() {
        let corner = BlockPos::new(i32::MAX, i32::MIN, 0);
        let all: Vec<_> = corner.cube_neighborhood().collect();
        // x can only go -1/0, y only 0/+1
        assert_eq!(all.len(), 2 * 2 * 3);
        assert!(all.contains(&corner));
        assert!(all.contains(&BlockPos::new(i32::MAX - 1, i32::MIN + 1, 1)));
    }

    #[test]
    fn chunk_key_floors_negative_coords() {
        assert_eq!(BlockPos::new(-1, 0, 16).chunk_key(16, 16, 16), (-1, 0, 1));
    }
}
