use crate::material::{Material, Species};

/// Every block that counts as part of a fellable trunk: the six regular tree
/// species, unstripped and stripped.
pub const WOODEN_LOGS: [Material; 12] = [
    Material::Log(Species::Acacia),
    Material::Log(Species::Birch),
    Material::Log(Species::Jungle),
    Material::Log(Species::Oak),
    Material::Log(Species::Spruce),
    Material::Log(Species::DarkOak),
    Material::StrippedLog(Species::Acacia),
    Material::StrippedLog(Species::Birch),
    Material::StrippedLog(Species::Jungle),
    Material::StrippedLog(Species::Oak),
    Material::StrippedLog(Species::Spruce),
    Material::StrippedLog(Species::DarkOak),
];

#[inline]
pub fn is_wooden_log(material: Material) -> bool {
    WOODEN_LOGS.contains(&material)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_has_no_duplicates() {
        for (i, a) in WOODEN_LOGS.iter().enumerate() {
            for b in &WOODEN_LOGS[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn log_like_blocks_outside_the_list_are_rejected() {
        assert!(!is_wooden_log(Material::MangroveLog));
        assert!(!is_wooden_log(Material::CherryLog));
        assert!(!is_wooden_log(Material::CrimsonStem));
        assert!(!is_wooden_log(Material::Planks(Species::Oak)));
        assert!(!is_wooden_log(Material::Leaves(Species::Oak)));
    }
}
