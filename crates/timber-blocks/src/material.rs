use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tree species that grow a regular log trunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Oak,
    Spruce,
    Birch,
    Jungle,
    Acacia,
    DarkOak,
}

impl Species {
    pub const ALL: [Species; 6] = [
        Species::Oak,
        Species::Spruce,
        Species::Birch,
        Species::Jungle,
        Species::Acacia,
        Species::DarkOak,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Species::Oak => "oak",
            Species::Spruce => "spruce",
            Species::Birch => "birch",
            Species::Jungle => "jungle",
            Species::Acacia => "acacia",
            Species::DarkOak => "dark_oak",
        }
    }

    pub fn from_name(s: &str) -> Option<Species> {
        Species::ALL.into_iter().find(|sp| sp.name() == s)
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Species {
    type Err = UnknownMaterial;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Species::from_name(s).ok_or_else(|| UnknownMaterial(s.to_string()))
    }
}

/// Material tag of a single block.
///
/// Names follow the snake_case block ids (`oak_log`, `stripped_birch_log`) and
/// round-trip through [`fmt::Display`] and [`FromStr`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Material {
    #[default]
    Air,
    Stone,
    Dirt,
    GrassBlock,
    Log(Species),
    StrippedLog(Species),
    Leaves(Species),
    Planks(Species),
    // Log-like blocks that are not part of the felling allow-list.
    MangroveLog,
    CherryLog,
    CrimsonStem,
}

impl Material {
    #[inline]
    pub fn is_air(self) -> bool {
        self == Material::Air
    }

    /// Item produced when the block is broken naturally.
    pub fn drop_item(self) -> Option<Material> {
        match self {
            Material::Air | Material::Leaves(_) => None,
            Material::GrassBlock => Some(Material::Dirt),
            other => Some(other),
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Material::Air => f.write_str("air"),
            Material::Stone => f.write_str("stone"),
            Material::Dirt => f.write_str("dirt"),
            Material::GrassBlock => f.write_str("grass_block"),
            Material::Log(sp) => write!(f, "{sp}_log"),
            Material::StrippedLog(sp) => write!(f, "stripped_{sp}_log"),
            Material::Leaves(sp) => write!(f, "{sp}_leaves"),
            Material::Planks(sp) => write!(f, "{sp}_planks"),
            Material::MangroveLog => f.write_str("mangrove_log"),
            Material::CherryLog => f.write_str("cherry_log"),
            Material::CrimsonStem => f.write_str("crimson_stem"),
        }
    }
}

impl FromStr for Material {
    type Err = UnknownMaterial;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fixed = match s {
            "air" => Some(Material::Air),
            "stone" => Some(Material::Stone),
            "dirt" => Some(Material::Dirt),
            "grass_block" => Some(Material::GrassBlock),
            "mangrove_log" => Some(Material::MangroveLog),
            "cherry_log" => Some(Material::CherryLog),
            "crimson_stem" => Some(Material::CrimsonStem),
            _ => None,
        };
        if let Some(m) = fixed {
            return Ok(m);
        }
        let species_material = if let Some(rest) = s.strip_prefix("stripped_") {
            rest.strip_suffix("_log")
                .and_then(Species::from_name)
                .map(Material::StrippedLog)
        } else if let Some(sp) = s.strip_suffix("_log") {
            Species::from_name(sp).map(Material::Log)
        } else if let Some(sp) = s.strip_suffix("_leaves") {
            Species::from_name(sp).map(Material::Leaves)
        } else if let Some(sp) = s.strip_suffix("_planks") {
            Species::from_name(sp).map(Material::Planks)
        } else {
            None
        };
        species_material.ok_or_else(|| UnknownMaterial(s.to_string()))
    }
}

impl TryFrom<String> for Material {
    type Error = UnknownMaterial;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Material> for String {
    fn from(value: Material) -> Self {
        value.to_string()
    }
}

/// A material or species name that does not name any known block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownMaterial(pub String);

impl fmt::Display for UnknownMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown material '{}'", self.0)
    }
}

impl Error for UnknownMaterial {}
