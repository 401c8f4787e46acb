use std::error::Error;
use std::fs;
use std::path::Path;

use clap::ValueEnum;
use log::LevelFilter;
use serde::Deserialize;
use timber_blocks::Material;
use timber_world::TreeSpec;

use crate::feller::WorldScope;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub runtime: RuntimeCfg,
    #[serde(default)]
    pub felling: Felling,
    #[serde(default = "default_worlds")]
    pub worlds: Vec<WorldCfg>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log: Log::default(),
            runtime: RuntimeCfg::default(),
            felling: Felling::default(),
            worlds: default_worlds(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Log {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".to_string()
}
impl Default for Log {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

impl Log {
    pub fn level_filter(&self) -> Result<LevelFilter, Box<dyn Error>> {
        self.level
            .parse::<LevelFilter>()
            .map_err(|_| format!("invalid log level '{}'", self.level).into())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerKind {
    /// Background worker threads.
    #[default]
    Threaded,
    /// One scheduler turn per simulation tick, on the main thread.
    Turns,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeCfg {
    #[serde(default)]
    pub scheduler: SchedulerKind,
    /// Worker threads for the threaded scheduler; defaults to cores - 1.
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}
fn default_max_ticks() -> u64 {
    10_000
}
fn default_tick_ms() -> u64 {
    5
}
impl Default for RuntimeCfg {
    fn default() -> Self {
        Self {
            scheduler: SchedulerKind::default(),
            workers: None,
            max_ticks: default_max_ticks(),
            tick_ms: default_tick_ms(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Felling {
    #[serde(default)]
    pub world_scope: WorldScope,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WorldCfg {
    pub name: String,
    #[serde(default = "default_min_y")]
    pub min_y: i32,
    #[serde(default = "default_max_y")]
    pub max_y: i32,
    #[serde(default = "default_ground_y")]
    pub ground_y: i32,
    #[serde(default = "default_ground")]
    pub ground: Material,
    /// Half-width of the square ground slab around the origin.
    #[serde(default = "default_ground_radius")]
    pub ground_radius: i32,
    #[serde(default)]
    pub trees: Vec<TreeSpec>,
}
fn default_min_y() -> i32 {
    -64
}
fn default_max_y() -> i32 {
    320
}
fn default_ground_y() -> i32 {
    64
}
fn default_ground() -> Material {
    Material::GrassBlock
}
fn default_ground_radius() -> i32 {
    8
}

fn default_worlds() -> Vec<WorldCfg> {
    vec![WorldCfg {
        name: "world".to_string(),
        min_y: default_min_y(),
        max_y: default_max_y(),
        ground_y: default_ground_y(),
        ground: default_ground(),
        ground_radius: default_ground_radius(),
        trees: vec![TreeSpec::new(timber_blocks::Species::Oak, 0, 0, 5)],
    }]
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: Config = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)
            .map_err(|e| format!("reading config {}: {e}", path.display()))?;
        Self::from_toml_str(&s)
    }

    fn validate(&self) -> Result<(), Box<dyn Error>> {
        self.log.level_filter()?;
        for w in &self.worlds {
            if w.min_y >= w.max_y {
                return Err(format!("world '{}': min_y must be below max_y", w.name).into());
            }
            if w.ground_y < w.min_y || w.ground_y >= w.max_y {
                return Err(format!("world '{}': ground_y outside build height", w.name).into());
            }
            for tree in &w.trees {
                tree.validate(w.ground_y, w.min_y, w.max_y)
                    .map_err(|e| format!("world '{}': {e}", w.name))?;
            }
        }
        Ok(())
    }
}
