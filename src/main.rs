use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use timber::config::{Config, SchedulerKind};
use timber::{Player, Simulation, WorldScope};
use timber_blocks::is_wooden_log;
use timber_world::{BlockPos, World, WorldId};

#[derive(Parser, Debug)]
#[command(name = "timber", about = "Sneak-break a log and watch the whole trunk fall")]
struct Args {
    /// TOML scene/runtime config; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log level override (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
    #[arg(long, value_enum)]
    world_scope: Option<WorldScope>,
    #[arg(long, value_enum)]
    scheduler: Option<SchedulerKind>,
    #[arg(long)]
    workers: Option<usize>,
    #[arg(long, default_value = "steve")]
    player: String,
    /// Break without sneaking (only the targeted block goes)
    #[arg(long)]
    no_sneak: bool,
    /// Block to break as x,y,z; defaults to the base of the first tree
    #[arg(long, value_parser = parse_pos)]
    at: Option<BlockPos>,
    /// Index of the world the target block is in
    #[arg(long, default_value_t = 0)]
    world: u32,
}

impl Args {
    /// Overlay the flags that were given onto a loaded config.
    fn apply_to(&self, cfg: &mut Config) {
        if let Some(level) = &self.log_level {
            cfg.log.level = level.clone();
        }
        if let Some(scope) = self.world_scope {
            cfg.felling.world_scope = scope;
        }
        if let Some(kind) = self.scheduler {
            cfg.runtime.scheduler = kind;
        }
        if self.workers.is_some() {
            cfg.runtime.workers = self.workers;
        }
    }
}

fn parse_pos(s: &str) -> Result<BlockPos, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z, got '{s}'"));
    }
    let mut v = [0i32; 3];
    for (slot, part) in v.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|e| format!("bad coordinate '{part}': {e}"))?;
    }
    Ok(BlockPos::new(v[0], v[1], v[2]))
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    args.apply_to(&mut cfg);

    TermLogger::init(
        cfg.log.level_filter()?,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let mut sim = Simulation::from_config(&cfg)?;
    let world_cfg = cfg
        .worlds
        .get(args.world as usize)
        .ok_or_else(|| format!("no world with index {}", args.world))?;
    let target = match args.at {
        Some(pos) => pos,
        None => {
            let tree = world_cfg
                .trees
                .first()
                .ok_or("world has no trees; pass --at x,y,z")?;
            BlockPos::new(tree.x, world_cfg.ground_y + 1, tree.z)
        }
    };
    let world = sim
        .server
        .voxel_world(WorldId(args.world))
        .cloned()
        .ok_or_else(|| format!("no world with index {}", args.world))?;
    let logs_before = world.count_where(is_wooden_log);

    let player = Player::new(args.player, !args.no_sneak);
    log::info!(
        "{} breaks {} at {} (sneaking: {})",
        player.name,
        world.material_at(target),
        target,
        player.sneaking
    );
    let outcome = sim.player_break(player, world.block_at(target));
    let ticks = sim.run_until_idle(cfg.runtime.max_ticks);

    let mut drops: BTreeMap<String, usize> = BTreeMap::new();
    for w in sim.server.voxel_worlds() {
        for d in w.drops() {
            *drops.entry(d.item.to_string()).or_default() += 1;
        }
    }
    let stats = sim
        .plugin
        .breaker()
        .map(|b| b.stats())
        .unwrap_or_default();

    println!("ticks:           {ticks}");
    println!("cancelled:       {}", outcome.cancelled);
    println!("cascades:        {}", stats.cascades);
    println!("plies scheduled: {}", stats.plies_scheduled);
    println!("felled by timber: {}", stats.blocks_broken);
    println!(
        "logs in '{}':   {} -> {}",
        world.name(),
        logs_before,
        world.count_where(is_wooden_log)
    );
    for (item, n) in &drops {
        println!("  drop {item} x{n}");
    }
    Ok(())
}
