//! Minimal host: worlds, an event bus and a scheduler driven by a tick loop.
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use timber_blocks::Material;
use timber_runtime::{Runtime, Scheduler, TurnScheduler};
use timber_world::{BlockPos, BlockRef, LocalServer, Server, World, plant_tree};

use crate::config::{Config, SchedulerKind};
use crate::event::{BlockBreakEvent, Event, EventBus, EventEnvelope, Player};
use crate::feller::WorldScope;
use crate::plugin::TimberPlugin;

#[derive(Clone)]
pub enum SchedulerHandle {
    Threaded(Arc<Runtime>),
    Turns(Arc<TurnScheduler>),
}

impl SchedulerHandle {
    pub fn as_scheduler(&self) -> Arc<dyn Scheduler> {
        match self {
            SchedulerHandle::Threaded(rt) => rt.clone() as Arc<dyn Scheduler>,
            SchedulerHandle::Turns(t) => t.clone() as Arc<dyn Scheduler>,
        }
    }

    pub fn is_idle(&self) -> bool {
        match self {
            SchedulerHandle::Threaded(rt) => rt.is_idle(),
            SchedulerHandle::Turns(t) => t.is_idle(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreakOutcome {
    pub cancelled: bool,
    /// What the host's own break of the event block removed. `None` when a
    /// listener already broke it.
    pub host_broke: Option<Material>,
}

pub struct Simulation {
    pub server: Arc<LocalServer>,
    pub bus: EventBus,
    pub scheduler: SchedulerHandle,
    pub plugin: TimberPlugin,
    pub tick: u64,
    tick_len: Duration,
}

impl Simulation {
    pub fn new(server: LocalServer, scheduler: SchedulerHandle, scope: WorldScope) -> Self {
        let server = Arc::new(server);
        let mut bus = EventBus::new();
        let mut plugin = TimberPlugin::new(server.clone(), scheduler.as_scheduler(), scope);
        plugin.enable(&mut bus);
        Self {
            server,
            bus,
            scheduler,
            plugin,
            tick: 0,
            tick_len: Duration::from_millis(5),
        }
    }

    pub fn with_tick_len(mut self, tick_len: Duration) -> Self {
        self.tick_len = tick_len;
        self
    }

    /// Build worlds, ground and trees from `cfg` and start the configured scheduler.
    pub fn from_config(cfg: &Config) -> Result<Self, Box<dyn Error>> {
        let mut server = LocalServer::new();
        for wc in &cfg.worlds {
            let world = server.create_world(wc.name.clone(), wc.min_y, wc.max_y);
            let r = wc.ground_radius.max(0);
            world.fill(
                BlockPos::new(-r, wc.ground_y, -r),
                BlockPos::new(r, wc.ground_y, r),
                wc.ground,
            );
            let mut logs = 0;
            for tree in &wc.trees {
                logs += plant_tree(&world, wc.ground_y, tree).len();
            }
            log::info!(
                "world '{}' ready: {} tree(s), {} log(s)",
                wc.name,
                wc.trees.len(),
                logs
            );
        }
        let scheduler = match cfg.runtime.scheduler {
            SchedulerKind::Threaded => {
                let rt = match cfg.runtime.workers {
                    Some(n) => Runtime::new(n)?,
                    None => Runtime::with_default_workers()?,
                };
                SchedulerHandle::Threaded(Arc::new(rt))
            }
            SchedulerKind::Turns => SchedulerHandle::Turns(Arc::new(TurnScheduler::new())),
        };
        Ok(Self::new(server, scheduler, cfg.felling.world_scope)
            .with_tick_len(Duration::from_millis(cfg.runtime.tick_ms)))
    }

    /// A player mines `block`: listeners see the event first, then the host
    /// breaks the block itself unless the event was cancelled.
    pub fn player_break(&mut self, player: Player, block: BlockRef) -> BreakOutcome {
        self.bus
            .queue
            .emit_now(Event::BlockBreak(BlockBreakEvent::new(player, block)));
        let delivered = self.bus.dispatch_ready();
        self.apply_host_breaks(delivered)
    }

    /// One simulation tick: deliver due events, advance the clock, then give
    /// the scheduler its turn. Returns the number of tasks run on this thread.
    pub fn tick(&mut self) -> usize {
        let delivered = self.bus.dispatch_ready();
        self.apply_host_breaks(delivered);
        self.bus.queue.advance_tick();
        self.tick += 1;
        match &self.scheduler {
            SchedulerHandle::Turns(t) => t.run_turn(),
            SchedulerHandle::Threaded(rt) => {
                rt.wait_idle(self.tick_len);
                0
            }
        }
    }

    fn apply_host_breaks(&self, delivered: Vec<EventEnvelope>) -> BreakOutcome {
        let mut outcome = BreakOutcome { cancelled: false, host_broke: None };
        for env in delivered {
            let Event::BlockBreak(ev) = env.kind;
            if ev.cancelled {
                log::debug!(target: "timber::events", "break at {} cancelled", ev.block);
                outcome.cancelled = true;
                continue;
            }
            outcome.host_broke = self
                .server
                .world(ev.block.world)
                .and_then(|w| w.break_naturally(ev.block.pos));
        }
        outcome
    }

    /// Tick until no event is queued and the scheduler has no work left.
    /// Returns the ticks spent.
    pub fn run_until_idle(&mut self, max_ticks: u64) -> u64 {
        let start = self.tick;
        while !self.is_idle() && self.tick - start < max_ticks {
            self.tick();
        }
        if !self.is_idle() {
            log::warn!("scheduler still busy after {max_ticks} tick(s)");
        }
        self.tick - start
    }

    pub fn is_idle(&self) -> bool {
        self.bus.queue.is_empty() && self.scheduler.is_idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timber_blocks::{Species, is_wooden_log};
    use timber_world::TreeSpec;

    fn turn_sim(scope: WorldScope) -> Simulation {
        let mut server = LocalServer::new();
        server.create_world("overworld", 0, 64);
        Simulation::new(server, SchedulerHandle::Turns(Arc::new(TurnScheduler::new())), scope)
    }

    #[test]
    fn plain_break_removes_only_the_mined_block() {
        let mut sim = turn_sim(WorldScope::First);
        let world = sim.server.voxel_worlds()[0].clone();
        plant_tree(&world, 10, &TreeSpec::new(Species::Oak, 0, 0, 4));
        let base = world.block_at(BlockPos::new(0, 11, 0));
        let out = sim.player_break(Player::new("steve", false), base);
        assert_eq!(out.host_broke, Some(Material::Log(Species::Oak)));
        assert_eq!(sim.run_until_idle(10), 0);
        assert_eq!(world.count_where(is_wooden_log), 3);
    }

    #[test]
    fn sneak_break_fells_the_trunk_one_ply_per_tick() {
        let mut sim = turn_sim(WorldScope::First);
        let world = sim.server.voxel_worlds()[0].clone();
        plant_tree(&world, 10, &TreeSpec::new(Species::Birch, 0, 0, 4));
        let base = world.block_at(BlockPos::new(0, 11, 0));
        let out = sim.player_break(Player::new("steve", true), base);
        assert_eq!(out.host_broke, None);
        assert_eq!(world.count_where(is_wooden_log), 3);
        assert_eq!(sim.run_until_idle(100), 3);
        assert_eq!(world.count_where(is_wooden_log), 0);
        assert!(world.count_where(|m| m == Material::Leaves(Species::Birch)) > 0);
    }

    #[test]
    fn delayed_break_is_applied_when_its_tick_comes() {
        let mut sim = turn_sim(WorldScope::First);
        let world = sim.server.voxel_worlds()[0].clone();
        let p = BlockPos::new(2, 5, 2);
        world.set(p, Material::Stone);
        let ev = BlockBreakEvent::new(Player::new("alex", false), world.block_at(p));
        sim.bus.queue.emit_after(1, Event::BlockBreak(ev));
        sim.tick();
        assert_eq!(world.material_at(p), Material::Stone);
        sim.tick();
        assert_eq!(world.material_at(p), Material::Air);
        assert_eq!(world.drops().len(), 1);
    }

    #[test]
    fn out_of_range_trees_do_not_abort_scene_building() {
        let mut cfg = Config::default();
        cfg.runtime.scheduler = SchedulerKind::Turns;
        cfg.worlds[0].trees.push(TreeSpec::new(Species::Oak, i32::MAX, 0, 5));
        let sim = Simulation::from_config(&cfg).unwrap();
        let world = sim.server.voxel_worlds()[0].clone();
        assert_eq!(world.count_where(is_wooden_log), 10);
    }

    #[test]
    fn disabled_plugin_leaves_trees_alone() {
        let mut sim = turn_sim(WorldScope::First);
        let world = sim.server.voxel_worlds()[0].clone();
        plant_tree(&world, 10, &TreeSpec::new(Species::Oak, 0, 0, 4));
        sim.plugin.disable();
        sim.player_break(Player::new("steve", true), world.block_at(BlockPos::new(0, 11, 0)));
        sim.run_until_idle(10);
        assert_eq!(world.count_where(is_wooden_log), 3);
    }
}
