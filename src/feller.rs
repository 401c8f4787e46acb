//! Trunk felling: a sneak-break on a log breaks every log connected to it.
//!
//! The cascade is a breadth-first walk over the 3x3x3 neighborhood. The first
//! ply runs on the caller's thread (the event handler); every later ply is its
//! own task on the host scheduler, so a large tree never stalls the main loop.
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use clap::ValueEnum;
use hashbrown::HashSet;
use serde::Deserialize;
use timber_blocks::is_wooden_log;
use timber_runtime::Scheduler;
use timber_world::{BlockRef, Server, World};

use crate::event::{BlockBreakEvent, BreakContext, Listener};

/// Which world the neighbor scan reads from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WorldScope {
    /// The host's first loaded world, whatever world the broken block is in.
    #[default]
    First,
    /// The world the broken block belongs to.
    Event,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FellerStats {
    pub cascades: u64,
    pub blocks_broken: u64,
    pub plies_scheduled: u64,
}

#[derive(Default)]
struct Counters {
    cascades: AtomicU64,
    blocks_broken: AtomicU64,
    plies_scheduled: AtomicU64,
}

/// Per-cascade bookkeeping shared by all of its plies.
struct Cascade {
    id: u64,
    origin: BlockRef,
    broken: AtomicU64,
    depth: AtomicU64,
}

#[derive(Clone)]
pub struct TrunkBreaker {
    server: Arc<dyn Server>,
    scheduler: Arc<dyn Scheduler>,
    scope: WorldScope,
    counters: Arc<Counters>,
}

impl TrunkBreaker {
    pub fn new(server: Arc<dyn Server>, scheduler: Arc<dyn Scheduler>, scope: WorldScope) -> Self {
        Self {
            server,
            scheduler,
            scope,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn stats(&self) -> FellerStats {
        FellerStats {
            cascades: self.counters.cascades.load(Ordering::Relaxed),
            blocks_broken: self.counters.blocks_broken.load(Ordering::Relaxed),
            plies_scheduled: self.counters.plies_scheduled.load(Ordering::Relaxed),
        }
    }

    /// Entry point for a break notification. Returns whether a cascade started.
    pub fn handle_break_event(&self, ctx: &dyn BreakContext) -> bool {
        if !ctx.player_sneaking() {
            return false;
        }
        let block = ctx.block();
        if !self.is_wooden_log(block) {
            return false;
        }
        self.break_trunk(block);
        true
    }

    /// Break `block` and schedule the rest of its trunk. A no-op if the block
    /// is no longer a log.
    pub fn break_trunk(&self, block: BlockRef) {
        if !self.is_wooden_log(block) {
            return;
        }
        let id = self.counters.cascades.fetch_add(1, Ordering::Relaxed) + 1;
        log::debug!(target: "timber::feller", "cascade {id} starts at {block}");
        let cascade = Arc::new(Cascade {
            id,
            origin: block,
            broken: AtomicU64::new(0),
            depth: AtomicU64::new(0),
        });
        self.fell_ply(vec![block], cascade);
    }

    /// Every wooden log in the 3x3x3 cube around `block`, `block` included.
    /// Empty if `block` itself is not a log.
    pub fn adjacent_wood_logs(&self, block: BlockRef) -> HashSet<BlockRef> {
        let mut logs = HashSet::new();
        if !self.is_wooden_log(block) {
            return logs;
        }
        let Some(world) = self.scan_world(block) else {
            return logs;
        };
        for pos in block.pos.cube_neighborhood() {
            if is_wooden_log(world.material_at(pos)) {
                logs.insert(world.block_at(pos));
            }
        }
        logs
    }

    pub fn is_wooden_log(&self, block: BlockRef) -> bool {
        self.server
            .world(block.world)
            .is_some_and(|w| is_wooden_log(w.material_at(block.pos)))
    }

    fn scan_world(&self, block: BlockRef) -> Option<Arc<dyn World>> {
        match self.scope {
            WorldScope::First => self.server.primary_world(),
            WorldScope::Event => self.server.world(block.world),
        }
    }

    fn fell_ply(&self, frontier: Vec<BlockRef>, cascade: Arc<Cascade>) {
        let mut next: HashSet<BlockRef> = HashSet::new();
        for block in frontier {
            if !self.is_wooden_log(block) {
                continue;
            }
            // Neighbors are read before the break so the block still counts as a log.
            next.extend(self.adjacent_wood_logs(block));
            let broken = self
                .server
                .world(block.world)
                .and_then(|w| w.break_naturally(block.pos));
            if broken.is_some() {
                cascade.broken.fetch_add(1, Ordering::Relaxed);
                self.counters.blocks_broken.fetch_add(1, Ordering::Relaxed);
            }
        }
        next.retain(|b| self.is_wooden_log(*b));

        let depth = cascade.depth.fetch_add(1, Ordering::Relaxed) + 1;
        if next.is_empty() {
            log::info!(
                target: "timber::feller",
                "cascade {} from {} done: {} block(s) over {} ply(ies)",
                cascade.id,
                cascade.origin,
                cascade.broken.load(Ordering::Relaxed),
                depth
            );
            return;
        }
        log::debug!(
            target: "timber::feller",
            "cascade {} ply {} queues {} log(s)",
            cascade.id,
            depth,
            next.len()
        );
        self.counters.plies_scheduled.fetch_add(1, Ordering::Relaxed);
        let this = self.clone();
        let frontier: Vec<BlockRef> = next.into_iter().collect();
        self.scheduler
            .run_async(Box::new(move || this.fell_ply(frontier, cascade)));
    }
}

impl Listener for TrunkBreaker {
    fn on_block_break(&self, event: &mut BlockBreakEvent) {
        self.handle_break_event(&*event);
    }
}
