use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use timber_world::BlockRef;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub sneaking: bool,
}

impl Player {
    pub fn new(name: impl Into<String>, sneaking: bool) -> Self {
        Self { name: name.into(), sneaking }
    }
}

/// The only parts of a break notification the felling logic reads.
pub trait BreakContext {
    fn player_sneaking(&self) -> bool;
    fn block(&self) -> BlockRef;
}

#[derive(Clone, Debug)]
pub struct BlockBreakEvent {
    pub player: Player,
    pub block: BlockRef,
    pub drop_items: bool,
    pub cancelled: bool,
}

impl BlockBreakEvent {
    pub fn new(player: Player, block: BlockRef) -> Self {
        Self { player, block, drop_items: true, cancelled: false }
    }
}

impl BreakContext for BlockBreakEvent {
    fn player_sneaking(&self) -> bool {
        self.player.sneaking
    }

    fn block(&self) -> BlockRef {
        self.block
    }
}

pub enum Event {
    BlockBreak(BlockBreakEvent),
}

pub struct EventEnvelope {
    pub id: u64,
    pub tick: u64,
    pub kind: Event,
}

pub struct EventQueue {
    // map of tick -> FIFO queue of events
    by_tick: BTreeMap<u64, VecDeque<EventEnvelope>>,
    pub now: u64,
    next_id: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self { by_tick: BTreeMap::new(), now: 0, next_id: 1 }
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    pub fn emit_now(&mut self, kind: Event) -> u64 {
        self.emit_at(self.now, kind)
    }

    pub fn emit_at(&mut self, tick: u64, kind: Event) -> u64 {
        let id = self.alloc_id();
        // Events for past ticks would never be popped; deliver them now instead.
        let tick = tick.max(self.now);
        let env = EventEnvelope { id, tick, kind };
        self.by_tick.entry(tick).or_default().push_back(env);
        id
    }

    pub fn emit_after(&mut self, delta: u64, kind: Event) -> u64 {
        self.emit_at(self.now.saturating_add(delta), kind)
    }

    pub fn pop_ready(&mut self) -> Option<EventEnvelope> {
        let q = self.by_tick.get_mut(&self.now)?;
        let env = q.pop_front();
        if q.is_empty() {
            self.by_tick.remove(&self.now);
        }
        env
    }

    pub fn len(&self) -> usize {
        self.by_tick.values().map(|q| q.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tick.is_empty()
    }

    pub fn advance_tick(&mut self) {
        self.now = self.now.wrapping_add(1);
    }
}

pub trait Listener: Send + Sync {
    fn on_block_break(&self, event: &mut BlockBreakEvent);
}

/// Listener registry plus the pending event queue. Listeners are called in
/// registration order and are never removed.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Arc<dyn Listener>>,
    pub queue: EventQueue,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: Arc<dyn Listener>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver every event due this tick. Returns the events after all
    /// listeners saw them, so the host can honour cancellation.
    pub fn dispatch_ready(&mut self) -> Vec<EventEnvelope> {
        let mut delivered = Vec::new();
        while let Some(mut env) = self.queue.pop_ready() {
            Self::log_event(env.tick, &env.kind);
            match &mut env.kind {
                Event::BlockBreak(ev) => {
                    for l in &self.listeners {
                        l.on_block_break(ev);
                    }
                }
            }
            delivered.push(env);
        }
        delivered
    }

    fn log_event(tick: u64, kind: &Event) {
        match kind {
            Event::BlockBreak(ev) => {
                log::debug!(target: "timber::events", "[tick {}] BlockBreak {} by {} sneaking={}",
                    tick, ev.block, ev.player.name, ev.player.sneaking);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use timber_world::{BlockPos, WorldId};

    fn break_at(x: i32) -> Event {
        Event::BlockBreak(BlockBreakEvent::new(
            Player::new("alex", true),
            BlockRef::new(WorldId(0), BlockPos::new(x, 0, 0)),
        ))
    }

    #[test]
    fn queue_orders_by_tick_then_fifo() {
        let mut q = EventQueue::new();
        q.emit_after(1, break_at(3));
        q.emit_now(break_at(1));
        q.emit_now(break_at(2));
        let xs = |q: &mut EventQueue| {
            let mut out = Vec::new();
            while let Some(env) = q.pop_ready() {
                let Event::BlockBreak(ev) = env.kind;
                out.push(ev.block.pos.x);
            }
            out
        };
        assert_eq!(xs(&mut q), vec![1, 2]);
        q.advance_tick();
        assert_eq!(xs(&mut q), vec![3]);
        assert!(q.is_empty());
    }

    #[test]
    fn past_ticks_are_clamped_to_now() {
        let mut q = EventQueue::new();
        q.advance_tick();
        q.advance_tick();
        q.emit_at(0, break_at(9));
        assert_eq!(q.len(), 1);
        assert!(q.pop_ready().is_some());
    }

    struct Recorder(Mutex<Vec<&'static str>>, &'static str, bool);

    impl Listener for Recorder {
        fn on_block_break(&self, event: &mut BlockBreakEvent) {
            self.0.lock().unwrap().push(self.1);
            if self.2 {
                event.cancelled = true;
            }
        }
    }

    #[test]
    fn listeners_run_in_registration_order_and_can_cancel() {
        let log = Arc::new(Recorder(Mutex::new(Vec::new()), "first", false));
        let canceller = Arc::new(Recorder(Mutex::new(Vec::new()), "second", true));
        let mut bus = EventBus::new();
        bus.register(log.clone());
        bus.register(canceller.clone());
        bus.queue.emit_now(break_at(0));
        let delivered = bus.dispatch_ready();
        assert_eq!(delivered.len(), 1);
        let Event::BlockBreak(ev) = &delivered[0].kind;
        assert!(ev.cancelled);
        assert_eq!(*log.0.lock().unwrap(), vec!["first"]);
        assert_eq!(*canceller.0.lock().unwrap(), vec!["second"]);
    }
}
