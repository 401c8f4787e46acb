use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use timber_runtime::Scheduler;
use timber_world::Server;

use crate::event::{BlockBreakEvent, EventBus, Listener};
use crate::feller::{TrunkBreaker, WorldScope};

/// Plugin lifecycle around a [`TrunkBreaker`]. The listener is registered once
/// on the first `enable`; `disable` only mutes it, since the host owns the
/// listener list.
pub struct TimberPlugin {
    server: Arc<dyn Server>,
    scheduler: Arc<dyn Scheduler>,
    scope: WorldScope,
    active: Arc<AtomicBool>,
    breaker: Option<TrunkBreaker>,
}

struct GatedListener {
    breaker: TrunkBreaker,
    active: Arc<AtomicBool>,
}

impl Listener for GatedListener {
    fn on_block_break(&self, event: &mut BlockBreakEvent) {
        if self.active.load(Ordering::Acquire) {
            self.breaker.on_block_break(event);
        }
    }
}

impl TimberPlugin {
    pub const NAME: &'static str = "Timber";

    pub fn new(server: Arc<dyn Server>, scheduler: Arc<dyn Scheduler>, scope: WorldScope) -> Self {
        Self {
            server,
            scheduler,
            scope,
            active: Arc::new(AtomicBool::new(false)),
            breaker: None,
        }
    }

    pub fn enable(&mut self, bus: &mut EventBus) {
        if self.active.swap(true, Ordering::AcqRel) {
            log::warn!("{} is already enabled", Self::NAME);
            return;
        }
        if self.breaker.is_none() {
            let breaker = TrunkBreaker::new(self.server.clone(), self.scheduler.clone(), self.scope);
            bus.register(Arc::new(GatedListener {
                breaker: breaker.clone(),
                active: self.active.clone(),
            }));
            self.breaker = Some(breaker);
        }
        log::info!("{} enabled (world scope: {:?})", Self::NAME, self.scope);
    }

    pub fn disable(&mut self) {
        if self.active.swap(false, Ordering::AcqRel) {
            log::info!("{} disabled", Self::NAME);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn breaker(&self) -> Option<&TrunkBreaker> {
        self.breaker.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timber_runtime::TurnScheduler;
    use timber_world::LocalServer;

    fn plugin() -> TimberPlugin {
        TimberPlugin::new(
            Arc::new(LocalServer::new()),
            Arc::new(TurnScheduler::new()),
            WorldScope::First,
        )
    }

    #[test]
    fn enabling_twice_registers_one_listener() {
        let mut bus = EventBus::new();
        let mut p = plugin();
        assert!(p.breaker().is_none());
        p.enable(&mut bus);
        p.enable(&mut bus);
        assert_eq!(bus.listener_count(), 1);
        assert!(p.is_enabled());
    }

    #[test]
    fn re_enable_after_disable_reuses_the_listener() {
        let mut bus = EventBus::new();
        let mut p = plugin();
        p.enable(&mut bus);
        p.disable();
        assert!(!p.is_enabled());
        p.enable(&mut bus);
        assert_eq!(bus.listener_count(), 1);
        assert!(p.is_enabled());
    }
}
