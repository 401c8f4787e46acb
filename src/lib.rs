//! Timber: sneak-break one log of a tree to fell its whole trunk.
#![forbid(unsafe_code)]

pub mod config;
pub mod event;
pub mod feller;
pub mod plugin;
pub mod sim;

pub use config::Config;
pub use event::{BlockBreakEvent, BreakContext, Event, EventBus, EventQueue, Listener, Player};
pub use feller::{FellerStats, TrunkBreaker, WorldScope};
pub use plugin::TimberPlugin;
pub use sim::{BreakOutcome, SchedulerHandle, Simulation};
