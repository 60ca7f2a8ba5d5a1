//! Pointer trigger gate
//!
//! Turns raw pointer moves, clicks and UI toggles into at most one sound per
//! evaluation window. Time is virtual: every entry point takes `now`, and
//! deferred work sits in a [`Scheduler`] until [`Session::advance`] reaches
//! it.

mod highlight;
mod legend;
mod scenario;
mod scheduler;
mod session;
mod state;
mod throttle;
mod toggles;

pub use highlight::{block_highlight, TaskBlockSet, TaskBlockUpdate, TaskBlocks};
pub use legend::{legend_demo, legend_target, LegendDemo, LegendItem};
pub use scenario::{Action, Replay, Scenario, TimedEvent};
pub use scheduler::{Scheduler, TaskId};
pub use session::{EventKind, Session, SessionEvent};
pub use state::{Channel, TriggerState};
pub use throttle::Throttle;
pub use toggles::{Toggle, ToggleSnapshot, Toggles};
