// ── Snapshot store ──
//
// Lock-free holder for the latest `WattsState` plus the adaptive polling
// window the coordinator consults between cycles.

mod data_store;
mod poll;

pub use data_store::DataStore;
pub use poll::{FAST_POLL_DURATION, FAST_POLL_INTERVAL, PollWindow};
