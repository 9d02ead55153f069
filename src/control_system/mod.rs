pub mod ai_controller;
pub mod traffic_store;

pub use ai_controller::{AiActivityLog, AiController};
pub use traffic_store::{lock_store, run_drift_loop, run_tick, SharedStore, TrafficStore};
