//! The per-chain Inventory Tracker: ERC-20 Transfer subscriptions feeding a
//! balance poller

pub mod abi;
pub mod tracker;

pub use tracker::{InventoryTracker, TrackerState};
