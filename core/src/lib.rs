//! consilium-core: task registry, consultation orchestrator, background runner
//! and the polling contract that exposes task status/results.

pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod polling;
pub mod runner;
pub mod state;
