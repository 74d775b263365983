#![allow(dead_code)]

pub mod deferred_engine;
pub mod mock_collector;

pub use deferred_engine::{DeferredEngine, outcome_for};
pub use mock_collector::{CapturedRequest, Reply, closed_addr, spawn_collector};
