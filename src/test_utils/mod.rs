//! Test-only helpers shared across crate unit tests.
//!
//! This module is only compiled for unit tests.

pub mod manual_engine;

pub use manual_engine::ManualEngine;
