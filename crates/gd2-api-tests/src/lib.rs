//! gd2-api integration tests
//!
//! Drives the bindings over real HTTP against in-process mock clusters.

pub mod harness;

#[cfg(test)]
mod georep_integration;

pub use harness::{session, MockCluster, RecordedRequest};
