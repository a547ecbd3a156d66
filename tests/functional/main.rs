// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Functional tests for the TrainedModel admission webhook.
//!
//! These tests drive full `AdmissionReview` requests through the axum router
//! WITHOUT a live Kubernetes cluster. The Service listing is served by an
//! in-memory fake so every scenario is deterministic.
//!
//! ```bash
//! cargo test --test functional
//! ```

#[path = "../common/fixtures.rs"]
mod fixtures;

mod mock_services;
mod scenario_tests;
