//! Kubernetes API access used by the admission policies.
//!
//! The policies never talk to the API server directly. They go through the
//! `ServiceLister` capability so tests can substitute canned listings.

pub mod services;

pub use services::{KubeServiceLister, ServiceLister};
