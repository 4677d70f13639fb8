//! # Skybridge Testkit
//!
//! Testing utilities for the skybridge integration protocol.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Simulated provider**: the provides-side aggregation contract,
//!   implemented over the in-memory relation so requirer behavior can be
//!   exercised end to end
//! - **Fixtures**: a harness wiring a relation model, a provider, and
//!   requirers together
//! - **Generators**: proptest strategies for request records
//!
//! ## Usage
//!
//! ```rust,no_run
//! use skybridge_testkit::TestHarness;
//!
//! async fn example() {
//!     let mut harness = TestHarness::new().await;
//!     let mut requirer = harness.requirer("worker/0").await;
//!
//!     requirer.request_credentials().await.unwrap();
//!     harness.provider.reconcile().await.unwrap();
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod provider;

pub use fixtures::{init_tracing, unit, TestHarness};
pub use generators::{capability_set, feature_request, request_record};
pub use provider::SimulatedProvider;
