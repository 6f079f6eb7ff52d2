//! Integration test suite for the Trilium updater
//!
//! End-to-end tests that run the whole update against a local mock of the
//! GitHub API and download host.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **pipeline**: library-level runs of [`Updater`](trilium_updater::pipeline::Updater)
//! - **cli**: the `trilium-updater` binary, its output and exit codes

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod pipeline;
