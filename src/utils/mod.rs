//! Supporting utilities shared by the pipeline stages.
//!
//! - [`http`] builds the `reqwest` clients used for the API and for downloads
//! - [`progress`] wraps `indicatif` for download progress

pub mod http;
pub mod progress;

pub use progress::{ProgressBar, ProgressStyle};
