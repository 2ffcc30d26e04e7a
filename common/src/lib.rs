//! Shared building blocks for the starmask workspace.

pub mod buffer2;
pub mod parallel;

pub use buffer2::Buffer2;
