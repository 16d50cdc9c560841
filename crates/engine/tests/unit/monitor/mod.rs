//! # Monitor Tests

/// Decision-tree golden vectors and malformed input.
pub mod classifier;
