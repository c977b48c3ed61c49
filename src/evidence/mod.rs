//! Turning a free-text evidence narrative into per-document quotes and hints.

pub mod clause;
pub mod markers;
pub mod normalize;
pub mod quotes;
pub mod references;
pub mod split;
