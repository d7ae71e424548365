//! Engine-independent procedural generation.
//!
//! - City grid layout
//! - Seeded random streams

pub mod layout;
pub mod random;
