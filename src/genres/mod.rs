// src/genres/mod.rs

// Orchestrations that advance several systems together.
// Each genre is feature-gated so downstream games enable only what they use.

pub mod sdk;
pub use sdk::*;

#[cfg(feature = "genre-racing")]
pub mod racing;

#[cfg(feature = "genre-racing")]
pub use racing::*;
