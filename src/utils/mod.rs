//! Utils Module - Shared infrastructure
//!
//! Cache stores and the constants every other module reads.

pub mod cache;
pub mod constants;

pub use cache::*;
pub use constants::*;
