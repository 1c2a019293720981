//! Core Module - Query logic
//!
//! Chain client registry, cache-aside executor, range guard and the two
//! queries built on top of them.

pub mod balance;
pub mod cache_aside;
pub mod logs;
pub mod range_guard;
pub mod registry;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use balance::*;
pub use cache_aside::*;
pub use logs::*;
pub use range_guard::*;
pub use registry::*;
pub use service::*;
