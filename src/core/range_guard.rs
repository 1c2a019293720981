//! Block range guard
//!
//! Rejects log queries wider than the configured span. Oversized ranges are
//! never truncated.

use crate::models::{AppError, AppResult, BlockRange};
use crate::utils::constants::DEFAULT_MAX_BLOCK_RANGE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeGuard {
    max_range: u64,
}

impl Default for RangeGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BLOCK_RANGE)
    }
}

impl RangeGuard {
    pub fn new(max_range: u64) -> Self {
        Self { max_range }
    }

    pub fn max_range(&self) -> u64 {
        self.max_range
    }

    /// Accept `from..=resolved_to` when `resolved_to - from <= max_range`.
    /// A head behind `from` counts as span zero and is passed through.
    pub fn bound(&self, from_block: u64, resolved_to: u64) -> AppResult<BlockRange> {
        let range = BlockRange {
            from: from_block,
            to: resolved_to,
        };
        if range.span() > self.max_range {
            return Err(AppError::range_too_large(self.max_range));
        }
        Ok(range)
    }
}
