//! Error types for invariant solving, slippage search and tick walks
//!
//! Every engine operation is pure, so each variant describes a bad input or an
//! exhausted iteration budget. None of them leave partial state behind and the
//! caller can always retry with corrected inputs.

use thiserror::Error;

/// Result alias used by every engine operation
pub type AmmResult<T> = std::result::Result<T, AmmError>;

/// Errors that can occur while pricing a pool or building a slippage map
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmmError {
    /// Token decimal count is negative or beyond what normalization supports
    #[error("Invalid decimals: {decimals} (supported range 0..={max})")]
    InvalidDecimals { decimals: i32, max: u8 },

    /// A reserve the formula divides by is zero
    #[error("Zero reserve at asset index {index}")]
    ZeroReserve { index: usize },

    /// Asset index out of range, or selling an asset for itself
    #[error("Invalid asset indices i={i}, j={j} for a pool of {len} assets")]
    InvalidIndex { i: usize, j: usize, len: usize },

    /// Newton iteration exceeded its cap
    #[error("{solver} did not converge after {iterations} iterations")]
    ConvergenceError {
        solver: &'static str,
        iterations: usize,
    },

    /// Bracket search exceeded its cap
    #[error("Slippage search did not converge after {iterations} iterations (low: {low}, high: {high})")]
    NoConvergence {
        iterations: usize,
        low: String,
        high: String,
    },

    /// Tick walk ran past the last supplied tick
    #[error("Tick liquidity missing: walk needs tick {needed} but data ends at {last_supplied}")]
    TickLiquidityMissing { needed: i32, last_supplied: i32 },

    /// Token metadata and reserve vectors disagree in length
    #[error("Reserve length mismatch: {tokens} tokens but {reserves} {what}")]
    ReserveLengthMismatch {
        tokens: usize,
        reserves: usize,
        what: &'static str,
    },

    /// A looser slippage threshold produced a smaller amount than a stricter one
    #[error("Non-monotonic slippage at {bps} bps: {field} fell from {previous} to {current}")]
    NonMonotonicSlippage {
        bps: u32,
        field: &'static str,
        previous: String,
        current: String,
    },

    /// Interface amount is negative or cannot be represented
    #[error("Invalid amount: {value}")]
    InvalidAmount { value: String },

    /// Pool or engine parameter outside its valid domain
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Value does not fit the target numeric type
    #[error("Overflow: {context}")]
    Overflow { context: String },
}

impl AmmError {
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Validate an (i, j) asset pair against a pool size
    pub fn check_pair(i: usize, j: usize, len: usize) -> AmmResult<()> {
        if i == j || i >= len || j >= len {
            return Err(Self::InvalidIndex { i, j, len });
        }
        Ok(())
    }
}
