/// Yield arithmetic for lending-pool positions
///
/// This crate holds the I/O-free part of the tracker: the supply/withdraw
/// flow model, conversion of raw token units into decimals, and the
/// reductions that turn a balance plus a flow history into interest and an
/// annualized yield.

pub mod errors;
pub mod flow;
pub mod position;
pub mod units;

// Re-export commonly used types
pub use errors::*;
pub use flow::*;
pub use position::*;
pub use units::*;

/// Result type alias using the math error type
pub type MathResult<T> = std::result::Result<T, MathError>;
