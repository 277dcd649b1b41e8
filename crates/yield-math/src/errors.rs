use thiserror::Error;

/// Errors raised while reducing a flow history into a position
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    /// Token precision outside what the decimal type can represent
    #[error("Unsupported token precision: {decimals} decimals (max {max})")]
    DecimalsOutOfRange { decimals: u32, max: u32 },

    /// Raw amount too large to be represented as a decimal
    #[error("Amount {raw} does not fit a decimal at {decimals} decimals")]
    AmountOutOfRange { raw: u128, decimals: u32 },

    /// Arithmetic overflow occurred
    #[error("Math overflow in '{operation}'")]
    Overflow { operation: String },
}

impl MathError {
    pub fn overflow(operation: &str) -> Self {
        MathError::Overflow {
            operation: operation.to_string(),
        }
    }
}
