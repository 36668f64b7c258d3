//! Common types for the claimer workspace.
//!
//! This crate defines the data types shared by the chain connector, the
//! transaction services, and the drop-contract facade, so every component
//! speaks the same vocabulary for transactions, fees, and secrets.

/// Secure string type for sensitive data such as private keys.
pub mod secret_string;
/// Transaction envelope, fee, and lifecycle types.
pub mod transaction;
/// Hex and token-amount formatting helpers.
pub mod utils;

pub use secret_string::SecretString;
pub use transaction::{
	FeeEstimate, Transaction, TransactionHash, TransactionReceipt, TxPhase,
};
pub use utils::{format_token_amount, with_0x_prefix, without_0x_prefix};
