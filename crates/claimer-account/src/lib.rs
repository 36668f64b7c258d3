//! Account management for the claimer.
//!
//! This crate owns the signing key: it derives the account address from a
//! raw private key and signs unsigned transaction envelopes locally. The key
//! never leaves the process; the rest of the workspace only ever sees the
//! derived address and fully signed transaction bytes.

use alloy_primitives::Address;
use async_trait::async_trait;
use claimer_types::Transaction;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when a private key is malformed or cryptographically
	/// invalid.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
}

/// Trait defining the interface for account implementations.
///
/// An implementation holds one signing key for the process lifetime and
/// produces raw signed transaction bytes ready for broadcast.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Retrieves the checksummed address derived from the held key.
	async fn address(&self) -> Result<Address, AccountError>;

	/// Signs an unsigned transaction envelope.
	///
	/// Returns the EIP-2718 encoded signed transaction, ready to hand to
	/// `eth_sendRawTransaction`.
	async fn sign_transaction(&self, tx: &Transaction) -> Result<Vec<u8>, AccountError>;
}

/// Service that manages account operations.
///
/// Wraps an account implementation behind a stable interface used by the
/// transaction sender.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	/// Creates a new AccountService with the specified implementation.
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	/// Retrieves the address associated with the managed account.
	pub async fn address(&self) -> Result<Address, AccountError> {
		self.implementation.address().await
	}

	/// Signs a transaction using the managed account.
	pub async fn sign(&self, tx: &Transaction) -> Result<Vec<u8>, AccountError> {
		self.implementation.sign_transaction(tx).await
	}
}
