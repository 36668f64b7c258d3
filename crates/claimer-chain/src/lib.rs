//! Chain connector for the claimer.
//!
//! Wraps a JSON-RPC endpoint behind an async interface: read-only contract
//! calls, fee and gas estimation, nonce queries, raw-transaction broadcast,
//! and receipt lookup. The connector is the only component that talks to the
//! network; everything above it composes these primitives.

use alloy_primitives::Address;
use async_trait::async_trait;
use claimer_types::{FeeEstimate, TransactionHash, TransactionReceipt};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

pub use implementations::evm::alloy::EvmConnector;

/// Errors that can occur while talking to the chain.
#[derive(Debug, Error)]
pub enum ChainError {
	/// Transient network or node-side failure.
	#[error("RPC error: {0}")]
	Rpc(String),
	/// The node deterministically predicts the call would revert.
	///
	/// Kept separate from [`ChainError::Rpc`]: a predicted revert is
	/// contract logic speaking, not a transport fault, and retrying it
	/// without changing state is pointless.
	#[error("Execution reverted: {0}")]
	Revert(String),
	/// The RPC endpoint or proxy configuration is unusable.
	#[error("Invalid endpoint: {0}")]
	Endpoint(String),
}

/// Trait defining the interface for chain connectors.
///
/// Implementations perform network I/O only; none mutate local state beyond
/// internal connection reuse. The nonce is always read from remote chain
/// state so sequential transactions from one account never collide.
#[async_trait]
pub trait ChainConnector: Send + Sync {
	/// The chain identifier transactions must be signed for.
	fn chain_id(&self) -> u64;

	/// Performs a read-only invocation against current chain state.
	async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ChainError>;

	/// Queries current fee data.
	///
	/// In dynamic mode returns a base-fee cap and priority tip; in legacy
	/// mode a flat gas price.
	async fn estimate_fees(&self, dynamic: bool) -> Result<FeeEstimate, ChainError>;

	/// Simulates the call to size its gas usage.
	///
	/// A node-predicted revert surfaces as [`ChainError::Revert`].
	async fn estimate_gas(
		&self,
		from: Address,
		to: Address,
		data: &[u8],
	) -> Result<u64, ChainError>;

	/// Returns the next usable transaction counter for the address.
	async fn nonce(&self, address: Address) -> Result<u64, ChainError>;

	/// Broadcasts a signed raw transaction, returning its hash.
	async fn send_raw(&self, encoded: &[u8]) -> Result<TransactionHash, ChainError>;

	/// Fetches the receipt for a transaction if it has been included.
	async fn receipt(
		&self,
		hash: &TransactionHash,
	) -> Result<Option<TransactionReceipt>, ChainError>;
}
