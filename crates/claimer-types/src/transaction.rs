//! Transaction envelope types shared across the claimer services.
//!
//! An unsigned [`Transaction`] is assembled by the builder, signed and
//! broadcast by the sender, and tracked through the [`TxPhase`] lifecycle
//! until a [`TransactionReceipt`] is observed.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fee fields for a transaction, selected by the configured fee model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeEstimate {
	/// Dynamic-fee pricing: a fee cap plus a priority tip.
	Eip1559 {
		max_fee_per_gas: u128,
		max_priority_fee_per_gas: u128,
	},
	/// Flat gas price for chains without dynamic fees.
	Legacy { gas_price: u128 },
}

impl FeeEstimate {
	/// Returns true when this estimate uses the dynamic (EIP-1559) fee model.
	pub fn is_dynamic(&self) -> bool {
		matches!(self, FeeEstimate::Eip1559 { .. })
	}

	/// The worst-case price paid per unit of gas.
	pub fn max_cost_per_gas(&self) -> u128 {
		match self {
			FeeEstimate::Eip1559 {
				max_fee_per_gas, ..
			} => *max_fee_per_gas,
			FeeEstimate::Legacy { gas_price } => *gas_price,
		}
	}
}

/// An unsigned transaction envelope.
///
/// Built fresh for every contract call and never reused: the nonce is
/// fetched from chain state immediately before construction, so sequential
/// envelopes from the same account carry strictly increasing nonces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
	/// The sending address, derived from the signing key.
	pub from: Address,
	/// The target contract address.
	pub to: Address,
	/// ABI-encoded call data.
	pub data: Vec<u8>,
	/// Native value attached to the call.
	pub value: U256,
	/// Per-account transaction counter at build time.
	pub nonce: u64,
	/// Gas limit, sized from simulation plus a safety margin.
	pub gas_limit: u64,
	/// Fee fields for the configured fee model.
	pub fees: FeeEstimate,
	/// Chain the transaction is valid on.
	pub chain_id: u64,
}

/// Blockchain transaction hash representation.
///
/// Stored as raw bytes; displayed as 0x-prefixed hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHash(pub Vec<u8>);

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", hex::encode(&self.0))
	}
}

/// Transaction receipt containing execution details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub hash: TransactionHash,
	/// The block number where the transaction was included.
	pub block_number: u64,
	/// Whether the transaction executed successfully.
	pub success: bool,
}

/// Lifecycle of a submitted transaction.
///
/// `Built -> Signed -> Broadcast` then exactly one of the terminal phases.
/// A timed-out transaction is not failed: it may still be included, so the
/// caller owns any retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxPhase {
	/// Envelope assembled, not yet signed.
	Built,
	/// Signed locally, not yet broadcast.
	Signed,
	/// Accepted by the node, awaiting a receipt.
	Broadcast,
	/// Receipt observed with success status.
	Confirmed,
	/// Bounded receipt polling exhausted without an observation.
	TimedOut,
	/// The node rejected the raw transaction.
	Rejected,
}

impl TxPhase {
	/// Whether this phase ends the lifecycle.
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			TxPhase::Confirmed | TxPhase::TimedOut | TxPhase::Rejected
		)
	}

	/// Whether `next` is a legal successor of this phase.
	pub fn can_advance_to(&self, next: TxPhase) -> bool {
		matches!(
			(self, next),
			(TxPhase::Built, TxPhase::Signed)
				| (TxPhase::Signed, TxPhase::Broadcast)
				| (TxPhase::Signed, TxPhase::Rejected)
				| (TxPhase::Broadcast, TxPhase::Confirmed)
				| (TxPhase::Broadcast, TxPhase::TimedOut)
		)
	}
}

impl fmt::Display for TxPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let phase = match self {
			TxPhase::Built => "built",
			TxPhase::Signed => "signed",
			TxPhase::Broadcast => "broadcast",
			TxPhase::Confirmed => "confirmed",
			TxPhase::TimedOut => "timed-out",
			TxPhase::Rejected => "rejected",
		};
		write!(f, "{}", phase)
	}
}
