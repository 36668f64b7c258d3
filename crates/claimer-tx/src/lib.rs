//! Transaction lifecycle services: building and sending.
//!
//! The builder assembles an unsigned envelope by querying the chain for a
//! fresh nonce, current fees, and a simulated gas estimate; the sender signs
//! locally, broadcasts, and polls for inclusion. The lifecycle is
//! `Built -> Signed -> Broadcast -> {Confirmed | TimedOut | Rejected}` and
//! no step is ever retried here: retry policy belongs to the caller, because
//! blind retries of a financial operation risk double-submission.

use alloy_primitives::{Address, U256};
use claimer_account::{AccountError, AccountService};
use claimer_chain::{ChainConnector, ChainError};
use claimer_types::{Transaction, TransactionHash, TxPhase};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while assembling a transaction envelope.
#[derive(Debug, Error)]
pub enum BuildError {
	/// A chain query failed for transient reasons; the envelope was not
	/// assembled and nothing was broadcast.
	#[error("Failed to build transaction: {0}")]
	Chain(ChainError),
	/// The node predicts the call would revert.
	///
	/// This is contract logic rejecting the operation (for instance an
	/// already-registered address), not a transient fault; it is surfaced
	/// distinctly so the caller can decide whether to abort.
	#[error("Simulation reverted: {0}")]
	SimulationRevert(String),
	/// The account could not produce its address.
	#[error("Account error: {0}")]
	Account(#[from] AccountError),
}

impl From<ChainError> for BuildError {
	fn from(err: ChainError) -> Self {
		match err {
			ChainError::Revert(reason) => BuildError::SimulationRevert(reason),
			other => BuildError::Chain(other),
		}
	}
}

/// Errors that can occur while signing, broadcasting, or awaiting a
/// transaction.
#[derive(Debug, Error)]
pub enum SendError {
	/// Local signing failed.
	#[error("Signing failed: {0}")]
	Signing(#[from] AccountError),
	/// The node rejected the raw transaction (for instance a stale nonce).
	/// The caller may rebuild with a fresh nonce and retry once.
	#[error("Broadcast rejected: {0}")]
	Broadcast(String),
	/// Receipt polling was exhausted without observing inclusion.
	///
	/// Not a failure of the transaction itself: it may still confirm later,
	/// which is why the hash is carried here.
	#[error("Transaction {hash} unconfirmed after {attempts} polls; it may still be included")]
	ConfirmationTimeout {
		hash: TransactionHash,
		attempts: u32,
	},
	/// The transaction was included but reverted on-chain.
	#[error("Transaction {hash} reverted in block {block_number}")]
	TransactionFailed {
		hash: TransactionHash,
		block_number: u64,
	},
	/// Receipt polling itself failed at the transport level.
	#[error("Receipt polling failed: {0}")]
	Chain(ChainError),
}

/// Tuning for envelope construction and confirmation polling.
#[derive(Debug, Clone)]
pub struct SubmissionSettings {
	/// Use the dynamic (EIP-1559) fee model.
	pub dynamic_fees: bool,
	/// Percentage added on top of the simulated gas usage so near-boundary
	/// executions do not run out of gas.
	pub gas_margin_percent: u64,
	/// Delay between receipt polls.
	pub poll_interval: Duration,
	/// Number of receipt polls before reporting a timeout.
	pub max_poll_attempts: u32,
}

impl Default for SubmissionSettings {
	fn default() -> Self {
		Self {
			dynamic_fees: true,
			gas_margin_percent: 20,
			poll_interval: Duration::from_secs(5),
			max_poll_attempts: 36,
		}
	}
}

/// Adds the configured safety margin to a simulated gas figure.
pub fn apply_gas_margin(estimate: u64, margin_percent: u64) -> u64 {
	estimate.saturating_add(estimate.saturating_mul(margin_percent) / 100)
}

/// Service that builds, signs, broadcasts, and confirms transactions for a
/// single account.
pub struct TransactionService {
	connector: Arc<dyn ChainConnector>,
	account: Arc<AccountService>,
	settings: SubmissionSettings,
}

impl TransactionService {
	/// Creates a new TransactionService for one account on one chain.
	pub fn new(
		connector: Arc<dyn ChainConnector>,
		account: Arc<AccountService>,
		settings: SubmissionSettings,
	) -> Self {
		Self {
			connector,
			account,
			settings,
		}
	}

	/// Assembles an unsigned transaction envelope for a contract call.
	///
	/// The nonce is fetched immediately before assembly rather than cached,
	/// so sequential envelopes track confirmed chain state even if a prior
	/// transaction landed in between. The gas limit comes from simulating
	/// the call and padding the result.
	pub async fn build(&self, to: Address, data: Vec<u8>) -> Result<Transaction, BuildError> {
		let from = self.account.address().await?;
		let nonce = self.connector.nonce(from).await?;
		let fees = self.connector.estimate_fees(self.settings.dynamic_fees).await?;
		let estimate = self.connector.estimate_gas(from, to, &data).await?;
		let gas_limit = apply_gas_margin(estimate, self.settings.gas_margin_percent);

		tracing::debug!(
			phase = %TxPhase::Built,
			nonce,
			gas_limit,
			to = %to,
			"assembled transaction envelope"
		);

		Ok(Transaction {
			from,
			to,
			data,
			value: U256::ZERO,
			nonce,
			gas_limit,
			fees,
			chain_id: self.connector.chain_id(),
		})
	}

	/// Signs, broadcasts, and awaits inclusion of a built transaction.
	///
	/// Returns the transaction hash once a successful receipt is observed.
	pub async fn send(&self, tx: Transaction) -> Result<TransactionHash, SendError> {
		let nonce = tx.nonce;
		let raw = self.account.sign(&tx).await?;
		tracing::debug!(phase = %TxPhase::Signed, nonce, "transaction signed locally");

		let hash = match self.connector.send_raw(&raw).await {
			Ok(hash) => hash,
			Err(e) => {
				tracing::error!(phase = %TxPhase::Rejected, nonce, error = %e, "node rejected transaction");
				return Err(SendError::Broadcast(e.to_string()));
			},
		};
		tracing::info!(phase = %TxPhase::Broadcast, tx_hash = %hash, "transaction broadcast");

		self.wait_for_inclusion(hash).await
	}

	/// Polls for a receipt a bounded number of times.
	async fn wait_for_inclusion(&self, hash: TransactionHash) -> Result<TransactionHash, SendError> {
		for attempt in 1..=self.settings.max_poll_attempts {
			match self.connector.receipt(&hash).await {
				Ok(Some(receipt)) => {
					if receipt.success {
						tracing::info!(
							phase = %TxPhase::Confirmed,
							tx_hash = %hash,
							block_number = receipt.block_number,
							"transaction confirmed"
						);
						return Ok(hash);
					}
					return Err(SendError::TransactionFailed {
						hash,
						block_number: receipt.block_number,
					});
				},
				Ok(None) => {
					tracing::trace!(tx_hash = %hash, attempt, "no receipt yet");
					tokio::time::sleep(self.settings.poll_interval).await;
				},
				Err(e) => return Err(SendError::Chain(e)),
			}
		}

		tracing::warn!(
			phase = %TxPhase::TimedOut,
			tx_hash = %hash,
			attempts = self.settings.max_poll_attempts,
			"confirmation window exhausted"
		);
		Err(SendError::ConfirmationTimeout {
			hash,
			attempts: self.settings.max_poll_attempts,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use claimer_account::implementations::local::LocalAccount;
	use claimer_types::{FeeEstimate, SecretString, TransactionReceipt};
	use std::sync::Mutex;

	const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const CONTRACT: &str = "0x060e7c1bc320C9e7C1760e06A5455c343D16603B";

	/// How the stub connector resolves receipt polls.
	#[derive(Clone, Copy)]
	enum ReceiptScript {
		ConfirmAfter(u32),
		NeverConfirm,
		RevertOnChain,
	}

	/// In-memory connector scripting one account's chain interactions.
	struct StubConnector {
		state: Mutex<StubState>,
		fail_fees: bool,
		revert_simulation: bool,
		reject_broadcast: bool,
		receipts: ReceiptScript,
	}

	struct StubState {
		nonce: u64,
		broadcasts: Vec<Vec<u8>>,
		polls: u32,
	}

	impl StubConnector {
		fn healthy() -> Self {
			Self {
				state: Mutex::new(StubState {
					nonce: 0,
					broadcasts: Vec::new(),
					polls: 0,
				}),
				fail_fees: false,
				revert_simulation: false,
				reject_broadcast: false,
				receipts: ReceiptScript::ConfirmAfter(1),
			}
		}

		fn broadcast_count(&self) -> usize {
			self.state.lock().unwrap().broadcasts.len()
		}
	}

	#[async_trait]
	impl ChainConnector for StubConnector {
		fn chain_id(&self) -> u64 {
			42161
		}

		async fn call(&self, _to: Address, _data: Vec<u8>) -> Result<Vec<u8>, ChainError> {
			Ok(vec![0; 32])
		}

		async fn estimate_fees(&self, dynamic: bool) -> Result<FeeEstimate, ChainError> {
			if self.fail_fees {
				return Err(ChainError::Rpc("endpoint unreachable".to_string()));
			}
			Ok(if dynamic {
				FeeEstimate::Eip1559 {
					max_fee_per_gas: 30_000_000_000,
					max_priority_fee_per_gas: 1_000_000_000,
				}
			} else {
				FeeEstimate::Legacy {
					gas_price: 12_000_000_000,
				}
			})
		}

		async fn estimate_gas(
			&self,
			_from: Address,
			_to: Address,
			_data: &[u8],
		) -> Result<u64, ChainError> {
			if self.revert_simulation {
				return Err(ChainError::Revert(
					"execution reverted: already registered".to_string(),
				));
			}
			Ok(100_000)
		}

		async fn nonce(&self, _address: Address) -> Result<u64, ChainError> {
			Ok(self.state.lock().unwrap().nonce)
		}

		async fn send_raw(&self, encoded: &[u8]) -> Result<TransactionHash, ChainError> {
			if self.reject_broadcast {
				return Err(ChainError::Rpc("nonce too low".to_string()));
			}
			let mut state = self.state.lock().unwrap();
			state.broadcasts.push(encoded.to_vec());
			// The chain sees the transaction; the next nonce query reflects it.
			state.nonce += 1;
			Ok(TransactionHash(vec![state.nonce as u8; 32]))
		}

		async fn receipt(
			&self,
			hash: &TransactionHash,
		) -> Result<Option<TransactionReceipt>, ChainError> {
			let mut state = self.state.lock().unwrap();
			state.polls += 1;
			match self.receipts {
				ReceiptScript::NeverConfirm => Ok(None),
				ReceiptScript::ConfirmAfter(n) if state.polls < n => Ok(None),
				ReceiptScript::ConfirmAfter(_) => Ok(Some(TransactionReceipt {
					hash: hash.clone(),
					block_number: 1234,
					success: true,
				})),
				ReceiptScript::RevertOnChain => Ok(Some(TransactionReceipt {
					hash: hash.clone(),
					block_number: 1234,
					success: false,
				})),
			}
		}
	}

	fn service(connector: Arc<StubConnector>) -> TransactionService {
		let account = LocalAccount::from_private_key(&SecretString::from(DEV_KEY)).unwrap();
		TransactionService::new(
			connector,
			Arc::new(AccountService::new(Box::new(account))),
			SubmissionSettings {
				dynamic_fees: true,
				gas_margin_percent: 20,
				poll_interval: Duration::from_millis(1),
				max_poll_attempts: 3,
			},
		)
	}

	fn contract() -> Address {
		CONTRACT.parse().unwrap()
	}

	#[test]
	fn test_gas_margin_arithmetic() {
		assert_eq!(apply_gas_margin(100_000, 20), 120_000);
		assert_eq!(apply_gas_margin(100_000, 0), 100_000);
		assert_eq!(apply_gas_margin(3, 20), 3);
		assert_eq!(apply_gas_margin(u64::MAX, 20), u64::MAX);
	}

	#[test]
	fn test_revert_maps_to_simulation_revert() {
		let err: BuildError = ChainError::Revert("no claimable tokens".to_string()).into();
		assert!(matches!(err, BuildError::SimulationRevert(_)));

		let err: BuildError = ChainError::Rpc("timeout".to_string()).into();
		assert!(matches!(err, BuildError::Chain(_)));
	}

	#[tokio::test]
	async fn test_build_fills_envelope_from_chain_state() {
		let connector = Arc::new(StubConnector::healthy());
		let service = service(connector.clone());

		let tx = service.build(contract(), vec![0x01]).await.unwrap();
		assert_eq!(tx.nonce, 0);
		assert_eq!(tx.gas_limit, 120_000);
		assert_eq!(tx.chain_id, 42161);
		assert!(tx.fees.is_dynamic());
	}

	#[tokio::test]
	async fn test_nonces_increase_across_sequential_sends() {
		let connector = Arc::new(StubConnector::healthy());
		let service = service(connector.clone());

		let first = service.build(contract(), vec![0x01]).await.unwrap();
		assert_eq!(first.nonce, 0);
		service.send(first).await.unwrap();

		let second = service.build(contract(), vec![0x02]).await.unwrap();
		assert_eq!(second.nonce, 1);
		service.send(second).await.unwrap();

		assert_eq!(connector.broadcast_count(), 2);
	}

	#[tokio::test]
	async fn test_fee_estimation_failure_aborts_before_broadcast() {
		let connector = Arc::new(StubConnector {
			fail_fees: true,
			..StubConnector::healthy()
		});
		let service = service(connector.clone());

		let result = service.build(contract(), vec![0x01]).await;
		assert!(matches!(result, Err(BuildError::Chain(ChainError::Rpc(_)))));
		assert_eq!(connector.broadcast_count(), 0);
	}

	#[tokio::test]
	async fn test_predicted_revert_is_distinct_from_rpc_failure() {
		let connector = Arc::new(StubConnector {
			revert_simulation: true,
			..StubConnector::healthy()
		});
		let service = service(connector.clone());

		let result = service.build(contract(), vec![0x01]).await;
		match result {
			Err(BuildError::SimulationRevert(reason)) => {
				assert!(reason.contains("already registered"));
			},
			other => panic!("expected SimulationRevert, got {:?}", other),
		}
		assert_eq!(connector.broadcast_count(), 0);
	}

	#[tokio::test]
	async fn test_broadcast_rejection_surfaces_as_broadcast_error() {
		let connector = Arc::new(StubConnector {
			reject_broadcast: true,
			..StubConnector::healthy()
		});
		let service = service(connector.clone());

		let tx = service.build(contract(), vec![0x01]).await.unwrap();
		let result = service.send(tx).await;
		match result {
			Err(SendError::Broadcast(message)) => assert!(message.contains("nonce too low")),
			other => panic!("expected Broadcast, got {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_confirmation_timeout_carries_hash_and_attempts() {
		let connector = Arc::new(StubConnector {
			receipts: ReceiptScript::NeverConfirm,
			..StubConnector::healthy()
		});
		let service = service(connector.clone());

		let tx = service.build(contract(), vec![0x01]).await.unwrap();
		match service.send(tx).await {
			Err(SendError::ConfirmationTimeout { hash, attempts }) => {
				assert_eq!(attempts, 3);
				assert!(!hash.0.is_empty());
			},
			other => panic!("expected ConfirmationTimeout, got {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_on_chain_revert_is_reported_as_failure() {
		let connector = Arc::new(StubConnector {
			receipts: ReceiptScript::RevertOnChain,
			..StubConnector::healthy()
		});
		let service = service(connector.clone());

		let tx = service.build(contract(), vec![0x01]).await.unwrap();
		assert!(matches!(
			service.send(tx).await,
			Err(SendError::TransactionFailed { .. })
		));
	}
}
