//! Typed facade over the drop-manager contract.
//!
//! Exposes the four claim intents (check registration, register, query
//! claimable balance, claim) as thin compositions of the chain connector and
//! the transaction service, against one fixed contract address and ABI. An
//! optional second binding covers the distributed ERC-20 token so the tool
//! can show the holder's balance after a claim.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use claimer_chain::{ChainConnector, ChainError};
use claimer_tx::{BuildError, SendError, TransactionService};
use claimer_types::TransactionHash;
use std::sync::Arc;
use thiserror::Error;

/// Claim amount validation and whole-token scaling.
pub mod amount;
/// Contract address plus JSON interface descriptor.
pub mod binding;

pub use amount::{scale_token_count, validate_claim_amount};
pub use binding::{BindingError, ContractBinding};

/// Errors that can occur during drop-contract operations.
#[derive(Debug, Error)]
pub enum DropError {
	/// The requested amount violates a precondition; checked before any
	/// network traffic.
	#[error("Invalid claim amount: {0}")]
	InvalidAmount(String),
	/// ABI loading or coding failed.
	#[error(transparent)]
	Binding(#[from] BindingError),
	/// A read-only chain query failed.
	#[error("Chain query failed: {0}")]
	Chain(#[from] ChainError),
	/// Transaction envelope assembly failed.
	#[error(transparent)]
	Build(#[from] BuildError),
	/// Transaction submission or confirmation failed.
	#[error(transparent)]
	Send(#[from] SendError),
	/// The contract returned data that does not match its interface.
	#[error("Malformed return data from {function}: {message}")]
	Response {
		function: &'static str,
		message: String,
	},
}

/// Client for one drop-manager contract, driven by one account.
pub struct DropClient {
	drop_contract: ContractBinding,
	token_contract: Option<ContractBinding>,
	connector: Arc<dyn ChainConnector>,
	transactions: Arc<TransactionService>,
	holder: Address,
}

impl DropClient {
	/// Creates a client for the given bindings and services.
	///
	/// `holder` is the account address all queries and transactions are
	/// made for.
	pub fn new(
		drop_contract: ContractBinding,
		token_contract: Option<ContractBinding>,
		connector: Arc<dyn ChainConnector>,
		transactions: Arc<TransactionService>,
		holder: Address,
	) -> Self {
		Self {
			drop_contract,
			token_contract,
			connector,
			transactions,
			holder,
		}
	}

	/// The account address this client operates for.
	pub fn holder(&self) -> Address {
		self.holder
	}

	/// Checks whether the holder is registered with the drop contract.
	pub async fn is_registered(&self) -> Result<bool, DropError> {
		let data = self
			.drop_contract
			.encode_call("registeredUsers", &[DynSolValue::Address(self.holder)])?;
		let raw = self.connector.call(self.drop_contract.address(), data).await?;
		let values = self.drop_contract.decode_output("registeredUsers", &raw)?;
		match values.first() {
			Some(DynSolValue::Bool(registered)) => Ok(*registered),
			other => Err(DropError::Response {
				function: "registeredUsers",
				message: format!("expected bool, got {:?}", other),
			}),
		}
	}

	/// Registers the holder with the drop contract.
	pub async fn register(&self) -> Result<TransactionHash, DropError> {
		let data = self.drop_contract.encode_call("register", &[])?;
		tracing::info!(contract = %self.drop_contract.address(), "submitting registration");
		let tx = self
			.transactions
			.build(self.drop_contract.address(), data)
			.await?;
		Ok(self.transactions.send(tx).await?)
	}

	/// Queries how many tokens the holder can currently claim, in the
	/// token's smallest unit.
	pub async fn claimable_tokens(&self) -> Result<U256, DropError> {
		let data = self
			.drop_contract
			.encode_call("claimableTokens", &[DynSolValue::Address(self.holder)])?;
		let raw = self.connector.call(self.drop_contract.address(), data).await?;
		let values = self.drop_contract.decode_output("claimableTokens", &raw)?;
		match values.first() {
			Some(DynSolValue::Uint(claimable, _)) => Ok(*claimable),
			other => Err(DropError::Response {
				function: "claimableTokens",
				message: format!("expected uint256, got {:?}", other),
			}),
		}
	}

	/// Claims `amount` tokens (smallest unit) for the holder.
	///
	/// The amount is validated against the caller-supplied last-known
	/// claimable balance before anything touches the network. The balance is
	/// not re-read on-chain here, so the window between
	/// [`DropClient::claimable_tokens`] and the claim remains open.
	pub async fn claim(
		&self,
		amount: U256,
		last_known_claimable: U256,
	) -> Result<TransactionHash, DropError> {
		validate_claim_amount(amount, last_known_claimable)?;

		let data = self
			.drop_contract
			.encode_call("claim", &[DynSolValue::Uint(amount, 256)])?;
		tracing::info!(
			contract = %self.drop_contract.address(),
			amount = %amount,
			"submitting claim"
		);
		let tx = self
			.transactions
			.build(self.drop_contract.address(), data)
			.await?;
		Ok(self.transactions.send(tx).await?)
	}

	/// Reads the holder's balance of the distributed token, when a token
	/// binding is configured.
	pub async fn token_balance(&self) -> Result<Option<U256>, DropError> {
		let Some(token) = &self.token_contract else {
			return Ok(None);
		};
		let data = token.encode_call("balanceOf", &[DynSolValue::Address(self.holder)])?;
		let raw = self.connector.call(token.address(), data).await?;
		let values = token.decode_output("balanceOf", &raw)?;
		match values.first() {
			Some(DynSolValue::Uint(balance, _)) => Ok(Some(*balance)),
			other => Err(DropError::Response {
				function: "balanceOf",
				message: format!("expected uint256, got {:?}", other),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use claimer_account::implementations::local::LocalAccount;
	use claimer_account::AccountService;
	use claimer_tx::SubmissionSettings;
	use claimer_types::{FeeEstimate, SecretString, TransactionReceipt};
	use std::collections::VecDeque;
	use std::sync::Mutex;
	use std::time::Duration;

	const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const DROP_ABI: &str = include_str!("../../../abis/drop_abi.json");
	const ERC20_ABI: &str = include_str!("../../../abis/erc20_abi.json");

	/// Connector stub answering read calls from a scripted queue and
	/// confirming every broadcast immediately.
	struct ScriptedConnector {
		call_outputs: Mutex<VecDeque<Vec<u8>>>,
		calls: Mutex<u32>,
		broadcasts: Mutex<u32>,
	}

	impl ScriptedConnector {
		fn new(outputs: Vec<Vec<u8>>) -> Self {
			Self {
				call_outputs: Mutex::new(outputs.into()),
				calls: Mutex::new(0),
				broadcasts: Mutex::new(0),
			}
		}

		fn network_touches(&self) -> u32 {
			*self.calls.lock().unwrap() + *self.broadcasts.lock().unwrap()
		}
	}

	#[async_trait]
	impl ChainConnector for ScriptedConnector {
		fn chain_id(&self) -> u64 {
			42161
		}

		async fn call(&self, _to: Address, _data: Vec<u8>) -> Result<Vec<u8>, ChainError> {
			*self.calls.lock().unwrap() += 1;
			self.call_outputs
				.lock()
				.unwrap()
				.pop_front()
				.ok_or_else(|| ChainError::Rpc("unexpected call".to_string()))
		}

		async fn estimate_fees(&self, _dynamic: bool) -> Result<FeeEstimate, ChainError> {
			Ok(FeeEstimate::Eip1559 {
				max_fee_per_gas: 30_000_000_000,
				max_priority_fee_per_gas: 1_000_000_000,
			})
		}

		async fn estimate_gas(
			&self,
			_from: Address,
			_to: Address,
			_data: &[u8],
		) -> Result<u64, ChainError> {
			Ok(90_000)
		}

		async fn nonce(&self, _address: Address) -> Result<u64, ChainError> {
			Ok(*self.broadcasts.lock().unwrap() as u64)
		}

		async fn send_raw(&self, _encoded: &[u8]) -> Result<TransactionHash, ChainError> {
			let mut broadcasts = self.broadcasts.lock().unwrap();
			*broadcasts += 1;
			Ok(TransactionHash(vec![*broadcasts as u8; 32]))
		}

		async fn receipt(
			&self,
			hash: &TransactionHash,
		) -> Result<Option<TransactionReceipt>, ChainError> {
			Ok(Some(TransactionReceipt {
				hash: hash.clone(),
				block_number: 7,
				success: true,
			}))
		}
	}

	fn bool_word(value: bool) -> Vec<u8> {
		let mut word = vec![0u8; 32];
		word[31] = value as u8;
		word
	}

	fn uint_word(value: u64) -> Vec<u8> {
		U256::from(value).to_be_bytes::<32>().to_vec()
	}

	fn client(connector: Arc<ScriptedConnector>, with_token: bool) -> DropClient {
		let account = LocalAccount::from_private_key(&SecretString::from(DEV_KEY)).unwrap();
		let holder = account.address();
		let transactions = Arc::new(TransactionService::new(
			connector.clone(),
			Arc::new(AccountService::new(Box::new(account))),
			SubmissionSettings {
				dynamic_fees: true,
				gas_margin_percent: 20,
				poll_interval: Duration::from_millis(1),
				max_poll_attempts: 3,
			},
		));
		let drop_contract = ContractBinding::from_json(
			"0x060e7c1bc320C9e7C1760e06A5455c343D16603B".parse().unwrap(),
			DROP_ABI,
		)
		.unwrap();
		let token_contract = with_token.then(|| {
			ContractBinding::from_json(
				"0x6985884C4392D348587B19cb9eAAf157F13271cd".parse().unwrap(),
				ERC20_ABI,
			)
			.unwrap()
		});
		DropClient::new(drop_contract, token_contract, connector, transactions, holder)
	}

	#[tokio::test]
	async fn test_registration_scenario() {
		// Not registered -> register -> registered.
		let connector = Arc::new(ScriptedConnector::new(vec![
			bool_word(false),
			bool_word(true),
		]));
		let client = client(connector.clone(), false);

		assert!(!client.is_registered().await.unwrap());
		let hash = client.register().await.unwrap();
		assert!(!hash.0.is_empty());
		assert!(client.is_registered().await.unwrap());
	}

	#[tokio::test]
	async fn test_claimable_tokens_decodes_uint() {
		let connector = Arc::new(ScriptedConnector::new(vec![uint_word(5_000)]));
		let client = client(connector, false);
		assert_eq!(client.claimable_tokens().await.unwrap(), U256::from(5_000u64));
	}

	#[tokio::test]
	async fn test_zero_claim_fails_without_network_traffic() {
		let connector = Arc::new(ScriptedConnector::new(vec![]));
		let client = client(connector.clone(), false);

		let result = client.claim(U256::ZERO, U256::from(100u64)).await;
		assert!(matches!(result, Err(DropError::InvalidAmount(_))));
		assert_eq!(connector.network_touches(), 0);
	}

	#[tokio::test]
	async fn test_exhausted_balance_rejects_any_claim_without_network_traffic() {
		let connector = Arc::new(ScriptedConnector::new(vec![]));
		let client = client(connector.clone(), false);

		let result = client.claim(U256::from(1u64), U256::ZERO).await;
		assert!(matches!(result, Err(DropError::InvalidAmount(_))));
		assert_eq!(connector.network_touches(), 0);
	}

	#[tokio::test]
	async fn test_claiming_the_full_fetched_balance_is_accepted() {
		let connector = Arc::new(ScriptedConnector::new(vec![uint_word(2_500)]));
		let client = client(connector.clone(), false);

		let claimable = client.claimable_tokens().await.unwrap();
		let hash = client.claim(claimable, claimable).await.unwrap();
		assert!(!hash.0.is_empty());
	}

	#[tokio::test]
	async fn test_token_balance_uses_the_erc20_binding() {
		let connector = Arc::new(ScriptedConnector::new(vec![uint_word(777)]));
		let client = client(connector, true);
		assert_eq!(
			client.token_balance().await.unwrap(),
			Some(U256::from(777u64))
		);
	}

	#[tokio::test]
	async fn test_token_balance_is_none_without_a_binding() {
		let connector = Arc::new(ScriptedConnector::new(vec![]));
		let client = client(connector.clone(), false);
		assert_eq!(client.token_balance().await.unwrap(), None);
		assert_eq!(connector.network_touches(), 0);
	}
}
