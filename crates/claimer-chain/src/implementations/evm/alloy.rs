//! Alloy-based EVM chain connector.
//!
//! Builds one HTTP provider over a reqwest client (optionally routed through
//! an HTTP proxy supplied by configuration) and maps alloy transport errors
//! onto the connector error taxonomy. Node-predicted reverts are classified
//! separately from transport faults so callers can tell contract logic from
//! network weather.

use alloy_primitives::{Address, B256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types::TransactionRequest;
use alloy_transport::TransportError;
use alloy_transport_http::Http;
use async_trait::async_trait;
use claimer_config::ChainConfig;
use claimer_types::{FeeEstimate, TransactionHash, TransactionReceipt};
use url::Url;

use crate::{ChainConnector, ChainError};

/// Chain connector backed by an alloy HTTP provider.
pub struct EvmConnector {
	provider: RootProvider<Http<reqwest::Client>>,
	chain_id: u64,
}

impl EvmConnector {
	/// Connects to the configured RPC endpoint.
	///
	/// The transport is a plain reqwest client unless a proxy URL is
	/// configured, in which case all RPC traffic is routed through it.
	pub fn connect(config: &ChainConfig) -> Result<Self, ChainError> {
		let url: Url = config
			.rpc_url
			.parse()
			.map_err(|e| ChainError::Endpoint(format!("invalid RPC URL: {}", e)))?;

		let mut builder = reqwest::Client::builder();
		if let Some(proxy_url) = &config.proxy_url {
			let proxy = reqwest::Proxy::all(proxy_url)
				.map_err(|e| ChainError::Endpoint(format!("invalid proxy URL: {}", e)))?;
			builder = builder.proxy(proxy);
		}
		let client = builder
			.build()
			.map_err(|e| ChainError::Endpoint(format!("failed to build HTTP client: {}", e)))?;

		let transport = Http::with_client(client, url);
		let rpc = RpcClient::new(transport, false);
		Ok(Self {
			provider: RootProvider::new(rpc),
			chain_id: config.chain_id,
		})
	}
}

#[async_trait]
impl ChainConnector for EvmConnector {
	fn chain_id(&self) -> u64 {
		self.chain_id
	}

	async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ChainError> {
		let request = TransactionRequest::default().to(to).input(data.into());
		let output = self
			.provider
			.call(&request)
			.await
			.map_err(|e| ChainError::Rpc(format!("eth_call to {} failed: {}", to, e)))?;
		Ok(output.to_vec())
	}

	async fn estimate_fees(&self, dynamic: bool) -> Result<FeeEstimate, ChainError> {
		if dynamic {
			let estimate = self
				.provider
				.estimate_eip1559_fees(None)
				.await
				.map_err(|e| ChainError::Rpc(format!("EIP-1559 fee estimation failed: {}", e)))?;
			Ok(FeeEstimate::Eip1559 {
				max_fee_per_gas: estimate.max_fee_per_gas,
				max_priority_fee_per_gas: estimate.max_priority_fee_per_gas,
			})
		} else {
			let gas_price = self
				.provider
				.get_gas_price()
				.await
				.map_err(|e| ChainError::Rpc(format!("gas price query failed: {}", e)))?;
			Ok(FeeEstimate::Legacy { gas_price })
		}
	}

	async fn estimate_gas(
		&self,
		from: Address,
		to: Address,
		data: &[u8],
	) -> Result<u64, ChainError> {
		let request = TransactionRequest::default()
			.from(from)
			.to(to)
			.input(data.to_vec().into());
		self.provider.estimate_gas(&request).await.map_err(|e| {
			match revert_reason(&e) {
				Some(reason) => ChainError::Revert(reason),
				None => ChainError::Rpc(format!("gas estimation failed: {}", e)),
			}
		})
	}

	async fn nonce(&self, address: Address) -> Result<u64, ChainError> {
		self.provider
			.get_transaction_count(address)
			.await
			.map_err(|e| ChainError::Rpc(format!("nonce query for {} failed: {}", address, e)))
	}

	async fn send_raw(&self, encoded: &[u8]) -> Result<TransactionHash, ChainError> {
		let pending = self
			.provider
			.send_raw_transaction(encoded)
			.await
			.map_err(|e| ChainError::Rpc(format!("raw transaction rejected: {}", e)))?;
		let tx_hash = *pending.tx_hash();
		tracing::debug!(tx_hash = %tx_hash, "raw transaction accepted by node");
		Ok(TransactionHash(tx_hash.0.to_vec()))
	}

	async fn receipt(
		&self,
		hash: &TransactionHash,
	) -> Result<Option<TransactionReceipt>, ChainError> {
		let tx_hash = B256::from_slice(&hash.0);
		match self.provider.get_transaction_receipt(tx_hash).await {
			Ok(Some(receipt)) => Ok(Some(TransactionReceipt {
				hash: TransactionHash(receipt.transaction_hash.0.to_vec()),
				block_number: receipt.block_number.unwrap_or(0),
				success: receipt.status(),
			})),
			Ok(None) => Ok(None),
			Err(e) => Err(ChainError::Rpc(format!(
				"receipt lookup for {} failed: {}",
				hash, e
			))),
		}
	}
}

/// Extracts a revert reason from a JSON-RPC error response, if that is what
/// the error is.
///
/// Execution reverts come back as error payloads with code 3 (per the
/// Ethereum JSON-RPC spec) or a message mentioning a revert; transport
/// failures never carry such a payload.
fn revert_reason(error: &TransportError) -> Option<String> {
	let payload = error.as_error_resp()?;
	if payload.code == 3 || payload.message.to_lowercase().contains("revert") {
		Some(payload.message.to_string())
	} else {
		None
	}
}
