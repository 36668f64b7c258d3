//! Local private-key account implementation.
//!
//! Parses a raw hex private key into an in-memory signer and produces
//! EIP-2718 encoded signed transactions. Key validation happens up front so
//! a malformed credential fails before any network traffic.

use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_network::TxSigner;
use alloy_primitives::{Address, Bytes, TxKind};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use claimer_types::{without_0x_prefix, FeeEstimate, SecretString, Transaction};

use crate::{AccountError, AccountInterface};

/// Account backed by a locally held private key.
pub struct LocalAccount {
	signer: PrivateKeySigner,
}

impl LocalAccount {
	/// Builds an account from a raw hex private key.
	///
	/// Accepts the key with or without a `0x` prefix. Fails with
	/// [`AccountError::InvalidKey`] when the key is not 32 bytes of hex or
	/// is rejected by curve validation (the zero key among them).
	pub fn from_private_key(key: &SecretString) -> Result<Self, AccountError> {
		let signer = key.with_exposed(|raw| {
			let hex_part = without_0x_prefix(raw.trim());
			if hex_part.len() != 64 {
				return Err(AccountError::InvalidKey(format!(
					"expected 32-byte hex key, got {} hex characters",
					hex_part.len()
				)));
			}
			let bytes = hex::decode(hex_part)
				.map_err(|e| AccountError::InvalidKey(format!("key is not valid hex: {}", e)))?;
			PrivateKeySigner::from_slice(&bytes).map_err(|e| {
				AccountError::InvalidKey(format!("key failed curve validation: {}", e))
			})
		})?;
		Ok(Self { signer })
	}

	/// The checksummed address derived from the held key.
	pub fn address(&self) -> Address {
		self.signer.address()
	}
}

#[async_trait]
impl AccountInterface for LocalAccount {
	async fn address(&self) -> Result<Address, AccountError> {
		Ok(self.signer.address())
	}

	async fn sign_transaction(&self, tx: &Transaction) -> Result<Vec<u8>, AccountError> {
		let envelope = match tx.fees {
			FeeEstimate::Eip1559 {
				max_fee_per_gas,
				max_priority_fee_per_gas,
			} => {
				let mut inner = TxEip1559 {
					chain_id: tx.chain_id,
					nonce: tx.nonce,
					gas_limit: tx.gas_limit,
					max_fee_per_gas,
					max_priority_fee_per_gas,
					to: TxKind::Call(tx.to),
					value: tx.value,
					access_list: Default::default(),
					input: Bytes::from(tx.data.clone()),
				};
				let signature = self
					.signer
					.sign_transaction(&mut inner)
					.await
					.map_err(|e| AccountError::SigningFailed(e.to_string()))?;
				TxEnvelope::Eip1559(inner.into_signed(signature))
			},
			FeeEstimate::Legacy { gas_price } => {
				let mut inner = TxLegacy {
					chain_id: Some(tx.chain_id),
					nonce: tx.nonce,
					gas_price,
					gas_limit: tx.gas_limit,
					to: TxKind::Call(tx.to),
					value: tx.value,
					input: Bytes::from(tx.data.clone()),
				};
				let signature = self
					.signer
					.sign_transaction(&mut inner)
					.await
					.map_err(|e| AccountError::SigningFailed(e.to_string()))?;
				TxEnvelope::Legacy(inner.into_signed(signature))
			},
		};
		Ok(envelope.encoded_2718())
	}
}
