//! Contract binding: an address paired with a JSON interface descriptor.
//!
//! The ABI files are opaque configuration; only the decoded function
//! signatures matter here. Calls are encoded and decoded dynamically so the
//! binding works for any contract the configuration points at.

use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::Address;
use std::path::Path;
use thiserror::Error;

/// Errors raised by ABI loading, encoding, and decoding.
#[derive(Debug, Error)]
pub enum BindingError {
	/// The ABI file could not be read.
	#[error("Failed to read ABI file: {0}")]
	Io(#[from] std::io::Error),
	/// The ABI file is not a valid JSON interface descriptor.
	#[error("Invalid ABI JSON: {0}")]
	Parse(#[from] serde_json::Error),
	/// The requested function does not exist in the interface.
	#[error("Function '{0}' not found in contract interface")]
	UnknownFunction(String),
	/// Argument or return data did not match the function signature.
	#[error("ABI coding failed for '{function}': {message}")]
	Coding { function: String, message: String },
}

/// A contract address plus its parsed interface.
pub struct ContractBinding {
	address: Address,
	abi: JsonAbi,
}

impl ContractBinding {
	/// Creates a binding from an already-parsed interface.
	pub fn new(address: Address, abi: JsonAbi) -> Self {
		Self { address, abi }
	}

	/// Parses a binding from JSON ABI text.
	pub fn from_json(address: Address, json: &str) -> Result<Self, BindingError> {
		let abi: JsonAbi = serde_json::from_str(json)?;
		Ok(Self::new(address, abi))
	}

	/// Loads a binding from a JSON ABI file on disk.
	pub fn from_file(address: Address, path: &Path) -> Result<Self, BindingError> {
		let json = std::fs::read_to_string(path)?;
		Self::from_json(address, &json)
	}

	/// The contract address this binding targets.
	pub fn address(&self) -> Address {
		self.address
	}

	fn function(&self, name: &str) -> Result<&Function, BindingError> {
		self.abi
			.functions
			.get(name)
			.and_then(|overloads| overloads.first())
			.ok_or_else(|| BindingError::UnknownFunction(name.to_string()))
	}

	/// Encodes selector-prefixed calldata for a function invocation.
	pub fn encode_call(
		&self,
		name: &str,
		args: &[DynSolValue],
	) -> Result<Vec<u8>, BindingError> {
		let function = self.function(name)?;
		function.abi_encode_input(args).map_err(|e| BindingError::Coding {
			function: name.to_string(),
			message: e.to_string(),
		})
	}

	/// Decodes the return data of a function invocation.
	pub fn decode_output(
		&self,
		name: &str,
		data: &[u8],
	) -> Result<Vec<DynSolValue>, BindingError> {
		let function = self.function(name)?;
		function
			.abi_decode_output(data, true)
			.map_err(|e| BindingError::Coding {
				function: name.to_string(),
				message: e.to_string(),
			})
	}
}
