//! Configuration for the claimer tool.
//!
//! Loads a TOML file describing the target chain, the drop-manager contract,
//! the optional token binding, submission tuning, and logging output. Values
//! may reference environment variables with `${VAR}` or `${VAR:-default}`,
//! which is how the RPC URL or proxy is usually injected. Everything is
//! validated before any component is constructed: nothing network-facing is
//! baked into the code.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the claimer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// The chain the tool talks to.
	pub chain: ChainConfig,
	/// The drop-manager contract binding.
	pub contract: ContractConfig,
	/// Optional binding for the distributed ERC-20 token.
	pub token: Option<TokenConfig>,
	/// Transaction submission tuning.
	#[serde(default)]
	pub submission: SubmissionConfig,
	/// Log output destinations.
	#[serde(default)]
	pub logging: LoggingConfig,
}

/// Configuration for a single blockchain network.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
	/// Human-readable network name, used only for logging.
	pub name: String,
	/// Numeric chain identifier the transactions are signed for.
	pub chain_id: u64,
	/// HTTP(S) JSON-RPC endpoint.
	pub rpc_url: String,
	/// Block explorer base URL, used to render transaction links.
	pub explorer_url: Option<String>,
	/// Use the dynamic (EIP-1559) fee model instead of a flat gas price.
	#[serde(default = "default_eip1559")]
	pub eip1559: bool,
	/// Optional HTTP proxy the RPC transport is routed through.
	pub proxy_url: Option<String>,
}

/// The drop-manager contract: address plus the JSON ABI file describing its
/// callable functions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContractConfig {
	pub address: String,
	pub abi_path: PathBuf,
}

/// The distributed token, used for balance display after a claim.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
	pub address: String,
	pub abi_path: PathBuf,
	pub symbol: String,
	#[serde(default = "default_decimals")]
	pub decimals: u8,
}

/// Transaction submission tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmissionConfig {
	/// Percentage added on top of the simulated gas usage.
	#[serde(default = "default_gas_margin_percent")]
	pub gas_margin_percent: u64,
	/// Seconds between receipt polls after broadcast.
	#[serde(default = "default_poll_interval_secs")]
	pub poll_interval_secs: u64,
	/// How many receipt polls to attempt before reporting a timeout.
	#[serde(default = "default_max_poll_attempts")]
	pub max_poll_attempts: u32,
}

impl Default for SubmissionConfig {
	fn default() -> Self {
		Self {
			gas_margin_percent: default_gas_margin_percent(),
			poll_interval_secs: default_poll_interval_secs(),
			max_poll_attempts: default_max_poll_attempts(),
		}
	}
}

/// Log output destinations.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
	/// Log file appended alongside console output.
	#[serde(default = "default_log_file")]
	pub file: PathBuf,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			file: default_log_file(),
		}
	}
}

fn default_eip1559() -> bool {
	true
}

fn default_decimals() -> u8 {
	18
}

fn default_gas_margin_percent() -> u64 {
	20
}

fn default_poll_interval_secs() -> u64 {
	5
}

fn default_max_poll_attempts() -> u32 {
	36
}

fn default_log_file() -> PathBuf {
	PathBuf::from("claim.log")
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = cap.get(0).unwrap();
		let var_name = cap.get(1).unwrap().as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)))
				},
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads and validates configuration from a TOML file.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let raw = tokio::fs::read_to_string(path).await?;
		Self::from_toml(&raw)
	}

	/// Parses and validates configuration from a TOML string.
	pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
		let resolved = resolve_env_vars(raw)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}

	/// Validates the configuration before any component is constructed.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.chain.name.is_empty() {
			return Err(ConfigError::Validation("chain.name cannot be empty".into()));
		}
		if self.chain.chain_id == 0 {
			return Err(ConfigError::Validation(
				"chain.chain_id must be greater than 0".into(),
			));
		}
		if !self.chain.rpc_url.starts_with("http://") && !self.chain.rpc_url.starts_with("https://")
		{
			return Err(ConfigError::Validation(format!(
				"chain.rpc_url must be an HTTP(S) URL, got '{}'",
				self.chain.rpc_url
			)));
		}

		validate_contract_address("contract.address", &self.contract.address)?;
		if let Some(token) = &self.token {
			validate_contract_address("token.address", &token.address)?;
			if token.decimals > 36 {
				return Err(ConfigError::Validation(format!(
					"token.decimals of {} is not a plausible token precision",
					token.decimals
				)));
			}
		}

		if self.submission.gas_margin_percent > 100 {
			return Err(ConfigError::Validation(
				"submission.gas_margin_percent cannot exceed 100".into(),
			));
		}
		if self.submission.max_poll_attempts == 0 {
			return Err(ConfigError::Validation(
				"submission.max_poll_attempts must be at least 1".into(),
			));
		}
		if self.submission.poll_interval_secs == 0 {
			return Err(ConfigError::Validation(
				"submission.poll_interval_secs must be at least 1".into(),
			));
		}

		Ok(())
	}
}

fn validate_contract_address(field: &str, address: &str) -> Result<(), ConfigError> {
	let hex_part = address
		.strip_prefix("0x")
		.or_else(|| address.strip_prefix("0X"))
		.unwrap_or(address);
	if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
		return Err(ConfigError::Validation(format!(
			"{} must be a 20-byte hex address, got '{}'",
			field, address
		)));
	}
	Ok(())
}
