//! Interactive console loop driving the drop client.
//!
//! Mirrors the intents a user works through: check registration (registering
//! first if needed), show the claimable balance, then prompt for a whole
//! token quantity to claim. All input validation returns explicit values;
//! invalid input re-prompts instead of aborting the session.

use alloy_primitives::U256;
use claimer_config::Config;
use claimer_drop::{scale_token_count, DropClient, DropError};
use claimer_tx::SendError;
use claimer_types::{format_token_amount, SecretString, TransactionHash};
use std::error::Error;
use std::io::{self, Write};
use std::time::Duration;
use zeroize::Zeroize;

/// Token precision assumed when no token binding is configured.
const DEFAULT_DECIMALS: u8 = 18;

/// How long to let a registration settle before re-checking it.
const REGISTRATION_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// What the user asked for with a quantity entry.
#[derive(Debug, PartialEq, Eq)]
pub enum QuantityIntent {
	/// Claim this many smallest-unit tokens.
	Claim(U256),
	/// Zero entered: leave the program.
	Exit,
}

/// Reads the signing key from the named environment variable, falling back
/// to an interactive prompt.
///
/// The key is wrapped in a [`SecretString`] immediately; the intermediate
/// input buffer is wiped.
pub fn acquire_private_key(env_var: &str) -> Result<SecretString, io::Error> {
	if let Ok(value) = std::env::var(env_var) {
		return Ok(SecretString::new(value));
	}

	print!("Enter private key: ");
	io::stdout().flush()?;
	let mut line = String::new();
	io::stdin().read_line(&mut line)?;
	let key = SecretString::new(line.trim().to_string());
	line.zeroize();
	Ok(key)
}

/// Parses a whole-token quantity entry against the claimable balance.
///
/// Returns the scaled smallest-unit amount, the exit intent for zero, or a
/// human-readable rejection for anything else.
pub fn parse_quantity(
	input: &str,
	decimals: u8,
	claimable: U256,
) -> Result<QuantityIntent, String> {
	let trimmed = input.trim();
	let count: i128 = trimmed
		.parse()
		.map_err(|_| format!("'{}' is not a whole number", trimmed))?;
	if count == 0 {
		return Ok(QuantityIntent::Exit);
	}
	let amount = scale_token_count(count, decimals).map_err(|e| e.to_string())?;
	if amount > claimable {
		return Err(format!(
			"{} tokens exceeds the remaining claimable balance of {}",
			count,
			format_token_amount(&claimable.to_string(), decimals)
		));
	}
	Ok(QuantityIntent::Claim(amount))
}

/// Renders an explorer link for a transaction when an explorer is configured.
pub fn explorer_tx_url(explorer_url: Option<&str>, hash: &TransactionHash) -> Option<String> {
	explorer_url.map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), hash))
}

/// Runs the console session until the balance is exhausted or the user
/// exits.
pub async fn run(client: &DropClient, config: &Config) -> Result<(), Box<dyn Error>> {
	let decimals = config
		.token
		.as_ref()
		.map(|token| token.decimals)
		.unwrap_or(DEFAULT_DECIMALS);
	let explorer = config.chain.explorer_url.as_deref();

	loop {
		if !client.is_registered().await? {
			tracing::warn!(address = %client.holder(), "address is not registered");
			tracing::info!("submitting registration");
			let hash = client.register().await?;
			announce_transaction(&hash, explorer, "registration confirmed");
			tokio::time::sleep(REGISTRATION_SETTLE_DELAY).await;
			continue;
		}

		let claimable = client.claimable_tokens().await?;
		tracing::info!(
			remaining = %format_token_amount(&claimable.to_string(), decimals),
			"claimable tokens"
		);
		if claimable.is_zero() {
			tracing::warn!("no tokens left to claim");
			return Ok(());
		}

		loop {
			let line = prompt("Tokens to claim (0 exits): ")?;
			match parse_quantity(&line, decimals, claimable) {
				Ok(QuantityIntent::Exit) => return Ok(()),
				Ok(QuantityIntent::Claim(amount)) => {
					tracing::info!("claiming tokens");
					let hash = claim_with_nonce_retry(client, amount, claimable).await?;
					announce_transaction(&hash, explorer, "claim confirmed");
					if let Some(balance) = client.token_balance().await? {
						tracing::info!(
							balance = %format_token_amount(&balance.to_string(), decimals),
							"token balance"
						);
					}
					break;
				},
				Err(reason) => tracing::warn!(%reason, "invalid quantity"),
			}
		}
	}
}

/// Claims once, rebuilding with a fresh nonce on a nonce-conflict rejection.
///
/// A stale nonce is the one broadcast rejection worth a single rebuild: the
/// envelope is re-assembled from current chain state, so the conflict
/// resolves itself. Everything else propagates untouched.
async fn claim_with_nonce_retry(
	client: &DropClient,
	amount: U256,
	claimable: U256,
) -> Result<TransactionHash, DropError> {
	match client.claim(amount, claimable).await {
		Err(DropError::Send(SendError::Broadcast(message))) if message.contains("nonce") => {
			tracing::warn!(%message, "broadcast rejected; rebuilding with a fresh nonce");
			client.claim(amount, claimable).await
		},
		other => other,
	}
}

fn announce_transaction(hash: &TransactionHash, explorer: Option<&str>, what: &str) {
	match explorer_tx_url(explorer, hash) {
		Some(url) => tracing::info!(tx_hash = %hash, explorer = %url, "{}", what),
		None => tracing::info!(tx_hash = %hash, "{}", what),
	}
}

fn prompt(message: &str) -> Result<String, io::Error> {
	print!("{}", message);
	io::stdout().flush()?;
	let mut line = String::new();
	io::stdin().read_line(&mut line)?;
	Ok(line)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn one_token() -> U256 {
		U256::from(10u64).pow(U256::from(18u64))
	}

	#[test]
	fn test_zero_entry_is_the_exit_intent() {
		let result = parse_quantity("0", 18, one_token());
		assert_eq!(result, Ok(QuantityIntent::Exit));
	}

	#[test]
	fn test_valid_entry_is_scaled_to_smallest_units() {
		let claimable = one_token() * U256::from(10u64);
		match parse_quantity("3", 18, claimable) {
			Ok(QuantityIntent::Claim(amount)) => {
				assert_eq!(amount, one_token() * U256::from(3u64));
			},
			other => panic!("expected claim intent, got {:?}", other),
		}
	}

	#[test]
	fn test_non_numeric_entry_is_rejected() {
		let result = parse_quantity("three", 18, one_token());
		assert!(result.is_err());
	}

	#[test]
	fn test_negative_entry_is_rejected() {
		let result = parse_quantity("-2", 18, one_token());
		assert!(result.is_err());
	}

	#[test]
	fn test_entry_above_claimable_is_rejected() {
		let result = parse_quantity("2", 18, one_token());
		assert!(result.is_err());
	}

	#[test]
	fn test_whitespace_is_tolerated() {
		let result = parse_quantity(" 1 \n", 18, one_token());
		assert_eq!(result, Ok(QuantityIntent::Claim(one_token())));
	}

	#[test]
	fn test_private_key_read_from_environment() {
		std::env::set_var("CLAIMER_TEST_KEY_ENV", "0xabc123");
		let key = acquire_private_key("CLAIMER_TEST_KEY_ENV").unwrap();
		assert_eq!(key.expose_secret(), "0xabc123");
		std::env::remove_var("CLAIMER_TEST_KEY_ENV");
	}

	#[test]
	fn test_explorer_url_rendering() {
		let hash = TransactionHash(vec![0xab; 32]);
		let url = explorer_tx_url(Some("https://arbiscan.io/"), &hash).unwrap();
		assert_eq!(url, format!("https://arbiscan.io/tx/{}", hash));
		assert!(explorer_tx_url(None, &hash).is_none());
	}
}
