//! Claim console for an on-chain token distribution.
//!
//! Wires configuration, logging, the signing account, the chain connector,
//! and the drop-contract client together, then hands control to the
//! interactive console loop. Unrecovered credential, configuration, or
//! contract errors terminate the process with a non-zero exit code.

use alloy_primitives::Address;
use clap::Parser;
use claimer_account::implementations::local::LocalAccount;
use claimer_account::AccountService;
use claimer_chain::EvmConnector;
use claimer_config::Config;
use claimer_drop::{ContractBinding, DropClient};
use claimer_tx::{SubmissionSettings, TransactionService};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod console;
mod logging;

/// Command-line arguments for the claimer.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	/// Environment variable holding the signing key; prompts on stdin when
	/// the variable is unset
	#[arg(long, default_value = "CLAIMER_PRIVATE_KEY")]
	key_env: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	let config = Config::from_file(args.config.to_str().ok_or("config path is not UTF-8")?).await?;
	logging::init(&args.log_level, &config.logging)?;

	tracing::info!(
		chain = %config.chain.name,
		chain_id = config.chain.chain_id,
		"starting claimer"
	);

	// The key is held only long enough to derive the signer.
	let key = console::acquire_private_key(&args.key_env)?;
	let account = match LocalAccount::from_private_key(&key) {
		Ok(account) => account,
		Err(e) => {
			tracing::error!(error = %e, "credential rejected");
			return Err(e.into());
		},
	};
	drop(key);
	let holder = account.address();
	tracing::info!(address = %holder, "resolved account address");

	let account = Arc::new(AccountService::new(Box::new(account)));
	let connector = Arc::new(EvmConnector::connect(&config.chain)?);
	let transactions = Arc::new(TransactionService::new(
		connector.clone(),
		account,
		SubmissionSettings {
			dynamic_fees: config.chain.eip1559,
			gas_margin_percent: config.submission.gas_margin_percent,
			poll_interval: Duration::from_secs(config.submission.poll_interval_secs),
			max_poll_attempts: config.submission.max_poll_attempts,
		},
	));

	let drop_address: Address = config
		.contract
		.address
		.parse()
		.map_err(|e| format!("invalid contract address: {}", e))?;
	let drop_contract = ContractBinding::from_file(drop_address, &config.contract.abi_path)?;

	let token_contract = match &config.token {
		Some(token) => {
			let token_address: Address = token
				.address
				.parse()
				.map_err(|e| format!("invalid token address: {}", e))?;
			Some(ContractBinding::from_file(token_address, &token.abi_path)?)
		},
		None => None,
	};

	let client = DropClient::new(drop_contract, token_contract, connector, transactions, holder);

	if let Err(e) = console::run(&client, &config).await {
		tracing::error!(error = %e, "session failed");
		return Err(e);
	}

	tracing::info!("stopped claimer");
	Ok(())
}
