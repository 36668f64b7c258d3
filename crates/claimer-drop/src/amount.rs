//! Claim amount validation and whole-token scaling.
//!
//! Both checks run before any network traffic: a zero or out-of-bounds
//! amount is caller error, not a chain condition. The bound check uses the
//! last claimable balance the caller fetched; the chain is not re-queried
//! here, so a concurrent claim elsewhere can still invalidate the amount
//! between the read and the transaction.

use alloy_primitives::U256;

use crate::DropError;

/// Scales a whole-token count into the token's smallest unit.
///
/// Rejects zero and negative counts, and counts whose scaled value does not
/// fit a 256-bit word.
pub fn scale_token_count(count: i128, decimals: u8) -> Result<U256, DropError> {
	if count <= 0 {
		return Err(DropError::InvalidAmount(format!(
			"token count must be positive, got {}",
			count
		)));
	}
	let factor = U256::from(10u8)
		.checked_pow(U256::from(decimals))
		.ok_or_else(|| {
			DropError::InvalidAmount(format!("decimal factor 10^{} overflows", decimals))
		})?;
	U256::from(count as u128)
		.checked_mul(factor)
		.ok_or_else(|| {
			DropError::InvalidAmount(format!(
				"{} tokens at {} decimals overflows the amount word",
				count, decimals
			))
		})
}

/// Checks a claim amount against the last-known claimable balance.
pub fn validate_claim_amount(amount: U256, last_known_claimable: U256) -> Result<(), DropError> {
	if amount.is_zero() {
		return Err(DropError::InvalidAmount(
			"claim amount must be positive".to_string(),
		));
	}
	if amount > last_known_claimable {
		return Err(DropError::InvalidAmount(format!(
			"claim amount {} exceeds claimable balance {}",
			amount, last_known_claimable
		)));
	}
	Ok(())
}
