//! Hex and token-amount formatting helpers.

/// Adds a "0x" prefix to a hex string if it is missing.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.to_lowercase().starts_with("0x") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Strips a leading "0x" or "0X" from a hex string if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Formats a raw on-chain amount as a human-readable token quantity.
///
/// `amount` is the decimal string of the smallest-unit value; `decimals`
/// shifts the decimal point. Trailing zeros are trimmed.
pub fn format_token_amount(amount: &str, decimals: u8) -> String {
	if decimals == 0 {
		return amount.to_string();
	}

	let decimal_places = decimals as usize;
	let (integer_part, decimal_part) = if amount.len() <= decimal_places {
		let decimal_str = format!("{:0>width$}", amount, width = decimal_places);
		("0".to_string(), decimal_str)
	} else {
		let split_pos = amount.len() - decimal_places;
		(
			amount[..split_pos].to_string(),
			amount[split_pos..].to_string(),
		)
	};

	let decimal_trimmed = decimal_part.trim_end_matches('0');
	if decimal_trimmed.is_empty() {
		integer_part
	} else {
		format!("{}.{}", integer_part, decimal_trimmed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_prefix_round_trip() {
		assert_eq!(with_0x_prefix("abc123"), "0xabc123");
		assert_eq!(with_0x_prefix("0xabc123"), "0xabc123");
		assert_eq!(without_0x_prefix("0xabc123"), "abc123");
		assert_eq!(without_0x_prefix("0Xabc123"), "abc123");
		assert_eq!(without_0x_prefix("abc123"), "abc123");
	}

	#[test]
	fn test_format_token_amount() {
		assert_eq!(format_token_amount("1000000000000000000", 18), "1");
		assert_eq!(format_token_amount("1500000000000000000", 18), "1.5");
		assert_eq!(format_token_amount("100000000000000000", 18), "0.1");
		assert_eq!(format_token_amount("42", 0), "42");
		assert_eq!(format_token_amount("0", 18), "0");
	}
}
