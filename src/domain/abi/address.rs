use std::str::FromStr;

use alloy_primitives::Address;

use crate::error::MapperError;

/// Parse a `0x`-prefixed address.
///
/// Mixed-case input must carry a valid EIP-55 checksum; all-lowercase and
/// all-uppercase input is accepted as is.
pub fn parse_address(input: &str) -> Result<Address, MapperError> {
    let invalid = |reason: &str| MapperError::InvalidAddress {
        address: input.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = input.trim();
    let payload = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| invalid("missing 0x prefix"))?;

    if payload.len() != 40 {
        return Err(invalid("expected 40 hex digits"));
    }
    if !payload.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("contains non-hex characters"));
    }

    let has_lower = payload.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = payload.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        let prefixed = format!("0x{}", payload);
        return Address::parse_checksummed(&prefixed, None).map_err(|_| invalid("bad EIP-55 checksum"));
    }

    Address::from_str(payload).map_err(|err| invalid(&err.to_string()))
}
