//! Conversions between the two address formats the ledger uses.
//!
//! Native accounts are sr25519 `AccountId32`s shown as ss58. EVM accounts are 20 byte
//! addresses that the runtime maps onto native accounts by hashing `"evm:" ++ address`
//! with blake2-256.
use std::str::FromStr;

use hex::FromHex;
use sp_core::hashing::blake2_256;
use subxt::utils::{AccountId32, H160};

use crate::error::{Error, Result};

/// Prefix the runtime's hashed address mapping puts in front of an EVM address.
const EVM_ADDRESS_PREFIX: &[u8] = b"evm:";

/// Parses an ss58 encoded account id.
pub fn account_from_ss58(address: &str) -> Result<AccountId32> {
    AccountId32::from_str(address.trim()).map_err(|_| Error::InvalidSs58Address {
        address: address.to_string(),
    })
}

/// Parses a `0x` prefixed (or bare) hex EVM address.
pub fn h160_from_hex(address: &str) -> Result<H160> {
    let trimmed = address.trim();
    let bytes = <[u8; 20]>::from_hex(trimmed.strip_prefix("0x").unwrap_or(trimmed)).map_err(
        |_| Error::InvalidEthAddress {
            address: address.to_string(),
        },
    )?;
    Ok(H160::from(bytes))
}

/// The native account an EVM address is mapped to.
pub fn h160_to_account_id(address: &H160) -> AccountId32 {
    let mut data = Vec::with_capacity(EVM_ADDRESS_PREFIX.len() + 20);
    data.extend_from_slice(EVM_ADDRESS_PREFIX);
    data.extend_from_slice(address.as_bytes());
    AccountId32(blake2_256(&data))
}
