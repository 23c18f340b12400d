//! TAO denominated amounts.
use crate::error::{Error, Result};

/// Rao per TAO. Balances on the ledger are held in rao.
pub const RAO_PER_TAO: u64 = 1_000_000_000;

/// Converts whole TAO into rao.
pub fn tao(amount: u64) -> Result<u64> {
    amount
        .checked_mul(RAO_PER_TAO)
        .ok_or(Error::AmountOverflow { amount })
}
