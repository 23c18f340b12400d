use ledger_client::address::{account_from_ss58, h160_from_hex, h160_to_account_id};
use ledger_client::call::Call;
use ledger_client::ledger::Ledger;
use ledger_client::storage::StorageKey;
use ledger_client::units::tao;
use log::debug;
use subxt::utils::AccountId32;

use crate::error::Result;
use crate::SubnetFixtures;

/// Whole TAO given to accounts funded without an explicit amount.
pub const DEFAULT_FUNDING_TAO: u64 = 100_000_000;

impl<L: Ledger> SubnetFixtures<L> {
    /// Sets the free balance of `who` to `amount` rao.
    ///
    /// The admin pays fees for every call it signs, this one included, so its balance is
    /// not asserted afterwards.
    pub async fn force_set_balance(&self, who: &AccountId32, amount: u64) -> Result<()> {
        let key = StorageKey::FreeBalance(who.clone());
        if self.ledger().read_u64(&key).await? == amount {
            debug!("⏭️ {} is already {}, skipping", key, amount);
            return Ok(());
        }

        self.sudo(Call::ForceSetBalance {
            who: who.clone(),
            new_free: amount,
        })
        .await?;

        if *who == self.admin.account_id() {
            return Ok(());
        }
        self.assert_reads(&key, &amount.into()).await
    }

    /// Funds the ss58 encoded account with [`DEFAULT_FUNDING_TAO`].
    pub async fn force_set_balance_to_ss58(&self, address: &str) -> Result<()> {
        let who = account_from_ss58(address)?;
        self.force_set_balance(&who, tao(DEFAULT_FUNDING_TAO)?).await
    }

    /// Funds the native account backing an EVM address with [`DEFAULT_FUNDING_TAO`].
    pub async fn force_set_balance_to_eth_address(&self, address: &str) -> Result<()> {
        let who = h160_to_account_id(&h160_from_hex(address)?);
        self.force_set_balance(&who, tao(DEFAULT_FUNDING_TAO)?).await
    }
}
