use ledger_client::call::Call;
use ledger_client::ledger::Ledger;
use ledger_client::storage::StorageKey;

use crate::error::Result;
use crate::SubnetFixtures;

impl<L: Ledger> SubnetFixtures<L> {
    /// Sets the chain id reported to EVM transactions.
    pub async fn force_set_chain_id(&self, chain_id: u64) -> Result<()> {
        self.sudo_set(
            StorageKey::ChainId,
            chain_id,
            Call::SudoSetEvmChainId { chain_id },
        )
        .await
    }

    /// Turns the contract deployment whitelist off (`true`) or back on (`false`).
    pub async fn disable_whitelist_check(&self, disabled: bool) -> Result<()> {
        self.sudo_set(
            StorageKey::DisableWhitelistCheck,
            disabled,
            Call::DisableWhitelist { disabled },
        )
        .await
    }
}
