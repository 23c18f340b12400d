use ledger_client::call::{Call, NetUid};
use ledger_client::ledger::Ledger;
use ledger_client::storage::StorageKey;
use log::debug;
use subxt::utils::AccountId32;
use subxt_signer::sr25519::Keypair;

use crate::error::Result;
use crate::SubnetFixtures;

impl<L: Ledger> SubnetFixtures<L> {
    /// Moves everything `old_coldkey` owns to `new_coldkey` through sudo.
    ///
    /// `witness_hotkey` is any hotkey owned by `old_coldkey`; its `Owner` entry is what
    /// shows whether the swap already happened and whether it took effect.
    pub async fn swap_coldkey(
        &self,
        old_coldkey: &AccountId32,
        new_coldkey: &AccountId32,
        swap_cost: u64,
        witness_hotkey: &AccountId32,
    ) -> Result<()> {
        self.sudo_set(
            StorageKey::Owner(witness_hotkey.clone()),
            new_coldkey.clone(),
            Call::SwapColdkey {
                old_coldkey: old_coldkey.clone(),
                new_coldkey: new_coldkey.clone(),
                swap_cost,
            },
        )
        .await
    }

    /// Replaces `hotkey` with `new_hotkey`, on one subnet or all of them.
    pub async fn swap_hotkey(
        &self,
        hotkey: &AccountId32,
        new_hotkey: &AccountId32,
        netuid: Option<NetUid>,
        coldkey: &Keypair,
    ) -> Result<()> {
        let owner = coldkey.public_key().to_account_id();
        let key = StorageKey::Owner(new_hotkey.clone());
        if self.ledger().read_account(&key).await?.as_ref() == Some(&owner) {
            debug!("⏭️ {new_hotkey} already belongs to {owner}, skipping");
            return Ok(());
        }

        self.submit(
            Call::SwapHotkey {
                hotkey: hotkey.clone(),
                new_hotkey: new_hotkey.clone(),
                netuid,
            },
            coldkey,
        )
        .await?;
        self.assert_reads(&key, &owner.into()).await
    }
}
