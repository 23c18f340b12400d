use std::cmp::Ordering;

use ledger_client::call::{Call, NetUid};
use ledger_client::ledger::Ledger;
use ledger_client::storage::StorageKey;
use snafu::ensure;
use subxt::utils::AccountId32;
use subxt_signer::sr25519::Keypair;

use crate::error::{AssertionSnafu, Result};
use crate::SubnetFixtures;

impl<L: Ledger> SubnetFixtures<L> {
    /// Stakes `amount` rao from `coldkey` onto `hotkey` on `netuid`.
    pub async fn add_stake(
        &self,
        netuid: NetUid,
        hotkey: &AccountId32,
        amount: u64,
        coldkey: &Keypair,
    ) -> Result<()> {
        let call = Call::AddStake {
            hotkey: hotkey.clone(),
            netuid,
            amount_staked: amount,
        };
        self.change_alpha(netuid, hotkey, call, coldkey, Ordering::Greater)
            .await
    }

    /// Unstakes `amount` alpha held by `hotkey` on `netuid` back to `coldkey`.
    pub async fn remove_stake(
        &self,
        netuid: NetUid,
        hotkey: &AccountId32,
        amount: u64,
        coldkey: &Keypair,
    ) -> Result<()> {
        let call = Call::RemoveStake {
            hotkey: hotkey.clone(),
            netuid,
            amount_unstaked: amount,
        };
        self.change_alpha(netuid, hotkey, call, coldkey, Ordering::Less)
            .await
    }

    /// Recycles `amount` alpha staked on `hotkey`, returning it to the subnet's pool.
    pub async fn recycle_alpha(
        &self,
        netuid: NetUid,
        hotkey: &AccountId32,
        amount: u64,
        coldkey: &Keypair,
    ) -> Result<()> {
        let call = Call::RecycleAlpha {
            hotkey: hotkey.clone(),
            amount,
            netuid,
        };
        self.change_alpha(netuid, hotkey, call, coldkey, Ordering::Less)
            .await
    }

    /// Burns `amount` alpha staked on `hotkey`.
    pub async fn burn_alpha(
        &self,
        netuid: NetUid,
        hotkey: &AccountId32,
        amount: u64,
        coldkey: &Keypair,
    ) -> Result<()> {
        let call = Call::BurnAlpha {
            hotkey: hotkey.clone(),
            amount,
            netuid,
        };
        self.change_alpha(netuid, hotkey, call, coldkey, Ordering::Less)
            .await
    }

    /// Declares `hotkey` a delegate. Newer runtimes accept this as a no-op, so only
    /// finality is checked.
    pub async fn become_delegate(&self, hotkey: &AccountId32, coldkey: &Keypair) -> Result<()> {
        self.submit(
            Call::BecomeDelegate {
                hotkey: hotkey.clone(),
            },
            coldkey,
        )
        .await?;
        Ok(())
    }

    /// Sets the minimum stake a validator needs.
    pub async fn set_stake_threshold(&self, min_stake: u64) -> Result<()> {
        self.sudo_set(
            StorageKey::StakeThreshold,
            min_stake,
            Call::SudoSetStakeThreshold { min_stake },
        )
        .await
    }

    /// Submits a stake movement and asserts `TotalHotkeyAlpha` moved in `direction`.
    async fn change_alpha(
        &self,
        netuid: NetUid,
        hotkey: &AccountId32,
        call: Call,
        coldkey: &Keypair,
        direction: Ordering,
    ) -> Result<()> {
        let key = StorageKey::TotalHotkeyAlpha(hotkey.clone(), netuid);
        let before = self.ledger().read_u64(&key).await?;
        self.submit(call, coldkey).await?;
        let after = self.ledger().read_u64(&key).await?;

        let expected = match direction {
            Ordering::Greater => format!("more than {before}"),
            _ => format!("less than {before}"),
        };
        ensure!(
            after.cmp(&before) == direction,
            AssertionSnafu {
                what: key.to_string(),
                expected,
                actual: after.to_string(),
            }
        );
        Ok(())
    }
}
