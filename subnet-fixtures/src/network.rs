use std::collections::BTreeSet;

use ledger_client::call::{Call, NetUid};
use ledger_client::error::Error as LedgerError;
use ledger_client::ledger::Ledger;
use ledger_client::storage::{ConstantKey, StorageKey};
use ledger_client::wait::wait_until;
use log::{debug, info};
use snafu::ensure;
use subxt::utils::AccountId32;
use subxt_signer::sr25519::Keypair;

use crate::error::{AssertionSnafu, Result};
use crate::{describe, SubnetFixtures};

/// What a `register_network` call left behind.
///
/// Retried submissions can each register a network, and other writers may register
/// networks concurrently, so the registration does not name a single netuid. It reports
/// the network counter on both sides of the call and every netuid the registering
/// coldkey came to own; the caller decides which one it cares about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkRegistration {
    /// `TotalNetworks` before the call.
    pub total_before: u64,
    /// `TotalNetworks` after the call.
    pub total_after: u64,
    /// Netuids owned by the registering coldkey after the call but not before it.
    pub candidates: Vec<NetUid>,
}

impl<L: Ledger> SubnetFixtures<L> {
    /// Registers a new subnet with `hotkey` as owner hotkey, paid for by `coldkey`.
    ///
    /// Lifts the network rate limit first so back to back registrations succeed. The
    /// runtime hands out the lowest free netuid, which need not follow the network count,
    /// so the new subnets are found by comparing what the coldkey owns before and after.
    pub async fn add_new_subnetwork(
        &self,
        hotkey: &AccountId32,
        coldkey: &Keypair,
    ) -> Result<NetworkRegistration> {
        self.set_network_rate_limit(0).await?;

        let owner = coldkey.public_key().to_account_id();
        let owned_before = self.subnets_owned_by(&owner).await?;
        let total_before = self.ledger().read_u64(&StorageKey::TotalNetworks).await?;
        self.submit(
            Call::RegisterNetwork {
                hotkey: hotkey.clone(),
            },
            coldkey,
        )
        .await?;
        let total_after = self.ledger().read_u64(&StorageKey::TotalNetworks).await?;

        ensure!(
            total_after > total_before,
            AssertionSnafu {
                what: StorageKey::TotalNetworks.to_string(),
                expected: format!("more than {total_before}"),
                actual: total_after.to_string(),
            }
        );

        let candidates: Vec<NetUid> = self
            .subnets_owned_by(&owner)
            .await?
            .difference(&owned_before)
            .copied()
            .collect();

        ensure!(
            !candidates.is_empty(),
            AssertionSnafu {
                what: "SubtensorModule.SubnetOwner(..)",
                expected: format!("a new subnet owned by {owner}"),
                actual: format!("only {owned_before:?}"),
            }
        );

        info!(
            "🆕 Registered subnet candidates {:?} (TotalNetworks {} -> {})",
            candidates, total_before, total_after
        );
        Ok(NetworkRegistration {
            total_before,
            total_after,
            candidates,
        })
    }

    /// Netuids whose `SubnetOwner` is `owner`.
    pub async fn subnets_owned_by(&self, owner: &AccountId32) -> Result<BTreeSet<NetUid>> {
        Ok(self
            .ledger()
            .subnet_owners()
            .await?
            .into_iter()
            .filter(|(_, coldkey)| coldkey == owner)
            .map(|(netuid, _)| netuid)
            .collect())
    }

    /// Activates emissions on `netuid`, signed by the subnet `owner`.
    ///
    /// The ledger refuses `start_call` until `DurationOfStartCall` blocks have passed since
    /// the subnet was registered, so this waits for the block height first. The wait is
    /// bounded by the configured poll timeout. A subnet that has already started is left
    /// alone.
    pub async fn start_call(&self, netuid: NetUid, owner: &Keypair) -> Result<()> {
        let first_emission = StorageKey::FirstEmissionBlockNumber(netuid);
        if let Some(block) = self.ledger().read_optional_u64(&first_emission).await? {
            debug!("⏭️ Subnet {netuid} already emits since block {block}, skipping");
            return Ok(());
        }

        let registered_at = self
            .ledger()
            .read_u64(&StorageKey::NetworkRegisteredAt(netuid))
            .await?;
        let duration = self
            .ledger()
            .constant(ConstantKey::DurationOfStartCall)
            .await?;
        let ready_after = registered_at.saturating_add(duration);

        let ledger = self.ledger();
        wait_until(
            &self.poll,
            &format!("block {ready_after} passed for start_call on subnet {netuid}"),
            || async move {
                let current = ledger.block_number().await?;
                Ok::<bool, LedgerError>(current > ready_after)
            },
        )
        .await?;

        self.submit(Call::StartCall { netuid }, owner).await?;

        let after = self.ledger().read(&first_emission).await?;
        ensure!(
            after.is_some(),
            AssertionSnafu {
                what: first_emission.to_string(),
                expected: "a block number",
                actual: describe(after.as_ref()),
            }
        );
        Ok(())
    }

    /// Sets the number of blocks required between two network registrations.
    pub async fn set_network_rate_limit(&self, rate_limit: u64) -> Result<()> {
        self.sudo_set(
            StorageKey::NetworkRateLimit,
            rate_limit,
            Call::SudoSetNetworkRateLimit { rate_limit },
        )
        .await
    }

    /// Enables or disables subtoken trading on `netuid`.
    pub async fn set_subtoken_enabled(&self, netuid: NetUid, subtoken_enabled: bool) -> Result<()> {
        self.sudo_set(
            StorageKey::SubtokenEnabled(netuid),
            subtoken_enabled,
            Call::SudoSetSubtokenEnabled {
                netuid,
                subtoken_enabled,
            },
        )
        .await
    }
}
