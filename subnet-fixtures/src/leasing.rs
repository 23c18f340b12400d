use std::collections::BTreeSet;

use ledger_client::call::{Call, LeaseId, NetUid};
use ledger_client::error::Error as LedgerError;
use ledger_client::ledger::Ledger;
use ledger_client::storage::{Lease, StorageKey};
use ledger_client::wait::wait_until;
use log::{debug, info};
use snafu::{ensure, OptionExt};
use subxt::utils::AccountId32;
use subxt_signer::sr25519::Keypair;

use crate::error::{AssertionSnafu, Result};
use crate::{describe, SubnetFixtures};

/// What a `register_leased_network` call left behind.
///
/// Like [`crate::network::NetworkRegistration`], this reports every lease that appeared
/// for the beneficiary rather than guessing which one the call created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaseRegistration {
    /// `TotalNetworks` before the call.
    pub total_before: u64,
    /// `TotalNetworks` after the call.
    pub total_after: u64,
    /// `(lease_id, netuid)` of each new subnet leased to the beneficiary.
    pub candidates: Vec<(LeaseId, NetUid)>,
}

impl<L: Ledger> SubnetFixtures<L> {
    /// Registers a subnet paid for by the crowdloan `beneficiary` is finalizing, leased to
    /// `beneficiary` until `end_block` (or for good when `None`).
    ///
    /// The ledger only accepts the call while the beneficiary's crowdloan is being
    /// finalized. The subnet itself is owned by a coldkey the ledger derives for the lease,
    /// so new leases are found through `SubnetUidToLeaseId` on the netuids that appeared.
    pub async fn register_leased_network(
        &self,
        emissions_share: u8,
        end_block: Option<u64>,
        beneficiary: &Keypair,
    ) -> Result<LeaseRegistration> {
        self.set_network_rate_limit(0).await?;

        let subnets_before: BTreeSet<NetUid> = self
            .ledger()
            .subnet_owners()
            .await?
            .into_iter()
            .map(|(netuid, _)| netuid)
            .collect();
        let total_before = self.ledger().read_u64(&StorageKey::TotalNetworks).await?;
        self.submit(
            Call::RegisterLeasedNetwork {
                emissions_share,
                end_block,
            },
            beneficiary,
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

        let who = beneficiary.public_key().to_account_id();
        let mut candidates = Vec::new();
        for (netuid, _) in self.ledger().subnet_owners().await? {
            if subnets_before.contains(&netuid) {
                continue;
            }
            let Some(lease_id) = self.lease_id_of(netuid).await? else {
                continue;
            };
            match self.lease(lease_id).await? {
                Some(lease) if lease.beneficiary == who && lease.netuid == netuid => {
                    candidates.push((lease_id, netuid));
                }
                _ => {}
            }
        }

        ensure!(
            !candidates.is_empty(),
            AssertionSnafu {
                what: "SubtensorModule.SubnetLeases(..)",
                expected: format!("a new lease for {who}"),
                actual: "no new subnet leased to the beneficiary",
            }
        );

        info!(
            "🆕 Leased subnet candidates {:?} (TotalNetworks {} -> {})",
            candidates, total_before, total_after
        );
        Ok(LeaseRegistration {
            total_before,
            total_after,
            candidates,
        })
    }

    /// Ends the lease on `netuid` and hands the subnet to its `beneficiary`, with `hotkey`
    /// as the new owner hotkey.
    ///
    /// Waits for the lease's end block first, bounded by the configured poll timeout. A
    /// lease that is already gone is left alone as long as the beneficiary owns the subnet.
    pub async fn terminate_lease(
        &self,
        netuid: NetUid,
        hotkey: &AccountId32,
        beneficiary: &Keypair,
    ) -> Result<()> {
        let who = beneficiary.public_key().to_account_id();
        let owner_key = StorageKey::SubnetOwner(netuid);
        let lease_id = self.lease_id_of(netuid).await?.context(AssertionSnafu {
            what: StorageKey::SubnetUidToLeaseId(netuid).to_string(),
            expected: "a lease id",
            actual: "nothing",
        })?;

        let Some(lease) = self.lease(lease_id).await? else {
            debug!("⏭️ Lease {lease_id} on subnet {netuid} already ended, checking the owner");
            return self.assert_reads(&owner_key, &who.into()).await;
        };

        if let Some(end_block) = lease.end_block {
            let ledger = self.ledger();
            wait_until(
                &self.poll,
                &format!("block {end_block} reached for lease {lease_id}"),
                || async move {
                    let current = ledger.block_number().await?;
                    Ok::<bool, LedgerError>(current >= end_block)
                },
            )
            .await?;
        }

        self.submit(
            Call::TerminateLease {
                lease_id,
                hotkey: hotkey.clone(),
            },
            beneficiary,
        )
        .await?;

        let lease_key = StorageKey::SubnetLeases(lease_id);
        let after = self.ledger().read(&lease_key).await?;
        ensure!(
            after.is_none(),
            AssertionSnafu {
                what: lease_key.to_string(),
                expected: "nothing",
                actual: describe(after.as_ref()),
            }
        );
        self.assert_reads(&owner_key, &who.into()).await
    }

    /// The lease with id `lease_id`, if it is still active.
    pub async fn lease(&self, lease_id: LeaseId) -> Result<Option<Lease>> {
        let key = StorageKey::SubnetLeases(lease_id);
        Ok(self
            .ledger()
            .read(&key)
            .await?
            .map(|reading| reading.as_lease(&key))
            .transpose()?)
    }

    /// Id of the lease `netuid` was registered under, if any.
    async fn lease_id_of(&self, netuid: NetUid) -> Result<Option<LeaseId>> {
        let key = StorageKey::SubnetUidToLeaseId(netuid);
        let Some(raw) = self.ledger().read_optional_u64(&key).await? else {
            return Ok(None);
        };
        let lease_id = LeaseId::try_from(raw).map_err(|_| LedgerError::UnexpectedValue {
            key: key.to_string(),
            expected: "a lease id",
        })?;
        Ok(Some(lease_id))
    }
}
