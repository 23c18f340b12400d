use ledger_client::call::{Call, NetUid, ROOT_NETUID};
use ledger_client::ledger::Ledger;
use ledger_client::storage::StorageKey;
use log::debug;
use snafu::{ensure, OptionExt};
use subxt::utils::AccountId32;
use subxt_signer::sr25519::Keypair;

use crate::error::{AssertionSnafu, Result};
use crate::{describe, SubnetFixtures};

impl<L: Ledger> SubnetFixtures<L> {
    /// Registers `hotkey` on `netuid` by burning registration cost from `coldkey`.
    ///
    /// A hotkey that already holds a uid on the subnet is left alone.
    pub async fn burned_register(
        &self,
        netuid: NetUid,
        hotkey: &AccountId32,
        coldkey: &Keypair,
    ) -> Result<()> {
        let uid_key = StorageKey::Uids(netuid, hotkey.clone());
        if let Some(uid) = self.ledger().read_optional_u64(&uid_key).await? {
            debug!("⏭️ {hotkey} already holds uid {uid} on subnet {netuid}, skipping");
            return Ok(());
        }

        let count_key = StorageKey::SubnetworkN(netuid);
        let before = self.ledger().read_u64(&count_key).await?;
        self.submit(
            Call::BurnedRegister {
                netuid,
                hotkey: hotkey.clone(),
            },
            coldkey,
        )
        .await?;

        self.assert_reads(&count_key, &(before + 1).into()).await
    }

    /// Registers `hotkey` on the root network, paid for by `coldkey`.
    pub async fn root_register(&self, hotkey: &AccountId32, coldkey: &Keypair) -> Result<()> {
        let uid_key = StorageKey::Uids(ROOT_NETUID, hotkey.clone());
        if self.ledger().read(&uid_key).await?.is_some() {
            debug!("⏭️ {hotkey} is already on the root network, skipping");
            return Ok(());
        }

        self.submit(
            Call::RootRegister {
                hotkey: hotkey.clone(),
            },
            coldkey,
        )
        .await?;

        let after = self.ledger().read(&uid_key).await?;
        ensure!(
            after.is_some(),
            AssertionSnafu {
                what: uid_key.to_string(),
                expected: "a uid",
                actual: describe(after.as_ref()),
            }
        );
        Ok(())
    }

    /// Sets the weights `hotkey` assigns on `netuid`.
    ///
    /// The ledger normalizes weights before storing them, so the read-back only checks
    /// that every destination given a non-zero weight appears in the stored row.
    pub async fn set_weights(
        &self,
        netuid: NetUid,
        dests: Vec<u16>,
        weights: Vec<u16>,
        version_key: u64,
        hotkey: &Keypair,
    ) -> Result<()> {
        let targeted: Vec<u16> = dests
            .iter()
            .zip(&weights)
            .filter(|(_, weight)| **weight > 0)
            .map(|(dest, _)| *dest)
            .collect();

        self.submit(
            Call::SetWeights {
                netuid,
                dests,
                weights,
                version_key,
            },
            hotkey,
        )
        .await?;

        let uid_key = StorageKey::Uids(netuid, hotkey.public_key().to_account_id());
        let uid = self
            .ledger()
            .read_optional_u64(&uid_key)
            .await?
            .context(AssertionSnafu {
                what: uid_key.to_string(),
                expected: "a uid",
                actual: "nothing",
            })?;
        let uid = u16::try_from(uid).ok().context(AssertionSnafu {
            what: uid_key.to_string(),
            expected: "a u16 uid",
            actual: uid.to_string(),
        })?;

        let weights_key = StorageKey::Weights(netuid, uid);
        let row = match self.ledger().read(&weights_key).await? {
            Some(reading) => reading.as_weights(&weights_key)?,
            None => Vec::new(),
        };
        let stored: Vec<u16> = row.iter().map(|(dest, _)| *dest).collect();
        ensure!(
            targeted.iter().all(|dest| stored.contains(dest)),
            AssertionSnafu {
                what: weights_key.to_string(),
                expected: format!("weights on {targeted:?}"),
                actual: format!("{row:?}"),
            }
        );
        Ok(())
    }
}
