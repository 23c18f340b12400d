use ledger_client::call::{Call, NetUid};
use ledger_client::ledger::Ledger;
use ledger_client::storage::StorageKey;

use crate::error::Result;
use crate::SubnetFixtures;

impl<L: Ledger> SubnetFixtures<L> {
    /// Turns commit-reveal weight submission on or off for `netuid`.
    pub async fn set_commit_reveal_weights_enabled(
        &self,
        netuid: NetUid,
        enabled: bool,
    ) -> Result<()> {
        self.sudo_set(
            StorageKey::CommitRevealWeightsEnabled(netuid),
            enabled,
            Call::SudoSetCommitRevealWeightsEnabled { netuid, enabled },
        )
        .await
    }

    /// Sets the minimum number of blocks between two `set_weights` from one hotkey.
    pub async fn set_weights_set_rate_limit(
        &self,
        netuid: NetUid,
        weights_set_rate_limit: u64,
    ) -> Result<()> {
        self.sudo_set(
            StorageKey::WeightsSetRateLimit(netuid),
            weights_set_rate_limit,
            Call::SudoSetWeightsSetRateLimit {
                netuid,
                weights_set_rate_limit,
            },
        )
        .await
    }

    /// Sets the epoch length of `netuid`, in blocks.
    pub async fn set_tempo(&self, netuid: NetUid, tempo: u16) -> Result<()> {
        self.sudo_set(
            StorageKey::Tempo(netuid),
            tempo,
            Call::SudoSetTempo { netuid, tempo },
        )
        .await
    }

    /// Sets how many epochs commits stay hidden before they can be revealed.
    ///
    /// The runtime stores this as `RevealPeriodEpochs`.
    pub async fn set_commit_reveal_weights_interval(
        &self,
        netuid: NetUid,
        interval: u64,
    ) -> Result<()> {
        self.sudo_set(
            StorageKey::RevealPeriodEpochs(netuid),
            interval,
            Call::SudoSetCommitRevealWeightsInterval { netuid, interval },
        )
        .await
    }

    /// Sets the global per-account transaction rate limit.
    pub async fn set_tx_rate_limit(&self, tx_rate_limit: u64) -> Result<()> {
        self.sudo_set(
            StorageKey::TxRateLimit,
            tx_rate_limit,
            Call::SudoSetTxRateLimit { tx_rate_limit },
        )
        .await
    }

    /// Caps the number of validator permits on `netuid`.
    pub async fn set_max_allowed_validators(
        &self,
        netuid: NetUid,
        max_allowed_validators: u16,
    ) -> Result<()> {
        self.sudo_set(
            StorageKey::MaxAllowedValidators(netuid),
            max_allowed_validators,
            Call::SudoSetMaxAllowedValidators {
                netuid,
                max_allowed_validators,
            },
        )
        .await
    }

    /// Sets the share of emissions paid to subnet owners.
    pub async fn set_subnet_owner_cut(&self, subnet_owner_cut: u16) -> Result<()> {
        self.sudo_set(
            StorageKey::SubnetOwnerCut,
            subnet_owner_cut,
            Call::SudoSetSubnetOwnerCut { subnet_owner_cut },
        )
        .await
    }

    /// Sets how many blocks a neuron may stay inactive on `netuid`.
    pub async fn set_activity_cutoff(&self, netuid: NetUid, activity_cutoff: u16) -> Result<()> {
        self.sudo_set(
            StorageKey::ActivityCutoff(netuid),
            activity_cutoff,
            Call::SudoSetActivityCutoff {
                netuid,
                activity_cutoff,
            },
        )
        .await
    }

    /// Caps the number of uids on `netuid`.
    pub async fn set_max_allowed_uids(&self, netuid: NetUid, max_allowed_uids: u16) -> Result<()> {
        self.sudo_set(
            StorageKey::MaxAllowedUids(netuid),
            max_allowed_uids,
            Call::SudoSetMaxAllowedUids {
                netuid,
                max_allowed_uids,
            },
        )
        .await
    }

    /// Sets the lowest take a delegate may charge.
    pub async fn set_min_delegate_take(&self, take: u16) -> Result<()> {
        self.sudo_set(
            StorageKey::MinDelegateTake,
            take,
            Call::SudoSetMinDelegateTake { take },
        )
        .await
    }
}
