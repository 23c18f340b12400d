//! Typed descriptions of the extrinsics the fixtures submit.
//!
//! A [`Call`] is an immutable value. It is turned into a subxt dynamic payload only at
//! submission time, so the same call can be logged, serialized, wrapped in a privileged
//! envelope or handed to a test ledger without touching chain metadata.
use serde::{Deserialize, Serialize};
use subxt::dynamic::Value;
use subxt::ext::scale_value::Composite;
use subxt::tx::DynamicPayload;
use subxt::utils::AccountId32;

/// Subnet identifier.
pub type NetUid = u16;

/// Netuid of the root network.
pub const ROOT_NETUID: NetUid = 0;

/// Subnet lease identifier.
pub type LeaseId = u32;

/// A state transition to request of the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Call {
    /// `AdminUtils.sudo_set_network_rate_limit`
    SudoSetNetworkRateLimit {
        /// Blocks between network registrations.
        rate_limit: u64,
    },
    /// `AdminUtils.sudo_set_commit_reveal_weights_enabled`
    SudoSetCommitRevealWeightsEnabled {
        /// Target subnet.
        netuid: NetUid,
        /// Whether commit-reveal is required for weights.
        enabled: bool,
    },
    /// `AdminUtils.sudo_set_weights_set_rate_limit`
    SudoSetWeightsSetRateLimit {
        /// Target subnet.
        netuid: NetUid,
        /// Blocks between weight updates.
        weights_set_rate_limit: u64,
    },
    /// `AdminUtils.sudo_set_tempo`
    SudoSetTempo {
        /// Target subnet.
        netuid: NetUid,
        /// Blocks per epoch.
        tempo: u16,
    },
    /// `AdminUtils.sudo_set_commit_reveal_weights_interval`
    SudoSetCommitRevealWeightsInterval {
        /// Target subnet.
        netuid: NetUid,
        /// Reveal period in epochs.
        interval: u64,
    },
    /// `AdminUtils.sudo_set_evm_chain_id`
    SudoSetEvmChainId {
        /// EVM chain id.
        chain_id: u64,
    },
    /// `AdminUtils.sudo_set_tx_rate_limit`
    SudoSetTxRateLimit {
        /// Blocks between rate limited transactions.
        tx_rate_limit: u64,
    },
    /// `AdminUtils.sudo_set_max_allowed_validators`
    SudoSetMaxAllowedValidators {
        /// Target subnet.
        netuid: NetUid,
        /// Validator slots.
        max_allowed_validators: u16,
    },
    /// `AdminUtils.sudo_set_subnet_owner_cut`
    SudoSetSubnetOwnerCut {
        /// Owner share of emission, normalized to `u16::MAX`.
        subnet_owner_cut: u16,
    },
    /// `AdminUtils.sudo_set_activity_cutoff`
    SudoSetActivityCutoff {
        /// Target subnet.
        netuid: NetUid,
        /// Blocks of inactivity before a validator loses its permit.
        activity_cutoff: u16,
    },
    /// `AdminUtils.sudo_set_max_allowed_uids`
    SudoSetMaxAllowedUids {
        /// Target subnet.
        netuid: NetUid,
        /// Neuron slots.
        max_allowed_uids: u16,
    },
    /// `AdminUtils.sudo_set_min_delegate_take`
    SudoSetMinDelegateTake {
        /// Minimum delegate take, normalized to `u16::MAX`.
        take: u16,
    },
    /// `AdminUtils.sudo_set_subtoken_enabled`
    SudoSetSubtokenEnabled {
        /// Target subnet.
        netuid: NetUid,
        /// Whether the subnet token can be traded.
        subtoken_enabled: bool,
    },
    /// `AdminUtils.sudo_set_stake_threshold`
    SudoSetStakeThreshold {
        /// Minimum stake for a validator permit.
        min_stake: u64,
    },
    /// `EVM.disable_whitelist`
    DisableWhitelist {
        /// Whether the contract deployment whitelist is bypassed.
        disabled: bool,
    },
    /// `Balances.force_set_balance`
    ForceSetBalance {
        /// Account to fund.
        who: AccountId32,
        /// New free balance in rao.
        new_free: u64,
    },
    /// `SubtensorModule.register_network`
    RegisterNetwork {
        /// Owner hotkey of the new subnet.
        hotkey: AccountId32,
    },
    /// `SubtensorModule.burned_register`
    BurnedRegister {
        /// Target subnet.
        netuid: NetUid,
        /// Hotkey to register.
        hotkey: AccountId32,
    },
    /// `SubtensorModule.root_register`
    RootRegister {
        /// Hotkey to register on the root network.
        hotkey: AccountId32,
    },
    /// `SubtensorModule.become_delegate`
    BecomeDelegate {
        /// Hotkey to open for delegation.
        hotkey: AccountId32,
    },
    /// `SubtensorModule.add_stake`
    AddStake {
        /// Hotkey receiving stake.
        hotkey: AccountId32,
        /// Target subnet.
        netuid: NetUid,
        /// Amount in rao.
        amount_staked: u64,
    },
    /// `SubtensorModule.remove_stake`
    RemoveStake {
        /// Hotkey losing stake.
        hotkey: AccountId32,
        /// Target subnet.
        netuid: NetUid,
        /// Amount of alpha to unstake.
        amount_unstaked: u64,
    },
    /// `SubtensorModule.set_weights`
    SetWeights {
        /// Target subnet.
        netuid: NetUid,
        /// Destination uids.
        dests: Vec<u16>,
        /// Weight per destination.
        weights: Vec<u16>,
        /// Weights version key of the subnet.
        version_key: u64,
    },
    /// `SubtensorModule.start_call`
    StartCall {
        /// Subnet to activate.
        netuid: NetUid,
    },
    /// `SubtensorModule.swap_coldkey`
    SwapColdkey {
        /// Coldkey being retired.
        old_coldkey: AccountId32,
        /// Coldkey taking over.
        new_coldkey: AccountId32,
        /// Cost charged for the swap in rao.
        swap_cost: u64,
    },
    /// `SubtensorModule.swap_hotkey`
    SwapHotkey {
        /// Hotkey being retired.
        hotkey: AccountId32,
        /// Hotkey taking over.
        new_hotkey: AccountId32,
        /// Restrict the swap to one subnet.
        netuid: Option<NetUid>,
    },
    /// `SubtensorModule.recycle_alpha`
    RecycleAlpha {
        /// Hotkey holding the alpha.
        hotkey: AccountId32,
        /// Amount of alpha.
        amount: u64,
        /// Target subnet.
        netuid: NetUid,
    },
    /// `SubtensorModule.burn_alpha`
    BurnAlpha {
        /// Hotkey holding the alpha.
        hotkey: AccountId32,
        /// Amount of alpha.
        amount: u64,
        /// Target subnet.
        netuid: NetUid,
    },
    /// `SubtensorModule.register_leased_network`
    RegisterLeasedNetwork {
        /// Percentage of the subnet's emissions paid to the crowdloan contributors.
        emissions_share: u8,
        /// Block from which the beneficiary may end the lease. `None` for a perpetual lease.
        end_block: Option<u64>,
    },
    /// `SubtensorModule.terminate_lease`
    TerminateLease {
        /// Lease to end.
        lease_id: LeaseId,
        /// Beneficiary hotkey that becomes the subnet owner hotkey.
        hotkey: AccountId32,
    },
    /// `Sudo.sudo`: execute `call` with root authority.
    Sudo {
        /// The wrapped call.
        call: Box<Call>,
    },
    /// `Proxy.proxy`: execute `call` on behalf of `real`.
    Proxy {
        /// Account the signer is a proxy for.
        real: AccountId32,
        /// The relayed call.
        call: Box<Call>,
    },
}

impl Call {
    /// Wraps `call` in the privileged envelope.
    pub fn sudo(call: Call) -> Self {
        Call::Sudo {
            call: Box::new(call),
        }
    }

    /// Wraps `call` so that it runs on behalf of `real`.
    pub fn proxy(real: AccountId32, call: Call) -> Self {
        Call::Proxy {
            real,
            call: Box::new(call),
        }
    }

    /// The call inside any privileged or proxy envelopes.
    pub fn innermost(&self) -> &Call {
        match self {
            Call::Sudo { call } | Call::Proxy { call, .. } => call.innermost(),
            other => other,
        }
    }

    /// Name of the pallet that dispatches this call.
    pub fn pallet(&self) -> &'static str {
        match self {
            Call::SudoSetNetworkRateLimit { .. }
            | Call::SudoSetCommitRevealWeightsEnabled { .. }
            | Call::SudoSetWeightsSetRateLimit { .. }
            | Call::SudoSetTempo { .. }
            | Call::SudoSetCommitRevealWeightsInterval { .. }
            | Call::SudoSetEvmChainId { .. }
            | Call::SudoSetTxRateLimit { .. }
            | Call::SudoSetMaxAllowedValidators { .. }
            | Call::SudoSetSubnetOwnerCut { .. }
            | Call::SudoSetActivityCutoff { .. }
            | Call::SudoSetMaxAllowedUids { .. }
            | Call::SudoSetMinDelegateTake { .. }
            | Call::SudoSetSubtokenEnabled { .. }
            | Call::SudoSetStakeThreshold { .. } => "AdminUtils",
            Call::DisableWhitelist { .. } => "EVM",
            Call::ForceSetBalance { .. } => "Balances",
            Call::RegisterNetwork { .. }
            | Call::BurnedRegister { .. }
            | Call::RootRegister { .. }
            | Call::BecomeDelegate { .. }
            | Call::AddStake { .. }
            | Call::RemoveStake { .. }
            | Call::SetWeights { .. }
            | Call::StartCall { .. }
            | Call::SwapColdkey { .. }
            | Call::SwapHotkey { .. }
            | Call::RecycleAlpha { .. }
            | Call::BurnAlpha { .. }
            | Call::RegisterLeasedNetwork { .. }
            | Call::TerminateLease { .. } => "SubtensorModule",
            Call::Sudo { .. } => "Sudo",
            Call::Proxy { .. } => "Proxy",
        }
    }

    /// Name of the call within its pallet.
    pub fn name(&self) -> &'static str {
        match self {
            Call::SudoSetNetworkRateLimit { .. } => "sudo_set_network_rate_limit",
            Call::SudoSetCommitRevealWeightsEnabled { .. } => {
                "sudo_set_commit_reveal_weights_enabled"
            }
            Call::SudoSetWeightsSetRateLimit { .. } => "sudo_set_weights_set_rate_limit",
            Call::SudoSetTempo { .. } => "sudo_set_tempo",
            Call::SudoSetCommitRevealWeightsInterval { .. } => {
                "sudo_set_commit_reveal_weights_interval"
            }
            Call::SudoSetEvmChainId { .. } => "sudo_set_evm_chain_id",
            Call::SudoSetTxRateLimit { .. } => "sudo_set_tx_rate_limit",
            Call::SudoSetMaxAllowedValidators { .. } => "sudo_set_max_allowed_validators",
            Call::SudoSetSubnetOwnerCut { .. } => "sudo_set_subnet_owner_cut",
            Call::SudoSetActivityCutoff { .. } => "sudo_set_activity_cutoff",
            Call::SudoSetMaxAllowedUids { .. } => "sudo_set_max_allowed_uids",
            Call::SudoSetMinDelegateTake { .. } => "sudo_set_min_delegate_take",
            Call::SudoSetSubtokenEnabled { .. } => "sudo_set_subtoken_enabled",
            Call::SudoSetStakeThreshold { .. } => "sudo_set_stake_threshold",
            Call::DisableWhitelist { .. } => "disable_whitelist",
            Call::ForceSetBalance { .. } => "force_set_balance",
            Call::RegisterNetwork { .. } => "register_network",
            Call::BurnedRegister { .. } => "burned_register",
            Call::RootRegister { .. } => "root_register",
            Call::BecomeDelegate { .. } => "become_delegate",
            Call::AddStake { .. } => "add_stake",
            Call::RemoveStake { .. } => "remove_stake",
            Call::SetWeights { .. } => "set_weights",
            Call::StartCall { .. } => "start_call",
            Call::SwapColdkey { .. } => "swap_coldkey",
            Call::SwapHotkey { .. } => "swap_hotkey",
            Call::RecycleAlpha { .. } => "recycle_alpha",
            Call::BurnAlpha { .. } => "burn_alpha",
            Call::RegisterLeasedNetwork { .. } => "register_leased_network",
            Call::TerminateLease { .. } => "terminate_lease",
            Call::Sudo { .. } => "sudo",
            Call::Proxy { .. } => "proxy",
        }
    }

    /// `Pallet.call` label used in logs and errors.
    pub fn label(&self) -> String {
        match self {
            Call::Sudo { call } => format!("Sudo.sudo({})", call.label()),
            Call::Proxy { call, .. } => format!("Proxy.proxy({})", call.label()),
            other => format!("{}.{}", other.pallet(), other.name()),
        }
    }

    /// Named call arguments as scale values.
    fn fields(&self) -> Vec<(&'static str, Value)> {
        match self {
            Call::SudoSetNetworkRateLimit { rate_limit } => vec![("rate_limit", u(*rate_limit))],
            Call::SudoSetCommitRevealWeightsEnabled { netuid, enabled } => vec![
                ("netuid", u(*netuid)),
                ("enabled", Value::bool(*enabled)),
            ],
            Call::SudoSetWeightsSetRateLimit {
                netuid,
                weights_set_rate_limit,
            } => vec![
                ("netuid", u(*netuid)),
                ("weights_set_rate_limit", u(*weights_set_rate_limit)),
            ],
            Call::SudoSetTempo { netuid, tempo } => {
                vec![("netuid", u(*netuid)), ("tempo", u(*tempo))]
            }
            Call::SudoSetCommitRevealWeightsInterval { netuid, interval } => {
                vec![("netuid", u(*netuid)), ("interval", u(*interval))]
            }
            Call::SudoSetEvmChainId { chain_id } => vec![("chain_id", u(*chain_id))],
            Call::SudoSetTxRateLimit { tx_rate_limit } => {
                vec![("tx_rate_limit", u(*tx_rate_limit))]
            }
            Call::SudoSetMaxAllowedValidators {
                netuid,
                max_allowed_validators,
            } => vec![
                ("netuid", u(*netuid)),
                ("max_allowed_validators", u(*max_allowed_validators)),
            ],
            Call::SudoSetSubnetOwnerCut { subnet_owner_cut } => {
                vec![("subnet_owner_cut", u(*subnet_owner_cut))]
            }
            Call::SudoSetActivityCutoff {
                netuid,
                activity_cutoff,
            } => vec![
                ("netuid", u(*netuid)),
                ("activity_cutoff", u(*activity_cutoff)),
            ],
            Call::SudoSetMaxAllowedUids {
                netuid,
                max_allowed_uids,
            } => vec![
                ("netuid", u(*netuid)),
                ("max_allowed_uids", u(*max_allowed_uids)),
            ],
            Call::SudoSetMinDelegateTake { take } => vec![("take", u(*take))],
            Call::SudoSetSubtokenEnabled {
                netuid,
                subtoken_enabled,
            } => vec![
                ("netuid", u(*netuid)),
                ("subtoken_enabled", Value::bool(*subtoken_enabled)),
            ],
            Call::SudoSetStakeThreshold { min_stake } => vec![("min_stake", u(*min_stake))],
            Call::DisableWhitelist { disabled } => vec![("disabled", Value::bool(*disabled))],
            Call::ForceSetBalance { who, new_free } => vec![
                ("who", multi_address(who)),
                ("new_free", u(*new_free)),
            ],
            Call::RegisterNetwork { hotkey }
            | Call::RootRegister { hotkey }
            | Call::BecomeDelegate { hotkey } => vec![("hotkey", account(hotkey))],
            Call::BurnedRegister { netuid, hotkey } => {
                vec![("netuid", u(*netuid)), ("hotkey", account(hotkey))]
            }
            Call::AddStake {
                hotkey,
                netuid,
                amount_staked,
            } => vec![
                ("hotkey", account(hotkey)),
                ("netuid", u(*netuid)),
                ("amount_staked", u(*amount_staked)),
            ],
            Call::RemoveStake {
                hotkey,
                netuid,
                amount_unstaked,
            } => vec![
                ("hotkey", account(hotkey)),
                ("netuid", u(*netuid)),
                ("amount_unstaked", u(*amount_unstaked)),
            ],
            Call::SetWeights {
                netuid,
                dests,
                weights,
                version_key,
            } => vec![
                ("netuid", u(*netuid)),
                ("dests", Value::unnamed_composite(dests.iter().map(|d| u(*d)))),
                (
                    "weights",
                    Value::unnamed_composite(weights.iter().map(|w| u(*w))),
                ),
                ("version_key", u(*version_key)),
            ],
            Call::StartCall { netuid } => vec![("netuid", u(*netuid))],
            Call::SwapColdkey {
                old_coldkey,
                new_coldkey,
                swap_cost,
            } => vec![
                ("old_coldkey", account(old_coldkey)),
                ("new_coldkey", account(new_coldkey)),
                ("swap_cost", u(*swap_cost)),
            ],
            Call::SwapHotkey {
                hotkey,
                new_hotkey,
                netuid,
            } => vec![
                ("hotkey", account(hotkey)),
                ("new_hotkey", account(new_hotkey)),
                ("netuid", option(netuid.map(u))),
            ],
            Call::RecycleAlpha {
                hotkey,
                amount,
                netuid,
            }
            | Call::BurnAlpha {
                hotkey,
                amount,
                netuid,
            } => vec![
                ("hotkey", account(hotkey)),
                ("amount", u(*amount)),
                ("netuid", u(*netuid)),
            ],
            Call::RegisterLeasedNetwork {
                emissions_share,
                end_block,
            } => vec![
                ("emissions_share", u(*emissions_share)),
                ("end_block", option(end_block.map(u))),
            ],
            Call::TerminateLease { lease_id, hotkey } => vec![
                ("lease_id", u(*lease_id)),
                ("hotkey", account(hotkey)),
            ],
            Call::Sudo { call } => vec![("call", call.to_value())],
            Call::Proxy { real, call } => vec![
                ("real", multi_address(real)),
                ("force_proxy_type", option(None)),
                ("call", call.to_value()),
            ],
        }
    }

    /// Builds the dynamic payload that subxt signs and submits.
    pub fn to_payload(&self) -> DynamicPayload {
        subxt::dynamic::tx(
            self.pallet(),
            self.name(),
            Composite::named(self.fields()),
        )
    }

    /// The call as a `RuntimeCall` value, for nesting inside an envelope.
    pub fn to_value(&self) -> Value {
        self.to_payload().into_value()
    }
}

/// Any unsigned integer as a scale value.
fn u(n: impl Into<u128>) -> Value {
    Value::u128(n.into())
}

/// An `AccountId32` as a scale value.
fn account(id: &AccountId32) -> Value {
    Value::from_bytes(id.0)
}

/// `MultiAddress::Id(id)`
fn multi_address(id: &AccountId32) -> Value {
    Value::unnamed_variant("Id", [account(id)])
}

/// An `Option<T>` as a scale value.
fn option(value: Option<Value>) -> Value {
    match value {
        Some(v) => Value::unnamed_variant("Some", [v]),
        None => Value::unnamed_variant("None", Vec::new()),
    }
}
