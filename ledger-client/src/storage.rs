//! Typed names for the on-chain values the fixtures observe.
use std::fmt;

use subxt::dynamic::Value;
use subxt::utils::AccountId32;

use crate::call::{LeaseId, NetUid};
use crate::error::{Error, Result};

/// A storage entry, including its map keys.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum StorageKey {
    /// `SubtensorModule.TotalNetworks`
    TotalNetworks,
    /// `SubtensorModule.NetworkRateLimit`
    NetworkRateLimit,
    /// `SubtensorModule.NetworkRegisteredAt(netuid)`
    NetworkRegisteredAt(NetUid),
    /// `SubtensorModule.FirstEmissionBlockNumber(netuid)`
    FirstEmissionBlockNumber(NetUid),
    /// `SubtensorModule.SubnetOwner(netuid)`
    SubnetOwner(NetUid),
    /// `SubtensorModule.SubnetworkN(netuid)`
    SubnetworkN(NetUid),
    /// `SubtensorModule.Uids(netuid, hotkey)`
    Uids(NetUid, AccountId32),
    /// `SubtensorModule.Owner(hotkey)`
    Owner(AccountId32),
    /// `SubtensorModule.TotalHotkeyAlpha(hotkey, netuid)`
    TotalHotkeyAlpha(AccountId32, NetUid),
    /// `SubtensorModule.Weights(netuid, uid)`
    Weights(NetUid, u16),
    /// `SubtensorModule.CommitRevealWeightsEnabled(netuid)`
    CommitRevealWeightsEnabled(NetUid),
    /// `SubtensorModule.WeightsSetRateLimit(netuid)`
    WeightsSetRateLimit(NetUid),
    /// `SubtensorModule.Tempo(netuid)`
    Tempo(NetUid),
    /// `SubtensorModule.RevealPeriodEpochs(netuid)`
    RevealPeriodEpochs(NetUid),
    /// `SubtensorModule.TxRateLimit`
    TxRateLimit,
    /// `SubtensorModule.MaxAllowedValidators(netuid)`
    MaxAllowedValidators(NetUid),
    /// `SubtensorModule.SubnetOwnerCut`
    SubnetOwnerCut,
    /// `SubtensorModule.ActivityCutoff(netuid)`
    ActivityCutoff(NetUid),
    /// `SubtensorModule.MaxAllowedUids(netuid)`
    MaxAllowedUids(NetUid),
    /// `SubtensorModule.MinDelegateTake`
    MinDelegateTake,
    /// `SubtensorModule.SubtokenEnabled(netuid)`
    SubtokenEnabled(NetUid),
    /// `SubtensorModule.StakeThreshold`
    StakeThreshold,
    /// `SubtensorModule.SubnetLeases(lease_id)`
    SubnetLeases(LeaseId),
    /// `SubtensorModule.SubnetUidToLeaseId(netuid)`
    SubnetUidToLeaseId(NetUid),
    /// `EVMChainId.ChainId`
    ChainId,
    /// `EVM.DisableWhitelistCheck`
    DisableWhitelistCheck,
    /// `System.Account(who).data.free`
    FreeBalance(AccountId32),
}

/// The shape a storage entry decodes into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    /// Decodes into [`Reading::Bool`].
    Bool,
    /// Decodes into [`Reading::Number`].
    Number,
    /// Decodes into [`Reading::Account`].
    Account,
    /// Decodes into [`Reading::Weights`].
    Weights,
    /// `System.Account`, reduced to the free balance.
    AccountData,
    /// `SubnetLease`, reduced to a [`Lease`].
    Lease,
}

impl StorageKey {
    /// Pallet owning the entry.
    pub fn pallet(&self) -> &'static str {
        match self {
            StorageKey::ChainId => "EVMChainId",
            StorageKey::DisableWhitelistCheck => "EVM",
            StorageKey::FreeBalance(_) => "System",
            _ => "SubtensorModule",
        }
    }

    /// Entry name within the pallet.
    pub fn entry(&self) -> &'static str {
        match self {
            StorageKey::TotalNetworks => "TotalNetworks",
            StorageKey::NetworkRateLimit => "NetworkRateLimit",
            StorageKey::NetworkRegisteredAt(_) => "NetworkRegisteredAt",
            StorageKey::FirstEmissionBlockNumber(_) => "FirstEmissionBlockNumber",
            StorageKey::SubnetOwner(_) => "SubnetOwner",
            StorageKey::SubnetworkN(_) => "SubnetworkN",
            StorageKey::Uids(..) => "Uids",
            StorageKey::Owner(_) => "Owner",
            StorageKey::TotalHotkeyAlpha(..) => "TotalHotkeyAlpha",
            StorageKey::Weights(..) => "Weights",
            StorageKey::CommitRevealWeightsEnabled(_) => "CommitRevealWeightsEnabled",
            StorageKey::WeightsSetRateLimit(_) => "WeightsSetRateLimit",
            StorageKey::Tempo(_) => "Tempo",
            StorageKey::RevealPeriodEpochs(_) => "RevealPeriodEpochs",
            StorageKey::TxRateLimit => "TxRateLimit",
            StorageKey::MaxAllowedValidators(_) => "MaxAllowedValidators",
            StorageKey::SubnetOwnerCut => "SubnetOwnerCut",
            StorageKey::ActivityCutoff(_) => "ActivityCutoff",
            StorageKey::MaxAllowedUids(_) => "MaxAllowedUids",
            StorageKey::MinDelegateTake => "MinDelegateTake",
            StorageKey::SubtokenEnabled(_) => "SubtokenEnabled",
            StorageKey::StakeThreshold => "StakeThreshold",
            StorageKey::SubnetLeases(_) => "SubnetLeases",
            StorageKey::SubnetUidToLeaseId(_) => "SubnetUidToLeaseId",
            StorageKey::ChainId => "ChainId",
            StorageKey::DisableWhitelistCheck => "DisableWhitelistCheck",
            StorageKey::FreeBalance(_) => "Account",
        }
    }

    /// Map keys as scale values, in declaration order.
    pub fn keys(&self) -> Vec<Value> {
        match self {
            StorageKey::NetworkRegisteredAt(netuid)
            | StorageKey::FirstEmissionBlockNumber(netuid)
            | StorageKey::SubnetOwner(netuid)
            | StorageKey::SubnetworkN(netuid)
            | StorageKey::CommitRevealWeightsEnabled(netuid)
            | StorageKey::WeightsSetRateLimit(netuid)
            | StorageKey::Tempo(netuid)
            | StorageKey::RevealPeriodEpochs(netuid)
            | StorageKey::MaxAllowedValidators(netuid)
            | StorageKey::ActivityCutoff(netuid)
            | StorageKey::MaxAllowedUids(netuid)
            | StorageKey::SubtokenEnabled(netuid)
            | StorageKey::SubnetUidToLeaseId(netuid) => vec![Value::u128(u128::from(*netuid))],
            StorageKey::SubnetLeases(lease_id) => vec![Value::u128(u128::from(*lease_id))],
            StorageKey::Uids(netuid, hotkey) => vec![
                Value::u128(u128::from(*netuid)),
                Value::from_bytes(hotkey.0),
            ],
            StorageKey::Owner(account) | StorageKey::FreeBalance(account) => {
                vec![Value::from_bytes(account.0)]
            }
            StorageKey::TotalHotkeyAlpha(hotkey, netuid) => vec![
                Value::from_bytes(hotkey.0),
                Value::u128(u128::from(*netuid)),
            ],
            StorageKey::Weights(netuid, uid) => vec![
                Value::u128(u128::from(*netuid)),
                Value::u128(u128::from(*uid)),
            ],
            StorageKey::TotalNetworks
            | StorageKey::NetworkRateLimit
            | StorageKey::TxRateLimit
            | StorageKey::SubnetOwnerCut
            | StorageKey::MinDelegateTake
            | StorageKey::StakeThreshold
            | StorageKey::ChainId
            | StorageKey::DisableWhitelistCheck => Vec::new(),
        }
    }

    /// How the stored value decodes.
    pub fn kind(&self) -> ValueKind {
        match self {
            StorageKey::CommitRevealWeightsEnabled(_)
            | StorageKey::SubtokenEnabled(_)
            | StorageKey::DisableWhitelistCheck => ValueKind::Bool,
            StorageKey::SubnetOwner(_) | StorageKey::Owner(_) => ValueKind::Account,
            StorageKey::Weights(..) => ValueKind::Weights,
            StorageKey::FreeBalance(_) => ValueKind::AccountData,
            StorageKey::SubnetLeases(_) => ValueKind::Lease,
            _ => ValueKind::Number,
        }
    }

    /// Whether an absent entry reads as its type default.
    ///
    /// `OptionQuery` entries, and entries whose default is meaningless to the fixtures
    /// (a zeroed account id), report `None` instead.
    pub fn has_default(&self) -> bool {
        !matches!(
            self,
            StorageKey::Uids(..)
                | StorageKey::FirstEmissionBlockNumber(_)
                | StorageKey::Owner(_)
                | StorageKey::SubnetOwner(_)
                | StorageKey::SubnetLeases(_)
                | StorageKey::SubnetUidToLeaseId(_)
        )
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.pallet(), self.entry())?;
        match self {
            StorageKey::Uids(netuid, hotkey) => write!(f, "({netuid}, {hotkey})"),
            StorageKey::TotalHotkeyAlpha(hotkey, netuid) => write!(f, "({hotkey}, {netuid})"),
            StorageKey::Weights(netuid, uid) => write!(f, "({netuid}, {uid})"),
            StorageKey::Owner(account) | StorageKey::FreeBalance(account) => {
                write!(f, "({account})")
            }
            StorageKey::NetworkRegisteredAt(netuid)
            | StorageKey::FirstEmissionBlockNumber(netuid)
            | StorageKey::SubnetOwner(netuid)
            | StorageKey::SubnetworkN(netuid)
            | StorageKey::CommitRevealWeightsEnabled(netuid)
            | StorageKey::WeightsSetRateLimit(netuid)
            | StorageKey::Tempo(netuid)
            | StorageKey::RevealPeriodEpochs(netuid)
            | StorageKey::MaxAllowedValidators(netuid)
            | StorageKey::ActivityCutoff(netuid)
            | StorageKey::MaxAllowedUids(netuid)
            | StorageKey::SubtokenEnabled(netuid)
            | StorageKey::SubnetUidToLeaseId(netuid) => write!(f, "({netuid})"),
            StorageKey::SubnetLeases(lease_id) => write!(f, "({lease_id})"),
            _ => Ok(()),
        }
    }
}

/// A runtime constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstantKey {
    /// `SubtensorModule.DurationOfStartCall`: blocks between registration and `start_call`.
    DurationOfStartCall,
}

impl ConstantKey {
    /// Pallet owning the constant.
    pub fn pallet(&self) -> &'static str {
        "SubtensorModule"
    }

    /// Constant name within the pallet.
    pub fn name(&self) -> &'static str {
        match self {
            ConstantKey::DurationOfStartCall => "DurationOfStartCall",
        }
    }
}

impl fmt::Display for ConstantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.pallet(), self.name())
    }
}

/// A decoded on-chain value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reading {
    /// A flag.
    Bool(bool),
    /// Any unsigned integer, widened.
    Number(u128),
    /// An account id.
    Account(AccountId32),
    /// Sparse `(uid, weight)` pairs.
    Weights(Vec<(u16, u16)>),
    /// A subnet lease.
    Lease(Lease),
}

/// The parts of a subnet lease that decide who may end it, and when.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lease {
    /// Account that operates the subnet and owns it once the lease ends.
    pub beneficiary: AccountId32,
    /// The leased subnet.
    pub netuid: NetUid,
    /// First block at which the lease can be terminated. Perpetual leases have none.
    pub end_block: Option<u64>,
}

impl Reading {
    /// The value as a flag.
    pub fn as_bool(&self, key: &StorageKey) -> Result<bool> {
        match self {
            Reading::Bool(b) => Ok(*b),
            _ => Err(unexpected(key, "a bool")),
        }
    }

    /// The value as a `u64`.
    pub fn as_u64(&self, key: &StorageKey) -> Result<u64> {
        match self {
            Reading::Number(n) => u64::try_from(*n).map_err(|_| unexpected(key, "a u64")),
            _ => Err(unexpected(key, "a number")),
        }
    }

    /// The value as an account id.
    pub fn as_account(&self, key: &StorageKey) -> Result<AccountId32> {
        match self {
            Reading::Account(a) => Ok(a.clone()),
            _ => Err(unexpected(key, "an account id")),
        }
    }

    /// The value as weight pairs.
    pub fn as_weights(&self, key: &StorageKey) -> Result<Vec<(u16, u16)>> {
        match self {
            Reading::Weights(w) => Ok(w.clone()),
            _ => Err(unexpected(key, "weights")),
        }
    }

    /// The value as a lease.
    pub fn as_lease(&self, key: &StorageKey) -> Result<Lease> {
        match self {
            Reading::Lease(lease) => Ok(lease.clone()),
            _ => Err(unexpected(key, "a subnet lease")),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Bool(b) => write!(f, "{b}"),
            Reading::Number(n) => write!(f, "{n}"),
            Reading::Account(a) => write!(f, "{a}"),
            Reading::Weights(w) => write!(f, "{w:?}"),
            Reading::Lease(lease) => write!(
                f,
                "lease of netuid {} for {}",
                lease.netuid, lease.beneficiary
            ),
        }
    }
}

impl From<bool> for Reading {
    fn from(b: bool) -> Self {
        Reading::Bool(b)
    }
}

impl From<u64> for Reading {
    fn from(n: u64) -> Self {
        Reading::Number(n.into())
    }
}

impl From<u16> for Reading {
    fn from(n: u16) -> Self {
        Reading::Number(n.into())
    }
}

impl From<AccountId32> for Reading {
    fn from(a: AccountId32) -> Self {
        Reading::Account(a)
    }
}

/// Builds an [`Error::UnexpectedValue`].
fn unexpected(key: &StorageKey, expected: &'static str) -> Error {
    Error::UnexpectedValue {
        key: key.to_string(),
        expected,
    }
}
