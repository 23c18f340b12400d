//! The ledger boundary: reads, constants, block height and single-attempt submission.
//!
//! [`Ledger`] is the seam between the fixtures and a chain. [`SubxtLedger`] talks to a
//! live node over websocket; tests provide their own in-memory implementations.
use async_trait::async_trait;
use futures::TryStreamExt;
use log::{debug, info};
use snafu::ResultExt;
use subxt::dynamic::{DecodedValueThunk, Value};
use subxt::ext::scale_value::{At, ValueDef};
use subxt::utils::{AccountId32, H256};
use subxt::{OnlineClient, PolkadotConfig};
use subxt_signer::sr25519::Keypair;
use url::Url;

use crate::call::{Call, NetUid};
use crate::client::create_subxt_client;
use crate::error::{ConstantSnafu, Error, LatestBlockSnafu, Result, StorageSnafu};
use crate::storage::{ConstantKey, Lease, Reading, StorageKey, ValueKind};
use crate::tx_progress;

/// Result of one submission attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxOutcome {
    /// Included in a finalized block and dispatched successfully.
    Finalized {
        /// Hash of the finalized block.
        block_hash: H256,
    },
    /// Included in a finalized block but the dispatch returned an error.
    DispatchFailed {
        /// Hash of the finalized block.
        block_hash: H256,
        /// Decoded dispatch error.
        reason: String,
    },
    /// Never reached finality.
    SubmissionFailed {
        /// What went wrong.
        reason: String,
        /// Whether a fresh attempt may succeed.
        transient: bool,
    },
}

/// A chain the fixtures can observe and submit to.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Reads a storage entry at the latest finalized block.
    ///
    /// Entries with a type default ([`StorageKey::has_default`]) always return `Some`.
    async fn read(&self, key: &StorageKey) -> Result<Option<Reading>>;

    /// Reads a runtime constant.
    async fn constant(&self, key: ConstantKey) -> Result<u64>;

    /// Number of the latest finalized block.
    async fn block_number(&self) -> Result<u64>;

    /// Every `SubtensorModule.SubnetOwner` entry at the latest finalized block.
    async fn subnet_owners(&self) -> Result<Vec<(NetUid, AccountId32)>>;

    /// Signs `call` with `signer`, submits it once and waits for a terminal status.
    async fn submit(&self, call: &Call, signer: &Keypair) -> TxOutcome;

    /// Reads a numeric entry, treating absence as zero.
    async fn read_u64(&self, key: &StorageKey) -> Result<u64> {
        match self.read(key).await? {
            Some(reading) => reading.as_u64(key),
            None => Ok(0),
        }
    }

    /// Reads a flag, treating absence as `false`.
    async fn read_bool(&self, key: &StorageKey) -> Result<bool> {
        match self.read(key).await? {
            Some(reading) => reading.as_bool(key),
            None => Ok(false),
        }
    }

    /// Reads a numeric entry that may be absent.
    async fn read_optional_u64(&self, key: &StorageKey) -> Result<Option<u64>> {
        self.read(key)
            .await?
            .map(|reading| reading.as_u64(key))
            .transpose()
    }

    /// Reads an account id entry that may be absent.
    async fn read_account(&self, key: &StorageKey) -> Result<Option<AccountId32>> {
        self.read(key)
            .await?
            .map(|reading| reading.as_account(key))
            .transpose()
    }
}

/// [`Ledger`] backed by a subxt client and the runtime's metadata.
#[derive(Clone, Debug)]
pub struct SubxtLedger {
    /// Client connected to the node.
    client: OnlineClient<PolkadotConfig>,
}

impl SubxtLedger {
    /// Connects to the node at `rpc_url` through a reconnecting rpc client.
    pub async fn connect(rpc_url: &Url) -> Result<Self> {
        let client = create_subxt_client(rpc_url).await?;
        info!("Using runtime spec version {}", client.runtime_version().spec_version);
        Ok(Self { client })
    }

    /// Wraps an already connected client.
    pub fn from_client(client: OnlineClient<PolkadotConfig>) -> Self {
        Self { client }
    }

    /// The underlying client, for queries the fixtures do not model.
    pub fn client(&self) -> &OnlineClient<PolkadotConfig> {
        &self.client
    }
}

#[async_trait]
impl Ledger for SubxtLedger {
    async fn read(&self, key: &StorageKey) -> Result<Option<Reading>> {
        let address = subxt::dynamic::storage(key.pallet(), key.entry(), key.keys());
        let storage = self
            .client
            .storage()
            .at_latest()
            .await
            .context(StorageSnafu {
                key: key.to_string(),
            })?;

        let thunk = if key.has_default() {
            Some(
                storage
                    .fetch_or_default(&address)
                    .await
                    .context(StorageSnafu {
                        key: key.to_string(),
                    })?,
            )
        } else {
            storage.fetch(&address).await.context(StorageSnafu {
                key: key.to_string(),
            })?
        };

        debug!("Read {key}: present = {}", thunk.is_some());
        thunk.map(|thunk| decode_reading(key, thunk)).transpose()
    }

    async fn constant(&self, key: ConstantKey) -> Result<u64> {
        let address = subxt::dynamic::constant(key.pallet(), key.name());
        let thunk = self
            .client
            .constants()
            .at(&address)
            .context(ConstantSnafu {
                key: key.to_string(),
            })?;
        let value = thunk.to_value().map_err(|e| Error::Decode {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        unsigned(&value)
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| Error::UnexpectedValue {
                key: key.to_string(),
                expected: "a u64",
            })
    }

    async fn block_number(&self) -> Result<u64> {
        let block = self
            .client
            .blocks()
            .at_latest()
            .await
            .context(LatestBlockSnafu)?;
        Ok(u64::from(block.number()))
    }

    async fn subnet_owners(&self) -> Result<Vec<(NetUid, AccountId32)>> {
        let what = "SubtensorModule.SubnetOwner(..)";
        let address =
            subxt::dynamic::storage("SubtensorModule", "SubnetOwner", Vec::<Value>::new());
        let pairs = self
            .client
            .storage()
            .at_latest()
            .await
            .context(StorageSnafu { key: what })?
            .iter(address)
            .await
            .context(StorageSnafu { key: what })?
            .try_collect::<Vec<_>>()
            .await
            .context(StorageSnafu { key: what })?;

        let mut owners = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let netuid = pair
                .keys
                .first()
                .and_then(unsigned)
                .and_then(|n| NetUid::try_from(n).ok())
                .ok_or_else(|| Error::UnexpectedValue {
                    key: what.to_string(),
                    expected: "a netuid map key",
                })?;
            let owner = pair
                .value
                .as_type::<AccountId32>()
                .map_err(|e| Error::Decode {
                    key: what.to_string(),
                    message: e.to_string(),
                })?;
            owners.push((netuid, owner));
        }
        debug!("Read {what}: {} subnets", owners.len());
        Ok(owners)
    }

    async fn submit(&self, call: &Call, signer: &Keypair) -> TxOutcome {
        let payload = call.to_payload();
        match self
            .client
            .tx()
            .sign_and_submit_then_watch_default(&payload, signer)
            .await
        {
            Ok(progress) => {
                info!(
                    "📨 Submitted {} as {:?}",
                    call.label(),
                    progress.extrinsic_hash()
                );
                tx_progress::watch(progress).await
            }
            Err(err) => tx_progress::submission_failed(&err),
        }
    }
}

/// Decodes a fetched entry according to its [`ValueKind`].
fn decode_reading(key: &StorageKey, thunk: DecodedValueThunk) -> Result<Reading> {
    let decode_err = |message: String| Error::Decode {
        key: key.to_string(),
        message,
    };
    let unexpected = |expected| Error::UnexpectedValue {
        key: key.to_string(),
        expected,
    };

    match key.kind() {
        ValueKind::Bool => thunk
            .as_type::<bool>()
            .map(Reading::Bool)
            .map_err(|e| decode_err(e.to_string())),
        ValueKind::Account => thunk
            .as_type::<AccountId32>()
            .map(Reading::Account)
            .map_err(|e| decode_err(e.to_string())),
        ValueKind::Weights => thunk
            .as_type::<Vec<(u16, u16)>>()
            .map(Reading::Weights)
            .map_err(|e| decode_err(e.to_string())),
        ValueKind::Number => {
            let value = thunk.to_value().map_err(|e| decode_err(e.to_string()))?;
            unsigned(&value)
                .map(Reading::Number)
                .ok_or_else(|| unexpected("a number"))
        }
        ValueKind::AccountData => {
            let value = thunk.to_value().map_err(|e| decode_err(e.to_string()))?;
            value
                .at("data")
                .at("free")
                .and_then(unsigned)
                .map(Reading::Number)
                .ok_or_else(|| unexpected("account data with a free balance"))
        }
        ValueKind::Lease => {
            let value = thunk.to_value().map_err(|e| decode_err(e.to_string()))?;
            lease(&value)
                .map(Reading::Lease)
                .ok_or_else(|| unexpected("a subnet lease"))
        }
    }
}

/// Reduces a `SubnetLease` record to the fields the fixtures act on.
fn lease<T>(value: &Value<T>) -> Option<Lease> {
    let end_block = match &value.at("end_block")?.value {
        ValueDef::Variant(v) if v.name == "None" => None,
        ValueDef::Variant(v) if v.name == "Some" => {
            Some(v.values.values().next().and_then(unsigned)?)
        }
        _ => return None,
    };
    Some(Lease {
        beneficiary: account(value.at("beneficiary")?)?,
        netuid: value
            .at("netuid")
            .and_then(unsigned)
            .and_then(|n| NetUid::try_from(n).ok())?,
        end_block: end_block.map(u64::try_from).transpose().ok()?,
    })
}

/// Extracts an account id from its 32 byte values, looking through the `AccountId32`
/// newtype.
fn account<T>(value: &Value<T>) -> Option<AccountId32> {
    let ValueDef::Composite(fields) = &value.value else {
        return None;
    };
    if fields.len() == 1 {
        return fields.values().next().and_then(account);
    }
    let bytes = fields
        .values()
        .map(|byte| byte.as_u128().and_then(|n| u8::try_from(n).ok()))
        .collect::<Option<Vec<u8>>>()?;
    <[u8; 32]>::try_from(bytes).ok().map(AccountId32)
}

/// Extracts an unsigned integer, looking through single-field newtypes such as `NetUid`
/// or `AlphaCurrency`.
fn unsigned<T>(value: &Value<T>) -> Option<u128> {
    if let Some(n) = value.as_u128() {
        return Some(n);
    }
    match &value.value {
        ValueDef::Composite(fields) if fields.len() == 1 => {
            fields.values().next().and_then(unsigned)
        }
        _ => None,
    }
}
