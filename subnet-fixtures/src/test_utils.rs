//! An in-memory ledger that applies calls the way the subtensor runtime does, closely
//! enough for the fixtures' read-backs to mean something.
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ledger_client::call::{Call, LeaseId, NetUid, ROOT_NETUID};
use ledger_client::error::Result;
use ledger_client::ledger::{Ledger, TxOutcome};
use ledger_client::signer::AdminCredential;
use ledger_client::storage::{ConstantKey, Lease, Reading, StorageKey, ValueKind};
use ledger_client::tx_submitter::RetryPolicy;
use ledger_client::wait::PollConfig;
use subxt::utils::{AccountId32, H256};
use subxt_signer::sr25519::{dev, Keypair};
use tokio::time::Instant;

use crate::SubnetFixtures;

/// Time between two fake blocks.
pub const BLOCK_TIME: Duration = Duration::from_secs(12);

/// Fee charged to the admin account for every call it signs.
pub const ADMIN_FEE: u64 = 125_000;

/// Blocks between registering a subnet and being allowed to start it.
pub const START_CALL_DELAY: u64 = 10;

/// Network registration rate limit the fake chain starts with.
pub const INITIAL_NETWORK_RATE_LIMIT: u64 = 7200;

/// Who a call is dispatched as.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Origin {
    /// Inside a sudo envelope.
    Root,
    /// A plain signed extrinsic.
    Signed(AccountId32),
}

/// Mutable chain state.
#[derive(Default)]
struct State {
    /// Every storage entry that was ever written.
    storage: BTreeMap<StorageKey, Reading>,
    /// Upper bounds the runtime enforces on numeric admin settings.
    clamps: BTreeMap<StorageKey, u128>,
    /// Creator of the crowdloan currently being finalized.
    crowdloan_creator: Option<AccountId32>,
    /// `NextSubnetLeaseId`
    next_lease_id: LeaseId,
    /// Every call submitted, including attempts that failed transiently.
    submitted: Vec<Call>,
    /// Number of upcoming submissions to fail with a transient error.
    transient_failures: usize,
    /// Block of the last successful `register_network`.
    last_network_registration: Option<u64>,
}

/// In-memory [`Ledger`] with a block height driven by the tokio clock.
pub struct FakeLedger {
    /// Account allowed to dispatch `Sudo.sudo`.
    admin: AccountId32,
    /// Block zero.
    genesis: Instant,
    /// Chain state.
    state: Mutex<State>,
}

impl FakeLedger {
    /// A fresh chain with the root network registered and `//Alice` as sudo.
    pub fn new() -> Arc<Self> {
        env_logger::try_init().ok();
        let admin = dev::alice().public_key().to_account_id();
        let mut state = State::default();
        state.storage.insert(StorageKey::TotalNetworks, 1u64.into());
        state
            .storage
            .insert(StorageKey::SubnetOwner(ROOT_NETUID), admin.clone().into());
        state.storage.insert(
            StorageKey::NetworkRateLimit,
            INITIAL_NETWORK_RATE_LIMIT.into(),
        );

        Arc::new(Self {
            admin,
            genesis: Instant::now(),
            state: Mutex::new(state),
        })
    }

    /// Current block height.
    pub fn current_block(&self) -> u64 {
        self.genesis.elapsed().as_secs() / BLOCK_TIME.as_secs()
    }

    /// Writes an entry directly.
    pub fn set(&self, key: StorageKey, value: impl Into<Reading>) {
        self.state.lock().unwrap().storage.insert(key, value.into());
    }

    /// Reads an entry directly, without type defaults.
    pub fn get(&self, key: &StorageKey) -> Option<Reading> {
        self.state.lock().unwrap().storage.get(key).cloned()
    }

    /// Reads a numeric entry directly, treating absence as zero.
    pub fn get_u64(&self, key: &StorageKey) -> u64 {
        self.get(key).map(|r| r.as_u64(key).unwrap()).unwrap_or(0)
    }

    /// Number of submission attempts so far.
    pub fn submissions(&self) -> usize {
        self.state.lock().unwrap().submitted.len()
    }

    /// Every call submitted so far.
    pub fn submitted(&self) -> Vec<Call> {
        self.state.lock().unwrap().submitted.clone()
    }

    /// Fails the next `count` submissions as if the transaction pool had dropped them.
    pub fn fail_next(&self, count: usize) {
        self.state.lock().unwrap().transient_failures = count;
    }

    /// Registers a subnet owned by `owner` at the current block, bypassing the rate limit.
    pub fn add_subnet(&self, owner: &AccountId32) -> NetUid {
        let block = self.current_block();
        let mut state = self.state.lock().unwrap();
        register_network(&mut state, owner, block).unwrap()
    }

    /// Removes a subnet, leaving its netuid free for the next registration.
    pub fn dissolve_subnet(&self, netuid: NetUid) {
        let mut state = self.state.lock().unwrap();
        state.storage.remove(&StorageKey::SubnetOwner(netuid));
        state.storage.remove(&StorageKey::NetworkRegisteredAt(netuid));
        let total = read_u64(&state, &StorageKey::TotalNetworks);
        state
            .storage
            .insert(StorageKey::TotalNetworks, total.saturating_sub(1).into());
    }

    /// Caps what admin calls can write under `key`, as the runtime does for settings
    /// bounded by another one.
    pub fn clamp(&self, key: StorageKey, max: u128) {
        self.state.lock().unwrap().clamps.insert(key, max);
    }

    /// Marks a crowdloan created by `creator` as being finalized, which is the only
    /// context `register_leased_network` dispatches in.
    pub fn finalize_crowdloan(&self, creator: &AccountId32) {
        self.state.lock().unwrap().crowdloan_creator = Some(creator.clone());
    }

    /// Applies `call` as `origin`.
    fn dispatch(
        &self,
        state: &mut State,
        call: &Call,
        origin: Origin,
        block: u64,
    ) -> std::result::Result<(), &'static str> {
        if let Some((key, value)) = admin_setting(call) {
            ensure_root(&origin)?;
            let value = match (value, state.clamps.get(&key)) {
                (Reading::Number(n), Some(max)) => Reading::Number(n.min(*max)),
                (value, _) => value,
            };
            state.storage.insert(key, value);
            return Ok(());
        }

        match call {
            Call::Sudo { call } => match origin {
                Origin::Signed(ref who) if *who == self.admin => {
                    self.dispatch(state, call, Origin::Root, block)
                }
                _ => Err("Sudo::RequireSudo"),
            },
            Call::Proxy { real, call } => {
                ensure_signed(&origin)?;
                self.dispatch(state, call, Origin::Signed(real.clone()), block)
            }
            Call::RegisterNetwork { hotkey } => {
                let coldkey = ensure_signed(&origin)?;
                ensure_network_rate_limit(state, block)?;
                associate(state, hotkey, &coldkey)?;
                register_network(state, &coldkey, block)?;
                state.last_network_registration = Some(block);
                Ok(())
            }
            Call::RegisterLeasedNetwork {
                emissions_share: _,
                end_block,
            } => {
                let who = ensure_signed(&origin)?;
                let creator = state.crowdloan_creator.clone().ok_or("InvalidCrowdloanId")?;
                if who != creator {
                    return Err("InvalidLeaseBeneficiary");
                }
                if end_block.is_some_and(|end| end <= block) {
                    return Err("LeaseCannotEndInThePast");
                }
                ensure_network_rate_limit(state, block)?;

                let lease_id = state.next_lease_id;
                let coldkey = lease_account(b'c', lease_id);
                associate(state, &lease_account(b'h', lease_id), &coldkey)?;
                let netuid = register_network(state, &coldkey, block)?;
                state.last_network_registration = Some(block);
                state.next_lease_id = lease_id + 1;
                state.crowdloan_creator = None;
                state.storage.insert(
                    StorageKey::SubnetLeases(lease_id),
                    Reading::Lease(Lease {
                        beneficiary: who,
                        netuid,
                        end_block: *end_block,
                    }),
                );
                state
                    .storage
                    .insert(StorageKey::SubnetUidToLeaseId(netuid), u64::from(lease_id).into());
                Ok(())
            }
            Call::TerminateLease { lease_id, hotkey } => {
                let who = ensure_signed(&origin)?;
                let lease = match state.storage.get(&StorageKey::SubnetLeases(*lease_id)) {
                    Some(Reading::Lease(lease)) => lease.clone(),
                    _ => return Err("LeaseDoesNotExist"),
                };
                if lease.beneficiary != who {
                    return Err("ExpectedBeneficiaryOrigin");
                }
                let end_block = lease.end_block.ok_or("LeaseHasNoEndBlock")?;
                if block < end_block {
                    return Err("LeaseHasNotEnded");
                }
                if state.storage.get(&StorageKey::Owner(hotkey.clone()))
                    != Some(&Reading::Account(who.clone()))
                {
                    return Err("BeneficiaryDoesNotOwnHotkey");
                }
                state
                    .storage
                    .insert(StorageKey::SubnetOwner(lease.netuid), who.into());
                state.storage.remove(&StorageKey::SubnetLeases(*lease_id));
                Ok(())
            }
            Call::BurnedRegister { netuid, hotkey } => {
                let coldkey = ensure_signed(&origin)?;
                if *netuid == ROOT_NETUID {
                    return Err("RegistrationNotPermittedOnRootSubnet");
                }
                ensure_subnet(state, *netuid)?;
                register_neuron(state, *netuid, hotkey, &coldkey)
            }
            Call::RootRegister { hotkey } => {
                let coldkey = ensure_signed(&origin)?;
                register_neuron(state, ROOT_NETUID, hotkey, &coldkey)
            }
            Call::BecomeDelegate { .. } => ensure_signed(&origin).map(|_| ()),
            Call::AddStake {
                hotkey,
                netuid,
                amount_staked,
            } => {
                ensure_signed(&origin)?;
                ensure_subnet(state, *netuid)?;
                if *netuid != ROOT_NETUID
                    && !read_bool(state, &StorageKey::SubtokenEnabled(*netuid))
                {
                    return Err("SubtokenDisabled");
                }
                let key = StorageKey::TotalHotkeyAlpha(hotkey.clone(), *netuid);
                let alpha = read_u64(state, &key);
                state.storage.insert(key, (alpha + amount_staked).into());
                Ok(())
            }
            Call::RemoveStake {
                hotkey,
                netuid,
                amount_unstaked: amount,
            }
            | Call::RecycleAlpha {
                hotkey,
                amount,
                netuid,
            }
            | Call::BurnAlpha {
                hotkey,
                amount,
                netuid,
            } => {
                ensure_signed(&origin)?;
                let key = StorageKey::TotalHotkeyAlpha(hotkey.clone(), *netuid);
                let alpha = read_u64(state, &key);
                if alpha < *amount {
                    return Err("NotEnoughStakeToWithdraw");
                }
                state.storage.insert(key, (alpha - amount).into());
                Ok(())
            }
            Call::SetWeights {
                netuid,
                dests,
                weights,
                ..
            } => {
                let hotkey = ensure_signed(&origin)?;
                let uid = state
                    .storage
                    .get(&StorageKey::Uids(*netuid, hotkey))
                    .cloned()
                    .ok_or("HotKeyNotRegisteredInSubNet")?;
                let uid = match uid {
                    Reading::Number(uid) => uid as u16,
                    _ => return Err("HotKeyNotRegisteredInSubNet"),
                };
                if dests.len() != weights.len() {
                    return Err("WeightVecNotEqualSize");
                }
                let row = dests
                    .iter()
                    .copied()
                    .zip(weights.iter().copied())
                    .filter(|(_, weight)| *weight > 0)
                    .collect();
                state
                    .storage
                    .insert(StorageKey::Weights(*netuid, uid), Reading::Weights(row));
                Ok(())
            }
            Call::StartCall { netuid } => {
                let who = ensure_signed(&origin)?;
                let owner = ensure_subnet(state, *netuid)?;
                if who != owner {
                    return Err("NotSubnetOwner");
                }
                if state
                    .storage
                    .contains_key(&StorageKey::FirstEmissionBlockNumber(*netuid))
                {
                    return Err("FirstEmissionBlockNumberAlreadySet");
                }
                let registered_at = read_u64(state, &StorageKey::NetworkRegisteredAt(*netuid));
                if block < registered_at + START_CALL_DELAY {
                    return Err("NeedWaitingMoreBlocksToStarCall");
                }
                state.storage.insert(
                    StorageKey::FirstEmissionBlockNumber(*netuid),
                    (block + 1).into(),
                );
                state
                    .storage
                    .insert(StorageKey::SubtokenEnabled(*netuid), true.into());
                Ok(())
            }
            Call::SwapColdkey {
                old_coldkey,
                new_coldkey,
                ..
            } => {
                ensure_root(&origin)?;
                let old = Reading::Account(old_coldkey.clone());
                for (key, value) in state.storage.iter_mut() {
                    if matches!(key, StorageKey::Owner(_) | StorageKey::SubnetOwner(_))
                        && *value == old
                    {
                        *value = Reading::Account(new_coldkey.clone());
                    }
                }
                Ok(())
            }
            Call::SwapHotkey {
                hotkey,
                new_hotkey,
                netuid,
            } => {
                let coldkey = ensure_signed(&origin)?;
                if state.storage.get(&StorageKey::Owner(hotkey.clone()))
                    != Some(&Reading::Account(coldkey.clone()))
                {
                    return Err("NonAssociatedColdKey");
                }
                if state
                    .storage
                    .contains_key(&StorageKey::Owner(new_hotkey.clone()))
                {
                    return Err("HotKeyAlreadyRegisteredInSubNet");
                }
                let moved: Vec<_> = state
                    .storage
                    .keys()
                    .filter_map(|key| match key {
                        StorageKey::Uids(n, h)
                            if h == hotkey && netuid.map_or(true, |only| only == *n) =>
                        {
                            Some(*n)
                        }
                        _ => None,
                    })
                    .collect();
                for n in moved {
                    if let Some(uid) = state.storage.remove(&StorageKey::Uids(n, hotkey.clone())) {
                        state
                            .storage
                            .insert(StorageKey::Uids(n, new_hotkey.clone()), uid);
                    }
                }
                state.storage.remove(&StorageKey::Owner(hotkey.clone()));
                state.storage.insert(
                    StorageKey::Owner(new_hotkey.clone()),
                    Reading::Account(coldkey),
                );
                Ok(())
            }
            _ => Err("CallFiltered"),
        }
    }
}

#[async_trait]
impl Ledger for FakeLedger {
    async fn read(&self, key: &StorageKey) -> Result<Option<Reading>> {
        let state = self.state.lock().unwrap();
        Ok(state.storage.get(key).cloned().or_else(|| type_default(key)))
    }

    async fn constant(&self, key: ConstantKey) -> Result<u64> {
        match key {
            ConstantKey::DurationOfStartCall => Ok(START_CALL_DELAY),
        }
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(self.current_block())
    }

    async fn subnet_owners(&self) -> Result<Vec<(NetUid, AccountId32)>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .storage
            .iter()
            .filter_map(|(key, value)| match (key, value) {
                (StorageKey::SubnetOwner(netuid), Reading::Account(owner)) => {
                    Some((*netuid, owner.clone()))
                }
                _ => None,
            })
            .collect())
    }

    async fn submit(&self, call: &Call, signer: &Keypair) -> TxOutcome {
        let block = self.current_block();
        let block_hash = H256::from_low_u64_be(block);
        let mut state = self.state.lock().unwrap();
        state.submitted.push(call.clone());

        if state.transient_failures > 0 {
            state.transient_failures -= 1;
            return TxOutcome::SubmissionFailed {
                reason: "Priority is too low".to_string(),
                transient: true,
            };
        }

        let who = signer.public_key().to_account_id();
        let result = self.dispatch(&mut state, call, Origin::Signed(who.clone()), block);

        if who == self.admin {
            let key = StorageKey::FreeBalance(who);
            let free = read_u64(&state, &key);
            state.storage.insert(key, free.saturating_sub(ADMIN_FEE).into());
        }

        match result {
            Ok(()) => TxOutcome::Finalized { block_hash },
            Err(reason) => TxOutcome::DispatchFailed {
                block_hash,
                reason: reason.to_string(),
            },
        }
    }
}

/// Fixtures over `ledger` with `//Alice` as admin and one poll per block.
pub fn fixtures(ledger: &Arc<FakeLedger>) -> SubnetFixtures<FakeLedger> {
    SubnetFixtures::new(
        Arc::clone(ledger),
        AdminCredential::new(dev::alice()),
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(100),
        },
        PollConfig {
            interval: BLOCK_TIME,
            timeout: Duration::from_secs(600),
        },
    )
}

/// Account id of a keypair.
pub fn account(keypair: &Keypair) -> AccountId32 {
    keypair.public_key().to_account_id()
}

/// The storage entry and value a privileged setter writes.
fn admin_setting(call: &Call) -> Option<(StorageKey, Reading)> {
    let setting = match call {
        Call::SudoSetNetworkRateLimit { rate_limit } => {
            (StorageKey::NetworkRateLimit, (*rate_limit).into())
        }
        Call::SudoSetCommitRevealWeightsEnabled { netuid, enabled } => {
            (StorageKey::CommitRevealWeightsEnabled(*netuid), (*enabled).into())
        }
        Call::SudoSetWeightsSetRateLimit {
            netuid,
            weights_set_rate_limit,
        } => (
            StorageKey::WeightsSetRateLimit(*netuid),
            (*weights_set_rate_limit).into(),
        ),
        Call::SudoSetTempo { netuid, tempo } => (StorageKey::Tempo(*netuid), (*tempo).into()),
        Call::SudoSetCommitRevealWeightsInterval { netuid, interval } => {
            (StorageKey::RevealPeriodEpochs(*netuid), (*interval).into())
        }
        Call::SudoSetEvmChainId { chain_id } => (StorageKey::ChainId, (*chain_id).into()),
        Call::SudoSetTxRateLimit { tx_rate_limit } => {
            (StorageKey::TxRateLimit, (*tx_rate_limit).into())
        }
        Call::SudoSetMaxAllowedValidators {
            netuid,
            max_allowed_validators,
        } => (
            StorageKey::MaxAllowedValidators(*netuid),
            (*max_allowed_validators).into(),
        ),
        Call::SudoSetSubnetOwnerCut { subnet_owner_cut } => {
            (StorageKey::SubnetOwnerCut, (*subnet_owner_cut).into())
        }
        Call::SudoSetActivityCutoff {
            netuid,
            activity_cutoff,
        } => (
            StorageKey::ActivityCutoff(*netuid),
            (*activity_cutoff).into(),
        ),
        Call::SudoSetMaxAllowedUids {
            netuid,
            max_allowed_uids,
        } => (
            StorageKey::MaxAllowedUids(*netuid),
            (*max_allowed_uids).into(),
        ),
        Call::SudoSetMinDelegateTake { take } => (StorageKey::MinDelegateTake, (*take).into()),
        Call::SudoSetSubtokenEnabled {
            netuid,
            subtoken_enabled,
        } => (
            StorageKey::SubtokenEnabled(*netuid),
            (*subtoken_enabled).into(),
        ),
        Call::SudoSetStakeThreshold { min_stake } => {
            (StorageKey::StakeThreshold, (*min_stake).into())
        }
        Call::DisableWhitelist { disabled } => {
            (StorageKey::DisableWhitelistCheck, (*disabled).into())
        }
        Call::ForceSetBalance { who, new_free } => {
            (StorageKey::FreeBalance(who.clone()), (*new_free).into())
        }
        _ => return None,
    };
    Some(setting)
}

/// Value an absent entry reads as.
fn type_default(key: &StorageKey) -> Option<Reading> {
    if !key.has_default() {
        return None;
    }
    match key.kind() {
        ValueKind::Bool => Some(Reading::Bool(false)),
        ValueKind::Number | ValueKind::AccountData => Some(Reading::Number(0)),
        ValueKind::Weights => Some(Reading::Weights(Vec::new())),
        ValueKind::Account | ValueKind::Lease => None,
    }
}

/// Fails unless the call runs as root.
fn ensure_root(origin: &Origin) -> std::result::Result<(), &'static str> {
    match origin {
        Origin::Root => Ok(()),
        Origin::Signed(_) => Err("BadOrigin"),
    }
}

/// The signer, unless the call runs as root.
fn ensure_signed(origin: &Origin) -> std::result::Result<AccountId32, &'static str> {
    match origin {
        Origin::Signed(who) => Ok(who.clone()),
        Origin::Root => Err("BadOrigin"),
    }
}

/// Owner of an existing subnet.
fn ensure_subnet(state: &State, netuid: NetUid) -> std::result::Result<AccountId32, &'static str> {
    match state.storage.get(&StorageKey::SubnetOwner(netuid)) {
        Some(Reading::Account(owner)) => Ok(owner.clone()),
        _ => Err("SubnetNotExists"),
    }
}

/// Reads a number, absent as zero.
fn read_u64(state: &State, key: &StorageKey) -> u64 {
    match state.storage.get(key) {
        Some(Reading::Number(n)) => *n as u64,
        _ => 0,
    }
}

/// Reads a flag, absent as false.
fn read_bool(state: &State, key: &StorageKey) -> bool {
    matches!(state.storage.get(key), Some(Reading::Bool(true)))
}

/// Fails while the network registration rate limit is in effect.
fn ensure_network_rate_limit(state: &State, block: u64) -> std::result::Result<(), &'static str> {
    let limit = read_u64(state, &StorageKey::NetworkRateLimit);
    match state.last_network_registration {
        Some(last) if block < last + limit => Err("NetworkTxRateLimitExceeded"),
        _ => Ok(()),
    }
}

/// Deterministic key the chain derives for a lease's coldkey (`b'c'`) or hotkey (`b'h'`).
fn lease_account(kind: u8, lease_id: LeaseId) -> AccountId32 {
    let mut bytes = [kind; 32];
    bytes[28..].copy_from_slice(&lease_id.to_le_bytes());
    AccountId32(bytes)
}

/// Binds `hotkey` to `coldkey`, failing if another coldkey owns it.
fn associate(
    state: &mut State,
    hotkey: &AccountId32,
    coldkey: &AccountId32,
) -> std::result::Result<(), &'static str> {
    let key = StorageKey::Owner(hotkey.clone());
    match state.storage.get(&key) {
        Some(Reading::Account(owner)) if owner != coldkey => Err("NonAssociatedColdKey"),
        Some(_) => Ok(()),
        None => {
            state.storage.insert(key, coldkey.clone().into());
            Ok(())
        }
    }
}

/// Creates a subnet on the lowest free netuid.
fn register_network(
    state: &mut State,
    owner: &AccountId32,
    block: u64,
) -> std::result::Result<NetUid, &'static str> {
    let netuid = (1..=NetUid::MAX)
        .find(|n| !state.storage.contains_key(&StorageKey::SubnetOwner(*n)))
        .ok_or("SubnetLimitReached")?;
    state
        .storage
        .insert(StorageKey::SubnetOwner(netuid), owner.clone().into());
    state
        .storage
        .insert(StorageKey::NetworkRegisteredAt(netuid), block.into());
    let total = read_u64(state, &StorageKey::TotalNetworks);
    state
        .storage
        .insert(StorageKey::TotalNetworks, (total + 1).into());
    Ok(netuid)
}

/// Appends `hotkey` to a subnet's uids.
fn register_neuron(
    state: &mut State,
    netuid: NetUid,
    hotkey: &AccountId32,
    coldkey: &AccountId32,
) -> std::result::Result<(), &'static str> {
    let uid_key = StorageKey::Uids(netuid, hotkey.clone());
    if state.storage.contains_key(&uid_key) {
        return Err("HotKeyAlreadyRegisteredInSubNet");
    }
    associate(state, hotkey, coldkey)?;
    let count_key = StorageKey::SubnetworkN(netuid);
    let uid = read_u64(state, &count_key);
    state.storage.insert(uid_key, uid.into());
    state.storage.insert(count_key, (uid + 1).into());
    Ok(())
}
