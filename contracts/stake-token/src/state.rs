use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, Timestamp, Uint128, Uint256};
use cw_storage_plus::{Item, Map};
use tierstake_common::RoundStatus;

/// Number of tiers in the catalog. Tier ids are `0..TIER_COUNT`.
pub const TIER_COUNT: usize = 3;

pub const CONFIG: Item<Config> = Item::new("config");
pub const TIERS: Item<Vec<Tier>> = Item::new("tiers");

/// Ledger balances keyed by (holder, tier id). Missing entries are zero.
pub const BALANCES: Map<(&Addr, u8), Uint128> = Map::new("balances");
/// Operator approvals keyed by (owner, operator). Only granted approvals are stored.
pub const APPROVALS: Map<(&Addr, &Addr), bool> = Map::new("approvals");

pub const ROUND: Item<StakingRound> = Item::new("round");
/// Entries of the current round, keyed by entry order.
pub const ENTRIES: Map<u32, StakeEntry> = Map::new("entries");
/// Slot of each participant of the current round in `ENTRIES`.
pub const ENTRY_SLOTS: Map<&Addr, u32> = Map::new("entry_slots");

pub const REQUESTS: Map<&str, RandomnessRequest> = Map::new("requests");
pub const RECENT_WINNER: Item<Addr> = Item::new("recent_winner");

#[cw_serde]
pub struct Config {
    pub admin: Addr,
    /// Randomness coordinator; the only address allowed to deliver randomness.
    pub coordinator: Addr,
    /// Fee forwarded with every randomness request, paid from the contract's own funds.
    pub randomness_fee: Option<Coin>,
}

#[cw_serde]
pub struct Tier {
    pub id: u8,
    pub name: String,
    /// Tickets earned per staked unit. Never changes after instantiation.
    pub face_value: Uint128,
    /// Minted at genesis; the ledger never mints or burns afterwards.
    pub total_supply: Uint128,
}

#[cw_serde]
pub struct StakingRound {
    /// Incremented each time a round opens. Zero until the first round.
    pub round_id: u64,
    pub status: RoundStatus,
    pub started_at: Option<Timestamp>,
    pub deadline: Option<Timestamp>,
    pub total_tickets: Uint128,
    pub entry_count: u32,
    /// Escrowed amount per tier staked into this round.
    pub pooled: Vec<Uint128>,
    pub pending_request: Option<String>,
}

impl StakingRound {
    pub fn idle(round_id: u64) -> Self {
        StakingRound {
            round_id,
            status: RoundStatus::Idle,
            started_at: None,
            deadline: None,
            total_tickets: Uint128::zero(),
            entry_count: 0,
            pooled: vec![Uint128::zero(); TIER_COUNT],
            pending_request: None,
        }
    }
}

#[cw_serde]
pub struct StakeEntry {
    pub participant: Addr,
    pub tickets: Uint128,
}

#[cw_serde]
pub struct RandomnessRequest {
    pub request_id: String,
    pub round_id: u64,
    pub fulfilled: bool,
    pub random_value: Option<Uint256>,
    pub requested_at: Timestamp,
    pub fulfilled_at: Option<Timestamp>,
}
