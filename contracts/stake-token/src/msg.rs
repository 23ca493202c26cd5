use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Coin, Timestamp, Uint128, Uint256};
use tierstake_common::RoundStatus;

use crate::state::{Config, RandomnessRequest, StakeEntry, Tier};

#[cw_serde]
pub struct InstantiateMsg {
    /// Exactly three tiers, in tier id order.
    pub tiers: Vec<TierInit>,
    /// Receives the genesis supply of every tier. Defaults to the instantiator.
    pub initial_holder: Option<String>,
    pub coordinator: String,
    pub randomness_fee: Option<Coin>,
}

#[cw_serde]
pub struct TierInit {
    pub name: String,
    pub face_value: Uint128,
    pub initial_supply: Uint128,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Move `amount` of one tier. Caller must be `from` or an approved operator of `from`.
    Transfer {
        from: String,
        to: String,
        tier_id: u8,
        amount: Uint128,
    },
    /// Move several tiers at once. All legs succeed or none do.
    BatchTransfer {
        from: String,
        to: String,
        tier_ids: Vec<u8>,
        amounts: Vec<Uint128>,
    },
    /// Grant or revoke `operator` permission over all of the caller's balances.
    SetApproval { operator: String, approved: bool },
    /// Open a new round that may be closed once `duration_seconds` have elapsed.
    StartRound { duration_seconds: u64 },
    /// Stake tokens into the open round. `participant` defaults to the caller.
    EnterRound {
        tier_id: u8,
        amount: Uint128,
        participant: Option<String>,
    },
    /// Close the open round and request randomness for the draw.
    CloseRound {},
    /// Randomness callback. Coordinator only.
    FulfillRandomness {
        request_id: String,
        random_value: Uint256,
    },
    /// Update configuration. Admin only.
    UpdateConfig {
        admin: Option<String>,
        coordinator: Option<String>,
        randomness_fee: Option<Coin>,
    },
}

#[cw_serde]
pub struct MigrateMsg {}

/// Grouped parameters for a single-tier transfer.
pub struct TransferParams {
    pub from: String,
    pub to: String,
    pub tier_id: u8,
    pub amount: Uint128,
}

/// Grouped parameters for a batch transfer.
pub struct BatchTransferParams {
    pub from: String,
    pub to: String,
    pub tier_ids: Vec<u8>,
    pub amounts: Vec<Uint128>,
}

/// Grouped parameters for config updates.
pub struct UpdateConfigParams {
    pub admin: Option<String>,
    pub coordinator: Option<String>,
    pub randomness_fee: Option<Coin>,
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(Config)]
    Config {},
    #[returns(Vec<Tier>)]
    Tiers {},
    #[returns(Tier)]
    Tier { tier_id: u8 },
    #[returns(Uint128)]
    TotalSupply { tier_id: u8 },
    #[returns(BalanceResponse)]
    Balance { owner: String, tier_id: u8 },
    #[returns(BalanceBatchResponse)]
    BalanceBatch {
        owners: Vec<String>,
        tier_ids: Vec<u8>,
    },
    #[returns(ApprovalResponse)]
    IsApprovedForAll { owner: String, operator: String },
    #[returns(EscrowResponse)]
    Escrow {},
    #[returns(RoundResponse)]
    Round {},
    #[returns(Option<StakeEntry>)]
    EntryAt { index: u32 },
    #[returns(TicketsResponse)]
    TicketsOf { address: String },
    #[returns(EntriesResponse)]
    Entries {
        start_after: Option<u32>,
        limit: Option<u32>,
    },
    #[returns(Option<Addr>)]
    RecentWinner {},
    #[returns(Option<RandomnessRequest>)]
    RandomnessRequest { request_id: String },
}

#[cw_serde]
pub struct BalanceResponse {
    pub balance: Uint128,
}

#[cw_serde]
pub struct BalanceBatchResponse {
    pub balances: Vec<Uint128>,
}

#[cw_serde]
pub struct ApprovalResponse {
    pub approved: bool,
}

#[cw_serde]
pub struct EscrowResponse {
    pub address: Addr,
    /// Escrow ledger balance per tier, in tier id order.
    pub balances: Vec<Uint128>,
}

#[cw_serde]
pub struct RoundResponse {
    pub round_id: u64,
    pub status: RoundStatus,
    pub started_at: Option<Timestamp>,
    pub deadline: Option<Timestamp>,
    pub total_tickets: Uint128,
    pub entry_count: u32,
    pub pooled: Vec<Uint128>,
    pub pending_request: Option<String>,
}

#[cw_serde]
pub struct TicketsResponse {
    pub address: String,
    pub tickets: Uint128,
}

#[cw_serde]
pub struct EntryInfo {
    pub index: u32,
    pub participant: Addr,
    pub tickets: Uint128,
}

#[cw_serde]
pub struct EntriesResponse {
    pub entries: Vec<EntryInfo>,
}
