use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, Timestamp, Uint256};
use cw_storage_plus::{Item, Map};

pub const CONFIG: Item<CoordinatorConfig> = Item::new("config");
/// Requests keyed by (consumer, request id); ids are scoped to the contract that sent them.
pub const REQUESTS: Map<(&Addr, &str), PendingRequest> = Map::new("requests");
pub const BEACONS: Map<u64, StoredBeacon> = Map::new("beacons");
pub const LATEST_ROUND: Item<u64> = Item::new("latest_round");

#[cw_serde]
pub struct CoordinatorConfig {
    pub admin: Addr,
    /// Addresses allowed to relay beacons that fulfill requests.
    pub operators: Vec<Addr>,
    /// Quicknet public key, 96 bytes (G2 point)
    pub quicknet_pubkey: Vec<u8>,
    /// Chain hash identifying the drand network
    pub chain_hash: String,
    /// Genesis time of the drand network (unix seconds)
    pub genesis_time: u64,
    pub period_seconds: u64,
    /// Minimum payment attached to each request.
    pub fee: Option<Coin>,
}

#[cw_serde]
pub struct PendingRequest {
    pub request_id: String,
    pub consumer: Addr,
    /// First drand round published after the request was accepted.
    pub target_round: u64,
    pub fulfilled: bool,
    pub random_value: Option<Uint256>,
    pub requested_at: Timestamp,
    pub fulfilled_at: Option<Timestamp>,
}

#[cw_serde]
pub struct StoredBeacon {
    pub round: u64,
    /// sha256(signature), 32 bytes
    pub randomness: Vec<u8>,
    /// BLS signature on G1, 48 bytes
    pub signature: Vec<u8>,
    pub submitted_at: Timestamp,
    pub submitted_by: Addr,
}
