use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint256;

/// Lifecycle of the single staking round.
///
/// Settlement is not a persisted status: the randomness callback selects the
/// winner, pays out and returns the round to `Idle` in one step.
#[cw_serde]
#[derive(Copy)]
pub enum RoundStatus {
    Idle,
    Open,
    /// Ended and waiting for the randomness callback.
    Closed,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStatus::Idle => "idle",
            RoundStatus::Open => "open",
            RoundStatus::Closed => "closed",
        }
    }
}

/// Message a consumer sends to the randomness coordinator.
#[cw_serde]
pub enum CoordinatorExecuteMsg {
    RequestRandomness { request_id: String },
}

/// Callback the coordinator delivers to the consumer that asked for randomness.
/// Consumers embed a variant with the same name and fields in their own `ExecuteMsg`.
#[cw_serde]
pub enum RandomnessReceiverMsg {
    FulfillRandomness {
        request_id: String,
        random_value: Uint256,
    },
}
