use cosmwasm_std::{OverflowError, StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("arithmetic overflow: {0}")]
    Overflow(#[from] OverflowError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("insufficient balance of tier {tier_id}: need {needed}, have {available}")]
    InsufficientBalance {
        tier_id: u8,
        needed: Uint128,
        available: Uint128,
    },

    #[error("length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("unknown tier {tier_id}")]
    UnknownTier { tier_id: u8 },

    #[error("expected exactly {expected} tiers, got {got}")]
    InvalidTierCount { expected: usize, got: usize },

    #[error("tier {tier_id} has zero face value")]
    ZeroFaceValue { tier_id: u8 },

    #[error("round duration must be greater than zero")]
    InvalidDuration,

    #[error("stake amount must be greater than zero")]
    ZeroAmount,

    #[error("round {round_id} is already open")]
    RoundAlreadyOpen { round_id: u64 },

    #[error("round is not open (status: {status})")]
    RoundNotOpen { status: String },

    #[error("round cannot close before {deadline} (now: {now})")]
    TooEarly { deadline: u64, now: u64 },

    #[error("round has no stake to settle")]
    NoStake,

    #[error("randomness request {request_id} is already pending")]
    RequestAlreadyPending { request_id: String },

    #[error("unknown randomness request {request_id}")]
    UnknownRequest { request_id: String },

    #[error("randomness request {request_id} already fulfilled")]
    AlreadyFulfilled { request_id: String },
}
