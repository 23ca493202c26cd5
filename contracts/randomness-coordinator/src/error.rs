use cosmwasm_std::StdError;
use thiserror::Error;

use crate::verify::VerifyError;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("insufficient fee: required {required}, got {got}")]
    InsufficientFee { required: String, got: String },

    #[error("randomness request {request_id} already exists")]
    RequestAlreadyExists { request_id: String },

    #[error("randomness request {request_id} not found")]
    RequestNotFound { request_id: String },

    #[error("randomness request {request_id} already fulfilled")]
    AlreadyFulfilled { request_id: String },

    #[error("BLS verification failed: {0}")]
    VerificationFailed(#[from] VerifyError),

    #[error("invalid hex input: {field}")]
    InvalidHex { field: String },

    #[error("invalid pubkey length: expected 96 bytes, got {got}")]
    InvalidPubkeyLength { got: usize },

    #[error("beacon period must be greater than zero")]
    InvalidPeriod,
}
