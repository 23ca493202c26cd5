//! Randomness gateway: one outstanding request per round, consumed exactly once.

use cosmwasm_std::{to_json_binary, CosmosMsg, Env, Storage, Uint256, WasmMsg};
use tierstake_common::{derive_request_id, CoordinatorExecuteMsg};

use crate::error::ContractError;
use crate::state::{Config, RandomnessRequest, StakingRound, REQUESTS};

/// Issue a fresh request for `round` and build the outbound coordinator call.
///
/// The caller stores the returned id on the round.
pub fn request(
    storage: &mut dyn Storage,
    env: &Env,
    config: &Config,
    round: &StakingRound,
) -> Result<(String, CosmosMsg), ContractError> {
    if let Some(pending) = &round.pending_request {
        return Err(ContractError::RequestAlreadyPending {
            request_id: pending.clone(),
        });
    }

    let request_id = derive_request_id(
        env.contract.address.as_str(),
        round.round_id,
        env.block.height,
    );
    if REQUESTS.has(storage, &request_id) {
        return Err(ContractError::RequestAlreadyPending { request_id });
    }

    REQUESTS.save(
        storage,
        &request_id,
        &RandomnessRequest {
            request_id: request_id.clone(),
            round_id: round.round_id,
            fulfilled: false,
            random_value: None,
            requested_at: env.block.time,
            fulfilled_at: None,
        },
    )?;

    let msg = WasmMsg::Execute {
        contract_addr: config.coordinator.to_string(),
        msg: to_json_binary(&CoordinatorExecuteMsg::RequestRandomness {
            request_id: request_id.clone(),
        })?,
        funds: config.randomness_fee.clone().into_iter().collect(),
    };

    Ok((request_id, msg.into()))
}

/// Validate a callback against the round's pending request.
///
/// Returns the request marked as fulfilled without saving it; the caller
/// persists it together with the rest of the settlement.
pub fn accept_fulfillment(
    storage: &dyn Storage,
    env: &Env,
    round: &StakingRound,
    request_id: &str,
    random_value: Uint256,
) -> Result<RandomnessRequest, ContractError> {
    let mut request = REQUESTS
        .may_load(storage, request_id)?
        .ok_or_else(|| ContractError::UnknownRequest {
            request_id: request_id.to_string(),
        })?;

    if request.fulfilled {
        return Err(ContractError::AlreadyFulfilled {
            request_id: request_id.to_string(),
        });
    }

    if round.pending_request.as_deref() != Some(request_id) {
        return Err(ContractError::UnknownRequest {
            request_id: request_id.to_string(),
        });
    }

    request.fulfilled = true;
    request.random_value = Some(random_value);
    request.fulfilled_at = Some(env.block.time);
    Ok(request)
}
