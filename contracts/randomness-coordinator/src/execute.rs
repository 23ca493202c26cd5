use cosmwasm_std::{
    to_json_binary, DepsMut, Env, Event, MessageInfo, Response, Uint128, WasmMsg,
};
use tierstake_common::{random_value_from_bytes, RandomnessReceiverMsg};

use crate::error::ContractError;
use crate::state::{PendingRequest, StoredBeacon, BEACONS, CONFIG, LATEST_ROUND, REQUESTS};
use crate::verify::{next_round, verify_beacon};

/// Accept a randomness request from a consumer contract.
///
/// The request is bound to the next drand round, whose signature does not
/// exist yet when the consumer commits to it.
pub fn request_randomness(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    request_id: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    if let Some(fee) = &config.fee {
        let paid: Uint128 = info
            .funds
            .iter()
            .filter(|c| c.denom == fee.denom)
            .map(|c| c.amount)
            .sum();
        if paid < fee.amount {
            return Err(ContractError::InsufficientFee {
                required: fee.to_string(),
                got: format!("{}{}", paid, fee.denom),
            });
        }
    }

    if REQUESTS.has(deps.storage, (&info.sender, request_id.as_str())) {
        return Err(ContractError::RequestAlreadyExists { request_id });
    }

    let target_round = next_round(
        config.genesis_time,
        config.period_seconds,
        env.block.time.seconds(),
    );
    let request = PendingRequest {
        request_id: request_id.clone(),
        consumer: info.sender.clone(),
        target_round,
        fulfilled: false,
        random_value: None,
        requested_at: env.block.time,
        fulfilled_at: None,
    };
    REQUESTS.save(deps.storage, (&info.sender, request_id.as_str()), &request)?;

    Ok(Response::new()
        .add_attribute("action", "request_randomness")
        .add_attribute("request_id", request_id.clone())
        .add_attribute("target_round", target_round.to_string())
        .add_event(
            Event::new("tierstake_randomness_request_received")
                .add_attribute("request_id", request_id)
                .add_attribute("consumer", info.sender.to_string())
                .add_attribute("target_round", target_round.to_string())
                .add_attribute("timestamp", env.block.time.seconds().to_string()),
        ))
}

/// Fulfill a request with the verified beacon of its target round and
/// deliver the random value to the consumer. Only operators can call this.
pub fn fulfill_request(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    consumer: String,
    request_id: String,
    signature_hex: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    if !config.operators.contains(&info.sender) {
        return Err(ContractError::Unauthorized {
            reason: "only operators can fulfill requests".to_string(),
        });
    }

    let consumer = deps.api.addr_validate(&consumer)?;
    let mut request = REQUESTS
        .may_load(deps.storage, (&consumer, request_id.as_str()))?
        .ok_or_else(|| ContractError::RequestNotFound {
            request_id: request_id.clone(),
        })?;
    if request.fulfilled {
        return Err(ContractError::AlreadyFulfilled { request_id });
    }

    let signature = hex::decode(&signature_hex).map_err(|_| ContractError::InvalidHex {
        field: "signature_hex".to_string(),
    })?;
    let round = request.target_round;
    let randomness = verify_beacon(&config.quicknet_pubkey, round, &signature)?;
    let random_value = random_value_from_bytes(&randomness);

    // Several requests can share a target round; the first relay stores it.
    if !BEACONS.has(deps.storage, round) {
        BEACONS.save(
            deps.storage,
            round,
            &StoredBeacon {
                round,
                randomness: randomness.to_vec(),
                signature,
                submitted_at: env.block.time,
                submitted_by: info.sender.clone(),
            },
        )?;
    }
    let current_latest = LATEST_ROUND.may_load(deps.storage)?.unwrap_or(0);
    if round > current_latest {
        LATEST_ROUND.save(deps.storage, &round)?;
    }

    request.fulfilled = true;
    request.random_value = Some(random_value);
    request.fulfilled_at = Some(env.block.time);
    REQUESTS.save(deps.storage, (&consumer, request_id.as_str()), &request)?;

    let callback = WasmMsg::Execute {
        contract_addr: request.consumer.to_string(),
        msg: to_json_binary(&RandomnessReceiverMsg::FulfillRandomness {
            request_id: request_id.clone(),
            random_value,
        })?,
        funds: vec![],
    };

    Ok(Response::new()
        .add_message(callback)
        .add_attribute("action", "fulfill_request")
        .add_attribute("request_id", request_id.clone())
        .add_attribute("round", round.to_string())
        .add_event(
            Event::new("tierstake_randomness_fulfilled")
                .add_attribute("request_id", request_id)
                .add_attribute("consumer", request.consumer.to_string())
                .add_attribute("round", round.to_string())
                .add_attribute("randomness", hex::encode(randomness))
                .add_attribute("random_value", random_value.to_string())
                .add_attribute("submitted_by", info.sender.to_string()),
        ))
}

/// Update the operator list. Admin only.
pub fn update_operators(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    add: Vec<String>,
    remove: Vec<String>,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;

    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can update operators".to_string(),
        });
    }

    for addr_str in &remove {
        let addr = deps.api.addr_validate(addr_str)?;
        config.operators.retain(|a| a != addr);
    }
    for addr_str in &add {
        let addr = deps.api.addr_validate(addr_str)?;
        if !config.operators.contains(&addr) {
            config.operators.push(addr);
        }
    }

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_operators")
        .add_attribute("added", add.join(","))
        .add_attribute("removed", remove.join(",")))
}
