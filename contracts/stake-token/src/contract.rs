use cosmwasm_std::{
    entry_point, Binary, Deps, DepsMut, Env, Event, MessageInfo, Response, StdResult,
};
use cw2::{get_contract_version, set_contract_version};

use crate::error::ContractError;
use crate::execute;
use crate::ledger;
use crate::msg::{
    BatchTransferParams, ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg, TransferParams,
    UpdateConfigParams,
};
use crate::query;
use crate::state::{Config, StakingRound, Tier, CONFIG, ROUND, TIERS, TIER_COUNT};

const CONTRACT_NAME: &str = "crates.io:tierstake-token";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[entry_point]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    if msg.tiers.len() != TIER_COUNT {
        return Err(ContractError::InvalidTierCount {
            expected: TIER_COUNT,
            got: msg.tiers.len(),
        });
    }

    let holder = match &msg.initial_holder {
        Some(addr) => deps.api.addr_validate(addr)?,
        None => info.sender.clone(),
    };

    let mut tiers = Vec::with_capacity(TIER_COUNT);
    for (id, init) in msg.tiers.into_iter().enumerate() {
        let id = id as u8;
        if init.face_value.is_zero() {
            return Err(ContractError::ZeroFaceValue { tier_id: id });
        }
        tiers.push(Tier {
            id,
            name: init.name,
            face_value: init.face_value,
            total_supply: init.initial_supply,
        });
    }

    let mut response = Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "stake-token")
        .add_attribute("admin", info.sender.to_string());

    for tier in &tiers {
        ledger::mint(deps.storage, &holder, tier.id, tier.total_supply)?;
        response = response.add_event(
            Event::new("tierstake_mint")
                .add_attribute("to", holder.to_string())
                .add_attribute("tier_id", tier.id.to_string())
                .add_attribute("name", tier.name.clone())
                .add_attribute("face_value", tier.face_value.to_string())
                .add_attribute("amount", tier.total_supply.to_string()),
        );
    }
    TIERS.save(deps.storage, &tiers)?;

    let config = Config {
        admin: info.sender.clone(),
        coordinator: deps.api.addr_validate(&msg.coordinator)?,
        randomness_fee: msg.randomness_fee.filter(|fee| !fee.amount.is_zero()),
    };
    CONFIG.save(deps.storage, &config)?;
    ROUND.save(deps.storage, &StakingRound::idle(0))?;

    Ok(response)
}

#[entry_point]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::Transfer {
            from,
            to,
            tier_id,
            amount,
        } => execute::transfer(
            deps,
            env,
            info,
            TransferParams {
                from,
                to,
                tier_id,
                amount,
            },
        ),
        ExecuteMsg::BatchTransfer {
            from,
            to,
            tier_ids,
            amounts,
        } => execute::batch_transfer(
            deps,
            env,
            info,
            BatchTransferParams {
                from,
                to,
                tier_ids,
                amounts,
            },
        ),
        ExecuteMsg::SetApproval { operator, approved } => {
            execute::set_approval(deps, env, info, operator, approved)
        }
        ExecuteMsg::StartRound { duration_seconds } => {
            execute::start_round(deps, env, info, duration_seconds)
        }
        ExecuteMsg::EnterRound {
            tier_id,
            amount,
            participant,
        } => execute::enter_round(deps, env, info, tier_id, amount, participant),
        ExecuteMsg::CloseRound {} => execute::close_round(deps, env, info),
        ExecuteMsg::FulfillRandomness {
            request_id,
            random_value,
        } => execute::fulfill_randomness(deps, env, info, request_id, random_value),
        ExecuteMsg::UpdateConfig {
            admin,
            coordinator,
            randomness_fee,
        } => execute::update_config(
            deps,
            env,
            info,
            UpdateConfigParams {
                admin,
                coordinator,
                randomness_fee,
            },
        ),
    }
}

#[entry_point]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query::query_config(deps),
        QueryMsg::Tiers {} => query::query_tiers(deps),
        QueryMsg::Tier { tier_id } => query::query_tier(deps, tier_id),
        QueryMsg::TotalSupply { tier_id } => query::query_total_supply(deps, tier_id),
        QueryMsg::Balance { owner, tier_id } => query::query_balance(deps, owner, tier_id),
        QueryMsg::BalanceBatch { owners, tier_ids } => {
            query::query_balance_batch(deps, owners, tier_ids)
        }
        QueryMsg::IsApprovedForAll { owner, operator } => {
            query::query_is_approved_for_all(deps, owner, operator)
        }
        QueryMsg::Escrow {} => query::query_escrow(deps, env),
        QueryMsg::Round {} => query::query_round(deps),
        QueryMsg::EntryAt { index } => query::query_entry_at(deps, index),
        QueryMsg::TicketsOf { address } => query::query_tickets_of(deps, address),
        QueryMsg::Entries { start_after, limit } => query::query_entries(deps, start_after, limit),
        QueryMsg::RecentWinner {} => query::query_recent_winner(deps),
        QueryMsg::RandomnessRequest { request_id } => {
            query::query_randomness_request(deps, request_id)
        }
    }
}

#[entry_point]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::Unauthorized {
            reason: "Cannot migrate from different contract type".to_string(),
        });
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", stored.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}
