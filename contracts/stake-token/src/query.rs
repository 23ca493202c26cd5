use cosmwasm_std::{to_json_binary, Binary, Deps, Env, Order, StdError, StdResult, Uint128};
use cw_storage_plus::Bound;

use crate::error::ContractError;
use crate::ledger::{balance_of, is_approved, load_tier};
use crate::msg::{
    ApprovalResponse, BalanceBatchResponse, BalanceResponse, EntriesResponse, EntryInfo,
    EscrowResponse, RoundResponse, TicketsResponse,
};
use crate::state::{
    CONFIG, ENTRIES, ENTRY_SLOTS, RECENT_WINNER, REQUESTS, ROUND, TIERS, TIER_COUNT,
};

fn into_std(err: ContractError) -> StdError {
    match err {
        ContractError::Std(e) => e,
        other => StdError::generic_err(other.to_string()),
    }
}

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config)
}

pub fn query_tiers(deps: Deps) -> StdResult<Binary> {
    let tiers = TIERS.load(deps.storage)?;
    to_json_binary(&tiers)
}

pub fn query_tier(deps: Deps, tier_id: u8) -> StdResult<Binary> {
    let tier = load_tier(deps.storage, tier_id).map_err(into_std)?;
    to_json_binary(&tier)
}

pub fn query_total_supply(deps: Deps, tier_id: u8) -> StdResult<Binary> {
    let tier = load_tier(deps.storage, tier_id).map_err(into_std)?;
    to_json_binary(&tier.total_supply)
}

pub fn query_balance(deps: Deps, owner: String, tier_id: u8) -> StdResult<Binary> {
    let owner = deps.api.addr_validate(&owner)?;
    load_tier(deps.storage, tier_id).map_err(into_std)?;
    let balance = balance_of(deps.storage, &owner, tier_id)?;
    to_json_binary(&BalanceResponse { balance })
}

pub fn query_balance_batch(deps: Deps, owners: Vec<String>, tier_ids: Vec<u8>) -> StdResult<Binary> {
    if owners.len() != tier_ids.len() {
        return Err(into_std(ContractError::LengthMismatch {
            left: owners.len(),
            right: tier_ids.len(),
        }));
    }

    let balances = owners
        .iter()
        .zip(tier_ids)
        .map(|(owner, tier_id)| {
            let owner = deps.api.addr_validate(owner)?;
            load_tier(deps.storage, tier_id).map_err(into_std)?;
            balance_of(deps.storage, &owner, tier_id)
        })
        .collect::<StdResult<Vec<_>>>()?;

    to_json_binary(&BalanceBatchResponse { balances })
}

pub fn query_is_approved_for_all(deps: Deps, owner: String, operator: String) -> StdResult<Binary> {
    let owner = deps.api.addr_validate(&owner)?;
    let operator = deps.api.addr_validate(&operator)?;
    let approved = is_approved(deps.storage, &owner, &operator)?;
    to_json_binary(&ApprovalResponse { approved })
}

pub fn query_escrow(deps: Deps, env: Env) -> StdResult<Binary> {
    let address = env.contract.address;
    let balances = (0..TIER_COUNT as u8)
        .map(|tier_id| balance_of(deps.storage, &address, tier_id))
        .collect::<StdResult<Vec<_>>>()?;
    to_json_binary(&EscrowResponse { address, balances })
}

pub fn query_round(deps: Deps) -> StdResult<Binary> {
    let round = ROUND.load(deps.storage)?;
    to_json_binary(&RoundResponse {
        round_id: round.round_id,
        status: round.status,
        started_at: round.started_at,
        deadline: round.deadline,
        total_tickets: round.total_tickets,
        entry_count: round.entry_count,
        pooled: round.pooled,
        pending_request: round.pending_request,
    })
}

pub fn query_entry_at(deps: Deps, index: u32) -> StdResult<Binary> {
    let entry = ENTRIES.may_load(deps.storage, index)?;
    to_json_binary(&entry)
}

pub fn query_tickets_of(deps: Deps, address: String) -> StdResult<Binary> {
    let addr = deps.api.addr_validate(&address)?;
    let tickets = match ENTRY_SLOTS.may_load(deps.storage, &addr)? {
        Some(index) => ENTRIES.load(deps.storage, index)?.tickets,
        None => Uint128::zero(),
    };
    to_json_binary(&TicketsResponse { address, tickets })
}

pub fn query_entries(deps: Deps, start_after: Option<u32>, limit: Option<u32>) -> StdResult<Binary> {
    let limit = limit.unwrap_or(50).min(100) as usize;
    let start = start_after.map(Bound::exclusive);

    let entries: Vec<EntryInfo> = ENTRIES
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .filter_map(|r| r.ok())
        .map(|(index, entry)| EntryInfo {
            index,
            participant: entry.participant,
            tickets: entry.tickets,
        })
        .collect();

    to_json_binary(&EntriesResponse { entries })
}

pub fn query_recent_winner(deps: Deps) -> StdResult<Binary> {
    let winner = RECENT_WINNER.may_load(deps.storage)?;
    to_json_binary(&winner)
}

pub fn query_randomness_request(deps: Deps, request_id: String) -> StdResult<Binary> {
    let request = REQUESTS.may_load(deps.storage, &request_id)?;
    to_json_binary(&request)
}
