use cosmwasm_std::{
    Addr, DepsMut, Env, Event, MessageInfo, Order, Response, StdResult, Storage, Uint128, Uint256,
};
use tierstake_common::{find_winner_index, winning_ticket, RoundStatus};

use crate::error::ContractError;
use crate::gateway;
use crate::ledger::{self, ensure_can_move, move_balances, tickets_for, transfer_event};
use crate::msg::{BatchTransferParams, TransferParams, UpdateConfigParams};
use crate::state::{
    StakeEntry, StakingRound, CONFIG, ENTRIES, ENTRY_SLOTS, RECENT_WINNER, REQUESTS, ROUND,
};

/// Move one tier from `from` to `to`. Owner or approved operator only.
pub fn transfer(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    params: TransferParams,
) -> Result<Response, ContractError> {
    let TransferParams {
        from,
        to,
        tier_id,
        amount,
    } = params;

    let from = deps.api.addr_validate(&from)?;
    let to = deps.api.addr_validate(&to)?;
    ensure_can_move(deps.storage, &info.sender, &from)?;
    ledger::ensure_known_tier(tier_id)?;

    move_balances(deps.storage, &from, &to, &[(tier_id, amount)])?;

    Ok(Response::new()
        .add_attribute("action", "transfer")
        .add_attribute("from", from.to_string())
        .add_attribute("to", to.to_string())
        .add_event(transfer_event(&info.sender, &from, &to, tier_id, amount)))
}

/// Move several tiers from `from` to `to` as one unit.
pub fn batch_transfer(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    params: BatchTransferParams,
) -> Result<Response, ContractError> {
    let BatchTransferParams {
        from,
        to,
        tier_ids,
        amounts,
    } = params;

    let from = deps.api.addr_validate(&from)?;
    let to = deps.api.addr_validate(&to)?;
    ensure_can_move(deps.storage, &info.sender, &from)?;

    if tier_ids.len() != amounts.len() {
        return Err(ContractError::LengthMismatch {
            left: tier_ids.len(),
            right: amounts.len(),
        });
    }

    let legs: Vec<(u8, Uint128)> = tier_ids.into_iter().zip(amounts).collect();
    move_balances(deps.storage, &from, &to, &legs)?;

    let events = legs
        .iter()
        .map(|(tier_id, amount)| transfer_event(&info.sender, &from, &to, *tier_id, *amount));

    Ok(Response::new()
        .add_attribute("action", "batch_transfer")
        .add_attribute("from", from.to_string())
        .add_attribute("to", to.to_string())
        .add_attribute("legs", legs.len().to_string())
        .add_events(events))
}

/// Grant or revoke an operator over all of the caller's balances. Idempotent.
pub fn set_approval(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    operator: String,
    approved: bool,
) -> Result<Response, ContractError> {
    let operator = deps.api.addr_validate(&operator)?;
    ledger::set_approval(deps.storage, &info.sender, &operator, approved)?;

    Ok(Response::new()
        .add_attribute("action", "set_approval")
        .add_event(
            Event::new("tierstake_approval")
                .add_attribute("owner", info.sender.to_string())
                .add_attribute("operator", operator.to_string())
                .add_attribute("approved", approved.to_string()),
        ))
}

/// Open a new round. Anyone may call while the round is idle.
pub fn start_round(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    duration_seconds: u64,
) -> Result<Response, ContractError> {
    let round = ROUND.load(deps.storage)?;
    if round.status != RoundStatus::Idle {
        return Err(ContractError::RoundAlreadyOpen {
            round_id: round.round_id,
        });
    }
    if duration_seconds == 0 {
        return Err(ContractError::InvalidDuration);
    }

    let round_id = round.round_id + 1;
    let deadline = env.block.time.plus_seconds(duration_seconds);
    let mut next = StakingRound::idle(round_id);
    next.status = RoundStatus::Open;
    next.started_at = Some(env.block.time);
    next.deadline = Some(deadline);
    ROUND.save(deps.storage, &next)?;

    Ok(Response::new()
        .add_attribute("action", "start_round")
        .add_attribute("round_id", round_id.to_string())
        .add_event(
            Event::new("tierstake_round_opened")
                .add_attribute("round_id", round_id.to_string())
                .add_attribute("opened_by", info.sender.to_string())
                .add_attribute("deadline", deadline.seconds().to_string()),
        ))
}

/// Stake `amount` of `tier_id` into the open round.
///
/// The tokens move from the participant's ledger balance into the contract's
/// escrow account. A participant keeps the slot of its first entry; later
/// entries only grow that slot's ticket count.
pub fn enter_round(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    tier_id: u8,
    amount: Uint128,
    participant: Option<String>,
) -> Result<Response, ContractError> {
    let mut round = ROUND.load(deps.storage)?;
    if round.status != RoundStatus::Open {
        return Err(ContractError::RoundNotOpen {
            status: round.status.as_str().to_string(),
        });
    }
    if amount.is_zero() {
        return Err(ContractError::ZeroAmount);
    }

    let participant = match participant {
        Some(addr) => deps.api.addr_validate(&addr)?,
        None => info.sender.clone(),
    };
    ensure_can_move(deps.storage, &info.sender, &participant)?;

    let tickets = tickets_for(deps.storage, tier_id, amount)?;
    let total_tickets = round.total_tickets.checked_add(tickets)?;
    let tier_index = usize::from(tier_id);
    let pooled = round.pooled[tier_index].checked_add(amount)?;

    let slot = ENTRY_SLOTS.may_load(deps.storage, &participant)?;
    let (index, entry) = match slot {
        Some(index) => {
            let mut entry = ENTRIES.load(deps.storage, index)?;
            entry.tickets = entry.tickets.checked_add(tickets)?;
            (index, entry)
        }
        None => (
            round.entry_count,
            StakeEntry {
                participant: participant.clone(),
                tickets,
            },
        ),
    };

    let escrow = env.contract.address.clone();
    move_balances(deps.storage, &participant, &escrow, &[(tier_id, amount)])?;

    if slot.is_none() {
        ENTRY_SLOTS.save(deps.storage, &participant, &index)?;
        round.entry_count += 1;
    }
    ENTRIES.save(deps.storage, index, &entry)?;
    round.total_tickets = total_tickets;
    round.pooled[tier_index] = pooled;
    ROUND.save(deps.storage, &round)?;

    Ok(Response::new()
        .add_attribute("action", "enter_round")
        .add_attribute("participant", participant.to_string())
        .add_attribute("tickets", tickets.to_string())
        .add_event(transfer_event(
            &info.sender,
            &participant,
            &escrow,
            tier_id,
            amount,
        ))
        .add_event(
            Event::new("tierstake_entry")
                .add_attribute("round_id", round.round_id.to_string())
                .add_attribute("participant", participant.to_string())
                .add_attribute("tier_id", tier_id.to_string())
                .add_attribute("amount", amount.to_string())
                .add_attribute("tickets", tickets.to_string())
                .add_attribute("index", index.to_string())
                .add_attribute("participant_tickets", entry.tickets.to_string())
                .add_attribute("total_tickets", total_tickets.to_string()),
        ))
}

/// Close the open round once its deadline has passed and request randomness.
pub fn close_round(deps: DepsMut, env: Env, info: MessageInfo) -> Result<Response, ContractError> {
    let mut round = ROUND.load(deps.storage)?;
    if round.status != RoundStatus::Open {
        return Err(ContractError::RoundNotOpen {
            status: round.status.as_str().to_string(),
        });
    }

    let deadline = round.deadline.unwrap_or(env.block.time);
    if env.block.time < deadline {
        return Err(ContractError::TooEarly {
            deadline: deadline.seconds(),
            now: env.block.time.seconds(),
        });
    }

    if round.total_tickets.is_zero() {
        return Err(ContractError::NoStake);
    }

    let config = CONFIG.load(deps.storage)?;
    let (request_id, request_msg) = gateway::request(deps.storage, &env, &config, &round)?;

    round.status = RoundStatus::Closed;
    round.pending_request = Some(request_id.clone());
    ROUND.save(deps.storage, &round)?;

    Ok(Response::new()
        .add_message(request_msg)
        .add_attribute("action", "close_round")
        .add_attribute("round_id", round.round_id.to_string())
        .add_attribute("request_id", request_id.clone())
        .add_event(
            Event::new("tierstake_randomness_requested")
                .add_attribute("round_id", round.round_id.to_string())
                .add_attribute("request_id", request_id)
                .add_attribute("coordinator", config.coordinator.to_string())
                .add_attribute("closed_by", info.sender.to_string())
                .add_attribute("total_tickets", round.total_tickets.to_string()),
        ))
}

/// Randomness callback. Coordinator only.
///
/// Settles the closed round in one step:
/// 1. Validate the request (pending, not yet fulfilled)
/// 2. winning_ticket = random_value mod total_tickets
/// 3. Walk entries in insertion order to the range containing the ticket
/// 4. Pay the whole escrowed pool to the winner
/// 5. Record the winner and reset the round to Idle
pub fn fulfill_randomness(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    request_id: String,
    random_value: Uint256,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.coordinator {
        return Err(ContractError::Unauthorized {
            reason: "only the randomness coordinator can fulfill requests".to_string(),
        });
    }

    let round = ROUND.load(deps.storage)?;
    let request =
        gateway::accept_fulfillment(deps.storage, &env, &round, &request_id, random_value)?;

    let ticket = winning_ticket(random_value, round.total_tickets).ok_or(ContractError::NoStake)?;
    let entries = load_entries(deps.storage, round.entry_count)?;
    let winner_index = find_winner_index(entries.iter().map(|e| e.tickets), ticket)
        .ok_or(ContractError::NoStake)?;
    let winner = entries[winner_index].participant.clone();

    let escrow = env.contract.address.clone();
    let legs: Vec<(u8, Uint128)> = round
        .pooled
        .iter()
        .enumerate()
        .filter(|(_, amount)| !amount.is_zero())
        .map(|(tier_id, amount)| (tier_id as u8, *amount))
        .collect();
    move_balances(deps.storage, &escrow, &winner, &legs)?;

    REQUESTS.save(deps.storage, &request_id, &request)?;
    RECENT_WINNER.save(deps.storage, &winner)?;
    clear_entries(deps.storage, round.entry_count)?;
    ROUND.save(deps.storage, &StakingRound::idle(round.round_id))?;

    let payout_events = legs
        .iter()
        .map(|(tier_id, amount)| transfer_event(&escrow, &escrow, &winner, *tier_id, *amount));

    Ok(Response::new()
        .add_attribute("action", "fulfill_randomness")
        .add_attribute("round_id", round.round_id.to_string())
        .add_attribute("winner", winner.to_string())
        .add_events(payout_events)
        .add_event(
            Event::new("tierstake_round_settled")
                .add_attribute("round_id", round.round_id.to_string())
                .add_attribute("request_id", request_id)
                .add_attribute("winner", winner.to_string())
                .add_attribute("winner_index", winner_index.to_string())
                .add_attribute("winning_ticket", ticket.to_string())
                .add_attribute("total_tickets", round.total_tickets.to_string())
                .add_attribute("random_value", random_value.to_string())
                .add_attribute("payout", format_pool(&round.pooled))
                .add_attribute("timestamp", env.block.time.seconds().to_string()),
        ))
}

/// Update configuration. Admin only.
pub fn update_config(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    params: UpdateConfigParams,
) -> Result<Response, ContractError> {
    let UpdateConfigParams {
        admin,
        coordinator,
        randomness_fee,
    } = params;

    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can update config".to_string(),
        });
    }

    if let Some(admin) = admin {
        config.admin = deps.api.addr_validate(&admin)?;
    }
    if let Some(coordinator) = coordinator {
        config.coordinator = deps.api.addr_validate(&coordinator)?;
    }
    if let Some(fee) = randomness_fee {
        config.randomness_fee = if fee.amount.is_zero() { None } else { Some(fee) };
    }

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attribute("action", "update_config"))
}

fn load_entries(storage: &dyn Storage, entry_count: u32) -> StdResult<Vec<StakeEntry>> {
    ENTRIES
        .range(storage, None, None, Order::Ascending)
        .take(entry_count as usize)
        .map(|r| r.map(|(_, entry)| entry))
        .collect()
}

fn clear_entries(storage: &mut dyn Storage, entry_count: u32) -> StdResult<()> {
    let participants: Vec<(u32, Addr)> = ENTRIES
        .range(storage, None, None, Order::Ascending)
        .take(entry_count as usize)
        .map(|r| r.map(|(index, entry)| (index, entry.participant)))
        .collect::<StdResult<_>>()?;

    for (index, participant) in participants {
        ENTRIES.remove(storage, index);
        ENTRY_SLOTS.remove(storage, &participant);
    }
    Ok(())
}

fn format_pool(pooled: &[Uint128]) -> String {
    pooled
        .iter()
        .map(|amount| amount.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
