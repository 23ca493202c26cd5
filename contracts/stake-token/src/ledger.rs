//! Ledger primitives: tier catalog lookups, balances, approvals.
//!
//! Every mutating helper validates all of its legs before writing anything, so
//! a rejected call leaves storage exactly as it found it.

use cosmwasm_std::{Addr, Event, StdResult, Storage, Uint128};

use crate::error::ContractError;
use crate::state::{Tier, APPROVALS, BALANCES, TIERS, TIER_COUNT};

pub fn load_tier(storage: &dyn Storage, tier_id: u8) -> Result<Tier, ContractError> {
    let tiers = TIERS.load(storage)?;
    tiers
        .into_iter()
        .find(|t| t.id == tier_id)
        .ok_or(ContractError::UnknownTier { tier_id })
}

pub fn face_value(storage: &dyn Storage, tier_id: u8) -> Result<Uint128, ContractError> {
    Ok(load_tier(storage, tier_id)?.face_value)
}

/// `tickets = amount * face_value(tier_id)`, rejecting overflow.
pub fn tickets_for(
    storage: &dyn Storage,
    tier_id: u8,
    amount: Uint128,
) -> Result<Uint128, ContractError> {
    let value = face_value(storage, tier_id)?;
    Ok(amount.checked_mul(value)?)
}

pub fn ensure_known_tier(tier_id: u8) -> Result<(), ContractError> {
    if usize::from(tier_id) >= TIER_COUNT {
        return Err(ContractError::UnknownTier { tier_id });
    }
    Ok(())
}

pub fn balance_of(storage: &dyn Storage, owner: &Addr, tier_id: u8) -> StdResult<Uint128> {
    Ok(BALANCES
        .may_load(storage, (owner, tier_id))?
        .unwrap_or_default())
}

pub fn is_approved(storage: &dyn Storage, owner: &Addr, operator: &Addr) -> StdResult<bool> {
    Ok(APPROVALS
        .may_load(storage, (owner, operator))?
        .unwrap_or(false))
}

pub fn set_approval(
    storage: &mut dyn Storage,
    owner: &Addr,
    operator: &Addr,
    approved: bool,
) -> StdResult<()> {
    if approved {
        APPROVALS.save(storage, (owner, operator), &true)
    } else {
        APPROVALS.remove(storage, (owner, operator));
        Ok(())
    }
}

/// The owner may always move its own balance; anyone else needs an approval.
pub fn ensure_can_move(
    storage: &dyn Storage,
    caller: &Addr,
    owner: &Addr,
) -> Result<(), ContractError> {
    if caller == owner || is_approved(storage, owner, caller)? {
        return Ok(());
    }
    Err(ContractError::Unauthorized {
        reason: format!("{caller} is neither {owner} nor an approved operator"),
    })
}

/// Move every `(tier_id, amount)` leg from `from` to `to` as one unit.
///
/// Legs for the same tier are summed before the balance check, so a batch
/// cannot spend the same balance twice.
pub fn move_balances(
    storage: &mut dyn Storage,
    from: &Addr,
    to: &Addr,
    legs: &[(u8, Uint128)],
) -> Result<(), ContractError> {
    let mut debits = [Uint128::zero(); TIER_COUNT];
    for (tier_id, amount) in legs {
        ensure_known_tier(*tier_id)?;
        let slot = &mut debits[usize::from(*tier_id)];
        *slot = slot.checked_add(*amount)?;
    }

    for (index, needed) in debits.iter().enumerate() {
        if needed.is_zero() {
            continue;
        }
        let tier_id = index as u8;
        let available = balance_of(storage, from, tier_id)?;
        if available < *needed {
            return Err(ContractError::InsufficientBalance {
                tier_id,
                needed: *needed,
                available,
            });
        }
        // Supply is conserved, so a credit can only overflow on a corrupted ledger.
        balance_of(storage, to, tier_id)?.checked_add(*needed)?;
    }

    for (index, amount) in debits.iter().enumerate() {
        if amount.is_zero() || from == to {
            continue;
        }
        let tier_id = index as u8;
        let from_balance = balance_of(storage, from, tier_id)?.checked_sub(*amount)?;
        if from_balance.is_zero() {
            BALANCES.remove(storage, (from, tier_id));
        } else {
            BALANCES.save(storage, (from, tier_id), &from_balance)?;
        }
        let to_balance = balance_of(storage, to, tier_id)?.checked_add(*amount)?;
        BALANCES.save(storage, (to, tier_id), &to_balance)?;
    }

    Ok(())
}

/// Credit freshly minted supply. Only used at genesis.
pub fn mint(
    storage: &mut dyn Storage,
    to: &Addr,
    tier_id: u8,
    amount: Uint128,
) -> Result<(), ContractError> {
    let balance = balance_of(storage, to, tier_id)?.checked_add(amount)?;
    BALANCES.save(storage, (to, tier_id), &balance)?;
    Ok(())
}

pub fn transfer_event(
    operator: &Addr,
    from: &Addr,
    to: &Addr,
    tier_id: u8,
    amount: Uint128,
) -> Event {
    Event::new("tierstake_transfer")
        .add_attribute("operator", operator.to_string())
        .add_attribute("from", from.to_string())
        .add_attribute("to", to.to_string())
        .add_attribute("tier_id", tier_id.to_string())
        .add_attribute("amount", amount.to_string())
}
