use cosmwasm_std::{Uint128, Uint256};

/// Reduce a random value onto the ticket space: `random_value mod total_tickets`.
///
/// Returns `None` when there are no tickets.
pub fn winning_ticket(random_value: Uint256, total_tickets: Uint128) -> Option<Uint128> {
    if total_tickets.is_zero() {
        return None;
    }
    let ticket = random_value.checked_rem(Uint256::from(total_tickets)).ok()?;
    // ticket < total_tickets, so it always fits back into 128 bits
    Uint128::try_from(ticket).ok()
}

/// Find the entry owning `winning_ticket`.
///
/// Entries own consecutive half-open ranges in insertion order: entry `i` owns
/// `[offset_{i-1}, offset_i)` where `offset_i` is the sum of the weights of
/// entries `0..=i`. The scan stops at the first entry whose running sum is
/// strictly greater than the winning ticket.
pub fn find_winner_index<I>(weights: I, winning_ticket: Uint128) -> Option<usize>
where
    I: IntoIterator<Item = Uint128>,
{
    let mut cumulative = Uint128::zero();
    for (index, weight) in weights.into_iter().enumerate() {
        cumulative = cumulative.checked_add(weight).ok()?;
        if cumulative > winning_ticket {
            return Some(index);
        }
    }
    None
}
