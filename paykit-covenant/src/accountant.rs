//! Allowance accounting.
//!
//! [`next_state`] is a pure function from (parameters, current state, request
//! time, requested amount) to the successor state. Case analysis runs over two
//! orthogonal conditions: where the request falls relative to the window
//! boundaries ([`WindowPosition`]) and whether accumulation is enabled.
//!
//! | position | no accumulation  | accumulation                       |
//! |----------|------------------|------------------------------------|
//! | current  | `R - q`          | `R - q`                            |
//! | next     | `M - q`          | `M + R - q`                        |
//! | missed   | `M - q`          | `q - R == k * M` required, then `M` |
//!
//! `R` is the remaining amount, `q` the requested amount, `M` the maximum per
//! epoch and `k` the missed epoch count. The result must land in `[0, M]`.

use crate::contract::{ContractParameters, ContractState};
use crate::{Amount, CovenantError, Result};

/// Where a request falls relative to the window boundaries of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    /// Epoch length is zero; there are no windows
    Unbounded,
    /// No window boundary crossed since the state was created
    Current,
    /// Exactly one boundary crossed, no window fully missed
    Next,
    /// At least one window passed without a withdrawal
    Missed { missed_epochs: u64 },
}

/// Classify `elapsed` blocks against a window of `epoch_length` blocks that
/// has `remaining_time` blocks left.
pub fn window_position(epoch_length: u32, remaining_time: u32, elapsed: u64) -> WindowPosition {
    if epoch_length == 0 {
        return WindowPosition::Unbounded;
    }
    let epoch = u64::from(epoch_length);
    let remaining = u64::from(remaining_time);
    if elapsed < remaining {
        WindowPosition::Current
    } else if elapsed < epoch + remaining {
        WindowPosition::Next
    } else {
        WindowPosition::Missed {
            missed_epochs: (elapsed - elapsed % epoch) / epoch,
        }
    }
}

/// Blocks left in the window containing the request.
///
/// Always in `1..=epoch_length` for a non-zero epoch, `0` otherwise.
pub fn next_remaining_time(epoch_length: u32, remaining_time: u32, elapsed: u64) -> u32 {
    if epoch_length == 0 {
        return 0;
    }
    let epoch = i64::from(epoch_length);
    // elapsed % epoch < epoch <= u32::MAX, so the cast is lossless
    let offset = (elapsed % epoch as u64) as i64;
    let time_difference = i64::from(remaining_time) - offset;
    let next = if time_difference > 0 {
        time_difference
    } else {
        epoch - time_difference.abs()
    };
    // next is in (0, epoch] because remaining_time <= epoch and offset < epoch
    next as u32
}

fn elapsed_since(state: &ContractState, request_time: u32) -> Result<u64> {
    let elapsed = i64::from(request_time) - i64::from(state.valid_from);
    if elapsed < 0 {
        return Err(CovenantError::timing(format!(
            "request time {} precedes state valid-from {}",
            request_time, state.valid_from
        )));
    }
    Ok(elapsed as u64)
}

fn subtract(from: Amount, requested: Amount) -> Result<Amount> {
    from.checked_sub(&requested).ok_or_else(|| {
        CovenantError::range(format!(
            "requested {} exceeds available allowance {}",
            requested, from
        ))
    })
}

fn accumulated_backlog(
    remaining: Amount,
    requested: Amount,
    max_per_epoch: Amount,
    missed_epochs: u64,
) -> Result<Amount> {
    let mismatch = || CovenantError::AccumulationMismatch {
        requested: requested.as_sats(),
        expected: max_per_epoch
            .checked_mul(missed_epochs)
            .and_then(|backlog| backlog.checked_add(&remaining))
            .map_or(u64::MAX, |expected| expected.as_sats()),
        missed_epochs,
    };

    let backlog = requested.checked_sub(&remaining).ok_or_else(mismatch)?;
    let max = max_per_epoch.as_sats();
    let whole_epochs = backlog
        .as_sats()
        .checked_div(max)
        .ok_or_else(|| CovenantError::range("max amount per epoch is zero"))?;
    let leftover = backlog.as_sats() % max;
    if leftover != 0 || whole_epochs != missed_epochs {
        return Err(mismatch());
    }
    Ok(max_per_epoch)
}

/// Compute the successor state for a withdrawal of `requested` at
/// `request_time`.
///
/// # Errors
///
/// - [`CovenantError::Timing`] if `request_time` precedes the state
/// - [`CovenantError::Range`] if the request is below `min_transferable`,
///   above the epoch budget (without accumulation), or the resulting
///   allowance leaves `[0, max_amount_per_epoch]`
/// - [`CovenantError::AccumulationMismatch`] if a backlog withdrawal is not
///   exactly the unclaimed remainder plus one budget per missed epoch
///
/// # Examples
///
/// ```rust
/// use paykit_covenant::accountant::next_state;
/// use paykit_covenant::{Amount, ContractParameters, ContractState, PayeeIdentity, PayerIdentity, PublicKey};
///
/// let params = ContractParameters::new(
///     PayerIdentity::Key(PublicKey([1u8; 32])),
///     PayeeIdentity::Key(PublicKey([2u8; 32])),
///     10,
///     Amount::from_sats(3000),
/// );
/// let state = ContractState { valid_from: 100, remaining_time: 2, remaining_amount: Amount::from_sats(1000) };
///
/// let next = next_state(&params, &state, 101, Amount::from_sats(1000), Amount::from_sats(546)).unwrap();
/// assert_eq!(next.remaining_amount, Amount::zero());
/// assert_eq!(next.remaining_time, 1);
/// assert_eq!(next.valid_from, 101);
/// ```
pub fn next_state(
    params: &ContractParameters,
    state: &ContractState,
    request_time: u32,
    requested: Amount,
    min_transferable: Amount,
) -> Result<ContractState> {
    let elapsed = elapsed_since(state, request_time)?;
    let max = params.max_amount_per_epoch;

    if requested < min_transferable {
        return Err(CovenantError::range(format!(
            "requested {} is below the minimum transferable amount {}",
            requested, min_transferable
        )));
    }
    if !params.accumulation && !requested.is_within_limit(&max) {
        return Err(CovenantError::range(format!(
            "requested {} exceeds max amount per epoch {}",
            requested, max
        )));
    }

    let position = window_position(params.epoch_length, state.remaining_time, elapsed);
    let remaining = state.remaining_amount;

    let next_amount = match (position, params.accumulation) {
        (WindowPosition::Unbounded, _) => subtract(max, requested)?,
        (WindowPosition::Current, _) => subtract(remaining, requested)?,
        (WindowPosition::Next, true) => {
            let carried = max
                .checked_add(&remaining)
                .ok_or_else(|| CovenantError::range("carried allowance overflows"))?;
            subtract(carried, requested)?
        }
        (WindowPosition::Missed { missed_epochs }, true) => {
            accumulated_backlog(remaining, requested, max, missed_epochs)?
        }
        (WindowPosition::Next | WindowPosition::Missed { .. }, false) => subtract(max, requested)?,
    };

    if !next_amount.is_within_limit(&max) {
        return Err(CovenantError::range(format!(
            "resulting allowance {} exceeds max amount per epoch {}",
            next_amount, max
        )));
    }

    let next = ContractState {
        valid_from: request_time,
        remaining_time: next_remaining_time(params.epoch_length, state.remaining_time, elapsed),
        remaining_amount: next_amount,
    };

    tracing::trace!(
        ?position,
        elapsed,
        requested = requested.as_sats(),
        remaining_amount = next.remaining_amount.as_sats(),
        remaining_time = next.remaining_time,
        "allowance transition computed"
    );

    Ok(next)
}
