//! Fair-share allocator
//!
//! Splits an expense total across participants under one of three
//! strategies. Every successful allocation satisfies:
//!
//! - Σ amount == total, exactly
//! - amount ≥ 0 for every entry
//! - entries follow participant input order
//!
//! # Remainder tie-break
//!
//! Indivisible units are always handed out one at a time in participant
//! input order, wrapping around. Reordering participants moves the odd
//! cent; the result is otherwise deterministic.
//!
//! ```text
//! Equal, total = 100, n = 3:
//!   base = 33, remainder = 1
//!   → [34, 33, 33]
//!
//! Percentage, total = 100, 33.33% / 33.33% / 33.34%:
//!   raw  = [33, 33, 33], diff = +1
//!   → [34, 33, 33]
//! ```

use crate::{
    config::AllocationConfig,
    custom::CustomSplit,
    types::*,
    Error, Result,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How an expense total is divided
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "shares", rename_all = "snake_case")]
pub enum AllocationStrategy {
    /// Same share for everyone, odd units to the first participants
    Equal,

    /// Percent of the total per participant; missing participants get 0%
    Percentage(BTreeMap<ParticipantId, Decimal>),

    /// Explicit amounts in minor units; negative input is clamped to 0
    Custom(BTreeMap<ParticipantId, i64>),
}

impl AllocationStrategy {
    /// Strategy name for logging
    pub fn name(&self) -> &'static str {
        match self {
            AllocationStrategy::Equal => "equal",
            AllocationStrategy::Percentage(_) => "percentage",
            AllocationStrategy::Custom(_) => "custom",
        }
    }
}

/// Allocator
#[derive(Debug, Clone)]
pub struct Allocator {
    /// Accepted deviation from 100% for the completeness check
    percentage_tolerance: Decimal,
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new(&AllocationConfig::default())
    }
}

impl Allocator {
    /// Create new allocator
    pub fn new(config: &AllocationConfig) -> Self {
        Self {
            percentage_tolerance: config.percentage_tolerance,
        }
    }

    /// Split `total` across `participants`.
    ///
    /// `prior_shares` seeds custom amounts for participants the custom map
    /// does not mention, so switching to a custom split starts from the
    /// previous breakdown. It is ignored by the other strategies.
    pub fn allocate(
        &self,
        total: Money,
        strategy: &AllocationStrategy,
        participants: &[Participant],
        prior_shares: Option<&Allocation>,
    ) -> Result<Allocation> {
        if !total.is_positive() {
            return Err(Error::InvalidTotal(total));
        }
        validate_participants(participants)?;

        tracing::debug!(
            strategy = strategy.name(),
            participant_count = participants.len(),
            total = %total,
            "Allocating expense"
        );

        let allocation = match strategy {
            AllocationStrategy::Equal => split_equal(total, participants),
            AllocationStrategy::Percentage(percentages) => {
                split_percentage(total, percentages, participants)?
            }
            AllocationStrategy::Custom(amounts) => {
                split_custom(total, amounts, participants, prior_shares)?
            }
        };

        debug_assert_eq!(allocation.allocated(), Ok(total));
        Ok(allocation)
    }

    /// UI-boundary check: do the percentages add up to 100 within the
    /// configured tolerance? Allocation itself never applies this tolerance.
    pub fn is_percentage_complete(&self, percentages: &BTreeMap<ParticipantId, Decimal>) -> bool {
        (percentage_total(percentages) - Decimal::ONE_HUNDRED).abs() <= self.percentage_tolerance
    }
}

/// Sum of all percentages
pub fn percentage_total(percentages: &BTreeMap<ParticipantId, Decimal>) -> Decimal {
    percentages.values().copied().sum()
}

fn split_equal(total: Money, participants: &[Participant]) -> Allocation {
    let n = participants.len() as i64;
    let base = total.minor_units() / n;
    let remainder = (total.minor_units() - base * n) as usize;

    participants
        .iter()
        .enumerate()
        .map(|(index, participant)| {
            let extra = if index < remainder { 1 } else { 0 };
            AllocationEntry::new(participant.id.clone(), Money::new(base + extra))
        })
        .collect()
}

fn split_percentage(
    total: Money,
    percentages: &BTreeMap<ParticipantId, Decimal>,
    participants: &[Participant],
) -> Result<Allocation> {
    ensure_known(percentages.keys(), participants)?;

    for (participant, percent) in percentages {
        if *percent < Decimal::ZERO {
            return Err(Error::InvalidPercentage {
                participant: participant.clone(),
                percent: *percent,
            });
        }
    }

    let sum = percentage_total(percentages);
    if sum > Decimal::ONE_HUNDRED {
        return Err(Error::PercentageOverflow(sum));
    }

    let total_dec = Decimal::from(total.minor_units());
    let mut entries = participants
        .iter()
        .map(|participant| {
            let percent = percentages
                .get(&participant.id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            let raw = (total_dec * percent / Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
            let amount = raw.to_i64().ok_or(Error::Overflow)?;
            Ok(AllocationEntry::new(participant.id.clone(), Money::new(amount)))
        })
        .collect::<Result<Vec<_>>>()?;

    reconcile_to_total(&mut entries, total)?;
    Ok(Allocation::new(entries))
}

fn split_custom(
    total: Money,
    amounts: &BTreeMap<ParticipantId, i64>,
    participants: &[Participant],
    prior_shares: Option<&Allocation>,
) -> Result<Allocation> {
    ensure_known(amounts.keys(), participants)?;

    let mut split = CustomSplit::new(total, participants)?;
    for participant in participants {
        let entered = match amounts.get(&participant.id) {
            Some(amount) => Money::new(*amount),
            None => prior_shares
                .and_then(|prior| prior.amount_for(&participant.id))
                .unwrap_or(Money::ZERO),
        };
        split.set_amount(&participant.id, entered)?;
    }

    let remaining = split.remaining()?;
    if remaining.is_negative() {
        return Err(Error::OverAllocated {
            allocated: split.allocated()?,
            total,
        });
    }
    if remaining.is_positive() {
        split.distribute_remaining()?;
    }

    split.into_allocation()
}

fn ensure_known<'a>(
    ids: impl Iterator<Item = &'a ParticipantId>,
    participants: &[Participant],
) -> Result<()> {
    for id in ids {
        if !participants.iter().any(|participant| &participant.id == id) {
            return Err(Error::UnknownParticipant(id.clone()));
        }
    }
    Ok(())
}

/// Remainder correction: move `entries` onto `total` exactly.
///
/// The signed gap `total − Σ amount` is applied one unit at a time in
/// entry order, wrapping around. When units are taken away, entries that
/// are already zero are passed over so no share goes negative.
pub fn reconcile_to_total(entries: &mut [AllocationEntry], total: Money) -> Result<()> {
    if total.is_negative() {
        return Err(Error::InvalidTotal(total));
    }

    let allocated = Money::try_sum(entries.iter().map(|entry| entry.amount))?;
    let diff = total.checked_sub(allocated).ok_or(Error::Overflow)?;
    if diff.is_zero() {
        return Ok(());
    }
    if entries.is_empty() {
        return Err(Error::EmptyParticipantSet);
    }
    if let Some(entry) = entries.iter().find(|entry| entry.amount.is_negative()) {
        return Err(Error::NegativeShare {
            participant: entry.participant_id.clone(),
            amount: entry.amount,
        });
    }

    tracing::trace!(diff = %diff, entry_count = entries.len(), "Reconciling allocation");

    if diff.is_positive() {
        let n = entries.len() as i64;
        let per_entry = diff.minor_units() / n;
        let leftover = (diff.minor_units() % n) as usize;
        for (index, entry) in entries.iter_mut().enumerate() {
            let extra = if index < leftover { 1 } else { 0 };
            entry.amount += Money::new(per_entry + extra);
        }
        return Ok(());
    }

    // Σ amount > total ≥ 0, so at least one entry is positive on every round.
    let mut outstanding = diff.abs().minor_units();
    while outstanding > 0 {
        let positive = entries.iter().filter(|entry| entry.amount.is_positive()).count() as i64;
        if outstanding >= positive {
            // Whole rounds: every positive entry gives up the same amount.
            let smallest = entries
                .iter()
                .filter(|entry| entry.amount.is_positive())
                .map(|entry| entry.amount.minor_units())
                .min()
                .unwrap_or(0);
            let rounds = (outstanding / positive).min(smallest);
            for entry in entries.iter_mut().filter(|entry| entry.amount.is_positive()) {
                entry.amount -= Money::new(rounds);
            }
            outstanding -= rounds * positive;
        } else {
            for entry in entries
                .iter_mut()
                .filter(|entry| entry.amount.is_positive())
                .take(outstanding as usize)
            {
                entry.amount -= Money::new(1);
            }
            outstanding = 0;
        }
    }

    Ok(())
}
