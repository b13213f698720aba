//! Interactive custom split
//!
//! A `CustomSplit` is the editable state behind a custom allocation: the
//! amounts may temporarily under- or over-shoot the total while the user
//! types. Only `into_allocation` enforces exactness.

use crate::{types::*, Error, Result};
use serde::{Deserialize, Serialize};

/// Editable custom allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSplit {
    total: Money,
    entries: Vec<AllocationEntry>,
}

impl CustomSplit {
    /// Start a split with every participant at zero
    pub fn new(total: Money, participants: &[Participant]) -> Result<Self> {
        if !total.is_positive() {
            return Err(Error::InvalidTotal(total));
        }
        validate_participants(participants)?;

        let entries = participants
            .iter()
            .map(|participant| AllocationEntry::new(participant.id.clone(), Money::ZERO))
            .collect();

        Ok(Self { total, entries })
    }

    /// Expense total
    pub fn total(&self) -> Money {
        self.total
    }

    /// Current entries in participant order
    pub fn entries(&self) -> &[AllocationEntry] {
        &self.entries
    }

    /// Set a participant's amount; negative input is clamped to zero
    pub fn set_amount(&mut self, participant_id: &ParticipantId, amount: Money) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| &entry.participant_id == participant_id)
            .ok_or_else(|| Error::UnknownParticipant(participant_id.clone()))?;

        entry.amount = amount.max(Money::ZERO);
        Ok(())
    }

    /// Sum of entered amounts
    pub fn allocated(&self) -> Result<Money> {
        Money::try_sum(self.entries.iter().map(|entry| entry.amount))
    }

    /// `total − allocated`; negative when over-allocated
    pub fn remaining(&self) -> Result<Money> {
        self.total
            .checked_sub(self.allocated()?)
            .ok_or(Error::Overflow)
    }

    /// Hand the unassigned remainder to participants still at zero.
    ///
    /// Each zero-amount participant gets `floor(remaining / k)`, and the
    /// leftover units go one each to the first of them in order. Returns
    /// the amount distributed.
    ///
    /// An over-allocated split is reported as `OverAllocated`: taking units
    /// away from zero-amount participants would make their shares negative.
    pub fn distribute_remaining(&mut self) -> Result<Money> {
        let remaining = self.remaining()?;
        if remaining.is_negative() {
            return Err(Error::OverAllocated {
                allocated: self.allocated()?,
                total: self.total,
            });
        }
        if remaining.is_zero() {
            return Ok(Money::ZERO);
        }

        let mut eligible: Vec<&mut AllocationEntry> = self
            .entries
            .iter_mut()
            .filter(|entry| entry.amount.is_zero())
            .collect();
        if eligible.is_empty() {
            return Err(Error::NothingToDistribute);
        }

        let k = eligible.len() as i64;
        let per_head = remaining.minor_units() / k;
        let leftover = (remaining.minor_units() - per_head * k) as usize;

        tracing::debug!(
            remaining = %remaining,
            eligible = eligible.len(),
            per_head,
            "Distributing remainder of custom split"
        );

        for (index, entry) in eligible.iter_mut().enumerate() {
            let extra = if index < leftover { 1 } else { 0 };
            entry.amount = Money::new(per_head + extra);
        }

        Ok(remaining)
    }

    /// Finish editing; the amounts must match the total exactly
    pub fn into_allocation(self) -> Result<Allocation> {
        let remaining = self.remaining()?;
        if remaining.is_negative() {
            return Err(Error::OverAllocated {
                allocated: self.allocated()?,
                total: self.total,
            });
        }
        if remaining.is_positive() {
            return Err(Error::UnderAllocated { remaining });
        }

        Ok(Allocation::new(self.entries))
    }
}
