//! Core types for allocation
//!
//! All amounts are integer minor currency units (cents, fils, paise).
//! There is no floating point anywhere in the money path.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Participant identifier (opaque token supplied by the caller)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create new participant ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Participant in a shared expense
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant ID
    pub id: ParticipantId,

    /// Display name (not used by any computation)
    #[serde(default)]
    pub display_name: String,
}

impl Participant {
    /// Create new participant
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: ParticipantId::new(id),
            display_name: display_name.into(),
        }
    }
}

/// Reject an empty participant list or one with a repeated id
pub fn validate_participants(participants: &[Participant]) -> Result<()> {
    if participants.is_empty() {
        return Err(Error::EmptyParticipantSet);
    }

    let mut seen = HashSet::with_capacity(participants.len());
    for participant in participants {
        if !seen.insert(&participant.id) {
            return Err(Error::DuplicateParticipant(participant.id.clone()));
        }
    }

    Ok(())
}

/// Amount in integer minor currency units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero amount
    pub const ZERO: Money = Money(0);

    /// Create from minor units
    pub const fn new(minor_units: i64) -> Self {
        Self(minor_units)
    }

    /// Amount in minor units
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Absolute value
    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// True if zero
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// True if strictly positive
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// True if strictly negative
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Checked absolute value; `None` for `i64::MIN`
    pub fn checked_abs(self) -> Option<Money> {
        self.0.checked_abs().map(Money)
    }

    /// Sum amounts, failing on overflow instead of wrapping
    pub fn try_sum<I>(amounts: I) -> Result<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, amount| acc.checked_add(amount))
            .ok_or(Error::Overflow)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Money {
    fn from(minor_units: i64) -> Self {
        Self(minor_units)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

/// One participant's share of an expense
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationEntry {
    /// Participant ID
    pub participant_id: ParticipantId,

    /// Share owed
    pub amount: Money,
}

impl AllocationEntry {
    /// Create new entry
    pub fn new(participant_id: ParticipantId, amount: Money) -> Self {
        Self {
            participant_id,
            amount,
        }
    }
}

/// Per-participant breakdown of an expense total, in participant order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Allocation {
    entries: Vec<AllocationEntry>,
}

impl Allocation {
    /// Create from entries (order is preserved)
    pub fn new(entries: Vec<AllocationEntry>) -> Self {
        Self { entries }
    }

    /// Entries in participant order
    pub fn entries(&self) -> &[AllocationEntry] {
        &self.entries
    }

    /// Consume into entries
    pub fn into_entries(self) -> Vec<AllocationEntry> {
        self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Share of a participant, if present
    pub fn amount_for(&self, participant_id: &ParticipantId) -> Option<Money> {
        self.entries
            .iter()
            .find(|entry| &entry.participant_id == participant_id)
            .map(|entry| entry.amount)
    }

    /// Sum of all entries
    pub fn allocated(&self) -> Result<Money> {
        Money::try_sum(self.entries.iter().map(|entry| entry.amount))
    }

    /// Amounts only, in entry order
    pub fn amounts(&self) -> Vec<i64> {
        self.entries
            .iter()
            .map(|entry| entry.amount.minor_units())
            .collect()
    }

    /// Check the per-entry invariants: no repeated participant, no
    /// negative share.
    pub fn validate_entries(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !seen.insert(&entry.participant_id) {
                return Err(Error::DuplicateParticipant(entry.participant_id.clone()));
            }
            if entry.amount.is_negative() {
                return Err(Error::NegativeShare {
                    participant: entry.participant_id.clone(),
                    amount: entry.amount,
                });
            }
        }
        Ok(())
    }

    /// Check the persistence invariants against an expense total:
    /// entries valid and an exact sum.
    pub fn validate_against(&self, total: Money) -> Result<()> {
        self.validate_entries()?;

        let allocated = self.allocated()?;
        if allocated != total {
            return Err(Error::AllocationMismatch { allocated, total });
        }

        Ok(())
    }
}

impl FromIterator<AllocationEntry> for Allocation {
    fn from_iter<I: IntoIterator<Item = AllocationEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocation(pairs: &[(&str, i64)]) -> Allocation {
        pairs
            .iter()
            .map(|(id, amount)| AllocationEntry::new(ParticipantId::new(*id), Money::new(*amount)))
            .collect()
    }

    #[test]
    fn test_money_arithmetic() {
        let mut amount = Money::new(150);
        amount += Money::new(50);
        amount -= Money::new(25);
        assert_eq!(amount, Money::new(175));
        assert_eq!(-amount, Money::new(-175));
        assert_eq!((-amount).abs(), amount);
    }

    #[test]
    fn test_try_sum_overflow() {
        let result = Money::try_sum([Money::new(i64::MAX), Money::new(1)]);
        assert_eq!(result, Err(Error::Overflow));
    }

    #[test]
    fn test_validate_participants() {
        assert_eq!(validate_participants(&[]), Err(Error::EmptyParticipantSet));

        let participants = vec![
            Participant::new("alice", "Alice"),
            Participant::new("bob", "Bob"),
            Participant::new("alice", "Alice again"),
        ];
        assert_eq!(
            validate_participants(&participants),
            Err(Error::DuplicateParticipant(ParticipantId::new("alice")))
        );
    }

    #[test]
    fn test_allocation_validate_against() {
        let ok = allocation(&[("a", 60), ("b", 40)]);
        assert!(ok.validate_against(Money::new(100)).is_ok());

        let short = allocation(&[("a", 60), ("b", 30)]);
        assert_eq!(
            short.validate_against(Money::new(100)),
            Err(Error::AllocationMismatch {
                allocated: Money::new(90),
                total: Money::new(100),
            })
        );

        let negative = allocation(&[("a", 110), ("b", -10)]);
        assert!(matches!(
            negative.validate_against(Money::new(100)),
            Err(Error::NegativeShare { .. })
        ));
    }

    #[test]
    fn test_checked_abs_at_minimum() {
        assert_eq!(Money::new(-40).checked_abs(), Some(Money::new(40)));
        assert_eq!(Money::new(i64::MIN).checked_abs(), None);
    }

    #[test]
    fn test_validate_entries_ignores_sum() {
        let short = allocation(&[("a", 60), ("b", 30)]);
        assert!(short.validate_entries().is_ok());

        let repeated = allocation(&[("a", 60), ("a", 40)]);
        assert_eq!(
            repeated.validate_entries(),
            Err(Error::DuplicateParticipant(ParticipantId::new("a")))
        );
    }

    #[test]
    fn test_money_serializes_as_integer() {
        let json = serde_json::to_string(&Money::new(1250)).unwrap();
        assert_eq!(json, "1250");
    }
}
