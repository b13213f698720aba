//! Expense lifecycle
//!
//! ```text
//! Draft ──confirm(allocation)──▶ Confirmed(allocation)
//! ```
//!
//! Drafts are freely editable. Confirmation fixes the allocation for good;
//! there is no way back to draft and no second confirmation.

use crate::{types::*, Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Expense state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "allocation", rename_all = "snake_case")]
pub enum ExpenseState {
    /// Editable, invisible to settlement
    Draft,
    /// Allocation fixed
    Confirmed(Allocation),
}

/// Shared expense paid by one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Expense ID
    pub id: Uuid,

    /// Total amount (minor units, > 0)
    total_amount: Money,

    /// Participant who paid
    payer_id: ParticipantId,

    /// Date of the expense
    date: NaiveDate,

    /// Free text shown to users
    #[serde(default)]
    description: String,

    /// Lifecycle state
    state: ExpenseState,
}

impl Expense {
    /// Create new draft expense
    pub fn new(total_amount: Money, payer_id: ParticipantId, date: NaiveDate) -> Result<Self> {
        if !total_amount.is_positive() {
            return Err(Error::InvalidTotal(total_amount));
        }

        Ok(Self {
            id: Uuid::now_v7(),
            total_amount,
            payer_id,
            date,
            description: String::new(),
            state: ExpenseState::Draft,
        })
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Total amount
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Payer
    pub fn payer_id(&self) -> &ParticipantId {
        &self.payer_id
    }

    /// Expense date
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Lifecycle state
    pub fn state(&self) -> &ExpenseState {
        &self.state
    }

    /// True once confirmed
    pub fn is_confirmed(&self) -> bool {
        matches!(self.state, ExpenseState::Confirmed(_))
    }

    /// Fixed allocation, if confirmed
    pub fn allocation(&self) -> Option<&Allocation> {
        match &self.state {
            ExpenseState::Confirmed(allocation) => Some(allocation),
            ExpenseState::Draft => None,
        }
    }

    /// Change the total (draft only)
    pub fn set_total_amount(&mut self, total_amount: Money) -> Result<()> {
        self.ensure_draft()?;
        if !total_amount.is_positive() {
            return Err(Error::InvalidTotal(total_amount));
        }
        self.total_amount = total_amount;
        Ok(())
    }

    /// Change the payer (draft only)
    pub fn set_payer(&mut self, payer_id: ParticipantId) -> Result<()> {
        self.ensure_draft()?;
        self.payer_id = payer_id;
        Ok(())
    }

    /// Change the date (draft only)
    pub fn set_date(&mut self, date: NaiveDate) -> Result<()> {
        self.ensure_draft()?;
        self.date = date;
        Ok(())
    }

    /// Change the description (draft only)
    pub fn set_description(&mut self, description: impl Into<String>) -> Result<()> {
        self.ensure_draft()?;
        self.description = description.into();
        Ok(())
    }

    /// Check that `allocation` could confirm this expense, without confirming
    pub fn check_allocation(&self, allocation: &Allocation) -> Result<()> {
        self.ensure_draft()?;
        allocation.validate_against(self.total_amount)
    }

    /// Confirm with a final allocation.
    ///
    /// The allocation must cover the total exactly with non-negative
    /// shares. On error the expense stays a draft.
    pub fn confirm(&mut self, allocation: Allocation) -> Result<()> {
        self.check_allocation(&allocation)?;

        tracing::info!(
            expense_id = %self.id,
            total = %self.total_amount,
            entries = allocation.len(),
            "Expense confirmed"
        );

        self.state = ExpenseState::Confirmed(allocation);
        Ok(())
    }

    fn ensure_draft(&self) -> Result<()> {
        if self.is_confirmed() {
            return Err(Error::AlreadyConfirmed(self.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn allocation(pairs: &[(&str, i64)]) -> Allocation {
        pairs
            .iter()
            .map(|(id, amount)| AllocationEntry::new(ParticipantId::new(*id), Money::new(*amount)))
            .collect()
    }

    #[test]
    fn test_new_expense_is_draft() {
        let expense = Expense::new(Money::new(1200), ParticipantId::new("alice"), date())
            .unwrap()
            .with_description("Dinner");

        assert!(!expense.is_confirmed());
        assert!(expense.allocation().is_none());
        assert_eq!(expense.description(), "Dinner");
    }

    #[test]
    fn test_rejects_non_positive_total() {
        let result = Expense::new(Money::new(-5), ParticipantId::new("alice"), date());
        assert_eq!(result, Err(Error::InvalidTotal(Money::new(-5))));
    }

    #[test]
    fn test_confirm_once() {
        let mut expense = Expense::new(Money::new(100), ParticipantId::new("a"), date()).unwrap();
        expense.confirm(allocation(&[("a", 50), ("b", 50)])).unwrap();
        assert!(expense.is_confirmed());

        let again = expense.confirm(allocation(&[("a", 100)]));
        assert_eq!(again, Err(Error::AlreadyConfirmed(expense.id)));
        assert_eq!(expense.allocation().unwrap().amounts(), vec![50, 50]);
    }

    #[test]
    fn test_confirm_rejects_inexact_allocation() {
        let mut expense = Expense::new(Money::new(100), ParticipantId::new("a"), date()).unwrap();
        let result = expense.confirm(allocation(&[("a", 50), ("b", 49)]));

        assert!(matches!(result, Err(Error::AllocationMismatch { .. })));
        assert!(!expense.is_confirmed());
    }

    #[test]
    fn test_edits_frozen_after_confirmation() {
        let mut expense = Expense::new(Money::new(100), ParticipantId::new("a"), date()).unwrap();
        expense.set_total_amount(Money::new(120)).unwrap();
        expense.set_payer(ParticipantId::new("b")).unwrap();
        expense.confirm(allocation(&[("a", 60), ("b", 60)])).unwrap();

        assert!(expense.set_total_amount(Money::new(90)).is_err());
        assert!(expense.set_payer(ParticipantId::new("a")).is_err());
        assert!(expense.set_description("late edit").is_err());
        assert_eq!(expense.total_amount(), Money::new(120));
    }
}
