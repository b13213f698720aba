//! Net settlement solver
//!
//! Turns confirmed expenses into per-participant balances, then reduces the
//! balances to pairwise transfers with a deterministic greedy match.
//!
//! # Algorithm
//!
//! 1. Accumulate `paid` (expenses paid) and `owed` (allocated shares)
//! 2. Net position = paid − owed; Σ net must be zero
//! 3. Creditors sorted by net descending, debtors most negative first
//! 4. Walk both lists with two cursors, each debtor paying down creditors
//!    in order
//!
//! Produces at most `debtors + creditors − 1` transfers. This is not the
//! minimum transfer count in general, but every transfer traces to one
//! debtor paying one creditor in a reproducible order.
//!
//! # Example
//!
//! ```text
//! Expenses:
//!   A paid 300, split A 100 / B 100 / C 100
//!
//! Net positions:
//!   A: +200 (creditor)
//!   B: -100 (debtor)
//!   C: -100 (debtor)
//!
//! Transfers:
//!   B pays A: 100
//!   C pays A: 100
//! ```

use crate::{config::TieBreak, types::*, Error, Result};
use allocation_core::{Allocation, Expense, Money, Participant, ParticipantId};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Nets smaller than this (in minor units) count as settled. With integer
/// money only an exact zero is below it, so collapsing never moves a net.
pub const ZERO_TOLERANCE: Money = Money::new(1);

/// Netting engine
#[derive(Debug, Clone, Default)]
pub struct NettingEngine {
    /// Order among equal nets
    tie_break: TieBreak,
}

impl NettingEngine {
    /// Create new netting engine
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    /// Compute each participant's paid, owed, and net position.
    ///
    /// Draft expenses are skipped. A confirmed expense with a non-positive
    /// total, a negative share, or a repeated participant fails with
    /// `InvalidExpense`. Fails with `UnbalancedLedger` if the confirmed
    /// allocations do not add up to what was paid.
    pub fn compute_balances(
        &self,
        expenses: &[Expense],
        participants: &[Participant],
    ) -> Result<Balances> {
        if participants.is_empty() {
            return Err(Error::EmptyParticipantSet);
        }

        let mut index: HashMap<&ParticipantId, usize> = HashMap::with_capacity(participants.len());
        for (position, participant) in participants.iter().enumerate() {
            if index.insert(&participant.id, position).is_some() {
                return Err(Error::DuplicateParticipant(participant.id.clone()));
            }
        }

        let mut balances: Vec<Balance> = participants
            .iter()
            .map(|participant| Balance::new(participant.id.clone()))
            .collect();

        let lookup = |expense: &Expense, participant: &ParticipantId| {
            index
                .get(participant)
                .copied()
                .ok_or_else(|| Error::UnknownParticipant {
                    expense_id: expense.id,
                    participant: participant.clone(),
                })
        };

        for expense in expenses {
            let Some(allocation) = expense.allocation() else {
                continue;
            };
            validate_confirmed(expense, allocation)?;

            let payer = lookup(expense, expense.payer_id())?;
            balances[payer].paid = checked_add(balances[payer].paid, expense.total_amount())?;

            for entry in allocation.entries() {
                let owner = lookup(expense, &entry.participant_id)?;
                balances[owner].owed = checked_add(balances[owner].owed, entry.amount)?;
            }
        }

        for balance in balances.iter_mut() {
            balance.net = balance
                .paid
                .checked_sub(balance.owed)
                .ok_or(allocation_core::Error::Overflow)?;
        }

        let mut balances = Balances::new(balances);
        ensure_conserved(&balances)?;
        balances.collapse_below(ZERO_TOLERANCE);

        tracing::debug!(
            participants = balances.len(),
            expenses = expenses.len(),
            "Balances computed"
        );

        Ok(balances)
    }

    /// Reduce balances to transfers.
    ///
    /// Creditors are taken largest first, debtors most negative first; equal
    /// nets keep the configured tie-break order. Fails with
    /// `UnbalancedLedger` rather than returning a partial settlement.
    pub fn net_settle(&self, balances: &Balances) -> Result<Vec<SettlementTransfer>> {
        ensure_conserved(balances)?;

        let mut creditors: Vec<(&ParticipantId, Money)> = balances
            .iter()
            .filter(|balance| balance.is_creditor())
            .map(|balance| (&balance.participant_id, balance.net))
            .collect();

        let mut debtors: Vec<(&ParticipantId, Money)> = balances
            .iter()
            .filter(|balance| balance.is_debtor())
            .map(|balance| {
                let debt = balance
                    .net
                    .checked_abs()
                    .ok_or(allocation_core::Error::Overflow)?;
                Ok::<_, Error>((&balance.participant_id, debt))
            })
            .collect::<Result<_>>()?;

        // Both lists hold positive amounts here, so both sort largest first.
        // `sort_by` is stable: equal amounts keep input order.
        let tie_break = self.tie_break;
        let by_amount = |a: &(&ParticipantId, Money), b: &(&ParticipantId, Money)| -> Ordering {
            b.1.cmp(&a.1).then_with(|| match tie_break {
                TieBreak::InputOrder => Ordering::Equal,
                TieBreak::ParticipantId => a.0.cmp(b.0),
            })
        };
        creditors.sort_by(by_amount);
        debtors.sort_by(by_amount);

        let mut transfers = Vec::with_capacity((creditors.len() + debtors.len()).saturating_sub(1));
        let (mut c, mut d) = (0, 0);

        while c < creditors.len() && d < debtors.len() {
            let amount = creditors[c].1.min(debtors[d].1);

            transfers.push(SettlementTransfer {
                from: debtors[d].0.clone(),
                to: creditors[c].0.clone(),
                amount,
            });

            creditors[c].1 -= amount;
            debtors[d].1 -= amount;

            if creditors[c].1.is_zero() {
                c += 1;
            }
            if debtors[d].1.is_zero() {
                d += 1;
            }
        }

        tracing::debug!(
            creditors = creditors.len(),
            debtors = debtors.len(),
            transfers = transfers.len(),
            "Netting complete"
        );

        Ok(transfers)
    }
}

fn checked_add(a: Money, b: Money) -> Result<Money> {
    Ok(a.checked_add(b).ok_or(allocation_core::Error::Overflow)?)
}

/// Deserialized expenses skip `Expense::confirm`, so the per-entry
/// invariants are checked again here. A wrong sum is left to the
/// conservation check.
fn validate_confirmed(expense: &Expense, allocation: &Allocation) -> Result<()> {
    let invalid = |source: allocation_core::Error| Error::InvalidExpense {
        expense_id: expense.id,
        source,
    };

    if !expense.total_amount().is_positive() {
        return Err(invalid(allocation_core::Error::InvalidTotal(
            expense.total_amount(),
        )));
    }
    allocation.validate_entries().map_err(invalid)
}

fn ensure_conserved(balances: &Balances) -> Result<()> {
    let imbalance = Money::try_sum(balances.iter().map(|balance| balance.net))?;
    if !imbalance.is_zero() {
        tracing::error!(
            imbalance = %imbalance,
            participants = balances.len(),
            "Net balances do not sum to zero"
        );
        return Err(Error::UnbalancedLedger { imbalance });
    }
    Ok(())
}
