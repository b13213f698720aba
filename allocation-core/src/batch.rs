//! Batch confirmation
//!
//! Several draft expenses confirmed together share one allocation template:
//! a split of the batch total (for example one percentage split applied to
//! a stack of receipts). The template is scaled onto each expense by
//! `expense_amount / batch_total`.
//!
//! # Rounding
//!
//! Scaled shares are rounded half-up independently, so a scaled allocation
//! can miss its expense total by a few units. `scale_allocation` returns
//! the raw scaled shares; `confirm_batch` always runs them through
//! `reconcile_to_total` so every confirmed expense sums exactly. Only
//! participants with a positive template share take part in that
//! correction.
//!
//! ```text
//! template = [50, 50]   (batch_total = 100)
//! expense  = 33        → raw [17, 17] = 34 → reconciled [16, 17]
//! expense  = 67        → raw [34, 34] = 68 → reconciled [33, 34]
//! ```

use crate::{
    allocator::reconcile_to_total,
    expense::Expense,
    types::*,
    Error, Result,
};
use std::collections::HashSet;

/// Scale a template onto one expense of a batch.
///
/// Each share becomes `round(share × expense_amount / batch_total)` with
/// the ratio kept exact (i128 arithmetic). The result is not renormalized.
pub fn scale_allocation(
    template: &Allocation,
    expense_amount: Money,
    batch_total: Money,
) -> Result<Allocation> {
    if !batch_total.is_positive() {
        return Err(Error::InvalidBatchTotal(batch_total));
    }
    if expense_amount.is_negative() {
        return Err(Error::InvalidTotal(expense_amount));
    }

    let numerator_scale = i128::from(expense_amount.minor_units());
    let denominator = i128::from(batch_total.minor_units());

    template
        .entries()
        .iter()
        .map(|entry| {
            if entry.amount.is_negative() {
                return Err(Error::NegativeShare {
                    participant: entry.participant_id.clone(),
                    amount: entry.amount,
                });
            }
            let numerator = i128::from(entry.amount.minor_units()) * numerator_scale;
            let rounded = (2 * numerator + denominator) / (2 * denominator);
            let amount = i64::try_from(rounded).map_err(|_| Error::Overflow)?;
            Ok(AllocationEntry::new(entry.participant_id.clone(), Money::new(amount)))
        })
        .collect::<Result<Vec<_>>>()
        .map(Allocation::new)
}

/// Confirm every expense in `expenses` with `template` scaled to its share.
///
/// The template must allocate the batch total exactly
/// (`AllocationMismatch` otherwise). All-or-nothing: every scaled
/// allocation is computed and validated before any expense changes state.
/// Returns the confirmed allocations in expense order.
pub fn confirm_batch(expenses: &mut [Expense], template: &Allocation) -> Result<Vec<Allocation>> {
    if template.is_empty() {
        return Err(Error::EmptyTemplate);
    }
    let mut seen = HashSet::with_capacity(template.len());
    for entry in template.entries() {
        if !seen.insert(&entry.participant_id) {
            return Err(Error::DuplicateParticipant(entry.participant_id.clone()));
        }
    }
    if let Some(confirmed) = expenses.iter().find(|expense| expense.is_confirmed()) {
        return Err(Error::AlreadyConfirmed(confirmed.id));
    }

    let batch_total = Money::try_sum(expenses.iter().map(Expense::total_amount))?;
    if !batch_total.is_positive() {
        return Err(Error::InvalidBatchTotal(batch_total));
    }

    let allocated = template.allocated()?;
    if allocated != batch_total {
        return Err(Error::AllocationMismatch {
            allocated,
            total: batch_total,
        });
    }

    let allocations = expenses
        .iter()
        .map(|expense| {
            let scaled = scale_allocation(template, expense.total_amount(), batch_total)?;
            let mut entries = scaled.into_entries();
            reconcile_within_template(&mut entries, template, expense.total_amount())?;
            let allocation = Allocation::new(entries);
            expense.check_allocation(&allocation)?;
            Ok(allocation)
        })
        .collect::<Result<Vec<_>>>()?;

    for (expense, allocation) in expenses.iter_mut().zip(&allocations) {
        expense.confirm(allocation.clone())?;
    }

    tracing::info!(
        expense_count = expenses.len(),
        batch_total = %batch_total,
        "Batch confirmed"
    );

    Ok(allocations)
}

/// Reconcile scaled shares onto `total`, touching only participants with a
/// positive template share. A zero template share scales to zero and stays
/// there.
fn reconcile_within_template(
    entries: &mut [AllocationEntry],
    template: &Allocation,
    total: Money,
) -> Result<()> {
    let sharing: Vec<usize> = template
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, share)| share.amount.is_positive())
        .map(|(index, _)| index)
        .collect();
    if sharing.is_empty() {
        return reconcile_to_total(entries, total);
    }

    let excluded = Money::try_sum(
        entries
            .iter()
            .enumerate()
            .filter(|(index, _)| !sharing.contains(index))
            .map(|(_, entry)| entry.amount),
    )?;
    let target = total.checked_sub(excluded).ok_or(Error::Overflow)?;

    let mut subset: Vec<AllocationEntry> = sharing.iter().map(|&index| entries[index].clone()).collect();
    reconcile_to_total(&mut subset, target)?;
    for (&index, corrected) in sharing.iter().zip(subset) {
        entries[index] = corrected;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn template(pairs: &[(&str, i64)]) -> Allocation {
        pairs
            .iter()
            .map(|(id, amount)| AllocationEntry::new(ParticipantId::new(*id), Money::new(*amount)))
            .collect()
    }

    fn draft(total: i64) -> Expense {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        Expense::new(Money::new(total), ParticipantId::new("a"), date).unwrap()
    }

    #[test]
    fn test_scale_is_not_renormalized() {
        let scaled = scale_allocation(&template(&[("a", 50), ("b", 50)]), Money::new(33), Money::new(100))
            .unwrap();

        // 16.5 rounds half-up to 17 for both.
        assert_eq!(scaled.amounts(), vec![17, 17]);
    }

    #[test]
    fn test_scale_exact_ratio() {
        let scaled = scale_allocation(
            &template(&[("a", 300), ("b", 100)]),
            Money::new(200),
            Money::new(400),
        )
        .unwrap();

        assert_eq!(scaled.amounts(), vec![150, 50]);
    }

    #[test]
    fn test_scale_rejects_zero_batch_total() {
        let result = scale_allocation(&template(&[("a", 1)]), Money::new(1), Money::ZERO);
        assert_eq!(result, Err(Error::InvalidBatchTotal(Money::ZERO)));
    }

    #[test]
    fn test_confirm_batch_sums_exactly_per_expense() {
        let mut expenses = vec![draft(33), draft(67)];
        let allocations = confirm_batch(&mut expenses, &template(&[("a", 50), ("b", 50)])).unwrap();

        assert_eq!(allocations[0].amounts(), vec![16, 17]);
        assert_eq!(allocations[1].amounts(), vec![33, 34]);
        for expense in &expenses {
            assert!(expense.is_confirmed());
            let allocation = expense.allocation().unwrap();
            assert_eq!(allocation.allocated().unwrap(), expense.total_amount());
        }
    }

    #[test]
    fn test_confirm_batch_all_or_nothing() {
        let mut confirmed = draft(40);
        confirmed.confirm(template(&[("a", 40)])).unwrap();
        let mut expenses = vec![draft(60), confirmed];

        let result = confirm_batch(&mut expenses, &template(&[("a", 1), ("b", 1)]));

        assert!(matches!(result, Err(Error::AlreadyConfirmed(_))));
        assert!(!expenses[0].is_confirmed());
    }

    #[test]
    fn test_confirm_batch_template_must_cover_batch_total() {
        let mut expenses = vec![draft(330), draft(670)];
        let result = confirm_batch(&mut expenses, &template(&[("a", 100), ("b", 0)]));

        assert_eq!(
            result,
            Err(Error::AllocationMismatch {
                allocated: Money::new(100),
                total: Money::new(1000),
            })
        );
        assert!(expenses.iter().all(|expense| !expense.is_confirmed()));
    }

    #[test]
    fn test_confirm_batch_zero_share_stays_zero() {
        // 1/3 and 2/3 of [0, 1, 1, 1]: raw [0, 0, 0, 0] and [0, 1, 1, 1].
        let mut expenses = vec![draft(1), draft(2)];
        let allocations =
            confirm_batch(&mut expenses, &template(&[("a", 0), ("b", 1), ("c", 1), ("d", 1)]))
                .unwrap();

        assert_eq!(allocations[0].amounts(), vec![0, 1, 0, 0]);
        assert_eq!(allocations[1].amounts(), vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_confirm_batch_rejects_empty_template() {
        let mut expenses = vec![draft(10)];
        assert_eq!(
            confirm_batch(&mut expenses, &Allocation::default()),
            Err(Error::EmptyTemplate)
        );
    }
}
