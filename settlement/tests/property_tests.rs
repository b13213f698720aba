//! Property-based tests for settlement invariants
//!
//! - Money conservation: Σ net == 0 over confirmed expenses
//! - Settlement correctness: transfers drive every net to zero
//! - Greedy bound: at most debtors + creditors − 1 transfers
//! - Determinism: same input → same transfers

use allocation_core::{
    AllocationStrategy, Allocator, Expense, Money, Participant, ParticipantId,
};
use chrono::NaiveDate;
use proptest::prelude::*;
use settlement::{Balance, Balances, Config, NettingEngine, SettlementEngine, TieBreak};
use std::collections::BTreeMap;

/// (payer index, total, per-participant custom weights)
type ExpenseInput = (usize, i64, Vec<i64>);

/// Strategy for generating expense inputs over `n` participants
fn expense_strategy(n: usize) -> impl Strategy<Value = ExpenseInput> {
    (
        0..n,
        1i64..1_000_000i64,
        prop::collection::vec(0i64..100i64, n),
    )
}

/// Strategy for generating a group and its expenses
fn ledger_strategy() -> impl Strategy<Value = (Vec<Participant>, Vec<ExpenseInput>, Vec<bool>)> {
    (1usize..=8).prop_flat_map(|n| {
        let participants: Vec<Participant> = (0..n)
            .map(|i| Participant::new(format!("m{}", i), format!("Member {}", i)))
            .collect();
        (
            Just(participants),
            prop::collection::vec(expense_strategy(n), 0..20),
            prop::collection::vec(any::<bool>(), 20),
        )
    })
}

/// Build expenses: equal split when all weights are zero, custom split
/// scaled from the weights otherwise. Expenses flagged `false` stay drafts.
fn build_expenses(
    participants: &[Participant],
    inputs: &[ExpenseInput],
    confirm_flags: &[bool],
) -> Vec<Expense> {
    let allocator = Allocator::default();
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    inputs
        .iter()
        .zip(confirm_flags)
        .map(|((payer, total, weights), confirm)| {
            let total_money = Money::new(*total);
            let mut expense =
                Expense::new(total_money, participants[*payer].id.clone(), date).unwrap();
            if !confirm {
                return expense;
            }

            let weight_sum: i64 = weights.iter().sum();
            let strategy = if weight_sum == 0 {
                AllocationStrategy::Equal
            } else {
                // Floor of each weighted share leaves a remainder; zeroing the
                // first participant gives distribute_remaining a target.
                let amounts: BTreeMap<ParticipantId, i64> = participants
                    .iter()
                    .zip(weights)
                    .enumerate()
                    .map(|(i, (participant, weight))| {
                        let amount = if i == 0 { 0 } else { total * weight / weight_sum };
                        (participant.id.clone(), amount)
                    })
                    .collect();
                AllocationStrategy::Custom(amounts)
            };

            let allocation = allocator
                .allocate(total_money, &strategy, participants, None)
                .unwrap();
            expense.confirm(allocation).unwrap();
            expense
        })
        .collect()
}

/// Strategy for generating balanced nets
fn nets_strategy() -> impl Strategy<Value = Balances> {
    prop::collection::vec(-1_000_000i64..1_000_000i64, 1..12).prop_map(|mut nets| {
        let sum: i64 = nets.iter().sum();
        nets.push(-sum);
        Balances::new(
            nets.into_iter()
                .enumerate()
                .map(|(i, net)| Balance::with_net(ParticipantId::new(format!("m{}", i)), Money::new(net)))
                .collect(),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: Σ net == 0 for any set of confirmed expenses
    #[test]
    fn prop_balance_conservation((participants, inputs, flags) in ledger_strategy()) {
        let expenses = build_expenses(&participants, &inputs, &flags);
        let balances = NettingEngine::default()
            .compute_balances(&expenses, &participants)
            .unwrap();

        prop_assert_eq!(balances.imbalance(), Ok(Money::ZERO));
        for balance in &balances {
            prop_assert_eq!(balance.net, balance.paid - balance.owed);
        }
    }

    /// Property: transfers settle every participant, each debtor paying
    /// exactly its debt
    #[test]
    fn prop_settlement_correctness(balances in nets_strategy()) {
        let transfers = NettingEngine::default().net_settle(&balances).unwrap();

        prop_assert!(balances.after_transfers(&transfers).all_settled());

        for balance in balances.iter().filter(|b| b.is_debtor()) {
            let paid: Money = transfers
                .iter()
                .filter(|t| t.from == balance.participant_id)
                .map(|t| t.amount)
                .sum();
            prop_assert_eq!(paid, balance.net.abs());
        }

        for transfer in &transfers {
            prop_assert!(transfer.amount > Money::ZERO);
            prop_assert_ne!(&transfer.from, &transfer.to);
        }
    }

    /// Property: greedy matching stays within debtors + creditors − 1
    #[test]
    fn prop_transfer_count_bound(balances in nets_strategy()) {
        let transfers = NettingEngine::default().net_settle(&balances).unwrap();

        let creditors = balances.iter().filter(|b| b.is_creditor()).count();
        let debtors = balances.iter().filter(|b| b.is_debtor()).count();
        prop_assert!(transfers.len() <= (creditors + debtors).saturating_sub(1));
    }

    /// Property: identical input gives identical transfers
    #[test]
    fn prop_deterministic(balances in nets_strategy()) {
        for tie_break in [TieBreak::InputOrder, TieBreak::ParticipantId] {
            let engine = NettingEngine::new(tie_break);
            let first = engine.net_settle(&balances).unwrap();
            let second = engine.net_settle(&balances.clone()).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    /// Property: full engine run settles every generated ledger
    #[test]
    fn prop_engine_settles((participants, inputs, flags) in ledger_strategy()) {
        let expenses = build_expenses(&participants, &inputs, &flags);
        let engine = SettlementEngine::new(Config::default()).unwrap();

        let plan = engine.settle(&participants, &expenses).unwrap();

        prop_assert!(plan.balances.after_transfers(&plan.transfers).all_settled());
        prop_assert_eq!(plan.stats.transfer_count, plan.transfers.len());
        prop_assert!(plan.stats.transfer_count <= plan.stats.max_transfer_count);
        prop_assert_eq!(
            plan.stats.confirmed_expense_count + plan.stats.draft_expense_count,
            expenses.len()
        );
    }
}
