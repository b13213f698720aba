//! Core types for settlement engine

use allocation_core::{Expense, Money, Participant, ParticipantId};
use serde::{Deserialize, Serialize};

/// Net position of one participant (derived, never stored)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Participant ID
    pub participant_id: ParticipantId,

    /// Total of expenses this participant paid
    pub paid: Money,

    /// Total of this participant's shares
    pub owed: Money,

    /// Net position (positive = creditor, negative = debtor)
    pub net: Money,
}

impl Balance {
    /// Create new zero balance
    pub fn new(participant_id: ParticipantId) -> Self {
        Self {
            participant_id,
            paid: Money::ZERO,
            owed: Money::ZERO,
            net: Money::ZERO,
        }
    }

    /// Balance with a known net and no paid/owed breakdown
    pub fn with_net(participant_id: ParticipantId, net: Money) -> Self {
        Self {
            participant_id,
            paid: Money::ZERO,
            owed: Money::ZERO,
            net,
        }
    }

    /// Check if owed money by others
    pub fn is_creditor(&self) -> bool {
        self.net.is_positive()
    }

    /// Check if owes money to others
    pub fn is_debtor(&self) -> bool {
        self.net.is_negative()
    }

    /// Check if settled
    pub fn is_settled(&self) -> bool {
        self.net.is_zero()
    }
}

/// Balances in participant input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balances {
    balances: Vec<Balance>,
}

impl Balances {
    /// Create from balances; order is the tie-break order for netting
    pub fn new(balances: Vec<Balance>) -> Self {
        Self { balances }
    }

    /// Balances in order
    pub fn iter(&self) -> impl Iterator<Item = &Balance> + '_ {
        self.balances.iter()
    }

    /// Number of participants
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// True if no participants
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Look up a participant
    pub fn get(&self, participant_id: &ParticipantId) -> Option<&Balance> {
        self.balances
            .iter()
            .find(|balance| &balance.participant_id == participant_id)
    }

    /// Σ net; zero for any consistent set of confirmed expenses
    pub fn imbalance(&self) -> allocation_core::Result<Money> {
        Money::try_sum(self.balances.iter().map(|balance| balance.net))
    }

    /// True if every participant is settled
    pub fn all_settled(&self) -> bool {
        self.balances.iter().all(Balance::is_settled)
    }

    /// Treat nets smaller than `tolerance` as settled
    pub fn collapse_below(&mut self, tolerance: Money) {
        for balance in self.balances.iter_mut() {
            if balance.net.checked_abs().is_some_and(|net| net < tolerance) {
                balance.net = Money::ZERO;
            }
        }
    }

    /// Balances after every transfer is paid: the debtor's net rises and the
    /// creditor's net falls by the transfer amount.
    pub fn after_transfers(&self, transfers: &[SettlementTransfer]) -> Balances {
        let mut updated = self.clone();
        for transfer in transfers {
            for balance in updated.balances.iter_mut() {
                if balance.participant_id == transfer.from {
                    balance.net += transfer.amount;
                } else if balance.participant_id == transfer.to {
                    balance.net -= transfer.amount;
                }
            }
        }
        updated
    }
}

impl<'a> IntoIterator for &'a Balances {
    type Item = &'a Balance;
    type IntoIter = std::slice::Iter<'a, Balance>;

    fn into_iter(self) -> Self::IntoIter {
        self.balances.iter()
    }
}

/// Directed payment instruction: `from` pays `to`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettlementTransfer {
    /// Debtor (pays)
    pub from: ParticipantId,

    /// Creditor (receives)
    pub to: ParticipantId,

    /// Amount (> 0)
    pub amount: Money,
}

/// Netting statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NettingStats {
    /// Number of participants
    pub participant_count: usize,

    /// Confirmed expenses included
    pub confirmed_expense_count: usize,

    /// Draft expenses skipped
    pub draft_expense_count: usize,

    /// Participants with a positive net
    pub creditor_count: usize,

    /// Participants with a negative net
    pub debtor_count: usize,

    /// Σ total of confirmed expenses
    pub gross_volume: Money,

    /// Σ transfer amounts
    pub total_transferred: Money,

    /// Number of transfers
    pub transfer_count: usize,

    /// Greedy bound: debtors + creditors − 1
    pub max_transfer_count: usize,
}

/// Full output of a settlement run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPlan {
    /// Per-participant balances before settling
    pub balances: Balances,

    /// Transfers that settle every balance
    pub transfers: Vec<SettlementTransfer>,

    /// Summary
    pub stats: NettingStats,
}

/// Input snapshot for the `settle` binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Participant universe, in tie-break order
    pub participants: Vec<Participant>,

    /// Expenses; drafts are ignored
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

impl Snapshot {
    /// Parse from JSON
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
