//! Main settlement engine
//!
//! Orchestrates allocation, balance computation, and netting. Stateless
//! between calls: settlement transfers are recomputed from the confirmed
//! expenses every time and never stored.

use crate::{
    config::Config,
    netting::NettingEngine,
    types::*,
    Result,
};
use allocation_core::{
    Allocation, AllocationStrategy, Allocator, Expense, Money, Participant,
};

/// Settlement engine
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    /// Allocator
    allocator: Allocator,

    /// Netting engine
    netting: NettingEngine,

    /// Configuration
    config: Config,
}

impl SettlementEngine {
    /// Create new settlement engine
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let allocator = Allocator::new(&config.allocation);
        let netting = NettingEngine::new(config.netting.tie_break);

        Ok(Self {
            allocator,
            netting,
            config,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Allocator configured for this engine
    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    /// Split one pending expense (interactive editing)
    pub fn allocate(
        &self,
        total: Money,
        strategy: &AllocationStrategy,
        participants: &[Participant],
        prior_shares: Option<&Allocation>,
    ) -> Result<Allocation> {
        Ok(self
            .allocator
            .allocate(total, strategy, participants, prior_shares)?)
    }

    /// Per-participant balances over the confirmed expenses
    pub fn compute_balances(
        &self,
        expenses: &[Expense],
        participants: &[Participant],
    ) -> Result<Balances> {
        self.netting.compute_balances(expenses, participants)
    }

    /// Transfers that settle `balances`
    pub fn net_settle(&self, balances: &Balances) -> Result<Vec<SettlementTransfer>> {
        self.netting.net_settle(balances)
    }

    /// Run a full settlement over a consistent snapshot of participants and
    /// expenses.
    #[tracing::instrument(
        skip(self, participants, expenses),
        fields(participants = participants.len(), expenses = expenses.len())
    )]
    pub fn settle(&self, participants: &[Participant], expenses: &[Expense]) -> Result<SettlementPlan> {
        tracing::info!("Starting settlement");

        // Step 1: Balances
        let balances = self.netting.compute_balances(expenses, participants)?;

        // Step 2: Netting
        let transfers = self.netting.net_settle(&balances)?;

        debug_assert!(balances.after_transfers(&transfers).all_settled());

        // Step 3: Statistics
        let stats = self.statistics(&balances, &transfers, expenses)?;

        tracing::info!(
            transfers = stats.transfer_count,
            total_transferred = %stats.total_transferred,
            gross_volume = %stats.gross_volume,
            "Settlement complete"
        );

        Ok(SettlementPlan {
            balances,
            transfers,
            stats,
        })
    }

    fn statistics(
        &self,
        balances: &Balances,
        transfers: &[SettlementTransfer],
        expenses: &[Expense],
    ) -> Result<NettingStats> {
        let confirmed: Vec<&Expense> = expenses.iter().filter(|e| e.is_confirmed()).collect();
        let creditor_count = balances.iter().filter(|b| b.is_creditor()).count();
        let debtor_count = balances.iter().filter(|b| b.is_debtor()).count();

        Ok(NettingStats {
            participant_count: balances.len(),
            confirmed_expense_count: confirmed.len(),
            draft_expense_count: expenses.len() - confirmed.len(),
            creditor_count,
            debtor_count,
            gross_volume: Money::try_sum(confirmed.iter().map(|e| e.total_amount()))?,
            total_transferred: Money::try_sum(transfers.iter().map(|t| t.amount))?,
            transfer_count: transfers.len(),
            max_transfer_count: (creditor_count + debtor_count).saturating_sub(1),
        })
    }
}
