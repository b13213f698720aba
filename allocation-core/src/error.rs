//! Error types for allocation

use crate::types::{Money, ParticipantId};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Result type for allocation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Allocation errors
///
/// Every variant is recoverable by the caller: the input is rejected as a
/// whole and nothing has been mutated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Total amount must be strictly positive
    #[error("Invalid total: {0} (must be > 0)")]
    InvalidTotal(Money),

    /// Allocation requested with no participants
    #[error("Participant set is empty")]
    EmptyParticipantSet,

    /// Participant id appears more than once
    #[error("Duplicate participant: {0}")]
    DuplicateParticipant(ParticipantId),

    /// Participant id not part of the participant set
    #[error("Unknown participant: {0}")]
    UnknownParticipant(ParticipantId),

    /// Negative percentage
    #[error("Invalid percentage {percent} for participant {participant}")]
    InvalidPercentage {
        /// Participant
        participant: ParticipantId,
        /// Offending percentage
        percent: Decimal,
    },

    /// Percentages add up to more than 100
    #[error("Percentages sum to {0}, exceeding 100")]
    PercentageOverflow(Decimal),

    /// Custom amounts exceed the total
    #[error("Over-allocated: {allocated} allocated of {total}")]
    OverAllocated {
        /// Sum of entered amounts
        allocated: Money,
        /// Expense total
        total: Money,
    },

    /// Custom amounts leave part of the total unassigned
    #[error("Under-allocated: {remaining} remaining")]
    UnderAllocated {
        /// Unassigned amount
        remaining: Money,
    },

    /// No zero-amount participant to receive the remainder
    #[error("Nothing to distribute: no participant with a zero share")]
    NothingToDistribute,

    /// Allocation entry below zero
    #[error("Negative share {amount} for participant {participant}")]
    NegativeShare {
        /// Participant
        participant: ParticipantId,
        /// Offending amount
        amount: Money,
    },

    /// Allocation does not sum to the expense total
    #[error("Allocation mismatch: {allocated} allocated, expected {total}")]
    AllocationMismatch {
        /// Sum of entries
        allocated: Money,
        /// Expense total
        total: Money,
    },

    /// Expense was already confirmed
    #[error("Expense {0} is already confirmed")]
    AlreadyConfirmed(Uuid),

    /// Batch confirmation without a template
    #[error("Allocation template is empty")]
    EmptyTemplate,

    /// Batch total must be strictly positive
    #[error("Invalid batch total: {0}")]
    InvalidBatchTotal(Money),

    /// Money arithmetic overflowed i64
    #[error("Amount overflow")]
    Overflow,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}
