//! Error types for settlement engine

use allocation_core::{Money, ParticipantId};
use thiserror::Error;
use uuid::Uuid;

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Settlement errors
#[derive(Error, Debug)]
pub enum Error {
    /// Allocation or data model error
    #[error("Allocation error: {0}")]
    Allocation(#[from] allocation_core::Error),

    /// Netting requested with no participants
    #[error("Participant set is empty")]
    EmptyParticipantSet,

    /// Participant id appears more than once
    #[error("Duplicate participant: {0}")]
    DuplicateParticipant(ParticipantId),

    /// Expense references a participant outside the set
    #[error("Expense {expense_id} references unknown participant {participant}")]
    UnknownParticipant {
        /// Offending expense
        expense_id: Uuid,
        /// Unknown participant
        participant: ParticipantId,
    },

    /// Confirmed expense breaks the data model: non-positive total,
    /// negative share, or a participant listed twice
    #[error("Expense {expense_id} is invalid: {source}")]
    InvalidExpense {
        /// Offending expense
        expense_id: Uuid,
        /// Violated invariant
        source: allocation_core::Error,
    },

    /// Net balances do not sum to zero. The inbound data is inconsistent;
    /// no transfers are produced.
    #[error("Unbalanced ledger: net balances sum to {imbalance}")]
    UnbalancedLedger {
        /// Σ net
        imbalance: Money,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
