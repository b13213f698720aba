//! Settlement Engine
//!
//! Turns confirmed shared expenses into "who pays whom how much".
//!
//! # Architecture

#![forbid(unsafe_code)]
//!
//! Every settlement run is a pure function of its input snapshot:
//!
//! 1. **Balances**: paid − owed per participant over confirmed expenses
//! 2. **Conservation check**: Σ net must be zero, otherwise the run aborts
//! 3. **Netting**: greedy largest-first matching of debtors to creditors
//! 4. **Statistics**: volume, transfer count, greedy bound
//!
//! Transfers are a projection of the balances. They are never persisted;
//! callers recompute them whenever the expense set changes.
//!
//! # Example
//!
//! ```
//! use allocation_core::{AllocationStrategy, Expense, Money, Participant, ParticipantId};
//! use chrono::NaiveDate;
//! use settlement::{Config, SettlementEngine};
//!
//! # fn main() -> settlement::Result<()> {
//! let engine = SettlementEngine::new(Config::default())?;
//! let group = vec![
//!     Participant::new("a", "A"),
//!     Participant::new("b", "B"),
//!     Participant::new("c", "C"),
//! ];
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let mut dinner = Expense::new(Money::new(300), ParticipantId::new("a"), date)?;
//! dinner.confirm(engine.allocate(Money::new(300), &AllocationStrategy::Equal, &group, None)?)?;
//!
//! let plan = engine.settle(&group, &[dinner])?;
//! println!("{} transfers", plan.transfers.len());
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod netting;
pub mod types;

// Re-exports
pub use config::{Config, NettingConfig, TieBreak};
pub use engine::SettlementEngine;
pub use error::{Error, Result};
pub use netting::NettingEngine;
pub use types::*;
