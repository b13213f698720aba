//! Fair-share allocation core
//!
//! Data model and allocation logic for splitting shared expenses.
//!
//! # Architecture
//!
//! - **Allocator**: divides one total across participants (equal,
//!   percentage, or custom amounts)
//! - **Custom split**: editable custom allocation with remainder
//!   distribution
//! - **Batch scaler**: applies one allocation template to several
//!   expenses proportionally
//! - **Expense lifecycle**: `Draft → Confirmed`, allocation fixed on
//!   confirmation

#![forbid(unsafe_code)]
//!
//! # Invariants
//!
//! - Money is integer minor units everywhere
//! - Every allocation sums exactly to its total
//! - No share is ever negative
//! - Same inputs → same output, including where the odd cent lands
//!
//! # Example
//!
//! ```
//! use allocation_core::{Allocator, AllocationStrategy, Money, Participant};
//!
//! let participants = vec![
//!     Participant::new("alice", "Alice"),
//!     Participant::new("bob", "Bob"),
//!     Participant::new("carol", "Carol"),
//! ];
//!
//! let allocation = Allocator::default()
//!     .allocate(Money::new(100), &AllocationStrategy::Equal, &participants, None)
//!     .unwrap();
//!
//! assert_eq!(allocation.amounts(), vec![34, 33, 33]);
//! ```

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod allocator;
pub mod batch;
pub mod config;
pub mod custom;
pub mod error;
pub mod expense;
pub mod types;

// Re-exports
pub use allocator::{percentage_total, reconcile_to_total, AllocationStrategy, Allocator};
pub use batch::{confirm_batch, scale_allocation};
pub use config::AllocationConfig;
pub use custom::CustomSplit;
pub use error::{Error, Result};
pub use expense::{Expense, ExpenseState};
pub use types::{
    validate_participants, Allocation, AllocationEntry, Money, Participant, ParticipantId,
};
