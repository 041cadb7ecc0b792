//! Tipjar Ledger Core
//!
//! Append-only donation ledger with a derived, recomputed-on-read leaderboard.
//!
//! # Architecture
//!
//! - **Document per payment**: one immutable record per payment id
//! - **Idempotent writes**: re-delivery of a confirmation overwrites in place
//! - **Derived views**: the leaderboard is recomputed from the full ledger on
//!   every read; the cached copy is advisory only
//!
//! # Invariants
//!
//! - At most one `PaymentEntry` per payment id
//! - Entries are never updated or deleted after the initial write
//! - Leaderboard ordering compares numeric totals, never rendered strings

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod error;
pub mod leaderboard;
pub mod storage;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use leaderboard::aggregate;
pub use storage::{LedgerStore, Storage};
pub use types::{LeaderboardEntry, PaymentEntry, Tier};
