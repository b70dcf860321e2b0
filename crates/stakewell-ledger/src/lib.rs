// crates/stakewell-ledger/src/lib.rs
//
// stakewell-ledger: a multi-token balance sheet kept in memory.
//
// Sufficient for local hosts and tests. Every write is checked: debits
// beyond the available balance fail with `InsufficientBalance` and leave
// the sheet unchanged.

pub mod memory;

pub use memory::InMemoryLedger;
