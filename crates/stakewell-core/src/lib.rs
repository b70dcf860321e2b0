// crates/stakewell-core/src/lib.rs
//
// stakewell-core: Core types, fixed-point math, and collaborator traits for
// the Stakewell reward-accrual engine.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines the identifiers, error type, 18-decimal fixed-point helpers,
// protocol events, schema-revision guard, and the trait interfaces through
// which the engine reaches its external token ledger.

pub mod batch;
pub mod error;
pub mod events;
pub mod math;
pub mod revision;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use stakewell_core::Address;`

// Identifier types
pub use types::{Address, Amount, AssetId, Timestamp, DAY, HOUR, MAX_AMOUNT, MINUTE, YEAR};

// Error types
pub use error::{CooldownError, StakewellError};

// Fixed-point math
pub use math::{PERCENTAGE_SCALE, WAD};

// Ledger batching
pub use batch::LedgerBatch;

// Events
pub use events::ProtocolEvent;

// Schema revision
pub use revision::{initialize, Revisioned};

// Traits
pub use traits::{AccessPolicy, EmissionManagerPolicy, StakingGateway, TokenLedger};

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StakewellError>;
