// crates/stakewell-host/src/lib.rs
//
// stakewell-host: composition root for a Stakewell deployment.
//
// Wires the incentives controller and the staking ledger over one token
// ledger, loads TOML configuration, installs tracing, and fans committed
// events out on a broadcast channel.

pub mod config;
pub mod protocol;
pub mod shared;
pub mod telemetry;

pub use config::ProtocolConfig;
pub use protocol::{Protocol, ProtocolSnapshot};
pub use shared::SharedProtocol;
pub use telemetry::init_tracing;
