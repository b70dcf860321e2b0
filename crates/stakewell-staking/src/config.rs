// crates/stakewell-staking/src/config.rs
//
// Deployment parameters for the staking ledger, loaded as the `[staking]`
// table of the host TOML.

use serde::{Deserialize, Serialize};

use stakewell_core::{Address, Timestamp, DAY, YEAR};

/// Static configuration of a `StakedToken`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_symbol")]
    pub symbol: String,

    #[serde(default = "default_decimals")]
    pub decimals: u8,

    /// Underlying token pulled on stake and returned on redeem.
    #[serde(default = "default_staked_token")]
    pub staked_token: Address,

    /// Token paid out by `claim_rewards`.
    #[serde(default = "default_reward_token")]
    pub reward_token: Address,

    /// The ledger's own id. Staked balances are tracked as this token, the
    /// underlying is held in custody by this account, and it is the only
    /// asset the ledger distributes rewards for.
    #[serde(default = "default_address")]
    pub address: Address,

    /// Account that funds reward claims.
    #[serde(default = "default_rewards_vault")]
    pub rewards_vault: Address,

    #[serde(default = "default_emission_manager")]
    pub emission_manager: Address,

    /// Seconds between cooldown activation and the start of the unstake window.
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: Timestamp,

    /// Length of the redemption window, in seconds.
    #[serde(default = "default_unstake_window")]
    pub unstake_window: Timestamp,

    /// Seconds from initialization until emissions stop.
    #[serde(default = "default_distribution_duration")]
    pub distribution_duration: Timestamp,
}

fn default_name() -> String {
    "Staked Token".to_string()
}

fn default_symbol() -> String {
    "stkTOKEN".to_string()
}

fn default_decimals() -> u8 {
    18
}

fn default_staked_token() -> Address {
    Address::derive("stakewell:reward-token")
}

fn default_reward_token() -> Address {
    Address::derive("stakewell:reward-token")
}

fn default_address() -> Address {
    Address::derive("stakewell:staked-token")
}

fn default_rewards_vault() -> Address {
    Address::derive("stakewell:rewards-vault")
}

fn default_emission_manager() -> Address {
    Address::derive("stakewell:emission-manager")
}

fn default_cooldown_seconds() -> Timestamp {
    DAY
}

fn default_unstake_window() -> Timestamp {
    2 * DAY
}

fn default_distribution_duration() -> Timestamp {
    100 * YEAR
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            symbol: default_symbol(),
            decimals: default_decimals(),
            staked_token: default_staked_token(),
            reward_token: default_reward_token(),
            address: default_address(),
            rewards_vault: default_rewards_vault(),
            emission_manager: default_emission_manager(),
            cooldown_seconds: default_cooldown_seconds(),
            unstake_window: default_unstake_window(),
            distribution_duration: default_distribution_duration(),
        }
    }
}
