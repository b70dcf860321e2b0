// crates/stakewell-incentives/src/config.rs
//
// Deployment parameters for the incentives controller.
// Loaded as the `[incentives]` table of the host TOML or built in code.

use serde::{Deserialize, Serialize};

use stakewell_core::{Address, Timestamp, YEAR};

/// Static configuration of an `IncentivesController`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentivesConfig {
    /// Token paid out as rewards.
    #[serde(default = "default_reward_token")]
    pub reward_token: Address,

    /// Account that funds every payout.
    #[serde(default = "default_rewards_vault")]
    pub rewards_vault: Address,

    /// The controller's own account. Holds the reserve that pays the
    /// claim-to-stake premium.
    #[serde(default = "default_address")]
    pub address: Address,

    /// Staking ledger that receives claim-to-stake deposits.
    #[serde(default = "default_staking")]
    pub staking: Address,

    /// Bonus paid on restaked claims, in percent (2 = 2%).
    #[serde(default = "default_extra_premium_percent")]
    pub extra_premium_percent: u64,

    /// Only this account may reconfigure emissions.
    #[serde(default = "default_emission_manager")]
    pub emission_manager: Address,

    /// Seconds from initialization until emissions stop.
    #[serde(default = "default_distribution_duration")]
    pub distribution_duration: Timestamp,
}

fn default_reward_token() -> Address {
    Address::derive("stakewell:reward-token")
}

fn default_rewards_vault() -> Address {
    Address::derive("stakewell:rewards-vault")
}

fn default_address() -> Address {
    Address::derive("stakewell:incentives-controller")
}

fn default_staking() -> Address {
    Address::derive("stakewell:staked-token")
}

fn default_extra_premium_percent() -> u64 {
    2
}

fn default_emission_manager() -> Address {
    Address::derive("stakewell:emission-manager")
}

fn default_distribution_duration() -> Timestamp {
    YEAR
}

impl Default for IncentivesConfig {
    fn default() -> Self {
        Self {
            reward_token: default_reward_token(),
            rewards_vault: default_rewards_vault(),
            address: default_address(),
            staking: default_staking(),
            extra_premium_percent: default_extra_premium_percent(),
            emission_manager: default_emission_manager(),
            distribution_duration: default_distribution_duration(),
        }
    }
}
