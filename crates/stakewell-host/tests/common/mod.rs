// Shared fixture for the scenario tests.

#![allow(dead_code)]

use tokio::sync::broadcast;

use stakewell_core::{Address, Amount, ProtocolEvent, Timestamp, TokenLedger, WAD};
use stakewell_host::{Protocol, ProtocolConfig};

/// Deployment time of every fixture.
pub const T0: Timestamp = 1_700_000_000;

pub struct Fixture {
    pub config: ProtocolConfig,
    pub protocol: Protocol,
    pub events: broadcast::Receiver<ProtocolEvent>,
    pub emission_manager: Address,
    pub user1: Address,
    pub user2: Address,
    pub user3: Address,
    pub user4: Address,
    pub user5: Address,
}

pub fn config() -> ProtocolConfig {
    let mut config = ProtocolConfig::default();
    config.staking.name = "Staked Accu".to_string();
    config.staking.symbol = "stkACCU".to_string();
    config
}

/// Deploy at `T0` and fund the rewards vault and the controller's premium
/// reserve.
pub fn setup() -> Fixture {
    let config = config();
    let mut protocol = Protocol::new(&config, T0).unwrap();
    let events = protocol.subscribe();
    let reward_token = config.incentives.reward_token;
    protocol
        .ledger_mut()
        .mint(&reward_token, &config.incentives.rewards_vault, 1_000_000_000 * WAD)
        .unwrap();
    protocol
        .ledger_mut()
        .mint(&reward_token, &config.incentives.address, 1_000 * WAD)
        .unwrap();
    Fixture {
        emission_manager: config.incentives.emission_manager,
        config,
        protocol,
        events,
        user1: Address::derive("user1"),
        user2: Address::derive("user2"),
        user3: Address::derive("user3"),
        user4: Address::derive("user4"),
        user5: Address::derive("user5"),
    }
}

impl Fixture {
    pub fn accu(&self) -> Address {
        self.config.staking.staked_token
    }

    pub fn accu_balance(&self, user: &Address) -> Amount {
        self.protocol.ledger().balance_of(&self.accu(), user)
    }

    /// Mint underlying to `user` outside the protocol.
    pub fn fund(&mut self, user: &Address, amount: Amount) {
        let token = self.accu();
        self.protocol.ledger_mut().mint(&token, user, amount).unwrap();
    }

    /// Events published since the previous drain.
    pub fn drain(&mut self) -> Vec<ProtocolEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}
