// crates/stakewell-host/src/protocol.rs
//
// Protocol: the incentives controller and the staking ledger wired over one
// token ledger.
//
// The host also plays the role of the incentivized asset ledgers: deposits,
// withdrawals and transfers of an external asset notify the controller with
// the balances in effect *before* the change, then move the balance.
//
// After every committed call the events buffered by both components are
// published on a broadcast channel.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use stakewell_core::{
    Address, Amount, AssetId, LedgerBatch, ProtocolEvent, Result, StakewellError, Timestamp,
    TokenLedger,
};
use stakewell_distribution::AssetConfigInput;
use stakewell_incentives::{ClaimRequest, IncentivesController, IncentivesState};
use stakewell_ledger::InMemoryLedger;
use stakewell_staking::{CooldownState, StakedToken, StakingState};

use crate::config::ProtocolConfig;

/// Everything needed to resume a protocol instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolSnapshot {
    pub ledger: InMemoryLedger,
    pub incentives: IncentivesState,
    pub staking: StakingState,
}

pub struct Protocol {
    ledger: InMemoryLedger,
    incentives: IncentivesController,
    staking: StakedToken,
    events: broadcast::Sender<ProtocolEvent>,
}

impl Protocol {
    /// Deploy both components at `now` over an empty ledger.
    pub fn new(config: &ProtocolConfig, now: Timestamp) -> Result<Self> {
        validate(config)?;
        let incentives = IncentivesController::new(config.incentives.clone(), now)?;
        let staking = StakedToken::new(config.staking.clone(), now)?;
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Ok(Self {
            ledger: InMemoryLedger::new(),
            incentives,
            staking,
            events,
        })
    }

    pub fn restore(config: &ProtocolConfig, snapshot: ProtocolSnapshot) -> Result<Self> {
        validate(config)?;
        let incentives = IncentivesController::restore(config.incentives.clone(), snapshot.incentives)?;
        let staking = StakedToken::restore(config.staking.clone(), snapshot.staking)?;
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Ok(Self {
            ledger: snapshot.ledger,
            incentives,
            staking,
            events,
        })
    }

    pub fn snapshot(&self) -> ProtocolSnapshot {
        ProtocolSnapshot {
            ledger: self.ledger.clone(),
            incentives: self.incentives.snapshot(),
            staking: self.staking.snapshot(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProtocolEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<ProtocolEvent> {
        self.events.clone()
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    /// Direct access to balances, for funding vaults and test fixtures.
    pub fn ledger_mut(&mut self) -> &mut InMemoryLedger {
        &mut self.ledger
    }

    pub fn incentives(&self) -> &IncentivesController {
        &self.incentives
    }

    pub fn staking(&self) -> &StakedToken {
        &self.staking
    }

    // ------------------------------------------------------------------
    // Incentivized asset ledgers
    // ------------------------------------------------------------------

    /// Mint `amount` of `asset` to `user`.
    pub fn deposit(&mut self, asset: &AssetId, user: &Address, amount: Amount, now: Timestamp) -> Result<()> {
        let batch = LedgerBatch::new().mint(*asset, *user, amount);
        self.notify_and_commit(asset, &[*user], batch, now)
    }

    /// Burn `amount` of `asset` from `user`.
    pub fn withdraw(&mut self, asset: &AssetId, user: &Address, amount: Amount, now: Timestamp) -> Result<()> {
        let batch = LedgerBatch::new().burn(*asset, *user, amount);
        self.notify_and_commit(asset, &[*user], batch, now)
    }

    /// Move `amount` of `asset` between users, settling both legs.
    pub fn transfer_asset(
        &mut self,
        asset: &AssetId,
        from: &Address,
        to: &Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<()> {
        let batch = LedgerBatch::new().transfer(*asset, *from, *to, amount);
        let users: Vec<Address> = if from == to { vec![*from] } else { vec![*from, *to] };
        self.notify_and_commit(asset, &users, batch, now)
    }

    /// Validate the balance change, settle every affected user on the
    /// pre-change balances in one controller call, then apply the change.
    fn notify_and_commit(
        &mut self,
        asset: &AssetId,
        users: &[Address],
        batch: LedgerBatch,
        now: Timestamp,
    ) -> Result<()> {
        batch.check(&self.ledger)?;
        let total = self.ledger.total_supply(asset);
        let legs: Vec<(Address, Amount)> = users
            .iter()
            .map(|user| (*user, self.ledger.balance_of(asset, user)))
            .collect();
        self.incentives.handle_actions(asset, &legs, total, now)?;
        batch.commit(&mut self.ledger)?;
        self.publish();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Incentives
    // ------------------------------------------------------------------

    pub fn configure_incentives(
        &mut self,
        caller: &Address,
        inputs: &[AssetConfigInput],
        now: Timestamp,
    ) -> Result<()> {
        self.incentives.configure_assets(caller, inputs, now)?;
        self.publish();
        Ok(())
    }

    pub fn claim_incentives(
        &mut self,
        caller: &Address,
        request: &ClaimRequest,
        now: Timestamp,
    ) -> Result<Amount> {
        let claimed = self.incentives.claim_rewards(
            &mut self.ledger,
            &mut self.staking,
            caller,
            request,
            now,
        )?;
        self.publish();
        Ok(claimed)
    }

    pub fn incentives_rewards_balance(
        &self,
        assets: &[AssetId],
        user: &Address,
        now: Timestamp,
    ) -> Result<Amount> {
        self.incentives.rewards_balance(&self.ledger, assets, user, now)
    }

    // ------------------------------------------------------------------
    // Staking
    // ------------------------------------------------------------------

    pub fn configure_staking(
        &mut self,
        caller: &Address,
        emission_per_second: Amount,
        now: Timestamp,
    ) -> Result<()> {
        let input = AssetConfigInput {
            asset: self.staking.address(),
            emission_per_second,
            total_staked: self.staking.total_supply(&self.ledger),
        };
        self.staking.configure_assets(caller, &[input], now)?;
        self.publish();
        Ok(())
    }

    pub fn stake(&mut self, caller: &Address, on_behalf_of: &Address, amount: Amount, now: Timestamp) -> Result<()> {
        self.staking.stake(&mut self.ledger, caller, on_behalf_of, amount, now)?;
        self.publish();
        Ok(())
    }

    pub fn cooldown(&mut self, caller: &Address, now: Timestamp) -> Result<()> {
        self.staking.cooldown(&self.ledger, caller, now)?;
        self.publish();
        Ok(())
    }

    pub fn redeem(&mut self, caller: &Address, to: &Address, amount: Amount, now: Timestamp) -> Result<Amount> {
        let redeemed = self.staking.redeem(&mut self.ledger, caller, to, amount, now)?;
        self.publish();
        Ok(redeemed)
    }

    pub fn transfer_staked(&mut self, from: &Address, to: &Address, amount: Amount, now: Timestamp) -> Result<()> {
        self.staking.transfer(&mut self.ledger, from, to, amount, now)?;
        self.publish();
        Ok(())
    }

    pub fn claim_staking_rewards(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Amount> {
        let claimed = self.staking.claim_rewards(&mut self.ledger, caller, to, amount, now)?;
        self.publish();
        Ok(claimed)
    }

    pub fn staked_balance(&self, user: &Address) -> Amount {
        self.staking.balance_of(&self.ledger, user)
    }

    pub fn staking_rewards_balance(&self, user: &Address, now: Timestamp) -> Result<Amount> {
        self.staking.total_rewards_balance(&self.ledger, user, now)
    }

    pub fn cooldown_state(&self, user: &Address, now: Timestamp) -> CooldownState {
        self.staking.cooldown_state(user, now)
    }

    /// Forward buffered component events to subscribers.
    fn publish(&mut self) {
        let events = self
            .incentives
            .drain_events()
            .into_iter()
            .chain(self.staking.drain_events());
        for event in events {
            // No subscribers is not an error.
            let _ = self.events.send(event);
        }
    }
}

/// The two components must agree on where claim-to-stake deposits go.
fn validate(config: &ProtocolConfig) -> Result<()> {
    if config.incentives.staking != config.staking.address {
        return Err(StakewellError::Config(format!(
            "incentives.staking {} does not match staking.address {}",
            config.incentives.staking, config.staking.address
        )));
    }
    if config.staking.unstake_window == 0 {
        tracing::warn!("Staking unstake window is zero; redemption is impossible");
    }
    Ok(())
}
