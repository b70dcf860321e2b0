// crates/stakewell-staking/src/staked_token.rs
//
// The staking ledger: staked balances double as the single incentivized
// asset, so every balance change settles the affected stakers against the
// ledger's own distribution index before the balance moves.
//
// Staked balances are stored in the token ledger as token `config.address`;
// the underlying is held in custody by the account of the same name. Each
// call stages its distribution changes, commits token movements as one
// `LedgerBatch`, and only then writes rewards, cooldowns and indexes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stakewell_core::math::{checked_add, checked_sub};
use stakewell_core::revision::{self, Revisioned};
use stakewell_core::{
    AccessPolicy, Address, Amount, EmissionManagerPolicy, LedgerBatch, ProtocolEvent, Result,
    StakewellError, StakingGateway, Timestamp, TokenLedger, MAX_AMOUNT,
};
use stakewell_distribution::{AssetConfigInput, AssetState, DistributionManager, StagedDistribution};

use crate::config::StakingConfig;
use crate::cooldown::{CooldownPolicy, CooldownState};

/// Persisted state of the staking ledger. Balances live in the token ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingState {
    revision: u32,
    distribution: DistributionManager,
    stakers_rewards: BTreeMap<Address, Amount>,
    stakers_cooldowns: BTreeMap<Address, Timestamp>,
}

impl Revisioned for StakingState {
    const REVISION: u32 = 1;

    fn revision(&self) -> u32 {
        self.revision
    }

    fn set_revision(&mut self, revision: u32) {
        self.revision = revision;
    }

    fn migrate_from(&mut self, from: u32) -> Result<()> {
        match from {
            0 => Ok(()),
            other => Err(StakewellError::UnsupportedRevision {
                found: other,
                supported: Self::REVISION,
            }),
        }
    }
}

/// Pending writes of one call, applied after the token batch commits.
#[derive(Default)]
struct StakerUpdates {
    rewards: Vec<(Address, Amount)>,
    cooldowns: Vec<(Address, Timestamp)>,
    events: Vec<ProtocolEvent>,
}

/// Staking ledger with cooldown-gated redemption.
pub struct StakedToken<P: AccessPolicy = EmissionManagerPolicy> {
    config: StakingConfig,
    cooldown: CooldownPolicy,
    policy: P,
    state: StakingState,
    events: Vec<ProtocolEvent>,
}

impl StakedToken<EmissionManagerPolicy> {
    /// Create and initialize a ledger at `now`; emissions stop at
    /// `now + config.distribution_duration`.
    pub fn new(config: StakingConfig, now: Timestamp) -> Result<Self> {
        let policy = EmissionManagerPolicy {
            manager: config.emission_manager,
        };
        Self::with_policy(config, policy, now)
    }

    /// Rebuild a ledger from a snapshot, migrating older revisions.
    pub fn restore(config: StakingConfig, state: StakingState) -> Result<Self> {
        let policy = EmissionManagerPolicy {
            manager: config.emission_manager,
        };
        let mut token = Self {
            cooldown: CooldownPolicy::new(config.cooldown_seconds, config.unstake_window),
            config,
            policy,
            state,
            events: Vec::new(),
        };
        if token.state.revision() != StakingState::REVISION {
            token.initialize()?;
        }
        Ok(token)
    }
}

impl<P: AccessPolicy> StakedToken<P> {
    pub fn with_policy(config: StakingConfig, policy: P, now: Timestamp) -> Result<Self> {
        let distribution_end = now.checked_add(config.distribution_duration).ok_or_else(|| {
            StakewellError::Config("distribution end overflows the timestamp range".to_string())
        })?;
        let mut token = Self {
            cooldown: CooldownPolicy::new(config.cooldown_seconds, config.unstake_window),
            config,
            policy,
            state: StakingState {
                revision: 0,
                distribution: DistributionManager::new(distribution_end),
                stakers_rewards: BTreeMap::new(),
                stakers_cooldowns: BTreeMap::new(),
            },
            events: Vec::new(),
        };
        token.initialize()?;
        tracing::info!(
            "Staking ledger {} ({}) initialized; cooldown {}s, unstake window {}s",
            token.config.symbol,
            token.config.address,
            token.config.cooldown_seconds,
            token.config.unstake_window
        );
        Ok(token)
    }

    pub fn initialize(&mut self) -> Result<()> {
        revision::initialize(&mut self.state)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn revision(&self) -> u32 {
        self.state.revision()
    }

    pub fn config(&self) -> &StakingConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.config.decimals
    }

    /// The ledger's own id, which is also its token and asset id.
    pub fn address(&self) -> Address {
        self.config.address
    }

    pub fn reward_token(&self) -> Address {
        self.config.reward_token
    }

    pub fn rewards_vault(&self) -> Address {
        self.config.rewards_vault
    }

    pub fn cooldown_seconds(&self) -> Timestamp {
        self.config.cooldown_seconds
    }

    pub fn unstake_window(&self) -> Timestamp {
        self.config.unstake_window
    }

    pub fn distribution_end(&self) -> Timestamp {
        self.state.distribution.distribution_end()
    }

    pub fn balance_of(&self, ledger: &dyn TokenLedger, user: &Address) -> Amount {
        ledger.balance_of(&self.config.address, user)
    }

    pub fn total_supply(&self, ledger: &dyn TokenLedger) -> Amount {
        ledger.total_supply(&self.config.address)
    }

    /// Emission state of the staked asset.
    pub fn assets(&self) -> AssetState {
        self.state.distribution.asset(&self.config.address)
    }

    pub fn user_asset_index(&self, user: &Address) -> Amount {
        self.state.distribution.user_index(user, &self.config.address)
    }

    /// Rewards settled for `user` but not claimed.
    pub fn staker_rewards_to_claim(&self, user: &Address) -> Amount {
        self.state.stakers_rewards.get(user).copied().unwrap_or(0)
    }

    /// Raw stored cooldown timestamp (0 = none).
    pub fn stakers_cooldown(&self, user: &Address) -> Timestamp {
        self.state.stakers_cooldowns.get(user).copied().unwrap_or(0)
    }

    pub fn cooldown_state(&self, user: &Address, now: Timestamp) -> CooldownState {
        self.cooldown.state(self.stakers_cooldown(user), now)
    }

    /// Settled plus pending rewards of `user` at `now`. Writes nothing.
    pub fn total_rewards_balance(
        &self,
        ledger: &dyn TokenLedger,
        user: &Address,
        now: Timestamp,
    ) -> Result<Amount> {
        let stake = stakewell_distribution::UserStakeInput {
            asset: self.config.address,
            staked_by_user: self.balance_of(ledger, user),
            total_staked: self.total_supply(ledger),
        };
        let pending = self.state.distribution.pending_rewards(user, &[stake], now)?;
        checked_add(self.staker_rewards_to_claim(user), pending)
    }

    pub fn snapshot(&self) -> StakingState {
        self.state.clone()
    }

    pub fn drain_events(&mut self) -> Vec<ProtocolEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Set the emission rate of the staked asset.
    ///
    /// The ledger distributes for itself only; any other asset is rejected.
    pub fn configure_assets(
        &mut self,
        caller: &Address,
        inputs: &[AssetConfigInput],
        now: Timestamp,
    ) -> Result<()> {
        if !self.policy.is_emission_manager(caller) {
            tracing::warn!("Rejected staking asset configuration from {}", caller);
            return Err(StakewellError::Unauthorized {
                caller: *caller,
                role: "emission manager",
            });
        }
        if let Some(foreign) = inputs.iter().find(|i| i.asset != self.config.address) {
            return Err(StakewellError::Config(format!(
                "staking ledger {} cannot distribute for asset {}",
                self.config.address, foreign.asset
            )));
        }

        let mut staged = self.state.distribution.stage();
        for input in inputs {
            staged.configure_asset(input, now)?;
        }
        let changes = staged.finish();
        let events = self.state.distribution.apply(changes);
        self.events.extend(events);
        Ok(())
    }

    /// Stake `amount` of the underlying from `caller` for `on_behalf_of`.
    pub fn stake(
        &mut self,
        ledger: &mut dyn TokenLedger,
        caller: &Address,
        on_behalf_of: &Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<()> {
        if amount == 0 {
            return Err(StakewellError::ZeroAmount);
        }
        let balance = self.balance_of(&*ledger, on_behalf_of);
        let total = self.total_supply(&*ledger);

        let mut updates = StakerUpdates::default();
        let mut staged = self.state.distribution.stage();
        self.settle(&mut staged, &mut updates, on_behalf_of, balance, total, now)?;
        let changes = staged.finish();

        let cooldown =
            self.cooldown
                .after_stake(self.stakers_cooldown(on_behalf_of), balance, amount, now)?;
        updates.cooldowns.push((*on_behalf_of, cooldown));

        LedgerBatch::new()
            .transfer(self.config.staked_token, *caller, self.config.address, amount)
            .mint(self.config.address, *on_behalf_of, amount)
            .commit(ledger)?;

        let events = self.state.distribution.apply(changes);
        self.events.extend(events);
        updates.events.push(ProtocolEvent::Staked {
            from: *caller,
            on_behalf_of: *on_behalf_of,
            amount,
        });
        self.apply_updates(updates);
        tracing::info!("{} staked {} on behalf of {}", caller, amount, on_behalf_of);
        Ok(())
    }

    /// Start the caller's cooldown.
    pub fn cooldown(&mut self, ledger: &dyn TokenLedger, caller: &Address, now: Timestamp) -> Result<()> {
        if self.balance_of(ledger, caller) == 0 {
            return Err(StakewellError::InvalidBalanceOnCooldown);
        }
        self.state.stakers_cooldowns.insert(*caller, now);
        self.events.push(ProtocolEvent::Cooldown { user: *caller });
        tracing::info!("Cooldown activated for {} at {}", caller, now);
        Ok(())
    }

    /// Redeem up to `amount` of the caller's stake to `to`.
    ///
    /// Returns the amount actually redeemed, which is clamped to the
    /// caller's balance.
    pub fn redeem(
        &mut self,
        ledger: &mut dyn TokenLedger,
        caller: &Address,
        to: &Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Amount> {
        if amount == 0 {
            return Err(StakewellError::ZeroAmount);
        }
        self.cooldown
            .check_redeemable(self.stakers_cooldown(caller), now)?;

        let balance = self.balance_of(&*ledger, caller);
        let total = self.total_supply(&*ledger);
        let redeemed = amount.min(balance);

        let mut updates = StakerUpdates::default();
        let mut staged = self.state.distribution.stage();
        self.settle(&mut staged, &mut updates, caller, balance, total, now)?;
        let changes = staged.finish();

        if balance - redeemed == 0 {
            updates.cooldowns.push((*caller, 0));
        }

        LedgerBatch::new()
            .burn(self.config.address, *caller, redeemed)
            .transfer(self.config.staked_token, self.config.address, *to, redeemed)
            .commit(ledger)?;

        let events = self.state.distribution.apply(changes);
        self.events.extend(events);
        updates.events.push(ProtocolEvent::Redeem {
            from: *caller,
            to: *to,
            amount: redeemed,
        });
        self.apply_updates(updates);
        tracing::info!("{} redeemed {} to {}", caller, redeemed, to);
        Ok(redeemed)
    }

    /// Move staked balance between accounts, settling both sides first and
    /// carrying the sender's cooldown over to the recipient.
    pub fn transfer(
        &mut self,
        ledger: &mut dyn TokenLedger,
        from: &Address,
        to: &Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<()> {
        let from_balance = self.balance_of(&*ledger, from);
        let total = self.total_supply(&*ledger);

        let mut updates = StakerUpdates::default();
        let mut staged = self.state.distribution.stage();
        self.settle(&mut staged, &mut updates, from, from_balance, total, now)?;

        if from != to {
            let to_balance = self.balance_of(&*ledger, to);
            self.settle(&mut staged, &mut updates, to, to_balance, total, now)?;

            let sender_cooldown = self.stakers_cooldown(from);
            let recipient_cooldown =
                self.cooldown
                    .after_receive(sender_cooldown, self.stakers_cooldown(to), now);
            updates.cooldowns.push((*to, recipient_cooldown));
            if from_balance.saturating_sub(amount) == 0 {
                updates.cooldowns.push((*from, 0));
            }
        }
        let changes = staged.finish();

        LedgerBatch::new()
            .transfer(self.config.address, *from, *to, amount)
            .commit(ledger)?;

        let events = self.state.distribution.apply(changes);
        self.events.extend(events);
        self.apply_updates(updates);
        tracing::debug!("Transferred {} staked from {} to {}", amount, from, to);
        Ok(())
    }

    /// Claim settled rewards to `to`.
    ///
    /// `MAX_AMOUNT` claims the whole settled balance; any other amount above
    /// it is rejected. Returns the amount paid.
    pub fn claim_rewards(
        &mut self,
        ledger: &mut dyn TokenLedger,
        caller: &Address,
        to: &Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Amount> {
        let balance = self.balance_of(&*ledger, caller);
        let total = self.total_supply(&*ledger);

        let mut staged = self.state.distribution.stage();
        let accrued =
            staged.update_user_asset(caller, &self.config.address, balance, total, now)?;
        let changes = staged.finish();

        let available = checked_add(self.staker_rewards_to_claim(caller), accrued)?;
        let claimed = if amount == MAX_AMOUNT {
            available
        } else if amount > available {
            return Err(StakewellError::InvalidClaimAmount {
                requested: amount,
                available,
            });
        } else {
            amount
        };
        let remaining = checked_sub(available, claimed)?;

        LedgerBatch::new()
            .transfer(self.config.reward_token, self.config.rewards_vault, *to, claimed)
            .commit(ledger)?;

        let events = self.state.distribution.apply(changes);
        self.events.extend(events);
        self.state.stakers_rewards.insert(*caller, remaining);
        if accrued > 0 {
            self.events.push(ProtocolEvent::RewardsAccrued {
                user: *caller,
                amount: accrued,
            });
        }
        self.events.push(ProtocolEvent::RewardsClaimed {
            from: *caller,
            to: *to,
            amount: claimed,
        });
        tracing::info!("{} claimed {} staking rewards to {}", caller, claimed, to);
        Ok(claimed)
    }

    /// Settle `user` on the staged index and queue the new reward counter.
    fn settle(
        &self,
        staged: &mut StagedDistribution<'_>,
        updates: &mut StakerUpdates,
        user: &Address,
        balance: Amount,
        total: Amount,
        now: Timestamp,
    ) -> Result<()> {
        let accrued = staged.update_user_asset(user, &self.config.address, balance, total, now)?;
        if accrued > 0 {
            let rewards = checked_add(self.staker_rewards_to_claim(user), accrued)?;
            updates.rewards.push((*user, rewards));
            updates.events.push(ProtocolEvent::RewardsAccrued {
                user: *user,
                amount: accrued,
            });
        }
        Ok(())
    }

    fn apply_updates(&mut self, updates: StakerUpdates) {
        for (user, rewards) in updates.rewards {
            self.state.stakers_rewards.insert(user, rewards);
        }
        for (user, cooldown) in updates.cooldowns {
            if cooldown == 0 {
                self.state.stakers_cooldowns.remove(&user);
            } else {
                self.state.stakers_cooldowns.insert(user, cooldown);
            }
        }
        self.events.extend(updates.events);
    }
}

impl<P: AccessPolicy> StakingGateway for StakedToken<P> {
    fn staked_token(&self) -> Address {
        self.config.staked_token
    }

    fn stake(
        &mut self,
        ledger: &mut dyn TokenLedger,
        caller: &Address,
        on_behalf_of: &Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<()> {
        StakedToken::stake(self, ledger, caller, on_behalf_of, amount, now)
    }
}
