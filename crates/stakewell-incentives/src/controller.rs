// crates/stakewell-incentives/src/controller.rs
//
// Incentives controller: fans balance-change notifications from external
// asset ledgers out to the distribution engine, keeps each user's unclaimed
// reward counter, and settles claims.
//
// Every call is a single settle-then-mutate step. The distribution overlay,
// the new unclaimed counter, and the token movements are all computed
// before anything is written, so a failing call changes nothing.
//
// A claim larger than the unclaimed balance is clamped, not rejected. The
// staking ledger deliberately behaves differently (hard failure).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stakewell_core::math::{checked_add, with_premium};
use stakewell_core::revision::{self, Revisioned};
use stakewell_core::{
    AccessPolicy, Address, Amount, AssetId, EmissionManagerPolicy, LedgerBatch, ProtocolEvent,
    Result, StakewellError, StakingGateway, Timestamp, TokenLedger,
};
use stakewell_distribution::{
    AssetConfigInput, AssetState, DistributionManager, UserStakeInput,
};

use crate::config::IncentivesConfig;

/// Persisted state of the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentivesState {
    /// Schema revision the state was last initialized at.
    revision: u32,
    distribution: DistributionManager,
    unclaimed_rewards: BTreeMap<Address, Amount>,
}

impl IncentivesState {
    fn new(distribution_end: Timestamp) -> Self {
        Self {
            revision: 0,
            distribution: DistributionManager::new(distribution_end),
            unclaimed_rewards: BTreeMap::new(),
        }
    }
}

impl Revisioned for IncentivesState {
    const REVISION: u32 = 1;

    fn revision(&self) -> u32 {
        self.revision
    }

    fn set_revision(&mut self, revision: u32) {
        self.revision = revision;
    }

    fn migrate_from(&mut self, from: u32) -> Result<()> {
        match from {
            // Revision 1 is the first layout; nothing to carry over.
            0 => Ok(()),
            other => Err(StakewellError::UnsupportedRevision {
                found: other,
                supported: Self::REVISION,
            }),
        }
    }
}

/// Parameters of `claim_rewards`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRequest {
    /// Assets to settle before claiming.
    pub assets: Vec<AssetId>,
    /// Upper bound on the claim. `MAX_AMOUNT` claims everything.
    pub amount: Amount,
    /// Recipient of the payout (or of the stake, when restaking).
    pub to: Address,
    /// Restake the claim with a premium instead of paying it out.
    pub to_stake: bool,
}

/// Multi-asset incentives controller.
pub struct IncentivesController<P: AccessPolicy = EmissionManagerPolicy> {
    config: IncentivesConfig,
    policy: P,
    state: IncentivesState,
    events: Vec<ProtocolEvent>,
}

impl IncentivesController<EmissionManagerPolicy> {
    /// Create and initialize a controller at time `now`.
    ///
    /// Emissions stop at `now + config.distribution_duration`.
    pub fn new(config: IncentivesConfig, now: Timestamp) -> Result<Self> {
        let policy = EmissionManagerPolicy {
            manager: config.emission_manager,
        };
        Self::with_policy(config, policy, now)
    }

    /// Rebuild a controller from a snapshot, migrating older revisions.
    pub fn restore(config: IncentivesConfig, state: IncentivesState) -> Result<Self> {
        let policy = EmissionManagerPolicy {
            manager: config.emission_manager,
        };
        let mut controller = Self {
            config,
            policy,
            state,
            events: Vec::new(),
        };
        if controller.state.revision() != IncentivesState::REVISION {
            controller.initialize()?;
        }
        Ok(controller)
    }
}

impl<P: AccessPolicy> IncentivesController<P> {
    /// Create and initialize a controller with a custom access policy.
    pub fn with_policy(config: IncentivesConfig, policy: P, now: Timestamp) -> Result<Self> {
        let distribution_end = now.checked_add(config.distribution_duration).ok_or_else(|| {
            StakewellError::Config("distribution end overflows the timestamp range".to_string())
        })?;
        let mut controller = Self {
            config,
            policy,
            state: IncentivesState::new(distribution_end),
            events: Vec::new(),
        };
        controller.initialize()?;
        tracing::info!(
            "Incentives controller {} initialized; distribution ends at {}",
            controller.config.address,
            distribution_end
        );
        Ok(controller)
    }

    /// Bring the state to the current revision.
    ///
    /// # Errors
    /// Returns `StakewellError::AlreadyInitialized` when called on state
    /// that is already at `REVISION`.
    pub fn initialize(&mut self) -> Result<()> {
        revision::initialize(&mut self.state)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn revision(&self) -> u32 {
        self.state.revision()
    }

    pub fn config(&self) -> &IncentivesConfig {
        &self.config
    }

    pub fn reward_token(&self) -> Address {
        self.config.reward_token
    }

    pub fn staking(&self) -> Address {
        self.config.staking
    }

    pub fn extra_premium_percent(&self) -> u64 {
        self.config.extra_premium_percent
    }

    pub fn rewards_vault(&self) -> Address {
        self.config.rewards_vault
    }

    pub fn address(&self) -> Address {
        self.config.address
    }

    pub fn distribution_end(&self) -> Timestamp {
        self.state.distribution.distribution_end()
    }

    /// Emission state of `asset`.
    pub fn assets(&self, asset: &AssetId) -> AssetState {
        self.state.distribution.asset(asset)
    }

    /// Index snapshot of `user` for `asset`.
    pub fn user_asset_index(&self, user: &Address, asset: &AssetId) -> Amount {
        self.state.distribution.user_index(user, asset)
    }

    /// Rewards already settled for `user` but not yet claimed.
    pub fn user_unclaimed_rewards(&self, user: &Address) -> Amount {
        self.state.unclaimed_rewards.get(user).copied().unwrap_or(0)
    }

    /// Settled plus pending rewards of `user` across `assets` at `now`.
    ///
    /// Balances are read from `ledger`; nothing is written.
    pub fn rewards_balance(
        &self,
        ledger: &dyn TokenLedger,
        assets: &[AssetId],
        user: &Address,
        now: Timestamp,
    ) -> Result<Amount> {
        let stakes = user_stakes(ledger, assets, user);
        let pending = self.state.distribution.pending_rewards(user, &stakes, now)?;
        checked_add(self.user_unclaimed_rewards(user), pending)
    }

    /// Copy of the persisted state.
    pub fn snapshot(&self) -> IncentivesState {
        self.state.clone()
    }

    /// Take the events produced by committed calls since the last drain.
    pub fn drain_events(&mut self) -> Vec<ProtocolEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Set the emission rate of each listed asset.
    ///
    /// Only the emission manager may call this, even with an empty list.
    pub fn configure_assets(
        &mut self,
        caller: &Address,
        inputs: &[AssetConfigInput],
        now: Timestamp,
    ) -> Result<()> {
        if !self.policy.is_emission_manager(caller) {
            tracing::warn!("Rejected asset configuration from {}", caller);
            return Err(StakewellError::Unauthorized {
                caller: *caller,
                role: "emission manager",
            });
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

    /// React to a balance change on the ledger of `asset`.
    ///
    /// `user_balance` and `total_supply` are the values *before* the change.
    pub fn handle_action(
        &mut self,
        asset: &AssetId,
        user: &Address,
        user_balance: Amount,
        total_supply: Amount,
        now: Timestamp,
    ) -> Result<()> {
        self.handle_actions(asset, &[(*user, user_balance)], total_supply, now)
    }

    /// Settle every `(user, balance)` leg of one balance change on `asset`.
    ///
    /// Balances and `total_supply` are the values *before* the change. Either
    /// every leg is settled or, on error, none is.
    pub fn handle_actions(
        &mut self,
        asset: &AssetId,
        legs: &[(Address, Amount)],
        total_supply: Amount,
        now: Timestamp,
    ) -> Result<()> {
        let mut staged = self.state.distribution.stage();
        let mut accruals = Vec::with_capacity(legs.len());
        for (user, balance) in legs {
            let accrued = staged.update_user_asset(user, asset, *balance, total_supply, now)?;
            if accrued > 0 {
                let unclaimed = checked_add(self.user_unclaimed_rewards(user), accrued)?;
                accruals.push((*user, accrued, unclaimed));
            }
        }
        let changes = staged.finish();

        let events = self.state.distribution.apply(changes);
        self.events.extend(events);
        for (user, accrued, unclaimed) in accruals {
            self.state.unclaimed_rewards.insert(user, unclaimed);
            tracing::debug!("User {} accrued {} on asset {}", user, accrued, asset);
            self.events.push(ProtocolEvent::RewardsAccrued {
                user,
                amount: accrued,
            });
        }
        Ok(())
    }

    /// Settle `caller` on the requested assets and pay out up to
    /// `request.amount` of their unclaimed rewards.
    ///
    /// Returns the amount debited from the caller's unclaimed balance. When
    /// restaking, the recipient receives that amount plus the premium.
    pub fn claim_rewards(
        &mut self,
        ledger: &mut dyn TokenLedger,
        staking: &mut dyn StakingGateway,
        caller: &Address,
        request: &ClaimRequest,
        now: Timestamp,
    ) -> Result<Amount> {
        if request.amount == 0 {
            return Ok(0);
        }
        if request.to_stake && staking.staked_token() != self.config.reward_token {
            return Err(StakewellError::Config(format!(
                "staking ledger stakes {} but rewards are paid in {}",
                staking.staked_token(),
                self.config.reward_token
            )));
        }

        let stakes = user_stakes(&*ledger, &request.assets, caller);
        let mut staged = self.state.distribution.stage();
        let accrued = staged.update_user_assets(caller, &stakes, now)?;
        let changes = staged.finish();

        let unclaimed = checked_add(self.user_unclaimed_rewards(caller), accrued)?;
        let claimed = request.amount.min(unclaimed);
        let remaining = unclaimed - claimed;

        let paid = if claimed == 0 {
            0
        } else if request.to_stake {
            self.pay_into_stake(ledger, staking, &request.to, claimed, now)?
        } else {
            LedgerBatch::new()
                .transfer(
                    self.config.reward_token,
                    self.config.rewards_vault,
                    request.to,
                    claimed,
                )
                .commit(ledger)?;
            claimed
        };

        // Commit: every fallible step is behind us.
        let events = self.state.distribution.apply(changes);
        self.events.extend(events);
        self.state.unclaimed_rewards.insert(*caller, remaining);
        if accrued > 0 {
            self.events.push(ProtocolEvent::RewardsAccrued {
                user: *caller,
                amount: accrued,
            });
        }
        if claimed > 0 {
            tracing::info!(
                "User {} claimed {} to {} ({} paid{})",
                caller,
                claimed,
                request.to,
                paid,
                if request.to_stake { ", restaked" } else { "" }
            );
            self.events.push(ProtocolEvent::RewardsClaimed {
                from: *caller,
                to: request.to,
                amount: paid,
            });
        }
        Ok(claimed)
    }

    /// Move `claimed` from the vault to the controller, then stake it plus
    /// the premium for `to`. The premium comes from the controller's own
    /// reserve. Returns the staked amount.
    fn pay_into_stake(
        &self,
        ledger: &mut dyn TokenLedger,
        staking: &mut dyn StakingGateway,
        to: &Address,
        claimed: Amount,
        now: Timestamp,
    ) -> Result<Amount> {
        let premium_amount = with_premium(claimed, self.config.extra_premium_percent as Amount)?;
        let token = self.config.reward_token;
        let vault = self.config.rewards_vault;
        let controller = self.config.address;

        LedgerBatch::new()
            .transfer(token, vault, controller, claimed)
            .commit(ledger)?;

        if let Err(e) = staking.stake(ledger, &controller, to, premium_amount, now) {
            // Hand the claim back before reporting the failed stake.
            LedgerBatch::new()
                .transfer(token, controller, vault, claimed)
                .commit(ledger)
                .map_err(|undo| {
                    tracing::error!(
                        "Stake of {} for {} failed ({}); claim could not be returned",
                        premium_amount,
                        to,
                        e
                    );
                    undo
                })?;
            return Err(e);
        }
        Ok(premium_amount)
    }
}

/// Read `user`'s position in each asset from the asset ledgers.
fn user_stakes(ledger: &dyn TokenLedger, assets: &[AssetId], user: &Address) -> Vec<UserStakeInput> {
    assets
        .iter()
        .map(|asset| UserStakeInput {
            asset: *asset,
            staked_by_user: ledger.balance_of(asset, user),
            total_staked: ledger.total_supply(asset),
        })
        .collect()
}
