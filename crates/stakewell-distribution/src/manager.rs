// crates/stakewell-distribution/src/manager.rs
//
// Per-asset and per-user index bookkeeping.
//
// Mutations go through a two-step plan/apply cycle: `stage()` returns an
// overlay that computes every new index against the committed state, and
// `apply()` writes the overlay back once the owning component has finished
// all fallible work for the call. A call that fails between the two steps
// simply drops the overlay, leaving indexes and timestamps untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stakewell_core::{Address, Amount, AssetId, ProtocolEvent, Result, Timestamp};

use crate::index::{normalized_index, settle_user, user_rewards};

/// Emission state of one asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetState {
    /// Cumulative reward per staked unit, scaled by 10^18. Never decreases.
    pub index: Amount,
    /// Reward units emitted per second while the distribution is active.
    pub emission_per_second: Amount,
    /// Timestamp of the last index update.
    pub last_update_timestamp: Timestamp,
}

/// One entry of a `configure_assets` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfigInput {
    pub asset: AssetId,
    pub emission_per_second: Amount,
    /// Total balance staked in the asset at configuration time.
    pub total_staked: Amount,
}

/// A user's position in one asset, as reported by the asset's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStakeInput {
    pub asset: AssetId,
    pub staked_by_user: Amount,
    pub total_staked: Amount,
}

/// Index bookkeeping for every configured asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionManager {
    /// After this timestamp no emission accrues on any asset.
    distribution_end: Timestamp,
    assets: BTreeMap<AssetId, AssetState>,
    /// asset -> user -> index snapshot at the user's last settlement.
    user_indexes: BTreeMap<AssetId, BTreeMap<Address, Amount>>,
}

/// Pending writes produced by a `StagedDistribution`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributionChanges {
    assets: BTreeMap<AssetId, AssetState>,
    user_indexes: BTreeMap<(AssetId, Address), Amount>,
    events: Vec<ProtocolEvent>,
}

/// Copy-on-write overlay over a `DistributionManager`.
pub struct StagedDistribution<'a> {
    base: &'a DistributionManager,
    changes: DistributionChanges,
}

impl DistributionManager {
    /// Create an empty manager whose emissions stop at `distribution_end`.
    pub fn new(distribution_end: Timestamp) -> Self {
        Self {
            distribution_end,
            assets: BTreeMap::new(),
            user_indexes: BTreeMap::new(),
        }
    }

    pub fn distribution_end(&self) -> Timestamp {
        self.distribution_end
    }

    /// Committed state of `asset`; zero-valued if never configured.
    pub fn asset(&self, asset: &AssetId) -> AssetState {
        self.assets.get(asset).copied().unwrap_or_default()
    }

    /// Committed index snapshot of `user` for `asset`; zero if never settled.
    pub fn user_index(&self, user: &Address, asset: &AssetId) -> Amount {
        self.user_indexes
            .get(asset)
            .and_then(|users| users.get(user))
            .copied()
            .unwrap_or(0)
    }

    /// Assets that have been configured at least once.
    pub fn assets(&self) -> impl Iterator<Item = (&AssetId, &AssetState)> {
        self.assets.iter()
    }

    /// Begin a staged mutation.
    pub fn stage(&self) -> StagedDistribution<'_> {
        StagedDistribution {
            base: self,
            changes: DistributionChanges::default(),
        }
    }

    /// Commit staged changes and hand back the events they produced.
    pub fn apply(&mut self, changes: DistributionChanges) -> Vec<ProtocolEvent> {
        for (asset, state) in changes.assets {
            self.assets.insert(asset, state);
        }
        for ((asset, user), index) in changes.user_indexes {
            self.user_indexes.entry(asset).or_default().insert(user, index);
        }
        changes.events
    }

    /// Bring `asset`'s index up to `now` and commit it.
    pub fn update_asset_index(
        &mut self,
        asset: &AssetId,
        total_balance: Amount,
        now: Timestamp,
    ) -> Result<(Amount, Vec<ProtocolEvent>)> {
        let mut staged = self.stage();
        let index = staged.update_asset_index(asset, total_balance, now)?;
        let changes = staged.finish();
        Ok((index, self.apply(changes)))
    }

    /// Rewards `user` would accrue across `stakes` if settled at `now`.
    ///
    /// Read-only: nothing is written, no events are produced.
    pub fn pending_rewards(
        &self,
        user: &Address,
        stakes: &[UserStakeInput],
        now: Timestamp,
    ) -> Result<Amount> {
        let mut total: Amount = 0;
        for stake in stakes {
            let state = self.asset(&stake.asset);
            let index = normalized_index(
                state.index,
                state.emission_per_second,
                state.last_update_timestamp,
                now,
                self.distribution_end,
                stake.total_staked,
            )?;
            let accrued = user_rewards(stake.staked_by_user, index, self.user_index(user, &stake.asset))?;
            total = stakewell_core::math::checked_add(total, accrued)?;
        }
        Ok(total)
    }
}

impl<'a> StagedDistribution<'a> {
    /// Staged state of `asset` (overlay first, then committed).
    pub fn asset(&self, asset: &AssetId) -> AssetState {
        self.changes
            .assets
            .get(asset)
            .copied()
            .unwrap_or_else(|| self.base.asset(asset))
    }

    /// Staged index snapshot of `user` for `asset`.
    pub fn user_index(&self, user: &Address, asset: &AssetId) -> Amount {
        self.changes
            .user_indexes
            .get(&(*asset, *user))
            .copied()
            .unwrap_or_else(|| self.base.user_index(user, asset))
    }

    /// Advance `asset`'s index to `now` using the balance that was staked
    /// during the elapsed interval. Always moves `last_update_timestamp`
    /// to `now`, even when no reward accrued.
    pub fn update_asset_index(
        &mut self,
        asset: &AssetId,
        total_balance: Amount,
        now: Timestamp,
    ) -> Result<Amount> {
        let mut state = self.asset(asset);
        let new_index = normalized_index(
            state.index,
            state.emission_per_second,
            state.last_update_timestamp,
            now,
            self.base.distribution_end,
            total_balance,
        )?;

        if new_index != state.index {
            state.index = new_index;
            tracing::debug!("Asset {} index updated to {}", asset, new_index);
            self.changes.events.push(ProtocolEvent::AssetIndexUpdated {
                asset: *asset,
                index: new_index,
            });
        }
        state.last_update_timestamp = now;
        self.changes.assets.insert(*asset, state);
        Ok(new_index)
    }

    /// Update the asset index, then settle `user` against it.
    ///
    /// `principal` must be the user's balance before the triggering action.
    /// Returns the reward accrued since the user's previous snapshot.
    pub fn update_user_asset(
        &mut self,
        user: &Address,
        asset: &AssetId,
        principal: Amount,
        total_balance: Amount,
        now: Timestamp,
    ) -> Result<Amount> {
        let user_index = self.user_index(user, asset);
        let fresh_index = self.update_asset_index(asset, total_balance, now)?;
        if user_index == fresh_index {
            return Ok(0);
        }

        let (accrued, new_user_index) = settle_user(principal, user_index, fresh_index)?;
        self.changes
            .user_indexes
            .insert((*asset, *user), new_user_index);
        tracing::debug!(
            "User {} index for asset {} updated to {}",
            user,
            asset,
            new_user_index
        );
        self.changes.events.push(ProtocolEvent::UserIndexUpdated {
            user: *user,
            asset: *asset,
            index: new_user_index,
        });
        Ok(accrued)
    }

    /// Settle `user` across several assets; returns the summed reward.
    pub fn update_user_assets(
        &mut self,
        user: &Address,
        stakes: &[UserStakeInput],
        now: Timestamp,
    ) -> Result<Amount> {
        let mut accrued: Amount = 0;
        for stake in stakes {
            let reward = self.update_user_asset(
                user,
                &stake.asset,
                stake.staked_by_user,
                stake.total_staked,
                now,
            )?;
            accrued = stakewell_core::math::checked_add(accrued, reward)?;
        }
        Ok(accrued)
    }

    /// Change an asset's emission rate.
    ///
    /// The index is first brought up to date under the old rate so the
    /// elapsed interval is neither lost nor re-priced.
    pub fn configure_asset(&mut self, input: &AssetConfigInput, now: Timestamp) -> Result<()> {
        self.update_asset_index(&input.asset, input.total_staked, now)?;

        let mut state = self.asset(&input.asset);
        state.emission_per_second = input.emission_per_second;
        self.changes.assets.insert(input.asset, state);

        tracing::info!(
            "Asset {} configured with emission {}/s",
            input.asset,
            input.emission_per_second
        );
        self.changes.events.push(ProtocolEvent::AssetConfigUpdated {
            asset: input.asset,
            emission_per_second: input.emission_per_second,
        });
        Ok(())
    }

    /// Close the overlay, yielding its pending writes.
    pub fn finish(self) -> DistributionChanges {
        self.changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stakewell_core::WAD;

    const HOUR: Timestamp = 3_600;
    const YEAR: Timestamp = 365 * 24 * HOUR;

    fn asset() -> AssetId {
        Address::derive("asset")
    }

    fn user() -> Address {
        Address::derive("user")
    }

    fn configured(emission: Amount, total: Amount, now: Timestamp) -> DistributionManager {
        let mut manager = DistributionManager::new(now + YEAR);
        let mut staged = manager.stage();
        staged
            .configure_asset(
                &AssetConfigInput {
                    asset: asset(),
                    emission_per_second: emission,
                    total_staked: total,
                },
                now,
            )
            .unwrap();
        let changes = staged.finish();
        manager.apply(changes);
        manager
    }

    #[test]
    fn test_unconfigured_asset_is_zero() {
        let manager = DistributionManager::new(YEAR);
        assert_eq!(manager.asset(&asset()), AssetState::default());
        assert_eq!(manager.user_index(&user(), &asset()), 0);
    }

    #[test]
    fn test_configure_emits_even_for_zero_emission() {
        let manager = DistributionManager::new(YEAR);
        let mut staged = manager.stage();
        staged
            .configure_asset(
                &AssetConfigInput {
                    asset: asset(),
                    emission_per_second: 0,
                    total_staked: 0,
                },
                10,
            )
            .unwrap();
        let changes = staged.finish();
        let mut manager = manager.clone();
        let events = manager.apply(changes);
        assert_eq!(
            events,
            vec![ProtocolEvent::AssetConfigUpdated {
                asset: asset(),
                emission_per_second: 0
            }]
        );
        assert_eq!(manager.asset(&asset()).last_update_timestamp, 10);
    }

    #[test]
    fn test_reconfigure_accrues_under_old_rate() {
        let mut manager = configured(100, 2 * WAD, 0);
        let mut staged = manager.stage();
        staged
            .configure_asset(
                &AssetConfigInput {
                    asset: asset(),
                    emission_per_second: 0,
                    total_staked: 2 * WAD,
                },
                HOUR,
            )
            .unwrap();
        let changes = staged.finish();
        manager.apply(changes);

        let state = manager.asset(&asset());
        assert_eq!(state.index, 180_000);
        assert_eq!(state.emission_per_second, 0);

        // With zero emission the index stays put afterwards.
        let (idx, events) = manager.update_asset_index(&asset(), 2 * WAD, HOUR + 24 * HOUR).unwrap();
        assert_eq!(idx, 180_000);
        assert!(events.is_empty());
    }

    #[test]
    fn test_zero_total_still_advances_timestamp() {
        let mut manager = configured(100, 0, 0);
        let (idx, events) = manager.update_asset_index(&asset(), 0, HOUR).unwrap();
        assert_eq!(idx, 0);
        assert!(events.is_empty());
        assert_eq!(manager.asset(&asset()).last_update_timestamp, HOUR);
    }

    #[test]
    fn test_update_user_asset_settles_pre_action_balance() {
        let manager = configured(100, 2 * WAD, 0);
        let mut staged = manager.stage();
        let accrued = staged
            .update_user_asset(&user(), &asset(), WAD, 2 * WAD, HOUR)
            .unwrap();
        assert_eq!(accrued, 180_000);
        assert_eq!(staged.user_index(&user(), &asset()), 180_000);

        // Second settlement at the same instant accrues nothing more.
        let again = staged
            .update_user_asset(&user(), &asset(), WAD, 2 * WAD, HOUR)
            .unwrap();
        assert_eq!(again, 0);
    }

    #[test]
    fn test_dropped_stage_leaves_state_untouched() {
        let manager = configured(100, 2 * WAD, 0);
        let before = manager.clone();
        {
            let mut staged = manager.stage();
            staged
                .update_user_asset(&user(), &asset(), WAD, 2 * WAD, HOUR)
                .unwrap();
            // dropped without apply
        }
        assert_eq!(manager, before);
    }

    #[test]
    fn test_apply_emits_index_events_in_order() {
        let mut manager = configured(100, 2 * WAD, 0);
        let mut staged = manager.stage();
        staged
            .update_user_asset(&user(), &asset(), WAD, 2 * WAD, HOUR)
            .unwrap();
        let changes = staged.finish();
        let events = manager.apply(changes);
        assert_eq!(
            events,
            vec![
                ProtocolEvent::AssetIndexUpdated {
                    asset: asset(),
                    index: 180_000
                },
                ProtocolEvent::UserIndexUpdated {
                    user: user(),
                    asset: asset(),
                    index: 180_000
                },
            ]
        );
        assert_eq!(manager.user_index(&user(), &asset()), 180_000);
    }

    #[test]
    fn test_pending_rewards_is_read_only() {
        let manager = configured(100, 2 * WAD, 0);
        let stakes = [UserStakeInput {
            asset: asset(),
            staked_by_user: WAD,
            total_staked: 2 * WAD,
        }];
        assert_eq!(manager.pending_rewards(&user(), &stakes, HOUR).unwrap(), 180_000);
        assert_eq!(manager.asset(&asset()).index, 0);
        assert_eq!(manager.user_index(&user(), &asset()), 0);
    }

    #[test]
    fn test_index_frozen_after_distribution_end() {
        let mut manager = configured(10, 20 * WAD, 0);
        let (at_end, _) = manager.update_asset_index(&asset(), 20 * WAD, 2 * YEAR).unwrap();
        let (later, _) = manager.update_asset_index(&asset(), 20 * WAD, 3 * YEAR).unwrap();
        assert!(at_end > 0);
        assert_eq!(at_end, later);
    }

    #[test]
    fn test_serde_roundtrip_preserves_indexes() {
        let mut manager = configured(100, 2 * WAD, 0);
        let mut staged = manager.stage();
        staged
            .update_user_asset(&user(), &asset(), WAD, 2 * WAD, HOUR)
            .unwrap();
        let changes = staged.finish();
        manager.apply(changes);

        let json = serde_json::to_string(&manager).unwrap();
        let back: DistributionManager = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manager);
    }
}
