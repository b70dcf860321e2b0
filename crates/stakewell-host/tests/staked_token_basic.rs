// Staking ledger basics: staking, reward accrual and claims.

mod common;

use common::{setup, Fixture, T0};
use stakewell_core::{
    Amount, ProtocolEvent, StakewellError, TokenLedger, DAY, HOUR, MAX_AMOUNT, WAD,
};
use stakewell_staking::CooldownState;

fn configure(f: &mut Fixture, emission: Amount, now: u64) {
    let manager = f.emission_manager;
    f.protocol.configure_staking(&manager, emission, now).unwrap();
}

#[test]
fn test_initial_configuration() {
    let f = setup();
    let staking = f.protocol.staking();
    assert_eq!(staking.name(), "Staked Accu");
    assert_eq!(staking.symbol(), "stkACCU");
    assert_eq!(staking.decimals(), 18);
    assert_eq!(staking.revision(), 1);
    assert_eq!(stakewell_core::StakingGateway::staked_token(staking), f.accu());
    assert_eq!(staking.reward_token(), f.accu());
    assert_eq!(staking.cooldown_seconds(), 24 * HOUR);
    assert_eq!(staking.unstake_window(), 48 * HOUR);
    assert_eq!(staking.rewards_vault(), f.config.staking.rewards_vault);
}

#[test]
fn test_stake_zero_reverts() {
    let mut f = setup();
    let user1 = f.user1;
    assert_eq!(
        f.protocol.stake(&user1, &user1, 0, T0).unwrap_err(),
        StakewellError::ZeroAmount
    );
}

#[test]
fn test_cooldown_without_stake_reverts() {
    let mut f = setup();
    let user1 = f.user1;
    assert_eq!(
        f.protocol.cooldown(&user1, T0).unwrap_err(),
        StakewellError::InvalidBalanceOnCooldown
    );
}

#[test]
fn test_stake_and_accumulate() {
    let mut f = setup();
    let user1 = f.user1;
    let custody = f.protocol.staking().address();
    f.fund(&user1, 70 * WAD);
    configure(&mut f, 100, T0);
    assert!(f.drain().contains(&ProtocolEvent::AssetConfigUpdated {
        asset: custody,
        emission_per_second: 100
    }));

    f.protocol.stake(&user1, &user1, 50 * WAD, T0).unwrap();
    assert_eq!(f.protocol.staked_balance(&user1), 50 * WAD);
    assert_eq!(f.accu_balance(&custody), 50 * WAD);
    assert_eq!(f.accu_balance(&user1), 20 * WAD);
    assert_eq!(f.protocol.staking().staker_rewards_to_claim(&user1), 0);

    // Sole staker for 100s: index grows by 100 * 100 / 50.
    f.protocol.stake(&user1, &user1, 20 * WAD, T0 + 100).unwrap();
    assert_eq!(f.protocol.staked_balance(&user1), 70 * WAD);
    assert_eq!(f.accu_balance(&custody), 70 * WAD);
    assert_eq!(f.protocol.staking().staker_rewards_to_claim(&user1), 10_000);
    assert!(f.drain().contains(&ProtocolEvent::RewardsAccrued {
        user: user1,
        amount: 10_000
    }));
}

#[test]
fn test_claims() {
    let mut f = setup();
    let user1 = f.user1;
    f.fund(&user1, 70 * WAD);
    configure(&mut f, 100, T0);
    f.protocol.stake(&user1, &user1, 50 * WAD, T0).unwrap();
    f.protocol.stake(&user1, &user1, 20 * WAD, T0 + 100).unwrap();
    f.drain();

    // Half of the settled rewards; the index does not move within T0 + 100.
    let settled = f.protocol.staking().staker_rewards_to_claim(&user1);
    let half = settled / 2;
    let before = f.accu_balance(&user1);
    f.protocol
        .claim_staking_rewards(&user1, &user1, half, T0 + 100)
        .unwrap();
    assert!(f.drain().contains(&ProtocolEvent::RewardsClaimed {
        from: user1,
        to: user1,
        amount: half
    }));
    assert_eq!(f.accu_balance(&user1), before + half);

    // Twice the remaining balance is rejected outright.
    let remaining = f.protocol.staking().staker_rewards_to_claim(&user1);
    let err = f
        .protocol
        .claim_staking_rewards(&user1, &user1, remaining * 2, T0 + 100)
        .unwrap_err();
    assert!(matches!(err, StakewellError::InvalidClaimAmount { .. }));
    assert_eq!(f.accu_balance(&user1), before + half);

    // MAX claims the settled balance plus what accrued since.
    // 100s at 100/s over 70 staked units, index floored.
    let pending = 70 * WAD * (100 * 100 * WAD / (70 * WAD)) / WAD;
    let claimed = f
        .protocol
        .claim_staking_rewards(&user1, &user1, MAX_AMOUNT, T0 + 200)
        .unwrap();
    assert_eq!(claimed, remaining + pending);
    assert_eq!(f.accu_balance(&user1), before + half + remaining + pending);
    assert_eq!(f.protocol.staking_rewards_balance(&user1, T0 + 200).unwrap(), 0);
}

#[test]
fn test_stake_with_rewards_disabled() {
    let mut f = setup();
    let user2 = f.user2;
    f.fund(&user2, 80 * WAD);
    configure(&mut f, 0, T0);

    f.protocol.stake(&user2, &user2, 50 * WAD, T0).unwrap();
    f.protocol.stake(&user2, &user2, 30 * WAD, T0 + 100).unwrap();
    assert_eq!(f.protocol.staking_rewards_balance(&user2, T0 + 200).unwrap(), 0);
    assert_eq!(f.protocol.staked_balance(&user2), 80 * WAD);
    assert_eq!(f.accu_balance(&user2), 0);
}

#[test]
fn test_stake_on_behalf_of_other() {
    let mut f = setup();
    let (user1, user2) = (f.user1, f.user2);
    f.fund(&user1, 10 * WAD);
    f.protocol.stake(&user1, &user2, 10 * WAD, T0).unwrap();
    assert_eq!(f.protocol.staked_balance(&user2), 10 * WAD);
    assert_eq!(f.protocol.staked_balance(&user1), 0);
    assert!(f.drain().contains(&ProtocolEvent::Staked {
        from: user1,
        on_behalf_of: user2,
        amount: 10 * WAD
    }));
}

#[test]
fn test_stake_during_unstake_window_dilutes_cooldown() {
    let mut f = setup();
    let user3 = f.user3;
    let (amount1, amount2) = (50 * WAD, 20 * WAD);
    f.fund(&user3, amount1 + amount2);
    f.protocol.stake(&user3, &user3, amount1, T0).unwrap();

    let err = f
        .protocol
        .redeem(&user3, &user3, MAX_AMOUNT, T0 + 100)
        .unwrap_err();
    assert!(matches!(err, StakewellError::InvalidCooldownState(_)));

    let cooldown_at = T0 + 100;
    f.protocol.cooldown(&user3, cooldown_at).unwrap();
    assert_eq!(f.protocol.staking().stakers_cooldown(&user3), cooldown_at);

    let now = cooldown_at + DAY;
    assert!(matches!(
        f.protocol.cooldown_state(&user3, now),
        CooldownState::Redeemable { .. }
    ));
    f.protocol.stake(&user3, &user3, amount2, now).unwrap();

    let expected = (amount2 * now as Amount + amount1 * cooldown_at as Amount) / (amount1 + amount2);
    assert_eq!(
        f.protocol.staking().stakers_cooldown(&user3) as Amount,
        expected
    );
}

#[test]
fn test_stake_after_expiry_drops_cooldown() {
    let mut f = setup();
    let user3 = f.user3;
    f.fund(&user3, 2 * WAD);
    f.protocol.stake(&user3, &user3, WAD, T0).unwrap();
    f.protocol.cooldown(&user3, T0).unwrap();
    f.protocol.stake(&user3, &user3, WAD, T0 + 3 * DAY).unwrap();
    assert_eq!(f.protocol.staking().stakers_cooldown(&user3), 0);
}

#[test]
fn test_vault_shortfall_fails_claim_cleanly() {
    let mut f = setup();
    let user1 = f.user1;
    f.fund(&user1, 10 * WAD);
    configure(&mut f, 100, T0);
    f.protocol.stake(&user1, &user1, 10 * WAD, T0).unwrap();

    let token = f.config.staking.reward_token;
    let vault = f.config.staking.rewards_vault;
    let all = f.protocol.ledger().balance_of(&token, &vault);
    f.protocol.ledger_mut().burn(&token, &vault, all).unwrap();
    let before = f.protocol.snapshot();

    let err = f
        .protocol
        .claim_staking_rewards(&user1, &user1, MAX_AMOUNT, T0 + 100)
        .unwrap_err();
    assert!(matches!(err, StakewellError::InsufficientBalance { .. }));
    assert_eq!(f.protocol.snapshot(), before);
}

#[test]
fn test_token_scale_emission_over_a_day() {
    let mut f = setup();
    let user1 = f.user1;
    let principal = 1_000 * WAD;
    f.fund(&user1, principal + WAD);
    // One whole token per second.
    configure(&mut f, WAD, T0);
    f.protocol.stake(&user1, &user1, principal, T0).unwrap();
    f.protocol.cooldown(&user1, T0 + 10).unwrap();

    // Sole staker for a day: every emitted unit is theirs.
    let day_later = T0 + DAY;
    f.protocol.stake(&user1, &user1, WAD, day_later).unwrap();
    let first_day = 86_400 * WAD;
    assert_eq!(f.protocol.staking().staker_rewards_to_claim(&user1), first_day);
    // 86_400 * WAD emitted over 1_000 * WAD staked, in wad.
    assert_eq!(f.protocol.staking().assets().index, 86_400 * WAD / 1_000);

    let staked = principal + WAD;
    let cooldown_at = (day_later + 1_000 * (T0 + 10)) / 1_001;
    assert_eq!(f.protocol.staking().stakers_cooldown(&user1), cooldown_at);

    // Reconfiguring after the gap settles the index under the old rate.
    let redeem_at = cooldown_at + DAY;
    configure(&mut f, 0, redeem_at);
    let elapsed = (redeem_at - day_later) as Amount;
    // Index moves by elapsed * WAD / 1_001; 1_001 whole tokens earn it.
    let second_leg = 1_001 * (elapsed * WAD / 1_001);

    let before = f.accu_balance(&user1);
    let redeemed = f
        .protocol
        .redeem(&user1, &user1, MAX_AMOUNT, redeem_at)
        .unwrap();
    assert_eq!(redeemed, staked);
    assert_eq!(f.protocol.staked_balance(&user1), 0);

    let claimed = f
        .protocol
        .claim_staking_rewards(&user1, &user1, MAX_AMOUNT, redeem_at)
        .unwrap();
    assert_eq!(claimed, first_day + second_leg);
    assert_eq!(f.accu_balance(&user1), before + staked + claimed);
}
