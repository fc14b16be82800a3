use ethers::types::{I256, U256};

/// Fees are expressed in basis points of this denominator.
pub const FEE_DENOMINATOR: u64 = 10_000;

/// Pool share per option, rounded to the nearest whole percent. All-zero
/// pools yield a uniform 100/n split; that is a display convention, not a
/// contract guarantee.
pub fn percentages(pools: &[U256]) -> Vec<u64> {
    if pools.is_empty() {
        return Vec::new();
    }
    let total = sum(pools);
    if total.is_zero() {
        return vec![100 / pools.len() as u64; pools.len()];
    }
    pools
        .iter()
        .map(|p| ((*p * U256::from(200u64) + total) / (total * U256::from(2u64))).as_u64())
        .collect()
}

/// Stake left after the platform fee is taken.
pub fn net_stake(amount: U256, fee_bps: u32) -> U256 {
    let fee_bps = u64::from(fee_bps).min(FEE_DENOMINATOR);
    amount * U256::from(FEE_DENOMINATOR - fee_bps) / U256::from(FEE_DENOMINATOR)
}

/// Parimutuel payout projection for a new bet against the current pools.
///
/// Winners split the entire losing pool proportional to their share of the
/// winning pool; the fee comes off the new stake before it joins the pool.
/// With no opposing stake the net bet is returned in full, no profit. The
/// same integer arithmetic the contract uses, so pre-trade estimates match
/// on-chain results bit for bit.
pub fn projected_payout(
    pools: &[U256],
    option_index: usize,
    bet_amount: U256,
    fee_bps: u32,
) -> U256 {
    let net = net_stake(bet_amount, fee_bps);
    let Some(own) = pools.get(option_index) else {
        return U256::zero();
    };
    let losing = sum(pools) - *own;
    if losing.is_zero() {
        return net;
    }
    let winning_after = *own + net;
    if winning_after.is_zero() {
        return net;
    }
    net + net * losing / winning_after
}

/// Realized profit of one bet against the post-resolution pools. The winning
/// pool already contains the bet's stake, so no fee is re-applied here.
pub fn realized_profit(
    final_pools: &[U256],
    option_index: usize,
    amount: U256,
    won: bool,
) -> I256 {
    if !won {
        return -to_signed(amount);
    }
    let Some(winning) = final_pools.get(option_index) else {
        return I256::zero();
    };
    if winning.is_zero() {
        return I256::zero();
    }
    let losing = sum(final_pools) - *winning;
    to_signed(amount * losing / *winning)
}

fn sum(pools: &[U256]) -> U256 {
    pools.iter().fold(U256::zero(), |acc, p| acc + *p)
}

fn to_signed(x: U256) -> I256 {
    I256::try_from(x).unwrap_or(I256::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::utils::parse_ether;

    fn eth(v: &str) -> U256 {
        parse_ether(v).unwrap()
    }

    #[test]
    fn percentages_split_forty_sixty() {
        let pools = vec![U256::from(40u64), U256::from(60u64)];
        assert_eq!(percentages(&pools), vec![40, 60]);
    }

    #[test]
    fn percentages_uniform_on_empty_pools() {
        let pools = vec![U256::zero(), U256::zero()];
        assert_eq!(percentages(&pools), vec![50, 50]);

        let pools = vec![U256::zero(); 4];
        assert_eq!(percentages(&pools), vec![25, 25, 25, 25]);
    }

    #[test]
    fn percentages_sum_within_rounding_bound() {
        let cases: Vec<Vec<U256>> = vec![
            vec![U256::from(1u64), U256::from(1u64), U256::from(1u64)],
            vec![U256::from(7u64), U256::from(11u64), U256::from(13u64)],
            vec![eth("0.3"), eth("1.7"), eth("2.0"), eth("0.001")],
        ];
        for pools in cases {
            let total: u64 = percentages(&pools).iter().sum();
            let n = pools.len() as u64;
            assert!(
                total >= 100 - n && total <= 100 + n,
                "sum {total} out of bound for {pools:?}"
            );
        }
    }

    #[test]
    fn net_stake_takes_fee_exactly() {
        assert_eq!(net_stake(eth("1"), 300), eth("0.97"));
        assert_eq!(net_stake(eth("1"), 0), eth("1"));
        // fee capped at 100%
        assert_eq!(net_stake(eth("1"), 20_000), U256::zero());
    }

    #[test]
    fn payout_with_no_opposing_stake_is_net_bet() {
        // bet 1.0 on option 1 into empty pools, 3% fee
        let pools = vec![U256::zero(), U256::zero()];
        let payout = projected_payout(&pools, 1, eth("1"), 300);
        assert_eq!(payout, eth("0.97"));
    }

    #[test]
    fn payout_splits_losing_pool() {
        // pools [2.0, 0.5], bet 1.0 on option 0, no fee:
        // net 1.0, winning-after 3.0, losing 0.5
        let pools = vec![eth("2"), eth("0.5")];
        let payout = projected_payout(&pools, 0, eth("1"), 0);
        let expected = eth("1") + eth("1") * eth("0.5") / eth("3");
        assert_eq!(payout, expected);
    }

    #[test]
    fn payout_out_of_range_option_is_zero() {
        let pools = vec![eth("1"), eth("1")];
        assert_eq!(projected_payout(&pools, 5, eth("1"), 0), U256::zero());
    }

    #[test]
    fn zero_net_bet_into_empty_option_does_not_divide_by_zero() {
        let pools = vec![U256::zero(), eth("1")];
        assert_eq!(projected_payout(&pools, 0, U256::zero(), 0), U256::zero());
    }

    #[test]
    fn realized_profit_of_losing_bet_is_negative_stake() {
        let pools = vec![eth("3"), eth("2")];
        let profit = realized_profit(&pools, 1, eth("0.5"), false);
        assert_eq!(profit, -I256::try_from(eth("0.5")).unwrap());
    }

    #[test]
    fn realized_profit_matches_parimutuel_split() {
        // winning pool 1.97 (stake included), losing pool 3.0, stake 1.0:
        // profit = 1.0 * 3.0 / 1.97
        let pools = vec![eth("3"), eth("1.97")];
        let profit = realized_profit(&pools, 1, eth("1"), true);
        assert_eq!(profit, I256::from(1_522_842_639_593_908_629i64));
    }

    #[test]
    fn projection_round_trips_into_realized_profit() {
        // project pre-trade, then recompute post-resolution over the same
        // pool snapshot with the stake folded in; the numbers must agree.
        let pre = vec![eth("2"), eth("0.5")];
        let stake = eth("1");
        let payout = projected_payout(&pre, 0, stake, 0);

        let post = vec![pre[0] + stake, pre[1]];
        let profit = realized_profit(&post, 0, stake, true);
        assert_eq!(
            I256::try_from(payout).unwrap(),
            I256::try_from(stake).unwrap() + profit
        );
    }
}
