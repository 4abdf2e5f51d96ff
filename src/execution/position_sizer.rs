use rust_decimal::Decimal;

/// The executor may pay up to 2% above the leader's price.
pub const SLIPPAGE_FACTOR: Decimal = Decimal::from_parts(102, 0, 0, false, 2);

/// Decimal places kept on mirrored share counts.
pub const SIZE_DECIMALS: u32 = 4;

/// Size a mirror order in shares.
///
/// `base = leader_size × pct / 100`, valued at `price` and capped at
/// `max_trade_amount` USD, then converted back to shares and rounded.
/// Returns `None` when the result is not a positive size (including any
/// non-positive price).
pub fn calculate_size(
    leader_size: Decimal,
    price: Decimal,
    copy_trade_percentage: Decimal,
    max_trade_amount: Decimal,
) -> Option<Decimal> {
    if price <= Decimal::ZERO {
        return None;
    }

    let base_size = leader_size * copy_trade_percentage / Decimal::ONE_HUNDRED;
    let usd = (base_size * price).min(max_trade_amount);
    let final_size = (usd / price).round_dp(SIZE_DECIMALS);

    (final_size > Decimal::ZERO).then_some(final_size)
}

/// Highest acceptable execution price for a leader fill at `price`.
pub fn slippage_ceiling(price: Decimal) -> Decimal {
    price * SLIPPAGE_FACTOR
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_of_leader_size() {
        // 100 shares @ 0.50, copy 20%
        let size = calculate_size(
            Decimal::from(100),
            Decimal::new(5, 1),
            Decimal::from(20),
            Decimal::from(100),
        );
        assert_eq!(size, Some(Decimal::from(20)));
        assert_eq!(slippage_ceiling(Decimal::new(5, 1)), Decimal::new(51, 2));
    }

    #[test]
    fn test_usd_cap_applies() {
        // 1000 @ 0.50, copy 50% → $250 capped to $100 → 200 shares
        let size = calculate_size(
            Decimal::from(1000),
            Decimal::new(5, 1),
            Decimal::from(50),
            Decimal::from(100),
        );
        assert_eq!(size, Some(Decimal::from(200)));
    }

    #[test]
    fn test_rounds_to_four_places() {
        let size = calculate_size(
            Decimal::from(1),
            Decimal::new(3, 1),
            Decimal::new(33, 0),
            Decimal::from(100),
        )
        .unwrap();
        assert_eq!(size, Decimal::new(3300, 4));
        assert!(size.scale() <= SIZE_DECIMALS);
    }

    #[test]
    fn test_non_positive_price_rejected() {
        assert_eq!(
            calculate_size(Decimal::from(10), Decimal::ZERO, Decimal::from(20), Decimal::from(100)),
            None
        );
        assert_eq!(
            calculate_size(Decimal::from(10), Decimal::new(-1, 1), Decimal::from(20), Decimal::from(100)),
            None
        );
    }

    #[test]
    fn test_tiny_trade_rounds_to_none() {
        let size = calculate_size(
            Decimal::new(1, 4),
            Decimal::new(5, 1),
            Decimal::from(1),
            Decimal::from(100),
        );
        assert_eq!(size, None);
    }
}
