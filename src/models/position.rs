use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Side;

/// Net holding for one (market_id, outcome_id) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Position {
    pub market_id: String,
    pub outcome_id: String,
    pub size: Decimal,
    pub average_price: Decimal,
    pub unrealized_pnl: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// USD cost basis of the position.
    pub fn exposure(&self) -> Decimal {
        self.size * self.average_price
    }
}

/// What a fill does to the stored position row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PositionChange {
    /// Row written with the new size/average (created or updated).
    Upserted(Position),
    /// Row deleted; the position is fully closed.
    Closed { market_id: String, outcome_id: String },
    /// Nothing to change (NO fill with no position held).
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillOutcome {
    pub change: PositionChange,
    pub realized_pnl: Decimal,
}

/// Apply one fill to the current position state.
///
/// YES fills merge with a share-weighted average price. NO fills only reduce:
/// the closed quantity realises `(price - average_price)` per share and a
/// position at or below zero is removed. Short exposure is not modelled, so
/// any residual beyond the held size is dropped.
pub fn apply_fill(
    existing: Option<&Position>,
    market_id: &str,
    outcome_id: &str,
    side: Side,
    size: Decimal,
    price: Decimal,
    now: DateTime<Utc>,
) -> FillOutcome {
    match side {
        Side::Yes => {
            let (old_size, old_avg, unrealized) = existing
                .map(|p| (p.size, p.average_price, p.unrealized_pnl))
                .unwrap_or((Decimal::ZERO, Decimal::ZERO, Decimal::ZERO));

            let new_size = old_size + size;
            if new_size <= Decimal::ZERO {
                return FillOutcome {
                    change: close(existing, market_id, outcome_id),
                    realized_pnl: Decimal::ZERO,
                };
            }
            let new_avg = (old_size * old_avg + size * price) / new_size;

            FillOutcome {
                change: PositionChange::Upserted(Position {
                    market_id: market_id.to_string(),
                    outcome_id: outcome_id.to_string(),
                    size: new_size,
                    average_price: new_avg,
                    unrealized_pnl: unrealized,
                    updated_at: now,
                }),
                realized_pnl: Decimal::ZERO,
            }
        }
        Side::No => {
            let Some(pos) = existing else {
                return FillOutcome {
                    change: PositionChange::Unchanged,
                    realized_pnl: Decimal::ZERO,
                };
            };

            let closed_qty = size.min(pos.size).max(Decimal::ZERO);
            let realized_pnl = closed_qty * (price - pos.average_price);
            let new_size = pos.size - size;

            let change = if new_size <= Decimal::ZERO {
                close(existing, market_id, outcome_id)
            } else {
                PositionChange::Upserted(Position {
                    size: new_size,
                    updated_at: now,
                    ..pos.clone()
                })
            };

            FillOutcome { change, realized_pnl }
        }
    }
}

fn close(existing: Option<&Position>, market_id: &str, outcome_id: &str) -> PositionChange {
    match existing {
        Some(_) => PositionChange::Closed {
            market_id: market_id.to_string(),
            outcome_id: outcome_id.to_string(),
        },
        None => PositionChange::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(size: i64, avg: Decimal) -> Position {
        Position {
            market_id: "m1".into(),
            outcome_id: "o1".into(),
            size: Decimal::from(size),
            average_price: avg,
            unrealized_pnl: Decimal::ZERO,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_yes_fill_merges_weighted_average() {
        let pos = position(10, Decimal::new(4, 1));
        let out = apply_fill(
            Some(&pos),
            "m1",
            "o1",
            Side::Yes,
            Decimal::from(10),
            Decimal::new(6, 1),
            Utc::now(),
        );

        match out.change {
            PositionChange::Upserted(p) => {
                assert_eq!(p.size, Decimal::from(20));
                assert_eq!(p.average_price, Decimal::new(5, 1));
            }
            other => panic!("expected upsert, got {other:?}"),
        }
        assert_eq!(out.realized_pnl, Decimal::ZERO);
    }

    #[test]
    fn test_yes_fill_opens_new_position() {
        let out = apply_fill(None, "m1", "o1", Side::Yes, Decimal::from(5), Decimal::new(51, 2), Utc::now());
        match out.change {
            PositionChange::Upserted(p) => {
                assert_eq!(p.size, Decimal::from(5));
                assert_eq!(p.average_price, Decimal::new(51, 2));
            }
            other => panic!("expected upsert, got {other:?}"),
        }
    }

    #[test]
    fn test_no_fill_beyond_size_closes_position() {
        let pos = position(10, Decimal::new(5, 1));
        let out = apply_fill(
            Some(&pos),
            "m1",
            "o1",
            Side::No,
            Decimal::from(15),
            Decimal::new(7, 1),
            Utc::now(),
        );

        assert!(matches!(out.change, PositionChange::Closed { .. }));
        // Only the 10 held shares realise PnL: 10 × (0.7 − 0.5)
        assert_eq!(out.realized_pnl, Decimal::from(2));
    }

    #[test]
    fn test_partial_no_fill_keeps_average() {
        let pos = position(10, Decimal::new(5, 1));
        let out = apply_fill(
            Some(&pos),
            "m1",
            "o1",
            Side::No,
            Decimal::from(4),
            Decimal::new(4, 1),
            Utc::now(),
        );

        match out.change {
            PositionChange::Upserted(p) => {
                assert_eq!(p.size, Decimal::from(6));
                assert_eq!(p.average_price, Decimal::new(5, 1));
            }
            other => panic!("expected upsert, got {other:?}"),
        }
        assert_eq!(out.realized_pnl, Decimal::new(-4, 1));
    }

    #[test]
    fn test_no_fill_without_position_is_noop() {
        let out = apply_fill(None, "m1", "o1", Side::No, Decimal::from(3), Decimal::new(5, 1), Utc::now());
        assert_eq!(out.change, PositionChange::Unchanged);
        assert_eq!(out.realized_pnl, Decimal::ZERO);
    }
}
