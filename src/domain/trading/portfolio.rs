use crate::domain::ledger::types::Holding;
use rust_decimal::Decimal;
use serde::Serialize;

/// Valuation state of a single holding row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowValuation {
    Priced { price: Decimal, value: Decimal },
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioRow {
    pub symbol: String,
    pub name: String,
    pub net_shares: i64,
    pub valuation: RowValuation,
}

impl PortfolioRow {
    pub fn value(&self) -> Option<Decimal> {
        match &self.valuation {
            RowValuation::Priced { value, .. } => Some(*value),
            RowValuation::Unavailable { .. } => None,
        }
    }
}

/// Read-time valuation of a user's account. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioView {
    pub cash: Decimal,
    pub rows: Vec<PortfolioRow>,
    /// Sum of the rows that could be priced
    pub holdings_value: Decimal,
    /// `cash + holdings_value`
    pub total: Decimal,
    /// At least one row could not be priced, so `total` understates the account
    pub degraded: bool,
}

impl PortfolioView {
    /// Builds the view from held positions and their price lookups.
    ///
    /// `prices` is parallel to `holdings`; an `Err` marks the row unavailable.
    pub fn compose(
        cash: Decimal,
        holdings: Vec<Holding>,
        prices: Vec<Result<Decimal, String>>,
    ) -> Self {
        let mut holdings_value = Decimal::ZERO;
        let mut degraded = false;

        let rows = holdings
            .into_iter()
            .zip(prices)
            .map(|(holding, price)| {
                let valuation = match price {
                    Ok(price) => match Decimal::from(holding.net_shares).checked_mul(price) {
                        Some(value) => {
                            holdings_value += value;
                            RowValuation::Priced { price, value }
                        }
                        None => RowValuation::Unavailable {
                            reason: format!("value of {} overflows", holding.symbol),
                        },
                    },
                    Err(reason) => RowValuation::Unavailable { reason },
                };
                if matches!(valuation, RowValuation::Unavailable { .. }) {
                    degraded = true;
                }
                PortfolioRow {
                    symbol: holding.symbol,
                    name: holding.name,
                    net_shares: holding.net_shares,
                    valuation,
                }
            })
            .collect();

        Self {
            cash,
            rows,
            holdings_value,
            total: cash + holdings_value,
            degraded,
        }
    }

    pub fn unavailable_symbols(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|r| r.value().is_none())
            .map(|r| r.symbol.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn holding(symbol: &str, net_shares: i64) -> Holding {
        Holding {
            symbol: symbol.to_string(),
            name: format!("{} Corp", symbol),
            net_shares,
        }
    }

    #[test]
    fn test_total_is_cash_plus_priced_holdings() {
        let view = PortfolioView::compose(
            dec!(9600),
            vec![holding("AAPL", 10), holding("X", 6)],
            vec![Ok(dec!(110)), Ok(dec!(150))],
        );

        // 9600 + 10 * 110 + 6 * 150
        assert_eq!(view.holdings_value, dec!(2000));
        assert_eq!(view.total, dec!(11600));
        assert!(!view.degraded);
    }

    #[test]
    fn test_failed_price_marks_view_degraded() {
        let view = PortfolioView::compose(
            dec!(100),
            vec![holding("AAPL", 2), holding("GONE", 5)],
            vec![Ok(dec!(50)), Err("lookup timed out".to_string())],
        );

        assert!(view.degraded);
        assert_eq!(view.total, dec!(200));
        assert_eq!(view.unavailable_symbols(), vec!["GONE"]);
        assert_eq!(
            view.rows[1].valuation,
            RowValuation::Unavailable {
                reason: "lookup timed out".to_string()
            }
        );
    }

    #[test]
    fn test_empty_portfolio_is_just_cash() {
        let view = PortfolioView::compose(dec!(10000), vec![], vec![]);
        assert_eq!(view.total, dec!(10000));
        assert!(view.rows.is_empty());
        assert!(!view.degraded);
    }
}
