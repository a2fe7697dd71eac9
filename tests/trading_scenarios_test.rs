mod common;

use common::{Harness, STORE_KINDS};
use rust_decimal_macros::dec;
use stockledger::domain::errors::TradingError;
use stockledger::domain::trading::portfolio::RowValuation;
use stockledger::domain::trading::types::TradeIntent;

#[tokio::test]
async fn test_buy_sell_oversell_scenario() {
    for kind in STORE_KINDS {
        let h = Harness::new(kind).await;
        let user = h.user_with_cash("alice", dec!(10000)).await;
        h.listing("X", dec!(100)).await;

        let receipt = h.engine.buy(user, "X", 10).await.unwrap();
        assert_eq!(receipt.cash_after, dec!(9000), "{:?}", kind);
        assert_eq!(h.ledger.get_net_shares(user, "X").await.unwrap(), 10);

        h.prices.set_price("X", dec!(150)).await;
        let receipt = h.engine.sell(user, "X", 4).await.unwrap();
        assert_eq!(receipt.cash_after, dec!(9600), "{:?}", kind);
        assert_eq!(h.ledger.get_net_shares(user, "X").await.unwrap(), 6);

        let history_before = h.engine.history(user).await.unwrap();
        let err = h.engine.sell(user, "X", 7).await.unwrap_err();
        assert_eq!(
            err,
            TradingError::InsufficientShares {
                symbol: "X".to_string(),
                requested: 7,
                held: 6,
            },
            "{:?}",
            kind
        );
        assert_eq!(h.engine.cash(user).await.unwrap(), dec!(9600));
        assert_eq!(h.ledger.get_net_shares(user, "X").await.unwrap(), 6);
        assert_eq!(h.engine.history(user).await.unwrap(), history_before);
    }
}

#[tokio::test]
async fn test_unaffordable_buy_has_no_side_effects() {
    for kind in STORE_KINDS {
        let h = Harness::new(kind).await;
        let user = h.user_with_cash("bob", dec!(50)).await;
        h.listing("X", dec!(100)).await;

        let err = h.engine.buy(user, "X", 1).await.unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS", "{:?}", kind);
        assert_eq!(h.engine.cash(user).await.unwrap(), dec!(50));
        assert!(h.engine.history(user).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_buy_then_partial_sell_leaves_difference() {
    for kind in STORE_KINDS {
        for (n, m) in [(1, 1), (5, 2), (12, 0), (30, 29)] {
            let h = Harness::new(kind).await;
            let user = h.user_with_cash("carol", dec!(100000)).await;
            h.listing("ABC", dec!(12.34)).await;

            h.engine
                .execute(TradeIntent::buy(user, "ABC", n))
                .await
                .unwrap();
            if m > 0 {
                h.engine
                    .execute(TradeIntent::sell(user, "abc", m))
                    .await
                    .unwrap();
            }

            assert_eq!(
                h.ledger.get_net_shares(user, "ABC").await.unwrap(),
                n - m,
                "{:?} n={} m={}",
                kind,
                n,
                m
            );
            assert_eq!(h.history_net(user, "ABC").await, n - m);
        }
    }
}

#[tokio::test]
async fn test_fully_sold_position_drops_out_of_holdings() {
    for kind in STORE_KINDS {
        let h = Harness::new(kind).await;
        let user = h.user_with_cash("dave", dec!(1000)).await;
        h.listing("AAA", dec!(10)).await;
        h.listing("BBB", dec!(20)).await;

        h.engine.buy(user, "BBB", 2).await.unwrap();
        h.engine.buy(user, "AAA", 3).await.unwrap();
        h.engine.sell(user, "BBB", 2).await.unwrap();

        let holdings = h.engine.holdings(user).await.unwrap();
        let symbols: Vec<&str> = holdings.iter().map(|h| h.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAA"], "{:?}", kind);
        assert_eq!(h.engine.history(user).await.unwrap().len(), 3);

        let err = h.engine.sell(user, "BBB", 1).await.unwrap_err();
        assert_eq!(err.code(), "NO_POSITION");
    }
}

#[tokio::test]
async fn test_portfolio_view_degrades_per_row() {
    for kind in STORE_KINDS {
        let h = Harness::new(kind).await;
        let user = h.user_with_cash("erin", dec!(10000)).await;
        h.listing("AAA", dec!(10)).await;
        h.listing("BBB", dec!(100)).await;
        h.listing("CCC", dec!(5)).await;

        h.engine.buy(user, "AAA", 10).await.unwrap();
        h.engine.buy(user, "BBB", 5).await.unwrap();
        h.engine.buy(user, "CCC", 20).await.unwrap();

        let view = h.engine.portfolio_view(user).await.unwrap();
        assert!(!view.degraded);
        assert_eq!(view.cash, dec!(9300));
        assert_eq!(view.total, dec!(10000));

        h.prices.set_price("AAA", dec!(12)).await;
        h.prices.fail_symbol("BBB").await;
        h.prices.delist("CCC").await;

        let view = h.engine.portfolio_view(user).await.unwrap();
        assert!(view.degraded, "{:?}", kind);
        assert_eq!(view.unavailable_symbols(), vec!["BBB", "CCC"]);
        assert_eq!(view.holdings_value, dec!(120));
        assert_eq!(view.total, dec!(9420));
        assert_eq!(
            view.rows[0].valuation,
            RowValuation::Priced {
                price: dec!(12),
                value: dec!(120),
            }
        );
    }
}

#[tokio::test]
async fn test_deposit_credits_cash_without_history() {
    for kind in STORE_KINDS {
        let h = Harness::new(kind).await;
        let user = h.user_with_cash("frank", dec!(0)).await;

        let receipt = h.engine.deposit(user, dec!(250.75)).await.unwrap();
        assert_eq!(receipt.cash_after, dec!(250.75), "{:?}", kind);
        assert_eq!(
            h.engine.deposit(user, dec!(0.001)).await.unwrap_err().code(),
            "INVALID_INPUT"
        );
        assert_eq!(h.engine.cash(user).await.unwrap(), dec!(250.75));
        assert!(h.engine.history(user).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    for kind in STORE_KINDS {
        let h = Harness::new(kind).await;
        let ghost = stockledger::domain::ledger::types::UserId(404);

        assert_eq!(h.engine.cash(ghost).await.unwrap_err().code(), "NOT_FOUND");
        assert_eq!(h.engine.history(ghost).await.unwrap_err().code(), "NOT_FOUND");
        assert_eq!(
            h.engine.portfolio_view(ghost).await.unwrap_err().code(),
            "NOT_FOUND"
        );
        assert_eq!(
            h.engine.deposit(ghost, dec!(1)).await.unwrap_err().code(),
            "NOT_FOUND"
        );
    }
}
