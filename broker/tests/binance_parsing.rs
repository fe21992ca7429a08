//! Binance response parsing and request signing. No live connection needed.

#[cfg(feature = "binance")]
mod binance_tests {
    use quicktrade_broker::GatewayError;
    use quicktrade_broker::binance::client::classify;
    use quicktrade_broker::binance::types::{
        AccountInfo, ExchangeInfo, MyTrade, OpenOrderInfo, OrderResponse, Ticker24h,
    };
    use quicktrade_broker::binance::{
        auth, market_from_info, parse_decimal, to_binance_symbol, unified_status,
    };
    use rust_decimal_macros::dec;

    // ========================================================================
    // HMAC-SHA256 signing
    // ========================================================================

    #[test]
    fn sign_binance_docs_example() {
        // Official Binance API documentation example
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC\
                     &quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        assert_eq!(
            auth::sign(query, secret),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn sign_different_keys_differ() {
        let a = auth::sign("foo=bar", "key1");
        let b = auth::sign("foo=bar", "key2");
        assert_ne!(a, b, "different keys must produce different signatures");
        assert_eq!(a.len(), 64, "SHA256 hex is always 64 chars");
    }

    // ========================================================================
    // Account and orders
    // ========================================================================

    #[test]
    fn parse_account_info_extra_fields_ignored() {
        let json = r#"{
            "makerCommission": 15,
            "balances": [
                { "asset": "BTC", "free": "1.00000000", "locked": "0.50000000" },
                { "asset": "USDT", "free": "10000.00", "locked": "0.00" }
            ],
            "canTrade": true,
            "permissions": ["SPOT"]
        }"#;

        let info: AccountInfo = serde_json::from_str(json).unwrap();
        assert!(info.can_trade);
        assert_eq!(info.balances.len(), 2);
        assert_eq!(info.balances[0].locked, "0.50000000");
    }

    #[test]
    fn parse_order_response_new() {
        let json = r#"{
            "symbol": "BTCUSDT",
            "orderId": 28,
            "clientOrderId": "6gCrw2kRUAF9CvJDGP16IP",
            "status": "NEW",
            "executedQty": "0.00000000"
        }"#;

        let resp: OrderResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.order_id, 28);
        assert_eq!(unified_status(&resp.status), "open");
    }

    #[test]
    fn parse_open_orders() {
        let json = r#"[{
            "symbol": "LTCBTC",
            "orderId": 1,
            "price": "0.10000000",
            "origQty": "1.00000000",
            "executedQty": "0.00000000",
            "status": "NEW",
            "timeInForce": "GTC",
            "type": "LIMIT",
            "side": "BUY",
            "time": 1499827319559
        }]"#;

        let orders: Vec<OpenOrderInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(orders[0].order_type, "LIMIT");
        assert_eq!(orders[0].time, 1499827319559);
        assert_eq!(parse_decimal("price", &orders[0].price).unwrap(), dec!(0.1));
    }

    #[test]
    fn parse_my_trades() {
        let json = r#"[{
            "symbol": "BNBBTC",
            "id": 28457,
            "orderId": 100234,
            "price": "4.00000100",
            "qty": "12.00000000",
            "quoteQty": "48.000012",
            "commission": "10.10000000",
            "commissionAsset": "BNB",
            "time": 1499865549590,
            "isBuyer": true,
            "isMaker": false,
            "isBestMatch": true
        }]"#;

        let trades: Vec<MyTrade> = serde_json::from_str(json).unwrap();
        assert_eq!(trades[0].id, 28457);
        assert_eq!(trades[0].order_id, 100234);
        assert!(trades[0].is_buyer);
    }

    #[test]
    fn parse_ticker_24h() {
        let json = r#"{
            "symbol": "BTCUSDT",
            "priceChange": "-94.99999800",
            "lastPrice": "43251.00000000",
            "bidPrice": "43250.50000000",
            "askPrice": "43251.00000000",
            "volume": "8913.30000000"
        }"#;

        let t: Ticker24h = serde_json::from_str(json).unwrap();
        assert_eq!(parse_decimal("lastPrice", &t.last_price).unwrap(), dec!(43251));
        assert_eq!(t.bid_price.as_deref(), Some("43250.50000000"));
    }

    // ========================================================================
    // exchangeInfo filters
    // ========================================================================

    fn exchange_info() -> ExchangeInfo {
        let json = r#"{
            "timezone": "UTC",
            "symbols": [
                {
                    "symbol": "BTCUSDT",
                    "status": "TRADING",
                    "baseAsset": "BTC",
                    "quoteAsset": "USDT",
                    "filters": [
                        { "filterType": "PRICE_FILTER", "minPrice": "0.01", "maxPrice": "1000000.00", "tickSize": "0.01000000" },
                        { "filterType": "LOT_SIZE", "minQty": "0.00001", "maxQty": "9000", "stepSize": "0.00001000" },
                        { "filterType": "ICEBERG_PARTS", "limit": 10 },
                        { "filterType": "NOTIONAL", "minNotional": "5.00000000", "applyMinToMarket": true }
                    ]
                },
                {
                    "symbol": "LUNAUSDT",
                    "status": "BREAK",
                    "baseAsset": "LUNA",
                    "quoteAsset": "USDT",
                    "filters": []
                },
                {
                    "symbol": "ETHBTC",
                    "status": "TRADING",
                    "baseAsset": "ETH",
                    "quoteAsset": "BTC",
                    "filters": [
                        { "filterType": "PRICE_FILTER", "tickSize": "0.00001000" },
                        { "filterType": "LOT_SIZE", "stepSize": "0.00010000" },
                        { "filterType": "MIN_NOTIONAL", "minNotional": "0.00010000" }
                    ]
                }
            ]
        }"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn market_from_filters() {
        let info = exchange_info();
        let btc = market_from_info(&info.symbols[0]).unwrap().unwrap();
        assert_eq!(btc.symbol, "BTC/USDT");
        assert_eq!(btc.price_step, dec!(0.01));
        assert_eq!(btc.amount_step, dec!(0.00001));
        assert_eq!(btc.min_notional, dec!(5));

        let eth = market_from_info(&info.symbols[2]).unwrap().unwrap();
        assert_eq!(eth.symbol, "ETH/BTC");
        assert_eq!(eth.min_notional, dec!(0.0001));
    }

    #[test]
    fn non_trading_symbols_skipped() {
        let info = exchange_info();
        assert!(market_from_info(&info.symbols[1]).unwrap().is_none());
    }

    #[test]
    fn symbol_mapping() {
        assert_eq!(to_binance_symbol("BTC/USDT"), "BTCUSDT");
    }

    // ========================================================================
    // Error classification
    // ========================================================================

    #[test]
    fn classify_auth_codes() {
        let body = r#"{"code":-2015,"msg":"Invalid API-key, IP, or permissions for action."}"#;
        assert!(matches!(classify(400, body), GatewayError::Auth(_)));
        assert!(matches!(classify(401, "unauthorized"), GatewayError::Auth(_)));
    }

    #[test]
    fn classify_exchange_rejections() {
        let body = r#"{"code":-2011,"msg":"Unknown order sent."}"#;
        match classify(400, body) {
            GatewayError::Exchange(msg) => assert!(msg.contains("Unknown order sent")),
            other => panic!("expected exchange error, got {other:?}"),
        }
    }

    #[test]
    fn classify_unparseable() {
        assert!(matches!(classify(502, "<html>"), GatewayError::Network(_)));
        assert!(matches!(classify(418, "teapot"), GatewayError::Unknown(_)));
    }

    #[test]
    fn parse_decimal_rejects_garbage() {
        assert!(matches!(
            parse_decimal("price", "abc"),
            Err(GatewayError::Unknown(_))
        ));
    }

    // ========================================================================
    // BinanceBroker construction (no connection)
    // ========================================================================

    #[test]
    fn broker_not_connected_errors() {
        use quicktrade_broker::Broker;
        use quicktrade_broker::binance::BinanceBroker;
        use quicktrade_broker::binance::client::ClientOptions;

        let broker = BinanceBroker::new("test-key", "test-secret", ClientOptions::default());
        assert_eq!(broker.exchange_id(), "binance");
        assert!(broker.fetch_balance().is_err());
        assert!(broker.load_markets().is_err());
    }
}
