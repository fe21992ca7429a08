//! Binance-specific API response types.
//!
//! Numeric fields stay strings here, as Binance sends them; conversion to
//! `Decimal` happens in the broker so parse failures map to gateway errors.

use serde::Deserialize;

/// Binance account balance entry.
#[derive(Debug, Deserialize)]
pub struct BalanceInfo {
    pub asset: String,
    pub free: String,
    pub locked: String,
}

/// Binance account info response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub balances: Vec<BalanceInfo>,
    #[serde(default)]
    pub can_trade: bool,
}

/// Binance order response (POST /api/v3/order).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub symbol: String,
    pub order_id: u64,
    pub status: String,
}

/// 24h rolling ticker (GET /api/v3/ticker/24hr).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24h {
    pub symbol: String,
    pub last_price: String,
    #[serde(default)]
    pub bid_price: Option<String>,
    #[serde(default)]
    pub ask_price: Option<String>,
}

/// Entry of GET /api/v3/openOrders.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrderInfo {
    pub symbol: String,
    pub order_id: u64,
    pub price: String,
    pub orig_qty: String,
    pub side: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub time: i64,
}

/// Entry of GET /api/v3/myTrades.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyTrade {
    pub symbol: String,
    pub id: u64,
    pub order_id: u64,
    pub price: String,
    pub qty: String,
    pub is_buyer: bool,
    pub time: i64,
}

/// GET /api/v3/exchangeInfo.
#[derive(Debug, Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub filters: Vec<Filter>,
}

/// Symbol trading rules. Only the filters that bound price, quantity and
/// order value are decoded.
#[derive(Debug, Deserialize)]
#[serde(tag = "filterType")]
pub enum Filter {
    #[serde(rename = "PRICE_FILTER")]
    Price {
        #[serde(rename = "tickSize")]
        tick_size: String,
    },
    #[serde(rename = "LOT_SIZE")]
    Lot {
        #[serde(rename = "stepSize")]
        step_size: String,
    },
    #[serde(rename = "MIN_NOTIONAL")]
    MinNotional {
        #[serde(rename = "minNotional")]
        min_notional: String,
    },
    #[serde(rename = "NOTIONAL")]
    Notional {
        #[serde(rename = "minNotional")]
        min_notional: String,
    },
    #[serde(other)]
    Other,
}

/// Error payload: `{"code": -2015, "msg": "..."}`.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: i64,
    pub msg: String,
}
