//! Binance spot broker implementation.

pub mod auth;
pub mod client;
pub mod types;

use std::str::FromStr;

use log::{debug, info};
use quicktrade::{MarketDescriptor, Side, unified_symbol};
use rust_decimal::Decimal;
use zeroize::Zeroizing;

use crate::Broker;
use crate::error::GatewayError;
use crate::types::*;
use client::{BinanceClient, ClientOptions};
use types::{Filter, SymbolInfo};

/// Binance spot broker implementing the generic Broker trait.
///
/// Uses REST API for all operations. Blocking (sync) via reqwest::blocking.
pub struct BinanceBroker {
    api_key: String,
    secret_key: Zeroizing<String>,
    options: ClientOptions,
    client: Option<BinanceClient>,
}

impl BinanceBroker {
    /// Create a new Binance broker handle (not yet connected).
    pub fn new(api_key: &str, secret_key: &str, options: ClientOptions) -> Self {
        Self {
            api_key: api_key.to_string(),
            secret_key: Zeroizing::new(secret_key.to_string()),
            options,
            client: None,
        }
    }

    fn require_client(&self) -> Result<&BinanceClient, GatewayError> {
        self.client.as_ref().ok_or_else(GatewayError::not_connected)
    }
}

/// Convert a unified `BASE/QUOTE` symbol to a Binance trading pair (`BASEQUOTE`).
pub fn to_binance_symbol(symbol: &str) -> String {
    symbol.replace('/', "")
}

/// Parse a Binance decimal string, dropping trailing zeros.
pub fn parse_decimal(field: &str, s: &str) -> Result<Decimal, GatewayError> {
    Decimal::from_str(s)
        .map(|d| d.normalize())
        .map_err(|e| GatewayError::Unknown(format!("bad {field} {s:?}: {e}")))
}

/// Map a Binance order status onto the lowercase vocabulary used in journals.
pub fn unified_status(status: &str) -> String {
    match status {
        "NEW" | "PARTIALLY_FILLED" => "open".into(),
        "FILLED" => "closed".into(),
        "CANCELED" | "PENDING_CANCEL" | "EXPIRED" | "EXPIRED_IN_MATCH" => "canceled".into(),
        other => other.to_lowercase(),
    }
}

/// Build a market descriptor from exchangeInfo. Symbols that are not trading,
/// or lack a tick or lot filter, yield `None`.
pub fn market_from_info(info: &SymbolInfo) -> Result<Option<MarketDescriptor>, GatewayError> {
    if info.status != "TRADING" {
        return Ok(None);
    }

    let mut tick = None;
    let mut lot = None;
    let mut min_notional = Decimal::ZERO;

    for f in &info.filters {
        match f {
            Filter::Price { tick_size } => tick = Some(parse_decimal("tickSize", tick_size)?),
            Filter::Lot { step_size } => lot = Some(parse_decimal("stepSize", step_size)?),
            Filter::MinNotional { min_notional: n } | Filter::Notional { min_notional: n } => {
                min_notional = min_notional.max(parse_decimal("minNotional", n)?);
            }
            Filter::Other => {}
        }
    }

    let (Some(price_step), Some(amount_step)) = (tick, lot) else {
        debug!("{}: missing PRICE_FILTER or LOT_SIZE, skipped", info.symbol);
        return Ok(None);
    };
    if price_step <= Decimal::ZERO || amount_step <= Decimal::ZERO {
        return Ok(None);
    }

    Ok(Some(MarketDescriptor {
        symbol: unified_symbol(&info.base_asset, &info.quote_asset),
        base: info.base_asset.clone(),
        quote: info.quote_asset.clone(),
        price_step,
        amount_step,
        min_notional,
    }))
}

fn parse_side(s: &str) -> Result<Side, GatewayError> {
    Side::from_str(s).map_err(|e| GatewayError::Unknown(e.to_string()))
}

impl Broker for BinanceBroker {
    fn exchange_id(&self) -> &str {
        "binance"
    }

    fn connect(&mut self) -> Result<(), GatewayError> {
        let client = BinanceClient::new(&self.api_key, &self.secret_key, &self.options)?;
        client.ping()?;
        let account = client.account_info()?;
        info!(
            "Connected to Binance{} ({} balances, can_trade={})",
            if self.options.sandbox { " testnet" } else { "" },
            account.balances.len(),
            account.can_trade
        );
        self.client = Some(client);
        Ok(())
    }

    fn load_markets(&self) -> Result<Markets, GatewayError> {
        let client = self.require_client()?;
        let info = client.exchange_info()?;

        let mut markets = Markets::new();
        for s in &info.symbols {
            if let Some(market) = market_from_info(s)? {
                markets.insert(market.symbol.clone(), market);
            }
        }
        Ok(markets)
    }

    fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, GatewayError> {
        let client = self.require_client()?;
        let t = client.ticker_24h(&to_binance_symbol(symbol))?;

        let bid = t
            .bid_price
            .as_deref()
            .map(|p| parse_decimal("bidPrice", p))
            .transpose()?;
        let ask = t
            .ask_price
            .as_deref()
            .map(|p| parse_decimal("askPrice", p))
            .transpose()?;

        Ok(Ticker {
            symbol: symbol.to_string(),
            last: parse_decimal("lastPrice", &t.last_price)?,
            bid,
            ask,
        })
    }

    fn fetch_balance(&self) -> Result<Balances, GatewayError> {
        let client = self.require_client()?;
        let info = client.account_info()?;

        let balances = info
            .balances
            .iter()
            .map(|b| {
                Ok(Balance::new(
                    &b.asset,
                    parse_decimal("free", &b.free)?,
                    parse_decimal("locked", &b.locked)?,
                ))
            })
            .collect::<Result<Vec<_>, GatewayError>>()?;

        Ok(Balances(balances))
    }

    fn fetch_open_orders(&self, symbol: &str) -> Result<Vec<OpenOrder>, GatewayError> {
        let client = self.require_client()?;
        client
            .open_orders(&to_binance_symbol(symbol))?
            .into_iter()
            .map(|o| {
                Ok(OpenOrder {
                    id: OrderId(o.order_id.to_string()),
                    symbol: symbol.to_string(),
                    order_type: o.order_type.to_lowercase(),
                    side: parse_side(&o.side)?,
                    price: parse_decimal("price", &o.price)?,
                    amount: parse_decimal("origQty", &o.orig_qty)?,
                    timestamp_ms: o.time,
                })
            })
            .collect()
    }

    fn fetch_my_trades(&self, symbol: &str, since_ms: i64) -> Result<Vec<Trade>, GatewayError> {
        let client = self.require_client()?;
        client
            .my_trades(&to_binance_symbol(symbol), since_ms)?
            .into_iter()
            .map(|t| {
                Ok(Trade {
                    id: t.id.to_string(),
                    order_id: OrderId(t.order_id.to_string()),
                    symbol: symbol.to_string(),
                    side: if t.is_buyer { Side::Buy } else { Side::Sell },
                    price: parse_decimal("price", &t.price)?,
                    amount: parse_decimal("qty", &t.qty)?,
                    timestamp_ms: t.time,
                })
            })
            .collect()
    }

    fn create_limit_order(
        &self,
        symbol: &str,
        side: Side,
        amount: Decimal,
        price: Decimal,
    ) -> Result<PlacedOrder, GatewayError> {
        let client = self.require_client()?;
        let side = match side {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        };

        let resp = client.submit_limit_order(
            &to_binance_symbol(symbol),
            side,
            &amount.normalize().to_string(),
            &price.normalize().to_string(),
        )?;

        Ok(PlacedOrder {
            id: OrderId(resp.order_id.to_string()),
            status: unified_status(&resp.status),
        })
    }

    fn cancel_order(&self, id: &OrderId, symbol: &str) -> Result<(), GatewayError> {
        let client = self.require_client()?;
        client.cancel_order(&to_binance_symbol(symbol), &id.0)
    }
}
