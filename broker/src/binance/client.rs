//! Binance REST API client.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::debug;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use zeroize::Zeroizing;

use super::auth;
use super::types::{
    AccountInfo, ApiError, ExchangeInfo, MyTrade, OpenOrderInfo, OrderResponse, Ticker24h,
};
use crate::error::GatewayError;

const MAINNET_URL: &str = "https://api.binance.com";
const TESTNET_URL: &str = "https://testnet.binance.vision";

/// Binance error codes that mean the key, signature or permissions are wrong.
const AUTH_CODES: &[i64] = &[-1002, -1022, -2008, -2014, -2015];

/// Connection settings shared by every request.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Use the spot testnet instead of the live exchange.
    pub sandbox: bool,
    /// HTTP(S) proxy URL applied to all requests.
    pub proxy: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            sandbox: false,
            proxy: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Blocking Binance REST client.
pub struct BinanceClient {
    client: Client,
    api_key: String,
    secret_key: Zeroizing<String>,
    base_url: String,
}

impl BinanceClient {
    /// Create a new Binance client.
    pub fn new(
        api_key: &str,
        secret_key: &str,
        options: &ClientOptions,
    ) -> Result<Self, GatewayError> {
        let mut builder = Client::builder().timeout(options.timeout);
        if let Some(proxy) = &options.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| GatewayError::Unknown(format!("invalid proxy {proxy}: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::Unknown(format!("failed to build HTTP client: {e}")))?;

        let base_url = if options.sandbox {
            TESTNET_URL
        } else {
            MAINNET_URL
        };

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            secret_key: Zeroizing::new(secret_key.to_string()),
            base_url: base_url.to_string(),
        })
    }

    /// Test connectivity (GET /api/v3/ping).
    pub fn ping(&self) -> Result<(), GatewayError> {
        let url = format!("{}/api/v3/ping", self.base_url);
        let _: serde_json::Value = read(self.client.get(&url))?;
        Ok(())
    }

    /// Symbol rules (GET /api/v3/exchangeInfo).
    pub fn exchange_info(&self) -> Result<ExchangeInfo, GatewayError> {
        let url = format!("{}/api/v3/exchangeInfo", self.base_url);
        read(self.client.get(&url))
    }

    /// 24h ticker for a symbol (GET /api/v3/ticker/24hr).
    pub fn ticker_24h(&self, symbol: &str) -> Result<Ticker24h, GatewayError> {
        let url = format!("{}/api/v3/ticker/24hr?symbol={symbol}", self.base_url);
        read(self.client.get(&url))
    }

    /// Get account information (GET /api/v3/account).
    pub fn account_info(&self) -> Result<AccountInfo, GatewayError> {
        self.signed_get("/api/v3/account", "")
    }

    /// Resting orders (GET /api/v3/openOrders).
    pub fn open_orders(&self, symbol: &str) -> Result<Vec<OpenOrderInfo>, GatewayError> {
        self.signed_get("/api/v3/openOrders", &format!("symbol={symbol}"))
    }

    /// Own fills since `start_time_ms` (GET /api/v3/myTrades).
    pub fn my_trades(&self, symbol: &str, start_time_ms: i64) -> Result<Vec<MyTrade>, GatewayError> {
        self.signed_get(
            "/api/v3/myTrades",
            &format!("symbol={symbol}&startTime={start_time_ms}"),
        )
    }

    /// Submit a GTC limit order (POST /api/v3/order).
    pub fn submit_limit_order(
        &self,
        symbol: &str,
        side: &str,
        quantity: &str,
        price: &str,
    ) -> Result<OrderResponse, GatewayError> {
        let params = format!(
            "symbol={symbol}&side={side}&type=LIMIT&timeInForce=GTC&quantity={quantity}&price={price}"
        );
        debug!("Submitting Binance order: {params}");

        let body = auth::signed_query(&params, &self.secret_key, current_timestamp_ms());
        let url = format!("{}/api/v3/order", self.base_url);
        read(
            self.client
                .post(&url)
                .header("X-MBX-APIKEY", &self.api_key)
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(body),
        )
    }

    /// Cancel an order (DELETE /api/v3/order).
    pub fn cancel_order(&self, symbol: &str, order_id: &str) -> Result<(), GatewayError> {
        let query = auth::signed_query(
            &format!("symbol={symbol}&orderId={order_id}"),
            &self.secret_key,
            current_timestamp_ms(),
        );
        let url = format!("{}/api/v3/order?{query}", self.base_url);
        let _: serde_json::Value = read(
            self.client
                .delete(&url)
                .header("X-MBX-APIKEY", &self.api_key),
        )?;
        Ok(())
    }

    fn signed_get<T: DeserializeOwned>(&self, path: &str, params: &str) -> Result<T, GatewayError> {
        let query = auth::signed_query(params, &self.secret_key, current_timestamp_ms());
        let url = format!("{}{path}?{query}", self.base_url);
        read(self.client.get(&url).header("X-MBX-APIKEY", &self.api_key))
    }
}

/// Send a request and decode its JSON body, classifying every failure.
fn read<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, GatewayError> {
    let resp = request.send().map_err(transport)?;
    let status = resp.status();
    let body = resp.text().map_err(transport)?;

    if !status.is_success() {
        return Err(classify(status.as_u16(), &body));
    }

    serde_json::from_str(&body)
        .map_err(|e| GatewayError::Unknown(format!("failed to parse response: {e}")))
}

fn transport(e: reqwest::Error) -> GatewayError {
    if e.is_decode() {
        GatewayError::Unknown(format!("failed to decode response: {e}"))
    } else {
        GatewayError::Network(e.to_string())
    }
}

/// Map a non-2xx Binance response onto a gateway error kind.
pub fn classify(status: u16, body: &str) -> GatewayError {
    let api = serde_json::from_str::<ApiError>(body).ok();
    let detail = match &api {
        Some(e) => format!("{} ({})", e.msg, e.code),
        None => format!("HTTP {status}: {body}"),
    };

    if status == 401 || status == 403 {
        return GatewayError::Auth(detail);
    }
    match api {
        Some(e) if AUTH_CODES.contains(&e.code) => GatewayError::Auth(detail),
        Some(_) => GatewayError::Exchange(detail),
        None if status >= 500 => GatewayError::Network(detail),
        None => GatewayError::Unknown(detail),
    }
}

/// Current timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}
