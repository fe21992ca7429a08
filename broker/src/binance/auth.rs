//! HMAC-SHA256 signature generation for Binance API requests.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Sign a query string with HMAC-SHA256.
///
/// Returns the hex-encoded signature to append as `&signature=<sig>`.
pub fn sign(query_string: &str, secret_key: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret_key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(query_string.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Append `timestamp` and `recvWindow` to `params`, then the signature.
pub fn signed_query(params: &str, secret_key: &str, timestamp_ms: u64) -> String {
    let query = if params.is_empty() {
        format!("recvWindow={RECV_WINDOW_MS}&timestamp={timestamp_ms}")
    } else {
        format!("{params}&recvWindow={RECV_WINDOW_MS}&timestamp={timestamp_ms}")
    };
    let signature = sign(&query, secret_key);
    format!("{query}&signature={signature}")
}

/// Milliseconds a signed request stays valid after its timestamp.
pub const RECV_WINDOW_MS: u64 = 5000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_signature() {
        // From Binance API docs example
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        assert_eq!(
            sign(query, secret),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn signed_query_matches_docs_example() {
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let q = signed_query(
            "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1",
            secret,
            1499827319559,
        );
        assert!(q.ends_with(
            "&signature=c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        ));
    }

    #[test]
    fn signed_query_without_params() {
        let q = signed_query("", "secret", 42);
        assert!(q.starts_with("recvWindow=5000&timestamp=42&signature="));
    }
}
