//! Gateway error types.

/// Errors that can occur while talking to an exchange.
///
/// Every gateway call maps its failures onto one of these four kinds so the
/// terminal can report them uniformly.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Transport failure: DNS, connect, TLS, timeout.
    #[error("network error: {0}")]
    Network(String),

    /// Credentials rejected or missing.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The exchange understood the request and refused it.
    #[error("exchange error: {0}")]
    Exchange(String),

    /// Anything else, including undecodable responses.
    #[error("{0}")]
    Unknown(String),
}

impl GatewayError {
    /// Error returned by calls made before [`crate::Broker::connect`].
    pub fn not_connected() -> Self {
        GatewayError::Network("not connected".into())
    }

    /// Short label for the error kind, used in logs and banners.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::Network(_) => "network",
            GatewayError::Auth(_) => "auth",
            GatewayError::Exchange(_) => "exchange",
            GatewayError::Unknown(_) => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_kind() {
        let err = GatewayError::Exchange("order not found".into());
        assert_eq!(err.to_string(), "exchange error: order not found");
        assert_eq!(err.kind(), "exchange");
        assert_eq!(GatewayError::not_connected().kind(), "network");
    }
}
