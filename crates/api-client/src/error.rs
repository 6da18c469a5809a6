use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request to the market data provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("The market data provider returned an error for {symbol}: {message}")]
    Provider { symbol: String, message: String },

    #[error("The market data provider is rate limiting requests; try again later")]
    RateLimited,

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),
}

impl ApiError {
    /// True when the underlying HTTP client gave up waiting for the provider.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Http(e) if e.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn client_timeouts_are_reported_as_timeouts() {
        // Connections queue on the listener but are never answered.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let err = client.get(format!("http://{addr}/")).send().await.unwrap_err();
        drop(listener);

        assert!(ApiError::Http(err).is_timeout());
    }

    #[test]
    fn other_failures_are_not_timeouts() {
        assert!(!ApiError::RateLimited.is_timeout());
        assert!(!ApiError::Provider {
            symbol: "AAPL".to_string(),
            message: "Not Found".to_string(),
        }
        .is_timeout());
    }
}
