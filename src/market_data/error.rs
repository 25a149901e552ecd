use thiserror::Error;

/// Failures raised while talking to the upstream market-data provider.
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// Network failure, timeout or non-2xx status from upstream.
    #[error("upstream unavailable (status {status:?}): {reason}")]
    UpstreamUnavailable { status: Option<u16>, reason: String },

    /// Upstream answered 2xx but the body did not have the expected shape.
    #[error("malformed upstream response for {entity}: {reason}")]
    MalformedUpstreamResponse { entity: String, reason: String },

    /// The HTTP client could not be built from its settings.
    #[error("market data client setup failed: {0}")]
    Setup(String),
}

impl MarketDataError {
    pub fn unavailable(status: Option<u16>, reason: impl Into<String>) -> Self {
        Self::UpstreamUnavailable { status, reason: reason.into() }
    }

    pub fn malformed(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedUpstreamResponse { entity: entity.into(), reason: reason.into() }
    }

    /// Upstream explicitly reported the requested entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { status: Some(404), .. })
    }
}
