//! Rate limit key composition.

use crate::error::{Result, RiverdaleError};

/// A key that identifies one throttled subject: a client on an endpoint.
///
/// Serialized as `<client>:<endpoint>` so that the same client hitting two
/// endpoints, or two clients hitting one endpoint, never share a counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    /// The client identifier, usually an IP address
    pub client: String,
    /// The endpoint name
    pub endpoint: String,
}

impl RateLimitKey {
    /// Create a new key, rejecting an empty client or endpoint.
    pub fn new(client: &str, endpoint: &str) -> Result<Self> {
        if client.is_empty() {
            return Err(RiverdaleError::InvalidArgument(
                "rate limit client must not be empty".to_string(),
            ));
        }
        if endpoint.is_empty() {
            return Err(RiverdaleError::InvalidArgument(
                "rate limit endpoint must not be empty".to_string(),
            ));
        }

        Ok(Self {
            client: client.to_string(),
            endpoint: endpoint.to_string(),
        })
    }

    /// The string the counter store is keyed by.
    pub fn to_string_key(&self) -> String {
        format!("{}:{}", self.client, self.endpoint)
    }
}

impl std::fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_key())
    }
}
