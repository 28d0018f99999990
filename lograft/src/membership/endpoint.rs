use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Network address that identifies a member of the cluster.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl ToString, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid endpoint '{invalid}': {reason}")]
pub struct EndpointParseError {
    pub invalid: String,
    pub reason: String,
}

impl FromStr for Endpoint {
    type Err = EndpointParseError;

    /// Parse `host:port`. The last colon separates the port, so bracket-less IPv6 hosts are not
    /// supported.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s.rsplit_once(':').ok_or_else(|| EndpointParseError {
            invalid: s.to_string(),
            reason: "expect <host>:<port>".to_string(),
        })?;

        if host.is_empty() {
            return Err(EndpointParseError {
                invalid: s.to_string(),
                reason: "empty host".to_string(),
            });
        }

        let port = port.parse::<u16>().map_err(|e| EndpointParseError {
            invalid: s.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Endpoint::new(host, port))
    }
}
