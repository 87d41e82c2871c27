use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::ops::Deref;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A TCP address to listen on. Config files may use any `host:port` text that
/// resolves, the first resolved address is kept.
#[derive(Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct ListenEndpoint(pub SocketAddr);

impl FromStr for ListenEndpoint {
    type Err = std::io::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.to_socket_addrs()?.next().map(Self).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{value} did not resolve to any address"),
            )
        })
    }
}

impl TryFrom<String> for ListenEndpoint {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .parse()
            .map_err(|e| format!("failed to resolve {value} into a TCP endpoint: {e}"))
    }
}

impl From<ListenEndpoint> for String {
    fn from(endpoint: ListenEndpoint) -> Self {
        endpoint.0.to_string()
    }
}

impl Deref for ListenEndpoint {
    type Target = SocketAddr;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for ListenEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ListenEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
