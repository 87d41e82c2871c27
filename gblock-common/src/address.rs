//! Target classification and the fixed-width address encoding used by the
//! block store.
//!
//! Every IP-shaped target is stored as a pair of inclusive bounds encoded as
//! uppercase hex of equal width per address family, so that "range contains
//! address" is a plain `start <= x AND end >= x` string comparison in SQL.
//! IPv6 encodings carry a `v6-` prefix which also keeps the two families from
//! ever comparing as overlapping.

use std::fmt;
use std::net::IpAddr;

use ipnet::IpNet;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::CentralId;

const MAX_USERNAME_LENGTH: usize = 85;
const INVALID_USERNAME_CHARS: &[char] = &['#', '<', '>', '[', ']', '|', '{', '}', '/', '@', ':'];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("{0:?} is not a valid IP address, range or user name")]
    Invalid(String),
    #[error("range {range} is too broad, the narrowest allowed prefix is /{limit}")]
    RangeTooBroad { range: IpNet, limit: u8 },
}

/// A target string classified by syntax alone, before any identity lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawTarget {
    Ip(IpAddr),
    Range(IpNet),
    Name(String),
}

impl RawTarget {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if let Ok(ip) = input.parse::<IpAddr>() {
            return Self::Ip(ip);
        }
        if let Ok(net) = input.parse::<IpNet>() {
            return Self::Range(net);
        }
        Self::Name(input.to_owned())
    }

    /// Bounds for lookups where a bare address and a range are both
    /// acceptable. Names have none.
    pub fn bounds(&self) -> Option<RangeBounds> {
        match self {
            Self::Ip(ip) => Some(RangeBounds::of_ip(*ip)),
            Self::Range(net) => Some(RangeBounds::of_range(&net.trunc())),
            Self::Name(_) => None,
        }
    }
}

/// A validated block target, resolved once at the request boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockTarget {
    Ip(IpAddr),
    Range(IpNet),
    User { name: String, central_id: CentralId },
}

impl BlockTarget {
    /// The normalized text stored in the `address` column.
    pub fn address(&self) -> String {
        match self {
            Self::Ip(ip) => ip.to_string(),
            Self::Range(net) => net.to_string(),
            Self::User { name, .. } => name.clone(),
        }
    }

    pub fn bounds(&self) -> Option<RangeBounds> {
        match self {
            Self::Ip(ip) => Some(RangeBounds::of_ip(*ip)),
            Self::Range(net) => Some(RangeBounds::of_range(net)),
            Self::User { .. } => None,
        }
    }

    pub fn central_id(&self) -> Option<CentralId> {
        match self {
            Self::User { central_id, .. } => Some(*central_id),
            _ => None,
        }
    }
}

impl fmt::Display for BlockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(ip) => write!(f, "{ip}"),
            Self::Range(net) => write!(f, "{net}"),
            Self::User { name, .. } => write!(f, "User:{name}"),
        }
    }
}

/// Inclusive encoded bounds of an IP-shaped target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeBounds {
    pub start: String,
    pub end: String,
}

impl RangeBounds {
    pub fn of_ip(ip: IpAddr) -> Self {
        let encoded = encode_address(ip);
        Self {
            start: encoded.clone(),
            end: encoded,
        }
    }

    pub fn of_range(net: &IpNet) -> Self {
        Self {
            start: encode_address(net.network()),
            end: encode_address(net.broadcast()),
        }
    }

    pub fn contains(&self, encoded: &str) -> bool {
        self.start.as_str() <= encoded && encoded <= self.end.as_str()
    }

    pub fn is_single_address(&self) -> bool {
        self.start == self.end
    }
}

pub fn encode_address(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => format!("{:08X}", u32::from(v4)),
        IpAddr::V6(v6) => format!("v6-{:032X}", u128::from(v6)),
    }
}

/// Narrowest prefix length a range block may have, per address family.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub struct CidrLimit {
    #[serde(default = "CidrLimit::default_ipv4")]
    pub ipv4: u8,
    #[serde(default = "CidrLimit::default_ipv6")]
    pub ipv6: u8,
}

impl CidrLimit {
    const fn default_ipv4() -> u8 {
        16
    }

    const fn default_ipv6() -> u8 {
        19
    }

    pub fn limit_for(&self, net: &IpNet) -> u8 {
        match net {
            IpNet::V4(_) => self.ipv4,
            IpNet::V6(_) => self.ipv6,
        }
    }

    /// Rejects ranges broader than the limit and truncates host bits.
    pub fn check(&self, net: &IpNet) -> Result<IpNet, AddressError> {
        let limit = self.limit_for(net);
        if net.prefix_len() < limit {
            return Err(AddressError::RangeTooBroad {
                range: *net,
                limit,
            });
        }
        Ok(net.trunc())
    }
}

impl Default for CidrLimit {
    fn default() -> Self {
        Self {
            ipv4: Self::default_ipv4(),
            ipv6: Self::default_ipv6(),
        }
    }
}

/// Normalizes a user name the way the shared identity system stores it, or
/// returns `None` if the text can never be a user name.
pub fn canonical_username(input: &str) -> Option<String> {
    let collapsed = input
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if collapsed.is_empty() || collapsed.chars().count() > MAX_USERNAME_LENGTH {
        return None;
    }
    if collapsed.contains(INVALID_USERNAME_CHARS) {
        return None;
    }
    if collapsed.parse::<IpAddr>().is_ok() {
        return None;
    }

    let mut chars = collapsed.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}
