use std::fmt;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

const INFINITE_ALIASES: &[&str] = &["infinite", "indefinite", "infinity", "never"];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpiryError {
    #[error("{0:?} is not a valid expiry time")]
    Unparseable(String),
    #[error("expiry time {0:?} is in the past")]
    InPast(String),
}

/// When a block stops applying. Stored as a nullable timestamp column where
/// NULL means the block never expires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expiry {
    Infinite,
    At(DateTime<Utc>),
}

impl Expiry {
    /// Accepts the infinite aliases, an RFC 3339 timestamp or a relative
    /// duration such as `3 days` or `1h 30m`.
    pub fn parse(input: &str, now: DateTime<Utc>) -> Result<Self, ExpiryError> {
        let input = input.trim();
        if INFINITE_ALIASES
            .iter()
            .any(|alias| alias.eq_ignore_ascii_case(input))
        {
            return Ok(Self::Infinite);
        }

        let at = if let Ok(at) = DateTime::parse_from_rfc3339(input) {
            at.with_timezone(&Utc)
        } else {
            let duration = humantime::parse_duration(input)
                .map_err(|_| ExpiryError::Unparseable(input.to_owned()))?;
            let duration = chrono::Duration::from_std(duration)
                .map_err(|_| ExpiryError::Unparseable(input.to_owned()))?;
            now.checked_add_signed(duration)
                .ok_or_else(|| ExpiryError::Unparseable(input.to_owned()))?
        };

        let at = at.trunc_subsecs(0);
        if at <= now {
            return Err(ExpiryError::InPast(input.to_owned()));
        }
        Ok(Self::At(at))
    }

    pub fn from_column(value: Option<DateTime<Utc>>) -> Self {
        value.map(Self::At).unwrap_or(Self::Infinite)
    }

    pub fn to_column(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Infinite => None,
            Self::At(at) => Some(at),
        }
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Infinite => true,
            Self::At(at) => *at > now,
        }
    }
}

impl fmt::Display for Expiry {
    /// Canonical wire form: `infinite` or an RFC 3339 UTC timestamp.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Infinite => write!(f, "infinite"),
            Self::At(at) => write!(f, "{}", at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}
