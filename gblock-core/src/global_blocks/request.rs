use gblock_common::address::{AddressError, BlockTarget};
use gblock_common::expiry::{Expiry, ExpiryError};
use gblock_common::{BlockId, CentralId, GblockError};

/// Who is placing or removing a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Performer {
    pub name: String,
    pub central_id: Option<CentralId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaceBlock {
    pub target: String,
    pub expiry: String,
    pub reason: String,
    pub anon_only: bool,
    pub modify: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedBlock {
    pub id: BlockId,
    pub target: BlockTarget,
    pub expiry: Expiry,
    pub anon_only: bool,
    /// An existing record was updated rather than a new one inserted
    pub modified: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovedBlock {
    pub id: BlockId,
    pub target: BlockTarget,
}

/// A block or unblock request as received from the API.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlobalBlockRequest {
    pub target: String,
    pub expiry: Option<String>,
    pub unblock: bool,
    pub reason: String,
    pub anon_only: bool,
    pub modify: bool,
    pub also_local_block: bool,
    pub local_block_talk_edit: bool,
    pub local_anon_only: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GlobalBlockOutcome {
    Blocked {
        /// Echo of the requested target
        target: String,
        anon_only: bool,
        expiry: Expiry,
        blocked_locally: bool,
    },
    Unblocked {
        target: String,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum RequestError {
    #[error("{0:?} is not a valid IP address, range or user name")]
    InvalidTarget(String),
    #[error("range {range} is too broad, the narrowest allowed prefix is /{limit}")]
    RangeTooBroad { range: String, limit: u8 },
    #[error("{0} is already globally blocked")]
    AlreadyBlocked(String),
    #[error("{0} is not globally blocked")]
    NotBlocked(String),
    #[error(transparent)]
    InvalidExpiry(#[from] ExpiryError),
    #[error("the block on {0} could not be saved because it was changed concurrently")]
    RaceConditionFailure(String),
    #[error("{0}")]
    InvalidParameters(&'static str),
    #[error(transparent)]
    Internal(#[from] GblockError),
}

impl RequestError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidTarget(_) => "invalid_target",
            Self::RangeTooBroad { .. } => "range_too_broad",
            Self::AlreadyBlocked(_) => "already_blocked",
            Self::NotBlocked(_) => "not_blocked",
            Self::InvalidExpiry(_) => "invalid_expiry",
            Self::RaceConditionFailure(_) => "block_failure",
            Self::InvalidParameters(_) => "invalid_parameters",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<AddressError> for RequestError {
    fn from(error: AddressError) -> Self {
        match error {
            AddressError::Invalid(target) => Self::InvalidTarget(target),
            AddressError::RangeTooBroad { range, limit } => Self::RangeTooBroad {
                range: range.to_string(),
                limit,
            },
        }
    }
}

impl From<sea_orm::DbErr> for RequestError {
    fn from(error: sea_orm::DbErr) -> Self {
        Self::Internal(error.into())
    }
}
