use std::cmp::Ordering;

use gblock_common::address::RawTarget;
use gblock_common::GblockError;
use gblock_db_entities::GlobalBlock;
use ipnet::IpNet;

/// What a stored record targets, derived from its address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    User,
    Address,
    Range(IpNet),
}

impl BlockKind {
    pub fn of(record: &GlobalBlock::Model) -> Result<Self, GblockError> {
        match RawTarget::parse(&record.address) {
            RawTarget::Ip(_) => Ok(Self::Address),
            RawTarget::Range(net) => Ok(Self::Range(net)),
            RawTarget::Name(_) if record.target_central_id.is_some_and(|id| id > 0) => {
                Ok(Self::User)
            }
            RawTarget::Name(_) => Err(GblockError::CorruptBlockRecord {
                id: record.id,
                address: record.address.clone(),
            }),
        }
    }

    pub fn specificity(&self) -> Specificity {
        match self {
            Self::User => Specificity::USER,
            Self::Address => Specificity::ADDRESS,
            Self::Range(net) => Specificity::range(net.prefix_len(), net.max_prefix_len()),
        }
    }
}

/// Score `base + varying_bits / width`, lower is more specific. Ordering is
/// exact (cross-multiplied integers); [`Specificity::score`] is for display.
#[derive(Clone, Copy, Debug)]
pub struct Specificity {
    base: u64,
    varying_bits: u64,
    width: u64,
}

impl Specificity {
    pub const USER: Self = Self {
        base: 1,
        varying_bits: 0,
        width: 1,
    };

    pub const ADDRESS: Self = Self {
        base: 2,
        varying_bits: 0,
        width: 1,
    };

    pub fn range(prefix_len: u8, max_prefix_len: u8) -> Self {
        Self {
            base: 2,
            varying_bits: u64::from(max_prefix_len.saturating_sub(prefix_len)),
            width: u64::from(max_prefix_len.max(1)),
        }
    }

    pub fn score(&self) -> f64 {
        self.base as f64 + self.varying_bits as f64 / self.width as f64
    }

    fn numerator(&self) -> u64 {
        self.base * self.width + self.varying_bits
    }
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.numerator() * other.width).cmp(&(other.numerator() * self.width))
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Specificity {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Specificity {}
