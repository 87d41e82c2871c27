//! Placing, removing and listing global blocks on behalf of an operator.

mod listing;
mod request;
mod service;

pub use listing::{BlockListPage, BlockListQuery, HiddenBlockKind, ListedBlock};
pub use request::{
    GlobalBlockOutcome, GlobalBlockRequest, Performer, PlaceBlock, PlacedBlock, RemovedBlock,
    RequestError,
};
pub use service::GlobalBlockService;
