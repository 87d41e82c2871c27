use poem::error::ResponseError;

use crate::BlockId;

#[derive(thiserror::Error, Debug)]
pub enum GblockError {
    #[error("database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),
    #[error("block #{id} has an IP-shaped target that is neither an address nor a range: {address:?}")]
    CorruptBlockRecord { id: BlockId, address: String },
    #[error("Inconsistent state error")]
    InconsistentState,
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl ResponseError for GblockError {
    fn status(&self) -> poem::http::StatusCode {
        poem::http::StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl poem_openapi::ApiResponse for GblockError {
    fn meta() -> poem_openapi::registry::MetaResponses {
        poem_openapi::registry::MetaResponses {
            responses: Vec::new(),
        }
    }

    fn register(_registry: &mut poem_openapi::registry::Registry) {}
}
