use gblock_core::global_blocks::BlockListPage;
use poem_openapi::types::{ParseFromJSON, ToJSON};
use poem_openapi::Object;

#[derive(Object)]
pub struct PaginatedResponse<T: ParseFromJSON + ToJSON + Send + Sync> {
    items: Vec<T>,
    offset: u64,
    total: u64,
}

impl<T: ParseFromJSON + ToJSON + Send + Sync> PaginatedResponse<T> {
    pub fn from_page<P>(page: BlockListPage, postprocess: P) -> Self
    where
        P: FnMut(gblock_core::global_blocks::ListedBlock) -> T,
    {
        PaginatedResponse {
            items: page.items.into_iter().map(postprocess).collect(),
            offset: page.offset,
            total: page.total,
        }
    }
}
