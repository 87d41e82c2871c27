use poem_openapi::OpenApi;

pub mod block_status;
mod errors;
pub mod global_blocks;
mod models;
mod pagination;

pub fn get() -> impl OpenApi {
    (global_blocks::Api, block_status::Api)
}
