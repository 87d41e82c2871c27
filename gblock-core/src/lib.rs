pub mod blocks;
pub mod db;
pub mod global_blocks;
pub mod identity;
pub mod local_blocks;
pub mod resolution;
mod services;
pub mod whitelist;

pub use services::*;

#[cfg(test)]
pub(crate) mod test_helpers;
