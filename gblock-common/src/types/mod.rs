mod listen_endpoint;
mod secret;

pub use listen_endpoint::ListenEndpoint;
pub use secret::Secret;

/// Identity of an account in the shared identity system.
pub type CentralId = i32;

/// Store-assigned identity of a global block record.
pub type BlockId = i32;
