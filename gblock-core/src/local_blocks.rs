use async_trait::async_trait;
use gblock_common::address::BlockTarget;
use gblock_common::expiry::Expiry;
use gblock_common::GblockError;
use tracing::info;

/// A block to be mirrored on the local site alongside a global one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalBlock {
    pub target: BlockTarget,
    pub expiry: Expiry,
    pub reason: String,
    pub performer: String,
    /// Also prevent the target from editing their own talk page
    pub block_talk_edit: bool,
    pub anon_only: bool,
    pub modify: bool,
}

/// Where local mirrors of global blocks go. The host site supplies the real
/// implementation.
#[async_trait]
pub trait LocalBlockSink: Send + Sync {
    async fn place_local_block(&self, block: LocalBlock) -> Result<(), GblockError>;
}

/// Records local block requests in the log only.
pub struct LoggingLocalBlockSink;

#[async_trait]
impl LocalBlockSink for LoggingLocalBlockSink {
    async fn place_local_block(&self, block: LocalBlock) -> Result<(), GblockError> {
        info!(
            block_target = %block.target,
            expiry = %block.expiry,
            performer = %block.performer,
            block_talk_edit = block.block_talk_edit,
            anon_only = block.anon_only,
            modify = block.modify,
            "Local block requested"
        );
        Ok(())
    }
}
