use crate::cluster::ClusterMember;
use crate::commitlog::{Offset, Record};
use crate::protocol::FetchRequest;
use std::sync::Arc;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FetchBatch {
    pub records: Vec<Record>,
    /// The leader's high watermark at the time of the read.
    pub high_watermark: Offset,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transient fetch failure: {0}")]
    Transient(String),
    #[error("remote broker is not the leader for this partition")]
    NotLeader,
    #[error("remote broker doesn't know this partition")]
    UnknownPartition,
    #[error("fetch offset is past the leader's log end offset {log_end_offset}")]
    OffsetOutOfRange { log_end_offset: u64 },
}

/// PartitionFetcher reads records from a partition's leader on behalf of a follower.
#[async_trait::async_trait]
pub trait PartitionFetcher: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchBatch, FetchError>;
}

/// FetcherConnector hands out a fetcher for a given leader. Connecting is lazy; connection
/// failures surface as transient fetch errors.
pub trait FetcherConnector: Send + Sync {
    fn connect(&self, leader: &ClusterMember) -> Arc<dyn PartitionFetcher>;
}
