use crate::cluster::{ConsensusError, MembershipError};
use crate::metadata::AssignmentError;
use crate::protocol::ErrorCode;
use crate::replicator::ReplicaError;
use std::error::Error;

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("invalid broker configuration: {0}")]
    Config(String),
    #[error("membership provider failed")]
    Membership(#[source] MembershipError),
    #[error("consensus provider failed")]
    Consensus(#[source] ConsensusError),
    #[error("this broker is not the controller")]
    NotController,
    #[error("unknown topic or partition")]
    UnknownTopicOrPartition,
    #[error("replication factor {requested} is more than the {available} known brokers")]
    InvalidReplicationFactor { requested: i16, available: usize },
    #[error("invalid number of partitions: {0}")]
    InvalidPartitions(i32),
    #[error("invalid topic name '{0}'")]
    InvalidTopic(String),
    #[error("topic '{0}' already exists")]
    TopicAlreadyExists(String),
    #[error("this broker is not the leader for the partition")]
    NotLeaderForPartition,
    #[error("offset is past the log end offset {log_end_offset}")]
    OffsetOutOfRange { log_end_offset: u64 },
    #[error("unknown server error: {0}")]
    Unknown(#[source] Box<dyn Error + Send + Sync>),
}

impl BrokerError {
    pub(crate) fn unknown(cause: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        BrokerError::Unknown(cause.into())
    }

    /// The protocol error code reported to clients for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            BrokerError::NotController => ErrorCode::NotController,
            BrokerError::UnknownTopicOrPartition => ErrorCode::UnknownTopicOrPartition,
            BrokerError::InvalidReplicationFactor { .. } => ErrorCode::InvalidReplicationFactor,
            BrokerError::InvalidPartitions(_) => ErrorCode::InvalidPartitions,
            BrokerError::InvalidTopic(_) => ErrorCode::InvalidTopic,
            BrokerError::TopicAlreadyExists(_) => ErrorCode::TopicAlreadyExists,
            BrokerError::NotLeaderForPartition => ErrorCode::NotLeaderForPartition,
            BrokerError::OffsetOutOfRange { .. } => ErrorCode::OffsetOutOfRange,
            BrokerError::Config(_)
            | BrokerError::Membership(_)
            | BrokerError::Consensus(_)
            | BrokerError::Unknown(_) => ErrorCode::Unknown,
        }
    }
}

impl From<AssignmentError> for BrokerError {
    fn from(e: AssignmentError) -> Self {
        match e {
            AssignmentError::InvalidPartitions(count) => BrokerError::InvalidPartitions(count),
            AssignmentError::InvalidReplicationFactor { requested, available } => {
                BrokerError::InvalidReplicationFactor { requested, available }
            }
        }
    }
}

impl From<ReplicaError> for BrokerError {
    fn from(e: ReplicaError) -> Self {
        match e {
            ReplicaError::NotLeader => BrokerError::NotLeaderForPartition,
            ReplicaError::OffsetOutOfRange { log_end, .. } => BrokerError::OffsetOutOfRange {
                log_end_offset: log_end.as_u64(),
            },
            ReplicaError::Io(e) => BrokerError::unknown(e),
        }
    }
}
