mod broker;
mod cluster;
mod commitlog;
mod logging;
mod metadata;
mod protocol;
mod replicator;
mod server;
#[cfg(test)]
mod test_utils;
mod grpc {
    include!("../generated/replication.rs");
}

pub use broker::Broker;
pub use broker::BrokerConfig;
pub use broker::BrokerError;
pub use broker::BrokerOptions;
pub use cluster::ClusterMember;
pub use cluster::CommandSink;
pub use cluster::CommandStream;
pub use cluster::Consensus;
pub use cluster::ConsensusError;
pub use cluster::InProcessRaft;
pub use cluster::InProcessRaftGroup;
pub use cluster::MemberChangeSink;
pub use cluster::MemberChangeSource;
pub use cluster::MemberStatus;
pub use cluster::Membership;
pub use cluster::MembershipError;
pub use cluster::StaticMembership;
pub use commitlog::FileLog;
pub use commitlog::FileLogFactory;
pub use commitlog::InMemoryLog;
pub use commitlog::InMemoryLogFactory;
pub use commitlog::Log;
pub use commitlog::LogFactory;
pub use commitlog::Offset;
pub use commitlog::Record;
pub use logging::discard_logger;
pub use logging::stdout_logger;
pub use metadata::is_valid_topic_name;
pub use metadata::BrokerId;
pub use metadata::CommandKind;
pub use metadata::DecodeError;
pub use metadata::Partition;
pub use metadata::PartitionId;
pub use metadata::RaftCommand;
pub use metadata::TopicPartition;
pub use protocol::ApiVersion;
pub use protocol::BrokerMetadata;
pub use protocol::CreateTopicRequest;
pub use protocol::ErrorCode;
pub use protocol::FetchRequest;
pub use protocol::FetchResponse;
pub use protocol::MetadataRequest;
pub use protocol::MetadataResponse;
pub use protocol::PartitionMetadata;
pub use protocol::ProduceRequest;
pub use protocol::ProduceResponse;
pub use protocol::Request;
pub use protocol::RequestBody;
pub use protocol::Response;
pub use protocol::ResponseBody;
pub use protocol::TopicError;
pub use protocol::TopicMetadata;
pub use replicator::FetchBatch;
pub use replicator::FetchError;
pub use replicator::FetcherConnector;
pub use replicator::PartitionFetcher;
pub use replicator::ReplicaError;
pub use replicator::ReplicaRole;
pub use replicator::ReplicaStatus;
pub use server::GrpcConnector;

// `crate::{root_mod}` should not have any code. Just `mod` and `pub use` statements.
// No `mod` statement is `pub`; types are exported individually from here.
