//! Cluster metadata: partition descriptors, the commands that mutate them, and the in-memory
//! store that the apply loop maintains.
mod assignment;
mod command;
mod partition;
mod store;

pub use command::CommandKind;
pub use command::DecodeError;
pub use command::RaftCommand;
pub use partition::is_valid_topic_name;
pub use partition::BrokerId;
pub use partition::Partition;
pub use partition::PartitionId;
pub use partition::TopicPartition;

pub(crate) use assignment::assign_replicas;
pub(crate) use assignment::AssignmentError;
pub(crate) use store::PartitionStore;
pub(crate) use store::Upsert;
