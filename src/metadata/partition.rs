use crate::grpc::ProtoPartition;
use std::fmt;
use std::path::{Path, PathBuf};

/// BrokerId is the cluster-wide unique id of one broker process.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct BrokerId(pub i32);

impl BrokerId {
    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for BrokerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type PartitionId = i32;

/// Longest topic name accepted, in bytes. Leaves room for the partition suffix and a deletion
/// marker within common file name limits.
pub const MAX_TOPIC_NAME_LEN: usize = 249;

/// A topic name is safe to use as a directory name: non-empty, at most `MAX_TOPIC_NAME_LEN`
/// bytes of `[A-Za-z0-9._-]`, and neither `.` nor `..`.
pub fn is_valid_topic_name(topic: &str) -> bool {
    !topic.is_empty()
        && topic.len() <= MAX_TOPIC_NAME_LEN
        && topic != "."
        && topic != ".."
        && topic
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-')
}

/// TopicPartition is the immutable identity of a partition.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: PartitionId,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: PartitionId) -> Self {
        TopicPartition {
            topic: topic.into(),
            partition,
        }
    }

    /// Name of this partition's log directory under the broker's log root.
    pub fn dir_name(&self) -> String {
        format!("{}-{}", self.topic, self.partition)
    }

    pub fn log_dir(&self, log_root: &Path) -> PathBuf {
        log_root.join(self.dir_name())
    }

    pub fn has_valid_topic(&self) -> bool {
        is_valid_topic_name(&self.topic)
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.topic, self.partition)
    }
}

/// Partition describes one shard of a topic. Only `leader`, `replicas` and `isr` may change after
/// the partition is created, and only through committed commands.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Partition {
    pub topic: String,
    pub id: PartitionId,
    pub leader: BrokerId,
    pub replicas: Vec<BrokerId>,
    pub isr: Vec<BrokerId>,
}

impl Partition {
    pub fn key(&self) -> TopicPartition {
        TopicPartition::new(self.topic.clone(), self.id)
    }

    pub fn is_leader(&self, broker: BrokerId) -> bool {
        self.leader == broker
    }

    pub fn is_replica(&self, broker: BrokerId) -> bool {
        self.replicas.contains(&broker)
    }
}

// ------- Conversions --------

impl From<&Partition> for ProtoPartition {
    fn from(partition: &Partition) -> Self {
        ProtoPartition {
            topic: partition.topic.clone(),
            id: partition.id,
            leader: partition.leader.as_i32(),
            replicas: partition.replicas.iter().map(BrokerId::as_i32).collect(),
            isr: partition.isr.iter().map(BrokerId::as_i32).collect(),
        }
    }
}

impl From<ProtoPartition> for Partition {
    fn from(proto: ProtoPartition) -> Self {
        Partition {
            topic: proto.topic,
            id: proto.id,
            leader: BrokerId(proto.leader),
            replicas: proto.replicas.into_iter().map(BrokerId).collect(),
            isr: proto.isr.into_iter().map(BrokerId).collect(),
        }
    }
}
