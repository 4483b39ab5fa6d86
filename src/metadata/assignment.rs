use crate::metadata::{BrokerId, Partition, PartitionId};

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum AssignmentError {
    #[error("number of partitions must be positive, got {0}")]
    InvalidPartitions(i32),
    #[error("replication factor {requested} is not satisfiable with {available} known brokers")]
    InvalidReplicationFactor { requested: i16, available: usize },
}

/// Assigns replicas for a new topic by walking `members` round-robin.
///
/// Partition `p` starts its walk at `(start_offset + p) % members.len()`, so consecutive
/// partitions lead on different brokers. The first replica of each walk is the leader and the
/// initial ISR is the full replica set. The result only depends on the order of `members` and on
/// `start_offset`; callers that want a stable layout must pass members in a stable order.
pub(crate) fn assign_replicas(
    topic: &str,
    num_partitions: i32,
    replication_factor: i16,
    members: &[BrokerId],
    start_offset: usize,
) -> Result<Vec<Partition>, AssignmentError> {
    if num_partitions <= 0 {
        return Err(AssignmentError::InvalidPartitions(num_partitions));
    }
    if replication_factor <= 0 || replication_factor as usize > members.len() {
        return Err(AssignmentError::InvalidReplicationFactor {
            requested: replication_factor,
            available: members.len(),
        });
    }

    let num_members = members.len();
    let partitions = (0..num_partitions)
        .map(|id: PartitionId| {
            let first = (start_offset + id as usize) % num_members;
            let replicas: Vec<BrokerId> = (0..replication_factor as usize)
                .map(|step| members[(first + step) % num_members])
                .collect();

            Partition {
                topic: topic.to_string(),
                id,
                leader: replicas[0],
                isr: replicas.clone(),
                replicas,
            }
        })
        .collect();

    Ok(partitions)
}
