use crate::metadata::{Partition, PartitionId};
use std::collections::HashMap;

/// PartitionStore maps topic name to its partitions. It is derived entirely from committed
/// commands; callers are responsible for synchronization.
#[derive(Clone, Debug, Default)]
pub(crate) struct PartitionStore {
    topics: HashMap<String, Vec<Partition>>,
}

/// Outcome of `PartitionStore::upsert`.
#[derive(Debug, Eq, PartialEq)]
pub(crate) enum Upsert {
    Inserted,
    Replaced(Partition),
}

impl PartitionStore {
    pub(crate) fn new() -> Self {
        PartitionStore::default()
    }

    pub(crate) fn topics(&self) -> &HashMap<String, Vec<Partition>> {
        &self.topics
    }

    pub(crate) fn contains_topic(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    pub(crate) fn topic_partitions(&self, topic: &str) -> Option<&[Partition]> {
        self.topics.get(topic).map(Vec::as_slice)
    }

    pub(crate) fn partition(&self, topic: &str, id: PartitionId) -> Option<&Partition> {
        self.topics.get(topic)?.iter().find(|p| p.id == id)
    }

    /// Adds the partition to its topic, creating the topic entry if needed. A partition with the
    /// same (topic, id) is replaced in place rather than duplicated.
    pub(crate) fn upsert(&mut self, partition: Partition) -> Upsert {
        let partitions = self.topics.entry(partition.topic.clone()).or_default();
        match partitions.iter_mut().find(|p| p.id == partition.id) {
            Some(existing) => Upsert::Replaced(std::mem::replace(existing, partition)),
            None => {
                partitions.push(partition);
                Upsert::Inserted
            }
        }
    }

    /// Removes one partition. The topic entry goes away with its last partition.
    pub(crate) fn remove(&mut self, topic: &str, id: PartitionId) -> Option<Partition> {
        let partitions = self.topics.get_mut(topic)?;
        let position = partitions.iter().position(|p| p.id == id)?;
        let removed = partitions.remove(position);
        if partitions.is_empty() {
            self.topics.remove(topic);
        }

        Some(removed)
    }

    #[cfg(test)]
    pub(crate) fn with_topics(topics: HashMap<String, Vec<Partition>>) -> Self {
        PartitionStore { topics }
    }
}
