use crate::broker::{Broker, BrokerError};
use crate::commitlog::Offset;
use crate::metadata::{BrokerId, Partition, PartitionId, TopicPartition, Upsert};
use crate::protocol::FetchRequest;
use crate::replicator::{shared_log, FetchBatch, ReplicaRole, Replicator, SharedLog};
use bytes::Bytes;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Suffix of a deleted partition's renamed log dir. Never a valid partition dir name, which always
// ends in the partition id.
const DELETED_DIR_SUFFIX: &str = "-delete";

impl Broker {
    /// Records `partition` in the store and takes on whatever role it assigns to this broker.
    ///
    /// A partition that is already known is replaced rather than duplicated. If neither the replica
    /// set nor this broker's role changed (and the replicator is still running) the existing
    /// replicator is kept; otherwise the old one is stopped and its log handed to the new one.
    pub(crate) async fn start_replica(&self, partition: Partition) -> Result<(), BrokerError> {
        let key = partition.key();
        if !key.has_valid_topic() {
            return Err(BrokerError::InvalidTopic(key.topic));
        }
        fs::create_dir_all(key.log_dir(&self.log_dir)).map_err(BrokerError::unknown)?;

        let desired_role = self.desired_role(&partition);
        let previous = {
            let mut state = self.lock_state();
            let same_replicas = match state.store.upsert(partition.clone()) {
                Upsert::Replaced(old) => old.replicas == partition.replicas,
                Upsert::Inserted => false,
            };
            let unchanged = same_replicas
                && state.replicators.get(&key).map_or(false, |existing| {
                    Some(existing.role()) == desired_role && existing.is_running()
                });
            if unchanged {
                return Ok(());
            }
            state.replicators.remove(&key)
        };

        let log = match previous {
            Some(previous) => {
                slog::info!(self.logger, "Replacing {:?} replica of {}", previous.role(), key);
                previous.stop().await;
                Some(previous.log())
            }
            None => None,
        };

        match desired_role {
            Some(ReplicaRole::Leader) => self.become_leader(&partition, log),
            Some(ReplicaRole::Follower { .. }) => self.become_follower(&partition, log),
            // Metadata only.
            None => Ok(()),
        }
    }

    /// Opens the partition's log (unless handed one) and starts leading it.
    pub(crate) fn become_leader(&self, partition: &Partition, log: Option<SharedLog>) -> Result<(), BrokerError> {
        let key = partition.key();
        let log = match log {
            Some(log) => log,
            None => self.open_log(&key)?,
        };

        let replicator = Replicator::leader(self.replica_logger(&key), partition, self.id, log, &self.replica_options);
        self.lock_state().replicators.insert(key, Arc::new(replicator));
        Ok(())
    }

    /// Opens the partition's log (unless handed one) and starts fetching from the leader.
    pub(crate) fn become_follower(&self, partition: &Partition, log: Option<SharedLog>) -> Result<(), BrokerError> {
        let key = partition.key();
        let leader = self.membership.member(partition.leader).ok_or_else(|| {
            BrokerError::unknown(format!(
                "Leader {} of {} is not a known cluster member",
                partition.leader, key
            ))
        })?;
        let log = match log {
            Some(log) => log,
            None => self.open_log(&key)?,
        };

        let fetcher = self.fetcher_connector.connect(&leader);
        let replicator = Replicator::follower(
            self.replica_logger(&key),
            partition,
            self.id,
            log,
            fetcher,
            &self.replica_options,
        );
        self.lock_state().replicators.insert(key, Arc::new(replicator));
        Ok(())
    }

    /// Drops the partition from the store, stops its replicator, and schedules its log directory
    /// for removal.
    ///
    /// The directory is first renamed to a unique tombstone, so a partition recreated before the
    /// deletion delay runs out gets a fresh directory that the delayed removal never touches.
    pub(crate) async fn remove_partition(&self, topic: &str, id: PartitionId) {
        let key = TopicPartition::new(topic, id);
        let replicator = {
            let mut state = self.lock_state();
            if state.store.remove(topic, id).is_none() {
                slog::warn!(self.logger, "Delete for unknown partition {}", key);
            }
            state.replicators.remove(&key)
        };
        if let Some(replicator) = replicator {
            replicator.stop().await;
        }

        if !key.has_valid_topic() {
            slog::warn!(self.logger, "Not removing log dir of invalid topic '{}'", key.topic);
            return;
        }
        let tombstone = match tombstone_log_dir(&self.log_dir, &key) {
            Ok(Some(tombstone)) => tombstone,
            Ok(None) => return,
            Err(e) => {
                slog::warn!(self.logger, "Failed to mark log dir of {} for deletion: {:?}", key, e);
                return;
            }
        };

        let delay = self.options.log_deletion_delay;
        let logger = self.logger.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match tokio::fs::remove_dir_all(&tombstone).await {
                Ok(()) => slog::info!(logger, "Removed log dir {:?}", tombstone),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => slog::warn!(logger, "Failed to remove log dir {:?}: {:?}", tombstone, e),
            }
        });
    }

    /// Appends `records` on the local leader replica, returning the offset of the first one.
    pub fn produce(&self, topic: &str, id: PartitionId, records: Vec<Bytes>) -> Result<Offset, BrokerError> {
        let replicator = self.local_replicator(topic, id)?;
        let base_offset = replicator.append(records)?;
        Ok(base_offset)
    }

    /// Reads from the local leader replica. Follower fetches also report replication progress.
    pub fn fetch_records(&self, request: &FetchRequest) -> Result<FetchBatch, BrokerError> {
        let replicator = self.local_replicator(&request.topic, request.partition)?;
        let replica = if request.is_from_follower() {
            Some(BrokerId(request.replica_id))
        } else {
            None
        };

        let batch = replicator.read(Offset(request.offset), request.max_records as usize, replica)?;
        Ok(batch)
    }

    fn local_replicator(&self, topic: &str, id: PartitionId) -> Result<Arc<Replicator>, BrokerError> {
        let state = self.lock_state();
        if state.store.partition(topic, id).is_none() {
            return Err(BrokerError::UnknownTopicOrPartition);
        }
        state
            .replicators
            .get(&TopicPartition::new(topic, id))
            .cloned()
            .ok_or(BrokerError::NotLeaderForPartition)
    }

    fn desired_role(&self, partition: &Partition) -> Option<ReplicaRole> {
        if partition.is_leader(self.id) {
            Some(ReplicaRole::Leader)
        } else if partition.is_replica(self.id) {
            Some(ReplicaRole::Follower {
                leader: partition.leader,
            })
        } else {
            None
        }
    }

    fn open_log(&self, key: &TopicPartition) -> Result<SharedLog, BrokerError> {
        let log = self
            .log_factory
            .open(&key.log_dir(&self.log_dir))
            .map_err(BrokerError::unknown)?;
        Ok(shared_log(log))
    }

    fn replica_logger(&self, key: &TopicPartition) -> slog::Logger {
        self.logger
            .new(slog::o!("topic" => key.topic.clone(), "partition" => key.partition))
    }
}

/// Renames the partition's log dir to `<topic>-<id>.<nonce>-delete`. Returns `None` if there is
/// no directory to delete.
fn tombstone_log_dir(log_root: &Path, key: &TopicPartition) -> io::Result<Option<PathBuf>> {
    let dir = key.log_dir(log_root);
    let tombstone = log_root.join(format!(
        "{}.{:016x}{}",
        key.dir_name(),
        rand::random::<u64>(),
        DELETED_DIR_SUFFIX
    ));
    match fs::rename(&dir, &tombstone) {
        Ok(()) => Ok(Some(tombstone)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
