use crate::commitlog::{Log, Offset, Record};
use crate::metadata::{BrokerId, Partition};
use crate::replicator::fetcher::{FetchBatch, PartitionFetcher};
use crate::replicator::follower::{FollowerExit, FollowerTask};
use crate::replicator::leader::LeaderState;
use crate::replicator::stop_signal::{self, Stopper};
use crate::replicator::time::RealClock;
use bytes::Bytes;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub(crate) type SharedLog = Arc<Mutex<Box<dyn Log>>>;

pub(crate) fn shared_log(log: Box<dyn Log>) -> SharedLog {
    Arc::new(Mutex::new(log))
}

/// Tunables the broker hands to every replicator it starts.
#[derive(Clone, Debug)]
pub(crate) struct ReplicaOptions {
    pub(crate) fetch_max_records: u32,
    pub(crate) fetch_idle_interval: Duration,
    pub(crate) fetch_backoff_min: Duration,
    pub(crate) fetch_backoff_max: Duration,
    pub(crate) fetch_retry_budget: u32,
    pub(crate) replica_lag_time_max: Duration,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReplicaRole {
    Leader,
    Follower { leader: BrokerId },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReplicaStatus {
    pub role: ReplicaRole,
    pub log_end_offset: Offset,
    pub high_watermark: Offset,
    /// Only known to the leader. Followers report an empty list.
    pub isr: Vec<BrokerId>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReplicaError {
    #[error("this replica is not the partition leader")]
    NotLeader,
    #[error("offset {requested:?} is past the log end offset {log_end:?}")]
    OffsetOutOfRange { requested: Offset, log_end: Offset },
    #[error("log I/O failure")]
    Io(#[from] io::Error),
}

/// Replicator owns one partition's local log, in either the leader or the follower role.
pub(crate) struct Replicator {
    logger: slog::Logger,
    role: ReplicaRole,
    log: SharedLog,
    state: RoleState,
}

enum RoleState {
    Leader(Mutex<LeaderState>),
    Follower {
        high_watermark: Arc<Mutex<Offset>>,
        task: Mutex<Option<FollowerHandle>>,
    },
}

struct FollowerHandle {
    stopper: Stopper,
    join_handle: JoinHandle<FollowerExit>,
}

impl Replicator {
    pub(crate) fn leader(
        logger: slog::Logger,
        partition: &Partition,
        me: BrokerId,
        log: SharedLog,
        options: &ReplicaOptions,
    ) -> Self {
        let logger = logger.new(slog::o!("role" => "leader"));
        let now = Instant::now();
        let mut leader_state = LeaderState::new(me, &partition.replicas, options.replica_lag_time_max, now);
        let log_end = log.lock().expect("Replicator::leader() mutex guard poison").next_offset();
        leader_state.advance_high_watermark(log_end, now);
        slog::info!(logger, "Leading partition with replicas {:?}", partition.replicas);

        Replicator {
            logger,
            role: ReplicaRole::Leader,
            log,
            state: RoleState::Leader(Mutex::new(leader_state)),
        }
    }

    /// Spawns the fetch task on the current runtime.
    pub(crate) fn follower(
        logger: slog::Logger,
        partition: &Partition,
        me: BrokerId,
        log: SharedLog,
        fetcher: Arc<dyn PartitionFetcher>,
        options: &ReplicaOptions,
    ) -> Self {
        let logger = logger.new(slog::o!("role" => "follower", "leader" => partition.leader.as_i32()));
        let high_watermark = Arc::new(Mutex::new(Offset(0)));
        let (stopper, stop_check) = stop_signal::new();

        let task = FollowerTask::new(
            logger.clone(),
            partition.key(),
            me,
            log.clone(),
            high_watermark.clone(),
            fetcher,
            options,
            RealClock,
            stop_check,
        );
        let join_handle = tokio::spawn(task.run());
        slog::info!(logger, "Following partition");

        Replicator {
            logger,
            role: ReplicaRole::Follower {
                leader: partition.leader,
            },
            log,
            state: RoleState::Follower {
                high_watermark,
                task: Mutex::new(Some(FollowerHandle { stopper, join_handle })),
            },
        }
    }

    pub(crate) fn role(&self) -> ReplicaRole {
        self.role
    }

    /// The log outlives the replicator so that a role change can hand it to the next one.
    pub(crate) fn log(&self) -> SharedLog {
        self.log.clone()
    }

    /// False once a follower's fetch task has exited or been stopped.
    pub(crate) fn is_running(&self) -> bool {
        match &self.state {
            RoleState::Leader(_) => true,
            RoleState::Follower { task, .. } => task
                .lock()
                .expect("Replicator.is_running() mutex guard poison")
                .as_ref()
                .map_or(false, |handle| !handle.join_handle.is_finished()),
        }
    }

    /// Appends `values` to the leader's log and returns the offset of the first one.
    pub(crate) fn append(&self, values: Vec<Bytes>) -> Result<Offset, ReplicaError> {
        let leader_state = self.leader_state()?;
        let timestamp_ms = chrono::Utc::now().timestamp_millis();

        let mut log = self.log.lock().expect("Replicator.append() mutex guard poison");
        let base_offset = log.next_offset();
        for value in values {
            log.append(value, timestamp_ms)?;
        }
        let log_end = log.next_offset();
        drop(log);

        leader_state
            .lock()
            .expect("Replicator.append() mutex guard poison")
            .advance_high_watermark(log_end, Instant::now());
        Ok(base_offset)
    }

    /// Reads from the leader's log. A follower fetch (`replica` set) may read up to the log end and
    /// reports that follower's progress; a consumer only sees records below the high watermark.
    pub(crate) fn read(
        &self,
        offset: Offset,
        max_records: usize,
        replica: Option<BrokerId>,
    ) -> Result<FetchBatch, ReplicaError> {
        let leader_state = self.leader_state()?;

        let log = self.log.lock().expect("Replicator.read() mutex guard poison");
        let log_end = log.next_offset();
        if offset > log_end {
            return Err(ReplicaError::OffsetOutOfRange {
                requested: offset,
                log_end,
            });
        }
        let mut records = log.read(offset, max_records)?;
        drop(log);

        let mut leader_state = leader_state.lock().expect("Replicator.read() mutex guard poison");
        let now = Instant::now();
        let high_watermark = match replica {
            Some(follower) => {
                leader_state.record_fetch(follower, offset, log_end, now);
                leader_state.high_watermark()
            }
            None => {
                let high_watermark = leader_state.advance_high_watermark(log_end, now);
                records.retain(|record: &Record| record.offset < high_watermark);
                high_watermark
            }
        };

        Ok(FetchBatch { records, high_watermark })
    }

    pub(crate) fn status(&self) -> ReplicaStatus {
        let log_end_offset = self
            .log
            .lock()
            .expect("Replicator.status() mutex guard poison")
            .next_offset();

        let (high_watermark, isr) = match &self.state {
            RoleState::Leader(leader_state) => {
                let leader_state = leader_state.lock().expect("Replicator.status() mutex guard poison");
                (leader_state.high_watermark(), leader_state.isr(Instant::now()))
            }
            RoleState::Follower { high_watermark, .. } => {
                let high_watermark = *high_watermark.lock().expect("Replicator.status() mutex guard poison");
                (high_watermark, Vec::new())
            }
        };

        ReplicaStatus {
            role: self.role,
            log_end_offset,
            high_watermark,
            isr,
        }
    }

    /// Stops the fetch task (if any), waits for it to exit, then flushes the log. Calling it more
    /// than once is a no-op apart from the flush.
    pub(crate) async fn stop(&self) {
        if let RoleState::Follower { task, .. } = &self.state {
            let handle = task.lock().expect("Replicator.stop() mutex guard poison").take();
            if let Some(FollowerHandle { stopper, join_handle }) = handle {
                stopper.stop();
                match join_handle.await {
                    Ok(exit) => slog::debug!(self.logger, "Fetch task exited: {:?}", exit),
                    Err(e) => slog::warn!(self.logger, "Fetch task panicked: {:?}", e),
                }
            }
        }

        if let Err(e) = self.log.lock().expect("Replicator.stop() mutex guard poison").flush() {
            slog::warn!(self.logger, "Failed to flush log: {:?}", e);
        }
    }

    fn leader_state(&self) -> Result<&Mutex<LeaderState>, ReplicaError> {
        match &self.state {
            RoleState::Leader(leader_state) => Ok(leader_state),
            RoleState::Follower { .. } => Err(ReplicaError::NotLeader),
        }
    }
}
