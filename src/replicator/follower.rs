use crate::commitlog::{Offset, Record};
use crate::metadata::{BrokerId, TopicPartition};
use crate::protocol::FetchRequest;
use crate::replicator::backoff::Backoff;
use crate::replicator::fetcher::{FetchBatch, FetchError, PartitionFetcher};
use crate::replicator::replicator::{ReplicaOptions, SharedLog};
use crate::replicator::stop_signal::StopCheck;
use crate::replicator::time::Clock;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Why a follower fetch task returned.
#[derive(Debug, Eq, PartialEq)]
pub(crate) enum FollowerExit {
    Stopped,
    /// The remote broker kept reporting that it doesn't lead the partition. A later committed
    /// command will assign this replica a new role.
    LeaderChanged,
    RetriesExhausted,
    Fatal(String),
}

/// FollowerTask pulls records from the partition leader into the local log until it is stopped
/// or hits a permanent failure.
pub(super) struct FollowerTask<C: Clock> {
    logger: slog::Logger,
    partition: TopicPartition,
    me: BrokerId,
    log: SharedLog,
    high_watermark: Arc<Mutex<Offset>>,
    fetcher: Arc<dyn PartitionFetcher>,
    max_records: u32,
    idle_interval: Duration,
    retry_budget: u32,
    backoff: Backoff,
    clock: C,
    stop_check: StopCheck,
}

impl<C: Clock> FollowerTask<C> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        logger: slog::Logger,
        partition: TopicPartition,
        me: BrokerId,
        log: SharedLog,
        high_watermark: Arc<Mutex<Offset>>,
        fetcher: Arc<dyn PartitionFetcher>,
        options: &ReplicaOptions,
        clock: C,
        stop_check: StopCheck,
    ) -> Self {
        FollowerTask {
            logger,
            partition,
            me,
            log,
            high_watermark,
            fetcher,
            max_records: options.fetch_max_records,
            idle_interval: options.fetch_idle_interval,
            retry_budget: options.fetch_retry_budget,
            backoff: Backoff::new(options.fetch_backoff_min, options.fetch_backoff_max),
            clock,
            stop_check,
        }
    }

    pub(super) async fn run(mut self) -> FollowerExit {
        let exit = self.fetch_loop().await;
        match &exit {
            FollowerExit::Stopped => slog::debug!(self.logger, "Follower stopped"),
            FollowerExit::LeaderChanged => slog::info!(self.logger, "Leader moved, awaiting new assignment"),
            FollowerExit::RetriesExhausted => slog::warn!(
                self.logger,
                "Giving up after {} consecutive fetch failures",
                self.retry_budget
            ),
            FollowerExit::Fatal(reason) => slog::error!(self.logger, "Follower failed: {}", reason),
        }

        exit
    }

    async fn fetch_loop(&mut self) -> FollowerExit {
        let mut consecutive_failures = 0;

        loop {
            if self.stop_check.should_stop() {
                return FollowerExit::Stopped;
            }

            let request = FetchRequest {
                topic: self.partition.topic.clone(),
                partition: self.partition.partition,
                offset: self.next_offset().as_u64(),
                max_records: self.max_records,
                replica_id: self.me.as_i32(),
            };
            let fetcher = self.fetcher.clone();
            let result = tokio::select! {
                _ = self.stop_check.stopped() => return FollowerExit::Stopped,
                result = fetcher.fetch(request) => result,
            };

            let idle = match result {
                Ok(batch) => {
                    consecutive_failures = 0;
                    self.backoff.reset();
                    match self.append_batch(batch) {
                        Ok(appended) => appended == 0,
                        Err(reason) => return FollowerExit::Fatal(reason),
                    }
                }
                Err(FetchError::OffsetOutOfRange { log_end_offset }) => {
                    return FollowerExit::Fatal(format!(
                        "Local log end {:?} is past the leader's log end {}",
                        self.next_offset(),
                        log_end_offset
                    ));
                }
                // The leader may not have applied the partition yet, so routing errors are retried
                // like transient ones.
                Err(e) => {
                    consecutive_failures += 1;
                    if consecutive_failures >= self.retry_budget {
                        return match e {
                            FetchError::Transient(_) => FollowerExit::RetriesExhausted,
                            _ => FollowerExit::LeaderChanged,
                        };
                    }
                    let delay = self.backoff.next_delay();
                    slog::warn!(
                        self.logger,
                        "Fetch failed ({}/{}), retrying in {:?}: {}",
                        consecutive_failures,
                        self.retry_budget,
                        delay,
                        e
                    );
                    if self.sleep(delay).await {
                        return FollowerExit::Stopped;
                    }
                    continue;
                }
            };

            if idle && self.sleep(self.idle_interval).await {
                return FollowerExit::Stopped;
            }
        }
    }

    /// Returns how many records were appended. Records already in the local log are skipped; a
    /// gap means the leader's log doesn't line up with ours.
    fn append_batch(&mut self, batch: FetchBatch) -> Result<usize, String> {
        let mut log = self.log.lock().expect("FollowerTask.append_batch() mutex guard poison");
        let mut appended = 0;
        for Record {
            offset,
            timestamp_ms,
            value,
        } in batch.records
        {
            let next_offset = log.next_offset();
            if offset < next_offset {
                continue;
            }
            if offset > next_offset {
                return Err(format!("Leader sent offset {:?}, expected {:?}", offset, next_offset));
            }
            log.append(value, timestamp_ms)
                .map_err(|e| format!("Local append failed: {}", e))?;
            appended += 1;
        }
        drop(log);

        *self
            .high_watermark
            .lock()
            .expect("FollowerTask.append_batch() mutex guard poison") = batch.high_watermark;
        Ok(appended)
    }

    fn next_offset(&self) -> Offset {
        self.log
            .lock()
            .expect("FollowerTask.next_offset() mutex guard poison")
            .next_offset()
    }

    /// Returns true if stop was signaled while sleeping.
    async fn sleep(&mut self, duration: Duration) -> bool {
        let stop_check = &mut self.stop_check;
        let clock = &mut self.clock;
        tokio::select! {
            _ = stop_check.stopped() => true,
            _ = clock.sleep(duration) => false,
        }
    }
}
