use crate::commitlog::Offset;
use crate::metadata::BrokerId;
use std::collections::BTreeMap;
use tokio::time::{Duration, Instant};

/// LeaderState tracks how far each follower has replicated, which followers are in sync, and
/// the resulting high watermark.
pub(super) struct LeaderState {
    me: BrokerId,
    lag_time_max: Duration,
    followers: BTreeMap<BrokerId, FollowerProgress>,
    high_watermark: Offset,
}

struct FollowerProgress {
    log_end: Offset,
    last_caught_up: Instant,
}

impl LeaderState {
    /// Followers start at offset 0, and count as caught up as of `now`.
    pub(super) fn new(me: BrokerId, replicas: &[BrokerId], lag_time_max: Duration, now: Instant) -> Self {
        let followers = replicas
            .iter()
            .filter(|id| **id != me)
            .map(|id| {
                let progress = FollowerProgress {
                    log_end: Offset(0),
                    last_caught_up: now,
                };
                (*id, progress)
            })
            .collect();

        LeaderState {
            me,
            lag_time_max,
            followers,
            high_watermark: Offset(0),
        }
    }

    /// A follower fetching at `fetch_offset` has everything before it.
    pub(super) fn record_fetch(&mut self, follower: BrokerId, fetch_offset: Offset, leader_log_end: Offset, now: Instant) {
        match self.followers.get_mut(&follower) {
            Some(progress) => {
                progress.log_end = fetch_offset;
                if fetch_offset >= leader_log_end {
                    progress.last_caught_up = now;
                }
            }
            // Not part of the replica set.
            None => return,
        }

        self.advance_high_watermark(leader_log_end, now);
    }

    pub(super) fn isr(&self, now: Instant) -> Vec<BrokerId> {
        let mut isr = vec![self.me];
        isr.extend(self.in_sync_followers(now).map(|(id, _)| *id));
        isr
    }

    /// The high watermark only moves forward, even when a lagging follower is dropped from and
    /// later re-added to the ISR.
    pub(super) fn advance_high_watermark(&mut self, leader_log_end: Offset, now: Instant) -> Offset {
        let isr_min = self
            .in_sync_followers(now)
            .map(|(_, progress)| progress.log_end)
            .fold(leader_log_end, std::cmp::min);

        if isr_min > self.high_watermark {
            self.high_watermark = isr_min;
        }
        self.high_watermark
    }

    pub(super) fn high_watermark(&self) -> Offset {
        self.high_watermark
    }

    fn in_sync_followers(&self, now: Instant) -> impl Iterator<Item = (&BrokerId, &FollowerProgress)> + '_ {
        let lag_time_max = self.lag_time_max;
        self.followers
            .iter()
            .filter(move |(_, progress)| now.saturating_duration_since(progress.last_caught_up) <= lag_time_max)
    }
}
