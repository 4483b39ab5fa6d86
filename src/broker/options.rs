use crate::replicator::ReplicaOptions;
use std::convert::TryFrom;
use tokio::time::Duration;

#[derive(Clone, Debug, Default)]
pub struct BrokerOptions {
    /// Most records a follower asks for in one fetch.
    pub fetch_max_records: Option<u32>,
    /// How long a caught-up follower waits before fetching again.
    pub fetch_idle_interval: Option<Duration>,
    pub fetch_backoff_min: Option<Duration>,
    pub fetch_backoff_max: Option<Duration>,
    /// Consecutive failed fetches after which a follower gives up.
    pub fetch_retry_budget: Option<u32>,
    /// A follower that hasn't caught up with the leader for this long leaves the ISR.
    pub replica_lag_time_max: Option<Duration>,
    /// Delay between deleting a partition and removing its log directory.
    pub log_deletion_delay: Option<Duration>,
}

#[derive(Clone, Debug)]
pub(super) struct BrokerOptionsValidated {
    pub fetch_max_records: u32,
    pub fetch_idle_interval: Duration,
    pub fetch_backoff_min: Duration,
    pub fetch_backoff_max: Duration,
    pub fetch_retry_budget: u32,
    pub replica_lag_time_max: Duration,
    pub log_deletion_delay: Duration,
}

impl BrokerOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.fetch_max_records == 0 {
            return Err("Fetch max records must be positive");
        }
        if self.fetch_backoff_min > self.fetch_backoff_max {
            return Err("Fetch minimum backoff must not exceed maximum backoff");
        }
        if self.fetch_retry_budget == 0 {
            return Err("Fetch retry budget must be positive");
        }
        if self.replica_lag_time_max <= self.fetch_idle_interval {
            return Err("Replica lag time max must be greater than the follower's idle fetch interval");
        }

        Ok(())
    }

    pub(super) fn replica_options(&self) -> ReplicaOptions {
        ReplicaOptions {
            fetch_max_records: self.fetch_max_records,
            fetch_idle_interval: self.fetch_idle_interval,
            fetch_backoff_min: self.fetch_backoff_min,
            fetch_backoff_max: self.fetch_backoff_max,
            fetch_retry_budget: self.fetch_retry_budget,
            replica_lag_time_max: self.replica_lag_time_max,
        }
    }
}

impl TryFrom<BrokerOptions> for BrokerOptionsValidated {
    type Error = &'static str;

    fn try_from(options: BrokerOptions) -> Result<Self, Self::Error> {
        let values = BrokerOptionsValidated {
            fetch_max_records: options.fetch_max_records.unwrap_or(500),
            fetch_idle_interval: options.fetch_idle_interval.unwrap_or(Duration::from_millis(100)),
            fetch_backoff_min: options.fetch_backoff_min.unwrap_or(Duration::from_millis(50)),
            fetch_backoff_max: options.fetch_backoff_max.unwrap_or(Duration::from_secs(2)),
            fetch_retry_budget: options.fetch_retry_budget.unwrap_or(10),
            replica_lag_time_max: options.replica_lag_time_max.unwrap_or(Duration::from_secs(10)),
            log_deletion_delay: options.log_deletion_delay.unwrap_or(Duration::from_secs(1)),
        };

        values.validate()?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = BrokerOptionsValidated::try_from(BrokerOptions::default()).unwrap();

        assert_eq!(options.fetch_max_records, 500);
        assert_eq!(options.fetch_retry_budget, 10);
        assert_eq!(options.log_deletion_delay, Duration::from_secs(1));
    }

    #[test]
    fn inverted_backoff_is_rejected() {
        let options = BrokerOptions {
            fetch_backoff_min: Some(Duration::from_secs(3)),
            ..BrokerOptions::default()
        };

        assert!(BrokerOptionsValidated::try_from(options).is_err());
    }

    #[test]
    fn zero_retry_budget_is_rejected() {
        let options = BrokerOptions {
            fetch_retry_budget: Some(0),
            ..BrokerOptions::default()
        };

        assert!(BrokerOptionsValidated::try_from(options).is_err());
    }
}
