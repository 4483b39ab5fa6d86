mod backoff;
mod fetcher;
mod follower;
mod leader;
#[allow(clippy::module_inception)]
mod replicator;
mod stop_signal;
mod time;

pub use fetcher::FetchBatch;
pub use fetcher::FetchError;
pub use fetcher::FetcherConnector;
pub use fetcher::PartitionFetcher;
pub use replicator::ReplicaError;
pub use replicator::ReplicaRole;
pub use replicator::ReplicaStatus;

pub(crate) use replicator::shared_log;
pub(crate) use replicator::ReplicaOptions;
pub(crate) use replicator::Replicator;
pub(crate) use replicator::SharedLog;
pub(crate) use stop_signal::new as stop_signal;
pub(crate) use stop_signal::StopCheck;
pub(crate) use stop_signal::Stopper;
