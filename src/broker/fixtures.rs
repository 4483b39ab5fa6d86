//! Shared setup for the broker's unit tests.
use crate::broker::{Broker, BrokerConfig, BrokerError, BrokerOptions};
use crate::cluster::{ClusterMember, MockConsensus, MockMembership};
use crate::commitlog::InMemoryLogFactory;
use crate::metadata::{BrokerId, Partition, PartitionId};
use crate::protocol::FetchRequest;
use crate::replicator::{FetchBatch, FetchError, FetcherConnector, PartitionFetcher};
use crate::test_utils::TempDir;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(super) struct Fixture {
    pub(super) membership: Arc<MockMembership>,
    pub(super) consensus: Arc<MockConsensus>,
    pub(super) addr: String,
    pub(super) log_dir: TempDir,
    /// Passed to the broker as its log root. Defaults to `log_dir`.
    pub(super) log_root: PathBuf,
    pub(super) options: BrokerOptions,
    pub(super) connector: Arc<MockConnector>,
}

impl Fixture {
    pub(super) fn new() -> Self {
        Self::with_providers(MockMembership::default(), MockConsensus::default())
    }

    pub(super) fn with_providers(membership: MockMembership, consensus: MockConsensus) -> Self {
        let log_dir = TempDir::new();
        let log_root = log_dir.path().to_path_buf();
        Fixture {
            membership: Arc::new(membership),
            consensus: Arc::new(consensus),
            addr: "127.0.0.1:9092".to_string(),
            log_dir,
            log_root,
            options: BrokerOptions::default(),
            connector: Arc::new(MockConnector::default()),
        }
    }
}

/// Broker 1 over the fixture's mocks, with in-memory logs.
pub(super) fn new_broker(fixture: &Fixture) -> Result<Arc<Broker>, BrokerError> {
    let config = BrokerConfig::new(
        BrokerId(1),
        fixture.addr.clone(),
        fixture.log_root.clone(),
        fixture.membership.clone(),
        fixture.consensus.clone(),
    )
    .with_log_factory(Arc::new(InMemoryLogFactory))
    .with_fetcher_connector(fixture.connector.clone())
    .with_options(fixture.options.clone());

    Broker::new(config)
}

pub(super) fn partition(topic: &str, id: PartitionId, leader: i32, replicas: &[i32]) -> Partition {
    let replicas: Vec<BrokerId> = replicas.iter().copied().map(BrokerId).collect();
    Partition {
        topic: topic.to_string(),
        id,
        leader: BrokerId(leader),
        isr: replicas.clone(),
        replicas,
    }
}

/// Polls `condition` until it holds, failing the test after a few seconds.
pub(super) async fn eventually(condition: impl Fn() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Condition not met in time");
}

/// Records which leaders it was asked to connect to. Its fetchers never return records.
#[derive(Default)]
pub(super) struct MockConnector {
    connected: Mutex<Vec<BrokerId>>,
}

impl MockConnector {
    pub(super) fn connected(&self) -> Vec<BrokerId> {
        self.connected.lock().unwrap().clone()
    }
}

impl FetcherConnector for MockConnector {
    fn connect(&self, leader: &ClusterMember) -> Arc<dyn PartitionFetcher> {
        self.connected.lock().unwrap().push(leader.id);
        Arc::new(IdleFetcher)
    }
}

struct IdleFetcher;

#[async_trait::async_trait]
impl PartitionFetcher for IdleFetcher {
    async fn fetch(&self, _: FetchRequest) -> Result<FetchBatch, FetchError> {
        Ok(FetchBatch::default())
    }
}
