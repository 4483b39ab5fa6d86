use crate::broker::apply;
use crate::broker::options::BrokerOptionsValidated;
use crate::broker::{BrokerConfig, BrokerError};
use crate::cluster::{self, ClusterMember, Consensus, Membership};
use crate::commitlog::LogFactory;
use crate::metadata::{BrokerId, Partition, PartitionId, PartitionStore, TopicPartition};
use crate::replicator::{self, FetcherConnector, ReplicaOptions, ReplicaStatus, Replicator, StopCheck, Stopper};
use crate::server::{GrpcConnector, ReplicationServer};
use std::collections::HashMap;
use std::convert::TryFrom;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Broker is the coordinator of one broker process. It owns the partition metadata derived from
/// committed commands, the replicators for the partitions hosted here, and routes client
/// requests.
pub struct Broker {
    pub(super) logger: slog::Logger,
    pub(super) id: BrokerId,
    pub(super) addr: String,
    pub(super) log_dir: PathBuf,
    pub(super) membership: Arc<dyn Membership>,
    pub(super) consensus: Arc<dyn Consensus>,
    pub(super) log_factory: Arc<dyn LogFactory>,
    pub(super) fetcher_connector: Arc<dyn FetcherConnector>,
    pub(super) options: BrokerOptionsValidated,
    pub(super) replica_options: ReplicaOptions,
    state: Mutex<BrokerState>,
    lifecycle: Mutex<Lifecycle>,
    shutdown_check: StopCheck,
}

/// Only the apply loop mutates this.
#[derive(Default)]
pub(super) struct BrokerState {
    pub(super) store: PartitionStore,
    pub(super) replicators: HashMap<TopicPartition, Arc<Replicator>>,
}

struct Lifecycle {
    shut_down: bool,
    stopper: Option<Stopper>,
    apply_task: Option<JoinHandle<()>>,
    server_task: Option<JoinHandle<()>>,
}

impl Broker {
    /// Validates the config, bootstraps membership then consensus, and starts the apply loop.
    /// Must be called from within a tokio runtime.
    pub fn new(config: BrokerConfig) -> Result<Arc<Broker>, BrokerError> {
        let BrokerConfig {
            id,
            addr,
            log_dir,
            logger,
            membership,
            consensus,
            log_factory,
            fetcher_connector,
            options,
        } = config;
        let logger = logger.new(slog::o!("broker_id" => id.as_i32()));

        resolve_addr(&addr)?;
        let raft_addr = consensus.addr();
        if raft_addr.is_empty() {
            return Err(BrokerError::Config("Consensus provider has no address".into()));
        }
        let options = BrokerOptionsValidated::try_from(options).map_err(|e| BrokerError::Config(e.into()))?;
        let fetcher_connector =
            fetcher_connector.unwrap_or_else(|| Arc::new(GrpcConnector::new(logger.clone())));

        let (change_sink, change_source) = cluster::member_changes();
        let (command_sink, command_stream) = cluster::command_stream();

        let me = ClusterMember::new(id, addr.clone(), raft_addr);
        membership.bootstrap(me, change_sink).map_err(BrokerError::Membership)?;
        consensus
            .bootstrap(membership.clone(), change_source, command_sink)
            .map_err(BrokerError::Consensus)?;

        let (stopper, shutdown_check) = replicator::stop_signal();
        let broker = Arc::new(Broker {
            logger,
            id,
            addr,
            log_dir,
            membership,
            consensus,
            log_factory,
            fetcher_connector,
            replica_options: options.replica_options(),
            options,
            state: Mutex::new(BrokerState::default()),
            lifecycle: Mutex::new(Lifecycle {
                shut_down: false,
                stopper: Some(stopper),
                apply_task: None,
                server_task: None,
            }),
            shutdown_check,
        });

        let apply_task = tokio::spawn(apply::apply_loop(
            broker.logger.clone(),
            Arc::downgrade(&broker),
            command_stream,
            broker.shutdown_signal(),
        ));
        broker.lock_lifecycle().apply_task = Some(apply_task);
        slog::info!(broker.logger, "Broker started at {} with log dir {:?}", broker.addr, broker.log_dir);

        Ok(broker)
    }

    pub fn id(&self) -> BrokerId {
        self.id
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// True iff the consensus provider reports this broker as its leader.
    pub fn is_controller(&self) -> bool {
        self.consensus.is_leader()
    }

    pub fn cluster_members(&self) -> Vec<ClusterMember> {
        self.membership.members()
    }

    pub fn cluster_member(&self, id: BrokerId) -> Option<ClusterMember> {
        self.membership.member(id)
    }

    /// A snapshot of every topic and its partitions.
    pub fn topics(&self) -> HashMap<String, Vec<Partition>> {
        self.lock_state().store.topics().clone()
    }

    pub fn topic_partitions(&self, topic: &str) -> Result<Vec<Partition>, BrokerError> {
        self.lock_state()
            .store
            .topic_partitions(topic)
            .map(<[Partition]>::to_vec)
            .ok_or(BrokerError::UnknownTopicOrPartition)
    }

    pub fn partition(&self, topic: &str, id: PartitionId) -> Result<Partition, BrokerError> {
        self.lock_state()
            .store
            .partition(topic, id)
            .cloned()
            .ok_or(BrokerError::UnknownTopicOrPartition)
    }

    /// Status of the local replica, if this broker hosts one for the partition.
    pub fn replica_status(&self, topic: &str, id: PartitionId) -> Option<ReplicaStatus> {
        self.replicator(&TopicPartition::new(topic, id))
            .map(|replicator| replicator.status())
    }

    /// Joins the cluster through any of `addrs`, returning how many were contacted.
    pub async fn join(&self, addrs: &[String]) -> Result<usize, BrokerError> {
        self.membership.join(addrs).await.map_err(BrokerError::unknown)
    }

    /// Starts the gRPC service that followers of partitions led here fetch from. It listens on
    /// the broker's address until shutdown. The address is bound before this returns, so an
    /// address in use is reported here as a config error.
    pub fn serve_replication(self: &Arc<Self>) -> Result<(), BrokerError> {
        let socket_addr = resolve_addr(&self.addr)?;

        let mut lifecycle = self.lock_lifecycle();
        if lifecycle.shut_down {
            return Err(BrokerError::Config("Broker is shut down".into()));
        }
        if lifecycle.server_task.is_some() {
            return Err(BrokerError::Config("Replication server already running".into()));
        }
        let listener = bind(socket_addr)?;
        let server = ReplicationServer::new(self.logger.clone(), Arc::downgrade(self));
        lifecycle.server_task = Some(tokio::spawn(server.run(listener, self.shutdown_signal())));

        Ok(())
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown_check.should_stop()
    }

    /// Stops the apply loop, the replication server, every replicator, and both providers. Only
    /// the first call does the work and sees its errors; later calls return `Ok(())`.
    pub async fn shutdown(&self) -> Result<(), BrokerError> {
        let (stopper, apply_task, server_task) = {
            let mut lifecycle = self.lock_lifecycle();
            if lifecycle.shut_down {
                return Ok(());
            }
            lifecycle.shut_down = true;
            (
                lifecycle.stopper.take(),
                lifecycle.apply_task.take(),
                lifecycle.server_task.take(),
            )
        };
        slog::info!(self.logger, "Shutting down");

        if let Some(stopper) = stopper {
            stopper.stop();
        }
        for task in apply_task.into_iter().chain(server_task) {
            if let Err(e) = task.await {
                slog::warn!(self.logger, "Background task panicked: {:?}", e);
            }
        }

        let replicators: Vec<Arc<Replicator>> = self
            .lock_state()
            .replicators
            .drain()
            .map(|(_, replicator)| replicator)
            .collect();
        for replicator in replicators {
            replicator.stop().await;
        }

        let membership_result = self.membership.shutdown().await.map_err(BrokerError::Membership);
        let consensus_result = self.consensus.shutdown().await.map_err(BrokerError::Consensus);
        membership_result?;
        consensus_result?;

        slog::info!(self.logger, "Shutdown complete");
        Ok(())
    }

    pub(super) fn shutdown_signal(&self) -> StopCheck {
        self.shutdown_check.clone()
    }

    pub(super) fn replicator(&self, key: &TopicPartition) -> Option<Arc<Replicator>> {
        self.lock_state().replicators.get(key).cloned()
    }

    pub(super) fn lock_state(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().expect("Broker.state mutex guard poison")
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().expect("Broker.lifecycle mutex guard poison")
    }

    #[cfg(test)]
    pub(super) fn insert_partitions(&self, partitions: Vec<Partition>) {
        let mut state = self.lock_state();
        for partition in partitions {
            state.store.upsert(partition);
        }
    }
}

fn resolve_addr(addr: &str) -> Result<SocketAddr, BrokerError> {
    if addr.is_empty() {
        return Err(BrokerError::Config("Broker address is empty".into()));
    }

    addr.to_socket_addrs()
        .map_err(|e| BrokerError::Config(format!("Invalid broker address '{}': {}", addr, e)))?
        .next()
        .ok_or_else(|| BrokerError::Config(format!("Broker address '{}' resolved to nothing", addr)))
}

fn bind(socket_addr: SocketAddr) -> Result<TcpListener, BrokerError> {
    let config_error = |e: std::io::Error| BrokerError::Config(format!("Cannot bind '{}': {}", socket_addr, e));
    let listener = std::net::TcpListener::bind(socket_addr).map_err(config_error)?;
    listener.set_nonblocking(true).map_err(config_error)?;
    TcpListener::from_std(listener).map_err(config_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::fixtures::{new_broker, Fixture};
    use crate::cluster::{mock_member, ConsensusError, MembershipError, MockConsensus, MockMembership};
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn new_bootstraps_both_providers_once() {
        let fixture = Fixture::new();

        let broker = new_broker(&fixture).unwrap();

        assert_eq!(fixture.membership.bootstrap_invoked.load(Ordering::SeqCst), 1);
        assert_eq!(fixture.consensus.bootstrap_invoked.load(Ordering::SeqCst), 1);
        assert!(!broker.is_shut_down());
        assert_eq!(broker.id(), BrokerId(1));
    }

    #[tokio::test]
    async fn new_rejects_empty_addr() {
        let mut fixture = Fixture::new();
        fixture.addr = String::new();

        assert!(matches!(new_broker(&fixture), Err(BrokerError::Config(_))));
        assert_eq!(fixture.membership.bootstrap_invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn new_rejects_unparseable_addr() {
        let mut fixture = Fixture::new();
        fixture.addr = "no-port-here".into();

        assert!(matches!(new_broker(&fixture), Err(BrokerError::Config(_))));
    }

    #[tokio::test]
    async fn new_rejects_empty_consensus_addr() {
        let fixture = Fixture::with_providers(
            MockMembership::default(),
            MockConsensus {
                addr_fn: Box::new(String::new),
                ..MockConsensus::default()
            },
        );

        assert!(matches!(new_broker(&fixture), Err(BrokerError::Config(_))));
    }

    #[tokio::test]
    async fn new_propagates_membership_bootstrap_error() {
        let fixture = Fixture::with_providers(
            MockMembership {
                bootstrap_fn: Box::new(|_| Err(MembershipError::Bootstrap("mock serf bootstrap error".into()))),
                ..MockMembership::default()
            },
            MockConsensus::default(),
        );

        assert!(matches!(new_broker(&fixture), Err(BrokerError::Membership(_))));
        assert_eq!(fixture.consensus.bootstrap_invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn new_propagates_consensus_bootstrap_error() {
        let fixture = Fixture::with_providers(
            MockMembership::default(),
            MockConsensus {
                bootstrap_fn: Box::new(|| Err(ConsensusError::Bootstrap("mock raft bootstrap error".into()))),
                ..MockConsensus::default()
            },
        );

        assert!(matches!(new_broker(&fixture), Err(BrokerError::Consensus(_))));
        assert_eq!(fixture.membership.bootstrap_invoked.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn new_rejects_invalid_options() {
        let mut fixture = Fixture::new();
        fixture.options.fetch_max_records = Some(0);

        assert!(matches!(new_broker(&fixture), Err(BrokerError::Config(_))));
    }

    #[tokio::test]
    async fn join_delegates_to_membership() {
        let fixture = Fixture::new();
        let broker = new_broker(&fixture).unwrap();

        let contacted = broker.join(&["localhost:9082".to_string()]).await.unwrap();

        assert_eq!(contacted, 1);
        assert_eq!(
            *fixture.membership.joined_addrs.lock().unwrap(),
            vec!["localhost:9082".to_string()]
        );
    }

    #[tokio::test]
    async fn join_failure_is_unknown() {
        let fixture = Fixture::with_providers(
            MockMembership {
                join_fn: Box::new(|_| Err(MembershipError::Join("mock serf join error".into()))),
                ..MockMembership::default()
            },
            MockConsensus::default(),
        );
        let broker = new_broker(&fixture).unwrap();

        let err = broker.join(&["localhost:9082".to_string()]).await.unwrap_err();

        assert!(matches!(err, BrokerError::Unknown(_)));
        assert!(err.to_string().contains("mock serf join error"));
    }

    #[tokio::test]
    async fn cluster_queries_pass_through() {
        let fixture = Fixture::with_providers(MockMembership::with_members(&[1, 2]), MockConsensus::default());
        let broker = new_broker(&fixture).unwrap();

        assert_eq!(broker.cluster_members(), vec![mock_member(1), mock_member(2)]);
        assert_eq!(broker.cluster_member(BrokerId(2)), Some(mock_member(2)));
        assert_eq!(broker.cluster_member(BrokerId(7)), None);
        assert_eq!(fixture.membership.member_invoked.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn is_controller_follows_consensus_leadership() {
        for leader in [true, false].iter().copied() {
            let fixture = Fixture::with_providers(
                MockMembership::default(),
                MockConsensus {
                    is_leader_fn: Box::new(move || leader),
                    ..MockConsensus::default()
                },
            );
            let broker = new_broker(&fixture).unwrap();

            assert_eq!(broker.is_controller(), leader);
        }
    }

    #[tokio::test]
    async fn unknown_topic_lookups_fail() {
        let fixture = Fixture::new();
        let broker = new_broker(&fixture).unwrap();

        assert!(broker.topics().is_empty());
        assert!(matches!(
            broker.topic_partitions("unknown-topic"),
            Err(BrokerError::UnknownTopicOrPartition)
        ));
        assert!(matches!(
            broker.partition("unknown-topic", 1),
            Err(BrokerError::UnknownTopicOrPartition)
        ));
    }

    #[tokio::test]
    async fn partition_lookup_matches_by_id() {
        let fixture = Fixture::new();
        let broker = new_broker(&fixture).unwrap();
        let partition = Partition {
            topic: "topic".into(),
            id: 1,
            ..Partition::default()
        };
        broker.insert_partitions(vec![partition.clone()]);

        assert_eq!(broker.partition("topic", 1).unwrap(), partition);
        assert_eq!(broker.topic_partitions("topic").unwrap(), vec![partition.clone()]);
        assert!(matches!(
            broker.partition("topic", 2),
            Err(BrokerError::UnknownTopicOrPartition)
        ));
        assert_eq!(broker.topics().get("topic"), Some(&vec![partition]));
    }

    #[tokio::test]
    async fn serve_replication_reports_address_in_use() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut fixture = Fixture::new();
        fixture.addr = taken.local_addr().unwrap().to_string();
        let broker = new_broker(&fixture).unwrap();

        assert!(matches!(broker.serve_replication(), Err(BrokerError::Config(_))));

        // Nothing was started, so a retry on a free address is not refused as a second server.
        drop(taken);
        broker.serve_replication().unwrap();
        broker.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn serve_replication_only_once() {
        let mut fixture = Fixture::new();
        fixture.addr = "127.0.0.1:0".to_string();
        let broker = new_broker(&fixture).unwrap();

        broker.serve_replication().unwrap();

        assert!(matches!(broker.serve_replication(), Err(BrokerError::Config(_))));
        broker.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_twice_releases_once() {
        let fixture = Fixture::new();
        let broker = new_broker(&fixture).unwrap();

        broker.shutdown().await.unwrap();
        broker.shutdown().await.unwrap();

        assert!(broker.is_shut_down());
        assert_eq!(fixture.membership.shutdown_invoked.load(Ordering::SeqCst), 1);
        assert_eq!(fixture.consensus.shutdown_invoked.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_shutdown_is_safe() {
        let fixture = Fixture::new();
        let broker = new_broker(&fixture).unwrap();

        let (first, second) = tokio::join!(broker.shutdown(), broker.shutdown());

        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(fixture.consensus.shutdown_invoked.load(Ordering::SeqCst), 1);
    }
}
