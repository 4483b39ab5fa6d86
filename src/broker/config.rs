use crate::broker::BrokerOptions;
use crate::cluster::{Consensus, Membership};
use crate::commitlog::{FileLogFactory, LogFactory};
use crate::logging;
use crate::metadata::BrokerId;
use crate::replicator::FetcherConnector;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything `Broker::new` needs. Only the id, address, log directory and the two providers are
/// required; the rest defaults to a discarding logger, file-backed logs and gRPC fetches.
pub struct BrokerConfig {
    pub id: BrokerId,
    /// Address the broker listens on, `host:port`.
    pub addr: String,
    /// Root directory holding one log directory per hosted partition.
    pub log_dir: PathBuf,
    pub logger: slog::Logger,
    pub membership: Arc<dyn Membership>,
    pub consensus: Arc<dyn Consensus>,
    pub log_factory: Arc<dyn LogFactory>,
    /// `None` uses a `GrpcConnector` sharing the broker's logger.
    pub fetcher_connector: Option<Arc<dyn FetcherConnector>>,
    pub options: BrokerOptions,
}

impl BrokerConfig {
    pub fn new(
        id: BrokerId,
        addr: impl Into<String>,
        log_dir: impl Into<PathBuf>,
        membership: Arc<dyn Membership>,
        consensus: Arc<dyn Consensus>,
    ) -> Self {
        BrokerConfig {
            id,
            addr: addr.into(),
            log_dir: log_dir.into(),
            logger: logging::discard_logger(),
            membership,
            consensus,
            log_factory: Arc::new(FileLogFactory),
            fetcher_connector: None,
            options: BrokerOptions::default(),
        }
    }

    pub fn with_logger(mut self, logger: slog::Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_log_factory(mut self, log_factory: Arc<dyn LogFactory>) -> Self {
        self.log_factory = log_factory;
        self
    }

    pub fn with_fetcher_connector(mut self, fetcher_connector: Arc<dyn FetcherConnector>) -> Self {
        self.fetcher_connector = Some(fetcher_connector);
        self
    }

    pub fn with_options(mut self, options: BrokerOptions) -> Self {
        self.options = options;
        self
    }
}
