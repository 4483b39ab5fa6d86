use crate::cluster::ClusterMember;
use crate::commitlog::{Offset, Record};
use crate::grpc::grpc_replication_client::GrpcReplicationClient;
use crate::grpc::{proto_fetch_error, proto_fetch_result, ProtoFetchReq, ProtoFetchResult};
use crate::protocol::FetchRequest;
use crate::replicator::{FetchBatch, FetchError, FetcherConnector, PartitionFetcher};
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::Mutex;
use tonic::transport::{Channel, Endpoint};

/// Connects followers to their leader's `ReplicationServer` over gRPC.
pub struct GrpcConnector {
    logger: slog::Logger,
}

impl GrpcConnector {
    pub fn new(logger: slog::Logger) -> Self {
        GrpcConnector { logger }
    }
}

impl FetcherConnector for GrpcConnector {
    fn connect(&self, leader: &ClusterMember) -> Arc<dyn PartitionFetcher> {
        let logger = self.logger.new(slog::o!("leader" => leader.id.as_i32()));
        Arc::new(GrpcFetcher::new(logger, format!("http://{}", leader.addr)))
    }
}

/// Fetches from a single leader. The channel is established on first use and re-established
/// after a transport failure.
struct GrpcFetcher {
    logger: slog::Logger,
    url: String,
    client: Mutex<Option<GrpcReplicationClient<Channel>>>,
}

impl GrpcFetcher {
    fn new(logger: slog::Logger, url: String) -> Self {
        GrpcFetcher {
            logger,
            url,
            client: Mutex::new(None),
        }
    }

    async fn client(&self) -> Result<GrpcReplicationClient<Channel>, FetchError> {
        let mut client = self.client.lock().await;
        if let Some(client) = client.as_ref() {
            return Ok(client.clone());
        }

        slog::debug!(self.logger, "Connecting to {} ...", self.url);
        let endpoint = Endpoint::from_shared(self.url.clone()).map_err(|e| FetchError::Transient(e.to_string()))?;
        let connection = endpoint
            .connect()
            .await
            .map_err(|e| FetchError::Transient(e.to_string()))?;
        let connected = GrpcReplicationClient::new(connection);
        *client = Some(connected.clone());

        Ok(connected)
    }

    fn convert_fetch_result(rpc_result: ProtoFetchResult) -> Result<FetchBatch, FetchError> {
        match rpc_result.result {
            Some(proto_fetch_result::Result::Ok(success)) => Ok(FetchBatch {
                records: success
                    .records
                    .into_iter()
                    .map(|record| Record {
                        offset: Offset(record.offset),
                        timestamp_ms: record.timestamp_ms,
                        value: Bytes::from(record.value),
                    })
                    .collect(),
                high_watermark: Offset(success.high_watermark),
            }),
            Some(proto_fetch_result::Result::Err(error)) => Err(match error.err {
                Some(proto_fetch_error::Err::NotLeader(_)) => FetchError::NotLeader,
                Some(proto_fetch_error::Err::UnknownPartition(_)) => FetchError::UnknownPartition,
                Some(proto_fetch_error::Err::OffsetOutOfRange(out_of_range)) => FetchError::OffsetOutOfRange {
                    log_end_offset: out_of_range.log_end_offset,
                },
                Some(proto_fetch_error::Err::ServerFault(fault)) => FetchError::Transient(fault.message),
                None => FetchError::Transient("Leader sent an empty error".to_string()),
            }),
            None => Err(FetchError::Transient("Leader sent an empty result".to_string())),
        }
    }
}

#[async_trait::async_trait]
impl PartitionFetcher for GrpcFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchBatch, FetchError> {
        let mut client = self.client().await?;
        let rpc_request = ProtoFetchReq {
            topic: request.topic,
            partition: request.partition,
            offset: request.offset,
            max_records: request.max_records,
            replica_id: request.replica_id,
        };

        slog::trace!(self.logger, "ClientWire - {:?}", rpc_request);
        match client.fetch(rpc_request).await {
            Ok(response) => Self::convert_fetch_result(response.into_inner()),
            Err(status) => {
                slog::debug!(self.logger, "Fetch failed: {}", status);
                *self.client.lock().await = None;
                Err(FetchError::Transient(status.to_string()))
            }
        }
    }
}
