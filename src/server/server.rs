use crate::broker::{Broker, BrokerError};
use crate::grpc::grpc_replication_server::{GrpcReplication, GrpcReplicationServer};
use crate::grpc::{
    proto_fetch_error, proto_fetch_result, ProtoFetchError, ProtoFetchReq, ProtoFetchResult, ProtoFetchSuccess,
    ProtoNotLeader, ProtoOffsetOutOfRange, ProtoRecord, ProtoServerFault, ProtoUnknownPartition,
};
use crate::protocol::FetchRequest;
use crate::replicator::{FetchBatch, StopCheck};
use std::sync::Weak;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

/// ReplicationServer answers follower fetches for the partitions led by the local broker.
pub(crate) struct ReplicationServer {
    logger: slog::Logger,
    broker: Weak<Broker>,
}

impl ReplicationServer {
    pub(crate) fn new(logger: slog::Logger, broker: Weak<Broker>) -> Self {
        ReplicationServer { logger, broker }
    }

    /// Serves on an already bound `listener` until `shutdown` fires.
    pub(crate) async fn run(self, listener: TcpListener, mut shutdown: StopCheck) {
        let logger = self.logger.clone();
        slog::info!(logger, "Replication server listening on '{:?}'", listener.local_addr());

        let result = Server::builder()
            .add_service(GrpcReplicationServer::new(self))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                shutdown.stopped().await
            })
            .await;

        slog::info!(logger, "Replication server exited: {:?}", result);
    }

    fn handle_fetch(&self, rpc_request: ProtoFetchReq) -> ProtoFetchResult {
        let broker = match self.broker.upgrade() {
            Some(broker) => broker,
            None => return Self::server_fault("Broker has shut down".to_string()),
        };

        let request = FetchRequest {
            topic: rpc_request.topic,
            partition: rpc_request.partition,
            offset: rpc_request.offset,
            max_records: rpc_request.max_records,
            replica_id: rpc_request.replica_id,
        };
        Self::convert_fetch_result(broker.fetch_records(&request))
    }

    fn convert_fetch_result(app_result: Result<FetchBatch, BrokerError>) -> ProtoFetchResult {
        let err = match app_result {
            Ok(batch) => {
                return ProtoFetchResult {
                    result: Some(proto_fetch_result::Result::Ok(ProtoFetchSuccess {
                        records: batch
                            .records
                            .into_iter()
                            .map(|record| ProtoRecord {
                                offset: record.offset.as_u64(),
                                timestamp_ms: record.timestamp_ms,
                                value: record.value.to_vec(),
                            })
                            .collect(),
                        high_watermark: batch.high_watermark.as_u64(),
                    })),
                }
            }
            Err(BrokerError::NotLeaderForPartition) => proto_fetch_error::Err::NotLeader(ProtoNotLeader {}),
            Err(BrokerError::UnknownTopicOrPartition) => {
                proto_fetch_error::Err::UnknownPartition(ProtoUnknownPartition {})
            }
            Err(BrokerError::OffsetOutOfRange { log_end_offset }) => {
                proto_fetch_error::Err::OffsetOutOfRange(ProtoOffsetOutOfRange { log_end_offset })
            }
            Err(e) => return Self::server_fault(e.to_string()),
        };

        ProtoFetchResult {
            result: Some(proto_fetch_result::Result::Err(ProtoFetchError { err: Some(err) })),
        }
    }

    fn server_fault(message: String) -> ProtoFetchResult {
        ProtoFetchResult {
            result: Some(proto_fetch_result::Result::Err(ProtoFetchError {
                err: Some(proto_fetch_error::Err::ServerFault(ProtoServerFault { message })),
            })),
        }
    }
}

#[async_trait::async_trait]
impl GrpcReplication for ReplicationServer {
    async fn fetch(&self, rpc_request_wrapped: Request<ProtoFetchReq>) -> Result<Response<ProtoFetchResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::trace!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_fetch(rpc_request);
        slog::trace!(self.logger, "ServerWire - {:?}", rpc_result);

        Ok(Response::new(rpc_result))
    }
}
