use crate::broker::{Broker, BrokerError};
use crate::metadata::{BrokerId, Partition};
use crate::protocol::{
    ApiVersion, BrokerMetadata, CreateTopicRequest, ErrorCode, FetchRequest, FetchResponse, MetadataRequest,
    MetadataResponse, PartitionMetadata, ProduceRequest, ProduceResponse, Request, RequestBody, Response,
    ResponseBody, TopicError, TopicMetadata,
};
use crate::replicator::ReplicaRole;
use std::future::Future;
use tokio::sync::mpsc;

// (api key, min version, max version) of every request this broker answers.
const SUPPORTED_APIS: [(i16, i16, i16); 6] = [(0, 0, 2), (1, 0, 2), (3, 0, 1), (18, 0, 0), (19, 0, 0), (20, 0, 0)];

impl Broker {
    /// Answers requests one at a time until `cancel` resolves or `requests` closes. Requests still
    /// queued at cancellation are dropped unanswered.
    pub async fn run<F: Future<Output = ()>>(
        &self,
        cancel: F,
        mut requests: mpsc::Receiver<Request>,
        responses: mpsc::Sender<Response>,
    ) {
        tokio::pin!(cancel);
        loop {
            let request = tokio::select! {
                biased;
                _ = &mut cancel => break,
                request = requests.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
            };

            let response = Response {
                correlation_id: request.correlation_id,
                body: self.handle(request.body).await,
            };
            if responses.send(response).await.is_err() {
                slog::warn!(self.logger, "Response channel closed, stopping request loop");
                break;
            }
        }
        slog::debug!(self.logger, "Request loop exited");
    }

    async fn handle(&self, body: RequestBody) -> ResponseBody {
        slog::trace!(self.logger, "Handling request with api key {}", body.api_key());
        match body {
            RequestBody::ApiVersions => ResponseBody::ApiVersions(api_versions()),
            RequestBody::Metadata(request) => ResponseBody::Metadata(self.handle_metadata(&request)),
            RequestBody::CreateTopics(requests) => ResponseBody::CreateTopics(self.handle_create_topics(requests).await),
            RequestBody::DeleteTopics(topics) => ResponseBody::DeleteTopics(self.handle_delete_topics(topics).await),
            RequestBody::Produce(request) => ResponseBody::Produce(self.handle_produce(request)),
            RequestBody::Fetch(request) => ResponseBody::Fetch(self.handle_fetch(request)),
        }
    }

    fn handle_metadata(&self, request: &MetadataRequest) -> MetadataResponse {
        let brokers = self
            .cluster_members()
            .into_iter()
            .map(|member| BrokerMetadata {
                node_id: member.id.as_i32(),
                addr: member.addr,
            })
            .collect();
        let controller_id = if self.is_controller() { self.id.as_i32() } else { -1 };

        let mut topics = self.topics();
        let names: Vec<String> = match &request.topics {
            Some(names) => names.clone(),
            None => {
                let mut names: Vec<String> = topics.keys().cloned().collect();
                names.sort();
                names
            }
        };

        let topics = names
            .into_iter()
            .map(|name| match topics.remove(&name) {
                Some(mut partitions) => {
                    partitions.sort_by_key(|p| p.id);
                    TopicMetadata {
                        topic: name,
                        error_code: ErrorCode::None,
                        partitions: partitions.iter().map(|p| self.partition_metadata(p)).collect(),
                    }
                }
                None => TopicMetadata {
                    topic: name,
                    error_code: ErrorCode::UnknownTopicOrPartition,
                    partitions: Vec::new(),
                },
            })
            .collect();

        MetadataResponse {
            brokers,
            controller_id,
            topics,
        }
    }

    fn partition_metadata(&self, partition: &Partition) -> PartitionMetadata {
        // The leader knows the live ISR; everyone else reports the committed one.
        let isr = self
            .replica_status(&partition.topic, partition.id)
            .filter(|status| status.role == ReplicaRole::Leader)
            .map(|status| status.isr)
            .unwrap_or_else(|| partition.isr.clone());

        PartitionMetadata {
            partition: partition.id,
            error_code: ErrorCode::None,
            leader: partition.leader.as_i32(),
            replicas: ids(&partition.replicas),
            isr: ids(&isr),
        }
    }

    async fn handle_create_topics(&self, requests: Vec<CreateTopicRequest>) -> Vec<TopicError> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let result = self
                .create_topic(&request.topic, request.num_partitions, request.replication_factor)
                .await;
            results.push(topic_error(request.topic, result));
        }
        results
    }

    async fn handle_delete_topics(&self, topics: Vec<String>) -> Vec<TopicError> {
        let mut results = Vec::with_capacity(topics.len());
        for topic in topics {
            let result = self.delete_topic(&topic).await;
            results.push(topic_error(topic, result));
        }
        results
    }

    fn handle_produce(&self, request: ProduceRequest) -> ProduceResponse {
        let ProduceRequest {
            topic,
            partition,
            records,
        } = request;
        let (error_code, base_offset) = match self.produce(&topic, partition, records) {
            Ok(offset) => (ErrorCode::None, offset.as_u64() as i64),
            Err(e) => {
                slog::debug!(self.logger, "Produce to {}-{} failed: {}", topic, partition, e);
                (e.code(), -1)
            }
        };

        ProduceResponse {
            topic,
            partition,
            error_code,
            base_offset,
        }
    }

    fn handle_fetch(&self, request: FetchRequest) -> FetchResponse {
        match self.fetch_records(&request) {
            Ok(batch) => FetchResponse {
                topic: request.topic,
                partition: request.partition,
                error_code: ErrorCode::None,
                high_watermark: batch.high_watermark.as_u64() as i64,
                records: batch.records,
            },
            Err(e) => FetchResponse {
                topic: request.topic,
                partition: request.partition,
                error_code: e.code(),
                high_watermark: -1,
                records: Vec::new(),
            },
        }
    }
}

fn api_versions() -> Vec<ApiVersion> {
    SUPPORTED_APIS
        .iter()
        .map(|&(api_key, min_version, max_version)| ApiVersion {
            api_key,
            min_version,
            max_version,
        })
        .collect()
}

fn topic_error(topic: String, result: Result<(), BrokerError>) -> TopicError {
    let error_code = match result {
        Ok(()) => ErrorCode::None,
        Err(e) => e.code(),
    };
    TopicError { topic, error_code }
}

fn ids(brokers: &[BrokerId]) -> Vec<i32> {
    brokers.iter().map(BrokerId::as_i32).collect()
}
