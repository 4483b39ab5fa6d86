use crate::commitlog::Record;
use crate::metadata::PartitionId;
use crate::protocol::ErrorCode;

#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub correlation_id: i32,
    pub body: ResponseBody,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
    ApiVersions(Vec<ApiVersion>),
    Metadata(MetadataResponse),
    CreateTopics(Vec<TopicError>),
    DeleteTopics(Vec<TopicError>),
    Produce(ProduceResponse),
    Fetch(FetchResponse),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ApiVersion {
    pub api_key: i16,
    pub min_version: i16,
    pub max_version: i16,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetadataResponse {
    pub brokers: Vec<BrokerMetadata>,
    /// -1 when the answering broker isn't the controller.
    pub controller_id: i32,
    pub topics: Vec<TopicMetadata>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BrokerMetadata {
    pub node_id: i32,
    pub addr: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TopicMetadata {
    pub topic: String,
    pub error_code: ErrorCode,
    pub partitions: Vec<PartitionMetadata>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PartitionMetadata {
    pub partition: PartitionId,
    pub error_code: ErrorCode,
    pub leader: i32,
    pub replicas: Vec<i32>,
    pub isr: Vec<i32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TopicError {
    pub topic: String,
    pub error_code: ErrorCode,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProduceResponse {
    pub topic: String,
    pub partition: PartitionId,
    pub error_code: ErrorCode,
    /// Offset of the first produced record, -1 on error.
    pub base_offset: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FetchResponse {
    pub topic: String,
    pub partition: PartitionId,
    pub error_code: ErrorCode,
    pub high_watermark: i64,
    pub records: Vec<Record>,
}
