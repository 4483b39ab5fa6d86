use crate::metadata::PartitionId;
use bytes::Bytes;

/// Request is one decoded client request. The wire codec that produces it lives outside this
/// crate.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub correlation_id: i32,
    pub body: RequestBody,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    ApiVersions,
    Metadata(MetadataRequest),
    CreateTopics(Vec<CreateTopicRequest>),
    DeleteTopics(Vec<String>),
    Produce(ProduceRequest),
    Fetch(FetchRequest),
}

impl RequestBody {
    pub fn api_key(&self) -> i16 {
        match self {
            RequestBody::Produce(_) => 0,
            RequestBody::Fetch(_) => 1,
            RequestBody::Metadata(_) => 3,
            RequestBody::ApiVersions => 18,
            RequestBody::CreateTopics(_) => 19,
            RequestBody::DeleteTopics(_) => 20,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetadataRequest {
    /// `None` asks for every topic.
    pub topics: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateTopicRequest {
    pub topic: String,
    pub num_partitions: i32,
    pub replication_factor: i16,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProduceRequest {
    pub topic: String,
    pub partition: PartitionId,
    pub records: Vec<Bytes>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FetchRequest {
    pub topic: String,
    pub partition: PartitionId,
    pub offset: u64,
    pub max_records: u32,
    /// Broker id of a fetching follower, or -1 for a consumer.
    pub replica_id: i32,
}

impl FetchRequest {
    pub fn is_from_follower(&self) -> bool {
        self.replica_id >= 0
    }
}
