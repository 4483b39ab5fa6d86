//! Typed client requests and responses, as they look once the wire codec has decoded them.
mod error_code;
mod request;
mod response;

pub use error_code::ErrorCode;
pub use request::CreateTopicRequest;
pub use request::FetchRequest;
pub use request::MetadataRequest;
pub use request::ProduceRequest;
pub use request::Request;
pub use request::RequestBody;
pub use response::ApiVersion;
pub use response::BrokerMetadata;
pub use response::FetchResponse;
pub use response::MetadataResponse;
pub use response::PartitionMetadata;
pub use response::ProduceResponse;
pub use response::Response;
pub use response::ResponseBody;
pub use response::TopicError;
pub use response::TopicMetadata;
