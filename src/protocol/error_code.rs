/// Kafka protocol error codes, as carried in response bodies.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorCode {
    None,
    Unknown,
    OffsetOutOfRange,
    UnknownTopicOrPartition,
    NotLeaderForPartition,
    InvalidTopic,
    TopicAlreadyExists,
    InvalidPartitions,
    InvalidReplicationFactor,
    NotController,
}

impl ErrorCode {
    pub fn code(&self) -> i16 {
        match self {
            ErrorCode::None => 0,
            ErrorCode::Unknown => -1,
            ErrorCode::OffsetOutOfRange => 1,
            ErrorCode::UnknownTopicOrPartition => 3,
            ErrorCode::NotLeaderForPartition => 6,
            ErrorCode::InvalidTopic => 17,
            ErrorCode::TopicAlreadyExists => 36,
            ErrorCode::InvalidPartitions => 37,
            ErrorCode::InvalidReplicationFactor => 38,
            ErrorCode::NotController => 41,
        }
    }

    pub fn is_error(&self) -> bool {
        *self != ErrorCode::None
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        ErrorCode::None
    }
}
