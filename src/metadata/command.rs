use crate::grpc::{ProtoCommandKind, ProtoPartition, ProtoRaftCommand};
use crate::metadata::Partition;
use bytes::Bytes;
use prost::Message;

/// The closed set of cluster mutations that travel through consensus.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CommandKind {
    CreatePartition,
    DeletePartition,
    /// Replaces leader, replica set and ISR of an existing partition.
    UpdatePartition,
}

/// RaftCommand is a tagged payload proposed by the controller and applied, in commit order, by
/// every broker. The payload is an encoded partition descriptor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RaftCommand {
    pub kind: CommandKind,
    pub payload: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed protobuf: {0}")]
    Malformed(#[from] prost::DecodeError),
    #[error("unknown command kind {0}")]
    UnknownKind(i32),
}

impl RaftCommand {
    pub fn create_partition(partition: &Partition) -> Self {
        Self::with_partition(CommandKind::CreatePartition, partition)
    }

    pub fn delete_partition(partition: &Partition) -> Self {
        Self::with_partition(CommandKind::DeletePartition, partition)
    }

    pub fn update_partition(partition: &Partition) -> Self {
        Self::with_partition(CommandKind::UpdatePartition, partition)
    }

    fn with_partition(kind: CommandKind, partition: &Partition) -> Self {
        RaftCommand {
            kind,
            payload: encode(&ProtoPartition::from(partition)),
        }
    }

    /// Decodes the payload as a partition descriptor.
    pub fn partition(&self) -> Result<Partition, DecodeError> {
        let proto = ProtoPartition::decode(self.payload.as_ref())?;
        Ok(Partition::from(proto))
    }

    /// Encodes the whole command, for consensus providers that persist raw bytes.
    pub fn to_bytes(&self) -> Bytes {
        encode(&ProtoRaftCommand {
            kind: ProtoCommandKind::from(self.kind) as i32,
            payload: self.payload.to_vec(),
        })
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        let proto = ProtoRaftCommand::decode(data)?;
        let kind = match ProtoCommandKind::from_i32(proto.kind) {
            Some(ProtoCommandKind::CreatePartition) => CommandKind::CreatePartition,
            Some(ProtoCommandKind::DeletePartition) => CommandKind::DeletePartition,
            Some(ProtoCommandKind::UpdatePartition) => CommandKind::UpdatePartition,
            Some(ProtoCommandKind::Unspecified) | None => return Err(DecodeError::UnknownKind(proto.kind)),
        };

        Ok(RaftCommand {
            kind,
            payload: Bytes::from(proto.payload),
        })
    }
}

impl From<CommandKind> for ProtoCommandKind {
    fn from(kind: CommandKind) -> Self {
        match kind {
            CommandKind::CreatePartition => ProtoCommandKind::CreatePartition,
            CommandKind::DeletePartition => ProtoCommandKind::DeletePartition,
            CommandKind::UpdatePartition => ProtoCommandKind::UpdatePartition,
        }
    }
}

fn encode<M: Message>(message: &M) -> Bytes {
    let mut buf = Vec::with_capacity(message.encoded_len());
    message
        .encode(&mut buf)
        .expect("Vec<u8> grows on demand, encoding cannot run out of capacity");
    Bytes::from(buf)
}
