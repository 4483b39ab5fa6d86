use crate::metadata::BrokerId;

/// ClusterMember describes one broker as reported by the membership provider. It is a snapshot:
/// the provider may report a newer version of the same member at any time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClusterMember {
    pub id: BrokerId,
    /// Address for client and replication traffic.
    pub addr: String,
    /// Address of the member's consensus transport.
    pub raft_addr: String,
    pub status: MemberStatus,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MemberStatus {
    Alive,
    Leaving,
    Left,
    Failed,
}

impl ClusterMember {
    pub fn new(id: BrokerId, addr: impl Into<String>, raft_addr: impl Into<String>) -> Self {
        ClusterMember {
            id,
            addr: addr.into(),
            raft_addr: raft_addr.into(),
            status: MemberStatus::Alive,
        }
    }
}
