use crate::cluster::{ClusterMember, MemberChangeSink};
use crate::metadata::BrokerId;

/// Membership is the gossip-style group membership the broker runs on top of.
#[async_trait::async_trait]
pub trait Membership: Send + Sync {
    /// Starts membership for `me`. Must not return before change events can flow into `changes`.
    fn bootstrap(&self, me: ClusterMember, changes: MemberChangeSink) -> Result<(), MembershipError>;

    /// Contacts the given addresses and returns how many of them were joined.
    async fn join(&self, addrs: &[String]) -> Result<usize, MembershipError>;

    /// Members currently known, ordered by id.
    fn members(&self) -> Vec<ClusterMember>;

    fn member(&self, id: BrokerId) -> Option<ClusterMember>;

    async fn shutdown(&self) -> Result<(), MembershipError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    #[error("membership bootstrap failed: {0}")]
    Bootstrap(String),
    #[error("failed to join cluster: {0}")]
    Join(String),
    #[error("membership shutdown failed: {0}")]
    Shutdown(String),
}
