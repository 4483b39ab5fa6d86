use crate::cluster::{CommandSink, MemberChangeSource, Membership};
use crate::metadata::RaftCommand;
use std::sync::Arc;

/// Consensus is the replicated, ordered command log. Its leader is the cluster controller.
#[async_trait::async_trait]
pub trait Consensus: Send + Sync {
    /// Address of the consensus transport. Empty means the provider is not reachable.
    fn addr(&self) -> String;

    /// Starts consensus. Membership changes arrive on `changes`; every committed command must be
    /// delivered to `commands` in commit order. Must not return before delivery is armed.
    fn bootstrap(
        &self,
        membership: Arc<dyn Membership>,
        changes: MemberChangeSource,
        commands: CommandSink,
    ) -> Result<(), ConsensusError>;

    /// Accepts `command` locally. Returning `Ok` does not mean the command is committed.
    async fn apply(&self, command: RaftCommand) -> Result<(), ConsensusError>;

    fn is_leader(&self) -> bool;

    async fn shutdown(&self) -> Result<(), ConsensusError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    #[error("consensus bootstrap failed: {0}")]
    Bootstrap(String),
    #[error("not the consensus leader")]
    NotLeader,
    #[error("command rejected: {0}")]
    Rejected(String),
    #[error("consensus has shut down")]
    Shutdown,
}
