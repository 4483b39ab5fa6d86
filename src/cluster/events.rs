use crate::metadata::RaftCommand;
use crate::cluster::ClusterMember;
use tokio::sync::mpsc;

// Both streams follow the same shape: the provider that produces events owns the sink, the single
// consumer owns the source. Dropping the sink ends the source.

pub fn member_changes() -> (MemberChangeSink, MemberChangeSource) {
    let (tx, rx) = mpsc::unbounded_channel();

    (MemberChangeSink { sender: tx }, MemberChangeSource { receiver: rx })
}

/// Written by the membership provider whenever a member joins, leaves or changes address.
#[derive(Clone)]
pub struct MemberChangeSink {
    sender: mpsc::UnboundedSender<ClusterMember>,
}

impl MemberChangeSink {
    /// Returns false once the source has been dropped.
    pub fn publish(&self, member: ClusterMember) -> bool {
        self.sender.send(member).is_ok()
    }
}

/// Read by the consensus provider to track voters.
pub struct MemberChangeSource {
    receiver: mpsc::UnboundedReceiver<ClusterMember>,
}

impl MemberChangeSource {
    pub async fn recv(&mut self) -> Option<ClusterMember> {
        self.receiver.recv().await
    }
}

pub fn command_stream() -> (CommandSink, CommandStream) {
    let (tx, rx) = mpsc::unbounded_channel();

    (CommandSink { sender: tx }, CommandStream { receiver: rx })
}

/// Written by the consensus provider, in commit order.
#[derive(Clone)]
pub struct CommandSink {
    sender: mpsc::UnboundedSender<RaftCommand>,
}

impl CommandSink {
    /// Returns false once the broker's apply loop has gone away.
    pub fn notify_commit(&self, command: RaftCommand) -> bool {
        self.sender.send(command).is_ok()
    }
}

/// Drained by the broker's apply loop.
pub struct CommandStream {
    receiver: mpsc::UnboundedReceiver<RaftCommand>,
}

impl CommandStream {
    pub async fn recv(&mut self) -> Option<RaftCommand> {
        self.receiver.recv().await
    }
}
