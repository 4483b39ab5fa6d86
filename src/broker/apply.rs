use crate::broker::Broker;
use crate::cluster::CommandStream;
use crate::metadata::{CommandKind, RaftCommand};
use crate::replicator::StopCheck;
use std::sync::Weak;

/// Applies committed commands, in commit order, until shutdown or until consensus drops the
/// stream. Failures are logged: a committed command cannot be refused.
pub(super) async fn apply_loop(
    logger: slog::Logger,
    broker: Weak<Broker>,
    mut commands: CommandStream,
    mut shutdown: StopCheck,
) {
    loop {
        let command = tokio::select! {
            biased;
            _ = shutdown.stopped() => break,
            command = commands.recv() => match command {
                Some(command) => command,
                None => {
                    slog::info!(logger, "Commit stream closed");
                    break;
                }
            },
        };

        let broker = match broker.upgrade() {
            Some(broker) => broker,
            None => break,
        };
        broker.apply_command(command).await;
    }
    slog::debug!(logger, "Apply loop exited");
}

impl Broker {
    async fn apply_command(&self, command: RaftCommand) {
        let partition = match command.partition() {
            Ok(partition) => partition,
            Err(e) => {
                slog::error!(self.logger, "Failed to decode {:?} command: {}", command.kind, e);
                return;
            }
        };
        slog::debug!(self.logger, "Applying {:?} for {}", command.kind, partition.key());

        match command.kind {
            CommandKind::CreatePartition => {
                if let Err(e) = self.start_replica(partition.clone()).await {
                    slog::error!(self.logger, "Failed to start replica {}: {}", partition.key(), e);
                }
            }
            CommandKind::UpdatePartition => {
                if self.partition(&partition.topic, partition.id).is_err() {
                    slog::warn!(self.logger, "Update for unknown partition {}", partition.key());
                    return;
                }
                if let Err(e) = self.start_replica(partition.clone()).await {
                    slog::error!(self.logger, "Failed to update replica {}: {}", partition.key(), e);
                }
            }
            CommandKind::DeletePartition => self.remove_partition(&partition.topic, partition.id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::broker::fixtures::{eventually, new_broker, partition, Fixture};
    use crate::cluster::{MockConsensus, MockMembership};
    use crate::metadata::{BrokerId, RaftCommand};
    use crate::replicator::ReplicaRole;
    use bytes::Bytes;

    #[tokio::test]
    async fn committed_create_starts_replica() {
        let fixture = Fixture::new();
        let broker = new_broker(&fixture).unwrap();

        fixture
            .consensus
            .commit(RaftCommand::create_partition(&partition("the-topic", 1, 1, &[1])));

        eventually(|| broker.replica_status("the-topic", 1).is_some()).await;
        assert_eq!(broker.replica_status("the-topic", 1).unwrap().role, ReplicaRole::Leader);
    }

    #[tokio::test]
    async fn committed_delete_removes_partition() {
        let fixture = Fixture::new();
        let broker = new_broker(&fixture).unwrap();
        let partition = partition("the-topic", 1, 1, &[1]);

        fixture.consensus.commit(RaftCommand::create_partition(&partition));
        fixture.consensus.commit(RaftCommand::delete_partition(&partition));

        eventually(|| broker.topics().is_empty() && broker.replica_status("the-topic", 1).is_none()).await;
    }

    #[tokio::test]
    async fn committed_update_moves_leadership() {
        let fixture = Fixture::with_providers(MockMembership::with_members(&[1, 2]), MockConsensus::default());
        let broker = new_broker(&fixture).unwrap();

        fixture
            .consensus
            .commit(RaftCommand::create_partition(&partition("topic", 0, 1, &[1, 2])));
        fixture
            .consensus
            .commit(RaftCommand::update_partition(&partition("topic", 0, 2, &[1, 2])));

        eventually(|| {
            broker.replica_status("topic", 0).map(|status| status.role)
                == Some(ReplicaRole::Follower { leader: BrokerId(2) })
        })
        .await;
        assert_eq!(broker.partition("topic", 0).unwrap().leader, BrokerId(2));
    }

    #[tokio::test]
    async fn update_of_unknown_partition_is_ignored() {
        let fixture = Fixture::new();
        let broker = new_broker(&fixture).unwrap();

        fixture
            .consensus
            .commit(RaftCommand::update_partition(&partition("ghost", 0, 1, &[1])));
        // Commands apply in order, so once this one shows up the update has been handled.
        fixture
            .consensus
            .commit(RaftCommand::create_partition(&partition("marker", 0, 1, &[1])));

        eventually(|| broker.replica_status("marker", 0).is_some()).await;
        assert!(broker.partition("ghost", 0).is_err());
    }

    #[tokio::test]
    async fn malformed_command_is_skipped() {
        let fixture = Fixture::new();
        let broker = new_broker(&fixture).unwrap();
        let mut garbage = RaftCommand::create_partition(&partition("x", 0, 1, &[1]));
        garbage.payload = Bytes::from_static(&[0xff, 0xff, 0xff]);

        fixture.consensus.commit(garbage);
        fixture
            .consensus
            .commit(RaftCommand::create_partition(&partition("after", 0, 1, &[1])));

        eventually(|| broker.replica_status("after", 0).is_some()).await;
        assert!(broker.partition("x", 0).is_err());
    }

    #[tokio::test]
    async fn shutdown_stops_applying() {
        let fixture = Fixture::new();
        let broker = new_broker(&fixture).unwrap();

        broker.shutdown().await.unwrap();

        // The stream's receiver is gone once the loop exits.
        let commands = fixture.consensus.commands.lock().unwrap();
        assert!(!commands
            .as_ref()
            .unwrap()
            .notify_commit(RaftCommand::create_partition(&partition("late", 0, 1, &[1]))));
    }
}
