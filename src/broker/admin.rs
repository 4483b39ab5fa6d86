use crate::broker::{Broker, BrokerError};
use crate::cluster::MemberStatus;
use crate::metadata::{assign_replicas, is_valid_topic_name, BrokerId, Partition, RaftCommand};
use rand::Rng;

// Topic administration. Everything here only proposes commands; the store changes once they come
// back through the apply loop.
impl Broker {
    /// Assigns `num_partitions` partitions round-robin over the alive cluster members and
    /// proposes each one. Proposals are independent: on failure the rest are still proposed and
    /// the first error is returned.
    pub async fn create_topic(
        &self,
        topic: &str,
        num_partitions: i32,
        replication_factor: i16,
    ) -> Result<(), BrokerError> {
        self.ensure_controller()?;
        if !is_valid_topic_name(topic) {
            return Err(BrokerError::InvalidTopic(topic.to_string()));
        }
        if self.lock_state().store.contains_topic(topic) {
            return Err(BrokerError::TopicAlreadyExists(topic.to_string()));
        }

        let mut members: Vec<BrokerId> = self
            .cluster_members()
            .into_iter()
            .filter(|member| member.status == MemberStatus::Alive)
            .map(|member| member.id)
            .collect();
        members.sort();
        members.dedup();
        let start_offset = if members.is_empty() {
            0
        } else {
            rand::thread_rng().gen_range(0..members.len())
        };

        let partitions = assign_replicas(topic, num_partitions, replication_factor, &members, start_offset)?;
        slog::info!(
            self.logger,
            "Creating topic '{}' with {} partitions, replication factor {}",
            topic,
            num_partitions,
            replication_factor
        );

        let mut first_error = None;
        for partition in partitions {
            if let Err(e) = self.create_partition(&partition).await {
                slog::warn!(self.logger, "Failed to propose partition {}: {}", partition.key(), e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Proposes a create-partition command. Returns once consensus accepted it locally.
    pub async fn create_partition(&self, partition: &Partition) -> Result<(), BrokerError> {
        self.consensus
            .apply(RaftCommand::create_partition(partition))
            .await
            .map_err(BrokerError::unknown)
    }

    /// Proposes deletion of every partition of `topic`. Like creation, a failed proposal does not
    /// stop the rest; the first error is returned.
    pub async fn delete_topic(&self, topic: &str) -> Result<(), BrokerError> {
        self.ensure_controller()?;
        let partitions = self.topic_partitions(topic)?;
        slog::info!(self.logger, "Deleting topic '{}'", topic);

        let mut first_error = None;
        for partition in &partitions {
            if let Err(e) = self.delete_partitions(partition).await {
                slog::warn!(self.logger, "Failed to propose deletion of {}: {}", partition.key(), e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub async fn delete_partitions(&self, partition: &Partition) -> Result<(), BrokerError> {
        self.ensure_controller()?;
        self.consensus
            .apply(RaftCommand::delete_partition(partition))
            .await
            .map_err(BrokerError::unknown)
    }

    /// Proposes a new leader, replica set or ISR for an existing partition.
    pub async fn update_partition(&self, partition: &Partition) -> Result<(), BrokerError> {
        self.ensure_controller()?;
        self.partition(&partition.topic, partition.id)?;
        self.consensus
            .apply(RaftCommand::update_partition(partition))
            .await
            .map_err(BrokerError::unknown)
    }

    fn ensure_controller(&self) -> Result<(), BrokerError> {
        if self.is_controller() {
            Ok(())
        } else {
            Err(BrokerError::NotController)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::fixtures::{new_broker, partition, Fixture};
    use crate::cluster::{ConsensusError, MockConsensus, MockMembership};
    use crate::metadata::CommandKind;

    fn not_controller() -> MockConsensus {
        MockConsensus {
            is_leader_fn: Box::new(|| false),
            ..MockConsensus::default()
        }
    }

    #[tokio::test]
    async fn create_partition_proposes_matching_payload() {
        let fixture = Fixture::new();
        let broker = new_broker(&fixture).unwrap();
        let partition = partition("the-topic", 1, 1, &[1]);

        broker.create_partition(&partition).await.unwrap();

        let applied = fixture.consensus.applied();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].kind, CommandKind::CreatePartition);
        assert_eq!(applied[0].partition().unwrap(), partition);
    }

    #[tokio::test]
    async fn create_partition_failure_is_unknown() {
        let fixture = Fixture::with_providers(
            MockMembership::default(),
            MockConsensus {
                apply_fn: Box::new(|_| Err(ConsensusError::NotLeader)),
                ..MockConsensus::default()
            },
        );
        let broker = new_broker(&fixture).unwrap();

        let result = broker.create_partition(&partition("the-topic", 1, 1, &[1])).await;

        assert!(matches!(result, Err(BrokerError::Unknown(_))));
    }

    #[tokio::test]
    async fn create_topic_assigns_round_robin() {
        let fixture = Fixture::with_providers(MockMembership::with_members(&[3, 1, 2]), MockConsensus::default());
        let broker = new_broker(&fixture).unwrap();

        broker.create_topic("topic", 4, 2).await.unwrap();

        let partitions: Vec<Partition> = fixture
            .consensus
            .applied()
            .iter()
            .map(|command| command.partition().unwrap())
            .collect();
        assert_eq!(partitions.len(), 4);
        let leaders: Vec<i32> = partitions.iter().map(|p| p.leader.as_i32()).collect();
        // Whatever the random start, leaders rotate through the sorted member list.
        for (i, pair) in leaders.windows(2).enumerate() {
            assert_eq!(pair[1], pair[0] % 3 + 1, "partition {} leaders {:?}", i, leaders);
        }
        for partition in &partitions {
            assert_eq!(partition.replicas.len(), 2);
            assert_ne!(partition.replicas[0], partition.replicas[1]);
            assert_eq!(partition.replicas[0], partition.leader);
        }
    }

    #[tokio::test]
    async fn create_topic_requires_controller() {
        let fixture = Fixture::with_providers(MockMembership::with_members(&[1]), not_controller());
        let broker = new_broker(&fixture).unwrap();

        assert!(matches!(
            broker.create_topic("topic", 1, 1).await,
            Err(BrokerError::NotController)
        ));
        assert!(fixture.consensus.applied().is_empty());
    }

    #[tokio::test]
    async fn create_topic_rejects_impossible_replication_factor() {
        let fixture = Fixture::with_providers(MockMembership::with_members(&[1, 2]), MockConsensus::default());
        let broker = new_broker(&fixture).unwrap();

        assert!(matches!(
            broker.create_topic("topic", 1, 3).await,
            Err(BrokerError::InvalidReplicationFactor { requested: 3, available: 2 })
        ));
        assert!(matches!(
            broker.create_topic("topic", 0, 1).await,
            Err(BrokerError::InvalidPartitions(0))
        ));
    }

    #[tokio::test]
    async fn create_topic_rejects_unsafe_names() {
        let fixture = Fixture::with_providers(MockMembership::with_members(&[1]), MockConsensus::default());
        let broker = new_broker(&fixture).unwrap();
        let too_long = "t".repeat(250);

        for topic in &["", ".", "..", "../escape", "/tmp/victim", "a b", too_long.as_str()] {
            assert!(
                matches!(broker.create_topic(topic, 1, 1).await, Err(BrokerError::InvalidTopic(_))),
                "topic {:?}",
                topic
            );
        }
        assert!(fixture.consensus.applied().is_empty());
        assert_eq!(
            BrokerError::InvalidTopic("..".into()).code(),
            crate::protocol::ErrorCode::InvalidTopic
        );
    }

    #[tokio::test]
    async fn create_existing_topic_fails() {
        let fixture = Fixture::with_providers(MockMembership::with_members(&[1]), MockConsensus::default());
        let broker = new_broker(&fixture).unwrap();
        broker.insert_partitions(vec![partition("topic", 0, 1, &[1])]);

        assert!(matches!(
            broker.create_topic("topic", 1, 1).await,
            Err(BrokerError::TopicAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn create_topic_proposes_all_and_returns_first_error() {
        let fixture = Fixture::with_providers(
            MockMembership::with_members(&[1, 2]),
            MockConsensus {
                apply_fn: Box::new(|command| match command.partition() {
                    Ok(partition) if partition.id == 1 => Err(ConsensusError::Rejected("mock".into())),
                    _ => Ok(()),
                }),
                ..MockConsensus::default()
            },
        );
        let broker = new_broker(&fixture).unwrap();

        let result = broker.create_topic("topic", 3, 1).await;

        assert!(matches!(result, Err(BrokerError::Unknown(_))));
        assert_eq!(fixture.consensus.applied().len(), 3);
    }

    #[tokio::test]
    async fn delete_topic_proposes_every_partition() {
        let fixture = Fixture::new();
        let broker = new_broker(&fixture).unwrap();
        broker.insert_partitions(vec![partition("topic", 0, 1, &[1]), partition("topic", 1, 1, &[1])]);

        broker.delete_topic("topic").await.unwrap();

        let applied = fixture.consensus.applied();
        assert_eq!(applied.len(), 2);
        assert!(applied.iter().all(|c| c.kind == CommandKind::DeletePartition));
        let ids: Vec<i32> = applied.iter().map(|c| c.partition().unwrap().id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[tokio::test]
    async fn delete_topic_proposes_all_and_returns_first_error() {
        let fixture = Fixture::with_providers(
            MockMembership::default(),
            MockConsensus {
                apply_fn: Box::new(|command| match command.partition() {
                    Ok(partition) if partition.id == 0 => Err(ConsensusError::Rejected("mock".into())),
                    _ => Ok(()),
                }),
                ..MockConsensus::default()
            },
        );
        let broker = new_broker(&fixture).unwrap();
        broker.insert_partitions(vec![
            partition("topic", 0, 1, &[1]),
            partition("topic", 1, 1, &[1]),
            partition("topic", 2, 1, &[1]),
        ]);

        let result = broker.delete_topic("topic").await;

        assert!(matches!(result, Err(BrokerError::Unknown(_))));
        assert_eq!(fixture.consensus.applied().len(), 3);
    }

    #[tokio::test]
    async fn delete_unknown_topic_fails() {
        let fixture = Fixture::new();
        let broker = new_broker(&fixture).unwrap();

        assert!(matches!(
            broker.delete_topic("missing").await,
            Err(BrokerError::UnknownTopicOrPartition)
        ));
    }

    #[tokio::test]
    async fn delete_partitions_requires_controller() {
        let fixture = Fixture::with_providers(MockMembership::default(), not_controller());
        let broker = new_broker(&fixture).unwrap();

        assert!(matches!(
            broker.delete_partitions(&partition("topic", 0, 1, &[1])).await,
            Err(BrokerError::NotController)
        ));
    }

    #[tokio::test]
    async fn update_partition_requires_known_partition() {
        let fixture = Fixture::new();
        let broker = new_broker(&fixture).unwrap();
        let moved = partition("topic", 0, 2, &[1, 2]);

        assert!(matches!(
            broker.update_partition(&moved).await,
            Err(BrokerError::UnknownTopicOrPartition)
        ));

        broker.insert_partitions(vec![partition("topic", 0, 1, &[1, 2])]);
        broker.update_partition(&moved).await.unwrap();

        let applied = fixture.consensus.applied();
        assert_eq!(applied[0].kind, CommandKind::UpdatePartition);
        assert_eq!(applied[0].partition().unwrap(), moved);
    }
}
