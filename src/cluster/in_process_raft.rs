use crate::cluster::{CommandSink, Consensus, ConsensusError, MemberChangeSource, Membership};
use crate::metadata::{BrokerId, RaftCommand};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// InProcessRaftGroup is a consensus log shared by brokers that live in the same process. It keeps
/// one ordered command log and hands every commit to every registered node, in the same order.
///
/// There is no election. The first node to bootstrap leads until it shuts down, after which the
/// lowest remaining id takes over.
#[derive(Clone, Default)]
pub struct InProcessRaftGroup {
    shared: Arc<Mutex<GroupState>>,
}

#[derive(Default)]
struct GroupState {
    log: Vec<RaftCommand>,
    nodes: BTreeMap<BrokerId, CommandSink>,
    leader: Option<BrokerId>,
}

impl InProcessRaftGroup {
    pub fn new() -> Self {
        InProcessRaftGroup::default()
    }

    /// Creates the consensus handle for one broker.
    pub fn node(&self, logger: slog::Logger, id: BrokerId, addr: impl Into<String>) -> InProcessRaft {
        InProcessRaft {
            logger: logger.new(slog::o!("raft_node" => id.as_i32())),
            id,
            addr: addr.into(),
            group: self.clone(),
        }
    }

    pub fn leader(&self) -> Option<BrokerId> {
        self.lock().leader
    }

    /// Moves leadership to a bootstrapped node. Returns false if `id` is not part of the group.
    pub fn transfer_leadership(&self, id: BrokerId) -> bool {
        let mut state = self.lock();
        if !state.nodes.contains_key(&id) {
            return false;
        }
        state.leader = Some(id);
        true
    }

    /// Every command committed so far, in commit order.
    pub fn committed(&self) -> Vec<RaftCommand> {
        self.lock().log.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GroupState> {
        self.shared.lock().expect("InProcessRaftGroup mutex guard poison")
    }
}

pub struct InProcessRaft {
    logger: slog::Logger,
    id: BrokerId,
    addr: String,
    group: InProcessRaftGroup,
}

#[async_trait::async_trait]
impl Consensus for InProcessRaft {
    fn addr(&self) -> String {
        self.addr.clone()
    }

    fn bootstrap(
        &self,
        membership: Arc<dyn Membership>,
        mut changes: MemberChangeSource,
        commands: CommandSink,
    ) -> Result<(), ConsensusError> {
        let mut state = self.group.lock();
        if state.nodes.contains_key(&self.id) {
            return Err(ConsensusError::Bootstrap(format!("node {} already bootstrapped", self.id)));
        }

        // Late joiners replay the whole log before seeing new commits.
        for command in state.log.iter() {
            commands.notify_commit(command.clone());
        }
        state.nodes.insert(self.id, commands);
        if state.leader.is_none() {
            state.leader = Some(self.id);
        }
        slog::info!(
            self.logger,
            "Bootstrapped. Leader: {:?}, known members: {}",
            state.leader,
            membership.members().len()
        );

        let logger = self.logger.clone();
        tokio::spawn(async move {
            while let Some(member) = changes.recv().await {
                slog::debug!(logger, "Member changed"; "member" => member.id.as_i32(), "status" => ?member.status);
            }
        });

        Ok(())
    }

    async fn apply(&self, command: RaftCommand) -> Result<(), ConsensusError> {
        let mut state = self.group.lock();
        if !state.nodes.contains_key(&self.id) {
            return Err(ConsensusError::Shutdown);
        }
        if state.leader != Some(self.id) {
            return Err(ConsensusError::NotLeader);
        }

        state.log.push(command.clone());
        for (id, sink) in state.nodes.iter() {
            if !sink.notify_commit(command.clone()) {
                slog::warn!(self.logger, "Commit stream of node {} has disconnected.", id);
            }
        }

        Ok(())
    }

    fn is_leader(&self) -> bool {
        self.group.lock().leader == Some(self.id)
    }

    async fn shutdown(&self) -> Result<(), ConsensusError> {
        let mut state = self.group.lock();
        state.nodes.remove(&self.id);
        if state.leader == Some(self.id) {
            state.leader = state.nodes.keys().next().copied();
            slog::info!(self.logger, "Stepped down. New leader: {:?}", state.leader);
        }

        Ok(())
    }
}
