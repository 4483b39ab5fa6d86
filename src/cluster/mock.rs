//! Scriptable providers for unit tests. Each call is recorded so tests can assert on invocation.
use crate::cluster::{
    ClusterMember, CommandSink, Consensus, ConsensusError, MemberChangeSink, MemberChangeSource, Membership,
    MembershipError,
};
use crate::metadata::{BrokerId, RaftCommand};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type BootstrapMembershipFn = Box<dyn Fn(&ClusterMember) -> Result<(), MembershipError> + Send + Sync>;
type JoinFn = Box<dyn Fn(&[String]) -> Result<usize, MembershipError> + Send + Sync>;
type MembersFn = Box<dyn Fn() -> Vec<ClusterMember> + Send + Sync>;
type MemberFn = Box<dyn Fn(BrokerId) -> Option<ClusterMember> + Send + Sync>;

pub(crate) struct MockMembership {
    pub(crate) bootstrap_fn: BootstrapMembershipFn,
    pub(crate) join_fn: JoinFn,
    pub(crate) members_fn: MembersFn,
    pub(crate) member_fn: MemberFn,
    pub(crate) bootstrap_invoked: AtomicUsize,
    pub(crate) join_invoked: AtomicUsize,
    pub(crate) member_invoked: AtomicUsize,
    pub(crate) shutdown_invoked: AtomicUsize,
    pub(crate) joined_addrs: Mutex<Vec<String>>,
    pub(crate) changes: Mutex<Option<MemberChangeSink>>,
}

impl Default for MockMembership {
    fn default() -> Self {
        MockMembership {
            bootstrap_fn: Box::new(|_| Ok(())),
            join_fn: Box::new(|addrs| Ok(addrs.len())),
            members_fn: Box::new(Vec::new),
            member_fn: Box::new(|_| None),
            bootstrap_invoked: AtomicUsize::new(0),
            join_invoked: AtomicUsize::new(0),
            member_invoked: AtomicUsize::new(0),
            shutdown_invoked: AtomicUsize::new(0),
            joined_addrs: Mutex::new(Vec::new()),
            changes: Mutex::new(None),
        }
    }
}

impl MockMembership {
    /// A membership that reports `ids` as its members, each at `localhost:{9090 + id}`.
    pub(crate) fn with_members(ids: &[i32]) -> Self {
        let members: Vec<ClusterMember> = ids.iter().map(|id| mock_member(*id)).collect();
        let lookup = members.clone();
        MockMembership {
            members_fn: Box::new(move || members.clone()),
            member_fn: Box::new(move |id| lookup.iter().find(|m| m.id == id).cloned()),
            ..MockMembership::default()
        }
    }
}

pub(crate) fn mock_member(id: i32) -> ClusterMember {
    ClusterMember::new(BrokerId(id), format!("localhost:{}", 9090 + id), format!("localhost:{}", 9190 + id))
}

#[async_trait::async_trait]
impl Membership for MockMembership {
    fn bootstrap(&self, me: ClusterMember, changes: MemberChangeSink) -> Result<(), MembershipError> {
        self.bootstrap_invoked.fetch_add(1, Ordering::SeqCst);
        (self.bootstrap_fn)(&me)?;
        *self.changes.lock().unwrap() = Some(changes);
        Ok(())
    }

    async fn join(&self, addrs: &[String]) -> Result<usize, MembershipError> {
        self.join_invoked.fetch_add(1, Ordering::SeqCst);
        self.joined_addrs.lock().unwrap().extend(addrs.iter().cloned());
        (self.join_fn)(addrs)
    }

    fn members(&self) -> Vec<ClusterMember> {
        (self.members_fn)()
    }

    fn member(&self, id: BrokerId) -> Option<ClusterMember> {
        self.member_invoked.fetch_add(1, Ordering::SeqCst);
        (self.member_fn)(id)
    }

    async fn shutdown(&self) -> Result<(), MembershipError> {
        self.shutdown_invoked.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

type AddrFn = Box<dyn Fn() -> String + Send + Sync>;
type BootstrapConsensusFn = Box<dyn Fn() -> Result<(), ConsensusError> + Send + Sync>;
type ApplyFn = Box<dyn Fn(&RaftCommand) -> Result<(), ConsensusError> + Send + Sync>;
type IsLeaderFn = Box<dyn Fn() -> bool + Send + Sync>;

pub(crate) struct MockConsensus {
    pub(crate) addr_fn: AddrFn,
    pub(crate) bootstrap_fn: BootstrapConsensusFn,
    pub(crate) apply_fn: ApplyFn,
    pub(crate) is_leader_fn: IsLeaderFn,
    pub(crate) bootstrap_invoked: AtomicUsize,
    pub(crate) shutdown_invoked: AtomicUsize,
    pub(crate) applied: Mutex<Vec<RaftCommand>>,
    /// The sink handed over at bootstrap. Tests push commands here to simulate commits.
    pub(crate) commands: Mutex<Option<CommandSink>>,
}

impl Default for MockConsensus {
    fn default() -> Self {
        MockConsensus {
            addr_fn: Box::new(|| "localhost:9093".to_string()),
            bootstrap_fn: Box::new(|| Ok(())),
            apply_fn: Box::new(|_| Ok(())),
            is_leader_fn: Box::new(|| true),
            bootstrap_invoked: AtomicUsize::new(0),
            shutdown_invoked: AtomicUsize::new(0),
            applied: Mutex::new(Vec::new()),
            commands: Mutex::new(None),
        }
    }
}

impl MockConsensus {
    pub(crate) fn applied(&self) -> Vec<RaftCommand> {
        self.applied.lock().unwrap().clone()
    }

    /// Delivers `command` to the broker as if it had been committed.
    pub(crate) fn commit(&self, command: RaftCommand) {
        let commands = self.commands.lock().unwrap();
        assert!(
            commands.as_ref().expect("bootstrap not invoked").notify_commit(command),
            "apply loop is gone"
        );
    }
}

#[async_trait::async_trait]
impl Consensus for MockConsensus {
    fn addr(&self) -> String {
        (self.addr_fn)()
    }

    fn bootstrap(
        &self,
        _membership: Arc<dyn Membership>,
        _changes: MemberChangeSource,
        commands: CommandSink,
    ) -> Result<(), ConsensusError> {
        self.bootstrap_invoked.fetch_add(1, Ordering::SeqCst);
        (self.bootstrap_fn)()?;
        *self.commands.lock().unwrap() = Some(commands);
        Ok(())
    }

    async fn apply(&self, command: RaftCommand) -> Result<(), ConsensusError> {
        self.applied.lock().unwrap().push(command.clone());
        (self.apply_fn)(&command)
    }

    fn is_leader(&self) -> bool {
        (self.is_leader_fn)()
    }

    async fn shutdown(&self) -> Result<(), ConsensusError> {
        self.shutdown_invoked.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
