use crate::cluster::{ClusterMember, MemberChangeSink, MemberStatus, Membership, MembershipError};
use crate::metadata::BrokerId;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// StaticMembership is a membership provider backed by a member table that is configured up front
/// and changed by hand. There is no failure detection.
pub struct StaticMembership {
    logger: slog::Logger,
    members: Mutex<BTreeMap<BrokerId, ClusterMember>>,
    changes: Mutex<Option<MemberChangeSink>>,
}

impl StaticMembership {
    pub fn new(logger: slog::Logger, members: Vec<ClusterMember>) -> Self {
        StaticMembership {
            logger,
            members: Mutex::new(members.into_iter().map(|m| (m.id, m)).collect()),
            changes: Mutex::new(None),
        }
    }

    /// Adds or replaces a member and reports it as changed.
    pub fn add_member(&self, member: ClusterMember) {
        self.members
            .lock()
            .expect("StaticMembership.members mutex guard poison")
            .insert(member.id, member.clone());
        self.publish(member);
    }

    /// Removes a member and reports it as having left.
    pub fn remove_member(&self, id: BrokerId) -> Option<ClusterMember> {
        let mut removed = self
            .members
            .lock()
            .expect("StaticMembership.members mutex guard poison")
            .remove(&id)?;
        removed.status = MemberStatus::Left;
        self.publish(removed.clone());

        Some(removed)
    }

    fn publish(&self, member: ClusterMember) {
        let changes = self.changes.lock().expect("StaticMembership.changes mutex guard poison");
        if let Some(sink) = changes.as_ref() {
            if !sink.publish(member) {
                slog::warn!(self.logger, "Member change listener has disconnected.");
            }
        }
    }
}

#[async_trait::async_trait]
impl Membership for StaticMembership {
    fn bootstrap(&self, me: ClusterMember, changes: MemberChangeSink) -> Result<(), MembershipError> {
        let mut current = self.changes.lock().expect("StaticMembership.changes mutex guard poison");
        if current.is_some() {
            return Err(MembershipError::Bootstrap("already bootstrapped".into()));
        }

        let mut members = self.members.lock().expect("StaticMembership.members mutex guard poison");
        members.insert(me.id, me);
        for member in members.values() {
            changes.publish(member.clone());
        }
        slog::info!(self.logger, "Membership bootstrapped with {} members", members.len());

        *current = Some(changes);
        Ok(())
    }

    async fn join(&self, addrs: &[String]) -> Result<usize, MembershipError> {
        let members = self.members.lock().expect("StaticMembership.members mutex guard poison");
        let joined = addrs
            .iter()
            .filter(|addr| members.values().any(|m| &m.addr == *addr || &m.raft_addr == *addr))
            .count();

        if joined == 0 && !addrs.is_empty() {
            return Err(MembershipError::Join(format!("no known member at {:?}", addrs)));
        }

        Ok(joined)
    }

    fn members(&self) -> Vec<ClusterMember> {
        self.members
            .lock()
            .expect("StaticMembership.members mutex guard poison")
            .values()
            .cloned()
            .collect()
    }

    fn member(&self, id: BrokerId) -> Option<ClusterMember> {
        self.members
            .lock()
            .expect("StaticMembership.members mutex guard poison")
            .get(&id)
            .cloned()
    }

    async fn shutdown(&self) -> Result<(), MembershipError> {
        self.changes
            .lock()
            .expect("StaticMembership.changes mutex guard poison")
            .take();
        Ok(())
    }
}
