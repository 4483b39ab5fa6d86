//! The broker's view of its two external collaborators, membership and consensus, plus the
//! providers that ship with this crate.
mod consensus;
mod events;
mod in_process_raft;
mod member;
mod membership;
mod static_membership;

#[cfg(test)]
mod mock;

pub use consensus::Consensus;
pub use consensus::ConsensusError;
pub use events::CommandSink;
pub use events::CommandStream;
pub use events::MemberChangeSink;
pub use events::MemberChangeSource;
pub use in_process_raft::InProcessRaft;
pub use in_process_raft::InProcessRaftGroup;
pub use member::ClusterMember;
pub use member::MemberStatus;
pub use membership::Membership;
pub use membership::MembershipError;
pub use static_membership::StaticMembership;

pub(crate) use events::command_stream;
pub(crate) use events::member_changes;

#[cfg(test)]
pub(crate) use mock::{mock_member, MockConsensus, MockMembership};
