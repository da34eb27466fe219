//! Cluster membership domain.
//!
//! Tracks which peers make up the cluster, where to reach them, and how
//! alive they look. Each peer walks a small state machine (alive → suspect
//! → dead → removed) driven by gossip evidence and a periodic sweep, and a
//! node that restarts under a new network address is reconciled onto its
//! existing record instead of appearing as a new member.

pub mod config;
pub mod directory;
pub mod error;
pub mod models;
pub mod protocol;

pub use config::MembershipConfig;
pub use directory::PeerDirectory;
pub use error::{ClusterError, ClusterResult};
pub use models::{Evidence, MembershipUpdate, Peer, PeerDigest, PeerId, PeerState};
pub use protocol::{GossipTransport, MembershipProtocol};
