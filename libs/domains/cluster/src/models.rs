use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

/// Stable logical identity of a cluster member. Survives process restarts
/// and address changes.
pub type PeerId = Uuid;

/// Liveness state of a peer as seen from this node. A peer enters the
/// directory as `Alive` on first contact; the sweep demotes it through
/// `Suspect` and `Dead` when evidence dries up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PeerState {
    Alive,
    Suspect,
    Dead,
}

/// Cluster member record: stable identity plus the mutable bits (address,
/// liveness) that gossip keeps current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub id: PeerId,
    pub address: String,
    pub state: PeerState,
}

/// How we learned a peer is alive. Direct contact is authoritative for the
/// address; gossip is second-hand and only refreshes liveness and address
/// claims carried by the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evidence {
    DirectContact,
    Gossip,
}

/// State transitions a sweep pass produced, for observers (logging, metrics,
/// read-routing caches).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipUpdate {
    StateChanged {
        id: PeerId,
        from: PeerState,
        to: PeerState,
    },
    Removed {
        id: PeerId,
    },
}

/// One peer's entry in a gossip digest: the sender's current view of that
/// peer, compact enough to broadcast every interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerDigest {
    pub id: PeerId,
    pub address: String,
    pub state: PeerState,
}

impl From<&Peer> for PeerDigest {
    fn from(peer: &Peer) -> Self {
        Self {
            id: peer.id,
            address: peer.address.clone(),
            state: peer.state,
        }
    }
}
