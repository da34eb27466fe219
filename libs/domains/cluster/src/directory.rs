use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

use metrics::counter;
use tracing::{debug, info};

use crate::config::MembershipConfig;
use crate::models::{Evidence, MembershipUpdate, Peer, PeerId, PeerState};

#[derive(Debug)]
struct PeerRecord {
    peer: Peer,
    last_evidence: Instant,
    suspected_at: Option<Instant>,
    dead_at: Option<Instant>,
}

/// Shared view of cluster membership.
///
/// Mutations serialize per peer record, not globally: gossip receivers for
/// unrelated peers never contend, and readers take point-in-time snapshots
/// without blocking writers for longer than one record clone.
///
/// A peer keeps its logical identity across address changes. When a node
/// restarts under a new address and makes contact again, [`observe`] updates
/// the address on the existing record instead of minting a new peer, so the
/// directory never grows a duplicate entry plus a permanently dead ghost.
///
/// [`observe`]: PeerDirectory::observe
#[derive(Debug)]
pub struct PeerDirectory {
    config: MembershipConfig,
    peers: RwLock<HashMap<PeerId, Arc<Mutex<PeerRecord>>>>,
}

impl PeerDirectory {
    pub fn new(config: MembershipConfig) -> Self {
        Self {
            config,
            peers: RwLock::new(HashMap::new()),
        }
    }

    /// Record liveness evidence for a peer, reviving it to `alive` from any
    /// state and updating its address in place if it moved.
    pub fn observe(&self, id: PeerId, address: &str, evidence: Evidence) {
        self.observe_at(id, address, evidence, Instant::now());
    }

    pub fn observe_at(&self, id: PeerId, address: &str, evidence: Evidence, now: Instant) {
        let record = self.record(id, address, now);
        self.apply_evidence(&record, id, address, evidence, now);
    }

    fn apply_evidence(
        &self,
        record: &Arc<Mutex<PeerRecord>>,
        id: PeerId,
        address: &str,
        evidence: Evidence,
        now: Instant,
    ) {
        {
            let mut record = record.lock().unwrap_or_else(PoisonError::into_inner);

            if record.peer.address != address {
                info!(
                    peer = %id,
                    old = %record.peer.address,
                    new = %address,
                    "peer observed under a new address"
                );
                record.peer.address = address.to_string();
            }
            if record.peer.state != PeerState::Alive {
                debug!(peer = %id, from = %record.peer.state, ?evidence, "peer revived");
                counter!("cluster_peer_revivals_total").increment(1);
            }
            record.peer.state = PeerState::Alive;
            record.last_evidence = now;
            record.suspected_at = None;
            record.dead_at = None;
        }

        // A concurrent sweep may have expired the entry between the map
        // lookup and taking the record lock; put the revived record back so
        // the observation is not lost on an orphaned record.
        let present = self
            .peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id);
        if !present {
            let mut peers = self.peers.write().unwrap_or_else(PoisonError::into_inner);
            peers.entry(id).or_insert_with(|| Arc::clone(record));
        }
    }

    /// Demote and expire peers whose evidence has gone stale. Returns the
    /// transitions this pass produced; ordering between peers is unspecified.
    pub fn sweep(&self) -> Vec<MembershipUpdate> {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> Vec<MembershipUpdate> {
        let mut updates = Vec::new();
        let mut expired = Vec::new();

        let snapshot: Vec<(PeerId, Arc<Mutex<PeerRecord>>)> = {
            let peers = self.peers.read().unwrap_or_else(PoisonError::into_inner);
            peers.iter().map(|(id, rec)| (*id, Arc::clone(rec))).collect()
        };

        for (id, record) in snapshot {
            let mut record = record.lock().unwrap_or_else(PoisonError::into_inner);
            match record.peer.state {
                PeerState::Alive => {
                    if now.duration_since(record.last_evidence) >= self.config.liveness_interval {
                        record.peer.state = PeerState::Suspect;
                        record.suspected_at = Some(now);
                        updates.push(MembershipUpdate::StateChanged {
                            id,
                            from: PeerState::Alive,
                            to: PeerState::Suspect,
                        });
                    }
                }
                PeerState::Suspect => {
                    let suspected_at = record.suspected_at.unwrap_or(record.last_evidence);
                    if now.duration_since(suspected_at) >= self.config.suspicion_timeout {
                        record.peer.state = PeerState::Dead;
                        record.dead_at = Some(now);
                        updates.push(MembershipUpdate::StateChanged {
                            id,
                            from: PeerState::Suspect,
                            to: PeerState::Dead,
                        });
                    }
                }
                PeerState::Dead => {
                    let dead_at = record.dead_at.unwrap_or(record.last_evidence);
                    if now.duration_since(dead_at) >= self.config.removal_grace {
                        expired.push(id);
                    }
                }
            }
        }

        if !expired.is_empty() {
            let mut peers = self.peers.write().unwrap_or_else(PoisonError::into_inner);
            for id in expired {
                // A gossip receiver may have revived the peer between the
                // scan and this write lock.
                let still_dead = peers
                    .get(&id)
                    .map(|rec| {
                        rec.lock().unwrap_or_else(PoisonError::into_inner).peer.state
                            == PeerState::Dead
                    })
                    .unwrap_or(false);
                if still_dead {
                    peers.remove(&id);
                    info!(peer = %id, "peer removed after grace period");
                    counter!("cluster_peers_removed_total").increment(1);
                    updates.push(MembershipUpdate::Removed { id });
                }
            }
        }

        updates
    }

    /// Point-in-time snapshot of every tracked peer.
    pub fn list_peers(&self) -> Vec<Peer> {
        let peers = self.peers.read().unwrap_or_else(PoisonError::into_inner);
        peers
            .values()
            .map(|rec| rec.lock().unwrap_or_else(PoisonError::into_inner).peer.clone())
            .collect()
    }

    pub fn get(&self, id: PeerId) -> Option<Peer> {
        let peers = self.peers.read().unwrap_or_else(PoisonError::into_inner);
        peers
            .get(&id)
            .map(|rec| rec.lock().unwrap_or_else(PoisonError::into_inner).peer.clone())
    }

    /// Whether every expected peer is currently `alive`, at whatever address
    /// it holds now. This is the recovery contract after a disruption.
    pub fn recovered(&self, expected: &[PeerId]) -> bool {
        expected
            .iter()
            .all(|id| matches!(self.get(*id), Some(peer) if peer.state == PeerState::Alive))
    }

    pub fn len(&self) -> usize {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, id: PeerId, address: &str, now: Instant) -> Arc<Mutex<PeerRecord>> {
        {
            let peers = self.peers.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(record) = peers.get(&id) {
                return Arc::clone(record);
            }
        }
        let mut peers = self.peers.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(peers.entry(id).or_insert_with(|| {
            info!(peer = %id, %address, "peer joined");
            counter!("cluster_peers_joined_total").increment(1);
            Arc::new(Mutex::new(PeerRecord {
                peer: Peer {
                    id,
                    address: address.to_string(),
                    state: PeerState::Alive,
                },
                last_evidence: now,
                suspected_at: None,
                dead_at: None,
            }))
        }))
    }
}
