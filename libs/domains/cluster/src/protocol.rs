use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::config::MembershipConfig;
use crate::directory::PeerDirectory;
use crate::error::ClusterResult;
use crate::models::{Evidence, MembershipUpdate, PeerDigest, PeerId, PeerState};

/// Outbound side of gossip: how a digest reaches the other members.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GossipTransport: Send + Sync {
    async fn broadcast(&self, digest: &[PeerDigest]) -> ClusterResult<()>;
}

/// Background membership maintenance: periodically broadcasts this node's
/// view of the cluster, folds inbound digests into the directory, and sweeps
/// stale peers through the suspect/dead/removed transitions.
///
/// Runs orthogonally to the data path. Nothing here ever blocks an object
/// write; the lifecycle manager reads the directory through non-blocking
/// snapshots and tolerates staleness of one gossip interval.
pub struct MembershipProtocol {
    directory: Arc<PeerDirectory>,
    transport: Arc<dyn GossipTransport>,
    config: MembershipConfig,
}

impl MembershipProtocol {
    pub fn new(
        directory: Arc<PeerDirectory>,
        transport: Arc<dyn GossipTransport>,
        config: MembershipConfig,
    ) -> Self {
        Self {
            directory,
            transport,
            config,
        }
    }

    pub fn directory(&self) -> &Arc<PeerDirectory> {
        &self.directory
    }

    /// Fold an inbound digest into the directory.
    ///
    /// The sender contacted us, so its own entry counts as direct evidence
    /// at the address it spoke from. Entries the sender believes `alive`
    /// count as gossip evidence; `suspect` and `dead` claims are ignored,
    /// our own sweep reaches those verdicts from local silence.
    #[instrument(skip(self, digest), fields(sender = %sender, entries = digest.len()))]
    pub fn handle_digest(&self, sender: PeerId, sender_address: &str, digest: &[PeerDigest]) {
        self.directory
            .observe(sender, sender_address, Evidence::DirectContact);
        for entry in digest {
            if entry.id == sender {
                continue;
            }
            if entry.state == PeerState::Alive {
                self.directory
                    .observe(entry.id, &entry.address, Evidence::Gossip);
            }
        }
    }

    /// This node's current view, ready to broadcast.
    pub fn digest(&self) -> Vec<PeerDigest> {
        self.directory
            .list_peers()
            .iter()
            .map(PeerDigest::from)
            .collect()
    }

    /// Gossip loop: sweep, broadcast, sleep, until cancelled. Transport
    /// failures are logged and retried next interval rather than tearing the
    /// loop down.
    pub async fn run(&self, cancel: &CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.gossip_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = cancel.cancelled() => {
                    debug!("membership protocol stopping");
                    return;
                }
            }

            for update in self.directory.sweep() {
                match update {
                    MembershipUpdate::StateChanged { id, from, to } => {
                        debug!(peer = %id, %from, %to, "peer state changed");
                    }
                    MembershipUpdate::Removed { id } => {
                        debug!(peer = %id, "peer expired from directory");
                    }
                }
            }

            let digest = self.digest();
            if digest.is_empty() {
                continue;
            }
            if let Err(err) = self.transport.broadcast(&digest).await {
                warn!(error = %err, "gossip broadcast failed");
            }
        }
    }
}
