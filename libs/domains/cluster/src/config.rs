use std::time::Duration;

/// Timing knobs for the membership state machine and the gossip loop.
#[derive(Debug, Clone)]
pub struct MembershipConfig {
    /// How long a peer may go without evidence before it turns suspect.
    pub liveness_interval: Duration,
    /// How long a suspect peer gets to produce fresh evidence before it is
    /// declared dead.
    pub suspicion_timeout: Duration,
    /// How long a dead peer lingers in the directory before removal.
    pub removal_grace: Duration,
    /// How often the protocol broadcasts its digest and sweeps the directory.
    pub gossip_interval: Duration,
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            liveness_interval: Duration::from_secs(5),
            suspicion_timeout: Duration::from_secs(10),
            removal_grace: Duration::from_secs(60),
            gossip_interval: Duration::from_secs(1),
        }
    }
}

impl MembershipConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            liveness_interval: env_millis("CLUSTER_LIVENESS_INTERVAL_MS")
                .unwrap_or(defaults.liveness_interval),
            suspicion_timeout: env_millis("CLUSTER_SUSPICION_TIMEOUT_MS")
                .unwrap_or(defaults.suspicion_timeout),
            removal_grace: env_millis("CLUSTER_REMOVAL_GRACE_MS")
                .unwrap_or(defaults.removal_grace),
            gossip_interval: env_millis("CLUSTER_GOSSIP_INTERVAL_MS")
                .unwrap_or(defaults.gossip_interval),
        }
    }

    pub fn with_liveness_interval(mut self, interval: Duration) -> Self {
        self.liveness_interval = interval;
        self
    }

    pub fn with_suspicion_timeout(mut self, timeout: Duration) -> Self {
        self.suspicion_timeout = timeout;
        self
    }

    pub fn with_removal_grace(mut self, grace: Duration) -> Self {
        self.removal_grace = grace;
        self
    }

    pub fn with_gossip_interval(mut self, interval: Duration) -> Self {
        self.gossip_interval = interval;
        self
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
}
