use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("gossip transport failed: {0}")]
    Transport(String),
}

pub type ClusterResult<T> = Result<T, ClusterError>;
