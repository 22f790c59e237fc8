use thiserror::Error;
use uuid::Uuid;

pub type SentinelResult<T> = Result<T, SentinelError>;

#[derive(Error, Debug)]
pub enum SentinelError {
    /// The campaign was already unpublished when the transition was
    /// attempted. Expected under concurrency; not a defect.
    #[error("Campaign {0} is already unpublished")]
    AlreadyUnpublished(Uuid),

    /// The optimistic-lock version moved between read and write. Another
    /// caller won the race; expected under concurrency.
    #[error("Campaign {0} version mismatch on unpublish")]
    VersionMismatch(Uuid),

    #[error("Campaign {0} not found")]
    CampaignNotFound(Uuid),

    #[error("Campaign event {0} not found")]
    EventNotFound(Uuid),

    #[error("Invalid campaign canvas: {0}")]
    InvalidCanvas(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl SentinelError {
    /// True for the expected race outcomes of a concurrent unpublish.
    /// Callers log these at debug level and continue.
    pub fn is_race(&self) -> bool {
        matches!(
            self,
            SentinelError::AlreadyUnpublished(_) | SentinelError::VersionMismatch(_)
        )
    }
}
