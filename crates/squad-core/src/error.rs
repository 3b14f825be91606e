use thiserror::Error;

#[derive(Debug, Error)]
pub enum SquadError {
    #[error("invalid task status: {0}")]
    InvalidTaskStatus(String),

    #[error("invalid member status: {0}")]
    InvalidMemberStatus(String),

    #[error("invalid log scope '{0}': expected 'status' or 'all'")]
    InvalidLogScope(String),

    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SquadError>;
