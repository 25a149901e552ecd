use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

pub type PersistResult<T> = Result<T, PersistError>;
