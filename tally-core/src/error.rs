use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Mutations are only accepted once the initial load has finished.
    #[error("task store is still loading")]
    NotReady,

    #[error("invalid task: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
