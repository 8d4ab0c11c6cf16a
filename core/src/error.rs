use thiserror::Error;

use crate::graph::UserId;

pub type Result<T> = std::result::Result<T, GraphError>;

/// Failure outcomes of graph operations.
///
/// None of these are fatal: a failed mutation leaves the store untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("user {0} not found")]
    NotFound(UserId),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An analytic ran to completion and found nothing (no path, no candidates).
    #[error("no result: {0}")]
    NoResult(&'static str),
}
