//! Node resolver error types

use contracts::LinkError;
use thiserror::Error;

/// Node resolver error
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No healthy node after the allowed number of candidate attempts
    #[error("no healthy node after {attempts} attempt(s): {last}")]
    Unavailable {
        attempts: u8,
        #[source]
        last: LinkError,
    },

    /// HTTP client could not be constructed
    #[error("failed to build http client: {message}")]
    ClientBuild { message: String },
}

impl ResolveError {
    pub fn unavailable(attempts: u8, last: LinkError) -> Self {
        Self::Unavailable { attempts, last }
    }

    /// Last transport error, if resolution reached the network
    pub fn last_link_error(&self) -> Option<&LinkError> {
        match self {
            Self::Unavailable { last, .. } => Some(last),
            Self::ClientBuild { .. } => None,
        }
    }
}

/// Node resolver Result type alias
pub type Result<T> = std::result::Result<T, ResolveError>;
