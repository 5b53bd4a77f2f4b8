//! Session error types

use contracts::ContractError;
use dispatcher::DispatcherError;
use node_resolver::ResolveError;
use thiserror::Error;

/// Session lifecycle errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// Streaming needs at least one paired device
    #[error("no device connected, cannot start a session")]
    NoDeviceConnected,

    /// Another session is still sampling the same repositories
    #[error("a session is already streaming from these repositories")]
    SessionActive,

    /// Session store failure
    #[error(transparent)]
    Store(#[from] ContractError),

    /// Node client construction failure
    #[error(transparent)]
    Resolver(#[from] ResolveError),

    /// Uploader construction failure
    #[error(transparent)]
    Dispatcher(#[from] DispatcherError),
}

/// Session Result type alias
pub type Result<T> = std::result::Result<T, SessionError>;
