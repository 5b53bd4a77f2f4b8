//! # Session
//!
//! Streaming session lifecycle.
//!
//! Responsibilities:
//! - Start: allocate the session id, reset repositories, store the record,
//!   resolve a first node, spawn the dispatch worker and the sampler
//! - Stop: stop sampling, let the in-flight dispatch finish, finalize the record
//! - Session metadata stores (in-memory and JSON file)
//!
//! ## Usage Example
//!
//! ```ignore
//! use session::{open_store, SessionDeps, StreamingSession};
//!
//! let deps = SessionDeps::http(config.clone(), repos.clone(), open_store(&config.store))?;
//! let session = StreamingSession::start(deps, "morning walk").await?;
//! // ...
//! let stats = session.stop().await?;
//! println!("{stats}");
//! ```

mod error;
mod session;
mod stats;
mod store;
mod time;

pub use error::{Result, SessionError};
pub use session::{SessionDeps, SessionStatus, StartReport, StreamingSession};
pub use stats::SessionStats;
pub use store::{
    next_session_id, open_store, InMemorySessionStore, JsonFileSessionStore, SessionStore,
};
pub use time::{format_hms, total_secs};
