//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the telemetry dispatcher.
//! Business crates depend on this crate only, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Frames are stamped with UTC wall-clock time at sampling
//! - `tick` is a per-session sequence number, used for ordering/diagnostics

mod channel;
mod config;
mod error;
mod frame;
mod link;
mod node;
mod outcome;
mod session;
mod transport;

pub use channel::*;
pub use config::*;
pub use error::*;
pub use frame::*;
pub use link::{LinkSnapshot, LinkStatus};
pub use node::NodeAddress;
pub use outcome::*;
pub use session::*;
pub use transport::{
    FrameUploader, HealthCheck, LocalFrameUploader, LocalHealthCheck, LocalNodeDirectory,
    NodeDirectory,
};
