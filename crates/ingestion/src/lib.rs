//! # Ingestion
//!
//! Sensor reading repositories.
//!
//! Responsibilities:
//! - Hold the latest reading per channel for each device (`SensorRepository`)
//! - Route driver writes to the owning device (`RepositorySet`)
//! - Abstract device drivers and provide a mock driver for tests
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{DeviceDriver, MockDriver, RepositorySet};
//! use contracts::Device;
//!
//! let repos = RepositorySet::new();
//! repos.set_connected(Device::Watch, true);
//!
//! let driver = MockDriver::with_defaults(Device::Watch);
//! driver.start(repos.callback_for(Device::Watch));
//!
//! let [band, watch, board] = repos.snapshot_all();
//! ```

mod driver;
mod error;
mod mock;
mod repository;
mod set;

// Re-exports
pub use driver::{DeviceDriver, ReadingCallback};
pub use error::{IngestionError, Result};
pub use mock::{MockDriver, MockDriverConfig};
pub use repository::SensorRepository;
pub use set::{RepositoryLease, RepositorySet};
