//! # Node Resolver
//!
//! Locates a healthy ingestion node through the directory service.
//!
//! Responsibilities:
//! - Ask the directory for a candidate node and health-check it
//! - Retry the directory once when the candidate is unhealthy
//! - Re-validate a known node with a single health check
//! - Provide HTTP and scripted mock clients
//!
//! ## Usage Example
//!
//! ```ignore
//! use node_resolver::{HttpNodeClient, NodeResolver};
//!
//! let client = HttpNodeClient::new(config.directory.clone(), config.node.clone())?;
//! let resolver = NodeResolver::new(Arc::new(client), link.clone());
//! let node = resolver.resolve().await?;
//! ```

pub mod error;
pub mod http_client;
pub mod mock_client;
pub mod resolver;

pub use error::{ResolveError, Result};
pub use http_client::HttpNodeClient;
pub use mock_client::{DirectoryAnswer, MockNodeClient};
pub use resolver::{NodeResolver, MAX_CANDIDATE_ATTEMPTS};
