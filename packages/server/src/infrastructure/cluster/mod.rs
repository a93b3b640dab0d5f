//! ClusterDispatcher implementations.
//!
//! - `in_process`: engines living in the same process (single-node deployments and tests)
//! - `http`: peers reachable over HTTP at `/internal/cluster/invoke`

pub mod http;
pub mod in_process;

pub use http::HttpClusterDispatcher;
pub use in_process::InProcessCluster;
