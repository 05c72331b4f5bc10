//! Network collaborators: reachability probe and asset fetcher.

pub mod fetch;
pub mod probe;

pub use fetch::{AssetFetcher, FetchOutcome};
pub use probe::{is_reachable, Reachability, TcpProbe};
