// All service modules
pub mod abi;
pub mod contract_facade;
pub mod onchain;
pub mod refresh_cache;
pub mod registry;

// Re-export for convenience
pub use contract_facade::ContractFacade;
pub use onchain::{ChainNode, EthNode};
pub use refresh_cache::RefreshCache;
pub use registry::ContractRegistry;

use std::sync::Arc;
use tokio::task::JoinHandle;

/// Start all background services
pub fn start_background_services(cache: Arc<RefreshCache>) -> Vec<JoinHandle<()>> {
    tracing::info!(
        "Starting cache refresher (every {}s)",
        cache.interval().as_secs()
    );
    vec![cache.spawn_refresher()]
}
