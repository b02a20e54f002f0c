use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use movescan_core::{RetentionHandle, RetentionScheduler};

use crate::infra::app_state::AppState;

/// Background work started once the state is built and before the listener
/// accepts connections. Returned handles are shut down by the caller.
#[async_trait]
pub trait StartupHooks: Send + Sync {
    async fn run(&self, state: &AppState) -> Result<Option<RetentionHandle>>;
}

#[derive(Debug, Default)]
pub struct ProdStartupHooks;

#[async_trait]
impl StartupHooks for ProdStartupHooks {
    async fn run(&self, state: &AppState) -> Result<Option<RetentionHandle>> {
        let storage = state.pipeline.storage();
        if let Err(err) = storage.ensure().await {
            warn!(error = %err, "Failed to prepare storage pools");
        }

        let retention = &state.config.retention;
        if !retention.enabled {
            info!("retention sweep disabled");
            return Ok(None);
        }

        let pools = storage.pools().iter().map(|p| p.to_path_buf()).collect();
        let handle = RetentionScheduler::new(pools, retention.period).spawn();
        Ok(Some(handle))
    }
}

#[derive(Debug, Default)]
pub struct NoopStartupHooks;

#[async_trait]
impl StartupHooks for NoopStartupHooks {
    async fn run(&self, _state: &AppState) -> Result<Option<RetentionHandle>> {
        Ok(None)
    }
}
