//! Time-bounded, single-flight cache of the provider's
//! free-tier model listing.
//!
//! The cache is an explicit struct injected through `AppState` rather than
//! module-level global state, so tests construct isolated instances with a
//! fake fetcher. The tokio runtime is multi-threaded, so `{data, fetched_at}`
//! sit behind an async mutex; holding the lock across the upstream fetch is
//! what gives the single-flight property: concurrent callers queue on the
//! mutex and find the cache fresh once the in-flight fetch completes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::llm::{LlmError, ModelFetcher, ProviderModel};

/// Refresh at most once per window.
pub const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A normalized free-tier model entry.
#[derive(Debug, Clone, Serialize)]
pub struct FreeModel {
    pub id: String,
    pub name: String,
    /// Prefix before the first `/` in the model id.
    pub provider: String,
    pub context_length: Option<u32>,
}

struct CatalogState {
    models: Vec<FreeModel>,
    fetched_at: Option<Instant>,
}

pub struct ModelCatalog {
    fetcher: Arc<dyn ModelFetcher>,
    ttl: Duration,
    state: Mutex<CatalogState>,
}

impl ModelCatalog {
    pub fn new(fetcher: Arc<dyn ModelFetcher>) -> Self {
        Self::with_ttl(fetcher, CACHE_TTL)
    }

    pub fn with_ttl(fetcher: Arc<dyn ModelFetcher>, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            state: Mutex::new(CatalogState {
                models: Vec::new(),
                fetched_at: None,
            }),
        }
    }

    /// Returns the cached free-model list, refreshing it if the window has
    /// elapsed. A failed refresh serves the last known data if any exists;
    /// the error only propagates when nothing has ever been fetched.
    pub async fn get(&self) -> Result<Vec<FreeModel>, LlmError> {
        let mut state = self.state.lock().await;

        if let Some(fetched_at) = state.fetched_at {
            if fetched_at.elapsed() < self.ttl {
                return Ok(state.models.clone());
            }
        }

        match self.fetcher.fetch_models().await {
            Ok(raw) => {
                state.models = filter_free_models(raw);
                state.fetched_at = Some(Instant::now());
                info!("Model catalog refreshed: {} free models", state.models.len());
                Ok(state.models.clone())
            }
            Err(e) if state.fetched_at.is_some() => {
                warn!("Model catalog refresh failed, serving stale data: {e}");
                Ok(state.models.clone())
            }
            Err(e) => Err(e),
        }
    }

    /// Clears the cache unconditionally and re-fetches.
    pub async fn refresh(&self) -> Result<Vec<FreeModel>, LlmError> {
        let mut state = self.state.lock().await;
        state.models.clear();
        state.fetched_at = None;

        let raw = self.fetcher.fetch_models().await?;
        state.models = filter_free_models(raw);
        state.fetched_at = Some(Instant::now());
        info!(
            "Model catalog force-refreshed: {} free models",
            state.models.len()
        );
        Ok(state.models.clone())
    }
}

/// Keeps entries that are free-tier: id carries the `:free` marker, or the
/// provider reports a zero prompt price.
fn filter_free_models(raw: Vec<ProviderModel>) -> Vec<FreeModel> {
    raw.into_iter()
        .filter(|m| m.id.contains(":free") || prompt_price_is_zero(m))
        .map(|m| {
            let provider = m.id.split('/').next().unwrap_or("").to_string();
            let name = m.name.clone().unwrap_or_else(|| m.id.clone());
            FreeModel {
                provider,
                name,
                context_length: m.context_length,
                id: m.id,
            }
        })
        .collect()
}

fn prompt_price_is_zero(model: &ProviderModel) -> bool {
    model
        .pricing
        .as_ref()
        .and_then(|p| p.prompt.as_deref())
        .and_then(|p| p.parse::<f64>().ok())
        .is_some_and(|p| p == 0.0)
}
