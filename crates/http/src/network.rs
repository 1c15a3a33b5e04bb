//! Reachability banner for the Supabase host, cached between page renders.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chantier_core::Banner;
use chantier_supabase::SupabaseClient;
use tokio::sync::RwLock;

/// How long a probe result is reused.
const PROBE_TTL: Duration = Duration::from_secs(60);
/// Upper bound on one probe, both endpoints included.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

fn fresh(cached: Option<&(Instant, Banner)>) -> Option<Banner> {
    cached.filter(|(at, _)| at.elapsed() < PROBE_TTL).map(|(_, banner)| banner.clone())
}

pub struct NetworkProbe {
    client: Arc<SupabaseClient>,
    last: RwLock<Option<(Instant, Banner)>>,
}

impl NetworkProbe {
    #[must_use]
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client, last: RwLock::new(None) }
    }

    /// Banner describing the last probe, probing again once the cached one is stale.
    ///
    /// The write lock is held while probing so concurrent callers share one probe.
    pub async fn banner(&self) -> Banner {
        if let Some(banner) = fresh(self.last.read().await.as_ref()) {
            return banner;
        }
        let mut last = self.last.write().await;
        if let Some(banner) = fresh(last.as_ref()) {
            return banner;
        }
        let banner = self.probe().await;
        *last = Some((Instant::now(), banner.clone()));
        banner
    }

    async fn probe(&self) -> Banner {
        let host = self.client.base_url().split("//").last().unwrap_or_default().to_owned();
        match tokio::time::timeout(PROBE_TIMEOUT, self.client.health()).await {
            Ok(Ok(status)) => {
                tracing::debug!(status = status.status, "supabase reachable");
                Banner::success(format!(
                    "Connexion réseau Supabase OK (status {}), DNS {host}",
                    status.status
                ))
            },
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "supabase unreachable");
                Banner::error(format!("Connexion réseau Supabase KO : {e}"))
            },
            Err(_) => {
                tracing::warn!("supabase health probe timed out");
                Banner::error("Connexion réseau Supabase KO : délai dépassé".to_owned())
            },
        }
    }
}
