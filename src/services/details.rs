use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{OAuthTokenSet, ReleaseData};
use crate::services::oauth::OAuthSigner;
use crate::services::transport::Transport;

/// Spacing between consecutive release requests. The upstream budget is
/// about 60 authenticated requests per minute; 1.1s keeps us near 55.
pub const REQUEST_SPACING: Duration = Duration::from_millis(1100);

/// Fetches extended release metadata one id at a time. Deliberately serial:
/// the rate limit is shared, so there is no fan-out.
pub struct ReleaseDetailFetcher {
    signer: OAuthSigner,
    transport: Arc<dyn Transport>,
    api_base_url: String,
    spacing: Duration,
}

impl ReleaseDetailFetcher {
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            signer: OAuthSigner::new(
                config.consumer_key.clone(),
                config.consumer_secret.clone(),
            ),
            transport,
            api_base_url: config.api_base_url.clone(),
            spacing: REQUEST_SPACING,
        }
    }

    /// Fetch details for each id in order. A failed id is logged and left
    /// out of the result; the batch keeps going. `on_progress` fires after
    /// every attempt, success or failure, with a non-decreasing completed
    /// count, synchronously within the loop.
    pub async fn fetch_details<F>(
        &self,
        ids: &[u64],
        tokens: &OAuthTokenSet,
        mut on_progress: F,
    ) -> HashMap<u64, ReleaseData>
    where
        F: FnMut(usize, usize),
    {
        let total = ids.len();
        let mut details = HashMap::with_capacity(total);

        for (index, &id) in ids.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.spacing).await;
            }

            match self.fetch_one(id, tokens).await {
                Ok(release) => {
                    debug!("fetched release {} ({}/{})", id, index + 1, total);
                    details.insert(id, release);
                }
                Err(e) => {
                    warn!("release {} failed, skipping: {}", id, e);
                }
            }
            on_progress(index + 1, total);
        }

        details
    }

    async fn fetch_one(&self, id: u64, tokens: &OAuthTokenSet) -> Result<ReleaseData> {
        let url = format!("{}/releases/{}", self.api_base_url, id);
        let params = self
            .signer
            .authenticated_params(&tokens.token, &tokens.token_secret);
        let header = OAuthSigner::authorization_header(&params);

        let response = self
            .transport
            .get(&url, &[("Authorization".to_string(), header)])
            .await?;
        if !response.is_success() {
            return Err(AppError::Api {
                status: response.status,
                message: response.body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&response.body)
            .map_err(|e| AppError::Protocol(format!("release {}: {}", id, e)))
    }
}
