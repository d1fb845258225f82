use percent_encoding::percent_decode_str;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::OAuthTokenSet;
use crate::services::oauth::{percent_encode, OAuthSigner};
use crate::services::token_store::TokenStore;
use crate::services::transport::Transport;

/// Phases of the three-leg handshake, in order. Used for trace context; the
/// machine itself is expressed by the `begin` / `complete` split, with the
/// indefinite wait on the interactive agent sitting between the two calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthPhase {
    RequestingToken,
    AwaitingUserAuthorization,
    ExchangingToken,
    FetchingIdentity,
    Authenticated,
}

/// Handle returned by `begin`. The caller sends the user to `authorize_url`
/// and later feeds the callback into `complete`, which consumes the handle:
/// an abandoned attempt's request token is never reused.
#[derive(Debug)]
pub struct PendingAuthorization {
    pub request_token: String,
    pub authorize_url: String,
    request_token_secret: String,
}

#[derive(Debug, Deserialize)]
struct IdentityBody {
    username: String,
}

/// Orchestrates the OAuth 1.0a handshake against the catalog's token
/// endpoints and persists the resulting credentials per user id.
pub struct AuthFlowController {
    signer: OAuthSigner,
    transport: Arc<dyn Transport>,
    store: Arc<dyn TokenStore>,
    api_base_url: String,
    authorize_base_url: String,
    relay_url: Option<String>,
    callback_url: String,
}

impl AuthFlowController {
    pub fn new(
        config: &Config,
        transport: Arc<dyn Transport>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            signer: OAuthSigner::new(
                config.consumer_key.clone(),
                config.consumer_secret.clone(),
            ),
            transport,
            store,
            api_base_url: config.api_base_url.clone(),
            authorize_base_url: config.authorize_base_url.clone(),
            relay_url: config.relay_url.clone(),
            callback_url: config.oauth_callback_url.clone(),
        }
    }

    /// First leg: obtain a request token and build the authorize URL. Fails
    /// before any network call when consumer credentials are missing. A
    /// network failure here fails the attempt; retrying starts over.
    pub async fn begin(&self) -> Result<PendingAuthorization> {
        if !self.signer.has_consumer_credentials() {
            return Err(AppError::Config(
                "consumer key and secret are required for authorization".to_string(),
            ));
        }

        debug!(phase = ?AuthPhase::RequestingToken, "starting OAuth handshake");

        let params = self.signer.request_token_params(&self.callback_url);
        let header = OAuthSigner::authorization_header(&params);
        let url = self.token_endpoint("/oauth/request_token");

        let response = self
            .transport
            .post_form(&url, &[("Authorization".to_string(), header)], "")
            .await?;
        if !response.is_success() {
            return Err(AppError::Api {
                status: response.status,
                message: excerpt(&response.body),
            });
        }

        let fields = parse_form_pairs(&response.body);
        let request_token = require_field(&fields, "oauth_token")?;
        let request_token_secret = require_field(&fields, "oauth_token_secret")?;

        let authorize_url = format!(
            "{}?oauth_token={}",
            self.authorize_base_url,
            percent_encode(&request_token)
        );

        debug!(phase = ?AuthPhase::AwaitingUserAuthorization, %authorize_url, "handing off to interactive agent");

        Ok(PendingAuthorization {
            request_token,
            request_token_secret,
            authorize_url,
        })
    }

    /// Remaining legs, driven by the callback the interactive agent
    /// eventually delivers. `callback` may be the full redirect URL or just
    /// its query string; it must carry `oauth_token` and `oauth_verifier`.
    pub async fn complete(
        &self,
        pending: PendingAuthorization,
        callback: &str,
        user_id: &str,
    ) -> Result<OAuthTokenSet> {
        let callback_params = parse_callback_params(callback);
        callback_params
            .get("oauth_token")
            .ok_or_else(|| AppError::InvalidCallback("missing oauth_token".to_string()))?;
        let verifier = callback_params
            .get("oauth_verifier")
            .ok_or_else(|| AppError::InvalidCallback("missing oauth_verifier".to_string()))?;

        debug!(phase = ?AuthPhase::ExchangingToken, "exchanging request token");

        let params = self.signer.access_token_params(
            &pending.request_token,
            &pending.request_token_secret,
            verifier,
        );
        let header = OAuthSigner::authorization_header(&params);
        let url = self.token_endpoint("/oauth/access_token");

        let response = self
            .transport
            .post_form(&url, &[("Authorization".to_string(), header)], "")
            .await?;
        if !response.is_success() {
            return Err(AppError::Api {
                status: response.status,
                message: excerpt(&response.body),
            });
        }

        let fields = parse_form_pairs(&response.body);
        let token = require_field(&fields, "oauth_token")?;
        let token_secret = require_field(&fields, "oauth_token_secret")?;

        // Identity resolution is best-effort: a failure falls back to any
        // username in the exchange body, then to a placeholder, and the flow
        // still completes.
        debug!(phase = ?AuthPhase::FetchingIdentity, "resolving username");
        let username = match self.fetch_identity(&token, &token_secret).await {
            Ok(name) => name,
            Err(e) => {
                warn!("identity fetch failed, falling back: {}", e);
                fields
                    .get("username")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string())
            }
        };

        let tokens = OAuthTokenSet {
            token,
            token_secret,
            username,
        };
        self.store.set(user_id, tokens.clone()).await?;

        info!(phase = ?AuthPhase::Authenticated, username = %tokens.username, "authorization complete");
        Ok(tokens)
    }

    /// Drop the stored credentials for a user.
    pub async fn sign_out(&self, user_id: &str) -> Result<()> {
        self.store.clear(user_id).await
    }

    async fn fetch_identity(&self, token: &str, token_secret: &str) -> Result<String> {
        let params = self.signer.authenticated_params(token, token_secret);
        let header = OAuthSigner::authorization_header(&params);
        let url = format!("{}/oauth/identity", self.api_base_url);

        let response = self
            .transport
            .get(&url, &[("Authorization".to_string(), header)])
            .await?;
        if !response.is_success() {
            return Err(AppError::Api {
                status: response.status,
                message: excerpt(&response.body),
            });
        }

        let body: IdentityBody = serde_json::from_str(&response.body)
            .map_err(|e| AppError::Protocol(format!("identity response: {}", e)))?;
        Ok(body.username)
    }

    /// Token-leg endpoint, optionally routed through the forwarding relay
    /// for callers that cannot make direct cross-origin requests.
    fn token_endpoint(&self, path: &str) -> String {
        match &self.relay_url {
            Some(relay) => format!("{}{}", relay.trim_end_matches('/'), path),
            None => format!("{}{}", self.api_base_url, path),
        }
    }
}

/// Parse a `key=value&key=value` form-encoded body into a map, percent-
/// decoding both sides. Both token endpoints answer in this shape.
fn parse_form_pairs(body: &str) -> HashMap<String, String> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((decode_component(key), decode_component(value)))
        })
        .collect()
}

/// Accepts a full redirect URL or a bare query string and returns its query
/// parameters.
fn parse_callback_params(callback: &str) -> HashMap<String, String> {
    let query = callback
        .split_once('?')
        .map(|(_, q)| q)
        .unwrap_or(callback);
    let query = query.split('#').next().unwrap_or(query);
    parse_form_pairs(query)
}

fn decode_component(raw: &str) -> String {
    percent_decode_str(&raw.replace('+', " "))
        .decode_utf8_lossy()
        .to_string()
}

fn require_field(fields: &HashMap<String, String>, name: &str) -> Result<String> {
    fields
        .get(name)
        .cloned()
        .ok_or_else(|| AppError::Protocol(format!("token response missing {}", name)))
}

fn excerpt(body: &str) -> String {
    body.chars().take(200).collect()
}
