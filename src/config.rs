use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Discogs application consumer key.
    pub consumer_key: String,
    /// Discogs application consumer secret.
    pub consumer_secret: String,
    /// Base URL for API calls (collection, releases, OAuth token endpoints).
    pub api_base_url: String,
    /// Base URL for the interactive authorize page.
    pub authorize_base_url: String,
    /// Optional forwarding relay for the OAuth token legs. When set, the
    /// request-token and access-token posts go to `relay_url` with the target
    /// path appended, for callers that cannot make direct cross-origin calls.
    pub relay_url: Option<String>,
    /// Redirect URI the authorize page sends the user back to, carried as
    /// `oauth_callback` on the request-token leg.
    pub oauth_callback_url: String,
    /// User-Agent sent on every request. Discogs rejects anonymous clients.
    pub user_agent: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        // Consumer credentials are required - the OAuth flow cannot start
        // without them and fails pre-network if they are blank.
        let consumer_key = env::var("DISCOGS_CONSUMER_KEY").map_err(|_| {
            anyhow::anyhow!(
                "DISCOGS_CONSUMER_KEY environment variable must be set. \
                Create an app at https://www.discogs.com/settings/developers"
            )
        })?;
        let consumer_secret = env::var("DISCOGS_CONSUMER_SECRET").map_err(|_| {
            anyhow::anyhow!("DISCOGS_CONSUMER_SECRET environment variable must be set")
        })?;

        let api_base_url = env::var("DISCOGS_API_URL")
            .unwrap_or_else(|_| "https://api.discogs.com".to_string());

        // PLAINTEXT signatures carry the shared secrets verbatim; anything
        // other than an encrypted transport is a misconfiguration.
        if !api_base_url.starts_with("https://") && !api_base_url.starts_with("http://localhost") {
            return Err(anyhow::anyhow!(
                "DISCOGS_API_URL must be an https URL: the OAuth signature \
                method transmits secrets in cleartext headers"
            ));
        }

        Ok(Config {
            consumer_key,
            consumer_secret,
            api_base_url,
            authorize_base_url: env::var("DISCOGS_AUTHORIZE_URL")
                .unwrap_or_else(|_| "https://www.discogs.com/oauth/authorize".to_string()),
            relay_url: env::var("OAUTH_RELAY_URL").ok(),
            oauth_callback_url: env::var("OAUTH_CALLBACK_URL")
                .unwrap_or_else(|_| "needledrop://oauth-callback".to_string()),
            user_agent: env::var("NEEDLEDROP_USER_AGENT")
                .unwrap_or_else(|_| format!("needledrop/{}", env!("CARGO_PKG_VERSION"))),
        })
    }
}
