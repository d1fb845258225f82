use chrono::Utc;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt::Write;

/// RFC 3986 unreserved characters stay literal; everything else is encoded.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// Fresh nonce for one request: 16 bytes from the OS RNG as 32 hex chars.
/// Never reused, even across retries of the same logical request.
pub fn nonce() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().fold(String::with_capacity(32), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}

/// Integer seconds since epoch, as the decimal string OAuth expects.
pub fn timestamp() -> String {
    Utc::now().timestamp().to_string()
}

/// Builds OAuth 1.0a PLAINTEXT authorization headers. PLAINTEXT puts the
/// shared secrets in the header verbatim, so these headers must only travel
/// over an encrypted transport; enforcing that is the configuration's job.
#[derive(Debug, Clone)]
pub struct OAuthSigner {
    consumer_key: String,
    consumer_secret: String,
}

impl OAuthSigner {
    pub fn new(consumer_key: String, consumer_secret: String) -> Self {
        Self {
            consumer_key,
            consumer_secret,
        }
    }

    pub fn has_consumer_credentials(&self) -> bool {
        !self.consumer_key.is_empty() && !self.consumer_secret.is_empty()
    }

    /// PLAINTEXT signature: `encode(consumer_secret) & encode(token_secret)`,
    /// with an empty token secret before any token has been issued.
    pub fn signature(&self, token_secret: Option<&str>) -> String {
        format!(
            "{}&{}",
            percent_encode(&self.consumer_secret),
            percent_encode(token_secret.unwrap_or(""))
        )
    }

    /// Render a parameter set as an `Authorization: OAuth ...` header value.
    /// Keys and values are percent-encoded and entries sorted by key; the
    /// ordering is for reproducibility, the protocol does not require it.
    pub fn authorization_header(params: &[(String, String)]) -> String {
        let mut entries: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (percent_encode(k), percent_encode(v)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let joined = entries
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, v))
            .collect::<Vec<_>>()
            .join(", ");

        format!("OAuth {}", joined)
    }

    fn base_params(&self, token_secret: Option<&str>) -> Vec<(String, String)> {
        vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce()),
            ("oauth_signature".to_string(), self.signature(token_secret)),
            (
                "oauth_signature_method".to_string(),
                "PLAINTEXT".to_string(),
            ),
            ("oauth_timestamp".to_string(), timestamp()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ]
    }

    /// Parameters for the request-token leg, signed with consumer
    /// credentials only.
    pub fn request_token_params(&self, callback_url: &str) -> Vec<(String, String)> {
        let mut params = self.base_params(None);
        params.push(("oauth_callback".to_string(), callback_url.to_string()));
        params
    }

    /// Parameters for the access-token exchange, signed with the
    /// request-token secret and carrying the user's verifier.
    pub fn access_token_params(
        &self,
        request_token: &str,
        request_token_secret: &str,
        verifier: &str,
    ) -> Vec<(String, String)> {
        let mut params = self.base_params(Some(request_token_secret));
        params.push(("oauth_token".to_string(), request_token.to_string()));
        params.push(("oauth_verifier".to_string(), verifier.to_string()));
        params
    }

    /// Parameters for any authenticated API call.
    pub fn authenticated_params(&self, token: &str, token_secret: &str) -> Vec<(String, String)> {
        let mut params = self.base_params(Some(token_secret));
        params.push(("oauth_token".to_string(), token.to_string()));
        params
    }
}
