use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;

/// A completed HTTP exchange: status plus the raw body text. OAuth token
/// endpoints return form-encoded text rather than JSON, so body decoding is
/// left to the caller.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Seam between the services and the network. Production uses
/// `ReqwestTransport`; tests script responses without a server.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse>;

    async fn post_form(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &str,
    ) -> Result<HttpResponse>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    user_agent: String,
}

impl ReqwestTransport {
    pub fn new(user_agent: String) -> Self {
        Self {
            client: Client::new(),
            user_agent,
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse> {
        let mut request = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }

    async fn post_form(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &str,
    ) -> Result<HttpResponse> {
        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            );
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.body(body.to_string()).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::AppError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug)]
    pub(crate) struct RecordedRequest {
        pub method: &'static str,
        pub url: String,
        pub headers: Vec<(String, String)>,
        pub body: Option<String>,
    }

    /// Replays a scripted sequence of responses and records every request.
    /// Panics on a request past the end of the script, which doubles as a
    /// "no further calls were made" assertion.
    pub(crate) struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<HttpResponse>>>,
        pub requests: Mutex<Vec<RecordedRequest>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self {
                replies: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn push_ok(&self, status: u16, body: &str) {
            self.replies.lock().unwrap().push_back(Ok(HttpResponse {
                status,
                body: body.to_string(),
            }));
        }

        pub fn push_err(&self, message: &str) {
            self.replies.lock().unwrap().push_back(Err(AppError::Api {
                status: 500,
                message: message.to_string(),
            }));
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn request_urls(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.url.clone())
                .collect()
        }

        fn next(&self, method: &'static str, url: &str) -> Result<HttpResponse> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unscripted {} request to {}", method, url))
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse> {
            self.requests.lock().unwrap().push(RecordedRequest {
                method: "GET",
                url: url.to_string(),
                headers: headers.to_vec(),
                body: None,
            });
            self.next("GET", url)
        }

        async fn post_form(
            &self,
            url: &str,
            headers: &[(String, String)],
            body: &str,
        ) -> Result<HttpResponse> {
            self.requests.lock().unwrap().push(RecordedRequest {
                method: "POST",
                url: url.to_string(),
                headers: headers.to_vec(),
                body: Some(body.to_string()),
            });
            self.next("POST", url)
        }
    }
}
