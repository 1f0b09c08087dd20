use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use cookbook_logging::cookbook_debug;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;

use crate::settings::FetchSettings;
use crate::{FailureKind, FetchError, FetchRequest, FetchResponse, Method};

/// A single network round trip. No retries, no rate limiting.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    settings: FetchSettings,
    client: reqwest::Client,
    redirect_counter: Arc<AtomicUsize>,
}

impl ReqwestTransport {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let redirect_counter = Arc::new(AtomicUsize::new(0));
        let client = build_client(&settings, redirect_counter.clone())?;
        Ok(Self {
            settings,
            client,
            redirect_counter,
        })
    }

    fn build_url(&self, request: &FetchRequest) -> Result<reqwest::Url, FetchError> {
        let mut parsed = reqwest::Url::parse(&request.url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::new(
                FailureKind::InvalidUrl,
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }
        if !request.query.is_empty() {
            parsed.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(parsed)
    }
}

fn build_client(
    settings: &FetchSettings,
    redirect_counter: Arc<AtomicUsize>,
) -> Result<reqwest::Client, FetchError> {
    let redirect_limit = settings.redirect_limit;
    let policy = reqwest::redirect::Policy::custom(move |attempt| {
        let count = attempt.previous().len();
        redirect_counter.store(count, Ordering::Relaxed);
        if count >= redirect_limit {
            attempt.error("redirect limit exceeded")
        } else {
            attempt.follow()
        }
    });

    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .user_agent(settings.user_agent.clone())
        .redirect(policy)
        .build()
        .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let url = self.build_url(request)?;
        self.redirect_counter.store(0, Ordering::Relaxed);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.json_body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let final_url = response.url().to_string();
        let redirects = self.redirect_counter.load(Ordering::Relaxed);
        if redirects > 0 {
            cookbook_debug!("{} redirected {} time(s) to {}", request.url, redirects, final_url);
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchResponse {
            status: status.as_u16(),
            final_url,
            content_type,
            body,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    if err.is_builder() {
        return FetchError::new(FailureKind::InvalidUrl, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
