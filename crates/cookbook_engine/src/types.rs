use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One outbound request. Cheap to clone so the retry loop can resend it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// Serialized JSON body, sent with `Content-Type: application/json`.
    pub json_body: Option<String>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            json_body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: String) -> Self {
        Self {
            method: Method::Post,
            json_body: Some(body),
            ..Self::get(url)
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Transient failures may succeed on retry: timeouts, network errors, 5xx and 429.
    pub fn is_transient(&self) -> bool {
        match self.kind {
            FailureKind::Timeout | FailureKind::Network => true,
            FailureKind::HttpStatus(code) => code == 429 || (500..600).contains(&code),
            FailureKind::InvalidUrl
            | FailureKind::RedirectLimitExceeded
            | FailureKind::TooLarge { .. } => false,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Result of one attempt, as seen by the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success(FetchResponse),
    Transient(FetchError),
    Fatal(FetchError),
}

impl AttemptOutcome {
    pub fn classify(result: Result<FetchResponse, FetchError>) -> Self {
        match result {
            Ok(response) => AttemptOutcome::Success(response),
            Err(err) if err.is_transient() => AttemptOutcome::Transient(err),
            Err(err) => AttemptOutcome::Fatal(err),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Success(_) => "success",
            AttemptOutcome::Transient(_) => "transient",
            AttemptOutcome::Fatal(_) => "fatal",
        }
    }
}

/// Per-attempt record, logged and then dropped.
#[derive(Debug, Clone)]
pub struct FetchAttempt<'a> {
    pub url: &'a str,
    pub attempt: u32,
    pub elapsed: Duration,
    pub outcome: &'a AttemptOutcome,
}

impl fmt::Display for FetchAttempt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} attempt={} elapsed_ms={} outcome={}",
            self.url,
            self.attempt,
            self.elapsed.as_millis(),
            self.outcome.label()
        )?;
        match self.outcome {
            AttemptOutcome::Success(resp) => write!(f, " status={}", resp.status),
            AttemptOutcome::Transient(err) | AttemptOutcome::Fatal(err) => write!(f, " error={err}"),
        }
    }
}
