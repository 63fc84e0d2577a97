//! Marketplace review service over HTTP.

use log::{debug, warn};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::ports::{
    ApproveData, BulkModerateRequest, BulkModerateResult, PortError, PortResult, ReasonData,
    ReviewMutationPort, ReviewPage, ReviewQueryPort, ReviewStatistics,
};
use crate::query::ReviewQuery;
use crate::review::{Review, ReviewId};

/// Bodies may come bare or wrapped in `{ "data": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(value) => value,
        }
    }
}

pub struct HttpBackend {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("digimall-reviews/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: normalize_base(base_url)?,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> PortResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| PortError::Transport(format!("Invalid endpoint {}: {}", path, err)))
    }

    fn review_url(&self, id: &ReviewId, suffix: Option<&str>) -> PortResult<Url> {
        let mut url = self.url("reviews")?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| PortError::Transport("Base URL cannot hold a path".to_string()))?;
            segments.pop_if_empty().push(id.as_str());
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        Ok(url)
    }

    fn add_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send(&self, request: RequestBuilder, id: Option<&ReviewId>) -> PortResult<Response> {
        let response = self
            .add_auth(request)
            .send()
            .map_err(|err| PortError::Transport(err.to_string()))?;
        let status = response.status();
        debug!("review service responded {} for {}", status, response.url());
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND
            && let Some(id) = id
        {
            return Err(PortError::NotFound(id.clone()));
        }
        let body = response.text().unwrap_or_default();
        let message = error_message(&body);
        warn!("review service error {}: {}", status, message);
        Err(PortError::Backend {
            status: status.as_u16(),
            message,
        })
    }

    fn read<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        id: Option<&ReviewId>,
    ) -> PortResult<T> {
        let response = self.send(request, id)?;
        response
            .json::<Envelope<T>>()
            .map(Envelope::into_inner)
            .map_err(|err| PortError::Transport(format!("Unexpected response body: {}", err)))
    }
}

fn normalize_base(base_url: &str) -> anyhow::Result<Url> {
    let trimmed = base_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Ok(Url::parse(&with_slash)?)
}

/// Pulls a readable message out of an error body. NestJS-style validation
/// errors carry `message` as a list.
pub fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    match value.get("message") {
        Some(Value::String(message)) => message.trim().to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("; "),
        _ => value
            .get("error")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

impl ReviewQueryPort for HttpBackend {
    fn list(&self, query: &ReviewQuery) -> PortResult<ReviewPage> {
        let url = self.url("reviews")?;
        self.read(self.client.get(url).query(query), None)
    }

    fn get(&self, id: &ReviewId) -> PortResult<Review> {
        let url = self.review_url(id, None)?;
        self.read(self.client.get(url), Some(id))
    }

    fn statistics(&self) -> PortResult<ReviewStatistics> {
        let url = self.url("reviews/statistics")?;
        self.read(self.client.get(url), None)
    }
}

impl ReviewMutationPort for HttpBackend {
    fn approve(&self, id: &ReviewId, data: ApproveData) -> PortResult<Review> {
        let url = self.review_url(id, Some("approve"))?;
        self.read(self.client.patch(url).json(&data), Some(id))
    }

    fn reject(&self, id: &ReviewId, data: ReasonData) -> PortResult<Review> {
        let url = self.review_url(id, Some("reject"))?;
        self.read(self.client.patch(url).json(&data), Some(id))
    }

    fn flag(&self, id: &ReviewId, data: ReasonData) -> PortResult<Review> {
        let url = self.review_url(id, Some("flag"))?;
        self.read(self.client.patch(url).json(&data), Some(id))
    }

    fn delete(&self, id: &ReviewId) -> PortResult<()> {
        let url = self.review_url(id, None)?;
        self.send(self.client.delete(url), Some(id)).map(|_| ())
    }

    fn bulk_moderate(&self, request: &BulkModerateRequest) -> PortResult<BulkModerateResult> {
        let url = self.url("reviews/bulk-moderate")?;
        let response = self.send(self.client.post(url).json(request), None)?;
        let body = response.text().unwrap_or_default();
        if body.trim().is_empty() {
            return Ok(BulkModerateResult {
                affected: request.review_ids.len() as u64,
            });
        }
        serde_json::from_str::<Envelope<BulkModerateResult>>(&body)
            .map(Envelope::into_inner)
            .map_err(|err| PortError::Transport(format!("Unexpected response body: {}", err)))
    }
}
