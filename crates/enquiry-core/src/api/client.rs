use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{ChatBackend, FaqBackend};
use crate::config::Config;
use crate::error::ApiError;
use crate::state::{FaqEntry, FaqId};

#[derive(Serialize)]
struct MessageRequest<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct FaqRequest<'a> {
    question: &'a str,
    answer: &'a str,
}

/// Every backend endpoint answers with this envelope
#[derive(Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    faqs: Option<Vec<FaqEntry>>,
}

impl Envelope {
    fn into_success(self) -> Result<Self, ApiError> {
        if self.status == "success" {
            Ok(self)
        } else {
            Err(ApiError::Rejected(self.message))
        }
    }
}

#[derive(Clone)]
pub struct EnquiryClient {
    client: Client,
    base_url: Url,
    session_cookie: Option<String>,
}

impl EnquiryClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            client: Client::new(),
            base_url: parse_base_url(base_url)?,
            session_cookie: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: parse_base_url(&config.base_url)?,
            session_cookie: config.session_cookie.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn with_session(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.session_cookie {
            Some(cookie) => request.header(header::COOKIE, cookie),
            None => request,
        }
    }

    async fn read_envelope(response: Response) -> Result<Envelope, ApiError> {
        if !response.status().is_success() {
            return Err(ApiError::Http(response.status()));
        }

        let envelope: Envelope = response.json().await?;
        envelope.into_success()
    }

    async fn post_faq(&self, url: Url, question: &str, answer: &str) -> Result<(), ApiError> {
        debug!(%url, "sending faq change");

        let response = self
            .with_session(self.client.post(url))
            .json(&FaqRequest { question, answer })
            .send()
            .await?;

        Self::read_envelope(response).await.map(|_| ())
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, ApiError> {
    let url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl(base_url.to_string()));
    }
    Ok(url)
}

#[async_trait]
impl ChatBackend for EnquiryClient {
    async fn send_message(&self, message: &str) -> Result<String, ApiError> {
        let url = self.endpoint(&["send_message"])?;
        debug!(%url, "sending chat message");

        let response = self
            .with_session(self.client.post(url))
            .json(&MessageRequest { message })
            .send()
            .await?;

        let envelope = Self::read_envelope(response).await?;
        envelope.response.ok_or(ApiError::Rejected(None))
    }
}

#[async_trait]
impl FaqBackend for EnquiryClient {
    async fn list_faqs(&self) -> Result<Vec<FaqEntry>, ApiError> {
        let url = self.endpoint(&["admin", "faqs"])?;
        debug!(%url, "loading faqs");

        let response = self.with_session(self.client.get(url)).send().await?;
        let envelope = Self::read_envelope(response).await?;
        Ok(envelope.faqs.unwrap_or_default())
    }

    async fn add_faq(&self, question: &str, answer: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["admin", "add_query"])?;
        self.post_faq(url, question, answer).await
    }

    async fn update_faq(&self, id: &FaqId, question: &str, answer: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["admin", "update_query", id.as_str()])?;
        self.post_faq(url, question, answer).await
    }

    async fn delete_faq(&self, id: &FaqId) -> Result<(), ApiError> {
        let url = self.endpoint(&["admin", "delete_query", id.as_str()])?;
        debug!(%url, "deleting faq");

        let response = self
            .with_session(self.client.post(url))
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        Self::read_envelope(response).await.map(|_| ())
    }
}
