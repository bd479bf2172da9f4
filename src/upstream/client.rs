//! HTTP client for the upstream NLP services

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};

use crate::config::{Config, UpstreamConfig};
use crate::error::{Error, Result};

/// Header carrying the shared API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// The named upstream services the gateway knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Upstream {
    /// RAKE keyword extraction
    Rake,
    /// Tokens, entities and sentences
    Prose,
    /// Language detection
    Lang,
}

impl Upstream {
    pub const ALL: [Upstream; 3] = [Upstream::Rake, Upstream::Prose, Upstream::Lang];

    pub fn name(self) -> &'static str {
        match self {
            Upstream::Rake => "rake",
            Upstream::Prose => "prose",
            Upstream::Lang => "lang",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.name() == name)
    }
}

/// A successful (2xx) upstream answer, relayed as-is
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Shared client that forwards requests to upstream services
pub struct UpstreamClient {
    http: reqwest::Client,
    rake: String,
    prose: String,
    lang: String,
    api_key: Option<String>,
}

impl UpstreamClient {
    pub fn new(upstreams: &UpstreamConfig, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("nlp-gateway/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(upstreams.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            rake: normalize_base(&upstreams.rake_endpoint),
            prose: normalize_base(&upstreams.prose_endpoint),
            lang: normalize_base(&upstreams.lang_endpoint),
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.upstreams, config.api_key.clone())
    }

    /// Base URL of an upstream, without trailing slash
    pub fn base_url(&self, upstream: Upstream) -> &str {
        match upstream {
            Upstream::Rake => &self.rake,
            Upstream::Prose => &self.prose,
            Upstream::Lang => &self.lang,
        }
    }

    /// POST `body` unmodified to `{upstream}{path}`
    pub async fn forward(
        &self,
        upstream: Upstream,
        path: &str,
        content_type: Option<&str>,
        body: Vec<u8>,
    ) -> Result<UpstreamResponse> {
        let url = format!("{}{}", self.base_url(upstream), path);

        let mut request = self.request(Method::POST, &url).body(body);
        if let Some(content_type) = content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }

        tracing::debug!("Forwarding to {} ({})", url, upstream.name());
        self.send(Method::POST, &url, request).await
    }

    /// GET `{upstream}/health` for the upstream called `app`
    pub async fn health(&self, app: &str) -> Result<UpstreamResponse> {
        let upstream =
            Upstream::from_name(app).ok_or_else(|| Error::UnknownUpstream(app.to_string()))?;
        let url = format!("{}/health", self.base_url(upstream));

        let request = self.request(Method::GET, &url);
        self.send(Method::GET, &url, request).await
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let request = self.http.request(method, url);
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<UpstreamResponse> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!("Upstream {} unreachable: {}", url, e);
            Error::unavailable(method.as_str(), url, &e)
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::unavailable(method.as_str(), url, &e))?;

        if !status.is_success() {
            tracing::warn!("Upstream {} returned {}", url, status);
            let text = String::from_utf8_lossy(&body).trim().to_string();
            let message = if text.is_empty() {
                status.canonical_reason().unwrap_or("Upstream error").to_string()
            } else {
                text
            };
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                message,
            });
        }

        Ok(UpstreamResponse {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}

fn normalize_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_names_round_trip() {
        for upstream in Upstream::ALL {
            assert_eq!(Upstream::from_name(upstream.name()), Some(upstream));
        }
        assert_eq!(Upstream::from_name("spacy"), None);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let upstreams = UpstreamConfig {
            rake_endpoint: "http://rake:8081/".into(),
            ..UpstreamConfig::default()
        };
        let client = UpstreamClient::new(&upstreams, None).unwrap();
        assert_eq!(client.base_url(Upstream::Rake), "http://rake:8081");
        assert_eq!(client.base_url(Upstream::Prose), "http://localhost:8082");
    }

    #[tokio::test]
    async fn test_health_unknown_upstream() {
        let client = UpstreamClient::new(&UpstreamConfig::default(), None).unwrap();
        let err = client.health("spacy").await.unwrap_err();
        assert!(matches!(err, Error::UnknownUpstream(name) if name == "spacy"));
    }
}
