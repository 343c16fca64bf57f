use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::{config::Settings, metrics::MetricsDocument};

/// Where the static fallback document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackSource {
    Url(String),
    File(PathBuf),
}

impl FallbackSource {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            FallbackSource::Url(s.to_string())
        } else {
            FallbackSource::File(PathBuf::from(s))
        }
    }
}

impl std::fmt::Display for FallbackSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackSource::Url(u) => write!(f, "{u}"),
            FallbackSource::File(p) => write!(f, "{}", p.display()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Primary,
    Fallback,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Primary => "primary",
            SourceKind::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Fetched {
    pub doc: MetricsDocument,
    pub source: SourceKind,
}

#[derive(Clone)]
pub struct MetricsFetcher {
    client: reqwest::Client,
    primary_url: String,
    fallback: FallbackSource,
}

impl MetricsFetcher {
    pub fn new(primary_url: &str, fallback: FallbackSource) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            primary_url: primary_url.to_string(),
            fallback,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.metrics_url, FallbackSource::parse(&settings.fallback))
    }

    pub fn primary_url(&self) -> &str {
        &self.primary_url
    }

    pub fn fallback(&self) -> &FallbackSource {
        &self.fallback
    }

    /// Primary first; any primary failure is logged and answered from the
    /// fallback. A fallback failure is returned to the caller.
    pub async fn fetch(&self) -> Result<Fetched> {
        match self.fetch_primary().await {
            Ok(v) => Ok(Fetched {
                doc: MetricsDocument::from_value(v),
                source: SourceKind::Primary,
            }),
            Err(e) => {
                log::warn!("metrics.primary_failed url={} err={:#}", self.primary_url, e);
                let v = self.fetch_fallback().await?;
                Ok(Fetched {
                    doc: MetricsDocument::from_value(v),
                    source: SourceKind::Fallback,
                })
            }
        }
    }

    pub async fn fetch_metrics(&self) -> Result<MetricsDocument> {
        Ok(self.fetch().await?.doc)
    }

    async fn fetch_primary(&self) -> Result<JsonValue> {
        let resp = self
            .client
            .get(&self.primary_url)
            .header(CACHE_CONTROL, "no-cache, no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .with_context(|| format!("GET {}", self.primary_url))?;
        let status = resp.status();
        if !status.is_success() {
            bail!("metrics api status {status}");
        }
        resp.json::<JsonValue>().await.context("metrics api body")
    }

    async fn fetch_fallback(&self) -> Result<JsonValue> {
        match &self.fallback {
            FallbackSource::Url(url) => {
                let resp = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("GET fallback {url}"))?
                    .error_for_status()
                    .with_context(|| format!("fallback {url}"))?;
                resp.json::<JsonValue>()
                    .await
                    .with_context(|| format!("fallback body {url}"))
            }
            FallbackSource::File(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("read fallback {}", path.display()))?;
                serde_json::from_slice(&bytes)
                    .with_context(|| format!("parse fallback {}", path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_source_by_scheme() {
        assert_eq!(
            FallbackSource::parse("http://localhost/metrics-example.json"),
            FallbackSource::Url("http://localhost/metrics-example.json".into())
        );
        assert_eq!(
            FallbackSource::parse(" static/metrics-example.json "),
            FallbackSource::File(PathBuf::from("static/metrics-example.json"))
        );
    }

    #[tokio::test]
    async fn missing_fallback_file_propagates() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let fetcher = MetricsFetcher::new(
            &format!("http://{addr}/api/metrics"),
            FallbackSource::File(PathBuf::from("/nonexistent/metrics-example.json")),
        )
        .unwrap();
        let err = fetcher.fetch().await.unwrap_err();
        assert!(format!("{err:#}").contains("read fallback"), "{err:#}");
    }
}
