// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Places details lookup adapter.
//!
//! Implements [`BusinessLookup`] against a Places-style details endpoint
//! (`GET {base_url}/places/{id}`). Unknown ids map to `Ok(None)`; transient
//! failures (429, 500, 503) are retried once.

pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use concierge_config::model::PlacesConfig;
use concierge_core::{
    AdapterType, BusinessDetails, BusinessLookup, ConciergeError, HealthStatus, PluginAdapter,
};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use tracing::{debug, info, warn};

use crate::types::{FIELD_MASK, Place};

/// HTTP-backed business lookup.
#[derive(Debug, Clone)]
pub struct PlacesLookup {
    client: reqwest::Client,
    base_url: Url,
    language_code: String,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl PlacesLookup {
    /// Builds the lookup from config.
    ///
    /// API key resolution order: `places.api_key` -> `PLACES_API_KEY` env var -> error.
    pub fn new(config: &PlacesConfig) -> Result<Self, ConciergeError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let lookup = Self::with_api_key(config, &api_key)?;
        info!(base_url = %lookup.base_url, "places lookup initialized");
        Ok(lookup)
    }

    /// Builds the lookup with an explicit key, skipping env resolution.
    pub fn with_api_key(config: &PlacesConfig, api_key: &str) -> Result<Self, ConciergeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key).map_err(|e| {
                ConciergeError::Config(format!("invalid places API key header value: {e}"))
            })?,
        );
        headers.insert("x-goog-fieldmask", HeaderValue::from_static(FIELD_MASK));

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ConciergeError::Lookup {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ConciergeError::Config(format!("invalid places.base_url {}: {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConciergeError::Config(format!(
                "places.base_url {} cannot be used as a base URL",
                config.base_url
            )));
        }

        Ok(Self {
            client,
            base_url,
            language_code: config.language_code.clone(),
            timeout,
            max_retries: 1,
            retry_delay: Duration::from_millis(500),
        })
    }

    /// Overrides the pause before a retry (tests use zero).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Details URL for one business, with the id escaped as a single path segment.
    fn details_url(&self, business_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("places").push(business_id);
        }
        url.query_pairs_mut()
            .append_pair("languageCode", &self.language_code);
        url
    }

    fn request_error(&self, business_id: &str, e: reqwest::Error) -> ConciergeError {
        if e.is_timeout() {
            return ConciergeError::Timeout {
                duration: self.timeout,
            };
        }
        ConciergeError::Lookup {
            message: format!("request for {business_id} failed: {e}"),
            source: Some(Box::new(e)),
        }
    }
}

#[async_trait]
impl PluginAdapter for PlacesLookup {
    fn name(&self) -> &str {
        "places"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Lookup
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ConciergeError> {
        Ok(())
    }
}

#[async_trait]
impl BusinessLookup for PlacesLookup {
    async fn lookup(&self, business_id: &str) -> Result<Option<BusinessDetails>, ConciergeError> {
        let url = self.details_url(business_id);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(business_id, attempt, "retrying places lookup after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| self.request_error(business_id, e))?;

            let status = response.status();
            debug!(business_id, status = %status, attempt, "places response received");

            if status.is_success() {
                let place: Place = response.json().await.map_err(|e| ConciergeError::Lookup {
                    message: format!("failed to parse places response for {business_id}: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return Ok(Some(place.into()));
            }

            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }

            let body = response.text().await.unwrap_or_default();
            let error = ConciergeError::Lookup {
                message: format!("places API returned {status} for {business_id}: {body}"),
                source: None,
            };
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(business_id, status = %status, "transient places error, will retry");
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error.unwrap_or_else(|| ConciergeError::Lookup {
            message: format!("places lookup for {business_id} failed after retries"),
            source: None,
        }))
    }
}

fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, ConciergeError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("PLACES_API_KEY").map_err(|_| {
        ConciergeError::Config(
            "Places API key not found. Set places.api_key in config or PLACES_API_KEY environment variable.".into(),
        )
    })
}
