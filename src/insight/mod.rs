pub mod prompt;
pub mod session;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::assessment::{Dimension, DimensionId};
use crate::config::InsightConfig;
use crate::scoring::{Score, ScoreError};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Upper bound on memoized insights. Keys come from request bodies.
const MAX_CACHED_INSIGHTS: usize = 256;

// ── Errors ─────────────────────────────────────────────────────────

/// Why an insight could not be produced. Every variant means the same thing
/// to a caller: the insight is unavailable and the dashboard carries on
/// without it.
#[derive(Debug, thiserror::Error)]
pub enum InsightError {
    #[error("no API key configured for insight generation")]
    MissingApiKey,
    #[error(transparent)]
    Invalid(#[from] ScoreError),
    #[error("insight request timed out")]
    Timeout,
    #[error("insight request failed: {0}")]
    Network(String),
    #[error("insight service returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("malformed insight response: {0}")]
    MalformedResponse(String),
    #[error("insight response contained no text")]
    EmptyInsight,
}

impl InsightError {
    /// Failures worth a single automatic retry.
    pub fn is_transient(&self) -> bool {
        match self {
            InsightError::Timeout | InsightError::Network(_) => true,
            InsightError::Upstream { status, .. } => {
                matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for InsightError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            InsightError::Timeout
        } else {
            InsightError::Network(e.to_string())
        }
    }
}

// ── Generator seam ─────────────────────────────────────────────────

/// Produces a short prose insight about one focus dimension.
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    async fn generate(
        &self,
        focus: &Dimension,
        all: &[Dimension],
        overall: Score,
    ) -> Result<String, InsightError>;

    fn is_enabled(&self) -> bool {
        true
    }
}

// ── Memo key ───────────────────────────────────────────────────────

/// Identifies an insight request by its focus dimension and every score
/// that feeds the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InsightKey {
    pub dimension_id: DimensionId,
    snapshot: Vec<u32>,
}

impl InsightKey {
    pub fn new(focus: &Dimension, all: &[Dimension], overall: Score) -> Self {
        let mut snapshot = vec![u32::from(overall.value())];
        snapshot.push(u32::from(focus.user_score.value()));
        snapshot.push(u32::from(focus.partner_score.value()));
        for sub in &focus.sub_dimensions {
            snapshot.push(u32::from(sub.user_score.value()));
            snapshot.push(u32::from(sub.partner_score.value()));
        }
        for d in all {
            snapshot.push(d.id);
            snapshot.push(u32::from(d.user_score.value()));
            snapshot.push(u32::from(d.partner_score.value()));
        }
        Self {
            dimension_id: focus.id,
            snapshot,
        }
    }
}

/// Memoized insights, one slot per key.
///
/// A slot is shared by every request for its key, so concurrent identical
/// requests wait on a single upstream call. Slots are evicted oldest first
/// once the cache is full.
#[derive(Default)]
struct InsightCache {
    slots: HashMap<InsightKey, Arc<OnceCell<String>>>,
    order: VecDeque<InsightKey>,
}

impl InsightCache {
    fn slot(&mut self, key: &InsightKey) -> Arc<OnceCell<String>> {
        if let Some(slot) = self.slots.get(key) {
            return Arc::clone(slot);
        }
        while self.slots.len() >= MAX_CACHED_INSIGHTS {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.slots.remove(&oldest);
        }
        let slot = Arc::new(OnceCell::new());
        self.slots.insert(key.clone(), Arc::clone(&slot));
        self.order.push_back(key.clone());
        slot
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.len()
    }
}

// ── Response payload ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Pull the first text block out of a Messages API response body.
fn extract_text(body: &str) -> Result<String, InsightError> {
    let parsed: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| InsightError::MalformedResponse(e.to_string()))?;

    let text = parsed
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .ok_or_else(|| InsightError::MalformedResponse("no text block in response".to_string()))?;

    let text = text.trim();
    if text.is_empty() {
        return Err(InsightError::EmptyInsight);
    }
    Ok(text.to_string())
}

// ── Service ────────────────────────────────────────────────────────

/// Generates insights through the Anthropic Messages API.
///
/// Requests time out after the configured duration and transient failures
/// are retried once. Successful results are memoized, up to
/// `MAX_CACHED_INSIGHTS` of them.
pub struct InsightService {
    config: InsightConfig,
    client: reqwest::Client,
    cache: Mutex<InsightCache>,
}

impl InsightService {
    pub fn new(config: InsightConfig) -> Result<Self, InsightError> {
        if config.api_key.is_some() {
            info!("ANTHROPIC_API_KEY found, insights enabled (model {})", config.model);
        } else {
            warn!("ANTHROPIC_API_KEY not set, insights disabled");
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            config,
            client,
            cache: Mutex::new(InsightCache::default()),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn retry_delay(&self) -> Duration {
        let base = self.config.retry_delay.as_millis() as u64;
        let jitter = rand::thread_rng().gen_range(0..=base / 2);
        Duration::from_millis(base + jitter)
    }

    async fn request_once(&self, api_key: &str, prompt: &str) -> Result<String, InsightError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        });

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(InsightError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        extract_text(&text)
    }

    /// One upstream call, plus a single retry when the first attempt failed
    /// transiently.
    async fn fetch(
        &self,
        api_key: &str,
        focus: &Dimension,
        all: &[Dimension],
        overall: Score,
    ) -> Result<String, InsightError> {
        let prompt = prompt::build_prompt(focus, all, overall);
        let insight = match self.request_once(api_key, &prompt).await {
            Err(e) if e.is_transient() => {
                let delay = self.retry_delay();
                warn!(
                    "Insight request for {} failed: {}. Retrying once in {:?}",
                    focus.name, e, delay
                );
                tokio::time::sleep(delay).await;
                self.request_once(api_key, &prompt).await?
            }
            result => result?,
        };

        info!("Generated insight for {} ({} chars)", focus.name, insight.len());
        Ok(insight)
    }
}

#[async_trait]
impl InsightGenerator for InsightService {
    async fn generate(
        &self,
        focus: &Dimension,
        all: &[Dimension],
        overall: Score,
    ) -> Result<String, InsightError> {
        if all.is_empty() {
            return Err(ScoreError::EmptyDimensions.into());
        }
        let api_key = self.config.api_key.as_deref().ok_or(InsightError::MissingApiKey)?;

        let key = InsightKey::new(focus, all, overall);
        let slot = self.cache.lock().await.slot(&key);
        if let Some(hit) = slot.get() {
            debug!("Insight cache hit for dimension {}", focus.id);
            return Ok(hit.clone());
        }

        // Failures leave the slot empty, so the next request tries again.
        let insight = slot
            .get_or_try_init(|| self.fetch(api_key, focus, all, overall))
            .await?;
        Ok(insight.clone())
    }

    fn is_enabled(&self) -> bool {
        self.has_api_key()
    }
}
