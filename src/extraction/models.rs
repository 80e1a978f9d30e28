//! Extraction request, result and collaborator types.
//!
//! The extraction call itself is performed by an [`Extractor`] implementation
//! supplied by the host. This module only defines the boundary: what the
//! orchestrator hands over and what it expects back.

// Author: kelexine (https://github.com/kelexine)

use crate::cache::CacheEntry;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A document to extract from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// One extraction job as submitted by a caller.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionRequest {
    pub model: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// JSON Schema the output must conform to.
    pub schema: Value,
    /// Few-shot examples, appended to the cacheable payload when present.
    #[serde(default)]
    pub examples: Option<String>,
    pub document: Document,
    /// Whether to consult the cache ledger for this job.
    #[serde(default = "default_true")]
    pub use_cache: bool,
    /// A previously reported cache id to reuse.
    #[serde(default)]
    pub cache_id: Option<String>,
    /// TTL for a newly created entry; the ledger default applies otherwise.
    #[serde(default)]
    pub cache_ttl_hours: Option<f64>,
}

fn default_true() -> bool {
    true
}

/// What the external extractor receives. It never carries a cache id: cache
/// bookkeeping stays on this side of the boundary.
#[derive(Debug, Clone)]
pub struct ExtractionCall {
    pub job_id: Uuid,
    pub model: String,
    pub system_prompt: Option<String>,
    pub schema: Value,
    pub examples: Option<String>,
    pub document: Document,
}

/// Provider-reported token usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

/// What the external extractor returns.
#[derive(Debug, Clone)]
pub struct ExtractionOutput {
    pub data: Value,
    pub usage: TokenUsage,
}

/// The external extraction call (prompting, dispatch, response parsing).
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn generate(&self, call: ExtractionCall) -> Result<ExtractionOutput>;
}

/// Cache metadata attached to a job for observability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheReport {
    pub cache_hit: bool,
    pub cache_id: String,
    /// Tokens booked as saved (hits only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_saved: Option<u64>,
    /// Estimated size of the newly tracked payload (misses only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_tokens: Option<u64>,
    /// One-time creation cost estimate in USD (misses only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_cost: Option<f64>,
    /// Payload is smaller than the provider's minimum cacheable size.
    #[serde(default)]
    pub below_threshold: bool,
}

impl CacheReport {
    pub fn hit(entry: &CacheEntry) -> Self {
        Self {
            cache_hit: true,
            cache_id: entry.id.clone(),
            tokens_saved: Some(entry.input_token_estimate),
            cached_tokens: None,
            creation_cost: None,
            below_threshold: false,
        }
    }

    pub fn created(entry: &CacheEntry, creation_cost: f64, below_threshold: bool) -> Self {
        Self {
            cache_hit: false,
            cache_id: entry.id.clone(),
            tokens_saved: None,
            cached_tokens: Some(entry.input_token_estimate),
            creation_cost: Some(creation_cost),
            below_threshold,
        }
    }
}

/// Result of one extraction job: the data, actual usage, our estimate and cache metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub job_id: Uuid,
    pub model: String,
    pub document_name: String,
    pub data: Value,
    pub usage: TokenUsage,
    pub estimated_input_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheReport>,
}
