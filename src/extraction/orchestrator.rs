// Extraction orchestrator - cache reuse decisions around the extraction call
// Author: kelexine (https://github.com/kelexine)

use crate::cache::CacheLedger;
use crate::error::Result;
use crate::extraction::models::{
    CacheReport, ExtractionCall, ExtractionRequest, ExtractionResult, Extractor,
};
use crate::metrics;
use crate::models::canonical_model;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Runs extraction jobs, keeping cache bookkeeping next to the real call.
///
/// The ledger is injected rather than global so that independent orchestrators
/// (and tests) can each own an isolated ledger.
pub struct Orchestrator {
    ledger: Arc<CacheLedger>,
    extractor: Arc<dyn Extractor>,
}

impl Orchestrator {
    pub fn new(ledger: Arc<CacheLedger>, extractor: Arc<dyn Extractor>) -> Self {
        Self { ledger, extractor }
    }

    pub fn ledger(&self) -> &Arc<CacheLedger> {
        &self.ledger
    }

    /// Build the cacheable payload: the schema, plus few-shot examples when present.
    ///
    /// The per-document content is never part of it, so one entry serves every
    /// document extracted against the same schema.
    pub fn cacheable_payload(schema: &Value, examples: Option<&str>) -> Result<String> {
        let schema_text = serde_json::to_string_pretty(schema)?;
        Ok(match examples.filter(|e| !e.trim().is_empty()) {
            Some(examples) => format!("{}\n\nExamples:\n{}", schema_text, examples),
            None => schema_text,
        })
    }

    /// Run one extraction job.
    ///
    /// Cache failures never fail the job; extractor failures do.
    pub async fn extract(&self, request: ExtractionRequest) -> Result<ExtractionResult> {
        let job_id = Uuid::new_v4();
        let model = canonical_model(&request.model);

        info!(
            "Extraction job {}: model={}, document={} ({} bytes), cache={}",
            job_id,
            model,
            request.document.name,
            request.document.bytes.len(),
            request.use_cache
        );

        let cache = if request.use_cache && self.ledger.config().enabled {
            self.resolve_cache(&request, &model)
        } else {
            debug!("Caching disabled for job {}", job_id);
            None
        };

        let schema_text = serde_json::to_string(&request.schema).unwrap_or_default();
        let estimated_input_tokens = self.ledger.estimate_tokens(&[
            request.system_prompt.as_deref().unwrap_or_default().as_bytes(),
            schema_text.as_bytes(),
            request.examples.as_deref().unwrap_or_default().as_bytes(),
            request.document.bytes.as_slice(),
        ]);
        metrics::record_tokens(&model, "estimated_input", estimated_input_tokens);

        let document_name = request.document.name.clone();
        let call = ExtractionCall {
            job_id,
            model: model.clone(),
            system_prompt: request.system_prompt,
            schema: request.schema,
            examples: request.examples,
            document: request.document,
        };

        let started = Instant::now();
        let outcome = self.extractor.generate(call).await;
        metrics::record_extraction(&model, outcome.is_ok(), started.elapsed().as_secs_f64());

        let output = outcome.map_err(|e| {
            error!("Extraction job {} failed: {}", job_id, e);
            e
        })?;

        metrics::record_tokens(&model, "input", output.usage.input_tokens);
        metrics::record_tokens(&model, "output", output.usage.output_tokens);

        debug!(
            "Extraction job {} done: estimated {} input tokens, provider reported {}",
            job_id, estimated_input_tokens, output.usage.input_tokens
        );

        Ok(ExtractionResult {
            job_id,
            model,
            document_name,
            data: output.data,
            usage: output.usage,
            estimated_input_tokens,
            cache,
        })
    }

    /// Reuse the requested entry if it is live, otherwise track the payload as a new entry.
    fn resolve_cache(&self, request: &ExtractionRequest, model: &str) -> Option<CacheReport> {
        if let Some(cache_id) = &request.cache_id {
            match self.ledger.get(cache_id) {
                Some(entry) => {
                    return match self.ledger.record_hit(entry.input_token_estimate, None, &entry.model) {
                        Ok(_) => {
                            info!("Cache hit {}: ~{} tokens saved", entry.id, entry.input_token_estimate);
                            Some(CacheReport::hit(&entry))
                        }
                        Err(e) => {
                            warn!("Failed to record cache hit, continuing without cache: {}", e);
                            None
                        }
                    };
                }
                None => {
                    metrics::record_cache_operation("miss");
                    debug!("Cache {} missing or expired, creating a new entry", cache_id);
                }
            }
        }

        let payload = match Self::cacheable_payload(&request.schema, request.examples.as_deref()) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Could not build cacheable payload, continuing without cache: {}", e);
                return None;
            }
        };

        let system_prompt = request.system_prompt.as_deref();
        let estimate = self.ledger.estimate_tokens(&[
            payload.as_bytes(),
            system_prompt.unwrap_or_default().as_bytes(),
        ]);
        let advice = self.ledger.advise(model, estimate);

        match self
            .ledger
            .create(model, &payload, system_prompt, request.cache_ttl_hours)
        {
            Ok(entry) => {
                let creation_cost = self.ledger.creation_cost(&entry.model, entry.input_token_estimate);
                metrics::record_tokens(model, "cached", entry.input_token_estimate);
                Some(CacheReport::created(&entry, creation_cost, !advice.worthwhile()))
            }
            Err(e) => {
                warn!("Cache bookkeeping failed, continuing without cache: {}", e);
                None
            }
        }
    }
}
