//! Generation pipeline: fills every placeholder of a template, in template order.
//!
//! Per placeholder: descriptor lookup, prompt, one completion round trip, normalization.
//! A missing descriptor, an empty completion or a normalization failure is recorded
//! against that placeholder and the run carries on. A transport failure aborts the
//! run, since every later call would fail the same way.

use crate::assemble;
use crate::error::{FailureReason, GenerationError, ProviderError};
use crate::normalize::normalize;
use crate::prompts::PromptCatalog;
use crate::provider::CompletionClient;
use crate::strategy::{build_prompt, GenerationRequest};
use crate::template::{DocumentType, Markup, TemplateDocument};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Outcome of one placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultStatus {
    Ok,
    Failed(FailureReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub placeholder: String,
    /// Normalized value; empty when failed
    pub value: String,
    pub status: ResultStatus,
}

impl GenerationResult {
    pub fn ok(placeholder: &str, value: String) -> Self {
        Self {
            placeholder: placeholder.to_string(),
            value,
            status: ResultStatus::Ok,
        }
    }

    pub fn failed(placeholder: &str, reason: FailureReason) -> Self {
        Self {
            placeholder: placeholder.to_string(),
            value: String::new(),
            status: ResultStatus::Failed(reason),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResultStatus::Ok
    }
}

/// Final output of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub doc_type: DocumentType,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub document: RenderedDocument,
    /// One entry per placeholder, in template order
    pub results: Vec<GenerationResult>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl GenerationReport {
    pub fn failed(&self) -> Vec<(&str, &FailureReason)> {
        self.results
            .iter()
            .filter_map(|result| match &result.status {
                ResultStatus::Failed(reason) => Some((result.placeholder.as_str(), reason)),
                ResultStatus::Ok => None,
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.results.iter().all(GenerationResult::is_ok)
    }
}

/// Cooperative cancellation, checked between placeholders.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Receives per-placeholder progress. The CLI uses it for terminal status lines.
pub trait ProgressSink: Send + Sync {
    fn field_started(&self, _placeholder: &str, _position: usize, _total: usize) {}
    fn field_finished(&self, _result: &GenerationResult) {}
}

struct NoProgress;

impl ProgressSink for NoProgress {}

#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub model: String,
    /// Overrides the template's own markup when set
    pub markup: Option<Markup>,
    /// Extra attempts after an empty completion
    pub empty_response_retries: u32,
}

/// Runs the pipeline over immutable snapshots of the prompt catalog and a client.
pub struct Generator<'a> {
    catalog: &'a PromptCatalog,
    client: &'a dyn CompletionClient,
    options: GenerationOptions,
    progress: &'a dyn ProgressSink,
}

type FieldOutcome = Result<String, FailureReason>;

impl<'a> Generator<'a> {
    pub fn new(
        catalog: &'a PromptCatalog,
        client: &'a dyn CompletionClient,
        options: GenerationOptions,
    ) -> Self {
        Self {
            catalog,
            client,
            options,
            progress: &NoProgress,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = progress;
        self
    }

    pub async fn generate(
        &self,
        context: &str,
        template: &TemplateDocument,
        cancel: &CancelFlag,
    ) -> Result<GenerationReport, GenerationError> {
        let started_at = Utc::now();
        let timer = Instant::now();
        let markup = self.options.markup.unwrap_or(template.markup);
        let total = template.placeholders.len();

        info!(
            doc_type = %template.doc_type,
            placeholders = total,
            model = %self.options.model,
            provider = self.client.provider_name(),
            "Generation started"
        );

        let mut results = Vec::with_capacity(total);
        for (index, placeholder) in template.placeholders.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(placeholder = %placeholder, "Generation cancelled before field");
                return Err(GenerationError::Cancelled);
            }
            self.progress.field_started(placeholder, index + 1, total);

            let result = match self.generate_field(placeholder, context, markup).await? {
                Ok(value) => {
                    info!(placeholder = %placeholder, "Field generated");
                    GenerationResult::ok(placeholder, value)
                }
                Err(reason) => {
                    warn!(placeholder = %placeholder, reason = %reason, "Field generation failed");
                    GenerationResult::failed(placeholder, reason)
                }
            };
            self.progress.field_finished(&result);
            results.push(result);
        }

        let by_name: HashMap<String, GenerationResult> = results
            .iter()
            .map(|result| (result.placeholder.clone(), result.clone()))
            .collect();
        let text = assemble::render(template, &by_name);
        let elapsed = timer.elapsed();

        info!(
            doc_type = %template.doc_type,
            failed = results.iter().filter(|r| !r.is_ok()).count(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Generation completed"
        );

        Ok(GenerationReport {
            document: RenderedDocument {
                doc_type: template.doc_type,
                text,
            },
            results,
            started_at,
            elapsed,
        })
    }

    /// Inner result is the per-placeholder outcome; the outer error aborts the run.
    async fn generate_field(
        &self,
        placeholder: &str,
        context: &str,
        markup: Markup,
    ) -> Result<FieldOutcome, GenerationError> {
        let Some(descriptor) = self.catalog.descriptor(placeholder) else {
            return Ok(Err(FailureReason::UnknownPlaceholder));
        };

        let prompt = build_prompt(&GenerationRequest {
            placeholder,
            descriptor,
            user_context: context,
            system_prompt: self.catalog.system_prompt(),
            markup,
        });
        debug!(
            placeholder = %placeholder,
            strategy = descriptor.strategy.name(),
            "Prompt built"
        );

        let mut attempt = 0u32;
        let raw = loop {
            attempt += 1;
            match self
                .client
                .complete(&prompt.system, &prompt.user, &self.options.model)
                .await
            {
                Ok(raw) => break raw,
                Err(ProviderError::Transport(message)) => {
                    error!(placeholder = %placeholder, error = %message, "LLM transport failure");
                    return Err(GenerationError::Transport(message));
                }
                Err(ProviderError::EmptyResponse) if attempt <= self.options.empty_response_retries => {
                    debug!(placeholder = %placeholder, attempt, "Empty completion, retrying");
                }
                Err(ProviderError::EmptyResponse) => {
                    return Ok(Err(FailureReason::EmptyResponse));
                }
            }
        };

        Ok(normalize(&descriptor.strategy, &raw, markup).map_err(FailureReason::from))
    }
}

/// Placeholders of a template that have no descriptor in the catalog.
pub fn unresolved_placeholders<'t>(
    template: &'t TemplateDocument,
    catalog: &PromptCatalog,
) -> Vec<&'t str> {
    template
        .placeholders
        .iter()
        .map(String::as_str)
        .filter(|name| catalog.descriptor(name).is_none())
        .collect()
}
