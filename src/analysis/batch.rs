// Batch analyzer - runs one generation call per image, in order

use super::client::GenerationClient;
use super::types::{AnalysisRequest, AnalysisResult, ImageHandle, effective_prompt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// How a failed call affects the rest of the batch
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// The first failure aborts the batch and no results are returned
    #[default]
    StopOnError,
    /// Every image gets its own Success or Failure entry
    BestEffort,
}

/// Sends each image of a batch to the generation client and collects the
/// answers in input order.
///
/// Calls are strictly sequential. Under [`FailurePolicy::StopOnError`] the
/// caller either gets one result per image or a single [`GenerationFailure`],
/// never a partial list.
pub struct BatchAnalyzer {
    client: Arc<dyn GenerationClient>,
    policy: FailurePolicy,
}

impl BatchAnalyzer {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self {
            client,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Analyze every image with the given prompt
    pub async fn run(
        &self,
        api_key: &str,
        prompt: &str,
        images: &[ImageHandle],
    ) -> Result<Vec<AnalysisResult>, GenerationFailure> {
        info!(
            images = images.len(),
            model = self.client.model(),
            policy = ?self.policy,
            "starting batch"
        );

        let mut results = Vec::with_capacity(images.len());

        for (index, image) in images.iter().enumerate() {
            let prompt = effective_prompt(prompt);

            match self.client.generate(api_key, prompt, image).await {
                Ok(text) => {
                    results.push(AnalysisResult::success(index, image.filename.as_str(), text));
                }
                Err(e) => {
                    warn!(index, filename = %image.filename, error = %e, "generation failed");

                    match self.policy {
                        FailurePolicy::StopOnError => {
                            return Err(GenerationFailure {
                                message: e.to_string(),
                                processed: index,
                                total: images.len(),
                                filename: image.filename.clone(),
                            });
                        }
                        FailurePolicy::BestEffort => {
                            results.push(AnalysisResult::failed(
                                index,
                                image.filename.as_str(),
                                e.to_string(),
                            ));
                        }
                    }
                }
            }
        }

        info!(results = results.len(), "batch complete");
        Ok(results)
    }

    pub async fn run_request(
        &self,
        api_key: &str,
        request: &AnalysisRequest,
    ) -> Result<Vec<AnalysisResult>, GenerationFailure> {
        self.run(api_key, &request.prompt, &request.images).await
    }
}

/// A whole batch aborted on its first failing image
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} (failed on {filename} after {processed} of {total} image(s))")]
pub struct GenerationFailure {
    /// Underlying client error
    pub message: String,
    /// Images that completed before the failure
    pub processed: usize,
    pub total: usize,
    pub filename: String,
}
