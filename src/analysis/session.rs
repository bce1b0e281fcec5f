// Session state and the "Analyze" turn handler

use super::batch::{BatchAnalyzer, GenerationFailure};
use super::decoder::{DecodeError, ImageDecoder};
use super::types::{AnalysisRequest, AnalysisResult, ImageHandle, effective_prompt};
use chrono::{DateTime, Local};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Everything the user has entered or been shown in the current session.
///
/// Owned by the front-end and lent to the controller for each turn.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub prompt: String,
    pub images: Vec<ImageHandle>,
    pub results: Vec<AnalysisResult>,
    pub last_error: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop prompt, images and results in one go
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::default();
        self
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn add_image(&mut self, image: ImageHandle) {
        self.images.push(image);
    }

    /// Remove the first image with this filename
    pub fn remove_image(&mut self, filename: &str) -> Option<ImageHandle> {
        let pos = self.images.iter().position(|i| i.filename == filename)?;
        Some(self.images.remove(pos))
    }

    /// Snapshot of the current inputs
    pub fn request(&self) -> AnalysisRequest {
        AnalysisRequest::new(self.prompt.clone(), self.images.clone())
    }
}

/// Summary of a batch that ran to the end
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub images: usize,
    /// Images reported as failures (only under best-effort)
    pub failed: usize,
    pub prompt: String,
    pub completed_at: DateTime<Local>,
    pub elapsed: Duration,
}

impl TurnReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Handles one user action at a time against a caller-owned [`SessionState`]
pub struct SessionController {
    analyzer: BatchAnalyzer,
    decoder: ImageDecoder,
    api_key: Option<String>,
}

impl SessionController {
    pub fn new(analyzer: BatchAnalyzer, api_key: Option<String>) -> Self {
        Self {
            analyzer,
            decoder: ImageDecoder::new(),
            api_key,
        }
    }

    pub fn analyzer(&self) -> &BatchAnalyzer {
        &self.analyzer
    }

    /// Decode a file from disk and add it to the session
    pub async fn add_image(
        &self,
        state: &mut SessionState,
        path: impl AsRef<Path>,
    ) -> Result<ImageHandle, DecodeError> {
        let image = self.decoder.decode_file(path).await?;
        state.add_image(image.clone());
        Ok(image)
    }

    pub fn reset(&self, state: &mut SessionState) {
        debug!("session reset");
        state.reset();
    }

    /// Run the batch for the current prompt and images.
    ///
    /// On success the results replace any previous ones. On a generation
    /// failure the results are cleared and the message kept in `last_error`.
    /// Configuration and empty-input problems leave the state untouched.
    pub async fn analyze(&self, state: &mut SessionState) -> Result<TurnReport, TurnError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| TurnError::ConfigurationError("GEMINI_API_KEY is not set".to_string()))?;

        if state.images.is_empty() {
            return Err(TurnError::EmptyInputWarning);
        }

        state.results.clear();
        state.last_error = None;

        let started = Instant::now();
        let outcome = self.analyzer.run(api_key, &state.prompt, &state.images).await;
        match outcome {
            Ok(results) => {
                let failed = results.iter().filter(|r| !r.outcome.is_success()).count();
                state.results = results;
                let report = TurnReport {
                    images: state.images.len(),
                    failed,
                    prompt: effective_prompt(&state.prompt).to_string(),
                    completed_at: Local::now(),
                    elapsed: started.elapsed(),
                };
                info!(
                    images = report.images,
                    failed = report.failed,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "turn complete"
                );
                Ok(report)
            }
            Err(failure) => {
                state.last_error = Some(failure.to_string());
                Err(failure.into())
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Please upload at least one image and enter a prompt.")]
    EmptyInputWarning,

    #[error("Something went wrong: {0}")]
    GenerationFailure(#[from] GenerationFailure),
}

impl TurnError {
    /// Warnings block the action but are not failures of the batch itself
    pub fn is_warning(&self) -> bool {
        !matches!(self, TurnError::GenerationFailure(_))
    }
}
