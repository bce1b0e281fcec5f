// image-analyzer - send images and a prompt to a multimodal model, one request per image

pub mod analysis;
pub mod config;
pub mod render;

pub use analysis::{
    AnalysisRequest, AnalysisResult, BatchAnalyzer, FailurePolicy, GeminiClient,
    GenerationClient, GenerationFailure, ImageDecoder, ImageHandle, Outcome, SessionController,
    SessionState,
};
pub use config::AnalyzerConfig;
