// Analysis pipeline - decode uploads, run the batch, keep session state

pub mod batch;
pub mod client;
pub mod decoder;
pub mod session;
pub mod types;

pub use batch::{BatchAnalyzer, FailurePolicy, GenerationFailure};
pub use client::{ClientError, GeminiClient, GenerationClient};
pub use decoder::{DecodeError, ImageDecoder};
pub use session::{SessionController, SessionState, TurnError, TurnReport};
pub use types::*;
