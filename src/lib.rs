//! Inference dispatch for a pick-a-modality, pick-a-task front end.
//!
//! A front end keeps a [`SessionState`], mutates it as the user picks a
//! [`Modality`] and [`Task`] and supplies text or an image, then calls
//! [`DispatchEngine::dispatch`]. The engine checks the selection against the
//! [`CompatibilityMatrix`], validates the input, runs the matching chain of
//! [`ModelAdapter`]s and returns a formatted [`Outcome`].

pub mod compat;
pub mod config;
pub mod engine;
pub mod error;
pub mod image;
pub mod model;
pub mod session;

pub use compat::{Chain, CompatibilityMatrix, CompatibilityRule, Modality, Stage, Task};
pub use config::{ClassificationParams, EmptyExtractionPolicy, EngineConfig, SummarizationParams};
pub use engine::{
    Adapters, DispatchEngine, EMPTY_TEXT_MESSAGE, MISSING_IMAGE_MESSAGE, NO_EXTRACTABLE_TEXT_MESSAGE,
    Outcome,
};
pub use error::{AdapterFailure, ConfigError, FailureKind, InputError};
pub use image::{FileImageResolver, ImageFormat, ImageInput, ImageReference, ImageResolver};
pub use model::{
    AdapterResult, ClassScore, ImageClassifier, ModelAdapter, PredictionItem, Sentiment,
    SentimentAnalyzer, SummarizeRequest, Summarizer, TextExtractor, invoke,
};
pub use session::{SessionSnapshot, SessionState};
