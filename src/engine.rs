use crate::{
    compat::{Chain, CompatibilityMatrix, Modality, Task},
    config::{EmptyExtractionPolicy, EngineConfig},
    error::{AdapterFailure, FailureKind},
    image::{FileImageResolver, ImageInput, ImageResolver},
    model::{
        ClassScore, ImageClassifier, PredictionItem, Sentiment, SentimentAnalyzer,
        SummarizeRequest, Summarizer, TextExtractor, invoke,
    },
    session::{SessionSnapshot, SessionState},
};
use std::{fmt::Write, time::Instant};

pub const EMPTY_TEXT_MESSAGE: &str = "Please enter some text first!";
pub const MISSING_IMAGE_MESSAGE: &str = "Please upload an image first!";
pub const NO_EXTRACTABLE_TEXT_MESSAGE: &str = "No extractable text found in the image";

/// Result of a single dispatch, ready for a front end to render.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The selection or input was rejected before any adapter ran.
    ValidationError(String),
    /// Formatted model output.
    Success(String),
    /// A stage failed while running; no partial output is kept.
    RuntimeError {
        /// Category of the failed stage.
        kind: FailureKind,
        /// Human-readable cause reported by the stage.
        diagnostic: String,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Text to show in the output area.
    pub fn display_text(&self) -> String {
        match self {
            Outcome::ValidationError(reason) => reason.clone(),
            Outcome::Success(text) => text.clone(),
            Outcome::RuntimeError { diagnostic, .. } => {
                format!("Error running model: {diagnostic}")
            }
        }
    }
}

/// The four adapters an engine routes to.
pub struct Adapters<S, A, C, X> {
    /// Runs for text and image summarization.
    pub summarizer: S,
    /// Runs for text sentiment analysis.
    pub sentiment: A,
    /// Runs for image classification.
    pub classifier: C,
    /// First stage of image summarization.
    pub extractor: X,
}

/// Validated input, matching the selected modality.
enum Input {
    Text(String),
    Image(ImageInput),
}

/// Why a dispatch stopped before producing output.
enum Halt {
    Rejected(String),
    Failed(AdapterFailure),
}

impl From<AdapterFailure> for Halt {
    fn from(failure: AdapterFailure) -> Self {
        Halt::Failed(failure)
    }
}

/// Validates, routes and runs requests against a set of model adapters.
///
/// The engine holds no session data: every call to [`DispatchEngine::dispatch`]
/// borrows the caller's [`SessionState`] for the duration of that call only.
/// Selection and input checks always run before any adapter is touched, so a
/// request that is going to be rejected never pays for model loading.
pub struct DispatchEngine<S, A, C, X>
where
    S: Summarizer,
    A: SentimentAnalyzer,
    C: ImageClassifier,
    X: TextExtractor,
{
    adapters: Adapters<S, A, C, X>,
    resolver: Box<dyn ImageResolver>,
    config: EngineConfig,
}

impl<S, A, C, X> DispatchEngine<S, A, C, X>
where
    S: Summarizer,
    A: SentimentAnalyzer,
    C: ImageClassifier,
    X: TextExtractor,
{
    /// Creates an engine with the default configuration that reads images from disk.
    pub fn new(adapters: Adapters<S, A, C, X>) -> Self {
        Self {
            adapters,
            resolver: Box::new(FileImageResolver),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_resolver(mut self, resolver: impl ImageResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs the session's current selection and input through its adapter chain.
    pub fn dispatch(&mut self, session: &SessionState) -> Outcome {
        let snapshot = session.snapshot();
        log::debug!("Dispatching {} + {}", snapshot.modality, snapshot.task);
        let start_time = Instant::now();

        match self.run(snapshot) {
            Ok(text) => {
                log::info!(
                    "Dispatch {} + {} completed in {:?}",
                    snapshot.modality,
                    snapshot.task,
                    start_time.elapsed()
                );
                Outcome::Success(text)
            }
            Err(Halt::Rejected(reason)) => {
                log::warn!("Dispatch rejected: {reason}");
                Outcome::ValidationError(reason)
            }
            Err(Halt::Failed(failure)) => Outcome::RuntimeError {
                kind: failure.kind,
                diagnostic: failure.message,
            },
        }
    }

    fn run(&mut self, snapshot: SessionSnapshot<'_>) -> Result<String, Halt> {
        let (modality, task) = (snapshot.modality, snapshot.task);
        let chain = CompatibilityMatrix::chain(modality, task)
            .ok_or_else(|| Halt::Rejected(invalid_selection(modality, task)))?;

        let input = self.validate_input(snapshot)?;
        log::debug!("Running chain {:?}", chain.stages());

        match (chain, input) {
            (Chain::Summarize, Input::Text(text)) => self.summarize(text),
            (Chain::AnalyzeSentiment, Input::Text(text)) => self.analyze_sentiment(text),
            (Chain::ClassifyImage, Input::Image(image)) => self.classify_image(image),
            (Chain::ExtractThenSummarize, Input::Image(image)) => {
                self.extract_then_summarize(image)
            }
            _ => Err(Halt::Rejected(invalid_selection(modality, task))),
        }
    }

    fn validate_input(&self, snapshot: SessionSnapshot<'_>) -> Result<Input, Halt> {
        match snapshot.modality {
            Modality::Text => {
                let text = require_text(snapshot.text.unwrap_or_default())?;
                Ok(Input::Text(text))
            }
            Modality::Image => {
                let reference = snapshot
                    .image
                    .ok_or_else(|| Halt::Rejected(MISSING_IMAGE_MESSAGE.to_string()))?;
                let image = self.resolver.resolve(reference).map_err(|e| {
                    log::warn!("Could not resolve image: {e}");
                    AdapterFailure::from(e)
                })?;
                Ok(Input::Image(image))
            }
        }
    }

    fn summarize(&mut self, text: String) -> Result<String, Halt> {
        let params = &self.config.summarization;
        let request = SummarizeRequest {
            text,
            max_length: params.max_length,
            min_length: params.min_length,
            do_sample: params.do_sample,
        };
        let summary = invoke("summarize", &mut self.adapters.summarizer, request).into_result()?;
        Ok(format_summary(&summary))
    }

    fn analyze_sentiment(&mut self, text: String) -> Result<String, Halt> {
        let sentiment =
            invoke("analyze_sentiment", &mut self.adapters.sentiment, text).into_result()?;
        check_confidence(&sentiment.label, sentiment.confidence)?;
        Ok(format_sentiment(&sentiment))
    }

    fn classify_image(&mut self, image: ImageInput) -> Result<String, Halt> {
        let mut scores: Vec<ClassScore> =
            invoke("classify_image", &mut self.adapters.classifier, image).into_result()?;

        if scores.is_empty() {
            return Err(AdapterFailure::model("classifier returned no predictions").into());
        }
        for score in &scores {
            check_confidence(&score.label, score.confidence)?;
        }
        if let Some(top_k) = self.config.classification.top_k {
            scores.truncate(top_k);
        }

        Ok(format_predictions(&PredictionItem::ranked(scores)))
    }

    fn extract_then_summarize(&mut self, image: ImageInput) -> Result<String, Halt> {
        let extracted =
            invoke("extract_text", &mut self.adapters.extractor, image).into_result()?;

        let text = match self.config.empty_extraction {
            EmptyExtractionPolicy::FallThrough => require_text(&extracted)?,
            EmptyExtractionPolicy::Reject => {
                let text = extracted.trim();
                if text.is_empty() {
                    log::warn!("Text extraction yielded no text");
                    return Err(AdapterFailure::new(
                        FailureKind::NoExtractableText,
                        NO_EXTRACTABLE_TEXT_MESSAGE,
                    )
                    .into());
                }
                text.to_string()
            }
        };

        log::debug!("Extracted {} characters of text", text.len());
        self.summarize(text)
    }
}

fn invalid_selection(modality: Modality, task: Task) -> String {
    format!("Invalid selection: {modality} + {task}")
}

fn require_text(text: &str) -> Result<String, Halt> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Halt::Rejected(EMPTY_TEXT_MESSAGE.to_string()));
    }
    Ok(text.to_string())
}

fn check_confidence(label: &str, confidence: f32) -> Result<(), AdapterFailure> {
    if confidence.is_finite() && (0.0..=1.0).contains(&confidence) {
        Ok(())
    } else {
        Err(AdapterFailure::model(format!(
            "confidence {confidence} for {label} is outside [0, 1]"
        )))
    }
}

pub fn format_summary(summary: &str) -> String {
    format!("Summary:\n{summary}")
}

pub fn format_sentiment(sentiment: &Sentiment) -> String {
    format!(
        "Sentiment: {} (Confidence: {:.2})",
        sentiment.label, sentiment.confidence
    )
}

pub fn format_predictions(predictions: &[PredictionItem]) -> String {
    let mut out = String::from("Top Predictions:\n");
    for item in predictions {
        // writing into a String cannot fail
        let _ = writeln!(
            out,
            "{} {} (Confidence: {:.2})",
            item.rank, item.label, item.confidence
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_format() {
        assert_eq!(format_summary("Short."), "Summary:\nShort.");
    }

    #[test]
    fn sentiment_format_rounds_to_two_decimals() {
        let sentiment = Sentiment {
            label: "NEGATIVE".to_string(),
            confidence: 0.9996,
        };
        assert_eq!(
            format_sentiment(&sentiment),
            "Sentiment: NEGATIVE (Confidence: 1.00)"
        );
    }

    #[test]
    fn predictions_format_one_line_each() {
        let items = PredictionItem::ranked(vec![
            ClassScore::new("tabby", 0.7),
            ClassScore::new("tiger cat", 0.2),
        ]);
        assert_eq!(
            format_predictions(&items),
            "Top Predictions:\n1 tabby (Confidence: 0.70)\n2 tiger cat (Confidence: 0.20)\n"
        );
    }

    #[test]
    fn require_text_trims() {
        assert!(matches!(require_text("  hi \n"), Ok(text) if text == "hi"));
        assert!(matches!(require_text(" \t\n"), Err(Halt::Rejected(msg)) if msg == EMPTY_TEXT_MESSAGE));
    }

    #[test]
    fn confidence_bounds() {
        assert!(check_confidence("a", 0.0).is_ok());
        assert!(check_confidence("a", 1.0).is_ok());
        assert!(check_confidence("a", 1.5).is_err());
        assert!(check_confidence("a", f32::NAN).is_err());
    }

    #[test]
    fn runtime_error_display() {
        let outcome = Outcome::RuntimeError {
            kind: FailureKind::ModelError,
            diagnostic: "out of memory".to_string(),
        };
        assert_eq!(outcome.display_text(), "Error running model: out of memory");
        assert!(!outcome.is_success());
    }
}
