use crate::{error::AdapterFailure, image::ImageInput};
use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    time::Instant,
};

/// Trait for wrapping an opaque inference capability behind a uniform call.
///
/// Implementors may keep loaded weights or other caches in `self`; the engine
/// owns the adapter for its whole lifetime, so that state survives across
/// dispatches.
pub trait ModelAdapter {
    /// The input the model accepts.
    type Request;
    /// The raw output the model produces.
    type Response;
    /// The error the model may return.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs inference on the given request.
    fn run(&mut self, request: Self::Request) -> Result<Self::Response, Self::Error>;
}

/// `summarize(text) -> text`.
pub trait Summarizer: ModelAdapter<Request = SummarizeRequest, Response = String> {}
impl<T: ModelAdapter<Request = SummarizeRequest, Response = String>> Summarizer for T {}

/// `analyzeSentiment(text) -> (label, confidence)`.
pub trait SentimentAnalyzer: ModelAdapter<Request = String, Response = Sentiment> {}
impl<T: ModelAdapter<Request = String, Response = Sentiment>> SentimentAnalyzer for T {}

/// `classifyImage(image) -> scores`, best first.
pub trait ImageClassifier: ModelAdapter<Request = ImageInput, Response = Vec<ClassScore>> {}
impl<T: ModelAdapter<Request = ImageInput, Response = Vec<ClassScore>>> ImageClassifier for T {}

/// `extractText(image) -> text`.
pub trait TextExtractor: ModelAdapter<Request = ImageInput, Response = String> {}
impl<T: ModelAdapter<Request = ImageInput, Response = String>> TextExtractor for T {}

/// Outcome of a single adapter invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum AdapterResult<T> {
    Success(T),
    Failure(AdapterFailure),
}

impl<T> AdapterResult<T> {
    pub fn into_result(self) -> Result<T, AdapterFailure> {
        match self {
            AdapterResult::Success(value) => Ok(value),
            AdapterResult::Failure(failure) => Err(failure),
        }
    }
}

/// Input for the summarization adapter.
#[derive(Clone, Debug, PartialEq)]
pub struct SummarizeRequest {
    /// Trimmed, non-empty text to summarize.
    pub text: String,
    /// Upper bound on the summary length.
    pub max_length: usize,
    /// Lower bound on the summary length.
    pub min_length: usize,
    /// Whether the model may sample instead of decoding greedily.
    pub do_sample: bool,
}

/// Output of the sentiment adapter.
#[derive(Clone, Debug, PartialEq)]
pub struct Sentiment {
    /// Label as reported by the model, e.g. `POSITIVE`.
    pub label: String,
    /// Score for `label`, in `[0, 1]`.
    pub confidence: f32,
}

/// One label scored by the image classifier, before ranking.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassScore {
    /// Class name.
    pub label: String,
    /// Score for `label`, in `[0, 1]`.
    pub confidence: f32,
}

impl ClassScore {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// A ranked classification result, rank starting at 1.
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionItem {
    /// 1-based position in the classifier's output.
    pub rank: usize,
    /// Class name.
    pub label: String,
    /// Score for `label`, in `[0, 1]`.
    pub confidence: f32,
}

impl PredictionItem {
    /// Ranks scores in the order the classifier returned them.
    pub fn ranked(scores: Vec<ClassScore>) -> Vec<PredictionItem> {
        scores
            .into_iter()
            .enumerate()
            .map(|(i, score)| PredictionItem {
                rank: i + 1,
                label: score.label,
                confidence: score.confidence,
            })
            .collect()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "adapter panicked".to_string()
    }
}

/// Invokes `adapter` once, turning both errors and panics into a `ModelError` failure.
pub fn invoke<M: ModelAdapter>(
    name: &str,
    adapter: &mut M,
    request: M::Request,
) -> AdapterResult<M::Response> {
    log::debug!("Invoking adapter {name}");
    let start_time = Instant::now();

    let result = catch_unwind(AssertUnwindSafe(|| adapter.run(request)));

    let duration = start_time.elapsed();
    match result {
        Ok(Ok(response)) => {
            log::debug!("Adapter {name} completed in {duration:?}");
            AdapterResult::Success(response)
        }
        Ok(Err(e)) => {
            log::error!("Adapter {name} failed after {duration:?}: {e}");
            AdapterResult::Failure(AdapterFailure::model(e.to_string()))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::error!("Adapter {name} panicked after {duration:?}: {message}");
            AdapterResult::Failure(AdapterFailure::model(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[derive(Debug, thiserror::Error)]
    #[error("weights not loaded")]
    struct NotLoaded;

    struct Flaky {
        mode: u8,
    }

    impl ModelAdapter for Flaky {
        type Request = String;
        type Response = String;
        type Error = NotLoaded;

        fn run(&mut self, request: String) -> Result<String, NotLoaded> {
            match self.mode {
                0 => Ok(request.to_uppercase()),
                1 => Err(NotLoaded),
                _ => panic!("tensor shape mismatch"),
            }
        }
    }

    #[test]
    fn invoke_wraps_success() {
        let result = invoke("flaky", &mut Flaky { mode: 0 }, "hi".to_string());
        assert_eq!(result, AdapterResult::Success("HI".to_string()));
    }

    #[test]
    fn invoke_wraps_error_as_model_error() {
        let result = invoke("flaky", &mut Flaky { mode: 1 }, "hi".to_string());
        let failure = result.into_result().unwrap_err();
        assert_eq!(failure.kind, FailureKind::ModelError);
        assert_eq!(failure.message, "weights not loaded");
    }

    #[test]
    fn invoke_contains_panics() {
        let result = invoke("flaky", &mut Flaky { mode: 2 }, "hi".to_string());
        let failure = result.into_result().unwrap_err();
        assert_eq!(failure.kind, FailureKind::ModelError);
        assert_eq!(failure.message, "tensor shape mismatch");
    }

    #[test]
    fn ranks_start_at_one_in_given_order() {
        let items = PredictionItem::ranked(vec![
            ClassScore::new("poodle", 0.05),
            ClassScore::new("labrador", 0.90),
        ]);
        assert_eq!(items[0].rank, 1);
        assert_eq!(items[0].label, "poodle");
        assert_eq!(items[1].rank, 2);
        assert_eq!(items[1].label, "labrador");
    }
}
