use argh::FromArgs;
use infernum_dispatch::{
    Adapters, ClassScore, DispatchEngine, EngineConfig, ImageFormat, ImageInput, ImageReference,
    ModelAdapter, Modality, Sentiment, SessionState, SummarizeRequest, Task,
};
use kornia_image::{Image, allocator::CpuAllocator};
use kornia_vlm::paligemma::{Paligemma, PaligemmaConfig, PaligemmaError};
use std::{cell::RefCell, convert::Infallible, path::PathBuf, rc::Rc};

// number of tokens sampled from PaliGemma per request
const SAMPLE_LEN: usize = 50;

#[derive(FromArgs)]
/// Run one inference request through the dispatch engine.
struct DispatchArgs {
    /// input modality: "text" or "image"
    #[argh(option, short = 'm', default = "Modality::Text")]
    modality: Modality,

    /// task: "summarization", "sentiment-analysis" or "image-classification"
    #[argh(option, short = 't', default = "Task::Summarization")]
    task: Task,

    /// text to process
    #[argh(option)]
    text: Option<String>,

    /// path to a jpeg or png image
    #[argh(option, short = 'i')]
    image: Option<PathBuf>,

    /// path to a json engine config
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Vlm(#[from] PaligemmaError),

    #[error("failed to decode image: {0}")]
    Decode(String),
}

fn decode_image(input: &ImageInput) -> Result<Image<u8, 3, CpuAllocator>, DemoError> {
    let result = match input.format {
        ImageFormat::Jpeg => {
            kornia_io::jpeg::read_image_jpeg_rgb8(&input.path).map_err(|e| e.to_string())
        }
        ImageFormat::Png => {
            kornia_io::png::read_image_png_rgb8(&input.path).map_err(|e| e.to_string())
        }
    };
    result.map_err(DemoError::Decode)
}

/// PaliGemma weights, loaded on first use and shared by the image adapters.
#[derive(Clone, Default)]
struct SharedPaligemma(Rc<RefCell<Option<Paligemma>>>);

impl SharedPaligemma {
    fn ask(&self, input: &ImageInput, prompt: &str) -> Result<String, DemoError> {
        let image = decode_image(input)?;

        let mut slot = self.0.borrow_mut();
        let model = match slot.take() {
            Some(model) => model,
            None => {
                log::info!("Loading PaliGemma weights");
                Paligemma::new(PaligemmaConfig::default())?
            }
        };
        let model = slot.insert(model);

        Ok(model.inference(&image, prompt, SAMPLE_LEN, false)?)
    }
}

struct PaligemmaExtractor(SharedPaligemma);

impl ModelAdapter for PaligemmaExtractor {
    type Request = ImageInput;
    type Response = String;
    type Error = DemoError;

    fn run(&mut self, request: Self::Request) -> Result<Self::Response, Self::Error> {
        self.0.ask(&request, "ocr")
    }
}

/// PaliGemma answers rather than scores, so its answer is the single prediction.
struct PaligemmaClassifier(SharedPaligemma);

// placeholder score: PaliGemma returns no probability for its answer
const UNSCORED_CONFIDENCE: f32 = 1.0;

impl ModelAdapter for PaligemmaClassifier {
    type Request = ImageInput;
    type Response = Vec<ClassScore>;
    type Error = DemoError;

    fn run(&mut self, request: Self::Request) -> Result<Self::Response, Self::Error> {
        let answer = self
            .0
            .ask(&request, "answer en what is the main object in this image?")?;
        Ok(vec![ClassScore::new(answer.trim(), UNSCORED_CONFIDENCE)])
    }
}

/// Keeps leading sentences until the word budget is spent.
struct LeadSummarizer;

impl ModelAdapter for LeadSummarizer {
    type Request = SummarizeRequest;
    type Response = String;
    type Error = Infallible;

    fn run(&mut self, request: Self::Request) -> Result<Self::Response, Self::Error> {
        let mut summary: Vec<&str> = Vec::new();
        let mut words = 0;

        for sentence in request.text.split_inclusive(['.', '!', '?']) {
            let count = sentence.split_whitespace().count();
            if words >= request.min_length && words + count > request.max_length {
                break;
            }
            summary.push(sentence.trim());
            words += count;
        }

        Ok(summary.join(" "))
    }
}

const POSITIVE_WORDS: &[&str] = &["good", "great", "love", "excellent", "happy", "nice", "best"];
const NEGATIVE_WORDS: &[&str] = &["bad", "terrible", "hate", "awful", "sad", "poor", "worst"];

/// Counts lexicon hits; confidence grows with the margin between the two sides.
struct LexiconSentiment;

impl ModelAdapter for LexiconSentiment {
    type Request = String;
    type Response = Sentiment;
    type Error = Infallible;

    fn run(&mut self, request: Self::Request) -> Result<Self::Response, Self::Error> {
        let (mut positive, mut negative) = (0usize, 0usize);
        for word in request.split(|c: char| !c.is_alphanumeric()) {
            let word = word.to_lowercase();
            if POSITIVE_WORDS.contains(&word.as_str()) {
                positive += 1;
            } else if NEGATIVE_WORDS.contains(&word.as_str()) {
                negative += 1;
            }
        }

        let total = (positive + negative).max(1) as f32;
        let margin = positive.abs_diff(negative) as f32 / total;
        let label = if negative > positive { "NEGATIVE" } else { "POSITIVE" };

        Ok(Sentiment {
            label: label.to_string(),
            confidence: 0.5 + 0.5 * margin,
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: DispatchArgs = argh::from_env();

    let config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };

    let vlm = SharedPaligemma::default();
    let mut engine = DispatchEngine::new(Adapters {
        summarizer: LeadSummarizer,
        sentiment: LexiconSentiment,
        classifier: PaligemmaClassifier(vlm.clone()),
        extractor: PaligemmaExtractor(vlm),
    })
    .with_config(config);

    let mut session = SessionState::new();
    session.set_modality(args.modality);
    session.set_task(args.task);
    if let Some(text) = args.text {
        session.set_text(text);
    }
    session.set_image_reference(args.image.map(ImageReference::from));

    log::info!("Running {} + {}", args.modality, args.task);
    let outcome = engine.dispatch(&session);
    println!("{}", outcome.display_text());

    Ok(())
}
