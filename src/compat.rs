//! Which (modality, task) pairs may run, and which adapters they run through.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Category of input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Modality {
    #[default]
    Text,
    Image,
}

impl Modality {
    pub const ALL: [Modality; 2] = [Modality::Text, Modality::Image];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "Text",
            Modality::Image => "Image",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested inference operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Task {
    #[default]
    Summarization,
    SentimentAnalysis,
    ImageClassification,
}

impl Task {
    pub const ALL: [Task; 3] = [
        Task::Summarization,
        Task::SentimentAnalysis,
        Task::ImageClassification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Summarization => "Summarization",
            Task::SentimentAnalysis => "SentimentAnalysis",
            Task::ImageClassification => "ImageClassification",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseSelectionError {
    kind: &'static str,
    value: String,
}

/// Lowercases and drops separators so "Sentiment Analysis", "sentiment-analysis"
/// and "SentimentAnalysis" compare equal.
fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for Modality {
    type Err = ParseSelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Modality::ALL
            .into_iter()
            .find(|m| normalize(m.as_str()) == normalize(s))
            .ok_or_else(|| ParseSelectionError {
                kind: "modality",
                value: s.to_string(),
            })
    }
}

impl FromStr for Task {
    type Err = ParseSelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Task::ALL
            .into_iter()
            .find(|t| normalize(t.as_str()) == normalize(s))
            .ok_or_else(|| ParseSelectionError {
                kind: "task",
                value: s.to_string(),
            })
    }
}

/// A single adapter invocation inside a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Summarize,
    AnalyzeSentiment,
    ClassifyImage,
    ExtractText,
}

/// The ordered adapters an allowed (modality, task) pair runs through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Chain {
    Summarize,
    AnalyzeSentiment,
    ClassifyImage,
    /// Text extracted from the image feeds the summarizer.
    ExtractThenSummarize,
}

impl Chain {
    pub fn stages(&self) -> &'static [Stage] {
        match self {
            Chain::Summarize => &[Stage::Summarize],
            Chain::AnalyzeSentiment => &[Stage::AnalyzeSentiment],
            Chain::ClassifyImage => &[Stage::ClassifyImage],
            Chain::ExtractThenSummarize => &[Stage::ExtractText, Stage::Summarize],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompatibilityRule {
    Allowed(Chain),
    Disallowed,
}

/// Static lookup of legal (modality, task) pairs.
///
/// The match in [`CompatibilityMatrix::rule`] is exhaustive, so every pair has
/// exactly one entry and adding a variant forces a decision here.
pub struct CompatibilityMatrix;

impl CompatibilityMatrix {
    pub fn rule(modality: Modality, task: Task) -> CompatibilityRule {
        use CompatibilityRule::{Allowed, Disallowed};
        match (modality, task) {
            (Modality::Text, Task::Summarization) => Allowed(Chain::Summarize),
            (Modality::Text, Task::SentimentAnalysis) => Allowed(Chain::AnalyzeSentiment),
            (Modality::Text, Task::ImageClassification) => Disallowed,
            (Modality::Image, Task::Summarization) => Allowed(Chain::ExtractThenSummarize),
            (Modality::Image, Task::SentimentAnalysis) => Disallowed,
            (Modality::Image, Task::ImageClassification) => Allowed(Chain::ClassifyImage),
        }
    }

    pub fn chain(modality: Modality, task: Task) -> Option<Chain> {
        match Self::rule(modality, task) {
            CompatibilityRule::Allowed(chain) => Some(chain),
            CompatibilityRule::Disallowed => None,
        }
    }

    pub fn is_allowed(modality: Modality, task: Task) -> bool {
        Self::chain(modality, task).is_some()
    }

    /// Tasks a front end should offer once `modality` is selected.
    pub fn allowed_tasks(modality: Modality) -> Vec<Task> {
        Task::ALL
            .into_iter()
            .filter(|task| Self::is_allowed(modality, *task))
            .collect()
    }

    /// Every (modality, task) pair with its rule.
    pub fn rules() -> impl Iterator<Item = (Modality, Task, CompatibilityRule)> {
        Modality::ALL.into_iter().flat_map(|modality| {
            Task::ALL
                .into_iter()
                .map(move |task| (modality, task, Self::rule(modality, task)))
        })
    }
}
