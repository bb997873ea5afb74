//! Best-effort semantic classification of photos.
//!
//! # Responsibility
//! - Wrap the external image model behind the `ImageLabeler` trait.
//! - Reduce raw model predictions to one `PhotoCategory`.
//!
//! # Invariants
//! - `Classifier::classify` never fails; any model error yields `Other`.
//! - Classification never touches the catalog write path.

use crate::model::photo::PhotoCategory;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Number of model predictions considered per image.
pub const TOP_K: usize = 5;

const MIN_CONFIDENCE: f32 = 0.15;
const UNMATCHED_MIN_PROBABILITY: f32 = 0.1;
const UNMATCHED_WEIGHT: f32 = 0.5;

/// Keyword table matched as substrings of lowercase class names.
/// Earlier entries win.
const CATEGORY_KEYWORDS: &[(&str, PhotoCategory)] = &[
    ("person", PhotoCategory::People),
    ("people", PhotoCategory::People),
    ("man", PhotoCategory::People),
    ("woman", PhotoCategory::People),
    ("boy", PhotoCategory::People),
    ("girl", PhotoCategory::People),
    ("face", PhotoCategory::People),
    ("human", PhotoCategory::People),
    ("dog", PhotoCategory::Animals),
    ("cat", PhotoCategory::Animals),
    ("bird", PhotoCategory::Animals),
    ("horse", PhotoCategory::Animals),
    ("sheep", PhotoCategory::Animals),
    ("cow", PhotoCategory::Animals),
    ("elephant", PhotoCategory::Animals),
    ("bear", PhotoCategory::Animals),
    ("zebra", PhotoCategory::Animals),
    ("giraffe", PhotoCategory::Animals),
    ("pet", PhotoCategory::Animals),
    ("animal", PhotoCategory::Animals),
    ("wildlife", PhotoCategory::Animals),
    ("mammal", PhotoCategory::Animals),
    ("fish", PhotoCategory::Animals),
    ("insect", PhotoCategory::Animals),
    ("butterfly", PhotoCategory::Animals),
    ("plant", PhotoCategory::Plants),
    ("tree", PhotoCategory::Plants),
    ("flower", PhotoCategory::Plants),
    ("rose", PhotoCategory::Plants),
    ("daisy", PhotoCategory::Plants),
    ("sunflower", PhotoCategory::Plants),
    ("orchid", PhotoCategory::Plants),
    ("potted", PhotoCategory::Plants),
    ("vase", PhotoCategory::Plants),
    ("garden", PhotoCategory::Plants),
    ("leaf", PhotoCategory::Plants),
    ("vegetation", PhotoCategory::Plants),
    ("fern", PhotoCategory::Plants),
    ("succulent", PhotoCategory::Plants),
];

/// One model prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub class_name: String,
    /// Probability in `[0, 1]`.
    pub probability: f32,
}

impl Prediction {
    pub fn new(class_name: impl Into<String>, probability: f32) -> Self {
        Self {
            class_name: class_name.into(),
            probability,
        }
    }
}

/// Failures reported by an image model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    /// Model could not be loaded.
    ModelUnavailable(String),
    /// Image could not be decoded or inference failed.
    Inference(String),
}

impl Display for ClassifierError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModelUnavailable(message) => write!(f, "image model unavailable: {message}"),
            Self::Inference(message) => write!(f, "image inference failed: {message}"),
        }
    }
}

impl Error for ClassifierError {}

/// Black-box image model returning ranked predictions.
pub trait ImageLabeler: Send + Sync {
    fn label(&self, image: &[u8], top_k: usize) -> Result<Vec<Prediction>, ClassifierError>;
}

/// Category classifier with an optional model behind it.
pub struct Classifier {
    labeler: Option<Box<dyn ImageLabeler>>,
}

impl Classifier {
    pub fn new(labeler: impl ImageLabeler + 'static) -> Self {
        Self {
            labeler: Some(Box::new(labeler)),
        }
    }

    /// Classifier used when no model could be loaded; always yields `Other`.
    pub fn unavailable() -> Self {
        Self { labeler: None }
    }

    pub fn is_available(&self) -> bool {
        self.labeler.is_some()
    }

    /// Maps image bytes to a category, defaulting to `Other` on any failure.
    pub fn classify(&self, image: &[u8]) -> PhotoCategory {
        let Some(labeler) = self.labeler.as_ref() else {
            return PhotoCategory::Other;
        };

        match labeler.label(image, TOP_K) {
            Ok(predictions) => categorize(&predictions),
            Err(err) => {
                warn!(
                    "event=classify module=classify status=error fallback=other error={}",
                    err
                );
                PhotoCategory::Other
            }
        }
    }
}

/// Scores predictions per category and picks the winner.
///
/// A category must beat `other` and exceed the minimum confidence to win.
pub fn categorize(predictions: &[Prediction]) -> PhotoCategory {
    let mut scores = [0.0_f32; 4];

    for prediction in predictions.iter().take(TOP_K) {
        let class_name = prediction.class_name.to_lowercase();
        match keyword_category(&class_name) {
            Some(category) => {
                scores[score_index(category)] += prediction.probability;
                debug!(
                    "event=classify_match module=classify class={} category={}",
                    class_name, category
                );
            }
            None if prediction.probability > UNMATCHED_MIN_PROBABILITY => {
                scores[score_index(PhotoCategory::Other)] +=
                    prediction.probability * UNMATCHED_WEIGHT;
            }
            None => {}
        }
    }

    let mut best = PhotoCategory::Other;
    let mut best_score = scores[score_index(PhotoCategory::Other)];
    for category in PhotoCategory::ALL {
        let score = scores[score_index(category)];
        if score > best_score && score > MIN_CONFIDENCE {
            best = category;
            best_score = score;
        }
    }

    info!(
        "event=classify module=classify status=ok category={} confidence_pct={}",
        best,
        (best_score * 100.0).round()
    );
    best
}

fn keyword_category(class_name: &str) -> Option<PhotoCategory> {
    CATEGORY_KEYWORDS
        .iter()
        .find(|(keyword, _)| class_name.contains(keyword))
        .map(|(_, category)| *category)
}

fn score_index(category: PhotoCategory) -> usize {
    match category {
        PhotoCategory::People => 0,
        PhotoCategory::Animals => 1,
        PhotoCategory::Plants => 2,
        PhotoCategory::Other => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::{categorize, Classifier, ClassifierError, ImageLabeler, Prediction};
    use crate::model::photo::PhotoCategory;

    struct FailingLabeler;

    impl ImageLabeler for FailingLabeler {
        fn label(&self, _image: &[u8], _top_k: usize) -> Result<Vec<Prediction>, ClassifierError> {
            Err(ClassifierError::Inference("decode failed".to_string()))
        }
    }

    #[test]
    fn matched_predictions_accumulate_per_category() {
        let predictions = vec![
            Prediction::new("tabby, tabby cat", 0.4),
            Prediction::new("Egyptian cat", 0.3),
            Prediction::new("web site", 0.2),
        ];
        assert_eq!(categorize(&predictions), PhotoCategory::Animals);
    }

    #[test]
    fn first_keyword_in_table_wins() {
        // "woman" contains "man", which comes first in the table; both map to people.
        assert_eq!(
            categorize(&[Prediction::new("Woman with flower", 0.9)]),
            PhotoCategory::People
        );
        assert_eq!(
            categorize(&[Prediction::new("daisy", 0.6)]),
            PhotoCategory::Plants
        );
    }

    #[test]
    fn low_confidence_match_falls_back_to_other() {
        assert_eq!(
            categorize(&[Prediction::new("goldfish", 0.12)]),
            PhotoCategory::Other
        );
    }

    #[test]
    fn unmatched_predictions_can_outweigh_a_weak_match() {
        let predictions = vec![
            Prediction::new("laptop", 0.9),
            Prediction::new("pot, flowerpot", 0.2),
        ];
        // other = 0.45, plants = 0.2
        assert_eq!(categorize(&predictions), PhotoCategory::Other);
    }

    #[test]
    fn empty_predictions_yield_other() {
        assert_eq!(categorize(&[]), PhotoCategory::Other);
    }

    #[test]
    fn model_failure_and_missing_model_default_to_other() {
        assert_eq!(
            Classifier::new(FailingLabeler).classify(b"bytes"),
            PhotoCategory::Other
        );
        let unavailable = Classifier::unavailable();
        assert!(!unavailable.is_available());
        assert_eq!(unavailable.classify(b"bytes"), PhotoCategory::Other);
    }
}
